// 50 Hz zenoh bridge for one actuator
// Each tick: execute queued commands (one write + one read each), or poll the
// motor status when none are queued, then publish telemetry and health.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::{LOOP_HZ, TELEMETRY_TIMEOUT, TOPIC_CMD, TOPIC_HEALTH, TOPIC_TELEMETRY};
use crate::messages::{BridgeHealth, MotorCommand, TelemetryMessage};
use crate::motor::{CodecError, MotorDriver, TelemetrySample, Transport};

pub struct Bridge<T: Transport> {
    driver: MotorDriver<T>,
    motor_id: u8,
    last_telemetry_at: Option<Instant>,
    health: BridgeHealth,
}

impl<T: Transport> Bridge<T> {
    pub fn new(driver: MotorDriver<T>, motor_id: u8) -> Self {
        Self {
            driver,
            motor_id,
            last_telemetry_at: None,
            health: BridgeHealth::NoTelemetry, // Until the first good reply
        }
    }

    pub fn health(&self) -> BridgeHealth {
        self.health
    }

    /// Execute one command and decode the motor's reply
    fn on_command(&mut self, cmd: &MotorCommand) -> Result<TelemetryMessage, CodecError> {
        info!("Received command: {:?}", cmd);
        let sample = match cmd {
            MotorCommand::MultiLoop { motor_id, degrees } => {
                self.driver.multi_loop_control(*motor_id, *degrees)?;
                self.driver.read_response()?
            }
            MotorCommand::Universal { command_id, params } => {
                self.driver.exchange(*command_id, params)?
            }
        };
        Ok(self.record(cmd.motor_id(), &sample))
    }

    /// Poll status of the configured motor
    fn poll(&mut self) -> Result<TelemetryMessage, CodecError> {
        let sample = self.driver.read_status(self.motor_id)?;
        Ok(self.record(self.motor_id, &sample))
    }

    fn record(&mut self, motor_id: u8, sample: &TelemetrySample) -> TelemetryMessage {
        self.last_telemetry_at = Some(Instant::now());
        TelemetryMessage::new(motor_id, sample)
    }

    /// Health based on the age of the last decoded reply
    fn update_health(&mut self) -> BridgeHealth {
        let fresh = self
            .last_telemetry_at
            .is_some_and(|at| at.elapsed() <= TELEMETRY_TIMEOUT);

        let health = if fresh {
            BridgeHealth::Ok
        } else {
            BridgeHealth::NoTelemetry
        };
        if health == BridgeHealth::NoTelemetry && self.health == BridgeHealth::Ok {
            warn!("No telemetry for {:?}, reporting fault", TELEMETRY_TIMEOUT);
        }
        self.health = health;
        health
    }

    /// Run queued commands, or a status poll when the queue is empty
    pub fn step(&mut self, commands: Vec<MotorCommand>) -> Vec<TelemetryMessage> {
        let mut out = Vec::new();
        if commands.is_empty() {
            match self.poll() {
                Ok(msg) => out.push(msg),
                Err(e) => warn!("Status poll of motor {} failed: {}", self.motor_id, e),
            }
        }
        for cmd in &commands {
            match self.on_command(cmd) {
                Ok(msg) => out.push(msg),
                Err(e) => warn!("Command {:?} failed: {}", cmd, e),
            }
        }
        self.update_health();
        out
    }
}

pub async fn run<T: Transport>(
    driver: MotorDriver<T>,
    motor_id: u8,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD).await?;
    let pub_telemetry = session.declare_publisher(TOPIC_TELEMETRY).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut bridge = Bridge::new(driver, motor_id);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Bridge started: {}Hz loop, motor {}, {}ms telemetry timeout",
        LOOP_HZ,
        motor_id,
        TELEMETRY_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD);
    info!("Publishing to: {}, {}", TOPIC_TELEMETRY, TOPIC_HEALTH);

    loop {
        tick.tick().await;

        // 1. Drain all pending commands (non-blocking)
        let mut commands = Vec::new();
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<MotorCommand>(&payload) {
                Ok(cmd) => commands.push(cmd),
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Serial round trips block for at most the port timeout
        let telemetry = tokio::task::block_in_place(|| bridge.step(commands));

        // 3. Publish telemetry
        for msg in &telemetry {
            let telemetry_json = serde_json::to_string(msg)?;
            pub_telemetry.put(telemetry_json).await?;
        }

        // 4. Publish health
        let health_json = serde_json::to_string(&bridge.health())?;
        pub_health.put(health_json).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::TransportError;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedTransport {
        written: Vec<Vec<u8>>,
        replies: VecDeque<Vec<u8>>,
    }

    impl Transport for ScriptedTransport {
        fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
            self.written.push(bytes.to_vec());
            Ok(bytes.len())
        }

        fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            let reply = self.replies.pop_front().unwrap_or_default();
            buf[..reply.len()].copy_from_slice(&reply);
            Ok(reply.len())
        }
    }

    fn reply(temperature: u8) -> Vec<u8> {
        let mut r = vec![0u8; 13];
        r[5] = temperature;
        r
    }

    #[test]
    fn test_poll_when_idle() {
        let mut transport = ScriptedTransport::default();
        transport.replies.push_back(reply(35));
        let mut bridge = Bridge::new(MotorDriver::new(&mut transport), 1);

        let out = bridge.step(Vec::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].temperature, 35);
        assert_eq!(bridge.health(), BridgeHealth::Ok);
        drop(bridge);

        assert_eq!(transport.written[0][1], 0x9C);
    }

    #[test]
    fn test_commands_skip_poll() {
        let mut transport = ScriptedTransport::default();
        transport.replies.push_back(reply(20));
        transport.replies.push_back(reply(21));
        let mut bridge = Bridge::new(MotorDriver::new(&mut transport), 1);

        let out = bridge.step(vec![
            MotorCommand::MultiLoop {
                motor_id: 2,
                degrees: 90,
            },
            MotorCommand::Universal {
                command_id: 3,
                params: crate::motor::CommandParams::new(2),
            },
        ]);
        drop(bridge);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].motor_id, 2);
        assert_eq!(out[1].temperature, 21);
        assert_eq!(transport.written.len(), 2);
        assert_eq!(transport.written[0][1], 0xA3);
    }

    #[test]
    fn test_no_reply_reports_no_telemetry() {
        let mut bridge = Bridge::new(MotorDriver::new(ScriptedTransport::default()), 1);
        assert!(bridge.step(Vec::new()).is_empty());
        assert_eq!(bridge.health(), BridgeHealth::NoTelemetry);
    }

    #[test]
    fn test_rejected_command_is_skipped() {
        let mut bridge = Bridge::new(MotorDriver::new(ScriptedTransport::default()), 1);
        let out = bridge.step(vec![MotorCommand::Universal {
            command_id: 200,
            params: crate::motor::CommandParams::new(1),
        }]);
        assert!(out.is_empty());
    }
}
