// High-level actuator driver
//
// Pairs the frame encoder and response decoder with a transport. Every call
// is one write followed by at most one read; nothing is queued or retried.

use tracing::{debug, info, warn};

use super::command::{CommandKind, CommandTable};
use super::error::{Result, TransportError};
use super::frame::{CommandParams, encode_command, encode_multi_loop};
use super::response::{TelemetrySample, decode_response};
use super::transport::{SerialTransport, Transport};
use crate::config::RESPONSE_BUFFER_LEN;

/// Driver for a single serial bus of geared actuators
pub struct MotorDriver<T: Transport> {
    transport: T,
    table: CommandTable,
}

impl MotorDriver<SerialTransport> {
    /// Open the serial bus with the built-in command table
    pub fn open(port: &str, baudrate: u32) -> Result<Self> {
        info!("Opening actuator bus on {} ({} baud)", port, baudrate);
        let transport = SerialTransport::open_with_baudrate(port, baudrate)?;
        Ok(Self::new(transport))
    }
}

impl<T: Transport> MotorDriver<T> {
    pub fn new(transport: T) -> Self {
        Self::with_table(transport, CommandTable::standard())
    }

    /// Use a custom (already validated) command table
    pub fn with_table(transport: T, table: CommandTable) -> Self {
        Self { transport, table }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Send a multi-loop position command (degrees)
    pub fn multi_loop_control(&mut self, motor_id: u8, degree_position: i32) -> Result<()> {
        let frame = encode_multi_loop(motor_id, degree_position)?;
        debug!(
            "Multi-loop to motor {}: {} deg, frame={:02X?}",
            motor_id, degree_position, frame
        );
        self.send_frame(&frame)
    }

    /// Send any command from the table
    pub fn universal_control(&mut self, command_id: u8, params: &CommandParams) -> Result<()> {
        let frame = encode_command(&self.table, command_id, params)?;
        debug!(
            "Command {} to motor {}: frame={:02X?}",
            command_id, params.motor_id, frame
        );
        self.send_frame(&frame)
    }

    /// Read one reply and decode its telemetry fields
    pub fn read_response(&mut self) -> Result<TelemetrySample> {
        let mut buf = [0u8; RESPONSE_BUFFER_LEN];
        let len = self.transport.read_some(&mut buf)?;
        debug!("Received {} bytes: {:02X?}", len, &buf[..len]);

        let sample = decode_response(&buf[..len])?;
        if sample.partial {
            warn!("Short reply ({} bytes), telemetry decoded from available bytes", len);
        }
        Ok(sample)
    }

    /// Query temperature, torque, speed and position of one motor
    pub fn read_status(&mut self, motor_id: u8) -> Result<TelemetrySample> {
        self.universal_control(CommandKind::ReadStatus2.id(), &CommandParams::new(motor_id))?;
        self.read_response()
    }

    /// Send a command and decode the reply it triggers
    pub fn exchange(&mut self, command_id: u8, params: &CommandParams) -> Result<TelemetrySample> {
        self.universal_control(command_id, params)?;
        self.read_response()
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let written = self.transport.write(frame)?;
        if written != frame.len() {
            return Err(TransportError::ShortWrite {
                written,
                expected: frame.len(),
            }
            .into());
        }
        Ok(())
    }
}
