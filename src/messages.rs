// Message types exchanged by the zenoh bridge

use serde::{Deserialize, Serialize};

use crate::motor::{CommandParams, TelemetrySample};

// Command from scripts/planners -> bridge
// Tagged by "kind", e.g. {"kind":"multi_loop","motor_id":1,"degrees":90}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotorCommand {
    MultiLoop {
        motor_id: u8,
        degrees: i32,
    },
    Universal {
        command_id: u8,
        #[serde(flatten)]
        params: CommandParams,
    },
}

impl MotorCommand {
    pub fn motor_id(&self) -> u8 {
        match self {
            MotorCommand::MultiLoop { motor_id, .. } => *motor_id,
            MotorCommand::Universal { params, .. } => params.motor_id,
        }
    }
}

/// Decoded telemetry published by the bridge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryMessage {
    pub motor_id: u8,
    pub temperature: u32,
    pub torque: u32,
    pub speed: u32,
    pub position: u32,
    pub partial: bool,
}

impl TelemetryMessage {
    pub fn new(motor_id: u8, sample: &TelemetrySample) -> Self {
        Self {
            motor_id,
            temperature: sample.temperature(),
            torque: sample.torque(),
            speed: sample.speed(),
            position: sample.position(),
            partial: sample.partial,
        }
    }
}

/// Health status published by the bridge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BridgeHealth {
    Ok,
    NoTelemetry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multi_loop() {
        let cmd: MotorCommand =
            serde_json::from_str(r#"{"kind":"multi_loop","motor_id":2,"degrees":-90}"#).unwrap();
        assert_eq!(
            cmd,
            MotorCommand::MultiLoop {
                motor_id: 2,
                degrees: -90
            }
        );
        assert_eq!(cmd.motor_id(), 2);
    }

    #[test]
    fn test_parse_universal_with_defaults() {
        let cmd: MotorCommand = serde_json::from_str(
            r#"{"kind":"universal","command_id":13,"motor_id":1,"degree_position":45,"speed":10}"#,
        )
        .unwrap();
        match cmd {
            MotorCommand::Universal { command_id, params } => {
                assert_eq!(command_id, 13);
                assert_eq!(params.motor_id, 1);
                assert_eq!(params.degree_position, 45);
                assert_eq!(params.speed, 10);
                assert_eq!(params.torque, 0);
                assert_eq!(params.direction, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_health_serialization() {
        assert_eq!(
            serde_json::to_string(&BridgeHealth::NoTelemetry).unwrap(),
            "\"no_telemetry\""
        );
    }
}
