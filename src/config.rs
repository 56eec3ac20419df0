// Serial defaults, buffer sizes, bridge topics
use std::time::Duration;

// Serial port of the actuator bus (USB-RS485 adapter)
pub const MOTOR_PORT: &str = "/dev/ttyUSB0";

pub const MOTOR_BAUDRATE: u32 = crate::motor::transport::DEFAULT_BAUDRATE;

// Default motor address on the bus
pub const MOTOR_ID: u8 = 1;

// Receive buffer for one telemetry reply (replies are 13 bytes)
pub const RESPONSE_BUFFER_LEN: usize = 64;

// Bridge loop frequency
pub const LOOP_HZ: u64 = 50;

// Bridge reports a fault after this long without a good reply
pub const TELEMETRY_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD: &str = "actuator/cmd"; // commands
pub const TOPIC_TELEMETRY: &str = "actuator/telemetry"; // decoded replies
pub const TOPIC_HEALTH: &str = "actuator/state/health"; // health status
