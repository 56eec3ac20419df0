// Actuator protocol module
//
// Provides:
// - Command descriptor table (frame shapes per command kind)
// - Frame encoder with header and payload checksums
// - Telemetry reply decoder
// - Transport trait, serial transport, and a driver tying them together

pub mod command;
mod driver;
pub mod error;
pub mod frame;
pub mod response;
pub mod transport;

pub use command::{CommandDescriptor, CommandKind, CommandTable, STANDARD_COMMANDS};
pub use driver::MotorDriver;
pub use error::{CodecError, TableViolation, TransportError};
pub use frame::{CommandParams, checksum, encode_command, encode_multi_loop};
pub use response::{
    RESPONSE_FIELDS, ResponseField, TelemetrySample, decode_response, decode_response_len,
};
pub use transport::{SerialTransport, Transport};
