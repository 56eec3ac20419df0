// Error types for the actuator codec and its serial transport

/// Failures reported by the byte channel underneath the codec
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Short write: {written} of {expected} bytes sent")]
    ShortWrite { written: usize, expected: usize },
}

/// Reasons a command table is rejected at construction
///
/// `Copy` so the built-in table can be checked in a `const` context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableViolation {
    #[error("Duplicate command id {id}")]
    DuplicateId { id: u8 },

    #[error("Command {id} declares {count} checksum positions (expected 1 or 2)")]
    ChecksumCount { id: u8, count: usize },

    #[error("Command {id}: checksum position {position} outside frame of {frame_size} bytes")]
    ChecksumOutOfBounds {
        id: u8,
        position: usize,
        frame_size: usize,
    },

    #[error("Command {id}: checksum position {position} does not match frame layout")]
    ChecksumMisplaced { id: u8, position: usize },

    #[error("Command {id}: frame size {frame_size} inconsistent with payload size {payload_size}")]
    FrameSizeMismatch {
        id: u8,
        frame_size: usize,
        payload_size: u8,
    },

    #[error("Command {id}: angle slot of {slot} bytes does not match the angle field")]
    AngleSlot { id: u8, slot: usize },

    #[error("Command {id}: fields need {needed} payload bytes, only {payload_size} declared")]
    PayloadOverflow { id: u8, needed: usize, payload_size: u8 },
}

/// Error types for encoding, decoding and exchanging frames
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Unknown command id {0}")]
    UnknownCommand(u8),

    #[error("Value {value} for {field} does not fit a {width}-byte wire field")]
    ValueOutOfRange {
        field: &'static str,
        value: i64,
        width: usize,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Invalid command table: {0}")]
    InvalidTable(#[from] TableViolation),
}

pub type Result<T> = std::result::Result<T, CodecError>;
