// Command descriptor table for the RMD-style serial protocol
//
// Frame layout: [0x3E, opcode, motor id, payload length, header checksum,
//                payload..., payload checksum]
// Each command kind has a fixed frame shape described by one descriptor.

use std::borrow::Cow;

use super::error::{CodecError, Result, TableViolation};

/// Sync byte opening every frame
pub const FRAME_HEAD: u8 = 0x3E;

/// Sync, opcode, motor id, payload length
pub const HEADER_LEN: usize = 4;

/// First payload byte (right after the header checksum)
pub const PAYLOAD_OFFSET: usize = HEADER_LEN + 1;

/// Wire widths of the optional payload fields
pub const DIRECTION_WIDTH: usize = 1;
pub const ANGLE_WIDTH: usize = 4;
pub const SPEED_WIDTH: usize = 4;
pub const TORQUE_WIDTH: usize = 2;

/// Logical command identifiers of the built-in table
///
/// These are caller-facing ids, unrelated to the wire opcode.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ReadStatus1 = 1,
    ClearErrors = 2,
    ReadStatus2 = 3,
    TorqueControl = 10,
    SpeedControl = 11,
    MultiLoopAngle1 = 12,
    MultiLoopAngle2 = 13,
}

impl CommandKind {
    pub const fn id(self) -> u8 {
        self as u8
    }
}

impl From<CommandKind> for u8 {
    fn from(kind: CommandKind) -> Self {
        kind.id()
    }
}

/// Byte-level shape of one command kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub id: u8,
    pub opcode: u8,
    /// Total frame length in bytes
    pub frame_size: usize,
    /// Value written into the header's length byte
    pub payload_size: u8,
    /// Offsets receiving checksum bytes: header checksum, then optionally the payload checksum
    pub checksum_positions: &'static [usize],
    pub has_direction: bool,
    pub has_angle: bool,
    /// Payload bytes reserved for the angle; the 4-byte value is zero-padded to fill them
    pub angle_slot: usize,
    pub has_speed: bool,
    pub has_torque: bool,
}

impl CommandDescriptor {
    /// Header-only command without payload (status reads, error clearing)
    const fn header_only(kind: CommandKind, opcode: u8) -> Self {
        Self {
            id: kind.id(),
            opcode,
            frame_size: PAYLOAD_OFFSET,
            payload_size: 0,
            checksum_positions: &[HEADER_LEN],
            has_direction: false,
            has_angle: false,
            angle_slot: 0,
            has_speed: false,
            has_torque: false,
        }
    }

    /// Number of payload bytes taken by the fields this command encodes
    pub const fn field_bytes(&self) -> usize {
        let mut needed = 0;
        if self.has_direction {
            needed += DIRECTION_WIDTH;
        }
        if self.has_angle {
            needed += self.angle_slot;
        }
        if self.has_speed {
            needed += SPEED_WIDTH;
        }
        if self.has_torque {
            needed += TORQUE_WIDTH;
        }
        needed
    }

    /// Whether the payload region carries its own checksum
    pub const fn checks_payload(&self) -> bool {
        self.checksum_positions.len() == 2
    }

    const fn validate(&self) -> std::result::Result<(), TableViolation> {
        let id = self.id;
        let count = self.checksum_positions.len();
        if count == 0 || count > 2 {
            return Err(TableViolation::ChecksumCount { id, count });
        }

        let mut k = 0;
        while k < count {
            let position = self.checksum_positions[k];
            if position >= self.frame_size {
                return Err(TableViolation::ChecksumOutOfBounds {
                    id,
                    position,
                    frame_size: self.frame_size,
                });
            }
            k += 1;
        }

        // Header checksum always follows the 4 header bytes
        if self.checksum_positions[0] != HEADER_LEN {
            return Err(TableViolation::ChecksumMisplaced {
                id,
                position: self.checksum_positions[0],
            });
        }

        let slot_ok = if self.has_angle {
            self.angle_slot >= ANGLE_WIDTH
        } else {
            self.angle_slot == 0
        };
        if !slot_ok {
            return Err(TableViolation::AngleSlot {
                id,
                slot: self.angle_slot,
            });
        }

        let needed = self.field_bytes();
        if count == 1 {
            if self.frame_size != PAYLOAD_OFFSET || self.payload_size != 0 {
                return Err(TableViolation::FrameSizeMismatch {
                    id,
                    frame_size: self.frame_size,
                    payload_size: self.payload_size,
                });
            }
            if needed > 0 {
                return Err(TableViolation::PayloadOverflow {
                    id,
                    needed,
                    payload_size: 0,
                });
            }
            return Ok(());
        }

        if self.frame_size != PAYLOAD_OFFSET + self.payload_size as usize + 1 {
            return Err(TableViolation::FrameSizeMismatch {
                id,
                frame_size: self.frame_size,
                payload_size: self.payload_size,
            });
        }
        if self.checksum_positions[1] != self.frame_size - 1 {
            return Err(TableViolation::ChecksumMisplaced {
                id,
                position: self.checksum_positions[1],
            });
        }
        if needed > self.payload_size as usize {
            return Err(TableViolation::PayloadOverflow {
                id,
                needed,
                payload_size: self.payload_size,
            });
        }
        Ok(())
    }
}

/// Built-in command set
pub const STANDARD_COMMANDS: [CommandDescriptor; 7] = [
    CommandDescriptor::header_only(CommandKind::ReadStatus1, 0x9A),
    CommandDescriptor::header_only(CommandKind::ClearErrors, 0x9B),
    CommandDescriptor::header_only(CommandKind::ReadStatus2, 0x9C),
    CommandDescriptor {
        id: CommandKind::TorqueControl.id(),
        opcode: 0xA1,
        frame_size: 8,
        payload_size: 2,
        checksum_positions: &[HEADER_LEN, 7],
        has_direction: false,
        has_angle: false,
        angle_slot: 0,
        has_speed: false,
        has_torque: true,
    },
    CommandDescriptor {
        id: CommandKind::SpeedControl.id(),
        opcode: 0xA2,
        frame_size: 10,
        payload_size: 4,
        checksum_positions: &[HEADER_LEN, 9],
        has_direction: false,
        has_angle: false,
        angle_slot: 0,
        has_speed: true,
        has_torque: false,
    },
    CommandDescriptor {
        id: CommandKind::MultiLoopAngle1.id(),
        opcode: 0xA3,
        frame_size: 14,
        payload_size: 8,
        checksum_positions: &[HEADER_LEN, 13],
        has_direction: false,
        has_angle: true,
        angle_slot: 8,
        has_speed: false,
        has_torque: false,
    },
    CommandDescriptor {
        id: CommandKind::MultiLoopAngle2.id(),
        opcode: 0xA4,
        frame_size: 18,
        payload_size: 12,
        checksum_positions: &[HEADER_LEN, 17],
        has_direction: false,
        has_angle: true,
        angle_slot: 8,
        has_speed: true,
        has_torque: false,
    },
];

// Reject a broken built-in table at compile time
const _: () = assert!(validate_table(&STANDARD_COMMANDS).is_ok());

/// Check id uniqueness and every descriptor's frame layout
pub const fn validate_table(
    descriptors: &[CommandDescriptor],
) -> std::result::Result<(), TableViolation> {
    let mut i = 0;
    while i < descriptors.len() {
        if let Err(violation) = descriptors[i].validate() {
            return Err(violation);
        }
        let mut j = i + 1;
        while j < descriptors.len() {
            if descriptors[j].id == descriptors[i].id {
                return Err(TableViolation::DuplicateId {
                    id: descriptors[i].id,
                });
            }
            j += 1;
        }
        i += 1;
    }
    Ok(())
}

/// Read-only lookup table from logical command id to descriptor
#[derive(Debug, Clone)]
pub struct CommandTable {
    descriptors: Cow<'static, [CommandDescriptor]>,
}

impl CommandTable {
    /// Build a custom table, validated before use
    pub fn new(descriptors: Vec<CommandDescriptor>) -> Result<Self> {
        validate_table(&descriptors)?;
        Ok(Self {
            descriptors: Cow::Owned(descriptors),
        })
    }

    /// The built-in table (validated at compile time)
    pub fn standard() -> Self {
        Self {
            descriptors: Cow::Borrowed(&STANDARD_COMMANDS),
        }
    }

    /// Find the descriptor for a logical command id
    pub fn lookup(&self, id: u8) -> Result<&CommandDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.id == id)
            .ok_or(CodecError::UnknownCommand(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.descriptors.iter()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}
