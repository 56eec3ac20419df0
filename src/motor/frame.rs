// Outbound frame assembly
//
// Angles and speeds travel as signed milli-units (value * 1000) in
// little-endian order. Checksums are plain 8-bit additive sums.

use serde::{Deserialize, Serialize};

use super::command::{
    ANGLE_WIDTH, CommandKind, CommandTable, FRAME_HEAD, HEADER_LEN, PAYLOAD_OFFSET, SPEED_WIDTH,
    TORQUE_WIDTH,
};
use super::error::{CodecError, Result};

/// Fixed length of the multi-loop position frame
pub const MULTI_LOOP_FRAME_SIZE: usize = 14;

/// Payload length byte of the multi-loop position frame
const MULTI_LOOP_PAYLOAD_SIZE: u8 = 8;

const MULTI_LOOP_OPCODE: u8 = 0xA3;

/// Protocol fixed-point scale for angles and speeds
const MILLI: i64 = 1000;

/// Control parameters for a table-driven command
///
/// Which fields reach the wire depends on the command descriptor; the rest
/// are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandParams {
    pub motor_id: u8,
    /// Target angle in degrees
    pub degree_position: i32,
    /// Target speed in degrees per second
    pub speed: i32,
    /// Raw torque current
    pub torque: i32,
    pub direction: u8,
}

impl CommandParams {
    pub fn new(motor_id: u8) -> Self {
        Self {
            motor_id,
            ..Self::default()
        }
    }
}

/// 8-bit additive checksum (sum mod 256)
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Append `value` as a `width`-byte little-endian two's complement field
fn put_le(frame: &mut Vec<u8>, field: &'static str, value: i64, width: usize) -> Result<()> {
    let bits = (width * 8) as u32;
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    if value < min || value > max {
        return Err(CodecError::ValueOutOfRange {
            field,
            value,
            width,
        });
    }
    frame.extend_from_slice(&value.to_le_bytes()[..width]);
    Ok(())
}

fn milli(value: i32) -> i64 {
    i64::from(value) * MILLI
}

/// Build the fixed 14-byte multi-loop position frame
///
/// `degree_position` is sent in milli-degrees; values that do not fit the
/// 4-byte position field are rejected rather than truncated.
pub fn encode_multi_loop(motor_id: u8, degree_position: i32) -> Result<Vec<u8>> {
    let mut frame = Vec::with_capacity(MULTI_LOOP_FRAME_SIZE);
    frame.extend_from_slice(&[FRAME_HEAD, MULTI_LOOP_OPCODE, motor_id, MULTI_LOOP_PAYLOAD_SIZE]);
    frame.push(0x00); // header checksum placeholder

    put_le(&mut frame, "position", milli(degree_position), ANGLE_WIDTH)?;
    frame.resize(MULTI_LOOP_FRAME_SIZE - 1, 0x00);

    let header_checksum = checksum(&frame[..HEADER_LEN]);
    frame[HEADER_LEN] = header_checksum;
    let payload_checksum = checksum(&frame[PAYLOAD_OFFSET..MULTI_LOOP_FRAME_SIZE - 1]);
    frame.push(payload_checksum);

    Ok(frame)
}

/// Build a frame for any command in `table`
///
/// Payload fields follow the header checksum in the order direction, angle,
/// speed, torque; the rest of the payload is zero. Commands with a single
/// checksum position end right after the header checksum.
pub fn encode_command(
    table: &CommandTable,
    command_id: u8,
    params: &CommandParams,
) -> Result<Vec<u8>> {
    let descriptor = table.lookup(command_id)?;

    let mut frame = Vec::with_capacity(descriptor.frame_size);
    frame.extend_from_slice(&[
        FRAME_HEAD,
        descriptor.opcode,
        params.motor_id,
        descriptor.payload_size,
    ]);
    let header_checksum = checksum(&frame[..descriptor.checksum_positions[0]]);
    frame.push(header_checksum);

    if !descriptor.checks_payload() {
        return Ok(frame);
    }

    if descriptor.has_direction {
        frame.push(params.direction);
    }
    if descriptor.has_angle {
        let slot_end = frame.len() + descriptor.angle_slot;
        put_le(&mut frame, "position", milli(params.degree_position), ANGLE_WIDTH)?;
        frame.resize(slot_end, 0x00);
    }
    if descriptor.has_speed {
        put_le(&mut frame, "speed", milli(params.speed), SPEED_WIDTH)?;
    }
    if descriptor.has_torque {
        put_le(&mut frame, "torque", i64::from(params.torque), TORQUE_WIDTH)?;
    }

    frame.resize(descriptor.frame_size, 0x00);
    let last = descriptor.frame_size - 1;
    let payload_checksum = checksum(&frame[PAYLOAD_OFFSET..last]);
    frame[descriptor.checksum_positions[1]] = payload_checksum;

    Ok(frame)
}

/// Multi-loop frame through the table path (same bytes as `encode_multi_loop`)
pub fn encode_multi_loop_command(
    table: &CommandTable,
    motor_id: u8,
    degree_position: i32,
) -> Result<Vec<u8>> {
    let params = CommandParams {
        degree_position,
        ..CommandParams::new(motor_id)
    };
    encode_command(table, CommandKind::MultiLoopAngle1.id(), &params)
}
