// Telemetry reply decoding
//
// Reply layout: [0x3E, opcode, id, length, header checksum,
//                temperature, torque(2), speed(2), position(2), checksum]
// Multi-byte fields are little-endian on the wire.

use serde::{Deserialize, Serialize};

use super::error::{CodecError, Result};

/// One telemetry quantity and the inclusive byte range it occupies in a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseField {
    pub label: &'static str,
    pub unit: &'static str,
    pub start: usize,
    pub end: usize,
}

/// Telemetry fields, in output order
pub const RESPONSE_FIELDS: [ResponseField; 4] = [
    ResponseField {
        label: "Temperature",
        unit: "C",
        start: 5,
        end: 5,
    },
    ResponseField {
        label: "Torque",
        unit: "N/m",
        start: 6,
        end: 7,
    },
    ResponseField {
        label: "Speed",
        unit: "dps",
        start: 8,
        end: 9,
    },
    ResponseField {
        label: "Position",
        unit: "Encoder",
        start: 10,
        end: 11,
    },
];

/// Bytes a reply needs for every field to be complete
pub const RESPONSE_MIN_LEN: usize = 12;

// Every field must fit the u32 accumulator
const _: () = {
    let mut i = 0;
    while i < RESPONSE_FIELDS.len() {
        assert!(RESPONSE_FIELDS[i].start <= RESPONSE_FIELDS[i].end);
        assert!(RESPONSE_FIELDS[i].end - RESPONSE_FIELDS[i].start < 4);
        assert!(RESPONSE_FIELDS[i].end < RESPONSE_MIN_LEN);
        i += 1;
    }
};

/// Decoded telemetry record, index-aligned with `RESPONSE_FIELDS`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub values: [u32; 4],
    /// Set when the reply was too short to fill every field
    pub partial: bool,
}

impl TelemetrySample {
    pub fn temperature(&self) -> u32 {
        self.values[0]
    }

    pub fn torque(&self) -> u32 {
        self.values[1]
    }

    pub fn speed(&self) -> u32 {
        self.values[2]
    }

    pub fn position(&self) -> u32 {
        self.values[3]
    }

    /// Pairs each value with its field description
    pub fn fields(&self) -> impl Iterator<Item = (&'static ResponseField, u32)> + '_ {
        let fields: &'static [ResponseField; 4] = &RESPONSE_FIELDS;
        fields.iter().zip(self.values.iter().copied())
    }
}

/// Decode a reply buffer
///
/// Bytes past the end of `raw` are skipped, so a short reply yields the value
/// of whatever bytes of each field did arrive (`partial` is set). A field with
/// no bytes at all is a `MalformedResponse`.
pub fn decode_response(raw: &[u8]) -> Result<TelemetrySample> {
    let mut sample = TelemetrySample {
        partial: raw.len() < RESPONSE_MIN_LEN,
        ..TelemetrySample::default()
    };

    for (slot, field) in sample.values.iter_mut().zip(RESPONSE_FIELDS.iter()) {
        *slot = decode_field(raw, field)?;
    }
    Ok(sample)
}

/// Decode the first `valid_len` bytes of a receive buffer
pub fn decode_response_len(buf: &[u8], valid_len: usize) -> Result<TelemetrySample> {
    decode_response(&buf[..valid_len.min(buf.len())])
}

/// Highest offset first, so the last wire byte becomes the most significant
fn decode_field(raw: &[u8], field: &ResponseField) -> Result<u32> {
    let mut value: u32 = 0;
    let mut seen = 0;
    for index in (field.start..=field.end).rev() {
        if let Some(&byte) = raw.get(index) {
            value = (value << 8) | u32::from(byte);
            seen += 1;
        }
    }

    if seen == 0 {
        return Err(CodecError::MalformedResponse {
            reason: format!(
                "{} needs bytes {}..={}, reply has {} bytes",
                field.label,
                field.start,
                field.end,
                raw.len()
            ),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_reply() {
        let sample = decode_response(&[0u8; 13]).unwrap();
        assert_eq!(sample.values, [0, 0, 0, 0]);
        assert!(!sample.partial);
    }

    #[test]
    fn test_status_reply() {
        // temperature 0x01, torque 00 2C, speed 0x1234, position 0xBEEF
        let reply = [
            0x3E, 0x9C, 0x01, 0x07, 0xEA, 0x01, 0x00, 0x2C, 0x34, 0x12, 0xEF, 0xBE, 0x00,
        ];
        let sample = decode_response(&reply).unwrap();
        assert_eq!(sample.temperature(), 1);
        assert_eq!(sample.torque(), 0x2C00);
        assert_eq!(sample.speed(), 0x1234);
        assert_eq!(sample.position(), 0xBEEF);
    }

    #[test]
    fn test_torque_high_byte_first() {
        // offset 7 is read first and lands in the high byte
        let mut reply = [0u8; 12];
        reply[5] = 0x01;
        reply[6] = 0x2C;
        reply[7] = 0x00;
        let sample = decode_response(&reply).unwrap();
        assert_eq!(sample.temperature(), 1);
        assert_eq!(sample.torque(), 0x002C);
        assert_eq!(sample.torque(), 44);
    }

    #[test]
    fn test_truncated_reply_is_partial() {
        // position has only its low byte (offset 10)
        let mut reply = [0u8; 11];
        reply[10] = 0x7F;
        let sample = decode_response(&reply).unwrap();
        assert!(sample.partial);
        assert_eq!(sample.position(), 0x7F);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = decode_response(&[0u8; 9]).unwrap_err();
        match err {
            CodecError::MalformedResponse { reason } => assert!(reason.contains("Position")),
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
        assert!(decode_response(&[]).is_err());
    }

    #[test]
    fn test_declared_length() {
        let mut buf = [0xFFu8; 32];
        buf[..12].fill(0);
        let sample = decode_response_len(&buf, 12).unwrap();
        assert_eq!(sample.values, [0, 0, 0, 0]);

        // declared length larger than the buffer is clamped
        assert!(decode_response_len(&[0u8; 12], 100).is_ok());
        assert!(decode_response_len(&buf, 4).is_err());
    }

    #[test]
    fn test_fields_labels() {
        let sample = TelemetrySample {
            values: [30, 1, 2, 3],
            partial: false,
        };
        let labels: Vec<_> = sample.fields().map(|(f, v)| (f.label, v)).collect();
        assert_eq!(
            labels,
            vec![("Temperature", 30), ("Torque", 1), ("Speed", 2), ("Position", 3)]
        );
    }
}
