//! Modifications block
//!
//! Binary layout, little endian:
//!
//! ```text
//! repeat per engineered slot:
//!   i8  slot index (0 = bulkheads, then standard, hardpoints, internal)
//!   [i8 -2, i32 blueprint id]
//!   [i8 -3, i32 grade]
//!   [i8 -4, i32 special id]
//!   repeat: i8 feature id, i32 value
//!   i8  -1
//! i8 -1
//! ```
//!
//! The block is gzip-compressed and base64-encoded. Bytes after the final
//! marker are ignored; older writers padded the buffer with zeros.

use base64::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use std::io::{self, Cursor, Read, Write};

use super::DecodeError;

const END: i8 = -1;
const BLUEPRINT: i8 = -2;
const GRADE: i8 = -3;
const SPECIAL: i8 = -4;

/// Operating system byte written into the gzip header (Unix)
const GZIP_OS: u8 = 3;

/// Engineering of one slot as carried on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotRecord {
    pub slot: usize,
    pub blueprint: Option<i32>,
    pub grade: Option<i32>,
    pub special: Option<i32>,
    /// (feature id, value) in display order
    pub deltas: Vec<(i8, i32)>,
}

fn corrupt(detail: impl std::fmt::Display) -> DecodeError {
    DecodeError::CorruptModifications(detail.to_string())
}

/// Serialize slot records to the uncompressed binary layout
pub fn to_bytes(records: &[SlotRecord]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    for record in records {
        let slot = i8::try_from(record.slot).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("slot index {} out of range", record.slot),
            )
        })?;
        buf.write_i8(slot)?;
        for (marker, value) in [
            (BLUEPRINT, record.blueprint),
            (GRADE, record.grade),
            (SPECIAL, record.special),
        ] {
            if let Some(value) = value {
                buf.write_i8(marker)?;
                buf.write_i32::<LittleEndian>(value)?;
            }
        }
        for &(feature, value) in &record.deltas {
            buf.write_i8(feature)?;
            buf.write_i32::<LittleEndian>(value)?;
        }
        buf.write_i8(END)?;
    }
    buf.write_i8(END)?;
    Ok(buf)
}

/// Parse the uncompressed binary layout
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<SlotRecord>, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::new();

    loop {
        let slot = cursor.read_i8().map_err(|_| corrupt("truncated block"))?;
        if slot == END {
            return Ok(records);
        }
        let slot = usize::try_from(slot).map_err(|_| corrupt(format!("bad slot index {slot}")))?;
        let mut record = SlotRecord {
            slot,
            ..SlotRecord::default()
        };

        loop {
            let id = cursor.read_i8().map_err(|_| corrupt("truncated slot"))?;
            if id == END {
                break;
            }
            let value = cursor
                .read_i32::<LittleEndian>()
                .map_err(|_| corrupt("truncated value"))?;
            match id {
                BLUEPRINT => record.blueprint = Some(value),
                GRADE => record.grade = Some(value),
                SPECIAL => record.special = Some(value),
                feature if feature >= 0 => record.deltas.push((feature, value)),
                other => return Err(corrupt(format!("unknown marker {other}"))),
            }
        }
        records.push(record);
    }
}

/// Compress and encode records; empty when there are none
pub fn encode(records: &[SlotRecord]) -> io::Result<String> {
    if records.is_empty() {
        return Ok(String::new());
    }
    let bytes = to_bytes(records)?;
    let mut encoder = GzBuilder::new()
        .operating_system(GZIP_OS)
        .write(Vec::new(), Compression::default());
    encoder.write_all(&bytes)?;
    let compressed = encoder.finish()?;
    Ok(BASE64_STANDARD.encode(compressed))
}

/// Decode and decompress a block; empty input has no records
pub fn decode(block: &str) -> Result<Vec<SlotRecord>, DecodeError> {
    if block.is_empty() {
        return Ok(Vec::new());
    }
    let compressed = BASE64_STANDARD
        .decode(block)
        .map_err(|e| corrupt(format!("base64: {e}")))?;
    let mut bytes = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut bytes)
        .map_err(|e| corrupt(format!("gzip: {e}")))?;
    from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_shared_block_without_blueprint() {
        // Single power plant delta recorded without a blueprint
        let records = decode("H4sIAAAAAAAAA2MUe8HMwPD/PwMAAGvB0AkAAAA=").unwrap();
        assert_eq!(
            records,
            vec![SlotRecord {
                slot: 1,
                deltas: vec![(22, 1000)],
                ..SlotRecord::default()
            }]
        );
    }

    #[test]
    fn test_decode_shared_block_with_blueprints() {
        let block = "H4sIAAAAAAAAA2P858DAwPCXEUhwHPvx/78YG5AltB7I/8/0TwImJboDSPJ/+/f/v/KlX///i3AwMTBIfARK/Gf+JwVSxArStVAYqOjvz///JVo5GRhE2IBc4SKQSSz/DGEmCa398P8//2+gTf//A7kMAExxqlSAAAAA";
        let records = decode(block).unwrap();
        let slots: Vec<usize> = records.iter().map(|r| r.slot).collect();
        assert_eq!(slots, [1, 2, 3, 4]);
        assert!(records.iter().all(|r| r.blueprint.is_some() && r.grade.is_some()));
        assert!(records.iter().all(|r| !r.deltas.is_empty()));
        assert_eq!(records[0].blueprint, Some(64));
        assert_eq!(records[0].deltas[0], (8, -1850));
    }

    #[test]
    fn test_layout() {
        let records = vec![SlotRecord {
            slot: 3,
            blueprint: Some(5),
            grade: Some(2),
            special: None,
            deltas: vec![(6, 5500), (3, -1000)],
        }];
        let bytes = to_bytes(&records).unwrap();
        assert_eq!(
            bytes,
            [
                3, 0xfe, 5, 0, 0, 0, 0xfd, 2, 0, 0, 0, 6, 0x7c, 0x15, 0, 0, 3, 0x18, 0xfc, 0xff,
                0xff, 0xff, 0xff
            ]
        );
        assert_eq!(from_bytes(&bytes).unwrap(), records);
    }

    #[test]
    fn test_trailing_padding_is_ignored() {
        let mut bytes = to_bytes(&[SlotRecord {
            slot: 0,
            deltas: vec![(1, 10)],
            ..SlotRecord::default()
        }])
        .unwrap();
        bytes.extend_from_slice(&[0; 8]);
        assert_eq!(from_bytes(&bytes).unwrap().len(), 1);
    }

    #[test]
    fn test_encoded_header() {
        let block = encode(&[SlotRecord {
            slot: 1,
            deltas: vec![(22, 1000)],
            ..SlotRecord::default()
        }])
        .unwrap();
        assert!(block.starts_with("H4sIAAAAAAAAA"), "{block}");
        assert_eq!(decode(&block).unwrap()[0].deltas, [(22, 1000)]);
        assert_eq!(encode(&[]).unwrap(), "");
    }

    #[test]
    fn test_corrupt_blocks() {
        assert!(matches!(decode("!!!!"), Err(DecodeError::CorruptModifications(_))));
        assert!(matches!(
            decode(&BASE64_STANDARD.encode(b"not gzip")),
            Err(DecodeError::CorruptModifications(_))
        ));
        assert!(matches!(from_bytes(&[1, 5, 0]), Err(DecodeError::CorruptModifications(_))));
        assert!(matches!(from_bytes(&[1, 0xf0, 0, 0, 0, 0, 0xff]), Err(DecodeError::CorruptModifications(_))));
    }
}
