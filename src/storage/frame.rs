//! On-disk record frame codec
//!
//! Frame format:
//!
//! ```text
//! +--------+-------------+-----+------------------------------+
//! | status | decLength   | '|' | field1|field2|...|fieldN|    |
//! | 1 byte | ASCII digits|     | decLength bytes              |
//! +--------+-------------+-----+------------------------------+
//! ```
//!
//! `status` is `+` for a live frame and `*` for a tombstone. Tombstoning
//! flips only that byte, so a frame's span never changes. Reused slots may
//! be followed by space padding up to the slot's capacity; a frame never
//! starts with a space.
//!
//! Decoding never fails loudly: anything unreadable yields `None` and the
//! caller decides what that means.

use std::io::Read;

/// Separator between fields; also terminates the payload
pub const FIELD_DELIMITER: u8 = b'|';
/// Status byte of a live frame
pub const LIVE_MARKER: u8 = b'+';
/// Status byte of a tombstoned frame
pub const TOMBSTONE_MARKER: u8 = b'*';
/// Filler written after a frame that is shorter than its slot
pub const PAD_BYTE: u8 = b' ';

/// Longest length prefix accepted while decoding (fits any u64)
const MAX_LENGTH_DIGITS: usize = 20;

/// Liveness of a frame as recorded in its status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Live,
    Tombstoned,
}

impl FrameStatus {
    /// Status byte written on disk
    pub fn marker(self) -> u8 {
        match self {
            FrameStatus::Live => LIVE_MARKER,
            FrameStatus::Tombstoned => TOMBSTONE_MARKER,
        }
    }

    /// Parses a status byte
    pub fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            LIVE_MARKER => Some(FrameStatus::Live),
            TOMBSTONE_MARKER => Some(FrameStatus::Tombstoned),
            _ => None,
        }
    }
}

/// A decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub status: FrameStatus,
    pub fields: Vec<String>,
    /// Bytes occupied by the frame itself (status + prefix + payload)
    pub encoded_len: usize,
}

/// Joins fields into the payload string, trailing delimiter included.
pub fn encode_payload(fields: &[String]) -> String {
    let mut payload = String::new();
    for field in fields {
        payload.push_str(field);
        payload.push(FIELD_DELIMITER as char);
    }
    payload
}

/// Encodes fields as a live frame.
pub fn encode(fields: &[String]) -> Vec<u8> {
    let payload = encode_payload(fields);
    let prefix = payload.len().to_string();

    let mut frame = Vec::with_capacity(1 + prefix.len() + 1 + payload.len());
    frame.push(LIVE_MARKER);
    frame.extend_from_slice(prefix.as_bytes());
    frame.push(FIELD_DELIMITER);
    frame.extend_from_slice(payload.as_bytes());
    frame
}

/// Total frame size for a payload of `payload_len` bytes.
pub fn frame_len(payload_len: usize) -> usize {
    1 + payload_len.to_string().len() + 1 + payload_len
}

/// Decodes one frame from the current position of `reader`.
///
/// Returns `None` on short reads, a bad status byte, a non-numeric length,
/// a declared length running past the end of input, a payload missing its
/// trailing delimiter, or invalid UTF-8.
pub fn decode<R: Read>(reader: &mut R) -> Option<Frame> {
    let mut byte = [0u8; 1];

    reader.read_exact(&mut byte).ok()?;
    let status = FrameStatus::from_marker(byte[0])?;

    let mut digits = String::new();
    loop {
        reader.read_exact(&mut byte).ok()?;
        if byte[0] == FIELD_DELIMITER {
            break;
        }
        if !byte[0].is_ascii_digit() || digits.len() >= MAX_LENGTH_DIGITS {
            return None;
        }
        digits.push(byte[0] as char);
    }
    let declared: usize = digits.parse().ok()?;

    // Only bytes actually present are buffered, so a corrupt prefix cannot
    // drive the allocation.
    let mut payload = Vec::new();
    reader
        .by_ref()
        .take(declared as u64)
        .read_to_end(&mut payload)
        .ok()?;
    if payload.len() != declared || payload.last() != Some(&FIELD_DELIMITER) {
        return None;
    }

    let payload = String::from_utf8(payload).ok()?;
    let body = &payload[..payload.len() - 1];
    let fields = body
        .split(FIELD_DELIMITER as char)
        .map(str::to_string)
        .collect();

    Some(Frame {
        status,
        fields,
        encoded_len: 1 + digits.len() + 1 + declared,
    })
}
