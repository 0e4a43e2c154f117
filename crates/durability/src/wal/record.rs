//! WAL record framing
//!
//! One record per committed atomic group. On disk each record is a frame:
//!
//! ```text
//! +-----------+-----------+---------------------------+
//! | len (u32) | crc (u32) | payload (len bytes)       |
//! +-----------+-----------+---------------------------+
//! ```
//!
//! Both header fields are little-endian. `crc` is CRC32 of the payload.
//! The payload is the MessagePack encoding of [`WalRecord`].

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use roster_core::{Key, RosterResult, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frame header size in bytes
pub const FRAME_HEADER_SIZE: usize = 8;

/// Upper bound on a single payload; anything larger is treated as garbage
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// One committed atomic group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalRecord {
    /// Commit version
    pub version: u64,
    /// Commit time, microseconds since epoch
    pub timestamp: u64,
    /// Keys written and their values
    pub writes: Vec<(Key, Value)>,
    /// Keys deleted
    pub deletes: Vec<Key>,
}

impl WalRecord {
    /// Encode as a complete frame
    pub fn to_frame(&self) -> RosterResult<Vec<u8>> {
        let payload = rmp_serde::to_vec_named(self)?;
        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.write_u32::<LittleEndian>(payload.len() as u32)?;
        frame.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode the frame at the start of `buf`
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn from_frame(buf: &[u8]) -> Result<(WalRecord, usize), FrameError> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(FrameError::Incomplete);
        }
        let mut header = Cursor::new(&buf[..FRAME_HEADER_SIZE]);
        let len = header
            .read_u32::<LittleEndian>()
            .map_err(|_| FrameError::Incomplete)? as usize;
        let expected = header
            .read_u32::<LittleEndian>()
            .map_err(|_| FrameError::Incomplete)?;

        if len > MAX_PAYLOAD_SIZE {
            return Err(FrameError::Oversized { len });
        }
        let frame_len = FRAME_HEADER_SIZE + len;
        if buf.len() < frame_len {
            return Err(FrameError::Incomplete);
        }

        let payload = &buf[FRAME_HEADER_SIZE..frame_len];
        let actual = crc32fast::hash(payload);
        if actual != expected {
            return Err(FrameError::ChecksumMismatch {
                expected,
                actual,
                frame_len,
            });
        }

        let record =
            rmp_serde::from_slice(payload).map_err(|e| FrameError::Decode(e.to_string()))?;
        Ok((record, frame_len))
    }

    /// Number of keys this record touches
    pub fn mutation_count(&self) -> usize {
        self.writes.len() + self.deletes.len()
    }
}

/// Frame decoding failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the frame declares
    #[error("incomplete frame")]
    Incomplete,

    /// Declared length exceeds the maximum payload size
    #[error("frame length {len} exceeds maximum")]
    Oversized {
        /// Declared payload length
        len: usize,
    },

    /// Payload does not match its checksum
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Checksum stored in the header
        expected: u32,
        /// Checksum of the bytes read
        actual: u32,
        /// Header plus declared payload length
        frame_len: usize,
    },

    /// Checksum held but the payload is not a record
    #[error("undecodable payload: {0}")]
    Decode(String),
}
