//! WAL reader for recovery.
//!
//! Reads every frame of the log in order. A damaged final frame is what a
//! crash mid-append leaves behind and is reported as a torn tail to be
//! truncated. Damage anywhere before the final frame is corruption.

use super::record::{FrameError, WalRecord};
use roster_core::{RosterError, RosterResult};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::warn;

/// Why reading stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStopReason {
    /// Every byte belonged to a valid frame
    EndOfData,
    /// The last frame was cut short
    PartialRecord,
    /// The last frame's checksum did not match
    TornTail,
}

/// Result of reading a log
#[derive(Debug)]
pub struct WalReadOutcome {
    /// Valid records in log order
    pub records: Vec<WalRecord>,
    /// Byte offset where valid data ends
    pub valid_end: u64,
    /// Total file length
    pub file_len: u64,
    /// Why reading stopped
    pub stop: ReadStopReason,
}

impl WalReadOutcome {
    /// Whether the file has bytes past the last valid frame
    pub fn has_torn_tail(&self) -> bool {
        self.valid_end < self.file_len
    }
}

/// Reads WAL files
pub struct WalReader;

impl WalReader {
    /// Read every record in the log at `path`
    ///
    /// A missing file reads as an empty log.
    ///
    /// # Errors
    ///
    /// `Corruption` for a checksum mismatch before the final frame, an
    /// undecodable payload, or versions that do not strictly increase.
    pub fn read_all(path: &Path) -> RosterResult<WalReadOutcome> {
        let buf = match std::fs::read(path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<WalRecord> = Vec::new();
        let mut offset = 0usize;
        let mut stop = ReadStopReason::EndOfData;

        while offset < buf.len() {
            match WalRecord::from_frame(&buf[offset..]) {
                Ok((record, used)) => {
                    if let Some(prev) = records.last() {
                        if record.version <= prev.version {
                            return Err(RosterError::corruption(format!(
                                "WAL version {} follows {} at offset {}",
                                record.version, prev.version, offset
                            )));
                        }
                    }
                    records.push(record);
                    offset += used;
                }
                Err(FrameError::Incomplete) | Err(FrameError::Oversized { .. }) => {
                    stop = ReadStopReason::PartialRecord;
                    break;
                }
                Err(FrameError::ChecksumMismatch { frame_len, .. })
                    if offset + frame_len == buf.len() =>
                {
                    stop = ReadStopReason::TornTail;
                    break;
                }
                Err(e) => {
                    return Err(RosterError::corruption(format!(
                        "WAL frame at offset {}: {}",
                        offset, e
                    )));
                }
            }
        }

        Ok(WalReadOutcome {
            records,
            valid_end: offset as u64,
            file_len: buf.len() as u64,
            stop,
        })
    }

    /// Cut the log back to `valid_end`
    pub fn truncate(path: &Path, valid_end: u64) -> RosterResult<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        let len = file.metadata()?.len();
        if len > valid_end {
            warn!(
                target: "roster::wal",
                discarded_bytes = len - valid_end,
                "truncating torn WAL tail"
            );
            file.set_len(valid_end)?;
            file.sync_all()?;
        }
        Ok(())
    }
}
