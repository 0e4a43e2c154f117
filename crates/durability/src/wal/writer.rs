//! WAL writer with durability mode support.
//!
//! Appends one frame per committed atomic group to a single log file and
//! fsyncs according to the configured [`DurabilityMode`].

use super::{DurabilityMode, WalRecord};
use roster_core::{RosterError, RosterResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Cumulative WAL operation counters.
///
/// Accumulated over the lifetime of the writer and never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalCounters {
    /// Records appended
    pub appends: u64,
    /// fsync calls
    pub sync_calls: u64,
    /// Bytes written, frame headers included
    pub bytes_written: u64,
}

/// Failure to inject into the next append
#[cfg(any(test, feature = "fault-injection"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalFault {
    /// Only the first half of the frame reaches the file
    TornWrite,
    /// The whole frame is written but the fsync fails
    SyncFailure,
}

#[cfg(any(test, feature = "fault-injection"))]
impl WalFault {
    fn inject(self, file: &mut BufWriter<File>, frame: &[u8]) -> std::io::Result<()> {
        let written = match self {
            WalFault::TornWrite => &frame[..frame.len() / 2],
            WalFault::SyncFailure => frame,
        };
        file.write_all(written)?;
        file.flush()?;
        Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("injected {:?}", self),
        ))
    }
}

/// Appends committed groups to the WAL
///
/// In `Cache` mode no file is opened and every call is a no-op.
///
/// A failed append is cut back off the file before the error is returned,
/// so the log only ever ends in whole frames of acknowledged commits. If
/// that cut fails too the writer refuses every later append.
pub struct WalWriter {
    file: Option<BufWriter<File>>,
    path: PathBuf,
    durability: DurabilityMode,
    writes_since_sync: usize,
    last_sync_time: Instant,
    has_unsynced_data: bool,
    counters: WalCounters,
    /// File length after the last successful append
    end_offset: u64,
    failed: bool,
    #[cfg(any(test, feature = "fault-injection"))]
    fault: Option<WalFault>,
}

impl WalWriter {
    /// Open (or create) the log at `path` for appending
    ///
    /// The parent directory is created if needed.
    pub fn open(path: impl Into<PathBuf>, durability: DurabilityMode) -> std::io::Result<Self> {
        let path = path.into();
        let (file, end_offset) = if durability.requires_wal() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let len = file.metadata()?.len();
            (Some(BufWriter::new(file)), len)
        } else {
            (None, 0)
        };

        Ok(WalWriter {
            file,
            path,
            durability,
            writes_since_sync: 0,
            last_sync_time: Instant::now(),
            has_unsynced_data: false,
            counters: WalCounters::default(),
            end_offset,
            failed: false,
            #[cfg(any(test, feature = "fault-injection"))]
            fault: None,
        })
    }

    /// Append a record.
    ///
    /// - `Cache`: no-op
    /// - `Always`: written and fsynced before returning
    /// - `Standard`: written to the OS; fsynced once `batch_size` appends are pending
    ///
    /// # Errors
    ///
    /// `Io` if the write or a due fsync fails. The partial frame is removed
    /// first, so the same version may be appended again. `Storage` once a
    /// removal has failed and the writer is unusable.
    pub fn append(&mut self, record: &WalRecord) -> RosterResult<()> {
        if self.file.is_none() {
            return Ok(());
        }
        if self.failed {
            return Err(RosterError::storage(format!(
                "WAL {} is unusable after a failed append",
                self.path.display()
            )));
        }

        let frame = record.to_frame()?;
        let synced = match self.write_frame(&frame) {
            Ok(synced) => synced,
            Err(e) => {
                self.roll_back();
                return Err(e.into());
            }
        };

        self.counters.appends += 1;
        self.counters.bytes_written += frame.len() as u64;
        self.end_offset += frame.len() as u64;
        if synced {
            self.writes_since_sync = 0;
            self.last_sync_time = Instant::now();
            self.has_unsynced_data = false;
        } else {
            self.writes_since_sync += 1;
            self.has_unsynced_data = true;
        }
        Ok(())
    }

    /// Write one frame and fsync it if the mode says so; returns whether it synced
    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<bool> {
        let due = match self.durability {
            DurabilityMode::Always => true,
            DurabilityMode::Standard { batch_size, .. } => self.writes_since_sync + 1 >= batch_size,
            DurabilityMode::Cache => false,
        };
        let Some(file) = self.file.as_mut() else {
            return Ok(false);
        };

        #[cfg(any(test, feature = "fault-injection"))]
        if let Some(fault) = self.fault.take() {
            fault.inject(file, frame)?;
        }

        file.write_all(frame)?;
        file.flush()?;
        if due {
            file.get_ref().sync_data()?;
            self.counters.sync_calls += 1;
        }
        Ok(due)
    }

    /// Cut the file back to the end of the last good frame
    fn roll_back(&mut self) {
        let Some(writer) = self.file.take() else {
            return;
        };
        // Buffered bytes of the failed frame are dropped with the writer
        let (file, _) = writer.into_parts();
        match file.set_len(self.end_offset).and_then(|_| file.sync_data()) {
            Ok(()) => {
                warn!(target: "roster::wal", offset = self.end_offset, "rolled back failed append");
            }
            Err(e) => {
                warn!(target: "roster::wal", error = %e, "could not roll back failed append");
                self.failed = true;
            }
        }
        self.file = Some(BufWriter::new(file));
    }

    /// Make the next append fail with `fault`
    #[cfg(any(test, feature = "fault-injection"))]
    pub fn inject_fault(&mut self, fault: WalFault) {
        self.fault = Some(fault);
    }

    /// fsync everything written so far
    pub fn sync(&mut self) -> std::io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
            file.get_ref().sync_data()?;
            self.counters.sync_calls += 1;
        }
        self.writes_since_sync = 0;
        self.last_sync_time = Instant::now();
        self.has_unsynced_data = false;
        Ok(())
    }

    /// fsync if `Standard` mode's interval has elapsed with data pending.
    ///
    /// Called from the maintenance thread so the interval holds even when no
    /// new commits arrive. Returns `true` if a sync was performed.
    pub fn sync_if_overdue(&mut self) -> std::io::Result<bool> {
        if !self.has_unsynced_data {
            return Ok(false);
        }
        if let DurabilityMode::Standard { interval_ms, .. } = self.durability {
            if self.last_sync_time.elapsed().as_millis() as u64 >= interval_ms {
                self.sync()?;
                debug!(target: "roster::wal", "periodic fsync");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Cumulative counters
    pub fn counters(&self) -> WalCounters {
        self.counters
    }

    /// Log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured durability mode
    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if self.has_unsynced_data {
            let _ = self.sync();
        }
    }
}
