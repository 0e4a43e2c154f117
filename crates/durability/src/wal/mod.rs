//! Write-ahead log
//!
//! A single append-only file holding one checksummed frame per committed
//! atomic group, replayed in order on open.

pub mod mode;
pub mod reader;
pub mod record;
pub mod writer;

pub use mode::DurabilityMode;
pub use reader::{ReadStopReason, WalReadOutcome, WalReader};
pub use record::{FrameError, WalRecord, FRAME_HEADER_SIZE};
pub use writer::{WalCounters, WalWriter};

#[cfg(feature = "fault-injection")]
pub use writer::WalFault;

/// WAL directory name inside a data directory
pub const WAL_DIR_NAME: &str = "wal";

/// WAL file name inside the WAL directory
pub const WAL_FILE_NAME: &str = "roster.wal";
