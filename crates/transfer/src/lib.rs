//! File side of a chunked upload.
//!
//! The server dictates the block size; [`BlockPlan`] turns it into a
//! contiguous 1-based block sequence and [`BlockReader`] reads those blocks
//! from disk one at a time.

mod plan;
mod progress;
mod reader;

pub use plan::{BlockPlan, BlockSpan};
pub use progress::SpeedCalculator;
pub use reader::{BlockReader, FileBlock};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("block size must be greater than zero")]
    ZeroBlockSize,

    #[error("file changed while reading: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },
}
