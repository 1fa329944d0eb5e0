//! # segment — sealed segments and their on-disk hash index
//!
//! A sealed segment is the immutable pair of files a rotation leaves
//! behind: `N.log` (byte-identical to the active log at the moment it was
//! sealed) and `N.idx` (a bucketed hash index over it). Once sealed,
//! neither file is ever modified.
//!
//! ## Index file layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ buckets: u32 LE                               │
//! ├──────────────────────────────────────────────┤
//! │ bucket[0]        17 bytes                     │
//! │ bucket[1]                                     │
//! │ ...                                           │
//! │ bucket[buckets - 1]                           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Each bucket is one reserved zero byte followed by four u32 LE offset
//! slots. A slot value of `0` means empty — safe because offset 0 is
//! reserved in every log. A key with hash `h` lives in bucket
//! `h mod buckets`; lookups scan all four slots, and a zero slot does NOT
//! end the scan — the format permits an occupied slot after a hole.
//!
//! The index is written once, at rotation, by [`build_index`]: starting at
//! 8 buckets and doubling whenever a bucket overflows, so the final table
//! holds every key in its natural bucket with no probing.

mod builder;
mod format;
mod reader;

pub use builder::build_index;
pub use format::{
    bucket_pos, Bucket, BUCKET_BYTES, INDEX_HEADER_BYTES, INITIAL_BUCKETS, OFFSETS_PER_BUCKET,
};
pub use reader::SealedSegment;

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by sealed-segment operations.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// An underlying file operation failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The index header is unreadable or carries a zero bucket count.
    #[error("corrupt segment index")]
    Corrupt,

    /// A record read against the sealed log failed.
    #[error("log error: {0}")]
    Log(#[from] logfile::LogError),
}

/// Path of a sealed segment's log file within `dir`.
pub fn log_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{id}.log"))
}

/// Path of a sealed segment's index file within `dir`.
pub fn idx_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{id}.idx"))
}

#[cfg(test)]
mod tests;
