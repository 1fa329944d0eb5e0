//! # Engine - CaskKV storage engine
//!
//! The central orchestrator that ties together the [`logfile`], [`keydir`],
//! and [`segment`] crates into a complete Bitcask-style key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → append to current.log              │
//! │              → keydir insert (hash → offset)  │
//! │              |                                │
//! │              |  (rotate() / size threshold)   │
//! │              v                                │
//! │ rotate.rs → rename to N.log → build N.idx     │
//! │              → fresh current.log              │
//! │                                               │
//! │ read.rs  → keydir → sealed segments           │
//! │             (newest first, first match wins)  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                                |
//! |--------------|--------------------------------------------------------|
//! | [`lib.rs`]   | `Engine` struct, open, accessors, `Debug`, conveniences |
//! | [`recovery`] | Segment discovery, index repair, keydir rebuild         |
//! | [`write`]    | `put()` and the active-index insert                     |
//! | [`read`]     | `get()`                                                 |
//! | [`rotate`]   | Sealing the active log into a numbered segment          |
//!
//! ## Lookup order
//!
//! ```text
//! ┌────────────────────────────┐  ← freshest, checked first
//! │ ACTIVE (keydir + log)      │
//! ├────────────────────────────┤
//! │ sealed segment N           │
//! ├────────────────────────────┤
//! │ ...                        │
//! ├────────────────────────────┤
//! │ sealed segment 0           │  ← oldest
//! └────────────────────────────┘
//! ```
//!
//! ## Crash Safety
//!
//! Appends are buffered by the OS; the engine never calls `fsync`, so a
//! `put` that returned may be lost on an unclean shutdown. What recovery
//! guarantees is that such a loss only ever manifests as a *torn tail* —
//! trailing bytes that do not form a complete record — which `open`
//! truncates away. A crash between the rotation rename and the index build
//! leaves `N.log` without `N.idx`; `open` rebuilds the index before
//! loading the segment.

mod read;
mod recovery;
mod rotate;
mod write;

use anyhow::{Context, Result};
use keydir::KeyDir;
use logfile::LogFile;
use segment::SealedSegment;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filename of the active log within the database directory.
pub const ACTIVE_LOG: &str = "current.log";

/// Maximum allowed key size in bytes (bounded by the u16 length field).
pub const MAX_KEY_SIZE: usize = logfile::MAX_KEY_BYTES;

/// A Bitcask-style embedded key-value store over a single directory.
///
/// # Write Path
///
/// 1. Append the record to `current.log` (single buffered write).
/// 2. Record the offset in the in-memory keydir under the key's XXH32
///    hash, replacing the chain entry of an earlier write of the same key.
/// 3. If a rotation threshold is set and the log has outgrown it, rotate.
///
/// # Read Path
///
/// 1. Probe the keydir; chain entries are verified against the log.
/// 2. Probe sealed segments newest to oldest through their on-disk hash
///    indexes. First match wins.
///
/// # Recovery
///
/// On [`open`](Engine::open) the directory is scanned for `N.log` files,
/// each sealed segment is loaded (rebuilding a missing `N.idx`), and the
/// keydir is rebuilt by replaying `current.log`, truncating any torn tail.
pub struct Engine {
    pub(crate) dir: PathBuf,
    /// The active log, `current.log`, open read/write.
    pub(crate) log: LogFile,
    /// In-memory index over the active log.
    pub(crate) keydir: KeyDir,
    /// Sealed segments, newest first.
    pub(crate) sealed: Vec<SealedSegment>,
    /// Next segment number; strictly greater than every sealed id.
    pub(crate) next_n: u64,
    /// Active-log byte size that triggers a rotation after a put.
    /// `0` disables size-triggered rotation.
    pub(crate) rotate_threshold: u64,
}

impl Engine {
    /// Opens (creating if absent) a database directory and recovers its
    /// state.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create database directory {}", dir.display()))?;

        let ids = recovery::discover_sealed_ids(&dir)?;
        let next_n = ids.last().map(|&n| n + 1).unwrap_or(0);

        let mut sealed = Vec::with_capacity(ids.len());
        for &id in &ids {
            sealed.push(recovery::open_sealed(&dir, id)?);
        }
        // Discovery walked ascending; lookups want newest first.
        sealed.reverse();

        let mut log = LogFile::open(dir.join(ACTIVE_LOG))
            .with_context(|| format!("open active log in {}", dir.display()))?;
        let mut keydir = KeyDir::new();
        recovery::rebuild_keydir(&mut log, &mut keydir)?;

        debug!(
            segments = sealed.len(),
            next_n,
            active_bytes = log.len(),
            "database opened"
        );

        Ok(Self {
            dir,
            log,
            keydir,
            sealed,
            next_n,
            rotate_threshold: 0,
        })
    }

    /// Closes the database, releasing every file handle and dropping the
    /// active index.
    pub fn close(self) {}

    /// Number of sealed segments currently loaded.
    #[must_use]
    pub fn sealed_count(&self) -> usize {
        self.sealed.len()
    }

    /// Size of the active log in bytes (reserved byte included).
    #[must_use]
    pub fn active_log_len(&self) -> u64 {
        self.log.len()
    }

    /// Number of offsets held by the active in-memory index.
    #[must_use]
    pub fn active_index_len(&self) -> usize {
        self.keydir.len()
    }

    /// The size-triggered rotation threshold in bytes (`0` = disabled).
    #[must_use]
    pub fn rotate_threshold(&self) -> u64 {
        self.rotate_threshold
    }

    /// Sets the rotation threshold. Set to `0` to rotate manually only.
    pub fn set_rotate_threshold(&mut self, bytes: u64) {
        self.rotate_threshold = bytes;
    }

    /// Iterates the active index as `(hash, offset)` pairs, for inspection.
    pub fn dump_index(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.keydir.iter()
    }

    // ---- string conveniences over the byte-slice API ----

    /// `put` for UTF-8 callers.
    pub fn put_str(&mut self, key: &str, value: &str) -> Result<()> {
        self.put(key.as_bytes(), value.as_bytes())
    }

    /// `get` for UTF-8 callers. Unlike [`get`](Engine::get), a miss is an
    /// error rather than `None`.
    pub fn get_string(&self, key: &str) -> Result<String> {
        match self.get(key.as_bytes())? {
            Some(value) => Ok(String::from_utf8_lossy(&value).into_owned()),
            None => anyhow::bail!("key not found: {key}"),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dir", &self.dir)
            .field("active_bytes", &self.log.len())
            .field("active_index_entries", &self.keydir.len())
            .field("sealed_segments", &self.sealed.len())
            .field("next_segment", &self.next_n)
            .field("rotate_threshold", &self.rotate_threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests;
