/// Write path: `put()` and the active-index insert.
///
/// All mutations flow through this module. A record is appended to the
/// active log, then its offset is recorded in the keydir under the key's
/// hash. The log holds every version of a key; the keydir points at the
/// newest one.
use anyhow::{ensure, Context, Result};
use keydir::KeyDir;
use logfile::{key_hash, key_matches_at, LogError};
use std::fs::File;

use crate::{Engine, MAX_KEY_SIZE};

impl Engine {
    /// Inserts a key-value pair.
    ///
    /// The record is appended to the active log (never updated in place),
    /// then indexed. If a rotation threshold is configured and the log has
    /// outgrown it, the segment is rotated before returning.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        ensure!(!key.is_empty(), "key must not be empty");
        ensure!(
            key.len() <= MAX_KEY_SIZE,
            "key too large: {} bytes (max {})",
            key.len(),
            MAX_KEY_SIZE
        );
        ensure!(
            value.len() <= u32::MAX as usize,
            "value too large: {} bytes",
            value.len()
        );

        let offset = self
            .log
            .append(key, value)
            .context("append to active log")?;
        index_record(self.log.file(), &mut self.keydir, key, offset)
            .context("update active index")?;

        if self.rotate_threshold > 0 && self.log.len() >= self.rotate_threshold {
            self.rotate().context("size-triggered rotation")?;
        }

        Ok(())
    }
}

/// Records `offset` as the newest location of `key` in the keydir.
///
/// The key-compare scan is confined to the offset chain of the key's own
/// hash. A chain entry whose stored key matches is replaced in place;
/// otherwise the offset joins the chain, which only happens on a genuine
/// 32-bit hash collision between distinct keys.
pub(crate) fn index_record(
    log: &File,
    keydir: &mut KeyDir,
    key: &[u8],
    offset: u32,
) -> Result<(), LogError> {
    let hash = key_hash(key);

    let mut found = None;
    for (i, &off) in keydir.offsets(hash).iter().enumerate() {
        if key_matches_at(log, off, key)?.is_some() {
            found = Some(i);
            break;
        }
    }
    match found {
        Some(i) => keydir.set(hash, i, offset),
        None => keydir.push(hash, offset),
    }
    Ok(())
}
