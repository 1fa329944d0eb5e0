/// Read path: `get()`.
///
/// Point lookups probe the active keydir first (freshest data), then the
/// sealed segments from newest to oldest. The first record whose stored
/// key matches wins.
use anyhow::{Context, Result};
use logfile::{key_hash, key_matches_at, read_value_at};

use crate::Engine;

impl Engine {
    /// Looks up a key, returning the most recently written value or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if any log or index read fails; a plain miss is
    /// `Ok(None)`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let hash = key_hash(key);

        // 1. Active segment: verify each chain entry against the log.
        for &offset in self.keydir.offsets(hash) {
            if let Some(header) = key_matches_at(self.log.file(), offset, key)? {
                return Ok(Some(read_value_at(self.log.file(), offset, &header)?));
            }
        }

        // 2. Sealed segments, newest -> oldest.
        for seg in &self.sealed {
            if let Some(value) = seg
                .get(hash, key)
                .with_context(|| format!("lookup in segment {}", seg.id()))?
            {
                return Ok(Some(value));
            }
        }

        // 3. Not found anywhere.
        Ok(None)
    }
}
