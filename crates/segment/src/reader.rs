use std::fs::File;
use std::path::Path;

use logfile::{key_matches_at, read_value_at};

use crate::format::{read_bucket_count, Bucket, OFFSETS_PER_BUCKET};
use crate::{idx_path, log_path, SegmentError};

/// Read-only view of a sealed segment: the `N.log` / `N.idx` file pair.
///
/// Both handles are opened once and owned for the engine's lifetime.
/// Lookups cost one bucket read plus, per candidate slot, a header/key
/// compare against the log — positional reads only, no seeking state.
pub struct SealedSegment {
    id: u64,
    log: File,
    idx: File,
    buckets: u32,
}

impl SealedSegment {
    /// Opens segment `id` inside `dir`.
    ///
    /// Fails with [`SegmentError::Corrupt`] if the index header is
    /// unreadable or its bucket count is zero.
    pub fn open(dir: &Path, id: u64) -> Result<Self, SegmentError> {
        let log = File::open(log_path(dir, id))?;
        let idx = File::open(idx_path(dir, id))?;
        let buckets = read_bucket_count(&idx)?;
        Ok(Self {
            id,
            log,
            idx,
            buckets,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn buckets(&self) -> u32 {
        self.buckets
    }

    /// Looks up `key` (whose hash the caller has already computed).
    ///
    /// Scans every slot of the key's bucket. Empty slots are skipped, not
    /// treated as end-of-bucket: the format permits an occupied slot after
    /// a hole.
    pub fn get(&self, hash: u32, key: &[u8]) -> Result<Option<Vec<u8>>, SegmentError> {
        let bucket = Bucket::read_at(&self.idx, hash % self.buckets)?;
        for i in 0..OFFSETS_PER_BUCKET {
            let offset = bucket.slot(i);
            if offset == 0 {
                continue;
            }
            if let Some(header) = key_matches_at(&self.log, offset, key)? {
                return Ok(Some(read_value_at(&self.log, offset, &header)?));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for SealedSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedSegment")
            .field("id", &self.id)
            .field("buckets", &self.buckets)
            .finish()
    }
}
