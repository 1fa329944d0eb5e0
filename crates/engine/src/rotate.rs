/// Rotation: sealing the active log into a numbered, immutable segment.
use anyhow::{Context, Result};
use logfile::LogFile;
use segment::{build_index, SealedSegment};
use tracing::info;

use crate::{Engine, ACTIVE_LOG};

impl Engine {
    /// Seals the active log and starts a fresh one.
    ///
    /// # Steps
    ///
    /// 1. Rename `current.log` to `N.log`, where `N` is the next segment
    ///    number.
    /// 2. Build the on-disk hash index `N.idx` over the sealed log.
    /// 3. Load the sealed segment into the newest position.
    /// 4. Clear the active in-memory index.
    /// 5. Open a fresh, empty `current.log`.
    ///
    /// A rotated-out key stays readable through the sealed segment's index;
    /// a later `put` of the same key shadows it from the active segment.
    ///
    /// # Errors
    ///
    /// Returns an error on rename or index-build failure. A crash after
    /// the rename but before the index build is repaired on the next
    /// [`open`](Engine::open), which rebuilds the missing `N.idx`.
    pub fn rotate(&mut self) -> Result<()> {
        let n = self.next_n;

        let sealed_log = segment::log_path(&self.dir, n);
        std::fs::rename(self.dir.join(ACTIVE_LOG), &sealed_log)
            .with_context(|| format!("seal active log as segment {n}"))?;

        let buckets = build_index(&sealed_log, &segment::idx_path(&self.dir, n))
            .with_context(|| format!("build index for segment {n}"))?;

        let seg = SealedSegment::open(&self.dir, n)
            .with_context(|| format!("load sealed segment {n}"))?;
        self.sealed.insert(0, seg);
        self.next_n = n + 1;

        self.keydir.clear();
        // The old handle still follows the renamed file; swapping in the
        // new log closes it.
        self.log = LogFile::open(self.dir.join(ACTIVE_LOG))
            .context("reopen fresh active log")?;

        info!(segment = n, buckets, "active log sealed");
        Ok(())
    }
}
