/// Cold-start recovery logic.
///
/// This module handles the open path: discovering sealed segments on disk,
/// repairing a segment whose index build was interrupted, and rebuilding
/// the active in-memory index from `current.log`.
use anyhow::{Context, Result};
use keydir::KeyDir;
use logfile::LogFile;
use segment::SealedSegment;
use std::path::Path;
use tracing::{debug, warn};

use crate::write::index_record;

/// Collects the ids of sealed segments (`N.log` files) in ascending order.
///
/// Only regular files named `<digits>.log` count; `current.log`, index
/// files and any stray files are ignored.
pub(crate) fn discover_sealed_ids(dir: &Path) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(stem) = name.strip_suffix(".log") else {
            continue;
        };
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(id) = stem.parse::<u64>() else { continue };
        ids.push(id);
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Opens sealed segment `id`, first rebuilding its index file if a crash
/// between the rotation rename and the index build left it missing.
pub(crate) fn open_sealed(dir: &Path, id: u64) -> Result<SealedSegment> {
    let idx = segment::idx_path(dir, id);
    if !idx.exists() {
        warn!(segment = id, "index file missing, rebuilding");
        segment::build_index(&segment::log_path(dir, id), &idx)
            .with_context(|| format!("rebuild index for segment {id}"))?;
    }
    SealedSegment::open(dir, id).with_context(|| format!("open sealed segment {id}"))
}

/// Replays the active log into a fresh keydir, truncating any torn tail.
///
/// Replay goes through the same insert as the steady-state write path, so
/// a key overwritten within the log ends up pointing at its newest record.
pub(crate) fn rebuild_keydir(log: &mut LogFile, keydir: &mut KeyDir) -> Result<()> {
    let before = log.len();
    log.recover(|file, _header, key, offset| index_record(file, keydir, key, offset))
        .context("replay active log")?;

    if log.len() < before {
        warn!(
            discarded = before - log.len(),
            "torn tail truncated from active log"
        );
    }
    debug!(entries = keydir.len(), "active index rebuilt");
    Ok(())
}
