use byteorder::{ByteOrder, LittleEndian};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use logfile::{key_hash, key_matches_at, RecordScanner};

use crate::format::{Bucket, BUCKET_BYTES, INDEX_HEADER_BYTES, INITIAL_BUCKETS, OFFSETS_PER_BUCKET};
use crate::SegmentError;

/// Hard ceiling on the doubling loop. More than four occurrences of one
/// full 32-bit hash cannot be separated by any bucket count, so without a
/// ceiling such a log would retry forever.
const MAX_BUCKETS: u32 = 1 << 28;

/// Zero-fill granularity when laying out a fresh index file.
const ZERO_CHUNK: usize = 64 * 1024;

enum Attempt {
    Fitted,
    BucketOverflow,
}

/// Builds the on-disk hash index for a freshly sealed log.
///
/// Starts at [`INITIAL_BUCKETS`] and, whenever a record finds its bucket
/// full, throws the attempt away, doubles the bucket count and rebuilds
/// from scratch. The index that survives holds every key in its natural
/// bucket with no probing.
///
/// Records are inserted in log order. A record whose key already occupies
/// a slot in its bucket replaces that slot, so the newest occurrence of a
/// duplicated key is the one the index ends up pointing at; an empty slot
/// is only ever consumed by a genuinely new key.
///
/// Returns the final bucket count.
pub fn build_index(log_path: &Path, idx_path: &Path) -> Result<u32, SegmentError> {
    let log = File::open(log_path)?;
    let log_len = log.metadata()?.len();

    let mut buckets = INITIAL_BUCKETS;
    loop {
        match attempt(&log, log_len, idx_path, buckets)? {
            Attempt::Fitted => return Ok(buckets),
            Attempt::BucketOverflow => {
                buckets = buckets
                    .checked_mul(2)
                    .filter(|&b| b <= MAX_BUCKETS)
                    .ok_or_else(|| {
                        SegmentError::Io(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "index bucket count limit exceeded",
                        ))
                    })?;
            }
        }
    }
}

fn attempt(
    log: &File,
    log_len: u64,
    idx_path: &Path,
    buckets: u32,
) -> Result<Attempt, SegmentError> {
    let mut idx = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(idx_path)?;

    // Header, then the whole bucket array written out as zeroes so every
    // later bucket read lands on real bytes, not a hole.
    let mut header = [0u8; INDEX_HEADER_BYTES as usize];
    LittleEndian::write_u32(&mut header, buckets);
    fio::write_fully(&mut idx, &header)?;

    let zeroes = vec![0u8; ZERO_CHUNK];
    let mut remaining = buckets as u64 * BUCKET_BYTES as u64;
    while remaining > 0 {
        let n = remaining.min(ZERO_CHUNK as u64) as usize;
        fio::write_fully(&mut idx, &zeroes[..n])?;
        remaining -= n as u64;
    }

    for rec in RecordScanner::new(log, log_len) {
        let rec = rec?;
        let hash = key_hash(&rec.key);
        let b = hash % buckets;
        let mut bucket = Bucket::read_at(&idx, b)?;

        // Same-key slot wins over empty slot: duplicates replace, so the
        // index never points a key at anything but its newest record.
        let mut target = None;
        for i in 0..OFFSETS_PER_BUCKET {
            let offset = bucket.slot(i);
            if offset != 0 && key_matches_at(log, offset, &rec.key)?.is_some() {
                target = Some(i);
                break;
            }
        }
        let target = match target.or_else(|| bucket.first_empty()) {
            Some(i) => i,
            None => return Ok(Attempt::BucketOverflow),
        };
        bucket.set_slot(target, rec.offset);
        bucket.write_at(&idx, b)?;
    }

    Ok(Attempt::Fitted)
}
