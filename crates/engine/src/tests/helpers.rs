use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::ACTIVE_LOG;

/// Size of the active log on disk.
pub fn active_log_size(db_dir: &Path) -> u64 {
    fs::metadata(db_dir.join(ACTIVE_LOG)).unwrap().len()
}

/// Bucket count stored in a sealed segment's index header.
pub fn idx_bucket_count(db_dir: &Path, id: u64) -> u32 {
    let bytes = fs::read(db_dir.join(format!("{id}.idx"))).unwrap();
    u32::from_le_bytes(bytes[0..4].try_into().unwrap())
}

/// On-disk size of one record with the given key/value lengths.
pub fn record_size(key_len: usize, value_len: usize) -> u64 {
    (logfile::HEADER_BYTES + key_len + value_len) as u64
}

/// Finds two distinct keys with the same XXH32 hash by brute force.
///
/// Expected collisions among `n` candidates grow as `n^2 / 2^33`, so the
/// search typically ends after under a hundred thousand keys.
pub fn find_colliding_keys() -> (Vec<u8>, Vec<u8>) {
    let mut seen: HashMap<u32, Vec<u8>> = HashMap::new();
    for i in 0u64.. {
        let key = format!("collide-{}", i).into_bytes();
        let hash = logfile::key_hash(&key);
        if let Some(prev) = seen.insert(hash, key.clone()) {
            return (prev, key);
        }
    }
    unreachable!()
}
