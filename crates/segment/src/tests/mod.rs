mod builder_tests;

use logfile::LogFile;
use std::collections::HashMap;
use std::path::Path;

/// Writes a sealed-style log containing `pairs` in order.
pub fn write_log(dir: &Path, id: u64, pairs: &[(&[u8], &[u8])]) {
    let mut log = LogFile::open(crate::log_path(dir, id)).unwrap();
    for (k, v) in pairs {
        log.append(k, v).unwrap();
    }
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
