use super::{find_colliding_keys, write_log};
use crate::{
    build_index, idx_path, log_path, Bucket, SealedSegment, BUCKET_BYTES, INDEX_HEADER_BYTES,
    OFFSETS_PER_BUCKET,
};
use logfile::key_hash;
use std::fs;
use tempfile::tempdir;

#[test]
fn small_log_fits_initial_buckets() {
    let dir = tempdir().unwrap();
    write_log(dir.path(), 0, &[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);

    let buckets = build_index(&log_path(dir.path(), 0), &idx_path(dir.path(), 0)).unwrap();
    assert_eq!(buckets, 8);

    let meta = fs::metadata(idx_path(dir.path(), 0)).unwrap();
    assert_eq!(meta.len(), INDEX_HEADER_BYTES + 8 * BUCKET_BYTES as u64);
}

#[test]
fn empty_log_builds_empty_index() {
    let dir = tempdir().unwrap();
    write_log(dir.path(), 0, &[]);

    let buckets = build_index(&log_path(dir.path(), 0), &idx_path(dir.path(), 0)).unwrap();
    assert_eq!(buckets, 8);

    let seg = SealedSegment::open(dir.path(), 0).unwrap();
    assert!(seg.get(key_hash(b"anything"), b"anything").unwrap().is_none());
}

#[test]
fn grows_until_all_keys_fit() {
    let dir = tempdir().unwrap();
    let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..33u32)
        .map(|i| {
            (
                format!("key{:03}", i).into_bytes(),
                format!("val{}", i).into_bytes(),
            )
        })
        .collect();
    let borrowed: Vec<(&[u8], &[u8])> = pairs
        .iter()
        .map(|(k, v)| (k.as_slice(), v.as_slice()))
        .collect();
    write_log(dir.path(), 4, &borrowed);

    // 8 buckets give 32 slots; 33 distinct keys cannot fit, so the builder
    // must double at least once.
    let buckets = build_index(&log_path(dir.path(), 4), &idx_path(dir.path(), 4)).unwrap();
    assert!(buckets >= 16, "got {} buckets", buckets);

    let meta = fs::metadata(idx_path(dir.path(), 4)).unwrap();
    assert_eq!(
        meta.len(),
        INDEX_HEADER_BYTES + buckets as u64 * BUCKET_BYTES as u64
    );

    let seg = SealedSegment::open(dir.path(), 4).unwrap();
    assert_eq!(seg.buckets(), buckets);
    for (k, v) in &pairs {
        assert_eq!(seg.get(key_hash(k), k).unwrap().as_deref(), Some(v.as_slice()));
    }
}

#[test]
fn duplicate_keys_replace_their_slot() {
    let dir = tempdir().unwrap();
    // Six occurrences of one key: with append-on-duplicate this would
    // overflow the 4-slot bucket no matter the bucket count, since every
    // occurrence shares the full hash.
    write_log(
        dir.path(),
        1,
        &[
            (b"dup", b"v0"),
            (b"dup", b"v1"),
            (b"dup", b"v2"),
            (b"dup", b"v3"),
            (b"dup", b"v4"),
            (b"dup", b"v5"),
        ],
    );

    let buckets = build_index(&log_path(dir.path(), 1), &idx_path(dir.path(), 1)).unwrap();
    assert_eq!(buckets, 8, "duplicates must reuse one slot");

    let seg = SealedSegment::open(dir.path(), 1).unwrap();
    assert_eq!(
        seg.get(key_hash(b"dup"), b"dup").unwrap().as_deref(),
        Some(&b"v5"[..])
    );
}

#[test]
fn colliding_keys_occupy_separate_slots_in_one_bucket() {
    let (k1, k2) = find_colliding_keys();
    assert_ne!(k1, k2);
    let hash = key_hash(&k1);
    assert_eq!(hash, key_hash(&k2));

    let dir = tempdir().unwrap();
    write_log(dir.path(), 6, &[(&k1, b"v1"), (&k2, b"v2")]);

    let buckets = build_index(&log_path(dir.path(), 6), &idx_path(dir.path(), 6)).unwrap();

    // Distinct keys never replace each other: the bucket must hold both
    // offsets side by side.
    let idx = fs::File::open(idx_path(dir.path(), 6)).unwrap();
    let bucket = Bucket::read_at(&idx, hash % buckets).unwrap();
    let occupied = (0..OFFSETS_PER_BUCKET)
        .filter(|&i| bucket.slot(i) != 0)
        .count();
    assert_eq!(occupied, 2);

    let seg = SealedSegment::open(dir.path(), 6).unwrap();
    assert_eq!(seg.get(hash, &k1).unwrap().as_deref(), Some(&b"v1"[..]));
    assert_eq!(seg.get(hash, &k2).unwrap().as_deref(), Some(&b"v2"[..]));
}

#[test]
fn rebuild_overwrites_previous_index() {
    let dir = tempdir().unwrap();
    write_log(dir.path(), 2, &[(b"k", b"v")]);

    build_index(&log_path(dir.path(), 2), &idx_path(dir.path(), 2)).unwrap();
    let first = fs::metadata(idx_path(dir.path(), 2)).unwrap().len();

    // Building again against the same log is idempotent.
    build_index(&log_path(dir.path(), 2), &idx_path(dir.path(), 2)).unwrap();
    assert_eq!(fs::metadata(idx_path(dir.path(), 2)).unwrap().len(), first);

    let seg = SealedSegment::open(dir.path(), 2).unwrap();
    assert_eq!(seg.get(key_hash(b"k"), b"k").unwrap().as_deref(), Some(&b"v"[..]));
}
