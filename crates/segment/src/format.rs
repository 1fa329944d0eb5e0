use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io;

use crate::SegmentError;

/// The index file opens with a single little-endian u32 bucket count.
pub const INDEX_HEADER_BYTES: u64 = 4;

/// Fixed number of offset slots per bucket; no probing, no overflow area.
pub const OFFSETS_PER_BUCKET: usize = 4;

/// One reserved byte plus four u32 offset slots.
pub const BUCKET_BYTES: usize = 1 + OFFSETS_PER_BUCKET * 4;

/// Bucket count the index builder starts from before any doubling.
pub const INITIAL_BUCKETS: u32 = 8;

/// Byte position of `bucket` within an index file.
pub fn bucket_pos(bucket: u32) -> u64 {
    INDEX_HEADER_BYTES + bucket as u64 * BUCKET_BYTES as u64
}

/// Reads and validates the bucket count from an index file's header.
///
/// A header that cannot be read in full, or that carries a zero bucket
/// count, marks the segment as corrupt.
pub fn read_bucket_count(idx: &File) -> Result<u32, SegmentError> {
    let mut buf = [0u8; INDEX_HEADER_BYTES as usize];
    match fio::pread_fully(idx, &mut buf, 0, true) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(SegmentError::Corrupt),
        Err(e) => return Err(SegmentError::Io(e)),
    }
    let buckets = LittleEndian::read_u32(&buf);
    if buckets == 0 {
        return Err(SegmentError::Corrupt);
    }
    Ok(buckets)
}

/// A single 17-byte bucket, read and written whole.
///
/// Byte 0 is reserved (always zero); slot `i` occupies bytes
/// `1 + 4i .. 5 + 4i`. A zero slot is empty.
pub struct Bucket {
    raw: [u8; BUCKET_BYTES],
}

impl Bucket {
    pub fn read_at(idx: &File, bucket: u32) -> io::Result<Self> {
        let mut raw = [0u8; BUCKET_BYTES];
        fio::pread_fully(idx, &mut raw, bucket_pos(bucket), true)?;
        Ok(Self { raw })
    }

    pub fn write_at(&self, idx: &File, bucket: u32) -> io::Result<()> {
        fio::pwrite_fully(idx, &self.raw, bucket_pos(bucket))
    }

    pub fn slot(&self, i: usize) -> u32 {
        LittleEndian::read_u32(&self.raw[1 + i * 4..5 + i * 4])
    }

    pub fn set_slot(&mut self, i: usize, offset: u32) {
        LittleEndian::write_u32(&mut self.raw[1 + i * 4..5 + i * 4], offset);
    }

    /// Index of the first empty slot, if the bucket has room.
    pub fn first_empty(&self) -> Option<usize> {
        (0..OFFSETS_PER_BUCKET).find(|&i| self.slot(i) == 0)
    }
}
