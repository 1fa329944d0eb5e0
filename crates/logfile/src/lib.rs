//! # logfile — the append-only record log
//!
//! Both the active `current.log` and the sealed `N.log` files share one
//! format, provided by this crate.
//!
//! ## Binary Record Format
//!
//! ```text
//! [key_len: u16 LE][value_len: u32 LE][key bytes][value bytes]
//! ```
//!
//! No padding, no checksum, no per-file header or trailer. Byte 0 of every
//! log is reserved and never written to by a record; the first record starts
//! at offset 1. That reservation lets the sealed-segment index (see the
//! `segment` crate) use offset `0` as its empty-slot sentinel.
//!
//! ## Torn tails
//!
//! A crash mid-append leaves trailing bytes that do not form a complete
//! record. [`RecordScanner`] walks complete records and stops at the first
//! incomplete one; [`LogFile::recover`] truncates the file back to that
//! point so the next append continues from the last committed record.
//!
//! ## Example
//!
//! ```rust,no_run
//! use logfile::LogFile;
//!
//! let mut log = LogFile::open("current.log").unwrap();
//! log.recover(|_file, _header, _key, _offset| Ok(())).unwrap();
//! let off = log.append(b"hello", b"world").unwrap();
//! assert!(off >= 1);
//! ```

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh32::xxh32;

/// Size of the fixed record header: `key_len (2B) + value_len (4B)`.
pub const HEADER_BYTES: usize = 6;

/// Byte 0 of every log is reserved; records start here.
pub const FIRST_RECORD_OFFSET: u32 = 1;

/// Largest representable key, bounded by the u16 length field.
pub const MAX_KEY_BYTES: usize = u16::MAX as usize;

/// Hash used for record identity throughout the store: XXH32 with seed 0.
pub fn key_hash(key: &[u8]) -> u32 {
    xxh32(key, 0)
}

/// Errors raised by log operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// An underlying file operation failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Zero-length keys are rejected; the format could not distinguish a
    /// torn header from a committed empty-key record.
    #[error("empty keys are not allowed")]
    EmptyKey,

    /// Key exceeds the u16 length field.
    #[error("key too large: {0} bytes (max {MAX_KEY_BYTES})")]
    KeyTooLarge(usize),

    /// Value exceeds the u32 length field.
    #[error("value too large: {0} bytes")]
    ValueTooLarge(usize),

    /// The log has grown past the 4 GiB addressable by u32 offsets.
    #[error("log full: offsets past 4 GiB are not representable")]
    Full,

    /// The streaming cursor was not at end-of-log when an append started.
    #[error("corrupt log: append position is not at end of file")]
    Corrupt,
}

/// The fixed-layout header that precedes every record's key and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key_len: u16,
    pub value_len: u32,
}

impl RecordHeader {
    pub fn decode(buf: &[u8; HEADER_BYTES]) -> Self {
        Self {
            key_len: LittleEndian::read_u16(&buf[0..2]),
            value_len: LittleEndian::read_u32(&buf[2..6]),
        }
    }

    pub fn encode(&self) -> [u8; HEADER_BYTES] {
        let mut buf = [0u8; HEADER_BYTES];
        LittleEndian::write_u16(&mut buf[0..2], self.key_len);
        LittleEndian::write_u32(&mut buf[2..6], self.value_len);
        buf
    }

    /// Total on-disk footprint of the record this header describes.
    pub fn record_len(&self) -> u64 {
        HEADER_BYTES as u64 + self.key_len as u64 + self.value_len as u64
    }

    /// Absolute position of the value bytes for a record at `offset`.
    pub fn value_pos(&self, offset: u32) -> u64 {
        offset as u64 + HEADER_BYTES as u64 + self.key_len as u64
    }
}

/// Reads the record header at `offset`. The header must be fully present.
pub fn read_header_at(file: &File, offset: u32) -> Result<RecordHeader, LogError> {
    let mut buf = [0u8; HEADER_BYTES];
    fio::pread_fully(file, &mut buf, offset as u64, true)?;
    Ok(RecordHeader::decode(&buf))
}

/// Compares `key` against the key stored at `offset`.
///
/// Returns the record's header on a match so the caller can go on to read
/// the value without re-reading the header. Positional reads only; the
/// handle's streaming cursor stays put.
pub fn key_matches_at(
    file: &File,
    offset: u32,
    key: &[u8],
) -> Result<Option<RecordHeader>, LogError> {
    let header = read_header_at(file, offset)?;
    if header.key_len as usize != key.len() {
        return Ok(None);
    }
    let mut stored = vec![0u8; key.len()];
    fio::pread_fully(file, &mut stored, offset as u64 + HEADER_BYTES as u64, true)?;
    Ok((stored == key).then_some(header))
}

/// Reads the value of the record at `offset`, given its header.
pub fn read_value_at(file: &File, offset: u32, header: &RecordHeader) -> Result<Vec<u8>, LogError> {
    let mut value = vec![0u8; header.value_len as usize];
    fio::pread_fully(file, &mut value, header.value_pos(offset), true)?;
    Ok(value)
}

/// A complete record yielded by [`RecordScanner`]. The value bytes are left
/// on disk; scanning only ever reads headers and keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    pub offset: u32,
    pub header: RecordHeader,
    pub key: Vec<u8>,
}

/// Walks the complete records of a log from [`FIRST_RECORD_OFFSET`].
///
/// Iteration stops at the first record that is not fully present within the
/// file's recorded length — the torn tail. After the iterator is exhausted,
/// [`pos`](RecordScanner::pos) is the first byte past the last complete
/// record, which is where recovery truncates to and appends resume from.
pub struct RecordScanner<'a> {
    file: &'a File,
    len: u64,
    pos: u32,
    failed: bool,
}

impl<'a> RecordScanner<'a> {
    pub fn new(file: &'a File, len: u64) -> Self {
        Self {
            file,
            len,
            pos: FIRST_RECORD_OFFSET,
            failed: false,
        }
    }

    /// First byte past the last complete record seen so far.
    pub fn pos(&self) -> u32 {
        self.pos
    }
}

impl Iterator for RecordScanner<'_> {
    type Item = Result<ScannedRecord, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let mut hdr_buf = [0u8; HEADER_BYTES];
        match fio::pread_fully(self.file, &mut hdr_buf, self.pos as u64, false) {
            Ok(n) if n < HEADER_BYTES => return None, // torn tail
            Ok(_) => {}
            Err(e) => {
                self.failed = true;
                return Some(Err(e.into()));
            }
        }
        let header = RecordHeader::decode(&hdr_buf);

        // No committed record carries an empty key; a zero key_len here is
        // garbage from a torn write.
        if header.key_len == 0 {
            return None;
        }

        let mut key = vec![0u8; header.key_len as usize];
        match fio::pread_fully(
            self.file,
            &mut key,
            self.pos as u64 + HEADER_BYTES as u64,
            false,
        ) {
            Ok(n) if n < key.len() => return None, // torn tail
            Ok(_) => {}
            Err(e) => {
                self.failed = true;
                return Some(Err(e.into()));
            }
        }

        // The value is not read during a scan; it just has to fit inside
        // the file's recorded length.
        let end = self.pos as u64 + header.record_len();
        if end > self.len || end > u32::MAX as u64 {
            return None;
        }

        let offset = self.pos;
        self.pos = end as u32;
        Some(Ok(ScannedRecord {
            offset,
            header,
            key,
        }))
    }
}

/// A read/write handle on an active log.
///
/// Opening writes the reserved byte into a fresh file and positions the
/// streaming cursor at end-of-file. Appends go through a reusable scratch
/// buffer and hit the file in a single write call.
pub struct LogFile {
    path: PathBuf,
    file: File,
    len: u64,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl LogFile {
    /// Opens (creating if absent) a log for read/write at `path`.
    ///
    /// This does not scan existing content; call [`recover`](Self::recover)
    /// before the first append on a log that may hold records.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;

        let mut len = file.metadata()?.len();
        if len == 0 {
            // Reserve byte 0 so that offset 0 can mean "empty slot" in the
            // sealed-segment index.
            fio::write_fully(&mut file, &[0u8])?;
            len = 1;
        }
        file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path,
            file,
            len,
            buf: Vec::with_capacity(256),
        })
    }

    /// Replays every complete record, calling `apply(file, header, key,
    /// offset)` for each, then truncates the torn tail (if any) and leaves
    /// the cursor ready for appends.
    ///
    /// The file handle is passed back into the callback so it can issue
    /// positional reads against the log it is replaying (index rebuilds
    /// compare keys at previously seen offsets).
    ///
    /// Returns the recovered end-of-log offset.
    pub fn recover<F>(&mut self, mut apply: F) -> Result<u32, LogError>
    where
        F: FnMut(&File, &RecordHeader, &[u8], u32) -> Result<(), LogError>,
    {
        let mut scanner = RecordScanner::new(&self.file, self.len);
        for rec in &mut scanner {
            let rec = rec?;
            apply(&self.file, &rec.header, &rec.key, rec.offset)?;
        }
        let end = scanner.pos();

        if (end as u64) < self.len {
            self.file.set_len(end as u64)?;
        }
        self.len = end as u64;
        self.file.seek(SeekFrom::Start(self.len))?;
        Ok(end)
    }

    /// Appends one record, returning its offset.
    ///
    /// The offset is taken from the streaming cursor, which must sit at
    /// end-of-log — anything else means an earlier write went wrong.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<u32, LogError> {
        if key.is_empty() {
            return Err(LogError::EmptyKey);
        }
        let key_len =
            u16::try_from(key.len()).map_err(|_| LogError::KeyTooLarge(key.len()))?;
        let value_len =
            u32::try_from(value.len()).map_err(|_| LogError::ValueTooLarge(value.len()))?;
        let offset = u32::try_from(self.len).map_err(|_| LogError::Full)?;

        if self.file.stream_position()? != self.len {
            return Err(LogError::Corrupt);
        }

        // Reuse the internal buffer — clear but keep the allocation.
        self.buf.clear();
        self.buf.write_u16::<LittleEndian>(key_len)?;
        self.buf.write_u32::<LittleEndian>(value_len)?;
        self.buf.extend_from_slice(key);
        self.buf.extend_from_slice(value);

        fio::write_fully(&mut self.file, &self.buf)?;
        self.len += self.buf.len() as u64;
        Ok(offset)
    }

    /// Shared handle for positional reads ([`key_matches_at`] and friends).
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Current log length in bytes (reserved byte included).
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when the log holds no records (only the reserved byte).
    pub fn is_empty(&self) -> bool {
        self.len <= FIRST_RECORD_OFFSET as u64
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
