//! # fio — full-read / full-write I/O primitives
//!
//! Every file access in CaskKV funnels through the four helpers in this
//! crate. They retry transparently on `ErrorKind::Interrupted` and come in
//! streaming (`read_fully`/`write_fully`) and positional
//! (`pread_fully`/`pwrite_fully`) flavours; the positional variants never
//! move the handle's streaming cursor.
//!
//! The read helpers take a `fail_on_eof` flag. With `fail_on_eof == true` a
//! short read is a hard [`ErrorKind::UnexpectedEof`](std::io::ErrorKind)
//! error; with `false` the number of bytes actually read is returned and the
//! caller decides what a short read means. The only callers that pass
//! `false` are the log-recovery scanners, where a short read marks the torn
//! tail of a crashed write rather than a failure.

use std::fs::File;
use std::io::{self, Read, Write};

/// Reads exactly `buf.len()` bytes from the reader's current position.
///
/// Returns the number of bytes read. With `fail_on_eof` set, hitting
/// end-of-file before the buffer is full is an `UnexpectedEof` error;
/// otherwise the short count is returned.
pub fn read_fully<R: Read>(r: &mut R, buf: &mut [u8], fail_on_eof: bool) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    if filled < buf.len() && fail_on_eof {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "short read where a full record was required",
        ));
    }
    Ok(filled)
}

/// Writes the whole of `buf` at the writer's current position.
pub fn write_fully<W: Write>(w: &mut W, buf: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match w.write(&buf[written..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "write returned zero bytes",
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Reads exactly `buf.len()` bytes at `offset`, leaving the handle's
/// streaming position untouched. Same `fail_on_eof` semantics as
/// [`read_fully`].
#[cfg(unix)]
pub fn pread_fully(file: &File, buf: &mut [u8], offset: u64, fail_on_eof: bool) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    let mut filled = 0;
    while filled < buf.len() {
        match file.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    if filled < buf.len() && fail_on_eof {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "short positional read where a full record was required",
        ));
    }
    Ok(filled)
}

/// Portable fallback: emulates `pread` by seeking a shared handle and
/// restoring the cursor afterwards.
#[cfg(not(unix))]
pub fn pread_fully(file: &File, buf: &mut [u8], offset: u64, fail_on_eof: bool) -> io::Result<usize> {
    use std::io::{Seek, SeekFrom};
    let mut f = file;
    let saved = f.stream_position()?;
    f.seek(SeekFrom::Start(offset))?;
    let result = read_fully(&mut f, buf, fail_on_eof);
    f.seek(SeekFrom::Start(saved))?;
    result
}

/// Writes the whole of `buf` at `offset`, leaving the handle's streaming
/// position untouched.
#[cfg(unix)]
pub fn pwrite_fully(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    let mut written = 0;
    while written < buf.len() {
        match file.write_at(&buf[written..], offset + written as u64) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "positional write returned zero bytes",
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn pwrite_fully(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::io::{Seek, SeekFrom};
    let mut f = file;
    let saved = f.stream_position()?;
    f.seek(SeekFrom::Start(offset))?;
    let result = write_fully(&mut f, buf);
    f.seek(SeekFrom::Start(saved))?;
    result
}
