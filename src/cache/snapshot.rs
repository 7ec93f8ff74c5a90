//! Snapshot Codec
//!
//! Raw binary dump of the cache contents. The layout has no header,
//! version tag, checksum or TTL field:
//!
//! ```text
//! repeat until EOF:
//!     key bytes, then a single 0x00
//!     value length as a native-endian usize
//!     value bytes
//! ```
//!
//! Because the length field uses the platform's pointer width and byte
//! order, snapshots are only readable on targets matching the writer.

use std::io::{self, BufRead, Read, Write};

use tracing::warn;

use crate::cache::{Cache, MAX_SNAPSHOT_KEY_LENGTH};
use crate::error::{CacheError, Result};

const LENGTH_WIDTH: usize = std::mem::size_of::<usize>();

enum Record {
    Entry(String, Vec<u8>),
    /// Well-framed record whose key cannot be stored
    Skipped(&'static str),
    End,
    Malformed(&'static str),
}

// == Write ==
/// Writes every entry of `cache` to `writer`. Returns the entry count.
pub fn write_snapshot<W: Write>(cache: &Cache, mut writer: W) -> io::Result<usize> {
    let mut written = 0;
    for (key, value) in cache.iter() {
        writer.write_all(key.as_bytes())?;
        writer.write_all(&[0])?;
        writer.write_all(&value.len().to_ne_bytes())?;
        writer.write_all(value)?;
        written += 1;
    }
    Ok(written)
}

// == Read ==
/// Inserts the records of `reader` into `cache` through the normal set path.
///
/// Reading stops at end of input or at the first record whose framing is
/// broken (unterminated key, truncated length or value); the records before
/// it stay loaded. Records with an over-long or non-UTF-8 key, and records
/// refused for capacity, are skipped and reading continues.
/// Returns the number of entries inserted.
pub fn read_snapshot<R: BufRead>(cache: &mut Cache, mut reader: R) -> Result<usize> {
    let mut loaded = 0;

    loop {
        match read_record(&mut reader)? {
            Record::Entry(key, value) => match cache.set_binary(&key, &value) {
                Ok(()) => loaded += 1,
                Err(CacheError::CapacityExceeded { max_entries }) => {
                    warn!(key = %key, max_entries, "snapshot entry skipped: cache full");
                }
                Err(err) => return Err(err),
            },
            Record::Skipped(reason) => {
                warn!(loaded, reason, "snapshot entry skipped");
            }
            Record::End => break,
            Record::Malformed(reason) => {
                warn!(loaded, reason, "snapshot truncated or malformed, stopping");
                break;
            }
        }
    }

    Ok(loaded)
}

fn read_record<R: BufRead>(reader: &mut R) -> io::Result<Record> {
    let limit = MAX_SNAPSHOT_KEY_LENGTH as u64 + 1;
    let mut key = Vec::new();
    let n = reader.by_ref().take(limit).read_until(0, &mut key)?;
    if n == 0 {
        return Ok(Record::End);
    }

    let oversized = if key.last() == Some(&0) {
        key.pop();
        false
    } else if n as u64 == limit && skip_past_nul(reader)? {
        true
    } else {
        return Ok(Record::Malformed("unterminated key"));
    };

    let mut len_buf = [0u8; LENGTH_WIDTH];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
            return Ok(Record::Malformed("truncated length field"));
        }
        Err(err) => return Err(err),
    }
    let len = usize::from_ne_bytes(len_buf);

    if oversized {
        let discarded = io::copy(&mut reader.by_ref().take(len as u64), &mut io::sink())?;
        if discarded != len as u64 {
            return Ok(Record::Malformed("truncated value"));
        }
        return Ok(Record::Skipped("key longer than MAX_SNAPSHOT_KEY_LENGTH"));
    }

    // Never preallocates `len`; it may be garbage.
    let mut value = Vec::new();
    let read = reader.by_ref().take(len as u64).read_to_end(&mut value)?;
    if read != len {
        return Ok(Record::Malformed("truncated value"));
    }

    match String::from_utf8(key) {
        Ok(key) => Ok(Record::Entry(key, value)),
        Err(_) => Ok(Record::Skipped("key is not valid UTF-8")),
    }
}

/// Consumes input up to and including the next NUL byte.
///
/// Returns false if input ends first.
fn skip_past_nul<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    loop {
        let (found, used) = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(false);
            }
            match buf.iter().position(|&b| b == 0) {
                Some(i) => (true, i + 1),
                None => (false, buf.len()),
            }
        };
        reader.consume(used);
        if found {
            return Ok(true);
        }
    }
}
