//! Small I/O helpers shared by the stream formats.

use std::io::{ErrorKind, Read};

use sealkit_common::Result;

/// Read until `buf` is full or the reader is exhausted.
///
/// Returns the number of bytes read; anything less than `buf.len()` means
/// end of input was reached.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}
