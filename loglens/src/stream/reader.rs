use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::trace;

use crate::errors::{ScanError, ScanResult};

const BUFFER_CAPACITY: usize = 65536;

/// Streams one file line by line.
///
/// `on_line` receives each line's text (trailing newline stripped) and
/// its length on disk in bytes (newline included), synchronously and in
/// file order; returning `false` stops the scan early. An open failure is
/// returned before any line is delivered; a mid-read failure is returned
/// after the lines read so far were already delivered. The file handle is
/// released on every exit path.
pub fn stream_lines<F>(path: &Path, mut on_line: F) -> ScanResult<()>
where
    F: FnMut(&str, u64) -> bool,
{
    trace!("Streaming lines from: {}", path.display());

    let file = File::open(path).map_err(|e| ScanError::from_open(path, e))?;
    let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            return Ok(());
        }

        let mut end = buf.len();
        if buf[..end].ends_with(b"\n") {
            end -= 1;
        }
        if buf[..end].ends_with(b"\r") {
            end -= 1;
        }

        let text = match std::str::from_utf8(&buf[..end]) {
            Ok(text) => text,
            Err(_) => {
                // Reattempt from a Vec only on the error path to get a
                // FromUtf8Error attributable to this file
                let err = match String::from_utf8(buf[..end].to_vec()) {
                    Ok(_) => unreachable!("validated invalid above"),
                    Err(e) => e,
                };
                return Err(ScanError::encoding_error(path, err));
            }
        };

        if !on_line(text, read as u64) {
            return Ok(());
        }
    }
}
