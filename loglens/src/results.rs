use std::path::PathBuf;

use crate::errors::ScanError;

/// A file the concurrent scan could not fully read.
///
/// Open failures contribute no lines; mid-read failures truncate the
/// file's contribution after the lines already delivered.
#[derive(Debug)]
pub struct SourceFailure {
    /// The path that failed
    pub path: PathBuf,
    /// The open or read error
    pub error: ScanError,
}

/// Outcome of a scan over one or more files
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Lines pulled through the consumption loop
    pub lines_scanned: u64,
    /// Lines that survived all filter stages
    pub lines_matched: u64,
    /// Bytes read across all inputs, including filtered-out lines
    pub bytes_read: u64,
    /// Files skipped or truncated by per-file failures
    pub failures: Vec<SourceFailure>,
}

impl ScanSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Default::default()
    }

    /// Records one consumed line and whether it survived filtering
    pub fn record_line(&mut self, kept: bool) {
        self.lines_scanned += 1;
        if kept {
            self.lines_matched += 1;
        }
    }
}
