use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{controller, reader};
use crate::errors::ScanResult;
use crate::filter::FilterCriteria;
use crate::progress::{ByteProgress, ProgressSink};
use crate::results::ScanSummary;

/// Forwards byte increments to the scan's own counter and to an optional
/// caller-supplied sink (e.g. a progress bar)
struct ForkSink<'a> {
    counter: &'a ByteProgress,
    external: Option<&'a dyn ProgressSink>,
}

impl ProgressSink for ForkSink<'_> {
    fn add_bytes(&self, n: u64) {
        self.counter.add_bytes(n);
        if let Some(external) = self.external {
            external.add_bytes(n);
        }
    }
}

/// Filters a single log file.
///
/// Open and read failures are fatal to the invocation; lines read before
/// a mid-file failure have already been delivered to `on_line`.
pub fn scan_file<F>(
    path: &Path,
    criteria: &FilterCriteria,
    progress: Option<&dyn ProgressSink>,
    mut on_line: F,
) -> ScanResult<ScanSummary>
where
    F: FnMut(&str),
{
    info!("Scanning {}", path.display());

    let counter = ByteProgress::new();
    let sink = ForkSink {
        counter: &counter,
        external: progress,
    };

    let mut summary = ScanSummary::new();
    reader::stream_lines(path, |text, byte_len| {
        sink.add_bytes(byte_len);
        let kept = criteria.keep(text);
        summary.record_line(kept);
        if kept {
            on_line(text);
        }
        true
    })?;

    summary.bytes_read = counter.processed();
    debug!(
        "Scan of {} complete: {}/{} lines kept",
        path.display(),
        summary.lines_matched,
        summary.lines_scanned
    );
    Ok(summary)
}

/// Filters many log files concurrently.
///
/// Reader workers (at most `concurrency` files open at once) fan into a
/// single consumption loop on the calling thread, where the criteria are
/// applied and survivors forwarded to `on_line`. Per-file failures never
/// abort the scan; they are aggregated in the returned summary.
pub fn scan_files<F>(
    paths: &[PathBuf],
    criteria: &FilterCriteria,
    concurrency: NonZeroUsize,
    progress: Option<&dyn ProgressSink>,
    mut on_line: F,
) -> ScanResult<ScanSummary>
where
    F: FnMut(&str),
{
    info!(
        "Scanning {} files with concurrency {}",
        paths.len(),
        concurrency
    );

    let counter = ByteProgress::new();
    let sink = ForkSink {
        counter: &counter,
        external: progress,
    };

    let mut summary = ScanSummary::new();
    let failures = controller::stream_files(paths, concurrency, &sink, |line| {
        let kept = criteria.keep(&line);
        summary.record_line(kept);
        if kept {
            on_line(&line);
        }
    });

    summary.bytes_read = counter.processed();
    summary.failures = failures;
    debug!(
        "Scan complete: {}/{} lines kept, {} failed files",
        summary.lines_matched,
        summary.lines_scanned,
        summary.failures.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn exclude_errors() -> FilterCriteria {
        let config = ScanConfig {
            exclude_keywords: vec!["ERROR".to_string()],
            ..ScanConfig::default()
        };
        FilterCriteria::build(&config).unwrap()
    }

    #[test]
    fn test_scan_file_applies_criteria() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(
            &path,
            "2024-01-01 10:00:00 [ERROR] disk full\n2024-01-01 10:00:00 [INFO] ok\n",
        )
        .unwrap();

        let criteria = exclude_errors();
        let mut kept = Vec::new();
        let summary = scan_file(&path, &criteria, None, |line| {
            kept.push(line.to_string());
        })
        .unwrap();

        assert_eq!(kept, vec!["2024-01-01 10:00:00 [INFO] ok"]);
        assert_eq!(summary.lines_scanned, 2);
        assert_eq!(summary.lines_matched, 1);
        assert_eq!(summary.bytes_read, std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_scan_file_open_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let criteria = exclude_errors();
        let result = scan_file(&dir.path().join("missing.log"), &criteria, None, |_| {});
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_files_aggregates_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.log");
        let mut file = File::create(&good).unwrap();
        for i in 0..10 {
            writeln!(file, "2024-01-01 10:00:00 [INFO] event {}", i).unwrap();
        }

        let paths = vec![good, dir.path().join("missing.log")];
        let criteria = exclude_errors();
        let mut kept = 0;
        let summary = scan_files(
            &paths,
            &criteria,
            NonZeroUsize::new(2).unwrap(),
            None,
            |_| kept += 1,
        )
        .unwrap();

        assert_eq!(kept, 10);
        assert_eq!(summary.lines_scanned, 10);
        assert_eq!(summary.failures.len(), 1);
    }

    #[test]
    fn test_scan_files_forwards_progress() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let bar = ByteProgress::new();
        let criteria = exclude_errors();
        let summary = scan_files(
            &[path.clone()],
            &criteria,
            NonZeroUsize::new(1).unwrap(),
            Some(&bar),
            |_| {},
        )
        .unwrap();

        let size = std::fs::metadata(&path).unwrap().len();
        assert_eq!(bar.processed(), size);
        assert_eq!(summary.bytes_read, size);
    }
}
