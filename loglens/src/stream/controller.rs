use crossbeam_channel::{bounded, unbounded};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;
use tracing::{debug, warn};

use super::reader;
use crate::progress::ProgressSink;
use crate::results::SourceFailure;

/// Capacity of the line channel between readers and the consumer.
/// Producers block when it is full.
pub const QUEUE_CAPACITY: usize = 1000;

/// Streams many files through a fixed-size worker pool into a single
/// consumption point.
///
/// `concurrency` worker threads pull paths from a shared channel, so at
/// most that many files are open at once. Each worker reports bytes to
/// `progress` after every line it reads, then pushes the line into a
/// bounded channel; the push blocks when the consumer falls behind.
/// `on_line` runs on the calling thread only, once per line read.
///
/// A failing file never aborts the others: open failures skip the file,
/// mid-read failures truncate its contribution, and both are returned as
/// an aggregated list once all workers have finished.
pub fn stream_files<F>(
    paths: &[PathBuf],
    concurrency: NonZeroUsize,
    progress: &dyn ProgressSink,
    mut on_line: F,
) -> Vec<SourceFailure>
where
    F: FnMut(String),
{
    let workers = concurrency.get().min(paths.len().max(1));
    debug!(
        "Streaming {} files with {} workers",
        paths.len(),
        workers
    );

    let (path_tx, path_rx) = unbounded::<PathBuf>();
    let (line_tx, line_rx) = bounded::<String>(QUEUE_CAPACITY);
    let (failure_tx, failure_rx) = unbounded::<SourceFailure>();

    for path in paths {
        // The receiver outlives this loop, so the send cannot fail
        let _ = path_tx.send(path.clone());
    }
    drop(path_tx);

    thread::scope(|s| {
        for _ in 0..workers {
            let path_rx = path_rx.clone();
            let line_tx = line_tx.clone();
            let failure_tx = failure_tx.clone();
            s.spawn(move || {
                for path in path_rx.iter() {
                    let result = reader::stream_lines(&path, |text, byte_len| {
                        progress.add_bytes(byte_len);
                        // A closed channel means the consumer is gone;
                        // stop reading instead of spinning to EOF
                        line_tx.send(text.to_string()).is_ok()
                    });
                    if let Err(error) = result {
                        warn!("Skipping {}: {}", path.display(), error);
                        let _ = failure_tx.send(SourceFailure { path, error });
                    }
                }
            });
        }

        // Workers hold the remaining senders; once they all finish, the
        // channel disconnects and the consumption loop drains and ends.
        drop(line_tx);
        drop(failure_tx);

        for line in line_rx.iter() {
            on_line(line);
        }
    });

    failure_rx.iter().collect()
}
