use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Receives byte-count increments as lines are read.
///
/// Implementations must tolerate concurrent invocation from an unbounded
/// number of reader threads. Only the final total matters, so relaxed
/// atomic increments are sufficient.
pub trait ProgressSink: Send + Sync {
    fn add_bytes(&self, n: u64);
}

/// Atomic byte counter, the library's own `ProgressSink`.
///
/// Progress reflects bytes *read*, not bytes that survived filtering, and
/// may overshoot a precomputed total by at most the final line of a file
/// that grew after its size was sampled.
#[derive(Debug, Default)]
pub struct ByteProgress {
    processed: AtomicU64,
}

impl ByteProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes recorded so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}

impl ProgressSink for ByteProgress {
    fn add_bytes(&self, n: u64) {
        self.processed.fetch_add(n, Ordering::Relaxed);
    }
}

/// Sums the sizes of all input files for progress scaling.
///
/// Best-effort: files that cannot be stat'ed contribute 0.
pub fn total_input_bytes<P: AsRef<Path>>(paths: &[P]) -> u64 {
    let total = paths
        .iter()
        .map(|p| {
            std::fs::metadata(p.as_ref())
                .map(|m| m.len())
                .unwrap_or(0)
        })
        .sum();
    debug!("Total input size: {} bytes", total);
    total
}
