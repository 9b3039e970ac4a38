pub mod config;
pub mod errors;
pub mod filter;
pub mod progress;
pub mod results;
pub mod stream;

pub use config::ScanConfig;
pub use errors::{ScanError, ScanResult};
pub use filter::FilterCriteria;
pub use progress::{total_input_bytes, ByteProgress, ProgressSink};
pub use results::{ScanSummary, SourceFailure};
pub use stream::{scan_file, scan_files};
