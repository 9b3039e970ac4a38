//! Line streaming: a single-file reader, a concurrent fan-in controller
//! that merges many readers into one consumption loop, and the engine
//! functions tying them to the filter criteria.
//!
//! Concurrency model: a fixed pool of worker threads pulls paths from a
//! shared channel, so at most `concurrency` files are open at once. Every
//! worker pushes raw lines into one bounded channel; the push blocks when
//! the channel is full, which stalls that worker until the consumer
//! catches up. This is the only producer/consumer synchronization point
//! and it caps memory use regardless of file sizes or consumer speed.
//! Lines from one file always arrive in their original relative order;
//! interleaving across files is unspecified.

pub mod controller;
pub mod engine;
pub mod reader;

pub use controller::QUEUE_CAPACITY;
pub use engine::{scan_file, scan_files};
