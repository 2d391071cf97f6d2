//! Concurrent literal search over a directory tree, delivered as a stream.
//!
//! # Pipeline
//!
//! ```text
//! walker ──paths──▶ [bounded work queue] ──▶ N workers ──batches──▶ [bounded output] ──▶ SearchStream
//! ```
//!
//! 1. **Enumeration** (`walker`): lists regular files under the root, lazily,
//!    on a feeder thread.
//! 2. **Scanning** (`processor` + `matcher`): one file per worker at a time,
//!    producing that file's occurrences in line then offset order.
//! 3. **Merging** (`dispatcher` + `stream`): each finished file is sent as a
//!    single batch, so a file's occurrences are never interleaved with another
//!    file's. Across files, order is whatever order the scans finish in.
//!
//! # Parallel Processing Patterns
//!
//! A batch-oriented search would collect everything before returning:
//! ```rust,ignore
//! let results: Vec<_> = files.par_iter()
//!     .filter_map(|file| processor.scan_file(file).ok())
//!     .collect();
//! ```
//!
//! Here the caller gets the stream right away and pulls from it:
//! ```rust,ignore
//! for occurrence in linescout::search("TODO", ".") {
//!     println!("{}", occurrence);
//! }
//! ```
//!
//! Both queues are bounded. A slow consumer makes workers block on the output
//! channel, which in turn stops the feeder, so memory stays flat however large
//! the tree is. Dropping the stream (or calling `Canceller::cancel`) stops
//! new files from being dispatched; files already in a worker's hands finish
//! and are either delivered whole or discarded whole.

pub mod dispatcher;
pub mod engine;
pub mod matcher;
pub mod processor;
pub mod stream;
pub mod walker;

pub use dispatcher::{dispatch, DispatchOptions};
pub use engine::{search, search_with_config};
pub use matcher::QueryMatcher;
pub use processor::FileProcessor;
pub use stream::{Canceller, SearchStream};
pub use walker::list_regular_files;
