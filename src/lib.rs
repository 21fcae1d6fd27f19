//! jsonl-dedup - Exact-key deduplication for JSON Lines content feeds
//!
//! Each input line is parsed as a JSON record and mapped to a canonical
//! key built from its `text`, `title`, `url` or `id` fields. Only the
//! first line with a given key is kept; every other line is dropped,
//! and the run is summarized in a set of counters.
//!
//! # Example
//!
//! ```
//! use jsonl_dedup::{KeyConfig, dedup_lines};
//!
//! let lines = [
//!     r#"{"text":"Breaking News Today"}"#,
//!     r#"{"text":"breaking   news today"}"#,
//! ];
//! let (kept, stats) = dedup_lines(lines, &KeyConfig::default());
//! assert_eq!(kept, vec![lines[0]]);
//! assert_eq!(stats.duplicates, 1);
//! ```

pub mod args;
pub mod batch;
pub mod engine;
pub mod error;
pub mod io;
pub mod key;
pub mod stats;
pub mod utils;

// Re-export commonly used items
pub use args::{Args, Mode};
pub use batch::{BatchOptions, BatchSummary, FileReport, run_batch};
pub use engine::{Deduplicator, LineOutcome, dedup_lines, dedup_stream};
pub use error::{DedupError, Result};
pub use io::{dedup_file, resolve_output_path};
pub use key::{KeyConfig, KeyField, derive_key, normalize_text, normalize_url, record_key};
pub use stats::RunStats;
