//! Streaming dedup engine
//!
//! Consumes raw lines once, keeps the set of keys observed so far and sorts
//! every line into one of four classes: kept, duplicate, parse error or empty.
//! Kept lines are emitted byte-for-byte as they were read.

use crate::error::{DedupError, Result};
use crate::key::{KeyConfig, record_key};
use crate::stats::RunStats;
use bstr::{BString, ByteSlice};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::io::{BufRead, Write};
use tracing::warn;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How a single input line was classified
#[derive(Debug)]
pub enum LineOutcome {
    /// Zero-length line; skipped.
    Empty,
    /// Not valid JSON; counted and skipped.
    ParseError(serde_json::Error),
    /// Key already observed in this stream; dropped.
    Duplicate,
    /// First occurrence of its key; goes to the output.
    Kept,
}

impl LineOutcome {
    #[inline]
    pub fn is_kept(&self) -> bool {
        matches!(self, LineOutcome::Kept)
    }
}

/// Dedup state for one input stream
///
/// Owns the observed-key set; create a new one per stream.
#[derive(Debug)]
pub struct Deduplicator {
    config: KeyConfig,
    seen: HashSet<BString>,
    stats: RunStats,
}

impl Deduplicator {
    pub fn new(config: KeyConfig) -> Self {
        Self {
            config,
            seen: HashSet::new(),
            stats: RunStats::default(),
        }
    }

    /// Classify the next line of the stream
    ///
    /// `line` must not include its `\n` terminator. Line numbers are
    /// assigned in call order, starting at 1.
    pub fn observe(&mut self, line: &[u8]) -> LineOutcome {
        self.stats.total += 1;
        if line.is_empty() {
            self.stats.empty_lines += 1;
            return LineOutcome::Empty;
        }

        let record = match parse_record(line) {
            Ok(record) => record,
            Err(err) => {
                self.stats.parse_errors += 1;
                warn!(
                    line = self.stats.total,
                    "skipping malformed JSON: {err} ({:?})",
                    preview(line)
                );
                return LineOutcome::ParseError(err);
            }
        };
        self.stats.parsed += 1;

        let key = record_key(&record, self.stats.total, &self.config);
        if self.seen.insert(key) {
            self.stats.written += 1;
            LineOutcome::Kept
        } else {
            self.stats.duplicates += 1;
            LineOutcome::Duplicate
        }
    }

    /// Counters so far
    #[inline]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Number of distinct keys observed
    #[inline]
    pub fn distinct_keys(&self) -> usize {
        self.seen.len()
    }

    /// Drop the observed-key set and return the final counters
    pub fn finish(self) -> RunStats {
        self.stats
    }
}

/// Parse one line as a single JSON value
///
/// A leading UTF-8 byte order mark is skipped and nesting depth is unbounded.
/// Only whitespace may follow the value.
fn parse_record(line: &[u8]) -> serde_json::Result<Value> {
    let body = line.strip_prefix(UTF8_BOM).unwrap_or(line);
    let mut de = serde_json::Deserializer::from_slice(body);
    de.disable_recursion_limit();
    let record = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(record)
}

/// First few characters of a line for diagnostics, lossily decoded
fn preview(line: &[u8]) -> String {
    const MAX_CHARS: usize = 60;
    let text = line.to_str_lossy();
    match text.char_indices().nth(MAX_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.into_owned(),
    }
}

/// Strip a single trailing `\n`; any `\r` stays part of the line
#[inline]
fn strip_newline(buf: &[u8]) -> &[u8] {
    match buf.split_last() {
        Some((b'\n', rest)) => rest,
        _ => buf,
    }
}

/// Dedup every line of `reader` into `writer`
///
/// Lines are split on `\n` only. Each kept line is written unchanged and
/// terminated with `\n`. A final line without a terminator is still processed.
/// Read and write failures abort the stream; malformed lines never do.
pub fn dedup_stream<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    config: &KeyConfig,
) -> Result<RunStats> {
    let mut engine = Deduplicator::new(config.clone());
    let mut buf = Vec::with_capacity(1 << 12);

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).map_err(DedupError::Read)?;
        if n == 0 {
            break;
        }
        let line = strip_newline(&buf);
        if engine.observe(line).is_kept() {
            writer
                .write_all(line)
                .and_then(|()| writer.write_all(b"\n"))
                .map_err(DedupError::Write)?;
        }
    }
    writer.flush().map_err(DedupError::Write)?;

    Ok(engine.finish())
}

/// In-memory form of [`dedup_stream`]: returns the kept lines in input order
pub fn dedup_lines<I, L>(lines: I, config: &KeyConfig) -> (Vec<L>, RunStats)
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    let mut engine = Deduplicator::new(config.clone());
    let kept = lines
        .into_iter()
        .filter(|line| engine.observe(line.as_ref()).is_kept())
        .collect();
    (kept, engine.finish())
}
