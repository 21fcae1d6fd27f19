//! Per-stream outcome counters
//!
//! Every line lands in exactly one bucket, so a finished run always satisfies
//! `total = parsed + parse_errors + empty_lines` and
//! `parsed = written + duplicates`.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Counters for one dedup pass (or the sum of several)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub total: u64,
    pub parsed: u64,
    pub written: u64,
    pub duplicates: u64,
    pub parse_errors: u64,
    pub empty_lines: u64,
}

impl RunStats {
    /// Check both counter invariants
    pub fn is_consistent(&self) -> bool {
        self.total == self.parsed + self.parse_errors + self.empty_lines
            && self.parsed == self.written + self.duplicates
    }
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.parsed += other.parsed;
        self.written += other.written;
        self.duplicates += other.duplicates;
        self.parse_errors += other.parse_errors;
        self.empty_lines += other.empty_lines;
    }
}

impl Add for RunStats {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl Sum for RunStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Indented six-line report, one counter per line
impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  processed:        {}", self.total)?;
        writeln!(f, "  parsed:           {}", self.parsed)?;
        writeln!(f, "  written (unique): {}", self.written)?;
        writeln!(f, "  duplicates:       {}", self.duplicates)?;
        writeln!(f, "  parse errors:     {}", self.parse_errors)?;
        writeln!(f, "  empty lines:      {}", self.empty_lines)
    }
}
