//! Structural failures that abort a stream
//!
//! Malformed lines are not errors at this level; the engine counts and skips
//! them.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DedupError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("input directory not found: {}", .0.display())]
    InputDirNotFound(PathBuf),

    #[error("failed to open input file {}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list input directory {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output directory {}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open output file {}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read input")]
    Read(#[source] io::Error),

    #[error("failed to write output")]
    Write(#[source] io::Error),

    #[error("failed to move finished output into place at {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no .{extension} files found in {}", dir.display())]
    NoInputFiles { dir: PathBuf, extension: String },
}

impl DedupError {
    /// Message including every underlying cause, for one-line log output
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Result type for dedup operations.
pub type Result<T> = std::result::Result<T, DedupError>;
