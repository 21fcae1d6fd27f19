// Command-line argument parsing
use crate::batch::{BatchOptions, DEFAULT_EXTENSION};
use crate::key::{DEFAULT_PRIORITY, DEFAULT_SHORT_TEXT_THRESHOLD, KeyConfig, KeyField};
use clap::Parser;
use std::path::PathBuf;

/// Exact-key deduplication for JSON Lines feeds.
///
/// With INPUT, dedups a single file. With --all (or no arguments at all),
/// dedups every matching file of a directory.
#[derive(Parser, Debug)]
#[command(name = "jsonl-dedup", version)]
pub struct Args {
    /// Input file, or input directory with --all
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
    /// Output file, or output directory with --all
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
    /// Process every matching file in a directory
    #[arg(short, long)]
    pub all: bool,
    /// Extension of the files picked up in directory mode
    #[arg(short, long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,
    /// Normalized text shorter than this many bytes is keyed together with its URL
    #[arg(long, default_value_t = DEFAULT_SHORT_TEXT_THRESHOLD)]
    pub short_text_threshold: usize,
    /// Order in which record fields are tried when deriving the dedup key
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = DEFAULT_PRIORITY.to_vec())]
    pub priority: Vec<KeyField>,
    /// Files processed concurrently in directory mode
    #[arg(short = 't', long, default_value_t = num_cpus())]
    pub threads: usize,
    /// Force sequential processing in directory mode
    #[arg(long)]
    pub single_threaded: bool,
}

/// What the invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Single {
        input: PathBuf,
        output: Option<PathBuf>,
    },
    Batch {
        input_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    },
}

impl Args {
    pub fn mode(&self) -> Mode {
        match (&self.input, self.all) {
            (Some(input), false) => Mode::Single {
                input: input.clone(),
                output: self.output.clone(),
            },
            _ => Mode::Batch {
                input_dir: self.input.clone(),
                output_dir: self.output.clone(),
            },
        }
    }

    pub fn key_config(&self) -> KeyConfig {
        KeyConfig {
            short_text_threshold: self.short_text_threshold,
            priority: self.priority.clone(),
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            key: self.key_config(),
            extension: self.extension.trim_start_matches('.').to_string(),
            threads: effective_threads(self),
        }
    }
}

pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Get effective thread count based on args
#[inline]
pub fn effective_threads(args: &Args) -> usize {
    if args.single_threaded {
        1
    } else {
        args.threads.max(1)
    }
}
