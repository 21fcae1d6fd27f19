//! Directory batch mode
//!
//! Runs the engine once per candidate file, each with its own observed-key
//! set, and sums the per-file counters after every pass has finished.

use crate::error::{DedupError, Result};
use crate::io::{REDIRECT_MARKER, dedup_file, paths_equivalent, resolve_output_path};
use crate::key::KeyConfig;
use crate::stats::RunStats;
use rayon::prelude::*;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Default extension of candidate input files
pub const DEFAULT_EXTENSION: &str = "jsonl";

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub key: KeyConfig,
    /// Extension (without the dot) a file must have to be processed.
    pub extension: String,
    /// Files processed concurrently; 1 means strictly sequential.
    pub threads: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            key: KeyConfig::default(),
            extension: DEFAULT_EXTENSION.to_string(),
            threads: 1,
        }
    }
}

/// Outcome of one file in a batch
#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<RunStats>,
}

/// Per-file outcomes plus the summed counters of the files that succeeded
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub files: Vec<FileReport>,
    pub totals: RunStats,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }
}

/// Regular files directly inside `dir` with the given extension, sorted
pub fn discover_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| DedupError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| DedupError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Whether `path` is named `<stem>.dedup.<ext>`
fn is_redirected_output(path: &Path) -> bool {
    path.file_stem()
        .map(Path::new)
        .and_then(Path::extension)
        == Some(OsStr::new(REDIRECT_MARKER))
}

fn process_one(input: PathBuf, output: PathBuf, key: &KeyConfig) -> FileReport {
    let result = dedup_file(&input, &output, key);
    match &result {
        Ok(stats) => info!(
            input = %input.display(),
            written = stats.written,
            duplicates = stats.duplicates,
            "file done"
        ),
        Err(err) => error!(input = %input.display(), "{}", err.describe()),
    }
    FileReport {
        input,
        output,
        result,
    }
}

/// Dedup every candidate file of `input_dir` into `output_dir`
///
/// A missing input directory, an uncreatable output directory or an empty
/// candidate list fails the whole run. Failures of individual files are
/// recorded in their [`FileReport`] and do not stop the others.
pub fn run_batch(input_dir: &Path, output_dir: &Path, options: &BatchOptions) -> Result<BatchSummary> {
    if !input_dir.is_dir() {
        return Err(DedupError::InputDirNotFound(input_dir.to_path_buf()));
    }
    fs::create_dir_all(output_dir).map_err(|source| DedupError::CreateOutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut inputs = discover_inputs(input_dir, &options.extension)?;
    if paths_equivalent(input_dir, output_dir) {
        // Outputs of an earlier run land next to their inputs.
        inputs.retain(|path| {
            let keep = !is_redirected_output(path);
            if !keep {
                debug!(input = %path.display(), "skipping output of a previous run");
            }
            keep
        });
    }
    if inputs.is_empty() {
        return Err(DedupError::NoInputFiles {
            dir: input_dir.to_path_buf(),
            extension: options.extension.clone(),
        });
    }
    info!(
        "found {} .{} files in {}",
        inputs.len(),
        options.extension,
        input_dir.display()
    );

    let jobs: Vec<(PathBuf, PathBuf)> = inputs
        .into_iter()
        .map(|input| {
            let output = resolve_output_path(&input, None, output_dir);
            (input, output)
        })
        .collect();

    let files: Vec<FileReport> = if options.threads > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .build()
        {
            Ok(pool) => pool.install(|| {
                jobs.into_par_iter()
                    .map(|(input, output)| process_one(input, output, &options.key))
                    .collect()
            }),
            Err(err) => {
                warn!("could not start thread pool ({err}); processing sequentially");
                jobs.into_iter()
                    .map(|(input, output)| process_one(input, output, &options.key))
                    .collect()
            }
        }
    } else {
        jobs.into_iter()
            .map(|(input, output)| process_one(input, output, &options.key))
            .collect()
    };

    Ok(summarize(files))
}

/// Sum the counters of successful files
pub fn summarize(files: Vec<FileReport>) -> BatchSummary {
    let totals = files
        .iter()
        .filter_map(|f| f.result.as_ref().ok())
        .copied()
        .sum();
    BatchSummary { files, totals }
}
