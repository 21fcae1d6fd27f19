//! File plumbing around the dedup engine
//!
//! Output path resolution, directory preparation and the single-file entry
//! point. Output is written to a temporary file next to the destination and
//! moved into place once the stream has been fully processed.

use crate::engine::dedup_stream;
use crate::error::{DedupError, Result};
use crate::key::KeyConfig;
use crate::stats::RunStats;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Output file name used when the input path has no file name component
pub const DEFAULT_OUTPUT_NAME: &str = "deduped.jsonl";

/// Inserted before the extension when output would overwrite the input
pub const REDIRECT_MARKER: &str = "dedup";

const READ_BUFFER: usize = 1 << 18;
const WRITE_BUFFER: usize = 1 << 20;

/// Whether two paths name the same existing file
///
/// Paths that cannot be canonicalized (typically because they do not exist
/// yet) are never equivalent.
pub fn paths_equivalent(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Sibling of `input` named `<stem>.dedup<.ext>`
pub fn redirect_path(input: &Path) -> PathBuf {
    let mut name: OsString = input
        .file_stem()
        .unwrap_or_else(|| OsStr::new("deduped"))
        .to_os_string();
    name.push(".");
    name.push(REDIRECT_MARKER);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

/// Pick the output path for `input`
///
/// Uses `explicit` when given, otherwise reuses the input's file name under
/// `default_dir`. If the result is the input file itself, output is redirected
/// to [`redirect_path`] instead of overwriting it.
pub fn resolve_output_path(input: &Path, explicit: Option<&Path>, default_dir: &Path) -> PathBuf {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_dir.join(
            input
                .file_name()
                .unwrap_or_else(|| OsStr::new(DEFAULT_OUTPUT_NAME)),
        ),
    };

    if paths_equivalent(input, &candidate) {
        let redirected = redirect_path(input);
        warn!(
            "output path matched input; redirecting to {}",
            redirected.display()
        );
        redirected
    } else {
        candidate
    }
}

/// Create the parent directories of `output`
pub fn prepare_output(output: &Path) -> Result<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| DedupError::CreateOutputDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Open an input file for buffered line reading
pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(DedupError::InputNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| DedupError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::with_capacity(READ_BUFFER, file))
}

/// Create a temporary file in the directory that will hold `output`
fn create_staging(output: &Path) -> Result<NamedTempFile> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir).map_err(|source| DedupError::CreateOutput {
        path: output.to_path_buf(),
        source,
    })
}

/// Dedup one file into another
///
/// The destination is only replaced once every input line has been
/// processed; a failed run leaves any existing destination untouched.
pub fn dedup_file(input: &Path, output: &Path, config: &KeyConfig) -> Result<RunStats> {
    let reader = open_input(input)?;
    prepare_output(output)?;
    let staging = create_staging(output)?;
    // Temp files are created owner-only; give the output the input's mode.
    if let Ok(meta) = reader.get_ref().metadata() {
        if let Err(err) = staging.as_file().set_permissions(meta.permissions()) {
            debug!("could not copy input permissions to output: {err}");
        }
    }
    debug!(
        input = %input.display(),
        staging = %staging.path().display(),
        "deduplicating"
    );

    let mut writer = BufWriter::with_capacity(WRITE_BUFFER, staging);
    let stats = dedup_stream(reader, &mut writer, config)?;
    let staging = writer
        .into_inner()
        .map_err(|err| DedupError::Write(err.into_error()))?;

    staging
        .persist(output)
        .map_err(|err| DedupError::Persist {
            path: output.to_path_buf(),
            source: err.error,
        })?;

    Ok(stats)
}
