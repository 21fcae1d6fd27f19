//! Utility functions
//!
//! Default directory layout of the ingestion pipeline and timing helpers.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw crawler output
pub const CRAWL_DIR: &str = "data_crawl";
/// Preprocessed records
pub const PREPROCESSED_DIR: &str = "data_preprocessed";
/// Dedup output when the input is already preprocessed
pub const PREPROCESSED_DEDUP_DIR: &str = "data_preprocessed_dedup";

/// First default input directory that exists under `root`
pub fn pick_default_input_dir(root: &Path) -> Option<PathBuf> {
    [CRAWL_DIR, PREPROCESSED_DIR]
        .into_iter()
        .map(|name| root.join(name))
        .find(|dir| dir.is_dir())
}

/// Default output directory for a given input directory
///
/// Crawl data dedups into the preprocessed directory; preprocessed data gets
/// its own dedup directory so input is never overwritten.
pub fn default_output_dir_for(input_dir: Option<&Path>, root: &Path) -> PathBuf {
    match input_dir.and_then(Path::file_name) {
        Some(name) if name == PREPROCESSED_DIR => root.join(PREPROCESSED_DEDUP_DIR),
        _ => root.join(PREPROCESSED_DIR),
    }
}

/// Format duration as a human-readable string
#[inline]
pub fn format_elapsed(dur: Duration) -> String {
    let secs = dur.as_secs();
    if secs >= 60 {
        format!("{} min {} sec", secs / 60, secs % 60)
    } else {
        format!("{:.1} sec", dur.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_pick_default_prefers_crawl_dir() {
        let temp = TempDir::new().unwrap();
        assert_eq!(pick_default_input_dir(temp.path()), None);

        fs::create_dir(temp.path().join(PREPROCESSED_DIR)).unwrap();
        assert_eq!(
            pick_default_input_dir(temp.path()),
            Some(temp.path().join(PREPROCESSED_DIR))
        );

        fs::create_dir(temp.path().join(CRAWL_DIR)).unwrap();
        assert_eq!(
            pick_default_input_dir(temp.path()),
            Some(temp.path().join(CRAWL_DIR))
        );
    }

    #[test]
    fn test_default_output_dir() {
        let root = Path::new("");
        assert_eq!(
            default_output_dir_for(Some(Path::new("data_crawl")), root),
            PathBuf::from(PREPROCESSED_DIR)
        );
        assert_eq!(
            default_output_dir_for(Some(Path::new("x/data_preprocessed")), root),
            PathBuf::from(PREPROCESSED_DEDUP_DIR)
        );
        assert_eq!(default_output_dir_for(None, root), PathBuf::from(PREPROCESSED_DIR));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2 min 5 sec");
        assert!(format_elapsed(Duration::from_millis(500)).ends_with("sec"));
    }
}
