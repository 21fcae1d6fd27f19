//! Integration tests for jsonl-dedup.
//!
//! End-to-end runs over real files in temporary directories.

use jsonl_dedup::{
    BatchOptions, DedupError, KeyConfig, KeyField, RunStats, dedup_file, dedup_lines, run_batch,
};
use std::fs;
use tempfile::TempDir;

const FEED: &str = concat!(
    "{\"id\":\"1\",\"text\":\"Pension reform passes parliament\",\"url\":\"https://news.example/a\"}\n",
    "{\"id\":\"2\",\"text\":\"pension  REFORM passes parliament\",\"url\":\"https://news.example/a/\"}\n",
    "\n",
    "{\"id\":\"3\",\"text\":\n",
    "{\"id\":\"4\",\"title\":\"Markets rally\",\"url\":\"https://news.example/b\"}\n",
    "{\"id\":\"5\",\"title\":\"Markets rally\",\"url\":\"https://other.example/b\"}\n",
    "{\"id\":\"6\",\"lang\":\"ko\"}\n",
    "{\"id\":\"6\",\"lang\":\"ko\"}\n",
    "{\"lang\":\"en\"}\n",
    "{\"lang\":\"en\"}\n",
);

#[test]
fn test_file_roundtrip_keeps_first_occurrences() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("feed.jsonl");
    let output = temp.path().join("out/feed.jsonl");
    fs::write(&input, FEED).unwrap();

    let stats = dedup_file(&input, &output, &KeyConfig::default()).unwrap();

    assert_eq!(
        stats,
        RunStats {
            total: 10,
            parsed: 8,
            written: 6,
            duplicates: 2,
            parse_errors: 1,
            empty_lines: 1,
        }
    );
    assert!(stats.is_consistent());

    let written = fs::read_to_string(&output).unwrap();
    let kept: Vec<&str> = written.lines().collect();
    let mut source = FEED.lines();
    assert!(
        kept.iter().all(|k| source.any(|line| line == *k)),
        "kept lines must be an ordered subsequence of the input"
    );
    assert_eq!(kept.len(), 6);
    assert!(kept[0].contains("\"id\":\"1\""));
    assert!(!written.contains("\"id\":\"2\""));
}

#[test]
fn test_same_file_output_is_redirected() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("feed.jsonl");
    fs::write(&input, FEED).unwrap();

    let output = jsonl_dedup::resolve_output_path(&input, Some(input.as_path()), temp.path());
    dedup_file(&input, &output, &KeyConfig::default()).unwrap();

    assert_eq!(fs::read_to_string(&input).unwrap(), FEED);
    assert!(temp.path().join("feed.dedup.jsonl").exists());
}

#[test]
fn test_rerun_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("feed.jsonl");
    let output = temp.path().join("out.jsonl");
    fs::write(&input, FEED).unwrap();

    let first = dedup_file(&input, &output, &KeyConfig::default()).unwrap();
    let first_output = fs::read(&output).unwrap();
    let second = dedup_file(&input, &output, &KeyConfig::default()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_output, fs::read(&output).unwrap());
}

#[test]
fn test_batch_isolates_files_and_sums_stats() {
    let temp = TempDir::new().unwrap();
    let input_dir = temp.path().join("in");
    let output_dir = temp.path().join("out");
    fs::create_dir(&input_dir).unwrap();

    // Same record in both files: each file keeps its own copy.
    let record = "{\"text\":\"Shared story\"}\n";
    fs::write(input_dir.join("a.jsonl"), format!("{record}{record}")).unwrap();
    fs::write(input_dir.join("b.jsonl"), format!("{record}\nnot json\n")).unwrap();
    fs::write(input_dir.join("skip.txt"), record).unwrap();

    for threads in [1, 4] {
        let options = BatchOptions {
            threads,
            ..BatchOptions::default()
        };
        let summary = run_batch(&input_dir, &output_dir, &options).unwrap();

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.files[0].input, input_dir.join("a.jsonl"));
        assert_eq!(summary.totals.written, 2);
        assert_eq!(summary.totals.duplicates, 1);
        assert_eq!(summary.totals.empty_lines, 1);
        assert_eq!(summary.totals.parse_errors, 1);
        assert_eq!(summary.totals.total, 5);
        assert!(summary.totals.is_consistent());

        assert_eq!(fs::read_to_string(output_dir.join("a.jsonl")).unwrap(), record);
        assert_eq!(fs::read_to_string(output_dir.join("b.jsonl")).unwrap(), record);
        assert!(!output_dir.join("skip.txt").exists());
    }
}

#[test]
fn test_batch_into_same_directory_redirects() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("feed.jsonl"), FEED).unwrap();

    let summary = run_batch(temp.path(), temp.path(), &BatchOptions::default()).unwrap();

    assert_eq!(summary.files[0].output, temp.path().join("feed.dedup.jsonl"));
    assert_eq!(fs::read_to_string(temp.path().join("feed.jsonl")).unwrap(), FEED);
}

#[test]
fn test_batch_without_candidates_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("feed.ndjson"), FEED).unwrap();

    let err = run_batch(temp.path(), &temp.path().join("out"), &BatchOptions::default()).unwrap_err();
    assert!(matches!(err, DedupError::NoInputFiles { .. }));

    let options = BatchOptions {
        extension: "ndjson".to_string(),
        ..BatchOptions::default()
    };
    let summary = run_batch(temp.path(), &temp.path().join("out"), &options).unwrap();
    assert_eq!(summary.succeeded(), 1);
}

#[test]
fn test_custom_priority_prefers_id() {
    let lines = [
        r#"{"id":"a","text":"Same body"}"#,
        r#"{"id":"b","text":"Same body"}"#,
        r#"{"id":"a","text":"Other body"}"#,
    ];

    let (kept, _) = dedup_lines(lines, &KeyConfig::default());
    assert_eq!(kept, vec![lines[0], lines[2]]);

    let by_id = KeyConfig {
        priority: vec![KeyField::Id, KeyField::Text],
        ..KeyConfig::default()
    };
    let (kept, _) = dedup_lines(lines, &by_id);
    assert_eq!(kept, vec![lines[0], lines[1]]);
}
