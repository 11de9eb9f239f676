//! End-to-end tests: build an index from a corpus directory, reopen it from
//! disk and run queries through both the library and the CLI binary.

use boolsearch::index::build::build_index;
use boolsearch::index::{DICTIONARY_FILE, DocId, IndexConfig, IndexReader, POSTINGS_FILE};
use boolsearch::query::{QueryError, QueryExecutor};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Write `docs` under `<root>/<source>/<name>`
fn write_corpus(root: &Path, docs: &[(&str, &str, &str)]) {
    for (source, name, text) in docs {
        let dir = root.join(source);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), text).unwrap();
    }
}

/// Corpus and index directories that live as long as the returned guard
fn build(docs: &[(&str, &str, &str)]) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("corpus");
    let index_dir = temp.path().join("index");
    write_corpus(&corpus, docs);
    build_index(&corpus, &index_dir, &IndexConfig::default()).unwrap();
    (temp, index_dir)
}

fn search(reader: &IndexReader, query: &str) -> Result<Vec<DocId>, QueryError> {
    QueryExecutor::new(reader)
        .search(query, usize::MAX)
        .map(|r| r.doc_ids)
}

fn boolsearch(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_boolsearch"))
        .args(args)
        .output()
        .expect("Failed to run boolsearch");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

// ============================================================================
// Library
// ============================================================================

#[test]
fn test_worked_example_from_disk() {
    let (_temp, index_dir) = build(&[
        ("wikipedia_en", "a.txt", "cats run"),
        ("wikipedia_en", "b.txt", "cat ran"),
        ("wikipedia_en", "c.txt", "dog walks"),
    ]);
    let reader = IndexReader::open(&index_dir).unwrap();

    assert_eq!(search(&reader, "cat AND NOT dog").unwrap(), vec![0, 1]);
    assert_eq!(
        search(&reader, "dog OR cat AND run").unwrap(),
        search(&reader, "dog OR (cat AND run)").unwrap()
    );
    assert_eq!(search(&reader, "dog OR cat AND run").unwrap(), vec![0, 2]);
    assert!(search(&reader, "zzznotfound").unwrap().is_empty());
}

#[test]
fn test_database_example_from_disk() {
    let (_temp, index_dir) = build(&[
        ("wikipedia_en", "0.txt", "database systems"),
        ("wikipedia_en", "1.txt", "database theory"),
    ]);
    let reader = IndexReader::open(&index_dir).unwrap();

    assert_eq!(search(&reader, "database").unwrap(), vec![0, 1]);
    assert!(search(&reader, "systems AND theory").unwrap().is_empty());
    reader.verify().unwrap();
}

#[test]
fn test_ids_follow_source_order_then_file_name() {
    let (_temp, index_dir) = build(&[
        ("marinelink", "a.txt", "vessel"),
        ("wikipedia_en", "z.txt", "vessel"),
        ("wikipedia_en", "m.txt", "river"),
    ]);
    let reader = IndexReader::open(&index_dir).unwrap();
    let catalog = reader.catalog();

    let sources: Vec<_> = catalog.documents().iter().map(|d| d.source.as_str()).collect();
    assert_eq!(sources, vec!["wikipedia_en", "wikipedia_en", "marinelink"]);
    assert!(catalog.get(0).unwrap().path.ends_with("m.txt"));
    assert_eq!(search(&reader, "vessel").unwrap(), vec![1, 2]);
}

#[test]
fn test_non_matching_extension_ignored() {
    let (_temp, index_dir) = build(&[
        ("wikipedia_en", "a.txt", "harbor"),
        ("wikipedia_en", "b.md", "harbor"),
    ]);
    let reader = IndexReader::open(&index_dir).unwrap();
    assert_eq!(reader.doc_count(), 1);
}

#[test]
fn test_malformed_query_reports_error() {
    let (_temp, index_dir) = build(&[("wikipedia_en", "a.txt", "harbor crane")]);
    let reader = IndexReader::open(&index_dir).unwrap();

    assert!(matches!(
        search(&reader, "harbor AND OR crane"),
        Err(QueryError::MissingOperand { .. })
    ));
    assert!(matches!(
        search(&reader, "harbor crane"),
        Err(QueryError::Unbalanced { depth: 2 })
    ));
}

#[cfg(unix)]
#[test]
fn test_line_break_in_file_name_keeps_index_readable() {
    let (_temp, index_dir) = build(&[
        ("wikipedia_en", "a.txt", "harbor"),
        ("wikipedia_en", "odd\nname.txt", "harbor crane"),
    ]);
    let reader = IndexReader::open(&index_dir).unwrap();

    assert_eq!(reader.doc_count(), 1);
    assert_eq!(search(&reader, "harbor").unwrap(), vec![0]);
    assert!(search(&reader, "crane").unwrap().is_empty());
    reader.verify().unwrap();
}

#[test]
fn test_missing_artifacts_are_fatal() {
    for artifact in [DICTIONARY_FILE, POSTINGS_FILE] {
        let (_temp, index_dir) = build(&[("wikipedia_en", "a.txt", "harbor")]);
        fs::remove_file(index_dir.join(artifact)).unwrap();

        let err = IndexReader::open(&index_dir).err().unwrap();
        assert!(
            format!("{err:#}").contains(artifact),
            "error should name {artifact}: {err:#}"
        );
    }
}

// ============================================================================
// CLI
// ============================================================================

#[test]
fn test_cli_index_then_search() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("corpus");
    let index_dir = temp.path().join("index");
    write_corpus(
        &corpus,
        &[
            ("wikipedia_en", "a.txt", "cats run"),
            ("wikipedia_en", "b.txt", "cat ran"),
            ("marinelink", "c.txt", "dog walks"),
        ],
    );

    let (out, err, ok) = boolsearch(&[
        "index",
        "--input-dir",
        corpus.to_str().unwrap(),
        "--out-dir",
        index_dir.to_str().unwrap(),
        "--quiet",
    ]);
    assert!(ok, "index should succeed: {err}");
    assert!(out.contains("docs: 3"), "got: {out}");
    assert!(out.contains("terms: 5"), "got: {out}");

    let (out, err, ok) = boolsearch(&[
        "search",
        "--index-dir",
        index_dir.to_str().unwrap(),
        "--query",
        "cat AND NOT dog",
        "--no-color",
    ]);
    assert!(ok, "search should succeed: {err}");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "hits: 2");
    assert!(lines[1].starts_with("0\twikipedia_en\t"));
    assert!(lines[2].starts_with("1\twikipedia_en\t"));

    let (out, _, ok) = boolsearch(&["verify", "--index-dir", index_dir.to_str().unwrap()]);
    assert!(ok);
    assert!(out.starts_with("ok"));
}

#[test]
fn test_cli_search_topk() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("corpus");
    let index_dir = temp.path().join("index");
    let docs: Vec<(String, String)> = (0..5)
        .map(|i| (format!("{i}.txt"), "anchor chain".to_string()))
        .collect();
    let docs: Vec<(&str, &str, &str)> = docs
        .iter()
        .map(|(name, text)| ("wikipedia_en", name.as_str(), text.as_str()))
        .collect();
    write_corpus(&corpus, &docs);
    build_index(&corpus, &index_dir, &IndexConfig::default()).unwrap();

    let (out, _, ok) = boolsearch(&[
        "search",
        "--index-dir",
        index_dir.to_str().unwrap(),
        "--query",
        "anchor",
        "--topk",
        "2",
        "--no-color",
    ]);
    assert!(ok);
    assert_eq!(out.lines().next(), Some("hits: 5"));
    assert_eq!(out.lines().count(), 3);
}

#[test]
fn test_cli_malformed_query_exits_nonzero() {
    let (_temp, index_dir) = build(&[("wikipedia_en", "a.txt", "harbor crane")]);

    let output = Command::new(env!("CARGO_BIN_EXE_boolsearch"))
        .args([
            "search",
            "--index-dir",
            index_dir.to_str().unwrap(),
            "--query",
            "harbor AND",
            "--no-color",
        ])
        .output()
        .expect("Failed to run boolsearch");

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("AND needs 2"), "got: {err}");
}

#[test]
fn test_cli_interactive_continues_after_bad_query() {
    let (_temp, index_dir) = build(&[("wikipedia_en", "a.txt", "harbor crane")]);

    let mut child = Command::new(env!("CARGO_BIN_EXE_boolsearch"))
        .args(["search", "--index-dir", index_dir.to_str().unwrap(), "--no-color"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run boolsearch");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"harbor AND\ncrane\n\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let out = String::from_utf8_lossy(&output.stdout);
    assert!(out.starts_with("hits: 1\n0\t"), "got: {out}");
    assert!(String::from_utf8_lossy(&output.stderr).contains("AND needs 2"));
}

#[test]
fn test_cli_search_missing_index_fails() {
    let temp = TempDir::new().unwrap();
    let (_, err, ok) = boolsearch(&[
        "search",
        "--index-dir",
        temp.path().to_str().unwrap(),
        "--query",
        "anything",
    ]);
    assert!(!ok);
    assert!(err.contains("docs.tsv"), "got: {err}");
}

#[test]
fn test_cli_tokens_counts() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("corpus");
    let counts = temp.path().join("counts.tsv");
    write_corpus(&corpus, &[("wikipedia_en", "a.txt", "Ships ship ships at sea")]);

    let (out, err, ok) = boolsearch(&[
        "tokens",
        "--input-dir",
        corpus.to_str().unwrap(),
        "--stem",
        "--counts-tsv",
        counts.to_str().unwrap(),
        "--zipf",
    ]);
    assert!(ok, "tokens should succeed: {err}");
    assert!(out.contains("total_tokens: 5"), "got: {out}");
    assert!(out.contains("vocab_size: 3"), "got: {out}");
    assert!(out.contains("zipf_s:"), "got: {out}");
    assert_eq!(fs::read_to_string(&counts).unwrap(), "ship\t3\nat\t1\nsea\t1\n");
}
