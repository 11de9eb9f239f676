//! Corpus discovery and batched document loading.

use crate::index::types::IndexConfig;
use ignore::WalkBuilder;
use memchr::memchr2;
use rayon::prelude::*;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A document found on disk, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub source: String,
    pub path: PathBuf,
}

/// Contents of one corpus file after loading
#[derive(Debug)]
pub enum DocumentText {
    Text(String),
    TooLarge(u64),
    Unreadable(std::io::Error),
}

/// List `<input_dir>/<source>/*.<ext>` for every configured source, in order.
/// Files within a source are sorted by name; missing source dirs are skipped.
pub fn discover(input_dir: &Path, config: &IndexConfig) -> Vec<CorpusFile> {
    let mut files = Vec::new();

    for source in &config.sources {
        let dir = input_dir.join(source);
        if !dir.is_dir() {
            debug!(source = %source, dir = %dir.display(), "source directory missing, skipped");
            continue;
        }

        let walker = WalkBuilder::new(&dir)
            .standard_filters(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let before = files.len();
        files.extend(
            walker
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
                .filter(|entry| {
                    entry
                        .path()
                        .extension()
                        .is_some_and(|ext| ext == OsStr::new(&config.extension))
                })
                .filter(|entry| {
                    let fits = fits_catalog(entry.path());
                    if !fits {
                        warn!(path = ?entry.path(), "line break in file path, not indexed");
                    }
                    fits
                })
                .map(|entry| CorpusFile {
                    source: source.clone(),
                    path: entry.into_path(),
                }),
        );
        debug!(source = %source, files = files.len() - before, "discovered");
    }

    files
}

/// The catalog is line-oriented; a path with a line break cannot be read back
fn fits_catalog(path: &Path) -> bool {
    memchr2(b'\n', b'\r', path.as_os_str().as_encoded_bytes()).is_none()
}

/// Read a batch of files in parallel; output order matches input order
pub fn load_batch(files: &[CorpusFile], max_file_size: u64) -> Vec<DocumentText> {
    files
        .par_iter()
        .map(|file| load_file(&file.path, max_file_size))
        .collect()
}

fn load_file(path: &Path, max_file_size: u64) -> DocumentText {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > max_file_size => return DocumentText::TooLarge(meta.len()),
        Ok(_) => {}
        Err(e) => return DocumentText::Unreadable(e),
    }
    match fs::read(path) {
        Ok(bytes) => DocumentText::Text(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => DocumentText::Unreadable(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        let wiki = dir.path().join("wikipedia_en");
        let news = dir.path().join("marinelink");
        fs::create_dir_all(&wiki).unwrap();
        fs::create_dir_all(wiki.join("nested")).unwrap();
        fs::create_dir_all(&news).unwrap();
        fs::write(wiki.join("b.txt"), "second").unwrap();
        fs::write(wiki.join("a.txt"), "first").unwrap();
        fs::write(wiki.join("skip.md"), "not text").unwrap();
        fs::write(wiki.join("nested").join("deep.txt"), "too deep").unwrap();
        fs::write(news.join("z.txt"), "third").unwrap();
        dir
    }

    #[test]
    fn test_discover_order_and_filtering() {
        let dir = corpus();
        let files = discover(dir.path(), &IndexConfig::default());
        let names: Vec<_> = files
            .iter()
            .map(|f| {
                (
                    f.source.as_str(),
                    f.path.file_name().unwrap().to_string_lossy().into_owned(),
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("wikipedia_en", "a.txt".to_string()),
                ("wikipedia_en", "b.txt".to_string()),
                ("marinelink", "z.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_discover_skips_missing_sources() {
        let dir = corpus();
        let config = IndexConfig {
            sources: vec!["nope".into(), "marinelink".into()],
            ..IndexConfig::default()
        };
        let files = discover(dir.path(), &config);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].source, "marinelink");
    }

    #[test]
    fn test_load_batch_preserves_order_and_reports_failures() {
        let dir = corpus();
        let mut files = discover(dir.path(), &IndexConfig::default());
        files.push(CorpusFile {
            source: "marinelink".into(),
            path: dir.path().join("missing.txt"),
        });

        let loaded = load_batch(&files, 1024);
        assert!(matches!(&loaded[0], DocumentText::Text(t) if t == "first"));
        assert!(matches!(&loaded[1], DocumentText::Text(t) if t == "second"));
        assert!(matches!(&loaded[2], DocumentText::Text(t) if t == "third"));
        assert!(matches!(loaded[3], DocumentText::Unreadable(_)));

        let tiny = load_batch(&files[..1], 2);
        assert!(matches!(tiny[0], DocumentText::TooLarge(5)));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_paths_with_line_breaks() {
        let dir = corpus();
        let news = dir.path().join("marinelink");
        fs::write(news.join("odd\nname.txt"), "hidden").unwrap();
        fs::write(news.join("carriage\rreturn.txt"), "hidden").unwrap();

        let files = discover(dir.path(), &IndexConfig::default());
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| fits_catalog(&f.path)));
    }
}
