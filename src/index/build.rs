use crate::index::corpus::{DocumentText, discover, load_batch};
use crate::index::types::{IndexConfig, IndexMeta};
use crate::index::writer::IndexWriter;
use crate::utils::progress::{ProgressBar, document_bar, spinner};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// What a build produced
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub index_dir: PathBuf,
    pub meta: IndexMeta,
    /// Documents that kept their id but contributed no terms
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Build the index for `input_dir` into `index_dir`
pub fn build_index(
    input_dir: &Path,
    index_dir: &Path,
    config: &IndexConfig,
) -> Result<BuildSummary> {
    build_index_with_progress(input_dir, index_dir, config, true)
}

/// Build the index, optionally drawing progress bars on stderr
pub fn build_index_with_progress(
    input_dir: &Path,
    index_dir: &Path,
    config: &IndexConfig,
    silent: bool,
) -> Result<BuildSummary> {
    let start = Instant::now();

    if !input_dir.is_dir() {
        warn!(
            input_dir = %input_dir.display(),
            "input directory does not exist, building an empty index"
        );
    }

    // Phase 1: discovery fixes the id of every document
    let discovery = (!silent).then(|| spinner("Discovering documents..."));
    let files = discover(input_dir, config);
    if let Some(spinner) = discovery {
        spinner.finish_with_message(format!("Found {} documents", files.len()));
    }

    // Phase 2: read in parallel batches, index sequentially in id order
    let bar: Option<ProgressBar> = (!silent).then(|| document_bar(files.len() as u64));
    let mut writer = IndexWriter::new();
    let mut skipped = 0usize;

    for batch in files.chunks(config.chunk_size.max(1)) {
        let texts = load_batch(batch, config.max_file_size);

        for (file, text) in batch.iter().zip(texts) {
            let text = match text {
                DocumentText::Text(text) => Some(text),
                DocumentText::TooLarge(size) => {
                    warn!(
                        path = %file.path.display(),
                        size,
                        "document exceeds max_file_size, not indexed"
                    );
                    None
                }
                DocumentText::Unreadable(e) => {
                    warn!(
                        path = %file.path.display(),
                        error = %e,
                        "document could not be read, not indexed"
                    );
                    None
                }
            };
            skipped += usize::from(text.is_none());
            writer.add_document(&file.source, file.path.clone(), text.as_deref());

            if let Some(ref bar) = bar {
                bar.inc(1);
            }
        }
    }

    if let Some(bar) = bar {
        bar.finish_with_message(format!("{} terms", writer.term_count()));
    }

    // Phase 3: sort, encode and write
    let finalize = (!silent).then(|| spinner("Writing index..."));
    let meta = writer.finish().write(index_dir)?;
    if let Some(spinner) = finalize {
        spinner.finish_with_message("Index complete");
    }

    let elapsed = start.elapsed();
    info!(
        docs = meta.doc_count,
        terms = meta.term_count,
        skipped,
        elapsed_ms = elapsed.as_millis() as u64,
        "build finished"
    );

    Ok(BuildSummary {
        index_dir: index_dir.to_path_buf(),
        meta,
        skipped,
        elapsed,
    })
}
