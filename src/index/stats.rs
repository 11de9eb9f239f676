use crate::index::corpus::{CorpusFile, DocumentText, load_batch};
use crate::index::dictionary::TermMap;
use crate::index::reader::IndexReader;
use crate::index::types::{IndexMeta, META_FILE};
use crate::utils::{stem, tokenize};
use anyhow::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Shape of a built index
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub docs: u32,
    pub terms: usize,
    pub postings: u64,
    pub postings_bytes: usize,
    /// Highest document frequency terms, most frequent first
    pub top_terms: Vec<(String, u32)>,
}

impl IndexStats {
    pub fn collect(reader: &IndexReader, top: usize) -> Self {
        let postings: u64 = reader.entries().iter().map(|e| e.doc_freq as u64).sum();

        let mut by_df: Vec<(&str, u32)> = reader
            .entries()
            .iter()
            .map(|e| (e.term.as_str(), e.doc_freq))
            .collect();
        by_df.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        Self {
            docs: reader.doc_count(),
            terms: reader.term_count(),
            postings,
            postings_bytes: reader.postings_bytes(),
            top_terms: by_df
                .into_iter()
                .take(top)
                .map(|(t, df)| (t.to_string(), df))
                .collect(),
        }
    }

    pub fn avg_doc_freq(&self) -> f64 {
        if self.terms == 0 {
            0.0
        } else {
            self.postings as f64 / self.terms as f64
        }
    }

    /// Average encoded bytes per posting
    pub fn bytes_per_posting(&self) -> f64 {
        if self.postings == 0 {
            0.0
        } else {
            self.postings_bytes as f64 / self.postings as f64
        }
    }
}

/// Display index statistics
pub fn show_stats(index_dir: &Path, top: usize) -> Result<()> {
    let reader = IndexReader::open(index_dir)?;
    let stats = IndexStats::collect(&reader, top);

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Index location:     {}", index_dir.display());
    println!("Documents:          {}", stats.docs);
    println!("Terms:              {}", stats.terms);
    println!("Postings:           {}", stats.postings);
    println!("Postings size:      {}", format_size(stats.postings_bytes as u64));
    println!("Avg doc frequency:  {:.2}", stats.avg_doc_freq());
    println!("Bytes per posting:  {:.3}", stats.bytes_per_posting());

    if let Some(meta) = read_meta(index_dir) {
        println!("Created:            {}", format_timestamp(meta.created_at));
    }

    if !stats.top_terms.is_empty() {
        println!();
        println!("Top terms by document frequency:");
        for (term, df) in &stats.top_terms {
            println!("  {:20} {}", term, df);
        }
    }

    Ok(())
}

/// meta.json is informational; a missing or unreadable one is not an error
fn read_meta(index_dir: &Path) -> Option<IndexMeta> {
    let file = File::open(index_dir.join(META_FILE)).ok()?;
    serde_json::from_reader(file).ok()
}

/// Token-level statistics over a corpus
#[derive(Debug)]
pub struct TokenStats {
    pub files: usize,
    pub input_bytes: u64,
    pub total_tokens: u64,
    pub total_token_chars: u64,
    pub elapsed: Duration,
    counts: TermMap<u64>,
}

impl TokenStats {
    /// Tokenize (and optionally stem) every readable file
    pub fn collect(files: &[CorpusFile], apply_stem: bool, chunk_size: usize) -> Self {
        let start = Instant::now();
        let mut stats = Self {
            files: files.len(),
            input_bytes: 0,
            total_tokens: 0,
            total_token_chars: 0,
            elapsed: Duration::ZERO,
            counts: TermMap::new(),
        };

        for batch in files.chunks(chunk_size.max(1)) {
            for text in load_batch(batch, u64::MAX) {
                if let DocumentText::Text(text) = text {
                    stats.add_text(&text, apply_stem);
                }
            }
        }

        stats.elapsed = start.elapsed();
        stats
    }

    fn add_text(&mut self, text: &str, apply_stem: bool) {
        self.input_bytes += text.len() as u64;
        for token in tokenize(text) {
            let token = if apply_stem { stem(&token) } else { token };
            self.total_tokens += 1;
            self.total_token_chars += token.len() as u64;
            *self.counts.get_or_insert(&token, 0) += 1;
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.counts.len()
    }

    pub fn avg_token_len(&self) -> f64 {
        if self.total_tokens == 0 {
            0.0
        } else {
            self.total_token_chars as f64 / self.total_tokens as f64
        }
    }

    pub fn input_kb(&self) -> f64 {
        self.input_bytes as f64 / 1024.0
    }

    pub fn speed_kb_s(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.input_kb() / secs } else { 0.0 }
    }

    /// Term counts, most frequent first (ties by term)
    pub fn sorted_counts(&self) -> Vec<(String, u64)> {
        let mut counts: Vec<(String, u64)> =
            self.counts.iter().map(|(t, &c)| (t.to_string(), c)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Write `term\tcount` rows, most frequent first
    pub fn write_counts_tsv(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for (term, count) in self.sorted_counts() {
            writeln!(out, "{}\t{}", term, count)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Zipf's law fit `f ≈ C / r^s`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZipfFit {
    pub s: f64,
    pub c: f64,
}

/// Least-squares fit of log f = log C - s log r over ranks `start..=end` (1-based).
/// `freqs` must be sorted descending. Falls back to s = 1, C = f1 with fewer than two points.
pub fn fit_zipf(freqs: &[u64], start_rank: usize, end_rank: usize) -> Option<ZipfFit> {
    let first = *freqs.first()? as f64;
    let fallback = ZipfFit { s: 1.0, c: first };

    let start = start_rank.max(1);
    let end = end_rank.min(freqs.len());
    if start >= end {
        return Some(fallback);
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = (start..=end)
        .filter(|&r| freqs[r - 1] > 0)
        .map(|r| ((r as f64).ln(), (freqs[r - 1] as f64).ln()))
        .unzip();

    let n = xs.len() as f64;
    if xs.len() < 2 {
        return Some(fallback);
    }

    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let num: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let den: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    let slope = if den != 0.0 { num / den } else { -1.0 };

    Some(ZipfFit {
        s: -slope,
        c: (my - slope * mx).exp(),
    })
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn format_timestamp(ts: u64) -> String {
    use std::time::UNIX_EPOCH;
    let datetime = UNIX_EPOCH + Duration::from_secs(ts);
    format!("{:?}", datetime)
}
