use anyhow::{Context, Result};
use boolsearch::index::build::build_index_with_progress;
use boolsearch::index::corpus::discover;
use boolsearch::index::stats::{TokenStats, fit_zipf, show_stats};
use boolsearch::index::{
    CATALOG_FILE, DICTIONARY_FILE, IndexConfig, IndexReader, META_FILE, POSTINGS_FILE,
};
use boolsearch::output;
use boolsearch::query::QueryExecutor;
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boolsearch")]
#[command(about = "Boolean retrieval over plain-text corpora")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a corpus directory
    Index {
        /// Corpus root holding one subdirectory per source tag
        #[arg(long)]
        input_dir: PathBuf,

        /// Directory to write the index artifacts into
        #[arg(long)]
        out_dir: PathBuf,

        /// JSON config file (sources, extension, max_file_size, chunk_size)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Hide progress bars
        #[arg(short, long)]
        quiet: bool,
    },
    /// Run boolean queries against an index
    Search {
        /// Index directory
        #[arg(long)]
        index_dir: PathBuf,

        /// Query to run; reads queries from stdin when omitted
        #[arg(long)]
        query: Option<String>,

        /// Number of hits to print
        #[arg(long, default_value_t = 10)]
        topk: usize,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show index statistics
    Stats {
        /// Index directory
        #[arg(long)]
        index_dir: PathBuf,

        /// Number of most frequent terms to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Check index artifacts for consistency
    Verify {
        /// Index directory
        #[arg(long)]
        index_dir: PathBuf,
    },
    /// Token statistics for a corpus (no index is built)
    Tokens {
        /// Corpus root holding one subdirectory per source tag
        #[arg(long)]
        input_dir: PathBuf,

        /// Count stemmed tokens instead of raw ones
        #[arg(long)]
        stem: bool,

        /// Write `term\tcount` rows, most frequent first
        #[arg(long)]
        counts_tsv: Option<PathBuf>,

        /// Fit Zipf's law to the rank/frequency curve
        #[arg(long)]
        zipf: bool,

        /// First rank (1-based) used by the Zipf fit
        #[arg(long, default_value_t = 50)]
        fit_start: usize,

        /// Last rank used by the Zipf fit
        #[arg(long, default_value_t = 50000)]
        fit_end: usize,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Index {
            input_dir,
            out_dir,
            config,
            quiet,
        } => {
            let config = load_config(config.as_deref())?;
            run_index(&input_dir, &out_dir, &config, quiet)?;
        }
        Commands::Search {
            index_dir,
            query,
            topk,
            no_color,
        } => {
            let reader = IndexReader::open(&index_dir)?;
            let color = !no_color;
            match query {
                Some(query) => {
                    if !run_query(&reader, &query, topk, color)? {
                        std::process::exit(BAD_QUERY_EXIT);
                    }
                }
                None => run_interactive(&reader, topk, color)?,
            }
        }
        Commands::Stats { index_dir, top } => {
            show_stats(&index_dir, top)?;
        }
        Commands::Verify { index_dir } => {
            let reader = IndexReader::open(&index_dir)?;
            let report = reader
                .verify()
                .with_context(|| format!("Index at {} is inconsistent", index_dir.display()))?;
            println!("ok");
            println!("docs: {}", reader.doc_count());
            println!("terms: {}", report.terms);
            println!("postings: {}", report.postings);
            println!("postings_bytes: {}", report.postings_bytes);
        }
        Commands::Tokens {
            input_dir,
            stem,
            counts_tsv,
            zipf,
            fit_start,
            fit_end,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let zipf_range = zipf.then_some((fit_start, fit_end));
            run_tokens(&input_dir, &config, stem, counts_tsv.as_deref(), zipf_range)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<IndexConfig> {
    match path {
        Some(path) => IndexConfig::load(path),
        None => Ok(IndexConfig::default()),
    }
}

fn run_index(input_dir: &Path, out_dir: &Path, config: &IndexConfig, quiet: bool) -> Result<()> {
    let summary = build_index_with_progress(input_dir, out_dir, config, quiet)?;

    println!("docs: {}", summary.meta.doc_count);
    println!("terms: {}", summary.meta.term_count);
    if summary.skipped > 0 {
        println!("skipped: {}", summary.skipped);
    }
    println!("index_dir: {}", summary.index_dir.display());
    println!("time_s: {:.3}", summary.elapsed.as_secs_f64());
    println!("files:");
    for name in [CATALOG_FILE, DICTIONARY_FILE, POSTINGS_FILE, META_FILE] {
        println!("  {}", summary.index_dir.join(name).display());
    }
    Ok(())
}

/// Exit status of a one-shot search whose query could not be evaluated
const BAD_QUERY_EXIT: i32 = 3;

/// Run one query and print its hits. A malformed query is reported on
/// stderr and yields `false`.
fn run_query(reader: &IndexReader, query: &str, top_k: usize, color: bool) -> Result<bool> {
    match QueryExecutor::new(reader).search(query, top_k) {
        Ok(result) => {
            output::print_hits(&result, reader.catalog(), color)?;
            Ok(true)
        }
        Err(e) => {
            output::print_error(&e.to_string(), color)?;
            Ok(false)
        }
    }
}

fn run_interactive(reader: &IndexReader, top_k: usize, color: bool) -> Result<()> {
    let stdin = io::stdin();
    let prompt = stdin.is_terminal();
    let mut lines = stdin.lock().lines();

    loop {
        if prompt {
            print!("query> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else { break };
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            break;
        }
        // A bad query only ends that query, not the session
        run_query(reader, query, top_k, color)?;
    }
    Ok(())
}

fn run_tokens(
    input_dir: &Path,
    config: &IndexConfig,
    stem: bool,
    counts_tsv: Option<&Path>,
    zipf_range: Option<(usize, usize)>,
) -> Result<()> {
    let files = discover(input_dir, config);
    let stats = TokenStats::collect(&files, stem, config.chunk_size);

    println!("files: {}", stats.files);
    println!("input_kb: {:.2}", stats.input_kb());
    println!("total_tokens: {}", stats.total_tokens);
    println!("avg_token_len: {:.3}", stats.avg_token_len());
    println!("vocab_size: {}", stats.vocab_size());
    println!("time_s: {:.3}", stats.elapsed.as_secs_f64());
    println!("speed_kb_s: {:.2}", stats.speed_kb_s());

    if let Some(path) = counts_tsv {
        stats
            .write_counts_tsv(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("counts_tsv: {}", path.display());
    }

    if let Some((start, end)) = zipf_range {
        let freqs: Vec<u64> = stats.sorted_counts().into_iter().map(|(_, c)| c).collect();
        match fit_zipf(&freqs, start, end) {
            Some(fit) => {
                println!("zipf_s: {:.4}", fit.s);
                println!("zipf_c: {:.2}", fit.c);
            }
            None => println!("zipf: no tokens"),
        }
    }
    Ok(())
}
