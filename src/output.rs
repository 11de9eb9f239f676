//! Output formatting for search hits

use crate::index::catalog::Catalog;
use crate::query::SearchResult;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print a search result to stdout as `hits: N` followed by one
/// `id<TAB>source<TAB>path` line per returned id
pub fn print_hits(result: &SearchResult, catalog: &Catalog, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_hits(&mut stdout, result, catalog)
}

/// Write hits to any color-capable sink
pub fn write_hits<W: WriteColor>(
    out: &mut W,
    result: &SearchResult,
    catalog: &Catalog,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    write!(out, "hits:")?;
    out.reset()?;
    writeln!(out, " {}", result.total)?;

    for &doc_id in &result.doc_ids {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{}", doc_id)?;
        out.reset()?;

        match catalog.get(doc_id) {
            Some(doc) => {
                write!(out, "\t")?;
                out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
                write!(out, "{}", doc.source)?;
                out.reset()?;
                write!(out, "\t")?;
                out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
                write!(out, "{}", doc.path.display())?;
                out.reset()?;
                writeln!(out)?;
            }
            // Catalog shorter than the dictionary implies
            None => writeln!(out, "\t?\t?")?,
        }
    }

    Ok(())
}

/// Print a query error in red on stderr
pub fn print_error(message: &str, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(stderr, "error:")?;
    stderr.reset()?;
    writeln!(stderr, " {}", message)
}
