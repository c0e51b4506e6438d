//! Report writers for a finished matching.
//!
//! One record per proposer, in proposer id order.

use std::io::Write;

use serde::Serialize;

use crate::engine::Matching;
use crate::error::Error;

/// Separator between proposer and responder in text output
pub const DEFAULT_SEPARATOR: &str = " / ";

/// Output format selectable from the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// `proposer<sep>responder` lines
    #[default]
    Text,
    /// `proposer,responder` with a header row
    Csv,
}

#[derive(Debug, Serialize)]
struct PairRecord<'a> {
    proposer: &'a str,
    responder: &'a str,
}

/// Write `proposer<separator>responder`, one line per proposer.
pub fn write_text<W: Write>(matching: &Matching, mut out: W, separator: &str) -> Result<(), Error> {
    for pair in matching.pairs() {
        writeln!(out, "{}{}{}", pair.proposer_name, separator, pair.responder_name)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a `proposer,responder` CSV with a header row.
pub fn write_csv<W: Write>(matching: &Matching, out: W) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(out);

    for pair in matching.pairs() {
        writer.serialize(PairRecord {
            proposer: pair.proposer_name,
            responder: pair.responder_name,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write in the chosen format.
pub fn write<W: Write>(
    matching: &Matching,
    out: W,
    format: Format,
    separator: &str,
) -> Result<(), Error> {
    match format {
        Format::Text => write_text(matching, out, separator),
        Format::Csv => write_csv(matching, out),
    }
}
