//! Loader - line-oriented preference file reader.
//!
//! Layout, one item per line:
//!
//! ```text
//! n
//! <n proposer names>
//! <n proposer preference lines, 1-based responder ids, best first>
//! <n responder names>
//! <n responder preference lines, 1-based proposer ids, best first>
//! ```
//!
//! Names are whole lines, trimmed. Preference lines are split on
//! whitespace. Anything after the last responder line is ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::engine::Instance;
use crate::error::{Error, ParseError};
use crate::preferences::PreferenceStore;

/// Read and validate an instance from a file.
pub fn load_path(path: impl AsRef<Path>) -> Result<Instance, Error> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading preferences");
    let file = File::open(path)?;
    load_reader(BufReader::new(file))
}

/// Read and validate an instance from in-memory text.
pub fn load_str(text: &str) -> Result<Instance, Error> {
    load_reader(text.as_bytes())
}

/// Read and validate an instance from any buffered reader.
///
/// Every line is parsed and every list validated before this returns, so
/// an `Ok` instance is always safe to hand to the engine.
pub fn load_reader<R: BufRead>(reader: R) -> Result<Instance, Error> {
    let mut lines = LineReader::new(reader);

    let (line, raw) = lines.next_line("agent count")?;
    let n = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidCount { line, value: raw.clone() })?;

    let proposers = lines.names(n, "proposer name")?;
    let proposer_prefs = lines.preferences(n, "proposer preferences")?;
    let responders = lines.names(n, "responder name")?;
    let responder_prefs = lines.preferences(n, "responder preferences")?;

    let store = PreferenceStore::new(proposer_prefs, responder_prefs)?;
    let instance = Instance::new(proposers, responders, store)?;

    debug!(n, lines = lines.line, "loaded instance");
    Ok(instance)
}

/// Line source that tracks 1-based line numbers for error reporting.
struct LineReader<R> {
    inner: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self, expected: &'static str) -> Result<(usize, String), Error> {
        self.line += 1;
        match self.inner.next() {
            Some(text) => Ok((self.line, text?)),
            None => Err(ParseError::MissingLine { line: self.line, expected }.into()),
        }
    }

    fn names(&mut self, n: usize, expected: &'static str) -> Result<Vec<String>, Error> {
        (0..n)
            .map(|_| self.next_line(expected).map(|(_, text)| text.trim().to_string()))
            .collect()
    }

    fn preferences(&mut self, n: usize, expected: &'static str) -> Result<Vec<Vec<usize>>, Error> {
        (0..n)
            .map(|_| {
                let (line, text) = self.next_line(expected)?;
                parse_preference_line(line, &text, n).map_err(Error::from)
            })
            .collect()
    }
}

/// Parse one line of 1-based ids into 0-based ids.
///
/// Only shape and range are checked here; duplicates are caught when the
/// store validates the full list.
fn parse_preference_line(line: usize, text: &str, n: usize) -> Result<Vec<usize>, ParseError> {
    let mut ids = Vec::with_capacity(n);

    for token in text.split_whitespace() {
        let value = token
            .parse::<u64>()
            .map_err(|_| ParseError::InvalidToken { line, token: token.to_string() })?;

        if value == 0 || value > n as u64 {
            return Err(ParseError::OutOfRange { line, value, n });
        }
        ids.push(value as usize - 1);
    }

    if ids.len() != n {
        return Err(ParseError::WrongLength {
            line,
            expected: n,
            found: ids.len(),
        });
    }

    Ok(ids)
}
