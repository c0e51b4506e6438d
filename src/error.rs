//! Error types for loading, validating and matching.
//!
//! Malformed input is rejected before the engine holds any state. The only
//! error the engine itself can raise is preference exhaustion, which valid
//! permutation data never reaches.

use thiserror::Error;

use crate::event::Side;

/// A preference list that is not a permutation of the opposite set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The two sides have a different number of agents
    #[error("{proposers} proposer lists but {responders} responder lists")]
    SizeMismatch { proposers: usize, responders: usize },

    /// A list does not rank every member of the opposite side
    #[error("{side} {index}: expected {expected} preferences, found {found}")]
    WrongLength {
        side: Side,
        index: usize,
        expected: usize,
        found: usize,
    },

    /// A list names an id outside the opposite side
    #[error("{side} {index}: id {value} is out of range for {n} agents")]
    OutOfRange {
        side: Side,
        index: usize,
        value: usize,
        n: usize,
    },

    /// A list names the same id twice
    #[error("{side} {index}: id {value} appears more than once")]
    Duplicate { side: Side, index: usize, value: usize },

    /// Name table does not line up with the preference lists
    #[error("{side}: {found} names for {expected} preference lists")]
    NameCount {
        side: Side,
        expected: usize,
        found: usize,
    },
}

/// A line of the input file that could not be read as the expected item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found end of input")]
    MissingLine { line: usize, expected: &'static str },

    #[error("line {line}: agent count {value:?} is not a non-negative integer")]
    InvalidCount { line: usize, value: String },

    #[error("line {line}: preference token {token:?} is not an integer")]
    InvalidToken { line: usize, token: String },

    #[error("line {line}: expected {expected} preferences, found {found}")]
    WrongLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Ids in the file are 1-based
    #[error("line {line}: id {value} is outside 1..={n}")]
    OutOfRange { line: usize, value: u64, n: usize },
}

/// Failure inside a matching run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    /// A proposer was asked for its next choice after being rejected by everyone.
    #[error("proposer {proposer} has no remaining choice")]
    PreferencesExhausted { proposer: usize },

    /// A proposal was made on behalf of a proposer that is already held.
    #[error("proposer {proposer} is already matched")]
    AlreadyMatched { proposer: usize },
}

/// Any error surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read preference data: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid preference data: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("failed to write csv output: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_side_and_index() {
        let err = ValidationError::Duplicate {
            side: Side::Responder,
            index: 2,
            value: 1,
        };
        assert_eq!(err.to_string(), "responder 2: id 1 appears more than once");
    }

    #[test]
    fn test_exhaustion_is_distinct_from_validation() {
        let err: Error = MatchError::PreferencesExhausted { proposer: 4 }.into();
        assert!(matches!(err, Error::Match(MatchError::PreferencesExhausted { proposer: 4 })));
        assert_eq!(err.to_string(), "proposer 4 has no remaining choice");
    }

    #[test]
    fn test_io_error_wraps() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(err.to_string().starts_with("failed to read preference data"));
    }
}
