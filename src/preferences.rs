//! Preference Store - flat, pre-allocated preference and rank tables.
//!
//! All tables are allocated once at construction as contiguous row-major
//! `n * n` blocks. Proposer lists are never mutated: rejection advances a
//! per-proposer cursor, so the remaining list is always a suffix of the
//! full list and the store can be rewound for a re-run.

use crate::error::{MatchError, ValidationError};
use crate::event::{ProposerId, ResponderId, Side};

/// 1-based preference rank, lower is better
pub type Rank = u32;

/// Proposer preference lists plus responder rank tables.
#[derive(Clone, Debug)]
pub struct PreferenceStore {
    /// Number of agents on each side
    n: usize,
    /// Row `p` is proposer `p`'s full list, most preferred first
    choices: Vec<ResponderId>,
    /// `[p * n + r]` = rank of responder `r` in proposer `p`'s list
    choice_ranks: Vec<Rank>,
    /// `[r * n + p]` = rank of proposer `p` in responder `r`'s list
    responder_ranks: Vec<Rank>,
    /// Index of each proposer's current head within its row
    cursors: Vec<usize>,
}

impl PreferenceStore {
    /// Build a store from 0-based preference lists, most preferred first.
    ///
    /// Every list must be a permutation of `0..n`, where `n` is the number of
    /// lists on each side. Nothing is allocated until validation passes.
    pub fn new(
        proposer_prefs: Vec<Vec<ResponderId>>,
        responder_prefs: Vec<Vec<ProposerId>>,
    ) -> Result<Self, ValidationError> {
        if proposer_prefs.len() != responder_prefs.len() {
            return Err(ValidationError::SizeMismatch {
                proposers: proposer_prefs.len(),
                responders: responder_prefs.len(),
            });
        }

        let n = proposer_prefs.len();
        validate_lists(Side::Proposer, &proposer_prefs, n)?;
        validate_lists(Side::Responder, &responder_prefs, n)?;

        Ok(Self::build(n, &proposer_prefs, &responder_prefs))
    }

    /// Build without validation. Duplicate ids make exhaustion reachable.
    #[cfg(test)]
    pub(crate) fn new_unchecked(
        proposer_prefs: Vec<Vec<ResponderId>>,
        responder_prefs: Vec<Vec<ProposerId>>,
    ) -> Self {
        let n = proposer_prefs.len();
        Self::build(n, &proposer_prefs, &responder_prefs)
    }

    fn build(
        n: usize,
        proposer_prefs: &[Vec<ResponderId>],
        responder_prefs: &[Vec<ProposerId>],
    ) -> Self {
        let mut choices = Vec::with_capacity(n * n);
        let mut choice_ranks = vec![0; n * n];
        let mut responder_ranks = vec![0; n * n];

        for (p, list) in proposer_prefs.iter().enumerate() {
            choices.extend_from_slice(list);
            for (pos, &r) in list.iter().enumerate() {
                choice_ranks[p * n + r] = pos as Rank + 1;
            }
        }

        // Responder lists are only ever consulted by rank, so store them inverted
        for (r, list) in responder_prefs.iter().enumerate() {
            for (pos, &p) in list.iter().enumerate() {
                responder_ranks[r * n + p] = pos as Rank + 1;
            }
        }

        Self {
            n,
            choices,
            choice_ranks,
            responder_ranks,
            cursors: vec![0; n],
        }
    }

    // ========================================================================
    // Proposer Side
    // ========================================================================

    /// The responder proposer `p` currently wants.
    ///
    /// # Errors
    /// `PreferencesExhausted` if every choice has already been popped.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn next_choice(&self, p: ProposerId) -> Result<ResponderId, MatchError> {
        self.remaining(p)
            .first()
            .copied()
            .ok_or(MatchError::PreferencesExhausted { proposer: p })
    }

    /// Discard proposer `p`'s current head after a rejection.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub(crate) fn pop_choice(&mut self, p: ProposerId) {
        let cursor = &mut self.cursors[p];
        debug_assert!(*cursor < self.n, "pop on exhausted proposer {}", p);
        *cursor = (*cursor + 1).min(self.n);
    }

    /// Choices proposer `p` has not yet been rejected by, best first.
    #[inline]
    pub fn remaining(&self, p: ProposerId) -> &[ResponderId] {
        &self.preferences(p)[self.cursors[p]..]
    }

    /// Proposer `p`'s full original list, best first.
    #[inline]
    pub fn preferences(&self, p: ProposerId) -> &[ResponderId] {
        &self.choices[p * self.n..(p + 1) * self.n]
    }

    /// Rank of responder `r` in proposer `p`'s full list.
    #[inline]
    pub fn proposer_rank(&self, p: ProposerId, r: ResponderId) -> Rank {
        self.choice_ranks[p * self.n + r]
    }

    // ========================================================================
    // Responder Side
    // ========================================================================

    /// Rank of proposer `p` in responder `r`'s list.
    ///
    /// # Complexity
    /// O(1) - direct table lookup
    #[inline]
    pub fn rank(&self, r: ResponderId, p: ProposerId) -> Rank {
        self.responder_ranks[r * self.n + p]
    }

    /// True if responder `r` strictly prefers `challenger` over `incumbent`.
    #[inline]
    pub fn prefers(&self, r: ResponderId, challenger: ProposerId, incumbent: ProposerId) -> bool {
        self.rank(r, challenger) < self.rank(r, incumbent)
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Number of agents on each side.
    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Rewind every proposer to the head of its full list.
    pub(crate) fn reset(&mut self) {
        self.cursors.fill(0);
    }

    /// Current cursor positions, one per proposer.
    #[inline]
    pub fn cursors(&self) -> &[usize] {
        &self.cursors
    }
}

/// Check that every list on `side` is a permutation of `0..n`.
fn validate_lists(side: Side, lists: &[Vec<usize>], n: usize) -> Result<(), ValidationError> {
    let mut seen = vec![false; n];

    for (index, list) in lists.iter().enumerate() {
        if list.len() != n {
            return Err(ValidationError::WrongLength {
                side,
                index,
                expected: n,
                found: list.len(),
            });
        }

        seen.fill(false);
        for &value in list {
            if value >= n {
                return Err(ValidationError::OutOfRange { side, index, value, n });
            }
            if std::mem::replace(&mut seen[value], true) {
                return Err(ValidationError::Duplicate { side, index, value });
            }
        }
    }

    Ok(())
}
