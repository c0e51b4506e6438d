//! Match State - the partial assignment the engine mutates.
//!
//! Invariants held after every transition:
//! - `matched[p]` iff some responder is assigned to `p`
//! - no proposer is assigned to more than one responder
//! - `unmatched_count` equals the number of `false` entries in `matched`

use crate::event::{ProposerId, ResponderId};

/// Current partial matching between proposers and responders.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatchState {
    /// Responder -> the proposer it currently holds
    assignment: Vec<Option<ProposerId>>,
    /// Proposer -> whether some responder holds it
    matched: Vec<bool>,
    /// Proposers still without a responder
    unmatched_count: usize,
}

impl MatchState {
    /// Create an all-unmatched state for `n` agents per side
    pub fn new(n: usize) -> Self {
        Self {
            assignment: vec![None; n],
            matched: vec![false; n],
            unmatched_count: n,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The proposer responder `r` currently holds, if any
    #[inline]
    pub fn partner_of(&self, r: ResponderId) -> Option<ProposerId> {
        self.assignment[r]
    }

    #[inline]
    pub fn is_matched(&self, p: ProposerId) -> bool {
        self.matched[p]
    }

    #[inline]
    pub fn unmatched_count(&self) -> usize {
        self.unmatched_count
    }

    /// True once every proposer holds a responder
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.unmatched_count == 0
    }

    /// Number of agents on each side
    #[inline]
    pub fn len(&self) -> usize {
        self.matched.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Responder-indexed assignment table
    #[inline]
    pub fn assignment(&self) -> &[Option<ProposerId>] {
        &self.assignment
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Free responder `r` takes proposer `p`.
    #[inline]
    pub(crate) fn accept(&mut self, p: ProposerId, r: ResponderId) {
        debug_assert!(self.assignment[r].is_none(), "responder {} already held", r);
        debug_assert!(!self.matched[p], "proposer {} already matched", p);

        self.assignment[r] = Some(p);
        self.matched[p] = true;
        self.unmatched_count -= 1;
    }

    /// Responder `r` drops its partner for `p`. Returns the displaced proposer.
    ///
    /// The unmatched count is unchanged: one proposer in, one out.
    #[inline]
    pub(crate) fn replace(&mut self, p: ProposerId, r: ResponderId) -> ProposerId {
        debug_assert!(!self.matched[p], "proposer {} already matched", p);

        let displaced = self.assignment[r].replace(p);
        debug_assert!(displaced.is_some(), "replace on free responder {}", r);
        let displaced = displaced.unwrap_or(p);

        self.matched[displaced] = false;
        self.matched[p] = true;
        displaced
    }

    /// Back to all-unmatched
    pub(crate) fn reset(&mut self) {
        self.assignment.fill(None);
        self.matched.fill(false);
        self.unmatched_count = self.matched.len();
    }
}
