//! Matching Engine - Core deferred-acceptance algorithm.
//!
//! Implements the propose/hold/reject protocol:
//! 1. ACCEPT: a free responder holds the proposal
//! 2. REPLACE: a held responder trades up; the displaced proposer drops it
//! 3. REJECT: the responder keeps its partner; the proposer drops it
//!
//! Unmatched proposers act in ascending id order, one proposal each per
//! pass, until every proposer is held.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, trace};

use crate::error::MatchError;
use crate::event::{Proposal, ProposalEvent, ProposerId};
use crate::preferences::PreferenceStore;
use crate::state::MatchState;

/// Counters for a single run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RunStats {
    /// Total proposal events; at most `n * n`
    pub proposals: u64,
    pub accepted: u64,
    pub replaced: u64,
    pub rejected: u64,
    /// Full scans over the proposers
    pub passes: u64,
}

impl RunStats {
    #[inline]
    fn record(&mut self, event: &ProposalEvent) {
        self.proposals += 1;
        match event {
            ProposalEvent::Accepted(_) => self.accepted += 1,
            ProposalEvent::Replaced { .. } => self.replaced += 1,
            ProposalEvent::Rejected(_) => self.rejected += 1,
        }
    }
}

/// The matching engine core
#[derive(Clone, Debug)]
pub struct MatchingEngine {
    /// Preference lists and rank tables
    pub store: PreferenceStore,
    /// The partial assignment
    pub state: MatchState,
    stats: RunStats,
}

impl MatchingEngine {
    /// Create an engine with every proposer unmatched
    pub fn new(store: PreferenceStore) -> Self {
        let state = MatchState::new(store.len());
        Self {
            store,
            state,
            stats: RunStats::default(),
        }
    }

    /// Process one proposal from unmatched proposer `p`.
    ///
    /// # Algorithm
    /// 1. Look up `p`'s current head `r`
    /// 2. Free `r` accepts
    /// 3. Held `r` replaces its partner if it ranks `p` strictly better
    /// 4. Otherwise `r` rejects and `p` drops it
    ///
    /// # Errors
    /// `AlreadyMatched` if `p` is held, `PreferencesExhausted` if `p` has
    /// been rejected by everyone. Neither mutates the state.
    pub fn process_proposal(&mut self, p: ProposerId) -> Result<ProposalEvent, MatchError> {
        if self.state.is_matched(p) {
            return Err(MatchError::AlreadyMatched { proposer: p });
        }

        let r = self.store.next_choice(p)?;
        let proposal = Proposal { proposer: p, responder: r };

        let event = match self.state.partner_of(r) {
            None => {
                self.state.accept(p, r);
                ProposalEvent::Accepted(proposal)
            }
            Some(current) if self.store.prefers(r, p, current) => {
                let displaced = self.state.replace(p, r);
                // The displaced proposer's head was `r`; it never retries it
                self.store.pop_choice(displaced);
                ProposalEvent::Replaced { proposal, displaced }
            }
            Some(_) => {
                self.store.pop_choice(p);
                ProposalEvent::Rejected(proposal)
            }
        };

        self.stats.record(&event);
        trace!(%event, unmatched = self.state.unmatched_count(), "proposal");
        Ok(event)
    }

    /// Run passes until every proposer is matched.
    pub fn run(&mut self) -> Result<RunStats, MatchError> {
        self.run_with(|_| {})
    }

    /// Run to convergence, handing every event to `on_event` as it happens.
    ///
    /// Each pass scans proposers in ascending id order and lets every
    /// unmatched one propose once. Calling this on a converged engine is a
    /// no-op; use [`reset`](Self::reset) to run again.
    pub fn run_with<F>(&mut self, mut on_event: F) -> Result<RunStats, MatchError>
    where
        F: FnMut(&ProposalEvent),
    {
        let n = self.store.len();
        debug!(n, "starting deferred acceptance");

        while !self.state.is_converged() {
            self.stats.passes += 1;

            for p in 0..n {
                if self.state.is_converged() {
                    break;
                }
                if self.state.is_matched(p) {
                    continue;
                }

                let event = self.process_proposal(p)?;
                on_event(&event);
            }
        }

        debug!(
            n,
            proposals = self.stats.proposals,
            passes = self.stats.passes,
            "converged"
        );
        Ok(self.stats)
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Counters accumulated since construction or the last reset
    #[inline]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    #[inline]
    pub fn is_converged(&self) -> bool {
        self.state.is_converged()
    }

    /// Rewind preferences and state for an identical re-run
    pub fn reset(&mut self) {
        self.store.reset();
        self.state.reset();
        self.stats = RunStats::default();
    }

    /// Compute a hash of the current state (for determinism testing)
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.state.hash(&mut hasher);
        self.store.cursors().hash(&mut hasher);
        self.stats.proposals.hash(&mut hasher);

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(proposers: Vec<Vec<usize>>, responders: Vec<Vec<usize>>) -> MatchingEngine {
        MatchingEngine::new(PreferenceStore::new(proposers, responders).unwrap())
    }

    /// Proposers A, B, C and responders X, Y, Z (0-based)
    fn three_by_three() -> MatchingEngine {
        engine(
            vec![vec![0, 1, 2], vec![1, 0, 2], vec![0, 1, 2]],
            vec![vec![1, 0, 2], vec![0, 1, 2], vec![0, 1, 2]],
        )
    }

    fn accepted(proposer: usize, responder: usize) -> ProposalEvent {
        ProposalEvent::Accepted(Proposal { proposer, responder })
    }

    fn rejected(proposer: usize, responder: usize) -> ProposalEvent {
        ProposalEvent::Rejected(Proposal { proposer, responder })
    }

    #[test]
    fn test_three_by_three_trace() {
        let mut engine = three_by_three();
        let mut events = Vec::new();

        let stats = engine.run_with(|e| events.push(*e)).unwrap();

        // Pass 1: A->X, B->Y held; C->X loses to A
        // Pass 2: C->Y loses to B
        // Pass 3: C->Z held
        assert_eq!(
            events,
            vec![
                accepted(0, 0),
                accepted(1, 1),
                rejected(2, 0),
                rejected(2, 1),
                accepted(2, 2),
            ]
        );
        assert_eq!(stats.passes, 3);
        assert_eq!(stats.proposals, 5);
        assert_eq!(engine.state.partner_of(0), Some(0));
        assert_eq!(engine.state.partner_of(1), Some(1));
        assert_eq!(engine.state.partner_of(2), Some(2));
    }

    #[test]
    fn test_replace_pops_displaced_head() {
        // Both proposers want responder 0, which prefers proposer 1
        let mut engine = engine(vec![vec![0, 1], vec![0, 1]], vec![vec![1, 0], vec![0, 1]]);

        assert_eq!(engine.process_proposal(0), Ok(accepted(0, 0)));
        assert_eq!(
            engine.process_proposal(1),
            Ok(ProposalEvent::Replaced {
                proposal: Proposal { proposer: 1, responder: 0 },
                displaced: 0,
            })
        );

        assert!(!engine.state.is_matched(0));
        assert_eq!(engine.state.unmatched_count(), 1);
        assert_eq!(engine.store.next_choice(0), Ok(1));

        assert_eq!(engine.process_proposal(0), Ok(accepted(0, 1)));
        assert!(engine.is_converged());
    }

    #[test]
    fn test_reject_pops_proposer_head() {
        let mut engine = engine(vec![vec![0, 1], vec![0, 1]], vec![vec![0, 1], vec![0, 1]]);

        engine.process_proposal(0).unwrap();
        assert_eq!(engine.process_proposal(1), Ok(rejected(1, 0)));
        assert_eq!(engine.store.remaining(1), &[1]);
        assert_eq!(engine.state.unmatched_count(), 1);
    }

    #[test]
    fn test_matched_proposer_cannot_propose() {
        let mut engine = three_by_three();
        engine.process_proposal(0).unwrap();

        let before = engine.state_hash();
        assert_eq!(
            engine.process_proposal(0),
            Err(MatchError::AlreadyMatched { proposer: 0 })
        );
        assert_eq!(engine.state_hash(), before);
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        // Proposer 1 lists responder 0 twice and never reaches responder 1
        let store = PreferenceStore::new_unchecked(
            vec![vec![0, 0], vec![0, 0]],
            vec![vec![0, 1], vec![0, 1]],
        );
        let mut engine = MatchingEngine::new(store);

        assert_eq!(
            engine.run(),
            Err(MatchError::PreferencesExhausted { proposer: 1 })
        );
        assert!(!engine.is_converged());
    }

    #[test]
    fn test_reset_reproduces_run() {
        let mut engine = three_by_three();
        let first = engine.run().unwrap();
        let first_hash = engine.state_hash();

        engine.reset();
        assert_eq!(engine.state.unmatched_count(), 3);

        let second = engine.run().unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.state_hash(), first_hash);
    }

    #[test]
    fn test_run_on_converged_engine_is_noop() {
        let mut engine = three_by_three();
        let stats = engine.run().unwrap();
        assert_eq!(engine.run().unwrap(), stats);
    }

    #[test]
    fn test_empty_instance_converges_immediately() {
        let mut engine = engine(vec![], vec![]);
        let stats = engine.run().unwrap();
        assert_eq!(stats, RunStats::default());
    }

    #[test]
    fn test_matched_head_is_partner() {
        let mut engine = three_by_three();
        engine.run().unwrap();

        for r in 0..3 {
            let p = engine.state.partner_of(r).unwrap();
            assert_eq!(engine.store.next_choice(p), Ok(r));
        }
    }

    #[test]
    fn test_stats_counts() {
        let mut engine = engine(vec![vec![0, 1], vec![0, 1]], vec![vec![1, 0], vec![0, 1]]);
        let stats = engine.run().unwrap();

        assert_eq!(
            stats,
            RunStats { proposals: 3, accepted: 2, replaced: 1, rejected: 0, passes: 2 }
        );
    }
}
