//! Engine - named instance in, final matching out.
//!
//! Wraps the matching engine with the name tables the loader produced and
//! extracts the result once the run converges.

use crate::error::{MatchError, ValidationError};
use crate::event::{ProposalEvent, ProposerId, ResponderId, Side};
use crate::matching::{MatchingEngine, RunStats};
use crate::preferences::PreferenceStore;

/// Validated input: names for both sides plus their preferences.
///
/// Only built through [`Instance::new`], so both name tables always hold
/// exactly `len()` entries.
#[derive(Clone, Debug)]
pub struct Instance {
    /// Proposer names, indexed by proposer id
    proposers: Vec<String>,
    /// Responder names, indexed by responder id
    responders: Vec<String>,
    store: PreferenceStore,
}

impl Instance {
    /// Pair name tables with a store, checking the counts line up.
    pub fn new(
        proposers: Vec<String>,
        responders: Vec<String>,
        store: PreferenceStore,
    ) -> Result<Self, ValidationError> {
        for (side, names) in [(Side::Proposer, &proposers), (Side::Responder, &responders)] {
            if names.len() != store.len() {
                return Err(ValidationError::NameCount {
                    side,
                    expected: store.len(),
                    found: names.len(),
                });
            }
        }

        Ok(Self {
            proposers,
            responders,
            store,
        })
    }

    /// Number of agents on each side
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[inline]
    pub fn proposers(&self) -> &[String] {
        &self.proposers
    }

    #[inline]
    pub fn responders(&self) -> &[String] {
        &self.responders
    }

    #[inline]
    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }
}

/// The main engine: owns one instance and runs it to a stable matching.
pub struct Engine {
    /// The underlying matching engine
    pub matcher: MatchingEngine,
    proposers: Vec<String>,
    responders: Vec<String>,
}

impl Engine {
    pub fn new(instance: Instance) -> Self {
        Self {
            matcher: MatchingEngine::new(instance.store),
            proposers: instance.proposers,
            responders: instance.responders,
        }
    }

    /// Run to convergence and extract the matching.
    pub fn run(&mut self) -> Result<Matching, MatchError> {
        self.run_with(|_| {})
    }

    /// Run to convergence, reporting every proposal event.
    ///
    /// A converged engine returns the same matching again without
    /// re-proposing.
    pub fn run_with<F>(&mut self, on_event: F) -> Result<Matching, MatchError>
    where
        F: FnMut(&ProposalEvent),
    {
        self.matcher.run_with(on_event)?;
        Ok(self.extract())
    }

    /// Invert the responder-indexed assignment into proposer order.
    fn extract(&self) -> Matching {
        let state = &self.matcher.state;
        let mut responder_of = vec![0; state.len()];

        for (r, holder) in state.assignment().iter().enumerate() {
            if let Some(p) = *holder {
                // A held proposer's head is the responder holding it
                debug_assert_eq!(self.matcher.store.next_choice(p), Ok(r));
                responder_of[p] = r;
            }
        }

        Matching {
            responder_of,
            proposers: self.proposers.clone(),
            responders: self.responders.clone(),
        }
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Counters for the current run
    #[inline]
    pub fn stats(&self) -> RunStats {
        self.matcher.stats()
    }

    /// The preference data this engine runs on
    #[inline]
    pub fn store(&self) -> &PreferenceStore {
        &self.matcher.store
    }

    /// Rewind for an identical re-run
    pub fn reset(&mut self) {
        self.matcher.reset();
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.matcher.state_hash()
    }
}

/// One line of the final assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pair<'a> {
    pub proposer: ProposerId,
    pub responder: ResponderId,
    pub proposer_name: &'a str,
    pub responder_name: &'a str,
}

/// A perfect matching, stored in proposer order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matching {
    responder_of: Vec<ResponderId>,
    proposers: Vec<String>,
    responders: Vec<String>,
}

impl Matching {
    /// Pairs in ascending proposer id order
    pub fn pairs(&self) -> impl Iterator<Item = Pair<'_>> + '_ {
        self.responder_of.iter().enumerate().map(move |(p, &r)| Pair {
            proposer: p,
            responder: r,
            proposer_name: &self.proposers[p],
            responder_name: &self.responders[r],
        })
    }

    #[inline]
    pub fn responder_of(&self, p: ProposerId) -> ResponderId {
        self.responder_of[p]
    }

    pub fn proposer_of(&self, r: ResponderId) -> Option<ProposerId> {
        self.responder_of.iter().position(|&x| x == r)
    }

    /// Responder ids in proposer order
    #[inline]
    pub fn as_slice(&self) -> &[ResponderId] {
        &self.responder_of
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.responder_of.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.responder_of.is_empty()
    }

    /// First pair `(p, r)` that would both rather be together than with
    /// their assigned partners, scanning proposers in id order.
    ///
    /// # Complexity
    /// O(n^2)
    pub fn blocking_pair(&self, store: &PreferenceStore) -> Option<(ProposerId, ResponderId)> {
        let mut proposer_of = vec![0; self.len()];
        for (p, &r) in self.responder_of.iter().enumerate() {
            proposer_of[r] = p;
        }

        for (p, &own) in self.responder_of.iter().enumerate() {
            // Only responders p ranks above its own partner can block
            for &r in store.preferences(p) {
                if r == own {
                    break;
                }
                if store.prefers(r, p, proposer_of[r]) {
                    return Some((p, r));
                }
            }
        }

        None
    }

    #[inline]
    pub fn is_stable(&self, store: &PreferenceStore) -> bool {
        self.blocking_pair(store).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn instance() -> Instance {
        let store = PreferenceStore::new(
            vec![vec![0, 1, 2], vec![1, 0, 2], vec![0, 1, 2]],
            vec![vec![1, 0, 2], vec![0, 1, 2], vec![0, 1, 2]],
        )
        .unwrap();
        Instance::new(names(&["A", "B", "C"]), names(&["X", "Y", "Z"]), store).unwrap()
    }

    #[test]
    fn test_engine_run() {
        let mut engine = Engine::new(instance());
        let matching = engine.run().unwrap();

        let pairs: Vec<_> = matching
            .pairs()
            .map(|p| (p.proposer_name, p.responder_name))
            .collect();
        assert_eq!(pairs, vec![("A", "X"), ("B", "Y"), ("C", "Z")]);
        assert!(matching.is_stable(engine.store()));
    }

    #[test]
    fn test_name_count_checked() {
        let store = PreferenceStore::new(vec![vec![0]], vec![vec![0]]).unwrap();
        let err = Instance::new(names(&["A"]), names(&[]), store).unwrap_err();

        assert_eq!(
            err,
            ValidationError::NameCount { side: Side::Responder, expected: 1, found: 0 }
        );
    }

    #[test]
    fn test_name_tables_track_store_size() {
        let inst = instance();
        assert_eq!(inst.proposers().len(), inst.len());
        assert_eq!(inst.responders().len(), inst.len());
        assert_eq!(inst.store().len(), inst.len());

        // One name short on the proposer side never builds an instance
        let store = inst.store().clone();
        let err = Instance::new(names(&["A", "B"]), names(&["X", "Y", "Z"]), store).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NameCount { side: Side::Proposer, expected: 3, found: 2 }
        );
    }

    #[test]
    fn test_rerun_returns_same_matching() {
        let mut engine = Engine::new(instance());
        let first = engine.run().unwrap();
        let proposals = engine.stats().proposals;

        assert_eq!(engine.run().unwrap(), first);
        assert_eq!(engine.stats().proposals, proposals);

        engine.reset();
        assert_eq!(engine.run().unwrap(), first);
    }

    #[test]
    fn test_proposer_of_inverts_responder_of() {
        let matching = Engine::new(instance()).run().unwrap();
        for p in 0..matching.len() {
            assert_eq!(matching.proposer_of(matching.responder_of(p)), Some(p));
        }
    }

    #[test]
    fn test_blocking_pair_detected() {
        let inst = instance();
        // A-Z, B-Y, C-X: A would rather have X, and X ranks A above C
        let matching = Matching {
            responder_of: vec![2, 1, 0],
            proposers: inst.proposers().to_vec(),
            responders: inst.responders().to_vec(),
        };

        assert_eq!(matching.blocking_pair(inst.store()), Some((0, 0)));
        assert!(!matching.is_stable(inst.store()));
    }

    #[test]
    fn test_other_stable_matching_has_no_blocking_pair() {
        let inst = instance();
        // A-Y, B-X, C-Z: every proposer that envies is ranked lower by the envied
        let matching = Matching {
            responder_of: vec![1, 0, 2],
            proposers: inst.proposers().to_vec(),
            responders: inst.responders().to_vec(),
        };

        assert_eq!(matching.blocking_pair(inst.store()), None);
    }

    #[test]
    fn test_empty_matching() {
        let store = PreferenceStore::new(vec![], vec![]).unwrap();
        let inst = Instance::new(vec![], vec![], store).unwrap();
        let matching = Engine::new(inst).run().unwrap();
        assert!(matching.is_empty());
        assert_eq!(matching.pairs().count(), 0);
    }
}
