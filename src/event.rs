//! Proposal and event types for the matching engine.
//!
//! A proposal is the single input the engine acts on.
//! Events are the outcome of each proposal, in the order they happened.

use std::fmt;

/// Proposer index, `0..n`
pub type ProposerId = usize;

/// Responder index, `0..n`
pub type ResponderId = usize;

/// Which half of the market an agent belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Agents that propose
    Proposer,
    /// Agents that hold or reject proposals
    Responder,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Proposer => f.write_str("proposer"),
            Side::Responder => f.write_str("responder"),
        }
    }
}

// ============================================================================
// Input
// ============================================================================

/// A proposer offering itself to the head of its remaining list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Proposal {
    pub proposer: ProposerId,
    pub responder: ResponderId,
}

// ============================================================================
// Output Events
// ============================================================================

/// Outcome of a single proposal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProposalEvent {
    /// Responder was free and holds the proposal
    Accepted(Proposal),
    /// Responder traded up; `displaced` is free again and drops this responder
    Replaced {
        proposal: Proposal,
        displaced: ProposerId,
    },
    /// Responder kept its current partner; proposer drops this responder
    Rejected(Proposal),
}

impl ProposalEvent {
    /// The proposal that produced this event
    #[inline]
    pub const fn proposal(&self) -> Proposal {
        match *self {
            ProposalEvent::Accepted(p) | ProposalEvent::Rejected(p) => p,
            ProposalEvent::Replaced { proposal, .. } => proposal,
        }
    }

    /// True if the proposer ends up holding the responder
    #[inline]
    pub const fn is_held(&self) -> bool {
        !matches!(self, ProposalEvent::Rejected(_))
    }
}

impl fmt::Display for ProposalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalEvent::Accepted(p) => {
                write!(f, "proposer {} -> responder {}: accepted", p.proposer, p.responder)
            }
            ProposalEvent::Replaced { proposal: p, displaced } => write!(
                f,
                "proposer {} -> responder {}: replaced proposer {}",
                p.proposer, p.responder, displaced
            ),
            ProposalEvent::Rejected(p) => {
                write!(f, "proposer {} -> responder {}: rejected", p.proposer, p.responder)
            }
        }
    }
}
