//! # Stable-Match
//!
//! A deterministic deferred-acceptance (Gale-Shapley) stable matching engine.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: One run owns its preferences and state exclusively (no locks)
//! - **Validate First**: Input is rejected before the engine holds any state
//! - **O(1) Steps**: Next choice, rejection and rank lookup are table accesses
//! - **Flat Storage**: Preference and rank tables are contiguous `n * n` blocks
//!
//! ## Architecture
//!
//! ```text
//! [Loader] --> [PreferenceStore] --> [MatchingEngine] --> [Matching] --> [Report]
//!                                          |
//!                                   [ProposalEvents]
//! ```

pub mod error;
pub mod event;
pub mod preferences;
pub mod state;
pub mod matching;
pub mod engine;
pub mod loader;
pub mod report;

// Re-exports for convenience
pub use error::{Error, MatchError, ParseError, ValidationError};
pub use event::{Proposal, ProposalEvent, ProposerId, ResponderId, Side};
pub use preferences::{PreferenceStore, Rank};
pub use state::MatchState;
pub use matching::{MatchingEngine, RunStats};
pub use engine::{Engine, Instance, Matching, Pair};
pub use loader::{load_path, load_reader, load_str};
pub use report::Format;
