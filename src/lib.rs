//! Amora Algo - compatibility matching and family-consensus engine
//!
//! This library holds the one algorithm-heavy subsystem of the Amora
//! community platform: weighted compatibility scoring, the discovery queue
//! with exclusion semantics, the like ledger with mutual-match detection,
//! and family vote aggregation into a consensus status.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    aggregate_status, canonical_pair, compatibility_score, tally, DiscoveryCursor, DiscoveryQueue,
    EngineError, LikeLedger, LikeOutcome, MatchRegistry, RefreshSequencer, VoteTally,
};
pub use crate::models::{
    Answer, AnswerMap, ConsensusStatus, FamilyVote, MutualMatch, Question, UserProfile, VoteChoice,
};
