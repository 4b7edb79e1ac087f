// Core engine exports
pub mod consensus;
pub mod discovery;
pub mod ledger;
pub mod scoring;

use thiserror::Error;

/// Errors produced by the pure engine. Everything here is a caller mistake
/// surfaced synchronously; transient store failures live in the service
/// layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub use consensus::{aggregate_status, tally, VoteTally};
pub use discovery::{DiscoveryCursor, DiscoveryQueue, RefreshSequencer};
pub use ledger::{canonical_pair, LikeLedger, LikeOutcome, MatchRegistry};
pub use scoring::{compatibility_score, shared_question_count, validate_answer, validate_sheet};
