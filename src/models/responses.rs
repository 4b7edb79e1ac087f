use crate::models::domain::{ConsensusStatus, RankedCandidate};
use serde::{Deserialize, Serialize};

/// Response for the discovery batch endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub candidates: Vec<RankedCandidate>,
    /// True when the pool is empty after exclusion; an ordinary result, not
    /// an error
    pub exhausted: bool,
}

/// Response for the like endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    /// False when the edge already existed (repeat call, no-op)
    pub recorded: bool,
    /// True when this call confirmed a mutual match
    pub matched: bool,
    #[serde(rename = "partnerId")]
    pub partner_id: Option<String>,
}

/// One entry in a user's match list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEntry {
    #[serde(rename = "partnerId")]
    pub partner_id: String,
    #[serde(rename = "matchedAt")]
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

/// Response for the match list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchListResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub matches: Vec<MatchEntry>,
}

/// Response for the compatibility endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityResponse {
    pub score: u8,
    #[serde(rename = "sharedQuestions")]
    pub shared_questions: usize,
}

/// Response for the answer submission endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub success: bool,
}

/// Vote counts over distinct voters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyView {
    pub approve: u32,
    pub decline: u32,
    pub discuss: u32,
}

/// Response for family share / vote / detail endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResponse {
    pub id: String,
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    pub status: ConsensusStatus,
    pub tally: TallyView,
    #[serde(rename = "requiredVotes")]
    pub required_votes: u32,
    #[serde(rename = "viewCount")]
    pub view_count: i64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
