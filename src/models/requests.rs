use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request for a discovery batch
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiscoveryRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "viewer_id", rename = "viewerId")]
    pub viewer_id: String,
    #[serde(default = "default_limit")]
    pub limit: u16,
    /// Extra ids the client wants suppressed on top of the ledger exclusions
    #[serde(default)]
    #[serde(alias = "excludeUserIds", rename = "excludeUserIds")]
    pub exclude_user_ids: Vec<String>,
}

fn default_limit() -> u16 {
    20
}

/// Request to record a directed like
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LikeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "liker_id", rename = "likerId")]
    pub liker_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "liked_id", rename = "likedId")]
    pub liked_id: String,
}

/// Request for a compatibility score between two users
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompatibilityRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "targetUserId", rename = "targetUserId")]
    pub target_user_id: String,
}

/// Request to store one answer for a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "questionId", rename = "questionId")]
    pub question_id: String,
    #[serde(alias = "choiceIndex", rename = "choiceIndex")]
    pub choice_index: u8,
    /// Defaults to the question's base weight when omitted
    #[serde(default)]
    pub importance: Option<u8>,
}

/// Request to share a candidate into the sharer's family circle
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShareProfileRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "sharer_id", rename = "sharerId")]
    pub sharer_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "candidateId", rename = "candidateId")]
    pub candidate_id: String,
    /// Quorum threshold; falls back to the configured default when omitted
    #[serde(default)]
    #[serde(alias = "requiredVotes", rename = "requiredVotes")]
    pub required_votes: Option<u32>,
}

/// Request to cast (or overwrite) a member's vote on a shared profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CastVoteRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "sharedProfileId", rename = "sharedProfileId")]
    pub shared_profile_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "member_id", rename = "memberId")]
    pub member_id: String,
    pub vote: String,
    #[serde(default)]
    pub comment: Option<String>,
}
