use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A questionnaire question with an ordered list of choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "questionId")]
    pub id: String,
    pub text: String,
    pub choices: Vec<String>,
    /// Importance class; also the default per-user importance when a
    /// submission omits one
    #[serde(rename = "baseWeight", default = "default_base_weight")]
    pub base_weight: u8,
    #[serde(default)]
    pub required: bool,
}

fn default_base_weight() -> u8 { 2 }

/// A user's answer to one question: chosen choice index plus how much the
/// question matters to them (1-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "choiceIndex")]
    pub choice: u8,
    pub importance: u8,
}

/// All of one user's answers, keyed by question id. Unique per question.
pub type AnswerMap = HashMap<String, Answer>;

/// Minimal profile view needed by discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "activatedAt", default)]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub about: Option<String>,
}

fn default_true() -> bool { true }

/// Directed like edge. At most one per ordered pair; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeEvent {
    pub liker_id: String,
    pub liked_id: String,
    pub liked_at: DateTime<Utc>,
}

/// Confirmed mutual match for the unordered pair {user_lo, user_hi},
/// stored under the canonical ordering user_lo < user_hi
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutualMatch {
    pub user_lo: String,
    pub user_hi: String,
    pub created_at: DateTime<Utc>,
}

impl MutualMatch {
    /// The other side of the pair, from `user_id`'s point of view
    pub fn partner_of(&self, user_id: &str) -> &str {
        if self.user_lo == user_id {
            &self.user_hi
        } else {
            &self.user_lo
        }
    }
}

/// Consensus status of a shared profile. Approved and declined are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusStatus {
    Pending,
    Discussing,
    Approved,
    Declined,
}

impl ConsensusStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsensusStatus::Approved | ConsensusStatus::Declined)
    }
}

/// A family member's verdict on a shared candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Approve,
    Decline,
    Discuss,
}

/// Membership status in a sharer's family circle. Only active members vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Invited,
    Active,
}

/// Relation between a sharer and an invited/active family member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    #[serde(rename = "sharerId")]
    pub sharer_id: String,
    #[serde(rename = "memberId")]
    pub member_id: String,
    pub status: MemberStatus,
}

/// A candidate profile shared into the family circle for group review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedProfile {
    pub id: Uuid,
    pub candidate_id: String,
    pub sharer_id: String,
    /// Quorum threshold fixed at share time; independent of member count
    pub required_votes: u32,
    pub status: ConsensusStatus,
    /// Informational only; never feeds the status computation
    pub view_count: i64,
    pub shared_at: DateTime<Utc>,
}

/// One member's vote on a shared profile. Unique per member; resubmission
/// overwrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyVote {
    pub shared_profile_id: Uuid,
    pub member_id: String,
    pub vote: VoteChoice,
    pub comment: Option<String>,
    pub voted_at: DateTime<Utc>,
}

/// Discovery result entry: candidate plus display annotations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Viewer<->candidate compatibility, 0-100. Display only; eligibility
    /// and ordering never depend on it.
    pub compatibility: u8,
    pub about: Option<String>,
}
