// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Answer, AnswerMap, ConsensusStatus, FamilyMember, FamilyVote, LikeEvent, MemberStatus,
    MutualMatch, Question, RankedCandidate, SharedProfile, UserProfile, VoteChoice,
};
pub use requests::{
    CastVoteRequest, CompatibilityRequest, DiscoveryRequest, LikeRequest, ShareProfileRequest,
    SubmitAnswerRequest,
};
pub use responses::{
    CompatibilityResponse, ConsensusResponse, DiscoveryResponse, ErrorResponse, HealthResponse,
    LikeResponse, MatchEntry, MatchListResponse, SubmitAnswerResponse, TallyView,
};
