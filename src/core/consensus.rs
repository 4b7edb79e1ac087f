use crate::models::{ConsensusStatus, FamilyVote, VoteChoice};
use std::collections::HashMap;

/// Vote counts over distinct voters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub approve: u32,
    pub decline: u32,
    pub discuss: u32,
}

impl VoteTally {
    pub fn distinct_voters(&self) -> u32 {
        self.approve + self.decline + self.discuss
    }
}

/// Count each distinct voter's current vote
///
/// Votes are stored one row per member (resubmission overwrites), but the
/// tally still dedupes by member and keeps the newest vote, so a caller
/// passing raw history gets the same answer as one passing upserted rows.
pub fn tally(votes: &[FamilyVote]) -> VoteTally {
    let mut current: HashMap<&str, &FamilyVote> = HashMap::with_capacity(votes.len());
    for vote in votes {
        match current.get(vote.member_id.as_str()) {
            Some(existing) if existing.voted_at >= vote.voted_at => {}
            _ => {
                current.insert(vote.member_id.as_str(), vote);
            }
        }
    }

    let mut counts = VoteTally::default();
    for vote in current.values() {
        match vote.vote {
            VoteChoice::Approve => counts.approve += 1,
            VoteChoice::Decline => counts.decline += 1,
            VoteChoice::Discuss => counts.discuss += 1,
        }
    }
    counts
}

/// Recompute a shared profile's status from the full vote set
///
/// Terminal statuses are sticky: once approved or declined, later votes are
/// recorded but the status never moves. Otherwise: no votes is pending, an
/// approve quorum wins, a decline quorum (the symmetric rule) loses, and
/// anything else is discussing. Approve is checked first, so a recomputation
/// that finds both quorums met resolves to approved.
pub fn aggregate_status(
    current: ConsensusStatus,
    votes: &[FamilyVote],
    required_votes: u32,
) -> ConsensusStatus {
    if current.is_terminal() {
        return current;
    }

    let counts = tally(votes);
    if counts.distinct_voters() == 0 {
        return ConsensusStatus::Pending;
    }

    if counts.approve >= required_votes {
        ConsensusStatus::Approved
    } else if counts.decline >= required_votes {
        ConsensusStatus::Declined
    } else {
        ConsensusStatus::Discussing
    }
}
