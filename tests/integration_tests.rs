// Integration tests for Amora Algo
//
// Exercises the engine components together the way the request handlers do:
// discovery feeding likes, likes feeding the match registry, and family
// votes driving a shared profile through its whole lifecycle.

use amora_algo::core::{
    aggregate_status, compatibility_score, tally, DiscoveryCursor, DiscoveryQueue, LikeLedger,
    LikeOutcome, MatchRegistry, RefreshSequencer,
};
use amora_algo::models::{
    Answer, AnswerMap, ConsensusStatus, FamilyVote, SharedProfile, UserProfile, VoteChoice,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

fn profile(id: &str, activated_mins_ago: i64) -> UserProfile {
    UserProfile {
        user_id: id.to_string(),
        display_name: format!("User {}", id),
        is_active: true,
        activated_at: Some(Utc::now() - Duration::minutes(activated_mins_ago)),
        about: None,
    }
}

fn sheet(entries: &[(&str, u8, u8)]) -> AnswerMap {
    entries
        .iter()
        .map(|(id, choice, importance)| {
            (
                id.to_string(),
                Answer {
                    choice: *choice,
                    importance: *importance,
                },
            )
        })
        .collect()
}

fn shared_profile(required_votes: u32) -> SharedProfile {
    SharedProfile {
        id: Uuid::new_v4(),
        candidate_id: "candidate".to_string(),
        sharer_id: "sharer".to_string(),
        required_votes,
        status: ConsensusStatus::Pending,
        view_count: 0,
        shared_at: Utc::now(),
    }
}

fn cast(
    profile: &mut SharedProfile,
    votes: &mut Vec<FamilyVote>,
    member: &str,
    choice: VoteChoice,
) {
    // Upsert semantics: one row per member, resubmission overwrites
    votes.retain(|v| v.member_id != member);
    votes.push(FamilyVote {
        shared_profile_id: profile.id,
        member_id: member.to_string(),
        vote: choice,
        comment: None,
        voted_at: Utc::now(),
    });
    profile.status = aggregate_status(profile.status, votes, profile.required_votes);
}

#[test]
fn test_discovery_to_mutual_match_flow() {
    let queue = DiscoveryQueue::new(100);
    let mut ledger = LikeLedger::new();
    let mut registry = MatchRegistry::new();

    let pool = vec![
        profile("u1", 10),
        profile("u2", 20),
        profile("u3", 30),
        profile("viewer", 40),
    ];

    // Viewer pages through a batch and likes the first candidate
    let batch = queue.next_batch("viewer", pool.clone(), &ledger.liked_ids("viewer"), &[], 10);
    let mut cursor = DiscoveryCursor::new(batch.iter().map(|p| p.user_id.clone()).collect());
    let first = cursor.advance().expect("batch should not be empty");

    assert_eq!(
        ledger.like(&mut registry, "viewer", &first).unwrap(),
        LikeOutcome::Recorded
    );

    // The liked candidate disappears from the next refresh
    let refreshed = queue.next_batch("viewer", pool.clone(), &ledger.liked_ids("viewer"), &[], 10);
    assert!(refreshed.iter().all(|p| p.user_id != first));

    // Reciprocal like confirms exactly one match, visible to both sides
    let outcome = ledger.like(&mut registry, &first, "viewer").unwrap();
    match outcome {
        LikeOutcome::Matched(m) => {
            assert_eq!(m.partner_of("viewer"), first);
        }
        other => panic!("expected match, got {:?}", other),
    }
    assert_eq!(registry.matches_for("viewer").len(), 1);
    assert_eq!(registry.matches_for(&first).len(), 1);

    // Liking back again changes nothing
    ledger.like(&mut registry, "viewer", &first).unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_refresh_token_protects_exclusion_set() {
    let queue = DiscoveryQueue::new(100);
    let mut ledger = LikeLedger::new();
    let mut registry = MatchRegistry::new();
    let seq = RefreshSequencer::new();

    let pool = vec![profile("u1", 1), profile("u2", 2)];

    // A slow load starts against the current ledger state
    let stale_token = seq.begin();
    let stale_batch = queue.next_batch("viewer", pool.clone(), &ledger.liked_ids("viewer"), &[], 10);

    // Meanwhile the viewer likes u1 and a fresh load completes
    ledger.like(&mut registry, "viewer", "u1").unwrap();
    let fresh_token = seq.begin();
    let fresh_batch = queue.next_batch("viewer", pool, &ledger.liked_ids("viewer"), &[], 10);
    assert!(seq.try_commit(fresh_token));

    // The stale result must be dropped: it still contains u1
    assert!(stale_batch.iter().any(|p| p.user_id == "u1"));
    assert!(fresh_batch.iter().all(|p| p.user_id != "u1"));
    assert!(!seq.try_commit(stale_token));
}

#[test]
fn test_family_consensus_full_lifecycle() {
    let mut profile = shared_profile(3);
    let mut votes = Vec::new();

    assert_eq!(profile.status, ConsensusStatus::Pending);

    // First vote of any kind opens the discussion
    cast(&mut profile, &mut votes, "m1", VoteChoice::Discuss);
    assert_eq!(profile.status, ConsensusStatus::Discussing);

    // Two approvals are below quorum
    cast(&mut profile, &mut votes, "m2", VoteChoice::Approve);
    cast(&mut profile, &mut votes, "m3", VoteChoice::Approve);
    assert_eq!(profile.status, ConsensusStatus::Discussing);

    // m1 switches to approve: quorum of three distinct approvals
    cast(&mut profile, &mut votes, "m1", VoteChoice::Approve);
    assert_eq!(profile.status, ConsensusStatus::Approved);

    // Late votes are recorded for the history but change nothing
    cast(&mut profile, &mut votes, "m4", VoteChoice::Decline);
    assert_eq!(profile.status, ConsensusStatus::Approved);
    assert_eq!(tally(&votes).distinct_voters(), 4);
}

#[test]
fn test_decline_quorum_closes_profile() {
    let mut profile = shared_profile(2);
    let mut votes = Vec::new();

    cast(&mut profile, &mut votes, "m1", VoteChoice::Decline);
    assert_eq!(profile.status, ConsensusStatus::Discussing);

    cast(&mut profile, &mut votes, "m2", VoteChoice::Decline);
    assert_eq!(profile.status, ConsensusStatus::Declined);

    // Terminal in the other direction too
    cast(&mut profile, &mut votes, "m3", VoteChoice::Approve);
    cast(&mut profile, &mut votes, "m4", VoteChoice::Approve);
    assert_eq!(profile.status, ConsensusStatus::Declined);
}

#[test]
fn test_view_counter_never_touches_status() {
    let mut profile = shared_profile(1);
    let mut votes = Vec::new();

    profile.view_count += 5;
    assert_eq!(
        aggregate_status(profile.status, &votes, profile.required_votes),
        ConsensusStatus::Pending
    );

    cast(&mut profile, &mut votes, "m1", VoteChoice::Approve);
    profile.view_count += 3;
    assert_eq!(profile.status, ConsensusStatus::Approved);
    assert_eq!(profile.view_count, 8);
}

#[test]
fn test_zero_score_pair_can_still_match() {
    // Quorum-independent Scenario: no shared questions, score 0, yet the
    // pair remains discoverable and can still confirm a mutual match
    let a = sheet(&[("q1", 0, 2), ("q2", 1, 3)]);
    let b = sheet(&[("q3", 0, 2), ("q4", 1, 3)]);
    assert_eq!(compatibility_score(&a, &b), 0);

    let queue = DiscoveryQueue::new(100);
    let batch = queue.next_batch("a", vec![profile("b", 1)], &[], &[], 10);
    assert_eq!(batch.len(), 1);

    let mut ledger = LikeLedger::new();
    let mut registry = MatchRegistry::new();
    ledger.like(&mut registry, "a", "b").unwrap();
    let outcome = ledger.like(&mut registry, "b", "a").unwrap();
    assert!(matches!(outcome, LikeOutcome::Matched(_)));
}

#[test]
fn test_exhausted_pool_is_an_ordinary_result() {
    let queue = DiscoveryQueue::new(100);
    let mut ledger = LikeLedger::new();
    let mut registry = MatchRegistry::new();

    ledger.like(&mut registry, "viewer", "u1").unwrap();
    ledger.like(&mut registry, "viewer", "u2").unwrap();

    let pool = vec![profile("u1", 1), profile("u2", 2)];
    let batch = queue.next_batch("viewer", pool, &ledger.liked_ids("viewer"), &[], 10);

    assert!(batch.is_empty());
}
