// Unit tests for Amora Algo

use amora_algo::core::{
    consensus::{aggregate_status, tally},
    discovery::{DiscoveryCursor, DiscoveryQueue, RefreshSequencer},
    ledger::{canonical_pair, LikeLedger, LikeOutcome, MatchRegistry},
    scoring::{compatibility_score, validate_sheet},
};
use amora_algo::models::{
    Answer, AnswerMap, ConsensusStatus, FamilyVote, Question, UserProfile, VoteChoice,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

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

fn profile(id: &str, activated_mins_ago: i64) -> UserProfile {
    UserProfile {
        user_id: id.to_string(),
        display_name: format!("User {}", id),
        is_active: true,
        activated_at: Some(Utc::now() - Duration::minutes(activated_mins_ago)),
        about: None,
    }
}

fn family_vote(member: &str, choice: VoteChoice, minute: i64) -> FamilyVote {
    FamilyVote {
        shared_profile_id: Uuid::nil(),
        member_id: member.to_string(),
        vote: choice,
        comment: None,
        voted_at: Utc::now() + Duration::minutes(minute),
    }
}

#[test]
fn test_score_symmetry_over_varied_sheets() {
    let sheets = [
        sheet(&[("q1", 0, 1)]),
        sheet(&[("q1", 0, 3), ("q2", 1, 2)]),
        sheet(&[("q2", 1, 2), ("q3", 0, 1), ("q4", 2, 3)]),
        AnswerMap::new(),
    ];

    for a in &sheets {
        for b in &sheets {
            assert_eq!(compatibility_score(a, b), compatibility_score(b, a));
        }
    }
}

#[test]
fn test_score_always_within_bounds() {
    let a = sheet(&[("q1", 0, 1), ("q2", 1, 3), ("q3", 2, 2), ("q4", 0, 1)]);
    let b = sheet(&[("q1", 1, 3), ("q2", 1, 1), ("q4", 0, 2), ("q5", 0, 3)]);

    let score = compatibility_score(&a, &b);
    assert!(score <= 100);
}

#[test]
fn test_disjoint_sheets_score_zero() {
    let a = sheet(&[("q1", 0, 3)]);
    let b = sheet(&[("q2", 0, 3)]);

    assert_eq!(compatibility_score(&a, &b), 0);
}

#[test]
fn test_full_agreement_scores_hundred_for_any_weights() {
    for importance_a in 1..=3u8 {
        for importance_b in 1..=3u8 {
            let a = sheet(&[("q1", 2, importance_a), ("q2", 0, importance_a)]);
            let b = sheet(&[("q1", 2, importance_b), ("q2", 0, importance_b)]);
            assert_eq!(compatibility_score(&a, &b), 100);
        }
    }
}

#[test]
fn test_scoring_scenario_weighted_rounding() {
    // Viewer: Q1 (choice 0, importance 2), Q2 (choice 0, importance 2)
    // Candidate: Q1 (choice 0, importance 3), Q2 (choice 1, importance 1)
    // totalWeight = 5 + 3 = 8, matchWeight = 5, round(100*5/8) = 63
    let viewer = sheet(&[("q1", 0, 2), ("q2", 0, 2)]);
    let candidate = sheet(&[("q1", 0, 3), ("q2", 1, 1)]);

    assert_eq!(compatibility_score(&viewer, &candidate), 63);
}

#[test]
fn test_required_question_enforced() {
    let questions = vec![Question {
        id: "q1".to_string(),
        text: "Pick one".to_string(),
        choices: vec!["a".to_string(), "b".to_string()],
        base_weight: 2,
        required: true,
    }];

    assert!(validate_sheet(&questions, &AnswerMap::new()).is_err());
    assert!(validate_sheet(&questions, &sheet(&[("q1", 1, 2)])).is_ok());
}

#[test]
fn test_batch_never_contains_excluded_ids() {
    // Viewer has liked u2 and u4; pool is u1..u5
    let queue = DiscoveryQueue::new(100);
    let pool = vec![
        profile("u1", 1),
        profile("u2", 2),
        profile("u3", 3),
        profile("u4", 4),
        profile("u5", 5),
    ];
    let liked = vec!["u2".to_string(), "u4".to_string()];

    let batch = queue.next_batch("viewer", pool, &liked, &[], 10);
    let ids: Vec<&str> = batch.iter().map(|p| p.user_id.as_str()).collect();

    assert_eq!(ids.len(), 3);
    for id in ids {
        assert!(["u1", "u3", "u5"].contains(&id));
    }
}

#[test]
fn test_viewer_never_sees_themselves() {
    let queue = DiscoveryQueue::new(100);
    let pool = vec![profile("viewer", 1), profile("u2", 2)];

    let batch = queue.next_batch("viewer", pool, &[], &[], 10);

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].user_id, "u2");
}

#[test]
fn test_zero_score_candidate_still_discoverable() {
    // Scoring and eligibility are independent: two users with no shared
    // questions score 0 but still meet through discovery
    let viewer_sheet = sheet(&[("q1", 0, 2)]);
    let candidate_sheet = sheet(&[("q2", 0, 2)]);
    assert_eq!(compatibility_score(&viewer_sheet, &candidate_sheet), 0);

    let queue = DiscoveryQueue::new(100);
    let batch = queue.next_batch("viewer", vec![profile("candidate", 1)], &[], &[], 10);
    assert_eq!(batch[0].user_id, "candidate");
}

#[test]
fn test_reciprocal_likes_confirm_one_match() {
    let mut ledger = LikeLedger::new();
    let mut registry = MatchRegistry::new();

    assert_eq!(
        ledger.like(&mut registry, "a", "b").unwrap(),
        LikeOutcome::Recorded
    );
    assert!(matches!(
        ledger.like(&mut registry, "b", "a").unwrap(),
        LikeOutcome::Matched(_)
    ));

    // Repeats in either direction never add a second match
    ledger.like(&mut registry, "a", "b").unwrap();
    ledger.like(&mut registry, "b", "a").unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_canonical_pair_key_is_order_free() {
    assert_eq!(canonical_pair("u9", "u1"), canonical_pair("u1", "u9"));
}

#[test]
fn test_tally_partitions_voters() {
    let votes = vec![
        family_vote("m1", VoteChoice::Approve, 0),
        family_vote("m2", VoteChoice::Decline, 1),
        family_vote("m3", VoteChoice::Discuss, 2),
    ];

    let counts = tally(&votes);
    assert_eq!(
        counts.approve + counts.decline + counts.discuss,
        counts.distinct_voters()
    );
}

#[test]
fn test_consensus_scenario_quorum_three() {
    // Quorum 3: approve, approve, discuss -> still discussing
    let mut votes = vec![
        family_vote("m1", VoteChoice::Approve, 0),
        family_vote("m2", VoteChoice::Approve, 1),
        family_vote("m3", VoteChoice::Discuss, 2),
    ];
    let status = aggregate_status(ConsensusStatus::Discussing, &votes, 3);
    assert_eq!(status, ConsensusStatus::Discussing);

    // Third approval flips to approved
    votes.push(family_vote("m4", VoteChoice::Approve, 3));
    let status = aggregate_status(status, &votes, 3);
    assert_eq!(status, ConsensusStatus::Approved);

    // A later decline can never move it back
    votes.push(family_vote("m5", VoteChoice::Decline, 4));
    assert_eq!(aggregate_status(status, &votes, 3), ConsensusStatus::Approved);
}

#[test]
fn test_status_approved_iff_quorum_reached() {
    for approvals in 0..5u32 {
        let votes: Vec<FamilyVote> = (0..approvals)
            .map(|i| family_vote(&format!("m{}", i), VoteChoice::Approve, i as i64))
            .collect();
        let status = aggregate_status(ConsensusStatus::Discussing, &votes, 3);

        if approvals >= 3 {
            assert_eq!(status, ConsensusStatus::Approved);
        } else {
            assert_ne!(status, ConsensusStatus::Approved);
        }
    }
}

#[test]
fn test_cursor_has_no_rewind() {
    let mut cursor = DiscoveryCursor::new(vec!["u1".to_string(), "u2".to_string()]);

    assert_eq!(cursor.advance().as_deref(), Some("u1"));
    assert_eq!(cursor.advance().as_deref(), Some("u2"));
    assert_eq!(cursor.advance(), None);
    // Exhausted stays exhausted
    assert!(cursor.is_exhausted());
}

#[test]
fn test_refresh_discards_stale_loads() {
    let seq = RefreshSequencer::new();
    let stale = seq.begin();
    let fresh = seq.begin();

    assert!(seq.try_commit(fresh));
    assert!(!seq.try_commit(stale));
}
