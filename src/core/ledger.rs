use crate::core::EngineError;
use crate::models::{LikeEvent, MutualMatch};
use chrono::Utc;
use std::collections::HashMap;

/// Deterministic ordering of two ids, used as the unique key for the
/// unordered pair {a, b}
pub fn canonical_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Outcome of recording a like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Edge stored; no reciprocal edge yet
    Recorded,
    /// Edge (and any match) already existed; the call was a no-op
    AlreadyLiked,
    /// Edge stored and the reciprocal edge existed: match confirmed
    Matched(MutualMatch),
}

/// Directed like edges with idempotent insertion
///
/// Reference realization of the ledger contract; the durable counterpart
/// lives in the postgres store where the same semantics come from the
/// primary key and ON CONFLICT.
#[derive(Debug, Default)]
pub struct LikeLedger {
    edges: HashMap<(String, String), LikeEvent>,
}

impl LikeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directed like and confirm a match if it is reciprocal
    ///
    /// Repeat calls for the same ordered pair are no-ops. Self-likes are
    /// rejected.
    pub fn like(
        &mut self,
        registry: &mut MatchRegistry,
        liker_id: &str,
        liked_id: &str,
    ) -> Result<LikeOutcome, EngineError> {
        if liker_id == liked_id {
            return Err(EngineError::Validation(format!(
                "user {} cannot like themselves",
                liker_id
            )));
        }

        let key = (liker_id.to_string(), liked_id.to_string());
        let inserted = if self.edges.contains_key(&key) {
            false
        } else {
            self.edges.insert(
                key,
                LikeEvent {
                    liker_id: liker_id.to_string(),
                    liked_id: liked_id.to_string(),
                    liked_at: Utc::now(),
                },
            );
            true
        };

        if self.has_like(liked_id, liker_id) {
            if let Some(created) = registry.create_if_absent(liker_id, liked_id) {
                return Ok(LikeOutcome::Matched(created));
            }
        }

        if inserted {
            Ok(LikeOutcome::Recorded)
        } else {
            Ok(LikeOutcome::AlreadyLiked)
        }
    }

    pub fn has_like(&self, liker_id: &str, liked_id: &str) -> bool {
        self.edges
            .contains_key(&(liker_id.to_string(), liked_id.to_string()))
    }

    /// Every id this user has liked, for exclusion-set building
    pub fn liked_ids(&self, liker_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .edges
            .keys()
            .filter(|(liker, _)| liker == liker_id)
            .map(|(_, liked)| liked.clone())
            .collect();
        ids.sort();
        ids
    }
}

/// Confirmed mutual matches, at most one per unordered pair
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: HashMap<(String, String), MutualMatch>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the match for {a, b} unless it already exists
    ///
    /// Returns the match only when this call created it, mirroring the
    /// create-if-absent insert the store performs under its uniqueness
    /// constraint.
    pub fn create_if_absent(&mut self, a: &str, b: &str) -> Option<MutualMatch> {
        let key = canonical_pair(a, b);
        if self.matches.contains_key(&key) {
            return None;
        }

        let created = MutualMatch {
            user_lo: key.0.clone(),
            user_hi: key.1.clone(),
            created_at: Utc::now(),
        };
        self.matches.insert(key, created.clone());
        Some(created)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<&MutualMatch> {
        self.matches.get(&canonical_pair(a, b))
    }

    /// All matches involving this user, newest first
    pub fn matches_for(&self, user_id: &str) -> Vec<&MutualMatch> {
        let mut found: Vec<&MutualMatch> = self
            .matches
            .values()
            .filter(|m| m.user_lo == user_id || m.user_hi == user_id)
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
