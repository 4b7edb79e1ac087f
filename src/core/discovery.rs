use crate::models::UserProfile;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Builds exclusion-filtered candidate batches for a viewer
///
/// The exclusion set is {viewer} ∪ {already liked} ∪ {caller extras};
/// inactive profiles are dropped as well. The remainder is ordered by
/// descending activation time with ties broken by ascending user id — a
/// stable, deterministic policy choice, not a ranking signal.
#[derive(Debug, Clone)]
pub struct DiscoveryQueue {
    max_batch: usize,
}

impl DiscoveryQueue {
    pub fn new(max_batch: usize) -> Self {
        Self { max_batch }
    }

    /// Ids that must never appear in a batch for this viewer
    pub fn exclusion_set(
        viewer_id: &str,
        liked_ids: &[String],
        extra_excluded: &[String],
    ) -> HashSet<String> {
        let mut excluded: HashSet<String> = HashSet::with_capacity(liked_ids.len() + 1);
        excluded.insert(viewer_id.to_string());
        excluded.extend(liked_ids.iter().cloned());
        excluded.extend(extra_excluded.iter().cloned());
        excluded
    }

    /// Produce the next ordered batch of candidates for a viewer
    ///
    /// An empty result means the pool is exhausted after exclusion; that is
    /// an ordinary outcome, not an error.
    pub fn next_batch(
        &self,
        viewer_id: &str,
        candidates: Vec<UserProfile>,
        liked_ids: &[String],
        extra_excluded: &[String],
        limit: usize,
    ) -> Vec<UserProfile> {
        let excluded = Self::exclusion_set(viewer_id, liked_ids, extra_excluded);

        let mut batch: Vec<UserProfile> = candidates
            .into_iter()
            .filter(|profile| profile.is_active)
            .filter(|profile| !excluded.contains(&profile.user_id))
            .collect();

        // Newest activations first; id tiebreak keeps the order total
        batch.sort_by(|a, b| {
            b.activated_at
                .cmp(&a.activated_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        batch.truncate(limit.min(self.max_batch));
        batch
    }
}

impl Default for DiscoveryQueue {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Forward-only position in a loaded batch
///
/// `advance` moves a monotonically increasing index; there is no rewind.
/// Returning to an earlier candidate requires a fresh batch and a fresh
/// cursor.
#[derive(Debug, Clone)]
pub struct DiscoveryCursor {
    entries: Vec<String>,
    position: usize,
}

impl DiscoveryCursor {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries, position: 0 }
    }

    /// The candidate under the cursor, without consuming it
    pub fn peek(&self) -> Option<&str> {
        self.entries.get(self.position).map(String::as_str)
    }

    /// Consume and return the candidate under the cursor
    pub fn advance(&mut self) -> Option<String> {
        let entry = self.entries.get(self.position).cloned();
        if entry.is_some() {
            self.position += 1;
        }
        entry
    }

    pub fn remaining(&self) -> usize {
        self.entries.len() - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.entries.len()
    }
}

/// Monotonic request tokens for batch refreshes
///
/// A refresh begins by taking a token; the resulting batch may only be
/// installed if no newer token has been committed since (last-request-wins).
/// A stale in-flight load therefore never overwrites a batch built from a
/// fresher exclusion set.
#[derive(Debug, Default)]
pub struct RefreshSequencer {
    issued: AtomicU64,
    committed: AtomicU64,
}

impl RefreshSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the token for a new batch load
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Commit a finished load; false means a newer load already committed
    /// and this result must be discarded
    pub fn try_commit(&self, token: u64) -> bool {
        loop {
            let current = self.committed.load(Ordering::SeqCst);
            if token <= current {
                return false;
            }
            if self
                .committed
                .compare_exchange(current, token, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }

    pub fn last_committed(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }
}
