use crate::core::ledger::canonical_pair;
use crate::models::{ConsensusStatus, FamilyVote, MutualMatch, SharedProfile, VoteChoice};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when interacting with the engine store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Vote values as stored in PostgreSQL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vote_choice", rename_all = "lowercase")]
pub enum VoteValue {
    Approve,
    Decline,
    Discuss,
}

impl From<VoteChoice> for VoteValue {
    fn from(value: VoteChoice) -> Self {
        match value {
            VoteChoice::Approve => VoteValue::Approve,
            VoteChoice::Decline => VoteValue::Decline,
            VoteChoice::Discuss => VoteValue::Discuss,
        }
    }
}

impl From<VoteValue> for VoteChoice {
    fn from(value: VoteValue) -> Self {
        match value {
            VoteValue::Approve => VoteChoice::Approve,
            VoteValue::Decline => VoteChoice::Decline,
            VoteValue::Discuss => VoteChoice::Discuss,
        }
    }
}

/// Consensus statuses as stored in PostgreSQL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "consensus_status", rename_all = "lowercase")]
pub enum StatusValue {
    Pending,
    Discussing,
    Approved,
    Declined,
}

impl From<ConsensusStatus> for StatusValue {
    fn from(value: ConsensusStatus) -> Self {
        match value {
            ConsensusStatus::Pending => StatusValue::Pending,
            ConsensusStatus::Discussing => StatusValue::Discussing,
            ConsensusStatus::Approved => StatusValue::Approved,
            ConsensusStatus::Declined => StatusValue::Declined,
        }
    }
}

impl From<StatusValue> for ConsensusStatus {
    fn from(value: StatusValue) -> Self {
        match value {
            StatusValue::Pending => ConsensusStatus::Pending,
            StatusValue::Discussing => ConsensusStatus::Discussing,
            StatusValue::Approved => ConsensusStatus::Approved,
            StatusValue::Declined => ConsensusStatus::Declined,
        }
    }
}

/// PostgreSQL client for the engine's canonical records
///
/// Likes, matches, shared profiles and family votes live here. The table
/// constraints are the concurrency story: idempotent like inserts and the
/// at-most-one match per canonical pair come from primary keys plus
/// ON CONFLICT, never from client-side locking.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Record a directed like edge
    ///
    /// Returns false when the edge already existed; a repeat call is a
    /// no-op, never an error.
    pub async fn record_like(&self, liker_id: &str, liked_id: &str) -> Result<bool, StoreError> {
        let query = r#"
            INSERT INTO like_events (liker_id, liked_id, liked_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (liker_id, liked_id) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(liker_id)
            .bind(liked_id)
            .execute(&self.pool)
            .await?;

        let inserted = result.rows_affected() > 0;
        tracing::debug!(
            "Recorded like: {} -> {} (new: {})",
            liker_id,
            liked_id,
            inserted
        );

        Ok(inserted)
    }

    /// Check whether a directed like edge exists
    pub async fn has_like(&self, liker_id: &str, liked_id: &str) -> Result<bool, StoreError> {
        let query = r#"
            SELECT 1 AS present
            FROM like_events
            WHERE liker_id = $1 AND liked_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(liker_id)
            .bind(liked_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// All ids this user has liked, for the discovery exclusion set
    pub async fn liked_ids(&self, liker_id: &str) -> Result<Vec<String>, StoreError> {
        let query = r#"
            SELECT liked_id
            FROM like_events
            WHERE liker_id = $1
        "#;

        let rows = sqlx::query(query)
            .bind(liker_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("liked_id")).collect())
    }

    /// Ensure the match row for the unordered pair {a, b} exists
    ///
    /// The pair is stored under its canonical ordering; the primary key on
    /// (user_lo, user_hi) makes this race-safe. Returns the match only when
    /// this call created it, so the caller knows whether to notify.
    pub async fn create_match_if_absent(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<MutualMatch>, StoreError> {
        let (user_lo, user_hi) = canonical_pair(a, b);

        let query = r#"
            INSERT INTO matches (user_lo, user_hi, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_lo, user_hi) DO NOTHING
            RETURNING created_at
        "#;

        let row = sqlx::query(query)
            .bind(&user_lo)
            .bind(&user_hi)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| MutualMatch {
            user_lo,
            user_hi,
            created_at: row.get("created_at"),
        }))
    }

    /// All confirmed matches involving this user, newest first
    pub async fn list_matches(&self, user_id: &str) -> Result<Vec<MutualMatch>, StoreError> {
        let query = r#"
            SELECT user_lo, user_hi, created_at
            FROM matches
            WHERE user_lo = $1 OR user_hi = $1
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| MutualMatch {
                user_lo: row.get("user_lo"),
                user_hi: row.get("user_hi"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Create a shared profile with its quorum threshold fixed at share time
    pub async fn create_shared_profile(
        &self,
        sharer_id: &str,
        candidate_id: &str,
        required_votes: u32,
    ) -> Result<SharedProfile, StoreError> {
        let id = Uuid::new_v4();
        let query = r#"
            INSERT INTO shared_profiles (id, candidate_id, sharer_id, required_votes)
            VALUES ($1, $2, $3, $4)
            RETURNING shared_at
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .bind(candidate_id)
            .bind(sharer_id)
            .bind(required_votes as i32)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(
            "Shared profile {} created by {} for candidate {}",
            id,
            sharer_id,
            candidate_id
        );

        Ok(SharedProfile {
            id,
            candidate_id: candidate_id.to_string(),
            sharer_id: sharer_id.to_string(),
            required_votes,
            status: ConsensusStatus::Pending,
            view_count: 0,
            shared_at: row.get("shared_at"),
        })
    }

    /// Fetch a shared profile by id
    pub async fn get_shared_profile(&self, id: Uuid) -> Result<SharedProfile, StoreError> {
        let query = r#"
            SELECT id, candidate_id, sharer_id, required_votes, status, view_count, shared_at
            FROM shared_profiles
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Shared profile {} not found", id)))?;

        Ok(SharedProfile {
            id: row.get("id"),
            candidate_id: row.get("candidate_id"),
            sharer_id: row.get("sharer_id"),
            required_votes: row.get::<i32, _>("required_votes") as u32,
            status: row.get::<StatusValue, _>("status").into(),
            view_count: row.get("view_count"),
            shared_at: row.get("shared_at"),
        })
    }

    /// Store or overwrite a member's vote on a shared profile
    pub async fn upsert_vote(
        &self,
        shared_profile_id: Uuid,
        member_id: &str,
        vote: VoteValue,
        comment: Option<&str>,
    ) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO family_votes (shared_profile_id, member_id, vote, comment, voted_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (shared_profile_id, member_id)
            DO UPDATE SET
                vote = EXCLUDED.vote,
                comment = EXCLUDED.comment,
                voted_at = EXCLUDED.voted_at
        "#;

        sqlx::query(query)
            .bind(shared_profile_id)
            .bind(member_id)
            .bind(vote)
            .bind(comment)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded vote on {}: {} -> {:?}",
            shared_profile_id,
            member_id,
            vote
        );

        Ok(())
    }

    /// The full current vote set for a shared profile, oldest first
    pub async fn list_votes(&self, shared_profile_id: Uuid) -> Result<Vec<FamilyVote>, StoreError> {
        let query = r#"
            SELECT shared_profile_id, member_id, vote, comment, voted_at
            FROM family_votes
            WHERE shared_profile_id = $1
            ORDER BY voted_at ASC
        "#;

        let rows = sqlx::query(query)
            .bind(shared_profile_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| FamilyVote {
                shared_profile_id: row.get("shared_profile_id"),
                member_id: row.get("member_id"),
                vote: row.get::<VoteValue, _>("vote").into(),
                comment: row.get("comment"),
                voted_at: row.get("voted_at"),
            })
            .collect())
    }

    /// Persist a recomputed status unless a terminal status already landed
    ///
    /// Returns false when the row was terminal (or gone); the caller must
    /// then treat the stored status as authoritative.
    pub async fn update_status_if_open(
        &self,
        shared_profile_id: Uuid,
        status: StatusValue,
    ) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE shared_profiles
            SET status = $2
            WHERE id = $1 AND status NOT IN ('approved', 'declined')
        "#;

        let result = sqlx::query(query)
            .bind(shared_profile_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Bump the informational view counter
    pub async fn increment_view_count(&self, shared_profile_id: Uuid) -> Result<i64, StoreError> {
        let query = r#"
            UPDATE shared_profiles
            SET view_count = view_count + 1
            WHERE id = $1
            RETURNING view_count
        "#;

        let row = sqlx::query(query)
            .bind(shared_profile_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("Shared profile {} not found", shared_profile_id))
            })?;

        Ok(row.get("view_count"))
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
