use crate::models::{MutualMatch, VoteChoice};
use reqwest::Client;
use std::time::Duration;
use uuid::Uuid;

/// Fire-and-forget client for the platform's notification collaborator
///
/// Delivery is best-effort: events are posted from a detached task, failures
/// are logged and never propagated, so a notification outage can never roll
/// back a match or a vote.
pub struct NotificationClient {
    client: Client,
    endpoint: Option<String>,
    api_key: String,
}

impl NotificationClient {
    pub fn new(endpoint: Option<String>, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// Announce a newly confirmed mutual match to both parties
    pub fn match_created(&self, confirmed: &MutualMatch) {
        self.dispatch(serde_json::json!({
            "event": "match_created",
            "userLo": confirmed.user_lo,
            "userHi": confirmed.user_hi,
            "createdAt": confirmed.created_at,
        }));
    }

    /// Announce a vote on a shared profile to the family circle
    pub fn vote_cast(&self, shared_profile_id: Uuid, member_id: &str, vote: VoteChoice) {
        self.dispatch(serde_json::json!({
            "event": "vote_cast",
            "sharedProfileId": shared_profile_id,
            "memberId": member_id,
            "vote": vote,
        }));
    }

    fn dispatch(&self, payload: serde_json::Value) {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => {
                tracing::debug!("Notification endpoint not configured, dropping event");
                return;
            }
        };

        let client = self.client.clone();
        let api_key = self.api_key.clone();

        tokio::spawn(async move {
            let result = client
                .post(&endpoint)
                .header("X-Amora-Key", &api_key)
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!("Notification rejected: {}", response.status());
                }
                Err(e) => {
                    tracing::warn!("Notification delivery failed: {}", e);
                }
                _ => {}
            }
        });
    }
}
