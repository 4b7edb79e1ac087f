use crate::models::{Answer, AnswerMap, FamilyMember, MemberStatus, Question, UserProfile};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the document backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Document-backend client
///
/// The platform keeps profiles, the questionnaire, answers and family
/// memberships in its document backend; this client is the engine-side face
/// of the ProfileStore, AnswerStore and FamilyMembershipService
/// collaborators.
pub struct BackendClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: BackendCollections,
}

/// Collection ids in the document backend
#[derive(Debug, Clone)]
pub struct BackendCollections {
    pub user_profiles: String,
    pub questions: String,
    pub answers: String,
    pub family_members: String,
}

impl BackendClient {
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: BackendCollections,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        }
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    async fn fetch_documents(
        &self,
        collection: &str,
        queries: &[String],
    ) -> Result<Vec<Value>, BackendError> {
        let queries_json = serde_json::to_string(queries)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        let url = format!(
            "{}?query={}",
            self.documents_url(collection),
            urlencoding::encode(&queries_json)
        );

        tracing::debug!("Fetching documents from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Amora-Key", &self.api_key)
            .header("X-Amora-Project", &self.project_id)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(BackendError::ApiError(format!(
                "Failed to fetch documents from {}: {}",
                collection,
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| BackendError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents
            .iter()
            .map(|doc| doc.get("data").unwrap_or(doc).clone())
            .collect())
    }

    /// Fetch a single profile by user id
    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, BackendError> {
        let queries = vec![format!("equal(\"userId\", \"{}\")", user_id)];
        let documents = self
            .fetch_documents(&self.collections.user_profiles, &queries)
            .await?;

        let doc = documents
            .first()
            .ok_or_else(|| BackendError::NotFound(format!("Profile not found for user {}", user_id)))?;

        serde_json::from_value(doc.clone())
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }

    /// List active profiles, excluding the given ids
    ///
    /// The engine re-applies its exclusion set on top of this; the backend
    /// filter only keeps the transfer small.
    pub async fn list_active_profiles(
        &self,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<UserProfile>, BackendError> {
        let mut queries = vec![
            "equal(\"isActive\", true)".to_string(),
            format!("limit({})", limit),
        ];
        for id in exclude_ids {
            queries.push(format!("notEqual(\"userId\", \"{}\")", id));
        }

        let documents = self
            .fetch_documents(&self.collections.user_profiles, &queries)
            .await?;

        let profiles: Vec<UserProfile> = documents
            .iter()
            .filter_map(|doc| serde_json::from_value(doc.clone()).ok())
            .filter(|p: &UserProfile| !exclude_ids.contains(&p.user_id))
            .collect();

        tracing::debug!("Listed {} active profiles", profiles.len());

        Ok(profiles)
    }

    /// Fetch the full questionnaire
    pub async fn list_questions(&self) -> Result<Vec<Question>, BackendError> {
        let documents = self.fetch_documents(&self.collections.questions, &[]).await?;

        let questions: Vec<Question> = documents
            .iter()
            .filter_map(|doc| serde_json::from_value(doc.clone()).ok())
            .collect();

        if questions.is_empty() && !documents.is_empty() {
            return Err(BackendError::InvalidResponse(
                "No parseable questions in collection".into(),
            ));
        }

        Ok(questions)
    }

    /// Fetch a user's answers as a question-id keyed map
    ///
    /// A user with no answers yields an empty map, not an error.
    pub async fn get_answers(&self, user_id: &str) -> Result<AnswerMap, BackendError> {
        let queries = vec![format!("equal(\"userId\", \"{}\")", user_id)];
        let documents = self
            .fetch_documents(&self.collections.answers, &queries)
            .await?;

        let mut answers = AnswerMap::with_capacity(documents.len());
        for doc in &documents {
            let question_id = doc
                .get("questionId")
                .and_then(|v| v.as_str())
                .ok_or_else(|| BackendError::InvalidResponse("Answer missing questionId".into()))?;
            let answer: Answer = serde_json::from_value(doc.clone())
                .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse answer: {}", e)))?;
            answers.insert(question_id.to_string(), answer);
        }

        tracing::debug!("User {} has {} answers", user_id, answers.len());

        Ok(answers)
    }

    /// Store one answer for a user (create or overwrite)
    ///
    /// The document id is derived from (user, question), so a resubmission
    /// targets the same document: create on first write, update after.
    pub async fn set_answer(
        &self,
        user_id: &str,
        question_id: &str,
        answer: &Answer,
    ) -> Result<(), BackendError> {
        let document_id = format!("{}_{}", user_id, question_id);
        let payload = serde_json::json!({
            "$id": document_id,
            "userId": user_id,
            "questionId": question_id,
            "choiceIndex": answer.choice,
            "importance": answer.importance,
        });

        let response = self
            .client
            .post(self.documents_url(&self.collections.answers))
            .header("X-Amora-Key", &self.api_key)
            .header("X-Amora-Project", &self.project_id)
            .json(&payload)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            // Document exists: overwrite in place
            let url = format!(
                "{}/{}",
                self.documents_url(&self.collections.answers),
                document_id
            );
            let response = self
                .client
                .patch(&url)
                .header("X-Amora-Key", &self.api_key)
                .header("X-Amora-Project", &self.project_id)
                .json(&payload)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(BackendError::ApiError(format!(
                    "Failed to update answer: {}",
                    response.status()
                )));
            }
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(BackendError::ApiError(format!(
                "Failed to store answer: {}",
                response.status()
            )));
        }

        tracing::debug!("Stored answer {} -> {}", user_id, question_id);

        Ok(())
    }

    /// List the active members of a sharer's family circle
    pub async fn list_active_members(
        &self,
        sharer_id: &str,
    ) -> Result<Vec<FamilyMember>, BackendError> {
        let queries = vec![
            format!("equal(\"sharerId\", \"{}\")", sharer_id),
            "equal(\"status\", \"active\")".to_string(),
        ];
        let documents = self
            .fetch_documents(&self.collections.family_members, &queries)
            .await?;

        let members: Vec<FamilyMember> = documents
            .iter()
            .filter_map(|doc| serde_json::from_value(doc.clone()).ok())
            .filter(|m: &FamilyMember| m.status == MemberStatus::Active)
            .collect();

        tracing::debug!("Sharer {} has {} active members", sharer_id, members.len());

        Ok(members)
    }
}
