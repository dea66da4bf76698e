//! services/api/src/adapters/edge_prompts.rs
//!
//! Calls the hosted backend's `generate-questions` edge function.
//! It implements the `PromptGenerationService` port from the `core` crate.

use alumni_quest_core::domain::{Peer, Prompt};
use alumni_quest_core::ports::{PortError, PortResult, PromptGenerationService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

const GENERATE_QUESTIONS_PATH: &str = "/functions/v1/generate-questions";

#[derive(Clone)]
pub struct EdgePromptAdapter {
    client: Client,
    backend_url: String,
    anon_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateQuestionsRequest<'a> {
    user_id: &'a str,
}

#[derive(Deserialize)]
struct GenerateQuestionsResponse {
    questions: Vec<GeneratedQuestion>,
}

#[derive(Deserialize)]
struct GeneratedQuestion {
    id: WireId,
    question: String,
    points: u32,
}

// Generated ids arrive as either strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct EdgeErrorBody {
    error: Option<String>,
}

impl EdgePromptAdapter {
    pub fn new(client: Client, backend_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client,
            backend_url: backend_url.into(),
            anon_key: anon_key.into(),
        }
    }
}

#[async_trait]
impl PromptGenerationService for EdgePromptAdapter {
    async fn generate_prompts(&self, peer: &Peer) -> PortResult<Vec<Prompt>> {
        let url = format!("{}{}", self.backend_url, GENERATE_QUESTIONS_PATH);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.anon_key)
            .json(&GenerateQuestionsRequest { user_id: &peer.id })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("generate-questions request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<EdgeErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| "Failed to generate questions".to_string());
            return Err(PortError::Unexpected(format!(
                "generate-questions returned {}: {}",
                status, message
            )));
        }

        let body: GenerateQuestionsResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed generate-questions body: {}", e)))?;

        info!("generate-questions returned {} prompts for {}", body.questions.len(), peer.id);
        Ok(body
            .questions
            .into_iter()
            .map(|q| Prompt::new(q.id.into_string(), q.question, q.points))
            .collect())
    }
}
