//! services/api/src/adapters/prompt_llm.rs
//!
//! This module contains the adapter that asks an LLM directly for quest prompts.
//! It implements the `PromptGenerationService` port from the `core` crate.

use alumni_quest_core::domain::{Peer, Prompt};
use alumni_quest_core::ports::{PortError, PortResult, PromptGenerationService};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;

const SYSTEM_INSTRUCTIONS: &str = r#"You write icebreaker questions for MBA alumni meeting at a networking event.
Given the profile of the person being met, write exactly three short, specific questions the user could ask them.
Give each question a point value between 20 and 50; more personal or thoughtful questions are worth more.
Respond with ONLY a JSON object of the form:
{"questions":[{"id":"1","question":"...","points":50}]}"#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PromptGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPromptAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPromptAdapter {
    /// Creates a new `OpenAiPromptAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[derive(Deserialize)]
struct LlmQuestions {
    questions: Vec<LlmQuestion>,
}

#[derive(Deserialize)]
struct LlmQuestion {
    id: String,
    question: String,
    points: u32,
}

fn describe(peer: &Peer) -> String {
    let mut profile = format!(
        "Name: {}\nTitle: {}\nCompany: {}\nBatch: {}\nIndustry: {}",
        peer.name, peer.title, peer.company, peer.batch, peer.industry
    );
    if let Some(looking) = &peer.looking {
        profile.push_str(&format!("\nLooking for: {}", looking));
    }
    if let Some(offering) = &peer.offering {
        profile.push_str(&format!("\nOffering: {}", offering));
    }
    profile
}

/// Pulls the JSON object out of a reply that may be wrapped in a code fence.
fn parse_questions(content: &str) -> PortResult<Vec<Prompt>> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => {
            return Err(PortError::Unexpected(
                "Prompt LLM reply contained no JSON object.".to_string(),
            ))
        }
    };
    let parsed: LlmQuestions =
        serde_json::from_str(json).map_err(|e| PortError::Unexpected(e.to_string()))?;
    Ok(parsed
        .questions
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .map(|q| Prompt::new(q.id, q.question.trim(), q.points))
        .collect())
}

//=========================================================================================
// `PromptGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PromptGenerationService for OpenAiPromptAdapter {
    async fn generate_prompts(&self, peer: &Peer) -> PortResult<Vec<Prompt>> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(describe(peer))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .temperature(0.8)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PortError::Unexpected("Prompt LLM returned no content.".to_string()))?;

        parse_questions(&content)
    }
}
