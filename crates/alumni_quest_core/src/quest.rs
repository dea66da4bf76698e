//! crates/alumni_quest_core/src/quest.rs
//!
//! The connection quest state machine: pick a prompt, answer it, then show a
//! proof token for the peer to confirm.

use crate::domain::Prompt;
use crate::proof::ProofToken;

/// Stages of one quest, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Selecting,
    Responding,
    Proving,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Selecting => "selecting",
            Stage::Responding => "responding",
            Stage::Proving => "proving",
        }
    }
}

/// Guard failures. The display strings are what the user sees inline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Please select a question first")]
    NoPromptSelected,
    #[error("That question is not available")]
    UnknownPrompt(String),
    #[error("Please provide an answer")]
    EmptyResponse,
    #[error("This action is not available while {0}")]
    WrongStage(&'static str),
}

/// Result of navigating back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Stage(Stage),
    /// Back from the first stage leaves the flow.
    Exit,
}

/// The transient state of one quest, owned by a single connection.
#[derive(Debug, Clone)]
pub struct InteractionSession {
    target_peer_id: String,
    prompts: Vec<Prompt>,
    selected_prompt_id: Option<String>,
    response_text: Option<String>,
    stage: Stage,
    error: Option<String>,
}

impl InteractionSession {
    pub fn new(target_peer_id: impl Into<String>, prompts: Vec<Prompt>) -> Self {
        Self {
            target_peer_id: target_peer_id.into(),
            prompts,
            selected_prompt_id: None,
            response_text: None,
            stage: Stage::Selecting,
            error: None,
        }
    }

    pub fn target_peer_id(&self) -> &str {
        &self.target_peer_id
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn selected_prompt_id(&self) -> Option<&str> {
        self.selected_prompt_id.as_deref()
    }

    pub fn selected_prompt(&self) -> Option<&Prompt> {
        let id = self.selected_prompt_id.as_deref()?;
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn response_text(&self) -> Option<&str> {
        self.response_text.as_deref()
    }

    /// The inline message currently shown, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn select_prompt(&mut self, prompt_id: &str) -> Result<(), FlowError> {
        self.require_stage(Stage::Selecting)?;
        if !self.prompts.iter().any(|p| p.id == prompt_id) {
            return self.fail(FlowError::UnknownPrompt(prompt_id.to_string()));
        }
        self.selected_prompt_id = Some(prompt_id.to_string());
        self.error = None;
        Ok(())
    }

    pub fn continue_to_responding(&mut self) -> Result<Stage, FlowError> {
        self.require_stage(Stage::Selecting)?;
        if self.selected_prompt().is_none() {
            return self.fail(FlowError::NoPromptSelected);
        }
        Ok(self.transition(Stage::Responding))
    }

    pub fn set_response(&mut self, text: impl Into<String>) -> Result<(), FlowError> {
        self.require_stage(Stage::Responding)?;
        self.response_text = Some(text.into());
        Ok(())
    }

    pub fn continue_to_proving(&mut self) -> Result<Stage, FlowError> {
        self.require_stage(Stage::Responding)?;
        let answered = self
            .response_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !answered {
            return self.fail(FlowError::EmptyResponse);
        }
        Ok(self.transition(Stage::Proving))
    }

    pub fn back(&mut self) -> BackOutcome {
        match self.stage {
            Stage::Selecting => BackOutcome::Exit,
            Stage::Responding => BackOutcome::Stage(self.transition(Stage::Selecting)),
            Stage::Proving => BackOutcome::Stage(self.transition(Stage::Responding)),
        }
    }

    /// Accepting the proof is allowed from `Proving` only; settlement takes it from there.
    pub fn confirm(&mut self) -> Result<(), FlowError> {
        self.require_stage(Stage::Proving)?;
        self.error = None;
        Ok(())
    }

    /// Available once the session has reached `Proving`.
    pub fn proof_token(&self) -> Option<ProofToken> {
        if self.stage != Stage::Proving {
            return None;
        }
        Some(ProofToken::new(
            self.target_peer_id.clone(),
            self.selected_prompt_id.clone()?,
            self.response_text.clone()?,
        ))
    }

    fn transition(&mut self, to: Stage) -> Stage {
        self.stage = to;
        self.error = None;
        to
    }

    fn require_stage(&mut self, expected: Stage) -> Result<(), FlowError> {
        if self.stage == expected {
            Ok(())
        } else {
            let stage = self.stage.as_str();
            self.fail(FlowError::WrongStage(stage))
        }
    }

    fn fail<T>(&mut self, err: FlowError) -> Result<T, FlowError> {
        self.error = Some(err.to_string());
        Err(err)
    }
}
