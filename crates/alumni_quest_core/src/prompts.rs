//! crates/alumni_quest_core/src/prompts.rs
//!
//! The question provider: asks the prompt generator for questions tailored to a
//! peer and fails soft to a fixed list when the generator is unavailable.

use crate::domain::{Peer, Prompt};
use crate::ports::{PortError, PromptGenerationService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on the remote generation call before falling back.
pub const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(8);

/// The three prompts offered whenever generation fails.
pub fn fallback_prompts() -> Vec<Prompt> {
    vec![
        Prompt::new("1", "What's your biggest professional achievement?", 50),
        Prompt::new("2", "What advice would you give to MBA aspirants?", 30),
        Prompt::new("3", "What's your favorite memory from MBA?", 40),
    ]
}

/// Where the prompts on a board came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    Remote,
    Fallback,
}

/// What the quest screen shows while and after prompts load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBoard {
    pub prompts: Vec<Prompt>,
    pub loading: bool,
    pub error: Option<String>,
    pub source: Option<PromptSource>,
}

impl PromptBoard {
    pub fn new() -> Self {
        Self {
            prompts: Vec::new(),
            loading: false,
            error: None,
            source: None,
        }
    }
}

impl Default for PromptBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct QuestionProvider {
    generator: Arc<dyn PromptGenerationService>,
    timeout: Duration,
}

impl QuestionProvider {
    pub fn new(generator: Arc<dyn PromptGenerationService>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Fills `board` with prompts for `peer`.
    ///
    /// `loading` is set for the duration of the remote call and cleared on every
    /// exit. A failed, slow, or empty generation is replaced by
    /// [`fallback_prompts`]; the board then carries no error since the fallback
    /// is a usable result.
    pub async fn load_into(&self, peer: &Peer, board: &mut PromptBoard) {
        board.loading = true;
        board.error = None;

        let outcome = match tokio::time::timeout(self.timeout, self.generator.generate_prompts(peer)).await {
            Ok(Ok(prompts)) if !prompts.is_empty() => Ok(prompts),
            Ok(Ok(_)) => Err(PortError::Unexpected("generator returned no prompts".to_string())),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PortError::Unexpected(format!(
                "prompt generation timed out after {:?}",
                self.timeout
            ))),
        };

        match outcome {
            Ok(prompts) => {
                info!("Loaded {} generated prompts for peer {}", prompts.len(), peer.id);
                board.prompts = prompts;
                board.source = Some(PromptSource::Remote);
            }
            Err(e) => {
                warn!("Prompt generation failed for peer {}, using fallback: {}", peer.id, e);
                board.prompts = fallback_prompts();
                board.source = Some(PromptSource::Fallback);
            }
        }

        board.error = None;
        board.loading = false;
    }

    /// Convenience wrapper returning a fresh board.
    pub async fn load(&self, peer: &Peer) -> PromptBoard {
        let mut board = PromptBoard::new();
        self.load_into(peer, &mut board).await;
        board
    }
}
