//! services/api/src/web/state.rs
//!
//! Defines the application's shared and quest-specific states.

use crate::config::Config;
use alumni_quest_core::domain::Peer;
use alumni_quest_core::ports::{DatabaseService, PortError, PromptGenerationService};
use alumni_quest_core::prompts::{PromptBoard, QuestionProvider};
use alumni_quest_core::proof::ProofSigner;
use alumni_quest_core::quest::InteractionSession;
use alumni_quest_core::settlement::Settlement;
use std::sync::Arc;
use tracing::error;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub question_provider: QuestionProvider,
    /// Present when `PROOF_SECRET` is configured.
    pub proof_signer: Option<ProofSigner>,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        prompt_generator: Arc<dyn PromptGenerationService>,
        config: Arc<Config>,
    ) -> Self {
        let question_provider = QuestionProvider::new(prompt_generator, config.prompt_timeout);
        let proof_signer = config.proof_secret.as_ref().map(|secret| {
            let ttl = chrono::Duration::from_std(config.proof_ttl)
                .unwrap_or_else(|_| chrono::Duration::minutes(10));
            ProofSigner::new(secret.as_bytes().to_vec(), ttl)
        });
        Self {
            db,
            config,
            question_provider,
            proof_signer,
        }
    }
}

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser(pub String);

//=========================================================================================
// QuestState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active quest connection.
pub struct QuestState {
    pub user_id: String,
    pub peer: Peer,
    pub board: PromptBoard,
    /// Created once prompts are loaded.
    pub session: Option<InteractionSession>,
    pub settlement: Settlement,
}

impl QuestState {
    /// Creates a `QuestState` by fetching the target peer.
    ///
    /// Errors are the message shown to the user; they end the quest.
    pub async fn open(app_state: &AppState, user_id: &str, peer_id: Option<&str>) -> Result<Self, String> {
        let peer_id = peer_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "No user ID provided".to_string())?;

        let peer = app_state.db.get_peer_by_id(peer_id).await.map_err(|e| match e {
            PortError::NotFound(_) => "Connection not found".to_string(),
            other => {
                error!("Failed to fetch peer {}: {:?}", peer_id, other);
                "Failed to load connection details".to_string()
            }
        })?;

        Ok(Self {
            user_id: user_id.to_string(),
            peer,
            board: PromptBoard::new(),
            session: None,
            settlement: Settlement::new(app_state.config.settlement_delay),
        })
    }
}
