//! services/api/src/web/quest_task.rs
//!
//! Drives one connection quest: load the peer and their prompts, walk the
//! select / respond / prove stages, then settle and close.
//!
//! The task talks to the socket only through channels so that it can be driven
//! directly in tests.

use super::protocol::{ClientMessage, PromptView, ServerMessage};
use super::state::{AppState, QuestState};
use alumni_quest_core::prompts::PromptSource;
use alumni_quest_core::quest::{BackOutcome, InteractionSession};
use alumni_quest_core::settlement::sleep_until_deadline;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How a quest ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestOutcome {
    /// The proof was confirmed and the settlement delay elapsed.
    Settled,
    /// The user backed out or cancelled.
    Cancelled,
    /// The connection went away first. Nothing further is emitted.
    Abandoned,
    /// The quest could not be opened.
    Failed,
}

pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

fn emit(outbox: &Outbox, message: ServerMessage) {
    if outbox.send(message).is_err() {
        debug!("Outbox closed; dropping server message.");
    }
}

/// The main quest loop for one connection.
pub async fn quest_process(
    app_state: Arc<AppState>,
    user_id: String,
    mut inbox: mpsc::Receiver<ClientMessage>,
    outbox: Outbox,
    cancel: CancellationToken,
) -> QuestOutcome {
    info!("Quest process started for user {}", user_id);

    // --- 1. The first message must open the quest ---
    let peer_id = tokio::select! {
        _ = cancel.cancelled() => return QuestOutcome::Abandoned,
        message = inbox.recv() => match message {
            Some(ClientMessage::Open { peer_id }) => peer_id,
            Some(other) => {
                warn!("Expected an open message, got {:?}", other);
                emit(&outbox, ServerMessage::Error {
                    message: "The first message must open a quest.".to_string(),
                });
                return QuestOutcome::Failed;
            }
            None => return QuestOutcome::Abandoned,
        }
    };

    let opened = tokio::select! {
        _ = cancel.cancelled() => return QuestOutcome::Abandoned,
        opened = QuestState::open(&app_state, &user_id, peer_id.as_deref()) => opened,
    };
    let mut state = match opened {
        Ok(state) => state,
        Err(message) => {
            warn!("Quest for user {} could not be opened: {}", user_id, message);
            emit(&outbox, ServerMessage::Error { message });
            return QuestOutcome::Failed;
        }
    };
    emit(&outbox, ServerMessage::PeerLoaded { peer: state.peer.clone().into() });

    // --- 2. Load prompts; a close during loading discards the result ---
    emit(&outbox, ServerMessage::PromptsLoading);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("Quest for peer {} closed while prompts were loading.", state.peer.id);
            return QuestOutcome::Abandoned;
        }
        _ = app_state.question_provider.load_into(&state.peer, &mut state.board) => {}
    }

    let source = state.board.source.unwrap_or(PromptSource::Fallback);
    emit(&outbox, ServerMessage::PromptsReady {
        prompts: state.board.prompts.iter().map(PromptView::from).collect(),
        source: source.into(),
    });
    state.session = Some(InteractionSession::new(state.peer.id.clone(), state.board.prompts.clone()));

    // --- 3. Stage loop ---
    loop {
        let deadline = state.settlement.deadline();
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Quest for peer {} abandoned.", state.peer.id);
                return QuestOutcome::Abandoned;
            }
            _ = sleep_until_deadline(deadline) => {
                if state.settlement.complete() {
                    info!("Quest between {} and {} settled.", state.user_id, state.peer.id);
                    emit(&outbox, ServerMessage::Closed);
                    return QuestOutcome::Settled;
                }
            }
            message = inbox.recv() => match message {
                Some(message) => {
                    if let Some(outcome) = handle_message(&app_state, &mut state, message, &outbox) {
                        return outcome;
                    }
                }
                None => {
                    info!("Quest inbox closed for peer {}.", state.peer.id);
                    return QuestOutcome::Abandoned;
                }
            }
        }
    }
}

/// Applies one client message. Returns an outcome when the quest ends.
fn handle_message(
    app_state: &AppState,
    state: &mut QuestState,
    message: ClientMessage,
    outbox: &Outbox,
) -> Option<QuestOutcome> {
    if state.settlement.deadline().is_some() {
        debug!("Ignoring {:?} during settlement.", message);
        return None;
    }
    let Some(session) = state.session.as_mut() else {
        return None;
    };

    match message {
        ClientMessage::Open { .. } => {
            warn!("Quest already open; ignoring repeated open.");
        }
        ClientMessage::SelectPrompt { prompt_id } => match session.select_prompt(&prompt_id) {
            Ok(()) => emit(outbox, ServerMessage::PromptSelected { prompt_id }),
            Err(e) => emit(outbox, ServerMessage::ValidationError { message: e.to_string() }),
        },
        ClientMessage::Continue => match session.continue_to_responding() {
            Ok(stage) => emit(outbox, ServerMessage::StageChanged { stage: stage.into() }),
            Err(e) => emit(outbox, ServerMessage::ValidationError { message: e.to_string() }),
        },
        ClientMessage::SubmitResponse { text } => {
            let advanced = session
                .set_response(text)
                .and_then(|_| session.continue_to_proving());
            match advanced {
                Ok(stage) => {
                    emit(outbox, ServerMessage::StageChanged { stage: stage.into() });
                    if let Some(token) = session.proof_token() {
                        let signed_token = app_state.proof_signer.as_ref().and_then(|signer| {
                            signer
                                .issue(&token, &state.user_id, Utc::now())
                                .map_err(|e| error!("Failed to sign proof token: {}", e))
                                .ok()
                        });
                        emit(outbox, ServerMessage::ProofReady {
                            token: token.encode(),
                            signed_token,
                        });
                    }
                }
                Err(e) => emit(outbox, ServerMessage::ValidationError { message: e.to_string() }),
            }
        }
        ClientMessage::Back => match session.back() {
            BackOutcome::Stage(stage) => emit(outbox, ServerMessage::StageChanged { stage: stage.into() }),
            BackOutcome::Exit => {
                emit(outbox, ServerMessage::Closed);
                return Some(QuestOutcome::Cancelled);
            }
        },
        ClientMessage::Cancel => {
            emit(outbox, ServerMessage::Closed);
            return Some(QuestOutcome::Cancelled);
        }
        ClientMessage::Confirm => match session.confirm() {
            Ok(()) => {
                if state.settlement.begin() {
                    info!("Proof for peer {} accepted; settling.", state.peer.id);
                    emit(outbox, ServerMessage::Settling);
                }
            }
            Err(e) => emit(outbox, ServerMessage::ValidationError { message: e.to_string() }),
        },
    }
    None
}
