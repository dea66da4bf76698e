//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the app and the API server
//! for a connection quest. One socket carries exactly one quest.

use alumni_quest_core::domain::{Peer, Prompt};
use alumni_quest_core::prompts::PromptSource;
use alumni_quest_core::quest::Stage;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Messages Sent FROM the Client (App) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens the quest against a peer. This must be the first message sent on the connection.
    Open {
        #[serde(default)]
        peer_id: Option<String>,
    },

    /// Picks one of the offered prompts. Only valid while selecting.
    SelectPrompt { prompt_id: String },

    /// Moves from selecting to responding.
    Continue,

    /// Records the answer and moves on to the proof.
    SubmitResponse { text: String },

    /// One stage back; from the first stage this closes the quest.
    Back,

    /// The peer has seen the proof. Starts settlement.
    Confirm,

    /// Leaves the quest without settling.
    Cancel,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (App)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The target peer was found.
    PeerLoaded { peer: PeerView },

    /// Prompt generation has started; show a loading indicator.
    PromptsLoading,

    /// Prompts are available. Loading is over whatever the source.
    PromptsReady {
        prompts: Vec<PromptView>,
        source: PromptSourceView,
    },

    PromptSelected { prompt_id: String },

    StageChanged { stage: StageView },

    /// The value to render as a barcode, plus the signed envelope when enabled.
    ProofReady {
        token: String,
        signed_token: Option<String>,
    },

    /// An inline, non-blocking message. The stage is unchanged.
    ValidationError { message: String },

    /// The proof was accepted; `Closed` follows after the settlement delay.
    Settling,

    /// Return to the caller. Sent at most once per quest.
    Closed,

    /// Reports a fatal error to the client, which should display it and go back.
    Error { message: String },
}

//=========================================================================================
// Shared Views
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct PeerView {
    pub id: String,
    pub name: String,
    pub photo: String,
    pub title: String,
    pub company: String,
    pub batch: String,
    pub industry: String,
    pub looking: Option<String>,
    pub offering: Option<String>,
}

impl From<Peer> for PeerView {
    fn from(p: Peer) -> Self {
        Self {
            id: p.id,
            name: p.name,
            photo: p.photo,
            title: p.title,
            company: p.company,
            batch: p.batch,
            industry: p.industry,
            looking: p.looking,
            offering: p.offering,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct PromptView {
    pub id: String,
    pub question: String,
    pub points: u32,
}

impl From<&Prompt> for PromptView {
    fn from(p: &Prompt) -> Self {
        Self {
            id: p.id.clone(),
            question: p.text.clone(),
            points: p.point_value,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptSourceView {
    Remote,
    Fallback,
}

impl From<PromptSource> for PromptSourceView {
    fn from(s: PromptSource) -> Self {
        match s {
            PromptSource::Remote => PromptSourceView::Remote,
            PromptSource::Fallback => PromptSourceView::Fallback,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageView {
    Selecting,
    Responding,
    Proving,
}

impl From<Stage> for StageView {
    fn from(s: Stage) -> Self {
        match s {
            Stage::Selecting => StageView::Selecting,
            Stage::Responding => StageView::Responding,
            Stage::Proving => StageView::Proving,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let open: ClientMessage = serde_json::from_str(r#"{"type":"open","peer_id":"42"}"#).unwrap();
        assert_eq!(open, ClientMessage::Open { peer_id: Some("42".into()) });
        let bare: ClientMessage = serde_json::from_str(r#"{"type":"open"}"#).unwrap();
        assert_eq!(bare, ClientMessage::Open { peer_id: None });
        let submit: ClientMessage =
            serde_json::from_str(r#"{"type":"submit_response","text":"hi"}"#).unwrap();
        assert_eq!(submit, ClientMessage::SubmitResponse { text: "hi".into() });
    }

    #[test]
    fn server_messages_serialize_flat() {
        let json = serde_json::to_value(ServerMessage::StageChanged { stage: StageView::Proving }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "stage_changed", "stage": "proving"}));
        let json = serde_json::to_value(ServerMessage::Closed).unwrap();
        assert_eq!(json, serde_json::json!({"type": "closed"}));
    }
}
