//! crates/alumni_quest_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the hosted backend, its edge functions, or any LLM.

use async_trait::async_trait;
use crate::domain::{LeaderboardEntry, Peer, Prompt, UserProfile};
use crate::profile::ValidProfile;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A row with the same key already exists.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Peers (the `all_connections` view) ---
    async fn get_peer_by_id(&self, peer_id: &str) -> PortResult<Peer>;

    async fn list_peers(&self) -> PortResult<Vec<Peer>>;

    // --- Users ---
    /// Returns `Ok(None)` when no row exists.
    async fn find_user(&self, user_id: &str) -> PortResult<Option<UserProfile>>;

    /// Inserts a new row. Fails with `PortError::Conflict` if the id is taken.
    async fn insert_user(&self, user: &UserProfile) -> PortResult<UserProfile>;

    async fn update_profile(&self, user_id: &str, profile: &ValidProfile) -> PortResult<UserProfile>;

    // --- Auth ---
    /// Resolves a bearer session token to the owning user id.
    async fn validate_auth_session(&self, token: &str) -> PortResult<String>;

    // --- Projections ---
    async fn list_leaderboard(&self) -> PortResult<Vec<LeaderboardEntry>>;
}

#[async_trait]
pub trait PromptGenerationService: Send + Sync {
    /// Generates candidate prompts to ask the given peer.
    async fn generate_prompts(&self, peer: &Peer) -> PortResult<Vec<Prompt>>;
}
