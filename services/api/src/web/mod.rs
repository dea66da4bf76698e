pub mod middleware;
pub mod protocol;
pub mod quest_task;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the handlers the binary needs to build the web server router.
pub use middleware::require_auth;
pub use rest::{
    bootstrap_handler, get_peer_handler, leaderboard_handler, list_peers_handler, me_handler,
    update_profile_handler, verify_proof_handler,
};
pub use ws_handler::ws_handler;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// All API routes. Every route requires a valid session.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/quests/ws", get(ws_handler))
        .route("/peers", get(list_peers_handler))
        .route("/peers/{peer_id}", get(get_peer_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/me", get(me_handler))
        .route("/me/bootstrap", post(bootstrap_handler))
        .route("/me/profile", put(update_profile_handler))
        .route("/proofs/verify", post(verify_proof_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ))
        .with_state(app_state)
}
