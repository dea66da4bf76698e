//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::state::{AppState, AuthUser};
use alumni_quest_core::ports::PortError;

/// Pulls the session token from `Authorization: Bearer ...`, or from the
/// `access_token` query parameter for WebSocket clients that cannot set headers.
fn session_token(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    from_header
        .or_else(|| {
            let raw = req
                .uri()
                .query()?
                .split('&')
                .find_map(|pair| pair.strip_prefix("access_token="))?;
            percent_decode_str(raw).decode_utf8().ok().map(|t| t.into_owned())
        })
        .filter(|t| !t.is_empty())
}

/// Middleware that validates the auth session token and extracts the user id.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state.db.validate_auth_session(&token).await.map_err(|e| match e {
        PortError::Unauthorized => {
            warn!("Rejected request with an unknown or expired session.");
            StatusCode::UNAUTHORIZED
        }
        other => {
            error!("Failed to validate auth session: {:?}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
