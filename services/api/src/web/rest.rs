//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::PeerView;
use crate::web::state::{AppState, AuthUser};
use alumni_quest_core::bootstrap::{get_or_create_user, Backoff, BootstrapOutcome, RetryPolicy};
use alumni_quest_core::directory::{
    filter_peers, rank_leaderboard, search_peers, DirectoryCategory, LeaderboardFilter, Medal,
};
use alumni_quest_core::domain::UserProfile;
use alumni_quest_core::ports::PortError;
use alumni_quest_core::profile::ProfileUpdate;
use alumni_quest_core::proof::ProofErrorCode;
use alumni_quest_core::routing::{allowed_route, AppRoute};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_peers_handler,
        get_peer_handler,
        leaderboard_handler,
        bootstrap_handler,
        me_handler,
        update_profile_handler,
        verify_proof_handler,
    ),
    components(
        schemas(
            PeerView,
            PeerCategory,
            LeaderboardScope,
            LeaderboardRow,
            MedalView,
            ProfileView,
            MeResponse,
            BootstrapResponse,
            ProfileRequest,
            VerifyProofRequest,
            VerifyProofResponse,
        )
    ),
    tags(
        (name = "Alumni Quest API", description = "Directory, leaderboard, profile and proof endpoints for the alumni networking app.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PeerCategory {
    #[default]
    All,
    Recommended,
    RecentlyMet,
    SameIndustry,
}

impl From<PeerCategory> for DirectoryCategory {
    fn from(c: PeerCategory) -> Self {
        match c {
            PeerCategory::All => DirectoryCategory::All,
            PeerCategory::Recommended => DirectoryCategory::Recommended,
            PeerCategory::RecentlyMet => DirectoryCategory::RecentlyMet,
            PeerCategory::SameIndustry => DirectoryCategory::SameIndustry,
        }
    }
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeerQuery {
    /// Case-insensitive search over name, title, company, batch and industry.
    pub q: Option<String>,
    pub category: Option<PeerCategory>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    #[default]
    Overall,
    Batch,
    Industry,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    pub filter: Option<LeaderboardScope>,
    /// Required when `filter=industry`.
    pub industry: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MedalView {
    Gold,
    Silver,
    Bronze,
}

impl From<Medal> for MedalView {
    fn from(m: Medal) -> Self {
        match m {
            Medal::Gold => MedalView::Gold,
            Medal::Silver => MedalView::Silver,
            Medal::Bronze => MedalView::Bronze,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub medal: Option<MedalView>,
    pub user_id: String,
    pub name: String,
    pub photo: String,
    pub batch: String,
    pub industry: String,
    pub points: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ProfileView {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: String,
    pub title: String,
    pub company: String,
    pub batch: String,
    pub industry: String,
    pub photo: String,
    pub looking_for: Option<String>,
    pub offering: Option<String>,
    pub points: i64,
}

impl From<UserProfile> for ProfileView {
    fn from(u: UserProfile) -> Self {
        Self {
            id: u.id,
            email: u.email,
            phone: u.phone,
            name: u.name,
            title: u.title,
            company: u.company,
            batch: u.batch,
            industry: u.industry,
            photo: u.photo,
            looking_for: u.looking_for,
            offering: u.offering,
            points: u.points,
        }
    }
}

/// The caller's profile and the screen they should be on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct MeResponse {
    pub profile: ProfileView,
    pub route: String,
}

impl MeResponse {
    fn for_user(user: UserProfile) -> Self {
        let route = allowed_route(Some(&user), AppRoute::Home).path().to_string();
        Self {
            profile: user.into(),
            route,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct BootstrapResponse {
    /// Whether the row was `created` now or `found` from an earlier sign-in.
    pub outcome: String,
    pub profile: ProfileView,
    pub route: String,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema)]
#[serde(default)]
pub struct ProfileRequest {
    pub name: String,
    pub title: String,
    pub company: String,
    pub batch: String,
    pub industry: String,
    pub photo: Option<String>,
    pub looking_for: Option<String>,
    pub offering: Option<String>,
    /// Ten digits, optionally with separators or a +91 prefix.
    pub phone: Option<String>,
}

impl From<ProfileRequest> for ProfileUpdate {
    fn from(r: ProfileRequest) -> Self {
        Self {
            name: r.name,
            title: r.title,
            company: r.company,
            batch: r.batch,
            industry: r.industry,
            photo: r.photo,
            looking_for: r.looking_for,
            offering: r.offering,
            phone: r.phone,
        }
    }
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct VerifyProofRequest {
    /// The `signed_token` from a `proof_ready` message.
    pub token: String,
    /// When given, must hash to the response inside the proof.
    pub response: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct VerifyProofResponse {
    pub valid: bool,
    pub peer_id: Option<String>,
    pub prompt_id: Option<String>,
    pub issued_by: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub message: Option<String>,
}

impl VerifyProofResponse {
    fn rejected(code: &str, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            peer_id: None,
            prompt_id: None,
            issued_by: None,
            expires_at: None,
            error_code: Some(code.to_string()),
            message: Some(message.into()),
        }
    }
}

fn error_code_name(code: ProofErrorCode) -> &'static str {
    match code {
        ProofErrorCode::InvalidFormat => "invalid_format",
        ProofErrorCode::UnsupportedVersion => "unsupported_version",
        ProofErrorCode::InvalidSignature => "invalid_signature",
        ProofErrorCode::InvalidPayload => "invalid_payload",
        ProofErrorCode::Expired => "expired",
        ProofErrorCode::ResponseMismatch => "response_mismatch",
        _ => "invalid",
    }
}

fn internal(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the alumni directory.
#[utoipa::path(
    get,
    path = "/peers",
    params(PeerQuery),
    responses(
        (status = 200, description = "Matching peers", body = [PeerView]),
        (status = 401, description = "Missing or expired session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_peers_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<PeerQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let peers = app_state
        .db
        .list_peers()
        .await
        .map_err(|e| internal("Failed to load connections", e))?;
    let viewer = app_state
        .db
        .find_user(&user_id)
        .await
        .map_err(|e| internal("Failed to load profile", e))?;

    let others: Vec<_> = peers.into_iter().filter(|p| p.id != user_id).collect();

    let matched = search_peers(&others, query.q.as_deref().unwrap_or(""));
    let category: DirectoryCategory = query.category.unwrap_or_default().into();
    let views: Vec<PeerView> = filter_peers(matched, category, viewer.as_ref())
        .into_iter()
        .map(PeerView::from)
        .collect();
    Ok(Json(views))
}

/// Fetch one peer, as shown at the top of a connection quest.
#[utoipa::path(
    get,
    path = "/peers/{peer_id}",
    params(("peer_id" = String, Path, description = "The peer's user id.")),
    responses(
        (status = 200, description = "The peer", body = PeerView),
        (status = 404, description = "Connection not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_peer_handler(
    State(app_state): State<Arc<AppState>>,
    Path(peer_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match app_state.db.get_peer_by_id(&peer_id).await {
        Ok(peer) => Ok(Json(PeerView::from(peer))),
        Err(PortError::NotFound(_)) => Err((StatusCode::NOT_FOUND, "Connection not found".to_string())),
        Err(e) => Err(internal("Failed to load connection details", e)),
    }
}

/// Ranked points table.
#[utoipa::path(
    get,
    path = "/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Ranked entries", body = [LeaderboardRow]),
        (status = 400, description = "filter=industry without an industry"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn leaderboard_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let filter = match query.filter.unwrap_or_default() {
        LeaderboardScope::Overall => LeaderboardFilter::Overall,
        LeaderboardScope::Batch => LeaderboardFilter::Batch,
        LeaderboardScope::Industry => {
            let industry = query
                .industry
                .filter(|i| !i.trim().is_empty())
                .ok_or_else(|| (StatusCode::BAD_REQUEST, "industry is required for filter=industry".to_string()))?;
            LeaderboardFilter::Industry(industry)
        }
    };

    let entries = app_state
        .db
        .list_leaderboard()
        .await
        .map_err(|e| internal("Failed to load leaderboard", e))?;
    let viewer = app_state
        .db
        .find_user(&user_id)
        .await
        .map_err(|e| internal("Failed to load profile", e))?;

    let rows: Vec<LeaderboardRow> = rank_leaderboard(entries, &filter, viewer.as_ref())
        .into_iter()
        .map(|ranked| LeaderboardRow {
            rank: ranked.rank,
            medal: ranked.medal.map(MedalView::from),
            user_id: ranked.entry.user_id,
            name: ranked.entry.name,
            photo: ranked.entry.photo,
            batch: ranked.entry.batch,
            industry: ranked.entry.industry,
            points: ranked.entry.points,
        })
        .collect();
    Ok(Json(rows))
}

/// Make sure the signed-in identity has a user row. Safe to call on every sign-in.
#[utoipa::path(
    post,
    path = "/me/bootstrap",
    responses(
        (status = 201, description = "User row created", body = BootstrapResponse),
        (status = 200, description = "User row already existed", body = BootstrapResponse),
        (status = 503, description = "Gave up after the configured number of attempts")
    )
)]
pub async fn bootstrap_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let policy = RetryPolicy {
        max_attempts: app_state.config.bootstrap_max_attempts,
        backoff: Backoff::Fixed(app_state.config.bootstrap_backoff),
    };

    let outcome = get_or_create_user(app_state.db.as_ref(), &user_id, &policy)
        .await
        .map_err(|e| internal("Failed to load user", e))?;

    let (status, label, user) = match outcome {
        BootstrapOutcome::Created(user) => (StatusCode::CREATED, "created", user),
        BootstrapOutcome::Found(user) => (StatusCode::OK, "found", user),
        BootstrapOutcome::Exhausted { attempts, last_error } => {
            warn!("Bootstrap for {} gave up after {} attempts: {:?}", user_id, attempts, last_error);
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                "Could not create your account. Please try again.".to_string(),
            ));
        }
    };
    info!("Bootstrap for {}: {}", user_id, label);

    let me = MeResponse::for_user(user);
    Ok((
        status,
        Json(BootstrapResponse {
            outcome: label.to_string(),
            profile: me.profile,
            route: me.route,
        }),
    ))
}

/// The caller's profile, with the route they are allowed to see.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The caller's profile", body = MeResponse),
        (status = 404, description = "No user row yet; call /me/bootstrap")
    )
)]
pub async fn me_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match app_state.db.find_user(&user_id).await {
        Ok(Some(user)) => Ok(Json(MeResponse::for_user(user))),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Profile not found".to_string())),
        Err(e) => Err(internal("Failed to load profile", e)),
    }
}

/// Complete or edit the caller's profile.
#[utoipa::path(
    put,
    path = "/me/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = MeResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "No user row yet; call /me/bootstrap")
    )
)]
pub async fn update_profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(request): Json<ProfileRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let profile = ProfileUpdate::from(request)
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    match app_state.db.update_profile(&user_id, &profile).await {
        Ok(user) => {
            info!("Profile saved for {}", user_id);
            Ok(Json(MeResponse::for_user(user)))
        }
        Err(PortError::NotFound(_)) => Err((StatusCode::NOT_FOUND, "Profile not found".to_string())),
        Err(e) => Err(internal("Failed to save profile", e)),
    }
}

/// Check a signed proof shown by the other person. Only the peer named in the proof may verify it.
#[utoipa::path(
    post,
    path = "/proofs/verify",
    request_body = VerifyProofRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyProofResponse),
        (status = 503, description = "Proof signing is not configured")
    )
)]
pub async fn verify_proof_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(request): Json<VerifyProofRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let signer = app_state.proof_signer.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Proof verification is not enabled".to_string(),
        )
    })?;

    let response = match signer.verify(&request.token, Utc::now(), request.response.as_deref()) {
        Ok(payload) if payload.peer_id != user_id => {
            warn!("User {} tried to verify a proof meant for {}", user_id, payload.peer_id);
            VerifyProofResponse::rejected("peer_mismatch", "This proof was made for someone else")
        }
        Ok(payload) => VerifyProofResponse {
            valid: true,
            peer_id: Some(payload.peer_id),
            prompt_id: Some(payload.prompt_id),
            issued_by: Some(payload.issued_by),
            expires_at: Some(payload.expires_at),
            error_code: None,
            message: None,
        },
        Err(e) => VerifyProofResponse::rejected(error_code_name(e.code), e.message),
    };
    Ok(Json(response))
}
