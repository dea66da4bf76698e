mod common;

use alumni_quest_core::domain::UserProfile;
use api_lib::web::{self, protocol::ServerMessage, ws_handler::quest_guard};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{app_state, peer, user, InMemoryDb, StubGenerator};
use tower::ServiceExt;

const TOKEN: &str = "session-token";

fn refused(message: &str) -> Result<(), ServerMessage> {
    Err(ServerMessage::Error {
        message: message.to_string(),
    })
}

fn upgrade_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::CONNECTION, "upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::SEC_WEBSOCKET_VERSION, "13")
        .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn completed_profile_may_start_a_quest() {
    let db = InMemoryDb::default().with_user(user("me", "Me", "2021", "Technology", 0));
    let state = app_state(db, StubGenerator::Fail, None);

    assert_eq!(quest_guard(&state, "me").await, Ok(()));
}

#[tokio::test]
async fn unfinished_or_missing_profiles_are_redirected() {
    let db = InMemoryDb::default().with_user(UserProfile::blank("new"));
    let state = app_state(db, StubGenerator::Fail, None);

    assert_eq!(
        quest_guard(&state, "new").await,
        refused("Redirect to /auth/complete-profile")
    );
    assert_eq!(quest_guard(&state, "ghost").await, refused("Redirect to /auth"));
}

#[tokio::test]
async fn profile_lookup_failure_is_not_a_sign_out() {
    let db = InMemoryDb::default()
        .with_user(user("me", "Me", "2021", "Technology", 0))
        .with_users_unavailable();
    let state = app_state(db, StubGenerator::Fail, None);

    assert_eq!(
        quest_guard(&state, "me").await,
        refused("Failed to load your profile.")
    );
}

#[tokio::test]
async fn socket_accepts_query_token() {
    let db = InMemoryDb::default()
        .with_session(TOKEN, "me")
        .with_user(user("me", "Me", "2021", "Technology", 0))
        .with_peer(peer("42", "Priya Shah", "Stripe", "Technology"));
    let app = web::router(app_state(db, StubGenerator::Fail, None));

    // No real connection sits behind a oneshot request, so the upgrade itself
    // cannot finish. Getting past the auth layer is what matters here.
    let response = app
        .clone()
        .oneshot(upgrade_request("/quests/ws?access_token=session-token"))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    assert_ne!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .clone()
        .oneshot(upgrade_request("/quests/ws?access_token=stale"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(upgrade_request("/quests/ws")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
