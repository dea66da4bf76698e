mod common;

use alumni_quest_core::prompts::{PromptSource, QuestionProvider};
use api_lib::adapters::EdgePromptAdapter;
use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use common::peer;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Serves `router` on an ephemeral port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn provider(base_url: String) -> QuestionProvider {
    let adapter = EdgePromptAdapter::new(reqwest::Client::new(), base_url, "anon-key");
    QuestionProvider::new(Arc::new(adapter), Duration::from_secs(8))
}

#[tokio::test]
async fn server_error_falls_back_to_fixed_prompts() {
    let router = Router::new().route(
        "/functions/v1/generate-questions",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "model unavailable" })),
            )
        }),
    );
    let base = serve(router).await;

    let board = provider(base).load(&peer("42", "Priya Shah", "Stripe", "Technology")).await;
    assert!(!board.loading);
    assert_eq!(board.error, None);
    assert_eq!(board.source, Some(PromptSource::Fallback));
    let points: Vec<u32> = board.prompts.iter().map(|p| p.point_value).collect();
    assert_eq!(points, vec![50, 30, 40]);
}

#[tokio::test]
async fn generated_questions_are_used() {
    let router = Router::new().route(
        "/functions/v1/generate-questions",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer anon-key");
            if !authorized || body["userId"] != "42" {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad request" })));
            }
            (
                StatusCode::OK,
                Json(json!({
                    "questions": [
                        { "id": 1, "question": "What drew you to payments?", "points": 45 },
                        { "id": "b", "question": "Best class at school?", "points": 25 }
                    ]
                })),
            )
        }),
    );
    let base = serve(router).await;

    let board = provider(base).load(&peer("42", "Priya Shah", "Stripe", "Technology")).await;
    assert_eq!(board.source, Some(PromptSource::Remote));
    let ids: Vec<&str> = board.prompts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "b"]);
    assert_eq!(board.prompts[0].text, "What drew you to payments?");
}

#[tokio::test]
async fn malformed_body_falls_back() {
    let router = Router::new().route(
        "/functions/v1/generate-questions",
        post(|| async { Json(json!({ "unexpected": true })) }),
    );
    let base = serve(router).await;

    let board = provider(base).load(&peer("42", "Priya Shah", "Stripe", "Technology")).await;
    assert_eq!(board.source, Some(PromptSource::Fallback));
    assert_eq!(board.prompts.len(), 3);
}
