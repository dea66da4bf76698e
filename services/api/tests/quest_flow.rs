mod common;

use alumni_quest_core::domain::Prompt;
use alumni_quest_core::proof::ProofSigner;
use api_lib::web::protocol::{ClientMessage, PromptSourceView, ServerMessage, StageView};
use api_lib::web::quest_task::{quest_process, QuestOutcome};
use api_lib::web::state::AppState;
use chrono::Utc;
use common::{app_state, peer, InMemoryDb, StubGenerator, SECRET};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct Harness {
    inbox: mpsc::Sender<ClientMessage>,
    outbox: mpsc::UnboundedReceiver<ServerMessage>,
    cancel: CancellationToken,
    task: JoinHandle<QuestOutcome>,
}

impl Harness {
    fn start(state: Arc<AppState>) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::channel(32);
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(quest_process(
            state,
            "me".to_string(),
            inbox_rx,
            outbox_tx,
            cancel.clone(),
        ));
        Self {
            inbox: inbox_tx,
            outbox: outbox_rx,
            cancel,
            task,
        }
    }

    async fn send(&self, message: ClientMessage) {
        self.inbox.send(message).await.unwrap();
    }

    async fn next(&mut self) -> ServerMessage {
        self.outbox.recv().await.expect("quest ended early")
    }

    /// Everything still to come, once the task has finished.
    async fn drain(mut self) -> (QuestOutcome, Vec<ServerMessage>) {
        let outcome = self.task.await.unwrap();
        let mut rest = Vec::new();
        while let Some(m) = self.outbox.recv().await {
            rest.push(m);
        }
        (outcome, rest)
    }
}

fn open(peer_id: &str) -> ClientMessage {
    ClientMessage::Open {
        peer_id: Some(peer_id.to_string()),
    }
}

fn db() -> InMemoryDb {
    InMemoryDb::default().with_peer(peer("42", "Priya Shah", "Stripe", "Technology"))
}

/// Skips past peer_loaded and prompts_loading, returning the prompts_ready message.
async fn until_prompts(h: &mut Harness) -> ServerMessage {
    assert!(matches!(h.next().await, ServerMessage::PeerLoaded { .. }));
    assert_eq!(h.next().await, ServerMessage::PromptsLoading);
    h.next().await
}

#[tokio::test(start_paused = true)]
async fn full_quest_settles_once_after_delay() {
    let mut h = Harness::start(app_state(db(), StubGenerator::Fail, None));
    h.send(open("42")).await;

    match h.next().await {
        ServerMessage::PeerLoaded { peer } => assert_eq!(peer.name, "Priya Shah"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(h.next().await, ServerMessage::PromptsLoading);
    match h.next().await {
        ServerMessage::PromptsReady { prompts, source } => {
            assert_eq!(source, PromptSourceView::Fallback);
            let points: Vec<u32> = prompts.iter().map(|p| p.points).collect();
            assert_eq!(points, vec![50, 30, 40]);
        }
        other => panic!("unexpected {:?}", other),
    }

    h.send(ClientMessage::SelectPrompt { prompt_id: "2".into() }).await;
    h.send(ClientMessage::Continue).await;
    h.send(ClientMessage::SubmitResponse { text: "It was great!".into() }).await;
    assert_eq!(h.next().await, ServerMessage::PromptSelected { prompt_id: "2".into() });
    assert_eq!(h.next().await, ServerMessage::StageChanged { stage: StageView::Responding });
    assert_eq!(h.next().await, ServerMessage::StageChanged { stage: StageView::Proving });
    assert_eq!(
        h.next().await,
        ServerMessage::ProofReady {
            token: "42:2:It%20was%20great!".into(),
            signed_token: None,
        }
    );

    let confirmed_at = Instant::now();
    h.send(ClientMessage::Confirm).await;
    h.send(ClientMessage::Confirm).await;
    h.send(ClientMessage::Confirm).await;
    assert_eq!(h.next().await, ServerMessage::Settling);

    let inbox = h.inbox.clone();
    let (outcome, rest) = h.drain().await;
    assert_eq!(outcome, QuestOutcome::Settled);
    assert_eq!(rest, vec![ServerMessage::Closed]);
    assert!(confirmed_at.elapsed() >= Duration::from_millis(1500));
    drop(inbox);
}

#[tokio::test(start_paused = true)]
async fn generated_prompts_are_offered() {
    let generated = vec![Prompt::new("7", "How did you land at Stripe?", 45)];
    let mut h = Harness::start(app_state(db(), StubGenerator::Succeed(generated), None));
    h.send(open("42")).await;

    match until_prompts(&mut h).await {
        ServerMessage::PromptsReady { prompts, source } => {
            assert_eq!(source, PromptSourceView::Remote);
            assert_eq!(prompts.len(), 1);
            assert_eq!(prompts[0].id, "7");
            assert_eq!(prompts[0].question, "How did you land at Stripe?");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_generator_falls_back_after_timeout() {
    let mut h = Harness::start(app_state(db(), StubGenerator::Hang, None));
    let started = Instant::now();
    h.send(open("42")).await;

    match until_prompts(&mut h).await {
        ServerMessage::PromptsReady { prompts, source } => {
            assert_eq!(source, PromptSourceView::Fallback);
            assert_eq!(prompts.len(), 3);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(started.elapsed() >= Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn guards_report_inline_errors_and_back_exits() {
    let mut h = Harness::start(app_state(db(), StubGenerator::Fail, None));
    h.send(open("42")).await;
    until_prompts(&mut h).await;

    h.send(ClientMessage::Continue).await;
    assert_eq!(
        h.next().await,
        ServerMessage::ValidationError { message: "Please select a question first".into() }
    );

    h.send(ClientMessage::SelectPrompt { prompt_id: "1".into() }).await;
    h.send(ClientMessage::Continue).await;
    h.send(ClientMessage::SubmitResponse { text: "   ".into() }).await;
    assert_eq!(h.next().await, ServerMessage::PromptSelected { prompt_id: "1".into() });
    assert_eq!(h.next().await, ServerMessage::StageChanged { stage: StageView::Responding });
    assert_eq!(
        h.next().await,
        ServerMessage::ValidationError { message: "Please provide an answer".into() }
    );

    h.send(ClientMessage::Back).await;
    assert_eq!(h.next().await, ServerMessage::StageChanged { stage: StageView::Selecting });
    h.send(ClientMessage::Back).await;

    let (outcome, rest) = h.drain().await;
    assert_eq!(outcome, QuestOutcome::Cancelled);
    assert_eq!(rest, vec![ServerMessage::Closed]);
}

#[tokio::test(start_paused = true)]
async fn confirm_before_proving_is_rejected() {
    let mut h = Harness::start(app_state(db(), StubGenerator::Fail, None));
    h.send(open("42")).await;
    until_prompts(&mut h).await;

    h.send(ClientMessage::Confirm).await;
    assert!(matches!(h.next().await, ServerMessage::ValidationError { .. }));
    h.send(ClientMessage::Cancel).await;
    let (outcome, rest) = h.drain().await;
    assert_eq!(outcome, QuestOutcome::Cancelled);
    assert_eq!(rest, vec![ServerMessage::Closed]);
}

#[tokio::test(start_paused = true)]
async fn close_while_loading_discards_prompts() {
    let mut h = Harness::start(app_state(db(), StubGenerator::Hang, None));
    h.send(open("42")).await;
    assert!(matches!(h.next().await, ServerMessage::PeerLoaded { .. }));
    assert_eq!(h.next().await, ServerMessage::PromptsLoading);

    h.cancel.cancel();
    let (outcome, rest) = h.drain().await;
    assert_eq!(outcome, QuestOutcome::Abandoned);
    assert!(rest.is_empty());
}

#[tokio::test(start_paused = true)]
async fn close_during_settlement_never_emits_closed() {
    let mut h = Harness::start(app_state(db(), StubGenerator::Fail, None));
    h.send(open("42")).await;
    until_prompts(&mut h).await;
    h.send(ClientMessage::SelectPrompt { prompt_id: "3".into() }).await;
    h.send(ClientMessage::Continue).await;
    h.send(ClientMessage::SubmitResponse { text: "Graduation day".into() }).await;
    h.send(ClientMessage::Confirm).await;
    for _ in 0..4 {
        h.next().await;
    }
    assert_eq!(h.next().await, ServerMessage::Settling);

    h.cancel.cancel();
    let (outcome, rest) = h.drain().await;
    assert_eq!(outcome, QuestOutcome::Abandoned);
    assert!(rest.is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_or_unknown_peer_ends_the_quest() {
    let mut h = Harness::start(app_state(db(), StubGenerator::Fail, None));
    h.send(ClientMessage::Open { peer_id: None }).await;
    assert_eq!(h.next().await, ServerMessage::Error { message: "No user ID provided".into() });
    assert_eq!(h.drain().await.0, QuestOutcome::Failed);

    let mut h = Harness::start(app_state(db(), StubGenerator::Fail, None));
    h.send(open("nobody")).await;
    assert_eq!(h.next().await, ServerMessage::Error { message: "Connection not found".into() });
    assert_eq!(h.drain().await.0, QuestOutcome::Failed);
}

#[tokio::test(start_paused = true)]
async fn signed_proof_verifies_for_the_peer() {
    let mut h = Harness::start(app_state(db(), StubGenerator::Fail, Some(SECRET)));
    h.send(open("42")).await;
    until_prompts(&mut h).await;
    h.send(ClientMessage::SelectPrompt { prompt_id: "1".into() }).await;
    h.send(ClientMessage::Continue).await;
    h.send(ClientMessage::SubmitResponse { text: "Series A".into() }).await;
    for _ in 0..3 {
        h.next().await;
    }

    let signed = match h.next().await {
        ServerMessage::ProofReady { token, signed_token } => {
            assert_eq!(token, "42:1:Series%20A");
            signed_token.expect("signing is configured")
        }
        other => panic!("unexpected {:?}", other),
    };

    let signer = ProofSigner::new(SECRET.as_bytes().to_vec(), chrono::Duration::minutes(10));
    let payload = signer.verify(&signed, Utc::now(), Some("Series A")).unwrap();
    assert_eq!(payload.peer_id, "42");
    assert_eq!(payload.prompt_id, "1");
    assert_eq!(payload.issued_by, "me");
}
