//! End-to-end turns through the public API: reducer, HTTP client, simulator.
//!
//! Effects are performed by hand here, the same way the TUI adapter does.

use std::sync::Arc;
use std::time::Duration;

use parley::ask::{AskClient, HttpAskClient};
use parley::core::config::Messages;
use parley::core::message::{MessageId, Role};
use parley::core::{Action, App, Effect, update};
use parley::render::Renderer;
use parley::stream::{
    Body, ScrollController, SharedBody, StreamOutcome, StreamSettings, StreamingSimulator,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fast_stream() -> StreamSettings {
    StreamSettings {
        tick: Duration::from_millis(1),
        render_throttle: Duration::from_millis(2),
        input_scroll_every: 10,
    }
}

async fn mock_answer(server: &MockServer, body: serde_json::Value, status: u16) {
    Mock::given(method("POST"))
        .and(path("/api/chat/ask"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

fn app_for(server: &MockServer) -> (App, Arc<HttpAskClient>) {
    let client = Arc::new(
        HttpAskClient::new(&server.uri(), "/api/chat/ask").expect("mock server URL is valid"),
    );
    (App::new(client.clone(), Messages::default()), client)
}

fn begin(app: &mut App, text: &str) -> (MessageId, String) {
    match update(app, Action::Submit(text.into())) {
        Effect::BeginTurn {
            reply_id, message, ..
        } => (reply_id, message),
        other => panic!("Expected BeginTurn, got {:?}", other),
    }
}

/// Performs the ask effect and feeds the result back into the reducer.
async fn answer(app: &mut App, client: &HttpAskClient, reply_id: MessageId, message: &str) -> Effect {
    let action = match client.ask(message).await {
        Ok(reply) => Action::AskSucceeded {
            reply_id,
            answer: reply.answer,
            truncated: reply.truncated,
        },
        Err(error) => Action::AskFailed { reply_id, error },
    };
    update(app, action)
}

fn body_text(body: &SharedBody) -> String {
    match body.snapshot().expect("body readable").0 {
        Body::Markup(markup) => markup.to_plain_string(),
        Body::Pending => String::new(),
    }
}

// ============================================================================
// Turns
// ============================================================================

#[tokio::test]
async fn test_hello_turn_end_to_end() {
    let server = MockServer::start().await;
    mock_answer(
        &server,
        json!({ "ok": true, "answer": "Hi there", "truncated": false }),
        200,
    )
    .await;
    let (mut app, client) = app_for(&server);

    let (reply_id, message) = begin(&mut app, "hello");
    assert!(app.is_locked());
    assert_eq!(app.store.len(), 1);
    let user = app.store.last().expect("user message appended");
    assert_eq!(user.role, Role::User);
    assert_eq!(user.content, "hello");

    let Effect::StreamReply {
        text, truncated, ..
    } = answer(&mut app, &client, reply_id, &message).await
    else {
        panic!("Expected StreamReply");
    };
    assert!(!truncated);

    let renderer = Renderer::default();
    let scroll = ScrollController::default();
    let mut body = SharedBody::new();
    let mut simulator = StreamingSimulator::new(text.clone(), fast_stream());
    let outcome = simulator
        .run(&renderer, &mut body, &scroll, &CancellationToken::new())
        .await;
    assert_eq!(outcome, StreamOutcome::Completed);
    assert_eq!(body_text(&body), renderer.display(&text).to_plain_string());

    let effect = update(&mut app, Action::StreamFinished { reply_id, outcome });
    assert_eq!(effect, Effect::TurnFinished { reply_id });

    assert!(!app.is_locked());
    assert!(app.accepts_input());
    assert_eq!(app.store.len(), 2);
    let reply = app.store.get(reply_id).expect("assistant message reconciled");
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "Hi there");
    assert!(!reply.truncated);
}

#[tokio::test]
async fn test_truncated_answer_is_reconciled_with_flag() {
    let server = MockServer::start().await;
    mock_answer(
        &server,
        json!({ "ok": true, "answer": "**partial** answer", "truncated": true }),
        200,
    )
    .await;
    let (mut app, client) = app_for(&server);

    let (reply_id, message) = begin(&mut app, "tell me everything");
    let Effect::StreamReply { text, truncated, .. } =
        answer(&mut app, &client, reply_id, &message).await
    else {
        panic!("Expected StreamReply");
    };
    assert!(truncated);

    let mut body = SharedBody::new();
    let outcome = StreamingSimulator::new(text, fast_stream())
        .run(
            &Renderer::default(),
            &mut body,
            &ScrollController::default(),
            &CancellationToken::new(),
        )
        .await;
    update(&mut app, Action::StreamFinished { reply_id, outcome });

    // History holds the authoritative source text, not the rendered form.
    let reply = app.store.get(reply_id).expect("reconciled");
    assert_eq!(reply.content, "**partial** answer");
    assert!(reply.truncated);
    assert_eq!(body_text(&body), "partial answer");
}

#[tokio::test]
async fn test_http_error_becomes_inline_message() {
    let server = MockServer::start().await;
    mock_answer(&server, json!({ "detail": "rate limited" }), 429).await;
    let (mut app, client) = app_for(&server);

    let (reply_id, message) = begin(&mut app, "hello");
    let effect = answer(&mut app, &client, reply_id, &message).await;

    assert_eq!(
        effect,
        Effect::ShowError {
            reply_id,
            message: "rate limited".into()
        }
    );
    assert!(!app.is_locked());
    let reply = app.store.get(reply_id).expect("error recorded as assistant message");
    assert_eq!(reply.content, "rate limited");
    assert_eq!(app.store.len(), 2);
}

#[tokio::test]
async fn test_unreadable_answer_uses_transport_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let (mut app, client) = app_for(&server);

    let (reply_id, message) = begin(&mut app, "hello");
    let effect = answer(&mut app, &client, reply_id, &message).await;

    let expected = Messages::default().transport_error;
    assert_eq!(
        effect,
        Effect::ShowError {
            reply_id,
            message: expected.clone()
        }
    );
    assert_eq!(app.store.get(reply_id).map(|m| m.content.as_str()), Some(expected.as_str()));
}

#[tokio::test]
async fn test_blank_input_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (mut app, _client) = app_for(&server);

    assert_eq!(update(&mut app, Action::Submit("   \n\t ".into())), Effect::None);
    assert_eq!(update(&mut app, Action::Submit(String::new())), Effect::None);
    assert!(app.store.is_empty());
    assert!(!app.is_locked());
}

#[tokio::test]
async fn test_second_submit_ignored_while_locked() {
    let server = MockServer::start().await;
    let (mut app, _client) = app_for(&server);

    begin(&mut app, "first");
    assert_eq!(update(&mut app, Action::Submit("second".into())), Effect::None);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_stream_keeps_history_untouched() {
    // Never contacted: the answer is fed to the reducer directly.
    let client = HttpAskClient::new("http://127.0.0.1:9", "/api/ask").expect("valid URL");
    let mut app = App::new(Arc::new(client), Messages::default());

    let (reply_id, _) = begin(&mut app, "hello");
    let effect = update(
        &mut app,
        Action::AskSucceeded {
            reply_id,
            answer: "a fairly long answer".into(),
            truncated: false,
        },
    );
    let Effect::StreamReply { text, .. } = effect else {
        panic!("Expected StreamReply");
    };

    let token = CancellationToken::new();
    let canceller = token.clone();
    let handle = tokio::spawn(async move {
        let mut body = SharedBody::new();
        StreamingSimulator::new(text, StreamSettings::default())
            .run(&Renderer::plain(), &mut body, &ScrollController::default(), &token)
            .await
    });

    tokio::time::sleep(Duration::from_millis(95)).await;
    assert_eq!(update(&mut app, Action::Cancel), Effect::CancelTurn { reply_id });
    canceller.cancel();

    let outcome = handle.await.expect("stream task");
    let StreamOutcome::Cancelled { revealed } = outcome else {
        panic!("Expected Cancelled, got {:?}", outcome);
    };
    assert!(revealed > 0 && revealed < "a fairly long answer".len());

    // The late completion signal is stale.
    assert_eq!(update(&mut app, Action::StreamFinished { reply_id, outcome }), Effect::None);
    assert!(!app.is_locked());
    assert_eq!(app.store.len(), 1);
    assert!(app.store.get(reply_id).is_none());
}
