use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode as HttpStatus,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{domain::ReadingType, error::ErrorCode};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct ServerState {
    reading_tx: Arc<Mutex<Option<oneshot::Sender<Value>>>>,
    reading_reply: Arc<(u16, Value)>,
    reading_hits: Arc<AtomicUsize>,
}

async fn handle_card(Path(card_id): Path<u16>) -> (HttpStatus, Json<Value>) {
    if card_id >= 78 {
        return (
            HttpStatus::NOT_FOUND,
            Json(json!({"error": "Card not found"})),
        );
    }
    (
        HttpStatus::OK,
        Json(json!({
            "id": card_id,
            "name": format!("Card named {card_id}"),
            "element": "Air",
            "keywords": ["journey"],
            "description": "A test card.",
            "image": format!("card_{card_id}.png"),
        })),
    )
}

async fn handle_reading(
    State(state): State<ServerState>,
    Json(payload): Json<Value>,
) -> (HttpStatus, Json<Value>) {
    state.reading_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(tx) = state.reading_tx.lock().await.take() {
        let _ = tx.send(payload);
    }
    let (status, body) = state.reading_reply.as_ref().clone();
    (
        HttpStatus::from_u16(status).unwrap_or(HttpStatus::INTERNAL_SERVER_ERROR),
        Json(body),
    )
}

async fn handle_garbage() -> &'static str {
    "<html>not json</html>"
}

struct MockServer {
    url: String,
    payload_rx: oneshot::Receiver<Value>,
    reading_hits: Arc<AtomicUsize>,
}

async fn spawn_reading_server(status: u16, reply: Value) -> anyhow::Result<MockServer> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let reading_hits = Arc::new(AtomicUsize::new(0));
    let state = ServerState {
        reading_tx: Arc::new(Mutex::new(Some(tx))),
        reading_reply: Arc::new((status, reply)),
        reading_hits: Arc::clone(&reading_hits),
    };
    let app = Router::new()
        .route("/get_card/:card_id", get(handle_card))
        .route("/get_reading", post(handle_reading))
        .route("/garbage", post(handle_garbage))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(MockServer {
        url: format!("http://{addr}"),
        payload_rx: rx,
        reading_hits,
    })
}

fn backend_for(url: &str) -> HttpReadingBackend {
    HttpReadingBackend::new(Settings {
        server_url: url.to_string(),
        ..Settings::default()
    })
    .expect("backend")
}

fn successful_reply() -> Value {
    json!({
        "success": true,
        "reading": "A journey awaits.",
        "cards": [{"id": 5, "name": "The Hierophant", "image": "major_arcana_hierophant.png"}]
    })
}

#[tokio::test]
async fn fetch_card_reads_backend_metadata() {
    let server = spawn_reading_server(200, successful_reply())
        .await
        .expect("spawn server");
    let backend = backend_for(&server.url);

    let card = backend.fetch_card(CardId(12)).await.expect("card");
    assert_eq!(card.id, Some(CardId(12)));
    assert_eq!(card.name, "Card named 12");
    assert_eq!(card.image, "card_12.png");
    assert_eq!(card.keywords, vec!["journey".to_string()]);
}

#[tokio::test]
async fn fetch_card_surfaces_not_found() {
    let server = spawn_reading_server(200, successful_reply())
        .await
        .expect("spawn server");
    let backend = backend_for(&server.url);

    let err = backend.fetch_card(CardId(80)).await.expect_err("must fail");
    match err {
        BackendError::Rejected(exception) => {
            assert_eq!(exception.code, ErrorCode::NotFound);
            assert_eq!(exception.message, "Card not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn reveal_posts_single_card_request_body() {
    let server = spawn_reading_server(200, successful_reply())
        .await
        .expect("spawn server");
    let mut controller = SelectionController::new(
        SessionState::with_deck(Deck::ordered()),
        Arc::new(backend_for(&server.url)),
    );

    controller
        .dispatch(SessionAction::SetQuestion("Will I travel?".to_string()))
        .await;
    controller.dispatch(SessionAction::Begin).await;
    controller.dispatch(SessionAction::ClickCard(CardId(5))).await;
    assert!(controller.state().selection().is_complete());
    assert_eq!(controller.state().selection().selected(), &[CardId(5)]);

    let presentation = controller.dispatch(SessionAction::Reveal).await;

    let payload = server.payload_rx.await.expect("payload");
    assert_eq!(
        payload,
        json!({
            "question": "Will I travel?",
            "selected_cards": [5],
            "reading_type": "1-card",
        })
    );
    assert_eq!(presentation.len(), 1);
    assert_eq!(controller.state().phase(), SessionPhase::Reading);
    assert_eq!(
        controller.state().reading().map(|reading| reading.text.as_str()),
        Some("A journey awaits.")
    );
}

#[tokio::test]
async fn empty_question_issues_no_request() {
    let server = spawn_reading_server(200, successful_reply())
        .await
        .expect("spawn server");
    let mut controller = SelectionController::new(
        SessionState::with_deck(Deck::ordered()),
        Arc::new(backend_for(&server.url)),
    );

    controller
        .dispatch(SessionAction::SetQuestion("Will I travel?".to_string()))
        .await;
    controller.dispatch(SessionAction::Begin).await;
    controller.dispatch(SessionAction::ClickCard(CardId(5))).await;
    controller
        .dispatch(SessionAction::SetQuestion(String::new()))
        .await;
    controller.dispatch(SessionAction::Reveal).await;

    assert_eq!(server.reading_hits.load(Ordering::SeqCst), 0);
    assert!(controller.state().notice().is_some());
}

#[tokio::test]
async fn server_error_envelope_becomes_rejection() {
    let server = spawn_reading_server(
        500,
        json!({"error": "Failed to generate reading. Please try again."}),
    )
    .await
    .expect("spawn server");
    let backend = backend_for(&server.url);

    let err = backend
        .fetch_reading(&ReadingRequest {
            question: "Career?".to_string(),
            selected_cards: vec![CardId(1), CardId(2), CardId(3)],
            reading_type: ReadingType::ThreeCard,
        })
        .await
        .expect_err("must fail");
    assert_eq!(err.to_string(), "Failed to generate reading. Please try again.");
    assert!(matches!(
        err,
        BackendError::Rejected(ApiException {
            code: ErrorCode::Internal,
            ..
        })
    ));
}

#[tokio::test]
async fn non_json_reply_is_malformed() {
    let server = spawn_reading_server(200, successful_reply())
        .await
        .expect("spawn server");
    let backend = HttpReadingBackend::new(Settings {
        server_url: server.url.clone(),
        reading_route: "/garbage".to_string(),
        ..Settings::default()
    })
    .expect("backend");

    let err = backend
        .fetch_reading(&ReadingRequest {
            question: "Career?".to_string(),
            selected_cards: vec![CardId(1)],
            reading_type: ReadingType::OneCard,
        })
        .await
        .expect_err("must fail");
    assert!(matches!(err, BackendError::Malformed { status: 200, .. }));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = backend_for(&format!("http://{addr}"));
    let err = backend.fetch_card(CardId(1)).await.expect_err("must fail");
    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn missing_backend_rejects_everything() {
    let err = MissingReadingBackend
        .fetch_card(CardId(0))
        .await
        .expect_err("must fail");
    assert!(matches!(err, BackendError::Unavailable));
}
