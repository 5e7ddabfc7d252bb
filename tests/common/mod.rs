//! Loopback fixture standing in for the game authority.
//!
//! Serves the five authority routes plus the event stream on an
//! ephemeral port, records every request body, and can be told to
//! reject individual operations with a canned message.

// Each test binary compiles its own copy; not all of them use every helper.
#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Shared, inspectable server state.
#[derive(Clone, Default)]
pub struct Authority {
    /// The `game` document served by fetch and echoed by accepted intents.
    pub game: Arc<Mutex<serde_json::Value>>,
    /// Events streamed to each subscriber, as `(kind, payload)` pairs.
    pub events: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    /// Every request received, as `(operation, body)` pairs.
    pub requests: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    /// Operations to reject, mapped to `(status, message)`.
    pub reject: Arc<Mutex<HashMap<String, (u16, String)>>>,
}

impl Authority {
    pub fn new(game: serde_json::Value) -> Self {
        let authority = Self::default();
        *authority.game.lock().unwrap() = game;
        authority
    }

    pub fn push_event(&self, kind: &str, payload: serde_json::Value) {
        self.events.lock().unwrap().push((kind.to_string(), payload));
    }

    pub fn reject_op(&self, op: &str, status: u16, message: &str) {
        self.reject
            .lock()
            .unwrap()
            .insert(op.to_string(), (status, message.to_string()));
    }

    pub fn bodies_for(&self, op: &str) -> Vec<serde_json::Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == op)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn answer(&self, op: &str, body: serde_json::Value) -> axum::response::Response {
        self.requests
            .lock()
            .unwrap()
            .push((op.to_string(), body));
        if let Some((status, message)) = self.reject.lock().unwrap().get(op) {
            let code = StatusCode::from_u16(*status).unwrap();
            return (code, Json(serde_json::json!({ "message": message }))).into_response();
        }
        let game = self.game.lock().unwrap().clone();
        let payload = if op == "move" {
            serde_json::json!({ "message": "Move made successfully", "game": game })
        } else {
            serde_json::json!({ "game": game })
        };
        Json(payload).into_response()
    }
}

async fn fetch(State(authority): State<Authority>, Path(_id): Path<String>) -> impl IntoResponse {
    if let Some((status, message)) = authority.reject.lock().unwrap().get("fetch") {
        let code = StatusCode::from_u16(*status).unwrap();
        return (code, Json(serde_json::json!({ "message": message }))).into_response();
    }
    let game = authority.game.lock().unwrap().clone();
    Json(serde_json::json!({ "game": game })).into_response()
}

async fn submit_move(
    State(authority): State<Authority>,
    Path(_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    authority.answer("move", body)
}

async fn resign(
    State(authority): State<Authority>,
    Path(_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    authority.answer("resign", body)
}

async fn offer_draw(
    State(authority): State<Authority>,
    Path(_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    authority.answer("offer-draw", body)
}

async fn respond_draw(
    State(authority): State<Authority>,
    Path(_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    authority.answer("respond-draw", body)
}

async fn leave(
    State(authority): State<Authority>,
    Path(_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    authority.answer("leave", body)
}

async fn create(
    State(authority): State<Authority>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    authority
        .requests
        .lock()
        .unwrap()
        .push(("create".to_string(), body));
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "game": { "gameId": "fixture-game" } })),
    )
}

async fn join(
    State(authority): State<Authority>,
    Path(_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    authority.answer("join", body)
}

async fn events(
    State(authority): State<Authority>,
    Path(_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    authority
        .requests
        .lock()
        .unwrap()
        .push(("subscribe".to_string(), serde_json::json!(params)));
    let frames: Vec<_> = authority.events.lock().unwrap().clone();
    let stream = futures::stream::iter(frames.into_iter().map(|(kind, payload)| {
        Ok(Event::default().event(kind).data(payload.to_string()))
    }))
    .chain(futures::stream::pending::<Result<Event, Infallible>>());
    Sse::new(stream)
}

/// Starts the fixture and returns its base URL.
pub async fn serve(authority: Authority) -> String {
    let app = Router::new()
        .route("/game/create", post(create))
        .route("/game/join/{id}", post(join))
        .route("/game/{id}", get(fetch))
        .route("/game/{id}/move", post(submit_move))
        .route("/game/{id}/resign", post(resign))
        .route("/game/{id}/offer-draw", post(offer_draw))
        .route("/game/{id}/respond-draw", post(respond_draw))
        .route("/game/{id}/leave", post(leave))
        .route("/game/{id}/events", get(events))
        .with_state(authority);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture listener");
    let addr = listener.local_addr().expect("fixture local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fixture serve");
    });
    format!("http://{addr}")
}

/// An active game document with both seats filled and `to_move` to play.
pub fn active_game(to_move: char) -> serde_json::Value {
    serde_json::json!({
        "fen": format!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR {to_move} KQkq - 0 1"),
        "status": "active",
        "result": null,
        "whitePlayer": { "_id": "alice", "username": "Alice" },
        "blackPlayer": { "_id": "bob", "username": "Bob" },
        "drawOffer": null,
        "moveHistory": []
    })
}

/// Polls `condition` until it holds or the deadline passes.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 5s");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
