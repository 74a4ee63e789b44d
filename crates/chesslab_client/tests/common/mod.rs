#![allow(dead_code)]

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use chesslab_client::{HttpRemote, SyncCore, SyncOptions, UciEngine};
use chesslab_domain::{EngineMode, EngineSettings, StudyState};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// In-process stand-in for the study server.
///
/// Openings: 1 (one line, three moves), 2 (lines endpoint fails),
/// 3 (nodes payload is garbled), 4 (no lines).
pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    task: tokio::task::JoinHandle<()>,
}

pub struct MockState {
    lines: Mutex<HashMap<u64, Vec<Value>>>,
    pub eval_queries: Mutex<Vec<HashMap<String, String>>>,
    pub submissions: Mutex<Vec<Value>>,
    pub upgrades: AtomicUsize,
    eval_override: Mutex<Option<Value>>,
    pushes: broadcast::Sender<String>,
    kicks: broadcast::Sender<()>,
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl MockServer {
    pub async fn start() -> Self {
        let (pushes, _) = broadcast::channel(16);
        let (kicks, _) = broadcast::channel(4);
        let mut lines = HashMap::new();
        lines.insert(1, vec![line(10, 1, "Main line", true)]);
        lines.insert(3, vec![line(30, 3, "Garbled", true)]);
        lines.insert(4, Vec::new());

        let state = Arc::new(MockState {
            lines: Mutex::new(lines),
            eval_queries: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            upgrades: AtomicUsize::new(0),
            eval_override: Mutex::new(None),
            pushes,
            kicks,
        });

        let app = Router::new()
            .route("/api/openings", get(list_openings).post(create_opening))
            .route(
                "/api/openings/{id}/lines",
                get(list_lines).post(create_line),
            )
            .route("/api/lines/{id}/nodes", get(list_nodes).post(add_node))
            .route("/api/eval", get(pull_eval).post(submit_eval))
            .route("/api/import/pgn", post(import_pgn))
            .route("/api/export/pgn/{id}", get(export_pgn))
            .route("/live", get(live))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            task,
        }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn live_url(&self) -> String {
        format!("ws://{}/live", self.addr)
    }

    pub fn core(&self, mode: EngineMode) -> SyncCore<HttpRemote> {
        self.core_with_engine(mode, None)
    }

    pub fn core_with_engine(
        &self,
        mode: EngineMode,
        local_engine: Option<UciEngine>,
    ) -> SyncCore<HttpRemote> {
        let remote = HttpRemote::new(&self.api_url()).unwrap();
        SyncCore::new(
            remote,
            SyncOptions {
                settings: EngineSettings::new(mode, 12, 3),
                live_url: self.live_url(),
                local_engine,
            },
        )
    }

    /// Every later `GET /eval` answers with `reply`, whatever the node.
    pub fn set_eval_reply(&self, reply: Value) {
        *self.state.eval_override.lock().unwrap() = Some(reply);
    }

    /// Closes every open live connection from the server side.
    pub fn drop_live_connections(&self) {
        let _ = self.state.kicks.send(());
    }

    pub fn live_subscribers(&self) -> usize {
        self.state.pushes.receiver_count()
    }

    pub fn push(&self, message: Value) {
        self.push_raw(message.to_string());
    }

    pub fn push_raw(&self, text: String) {
        self.state.pushes.send(text).unwrap();
    }
}

pub fn line(id: u64, opening_id: u64, title: &str, is_main: bool) -> Value {
    json!({ "id": id, "opening_id": opening_id, "title": title, "is_main": is_main })
}

pub fn entry(multipv: u32, score_cp: i32, pv: &str) -> Value {
    json!({
        "depth": 12,
        "multipv": multipv,
        "pv_uci": pv,
        "score_cp": score_cp,
        "bestmove_uci": pv.split_whitespace().next(),
    })
}

pub async fn wait_until(core: &SyncCore<HttpRemote>, check: impl Fn(&StudyState) -> bool) {
    let mut events = core.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if check(&core.snapshot()) {
                return;
            }
            let _ = events.recv().await;
        }
    })
    .await
    .expect("state condition not reached in time");
}

pub async fn wait_for(check: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn list_openings() -> Json<Value> {
    Json(json!([
        { "id": 1, "name": "Italian Game", "side": "white", "tags": "e4" },
        { "id": 2, "name": "Broken", "side": "white" },
        { "id": 3, "name": "Garbled", "side": "black" },
        { "id": 4, "name": "Empty", "side": "black" },
    ]))
}

async fn list_lines(State(state): State<Arc<MockState>>, Path(id): Path<u64>) -> Response {
    if id == 2 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "lines unavailable").into_response();
    }
    let lines = state.lines.lock().unwrap();
    Json(Value::Array(lines.get(&id).cloned().unwrap_or_default())).into_response()
}

async fn list_nodes(Path(id): Path<u64>) -> Response {
    match id {
        10 => Json(json!([
            { "id": 102, "line_id": 10, "parent_id": 101, "san": "Nf3", "ply": 3,
              "fen": "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2" },
            { "id": 100, "line_id": 10, "san": "e4", "ply": 1,
              "fen": "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1" },
            { "id": 101, "line_id": 10, "parent_id": 100, "san": "e5", "ply": 2,
              "fen": "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2" },
        ]))
        .into_response(),
        11 => Json(json!([
            { "id": 110, "line_id": 11, "san": "d4", "ply": 1,
              "fen": "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1" },
        ]))
        .into_response(),
        30 => "{\"id\": ".into_response(),
        _ => Json(json!([])).into_response(),
    }
}

async fn pull_eval(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let node_id = query.get("node_id").cloned().unwrap_or_default();
    state.eval_queries.lock().unwrap().push(query);
    if let Some(reply) = state.eval_override.lock().unwrap().clone() {
        return Json(reply);
    }
    let reply = match node_id.as_str() {
        "102" => json!([
            entry(1, 35, "b8c6 f1c4"),
            entry(2, 20, "g8f6 d2d3"),
            entry(3, -10, "d7d6 d2d4"),
        ]),
        "101" => json!({ "pending": true }),
        _ => json!([]),
    };
    Json(reply)
}

async fn submit_eval(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    let evals = body.get("evals").cloned().unwrap_or(json!([]));
    state.submissions.lock().unwrap().push(body);
    Json(json!({ "saved": true, "evals": evals }))
}

async fn create_opening(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": 9,
        "name": body["name"],
        "side": body["side"],
        "tags": body["tags"],
    }))
}

async fn create_line(Path(id): Path<u64>, Json(body): Json<Value>) -> Json<Value> {
    let title = body["title"].as_str().unwrap_or_default();
    Json(line(90, id, title, body["is_main"].as_bool().unwrap_or(false)))
}

async fn add_node(Path(id): Path<u64>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": 103,
        "line_id": id,
        "parent_id": body["parent_id"],
        "san": body["san"],
        "ply": 4,
        "fen": "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        "comment": body["comment"],
    }))
}

async fn import_pgn(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Value> {
    let opening_id = body["opening_id"].as_u64().unwrap_or_default();
    let title = body["title"].as_str().unwrap_or("Imported").to_owned();
    state
        .lines
        .lock()
        .unwrap()
        .entry(opening_id)
        .or_default()
        .push(line(11, opening_id, &title, false));
    Json(json!({ "line_id": 11, "ply_count": 1 }))
}

async fn export_pgn(Path(id): Path<u64>) -> Response {
    if id == 10 {
        "1. e4 e5 2. Nf3 *".into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn live(ws: WebSocketUpgrade, State(state): State<Arc<MockState>>) -> impl IntoResponse {
    state.upgrades.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| live_task(socket, state))
}

async fn live_task(mut socket: WebSocket, state: Arc<MockState>) {
    let mut rx = state.pushes.subscribe();
    let mut kicks = state.kicks.subscribe();
    let kicked = loop {
        tokio::select! {
            _ = kicks.recv() => break true,
            incoming = socket.recv() => {
                let Some(Ok(msg)) = incoming else { break false };
                if matches!(msg, Message::Close(_)) {
                    break false;
                }
            }
            outgoing = rx.recv() => {
                let Ok(text) = outgoing else { break false };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break false;
                }
            }
        }
    };

    // Unsubscribe before the client can observe the close.
    drop(rx);
    if kicked {
        let _ = socket.send(Message::Close(None)).await;
    }
}
