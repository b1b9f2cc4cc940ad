//! HTTP + WebSocket API: remote frame-ingest driver
//!
//! The browser (or any client running a face-mesh detector) posts one
//! detection per frame; the server runs the pipeline for that session.
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /session/new - Create new session
//! - GET /session/{id} - Latest output
//! - POST /session/{id}/frame - Submit one frame
//! - POST /session/{id}/retry - Reset the session
//! - DELETE /session/{id} - Stop and remove the session
//! - GET /pass?scope= - Check a pass flag
//! - WS /ws/{id} - Live updates

use axum::{
    extract::{ws::{Message, WebSocket}, Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::core::pass::PassStore;
use crate::core::pipeline::LivenessPipeline;
use crate::types::{FrameInput, LivenessConfig, LivenessOutput, ReasonCode};

/// Server-side liveness session
#[derive(Debug)]
pub struct Session {
    pub id: String,
    /// Pass flag scope granted on success
    pub scope: String,
    pub pipeline: LivenessPipeline,
    pub update_tx: broadcast::Sender<LivenessOutput>,
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
    pub passes: RwLock<PassStore>,
    pub config: LivenessConfig,
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub scope: Option<String>,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Pass query
#[derive(Debug, Deserialize)]
pub struct PassQuery {
    #[serde(default)]
    pub scope: String,
}

/// Pass status response
#[derive(Debug, Serialize)]
pub struct PassResponse {
    pub scope: String,
    pub valid: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Create the API router
pub fn create_router(config: LivenessConfig) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        passes: RwLock::new(PassStore::new(chrono::Duration::seconds(config.pass_ttl_secs))),
        config,
    });

    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(stop_session))
        .route("/session/:id/frame", post(submit_frame))
        .route("/session/:id/retry", post(retry_session))
        .route("/pass", get(get_pass))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    req: Option<Json<NewSessionRequest>>,
) -> Json<NewSessionResponse> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let session_id = generate_session_id();
    let (tx, _) = broadcast::channel(100);

    let session = Session {
        id: session_id.clone(),
        scope: req.scope.unwrap_or_default(),
        pipeline: LivenessPipeline::new(state.config.clone()),
        update_tx: tx,
    };
    info!(session = %session_id, scope = %session.scope, "session created");

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id.clone(), session);

    Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
    })
}

/// Latest output of a session
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LivenessOutput>, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(session.pipeline.last_output().clone()))
}

/// Run one frame through the session pipeline.
///
/// The write lock serializes frames per server, so frames of a session
/// never overlap.
async fn submit_frame(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(frame): Json<FrameInput>,
) -> Result<Json<LivenessOutput>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let output = session.pipeline.process(&frame);

    if output.reason == ReasonCode::L005_LIVENESS_PASSED {
        state.passes.write().await.grant(&session.scope, Utc::now());
    }

    // No subscribers is fine
    let _ = session.update_tx.send(output.clone());

    Ok(Json(output))
}

/// Full reset of a session
async fn retry_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LivenessOutput>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    session.pipeline.reset();
    info!(session = %id, "session reset");
    Ok(Json(session.pipeline.last_output().clone()))
}

/// Stop and remove a session; live subscribers see the stream close
async fn stop_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let mut sessions = state.sessions.write().await;
    match sessions.remove(&id) {
        Some(session) => {
            info!(
                session = %id,
                frames = session.pipeline.frame_count(),
                passed = session.pipeline.passed(),
                "session stopped"
            );
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// Check the pass flag of a scope
async fn get_pass(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PassQuery>,
) -> Json<PassResponse> {
    let mut passes = state.passes.write().await;
    let valid = passes.is_valid(&query.scope, Utc::now());
    let expires_at = if valid {
        passes.get(&query.scope).map(|f| f.expires_at)
    } else {
        None
    };
    Json(PassResponse { scope: query.scope, valid, expires_at })
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.update_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Forward session updates until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<LivenessOutput>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let json = serde_json::to_string(&update).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket subscriber lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Generate session ID
fn generate_session_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("session_{:x}_{:x}", nanos, seq)
}

/// Run the API server
pub async fn run_server(addr: &str, config: LivenessConfig) -> std::io::Result<()> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "livecheck API listening");
    info!("  POST   /session/new        - Create session");
    info!("  GET    /session/:id        - Latest output");
    info!("  POST   /session/:id/frame  - Submit frame");
    info!("  POST   /session/:id/retry  - Reset session");
    info!("  DELETE /session/:id        - Stop session");
    info!("  GET    /pass?scope=        - Check pass flag");
    info!("  WS     /ws/:id             - Live updates");
    info!("  GET    /health             - Health check");
    axum::serve(listener, router).await
}
