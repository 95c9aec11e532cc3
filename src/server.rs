//! HTTP surface: the single-page shell plus a small JSON API.
//!
//! Each dashboard user owns one server-side `Session`; the registry is a
//! mutex-guarded map, so concurrent users never observe each other's
//! selection state.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::dataset::Dataset;
use crate::logging::{json_log, obj, v_num, v_str, Domain};
use crate::session::{Outputs, Session};

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(Default)]
pub struct SessionRegistry {
    next_id: u64,
    sessions: HashMap<u64, Session>,
}

#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub default_department: String,
    pub sessions: Arc<Mutex<SessionRegistry>>,
}

impl AppState {
    pub fn new(dataset: Arc<Dataset>, default_department: String) -> Self {
        Self {
            dataset,
            default_department,
            sessions: Arc::new(Mutex::new(SessionRegistry::default())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/departamentos", get(departamentos))
        .route("/api/session", post(create_session))
        .route("/api/session/{id}", get(read_session))
        .route("/api/session/{id}/departamento", post(set_departamento))
        .route("/api/session/{id}/provincia", post(set_provincia))
        .with_state(state)
}

#[derive(Deserialize)]
struct SelectRequest {
    value: Option<String>,
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: u64,
    departamento: String,
    outputs: Outputs,
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn departamentos(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.dataset.departments())
}

async fn create_session(State(state): State<AppState>) -> Json<SessionCreated> {
    let mut reg = state.sessions.lock().await;
    let id = reg.next_id;
    reg.next_id += 1;
    let session = Session::new(state.dataset.clone(), &state.default_department);
    let departamento = session.selection().departamento.clone();
    let outputs = session.outputs().clone();
    reg.sessions.insert(id, session);
    json_log(
        Domain::Http,
        obj(&[("event", v_str("session_created")), ("session_id", v_num(id as f64))]),
    );
    Json(SessionCreated { session_id: id, departamento, outputs })
}

async fn read_session(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let reg = state.sessions.lock().await;
    match reg.sessions.get(&id) {
        Some(s) => Json(s.outputs().clone()).into_response(),
        None => unknown_session(id),
    }
}

async fn set_departamento(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<SelectRequest>,
) -> Response {
    let Some(value) = req.value else {
        return bad_request("departamento requires a value");
    };
    let mut reg = state.sessions.lock().await;
    match reg.sessions.get_mut(&id) {
        Some(s) => Json(s.set_departamento(&value).clone()).into_response(),
        None => unknown_session(id),
    }
}

async fn set_provincia(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<SelectRequest>,
) -> Response {
    let mut reg = state.sessions.lock().await;
    match reg.sessions.get_mut(&id) {
        Some(s) => Json(s.set_provincia(req.value).clone()).into_response(),
        None => unknown_session(id),
    }
}

fn unknown_session(id: u64) -> Response {
    json_log(
        Domain::Http,
        obj(&[("event", v_str("unknown_session")), ("session_id", v_num(id as f64))]),
    );
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "unknown session" })),
    )
        .into_response()
}

fn bad_request(msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": msg })),
    )
        .into_response()
}
