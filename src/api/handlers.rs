//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ClearResponse, CreateSessionRequest, ErrorResponse,
    ModelsResponse, SelectModelRequest, SessionListResponse, SessionResponse, SuccessResponse,
};
use super::AppState;
use crate::runtime::{RuntimeError, SessionSnapshot, SseEvent};
use crate::state_machine::TransitionError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the chat page
        .route("/", get(serve_page))
        .route("/assets/*path", get(serve_static))
        // Model catalog
        .route("/api/models", get(list_models))
        // Sessions
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/stream", get(stream_session))
        // User intents
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/model", post(select_model))
        .route("/api/sessions/:id/clear", post(clear_session))
        .route("/api/sessions/:id/delete", post(delete_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_page() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - chat page not embedded</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Model Catalog
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let catalog = state.sessions.catalog();
    Json(ModelsResponse {
        models: catalog.models().to_vec(),
        default: catalog.default_model_id().map(String::from),
    })
}

// ============================================================
// Sessions
// ============================================================

async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.sessions.list_sessions().await,
    })
}

async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(req) = body.unwrap_or_default();
    let session = state.sessions.create_session(req.model).await?;
    Ok(Json(SessionResponse { session }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.snapshot(&id).await?))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, broadcast_rx) = state.sessions.subscribe(&id).await?;
    Ok(sse_stream(SseEvent::Init { snapshot }, broadcast_rx))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.delete_session(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// User Intents
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest {
            message: "Message must not be blank".to_string(),
            code: Some("empty_message"),
        });
    }

    state.sessions.send_message(&id, text.to_string()).await?;
    Ok(Json(ChatResponse { queued: true }))
}

async fn select_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SelectModelRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.sessions.select_model(&id, req.model).await?;
    Ok(Json(SessionResponse { session }))
}

async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClearResponse>, AppError> {
    state.sessions.clear(&id).await?;
    Ok(Json(ClearResponse { ok: true }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("model_chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest {
        message: String,
        code: Option<&'static str>,
    },
    NotFound(String),
    Conflict {
        message: String,
        code: &'static str,
    },
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::SessionNotFound(_) => AppError::NotFound(err.to_string()),
            RuntimeError::Rejected(e @ TransitionError::Busy) => AppError::Conflict {
                message: e.to_string(),
                code: e.code(),
            },
            RuntimeError::Rejected(e) => AppError::BadRequest {
                message: e.to_string(),
                code: Some(e.code()),
            },
            RuntimeError::Stopped(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest { message, code } => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message, code))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg, None)),
            AppError::Conflict { message, code } => {
                (StatusCode::CONFLICT, ErrorResponse::new(message, Some(code)))
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg, None))
            }
        };

        (status, Json(body)).into_response()
    }
}
