//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{AcceptedResponse, CorrectionRequest, ErrorResponse, SetTextRequest};
use super::AppState;
use crate::contract::{Category, EmailFile};
use crate::runtime::DispatchError;
use crate::session::{CorrectionEdit, Event, SessionSnapshot, TransitionError};
use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

const MISSING_FILE_FIELD: &str = "Campo 'file' ausente no envio";
const EMPTY_CORRECTION: &str = "Nenhuma correção informada";
const UNREADABLE_UPLOAD: &str = "Não foi possível ler o arquivo enviado";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        // Snapshot and live updates
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        // Input
        .route("/api/session/text", post(set_text))
        .route("/api/session/file", post(set_file).layer(upload_limit))
        // Classification and corrections
        .route("/api/session/classify", post(classify))
        .route("/api/session/correction", post(set_correction))
        .route("/api/session/feedback", post(send_feedback))
        .route("/api/session/retrain", post(retrain))
        .route("/api/session/restart", post(restart))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Snapshot
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe first so no change falls between the snapshot and the stream
    let broadcast_rx = state.session.subscribe();
    sse_stream(state.session.snapshot(), broadcast_rx)
}

// ============================================================
// Intents
// ============================================================

type Accepted = (StatusCode, Json<AcceptedResponse>);

async fn dispatch(state: &AppState, event: Event) -> Result<Accepted, AppError> {
    state.session.dispatch(event).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse { accepted: true }),
    ))
}

async fn set_text(
    State(state): State<AppState>,
    payload: Result<Json<SetTextRequest>, JsonRejection>,
) -> Result<Accepted, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    dispatch(&state, Event::SetText { text: req.text }).await
}

async fn set_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Accepted, AppError> {
    let limit = state.max_upload_bytes;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(&e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| upload_error(&e, limit))?;

        tracing::debug!(file = %name, size = bytes.len(), "File received");
        let file = EmailFile::new(name, bytes.to_vec());
        return dispatch(&state, Event::SetFile { file }).await;
    }

    Err(AppError::BadRequest(MISSING_FILE_FIELD.to_string()))
}

fn upload_error(error: &MultipartError, limit: usize) -> AppError {
    tracing::debug!(error = %error.body_text(), status = %error.status(), "Upload rejected");
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(upload_too_large_message(limit))
    } else {
        AppError::BadRequest(UNREADABLE_UPLOAD.to_string())
    }
}

fn upload_too_large_message(limit: usize) -> String {
    format!("Arquivo muito grande. O limite é de {limit} bytes.")
}

async fn classify(State(state): State<AppState>) -> Result<Accepted, AppError> {
    dispatch(&state, Event::Classify).await
}

async fn set_correction(
    State(state): State<AppState>,
    payload: Result<Json<CorrectionRequest>, JsonRejection>,
) -> Result<Accepted, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let edit = CorrectionEdit {
        category: req
            .corrected_category
            .map(|value| Category::parse_override(&value)),
        reply: req.improved_reply,
    };
    if edit.is_empty() {
        return Err(AppError::BadRequest(EMPTY_CORRECTION.to_string()));
    }
    dispatch(&state, Event::EditCorrection(edit)).await
}

async fn send_feedback(State(state): State<AppState>) -> Result<Accepted, AppError> {
    dispatch(&state, Event::SendFeedback).await
}

async fn retrain(State(state): State<AppState>) -> Result<Accepted, AppError> {
    dispatch(&state, Event::Retrain).await
}

async fn restart(State(state): State<AppState>) -> Result<Accepted, AppError> {
    dispatch(&state, Event::Restart).await
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("automail ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
    Conflict(String),
    Unavailable(String),
}

impl From<DispatchError> for AppError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Rejected(e @ TransitionError::UnsupportedFile { .. }) => {
                AppError::BadRequest(e.to_string())
            }
            DispatchError::Rejected(e) => AppError::Conflict(e.to_string()),
            DispatchError::Stopped => AppError::Unavailable(DispatchError::Stopped.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
