//! Chat API routes
//!
//! - `POST /upload` - Upload a video (or pick one by `video_id`) and open a session
//! - `POST /chat` - Send one message in a session
//! - `GET /get_sessions` - List the caller's sessions
//! - `GET /get_session_messages/:id` - Transcript of one session

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use super::commands::{
    ChatRequest, ContinueSessionCommand, ContinueSessionError, OpenSessionCommand,
    OpenSessionError, VideoSource,
};
use super::queries::{ListMessagesError, ListMessagesQuery, ListSessionsError, ListSessionsQuery};
use super::reconciler::ReconcileError;
use crate::api::{extract::ApiJson, AppState};
use crate::error::AppError;
use crate::middleware::AuthUser;

pub fn chats_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/chat", post(chat))
        .route("/get_sessions", get(list_sessions))
        .route("/get_session_messages/:id", get(list_messages))
}

/// Multipart fields:
/// - `video` - the video file
/// - `video_id` - id of a previously uploaded video, used when `video` is absent
///
/// # Response
///
/// - `200 OK` - `{message, session_id, video_id}`
/// - `400 Bad Request` - No file, empty filename, non-video file, bad `video_id`
/// - `413 Payload Too Large` - Body over the upload limit
/// - `500 Internal Server Error` - Storage or ingestion failure
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let source = read_video_source(multipart?).await?;

    let response = super::commands::open_session::handle(
        &state.db,
        state.media.as_ref(),
        &state.reconciler,
        OpenSessionCommand {
            owner: user.id,
            source,
        },
    )
    .await?;

    Ok(Json(response).into_response())
}

async fn read_video_source(mut multipart: Multipart) -> Result<VideoSource, AppError> {
    let mut upload = None;
    let mut video_id = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("video") => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content = field.bytes().await?;
                upload = Some(VideoSource::Upload { filename, content });
            }
            Some("video_id") => {
                video_id = Some(field.text().await?);
            }
            _ => {}
        }
    }

    match (upload, video_id) {
        (Some(upload), _) => Ok(upload),
        (None, Some(id)) => Uuid::parse_str(id.trim())
            .map(VideoSource::Existing)
            .map_err(|_| AppError::InvalidReference("Invalid video_id".to_string())),
        (None, None) => Err(AppError::Validation("No video file provided".to_string())),
    }
}

/// # Response
///
/// - `200 OK` - `{response}`
/// - `400 Bad Request` - Missing fields or unknown/foreign `session_id`
/// - `500 Internal Server Error` - Completion failure; nothing is recorded
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Response, AppError> {
    let response = super::commands::continue_session::handle(
        &state.reconciler,
        ContinueSessionCommand::new(user.id, request),
    )
    .await?;

    Ok(Json(response).into_response())
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn list_sessions(State(state): State<AppState>, user: AuthUser) -> Result<Response, AppError> {
    let sessions =
        super::queries::list_sessions::handle(&state.db, ListSessionsQuery { owner: user.id })
            .await?;

    Ok(Json(json!({ "sessions": sessions })).into_response())
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Response, AppError> {
    let messages = super::queries::list_messages::handle(
        &state.db,
        ListMessagesQuery {
            owner: user.id,
            session_id,
        },
    )
    .await?;

    Ok(Json(json!({ "messages": messages })).into_response())
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::SessionNotFound => {
                AppError::InvalidReference("Invalid session_id".to_string())
            }
            ReconcileError::VideoNotFound => {
                AppError::InvalidReference("Invalid video_id".to_string())
            }
            ReconcileError::MediaUnavailable(_)
            | ReconcileError::Ingestion(_)
            | ReconcileError::Completion(_) => AppError::Upstream(err.to_string()),
            ReconcileError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<OpenSessionError> for AppError {
    fn from(err: OpenSessionError) -> Self {
        match err {
            OpenSessionError::Register(e) => e.into(),
            OpenSessionError::Video(e) => e.into(),
            OpenSessionError::Reconcile(e) => e.into(),
        }
    }
}

impl From<ContinueSessionError> for AppError {
    fn from(err: ContinueSessionError) -> Self {
        match err {
            ContinueSessionError::MissingFields | ContinueSessionError::Message(_) => {
                AppError::Validation(err.to_string())
            }
            ContinueSessionError::Reconcile(e) => e.into(),
        }
    }
}

impl From<ListSessionsError> for AppError {
    fn from(err: ListSessionsError) -> Self {
        match err {
            ListSessionsError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListMessagesError> for AppError {
    fn from(err: ListMessagesError) -> Self {
        match err {
            ListMessagesError::NotFound => {
                AppError::InvalidReference("Invalid session_id".to_string())
            }
            ListMessagesError::Database(e) => AppError::Database(e),
        }
    }
}
