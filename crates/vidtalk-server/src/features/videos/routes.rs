//! Video API routes
//!
//! - `GET /videos` - List the caller's videos, newest first
//!
//! Uploading happens through `POST /upload` (see the chats feature), which
//! registers the video and opens a session in one request.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::commands::RegisterVideoError;
use super::queries::{GetVideoError, ListVideosError, ListVideosQuery};
use crate::api::AppState;
use crate::error::AppError;
use crate::middleware::AuthUser;

pub fn videos_routes() -> Router<AppState> {
    Router::new().route("/", get(list_videos))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn list_videos(State(state): State<AppState>, user: AuthUser) -> Result<Response, AppError> {
    let videos =
        super::queries::list::handle(&state.db, ListVideosQuery { owner: user.id }).await?;

    Ok(Json(json!({ "videos": videos })).into_response())
}

impl From<RegisterVideoError> for AppError {
    fn from(err: RegisterVideoError) -> Self {
        match err {
            RegisterVideoError::Filename(_)
            | RegisterVideoError::EmptyPayload
            | RegisterVideoError::UnsupportedType => AppError::Validation(err.to_string()),
            RegisterVideoError::Storage(message) => AppError::Upstream(message),
            RegisterVideoError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetVideoError> for AppError {
    fn from(err: GetVideoError) -> Self {
        match err {
            GetVideoError::NotFound => AppError::InvalidReference("Invalid video_id".to_string()),
            GetVideoError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListVideosError> for AppError {
    fn from(err: ListVideosError) -> Self {
        match err {
            ListVideosError::Database(e) => AppError::Database(e),
        }
    }
}
