//! Auth API routes
//!
//! - `POST /auth/register` - Create an account
//! - `POST /auth/login` - Exchange credentials for a bearer token
//! - `POST /auth/logout` - Revoke the presented bearer token

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::{
    LoginCommand, LoginError, LogoutCommand, LogoutError, RegisterUserCommand, RegisterUserError,
};
use crate::api::{extract::ApiJson, AppState};
use crate::error::AppError;
use crate::middleware::AuthUser;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// # Response
///
/// - `201 Created` - `{id, username, created_at}`
/// - `400 Bad Request` - Validation error
/// - `409 Conflict` - Username taken
#[tracing::instrument(skip(state, command), fields(username = %command.username))]
async fn register(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<RegisterUserCommand>,
) -> Result<Response, AppError> {
    let response =
        super::commands::register::handle(&state.db, state.hasher.as_ref(), command).await?;

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// # Response
///
/// - `200 OK` - `{access_token, token_type, expires_at}`
/// - `400 Bad Request` - Missing fields
/// - `401 Unauthorized` - Bad credentials
#[tracing::instrument(skip(state, command), fields(username = %command.username))]
async fn login(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<LoginCommand>,
) -> Result<Response, AppError> {
    let response = super::commands::login::handle(
        &state.db,
        state.hasher.as_ref(),
        state.auth.token_ttl(),
        command,
    )
    .await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn logout(State(state): State<AppState>, user: AuthUser) -> Result<Response, AppError> {
    let response = super::commands::logout::handle(
        &state.db,
        LogoutCommand {
            access_token: user.access_token,
        },
    )
    .await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

impl From<RegisterUserError> for AppError {
    fn from(err: RegisterUserError) -> Self {
        match err {
            RegisterUserError::Username(_) | RegisterUserError::Password(_) => {
                AppError::Validation(err.to_string())
            }
            RegisterUserError::DuplicateUsername(_) => AppError::Conflict(err.to_string()),
            RegisterUserError::Credential(e) => AppError::Internal(e.to_string()),
            RegisterUserError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::MissingCredentials => AppError::Validation(err.to_string()),
            LoginError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            LoginError::Credential(e) => AppError::Internal(e.to_string()),
            LoginError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<LogoutError> for AppError {
    fn from(err: LogoutError) -> Self {
        match err {
            LogoutError::Database(e) => AppError::Database(e),
        }
    }
}
