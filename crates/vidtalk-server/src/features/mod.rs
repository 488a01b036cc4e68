//! Feature slices of the VidTalk API
//!
//! Each feature is a vertical slice with its own commands, queries and routes:
//!
//! - **auth**: accounts, login and bearer tokens
//! - **videos**: the media registry
//! - **chats**: sessions, the conversation ledger and turn reconciliation
//!
//! Commands and queries are plain structs with a `validate()` step and an
//! async `handle` function; `routes.rs` adapts them to HTTP and maps their
//! errors into [`crate::error::AppError`].

pub mod auth;
pub mod chats;
pub mod shared;
pub mod videos;

use axum::Router;

use crate::api::AppState;

/// All feature routes
///
/// - `/auth/*` - Account management
/// - `/videos` - Video listing
/// - `/upload`, `/chat`, `/get_sessions`, `/get_session_messages/:id` - Chat
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::auth_routes())
        .nest("/videos", videos::videos_routes())
        .merge(chats::chats_routes())
}
