//! HTTP surface: shared state, router assembly and the health probe

pub mod extract;


use axum::{
    extract::{DefaultBodyLimit, FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::{AuthConfig, CorsConfig, ServerConfig};
use crate::features::{self, auth::CredentialHasher, chats::SessionReconciler};
use crate::storage::MediaStore;
use crate::{db, middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub media: Arc<dyn MediaStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub reconciler: SessionReconciler,
    pub auth: AuthConfig,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

/// Build the application router with all routes and middleware
pub fn create_router(state: AppState, server: &ServerConfig, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(features::router())
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .with_state(state)
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

async fn health_check(State(state): State<AppState>) -> Response {
    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "unreachable"
                })),
            )
                .into_response()
        }
    }
}
