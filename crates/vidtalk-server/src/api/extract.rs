//! Request extractors that reject with the API's `{"error": ...}` body

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection renders as [`AppError::Validation`]
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
