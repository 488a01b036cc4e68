//! Contracts for the external generative-AI service
//!
//! The chat core talks to the AI provider through two traits:
//!
//! - [`MediaIngester`] uploads raw video bytes and returns an [`ExternalRef`]
//!   that later completion requests can point at.
//! - [`TurnCompleter`] produces the model's reply to a new message given the
//!   full conversation so far. Implementations hold no memory between calls;
//!   the caller re-sends the whole history every time.
//!
//! [`gemini::GeminiClient`] implements both against the Gemini REST API.

pub mod gemini;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Handle to media held by the AI provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub uri: String,
    pub mime_type: String,
}

/// One piece of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Media(ExternalRef),
}

/// A role-tagged message in a conversation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// The implicit first turn of every session: the user "shows" the video.
    pub fn media(media: ExternalRef) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Media(media)],
        }
    }

    /// Concatenated text parts, ignoring media
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::Media(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Media upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Media processing failed for {name}")]
    ProcessingFailed { name: String },
    #[error("Media {name} was not ready after {attempts} checks")]
    NotReady { name: String, attempts: u32 },
    #[error("Media service unavailable: {0}")]
    Unavailable(String),
    #[error("Unexpected media service response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion request timed out")]
    Timeout,
    #[error("Completion rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Completion service unavailable: {0}")]
    Unavailable(String),
    #[error("Completion returned no text{}", .reason.as_ref().map(|r| format!(" (finish reason: {r})")).unwrap_or_default())]
    EmptyResponse { reason: Option<String> },
    #[error("Unexpected completion response: {0}")]
    InvalidResponse(String),
}

/// Media-ingestion collaborator
#[async_trait]
pub trait MediaIngester: Send + Sync {
    async fn ingest(
        &self,
        content: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<ExternalRef, IngestionError>;
}

/// Turn-completion collaborator
#[async_trait]
pub trait TurnCompleter: Send + Sync {
    async fn complete(&self, history: &[Turn], message: &str) -> Result<String, CompletionError>;
}
