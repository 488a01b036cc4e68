//! Continue session command: one chat turn

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::chats::reconciler::{ReconcileError, SessionReconciler};
use crate::features::shared::validation::{validate_message, MessageValidationError};

/// Request body of `POST /chat`
#[derive(Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone)]
pub struct ContinueSessionCommand {
    pub owner: Uuid,
    pub session_id: String,
    pub message: String,
}

impl std::fmt::Debug for ContinueSessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinueSessionCommand")
            .field("owner", &self.owner)
            .field("message_len", &self.message.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueSessionResponse {
    pub response: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ContinueSessionError {
    #[error("Missing session_id or message")]
    MissingFields,

    #[error(transparent)]
    Message(#[from] MessageValidationError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl ContinueSessionCommand {
    pub fn new(owner: Uuid, request: ChatRequest) -> Self {
        Self {
            owner,
            session_id: request.session_id,
            message: request.message,
        }
    }

    pub fn validate(&self) -> Result<(), ContinueSessionError> {
        if self.session_id.is_empty() || self.message.is_empty() {
            return Err(ContinueSessionError::MissingFields);
        }
        validate_message(&self.message)?;
        Ok(())
    }
}

#[tracing::instrument(skip(reconciler, command), fields(owner = %command.owner))]
pub async fn handle(
    reconciler: &SessionReconciler,
    command: ContinueSessionCommand,
) -> Result<ContinueSessionResponse, ContinueSessionError> {
    command.validate()?;

    let response = reconciler
        .continue_session(command.owner, &command.session_id, &command.message)
        .await?;

    Ok(ContinueSessionResponse { response })
}
