pub mod list_messages;
pub mod list_sessions;

pub use list_messages::{ListMessagesError, ListMessagesQuery, MessageView};
pub use list_sessions::{ListSessionsError, ListSessionsQuery, SessionSummary};
