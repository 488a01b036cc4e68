pub mod continue_session;
pub mod open_session;

pub use continue_session::{
    ChatRequest, ContinueSessionCommand, ContinueSessionError, ContinueSessionResponse,
};
pub use open_session::{OpenSessionCommand, OpenSessionError, OpenSessionResponse, VideoSource};
