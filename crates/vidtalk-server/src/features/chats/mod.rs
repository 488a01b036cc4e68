//! Conversations about videos
//!
//! - [`ledger`] persists transcripts and session rows
//! - [`reconciler`] replays a transcript into the completion service on each turn
//! - [`locks`] keeps turns on one session from interleaving

pub mod commands;
pub mod ledger;
pub mod locks;
pub mod queries;
pub mod reconciler;
pub mod routes;

pub use locks::SessionLocks;
pub use reconciler::{ReconcileError, SessionReconciler};
pub use routes::chats_routes;
