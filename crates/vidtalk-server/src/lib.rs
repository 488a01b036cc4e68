//! VidTalk Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
//!
//! JSON API for chatting with a generative model about uploaded videos.
//!
//! # Overview
//!
//! - **Identity**: accounts, bcrypt credentials, bearer access tokens
//! - **Media registry**: uploaded videos stored in S3-compatible storage
//! - **Conversation ledger**: every turn of every chat, persisted in PostgreSQL
//! - **Session reconciler**: replays the ledger into the stateless Gemini API on each turn
//!
//! # Architecture
//!
//! Features are vertical slices (`features/<name>/{commands,queries,routes.rs}`).
//! Commands and queries are plain structs with `validate()` and an async
//! `handle`; routes adapt them to HTTP and convert their errors into
//! [`AppError`].
//!
//! External services sit behind traits so tests can swap them out:
//!
//! - [`ai::MediaIngester`] and [`ai::TurnCompleter`] (Gemini)
//! - [`storage::MediaStore`] (S3)
//! - [`features::auth::CredentialHasher`] (bcrypt)
//!
//! # Example
//!
//! ```no_run
//! use vidtalk_server::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = vidtalk_server::db::create_pool(&config.database).await?;
//!     vidtalk_server::db::run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod storage;

pub use error::AppError;
