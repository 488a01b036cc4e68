//! VidTalk Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the VidTalk workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`VidtalkError`] and the [`Result`] alias
//! - **Logging**: centralized `tracing` subscriber setup driven by environment
//!
//! # Example
//!
//! ```no_run
//! use vidtalk_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{Result, VidtalkError};
