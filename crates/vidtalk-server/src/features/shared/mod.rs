//! Shared utilities for feature modules
//!
//! - **validation**: input validation rules
//! - **error_helpers**: database error classification
//! - **test_helpers**: fixtures and collaborator stubs (test-only)

pub mod error_helpers;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use validation::{validate_filename, validate_message, validate_password, validate_username};
