//! Shared validation utilities
//!
//! ```rust,ignore
//! use vidtalk_server::features::shared::validation::{validate_username, validate_password};
//!
//! validate_username(&command.username)?;
//! validate_password(&command.password)?;
//! ```

use thiserror::Error;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 64;
pub const PASSWORD_MIN_LENGTH: usize = 8;
/// bcrypt only looks at the first 72 bytes; longer inputs are still accepted up to this cap.
pub const PASSWORD_MAX_LENGTH: usize = 128;
pub const MESSAGE_MAX_LENGTH: usize = 32_000;
pub const FILENAME_MAX_LENGTH: usize = 255;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsernameValidationError {
    #[error("Username is required")]
    Required,

    #[error("Username must be between {} and {} characters", USERNAME_MIN_LENGTH, USERNAME_MAX_LENGTH)]
    Length,

    #[error("Username can only contain letters, numbers, '_', '-' and '.'")]
    InvalidFormat,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordValidationError {
    #[error("Password is required")]
    Required,

    #[error("Password must be between {} and {} characters", PASSWORD_MIN_LENGTH, PASSWORD_MAX_LENGTH)]
    Length,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageValidationError {
    #[error("Message is required")]
    Required,

    #[error("Message must be at most {} characters", MESSAGE_MAX_LENGTH)]
    TooLong,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilenameValidationError {
    #[error("No selected file")]
    Required,

    #[error("Filename must be at most {} characters", FILENAME_MAX_LENGTH)]
    TooLong,
}

pub fn validate_username(username: &str) -> Result<(), UsernameValidationError> {
    if username.is_empty() {
        return Err(UsernameValidationError::Required);
    }

    let length = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return Err(UsernameValidationError::Length);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(UsernameValidationError::InvalidFormat);
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), PasswordValidationError> {
    if password.is_empty() {
        return Err(PasswordValidationError::Required);
    }

    let length = password.chars().count();
    if !(PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&length) {
        return Err(PasswordValidationError::Length);
    }

    Ok(())
}

/// Chat messages must contain something other than whitespace.
pub fn validate_message(message: &str) -> Result<(), MessageValidationError> {
    if message.trim().is_empty() {
        return Err(MessageValidationError::Required);
    }

    if message.chars().count() > MESSAGE_MAX_LENGTH {
        return Err(MessageValidationError::TooLong);
    }

    Ok(())
}

pub fn validate_filename(filename: &str) -> Result<(), FilenameValidationError> {
    if filename.trim().is_empty() {
        return Err(FilenameValidationError::Required);
    }

    if filename.chars().count() > FILENAME_MAX_LENGTH {
        return Err(FilenameValidationError::TooLong);
    }

    Ok(())
}
