//! Identity store: accounts, credential verification and bearer tokens

pub mod commands;
pub mod password;
pub mod routes;
pub mod tokens;

pub use password::{Bcrypt, CredentialHasher};
pub use routes::auth_routes;
