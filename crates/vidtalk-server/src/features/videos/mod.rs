//! Media registry: uploaded videos and their ownership

pub mod commands;
pub mod content_type;
pub mod queries;
pub mod routes;

pub use routes::videos_routes;
