pub mod register;

pub use register::{RegisterVideoCommand, RegisterVideoError};
