pub mod login;
pub mod logout;
pub mod register;

pub use login::{LoginCommand, LoginError, LoginResponse};
pub use logout::{LogoutCommand, LogoutError, LogoutResponse};
pub use register::{RegisterUserCommand, RegisterUserError, RegisterUserResponse};
