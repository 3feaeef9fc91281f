pub mod auth;
pub mod authentication;
pub mod session;

pub use auth::*;
pub use authentication::*;
pub use session::*;
