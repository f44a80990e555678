pub mod auth;
pub mod config;
pub mod core;
pub mod docs;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod smoke;
pub mod state;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use crate::core::*;
pub use errors::app_error::{AppError, AppResult};
pub use errors::auth_error::{AuthError, AuthResult};
pub use state::AppState;
