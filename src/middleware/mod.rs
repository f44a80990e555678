pub mod auth;
pub mod twilio_signature;

// Re-export middleware functions
pub use auth::auth_middleware;
pub use twilio_signature::twilio_signature_middleware;
