//! HTTP request handlers
//!
//! - `api` - Status page and status probe
//! - `voice` - Twilio call-lifecycle webhooks
//! - `outbound` - Outbound call trigger

pub mod api;
pub mod outbound;
pub mod voice;
