//! Twilio Programmable Voice integration.
//!
//! - Outbound calls: `POST {base}/2010-04-01/Accounts/{sid}/Calls.json`
//!   (form fields `To`, `From`, `Url`; HTTP basic auth with SID and token)
//! - Webhook authenticity: `X-Twilio-Signature`, see [`signature`]

mod client;
mod messages;
pub mod signature;

pub use client::{TWILIO_API_BASE_URL, TwilioClient, TwilioCredentials};
pub use messages::UNVERIFIED_TRIAL_NUMBER_CODE;
pub use signature::{SIGNATURE_HEADER, compute_signature, validate_signature};
