//! Outbound call placement and provider webhook helpers.

mod base;
pub mod twilio;

pub use base::{
    OutboundCallRequest, PlacedCall, TelephonyClient, TelephonyError, TelephonyResult,
};
pub use twilio::{TWILIO_API_BASE_URL, TwilioClient, TwilioCredentials};
