//! TwiML response documents.
//!
//! Every call-lifecycle webhook answers with a `<Response>` document listing
//! the verbs the telephony provider executes in order. Only the verbs this
//! gateway emits are modelled: `<Say>`, `<Gather>`, `<Pause>`, `<Redirect>`
//! and `<Hangup>`.
//!
//! ```rust
//! use voicebot_gateway::core::twiml::{Gather, VoiceResponse};
//!
//! let twiml = VoiceResponse::new()
//!     .say("Hello!", "alice")
//!     .gather(Gather::speech("/process_speech"))
//!     .redirect("/voice")
//!     .to_xml();
//! assert!(twiml.starts_with("<?xml"));
//! ```

mod builder;

pub use builder::{Gather, Say, Verb, VoiceResponse, escape_xml};

/// Content type used for TwiML bodies.
pub const TWIML_CONTENT_TYPE: &str = "text/xml";
