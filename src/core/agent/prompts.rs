//! Fixed texts spoken to callers.

/// Instruction seeded as the first message of every call transcript.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI support agent for a startup. \
Your responses should be:
1. Concise and to the point
2. Professional but friendly
3. Helpful and informative
4. Formatted for speech (avoid special characters, use natural pauses)

Keep responses under 30 seconds of spoken content. If you don't know an answer, \
say so clearly and offer to take the question to a human representative.";

pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";

pub const FOLLOW_UP: &str = "Is there anything else I can help you with?";

pub const NO_SPEECH: &str = "I'm sorry, I didn't hear anything. Could you please speak again?";

pub const QUOTA_EXHAUSTED: &str = "I'm sorry, but our AI service is currently at capacity. \
Your message was received, but we cannot generate a response at this time. \
Please try again later when our API quota has reset.";

pub const AT_CAPACITY: &str =
    "I'm sorry, but our AI service is at capacity right now. Please call back in a few minutes.";

pub const HIGH_DEMAND: &str = "I'm sorry, but our AI service is experiencing high demand. \
Please wait a moment and try speaking again.";

pub const UNIDENTIFIED_CALL: &str =
    "I'm sorry, something went wrong connecting your call. Please call back. Goodbye.";

pub const GENERIC_FAILURE: &str =
    "I'm sorry, I'm having trouble processing your request. Let me try again.";
