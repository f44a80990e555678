use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{api, outbound};

/// OpenAPI document for the JSON endpoints.
///
/// The TwiML webhooks are called by Twilio, not API clients, and are left out.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Voicebot Gateway API",
        description = "Status and outbound-call endpoints of the telephone voice-bot gateway"
    ),
    paths(api::status, outbound::call_me),
    components(schemas(api::StatusResponse, outbound::CallMeResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "status", description = "Service health"),
        (name = "calls", description = "Outbound calls")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub fn spec_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

pub fn spec_yaml() -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&ApiDoc::openapi())
}
