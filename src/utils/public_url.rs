//! Externally visible origin of an incoming request.

use http::HeaderMap;
use http::header::HOST;

/// Origin (`scheme://host`) the provider used to reach this service.
///
/// A configured public base URL wins. Otherwise the `Host` header is used,
/// with `https` only when `X-Forwarded-Proto` says so. Returns `None` when
/// neither is available.
pub fn public_origin(headers: &HeaderMap, public_base_url: Option<&str>) -> Option<String> {
    if let Some(base) = public_base_url {
        return Some(base.trim_end_matches('/').to_string());
    }

    let host = headers.get(HOST)?.to_str().ok()?.trim();
    if host.is_empty() {
        return None;
    }
    let forwarded_https = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));
    let scheme = if forwarded_https { "https" } else { "http" };

    Some(format!("{scheme}://{host}"))
}
