//! API documentation
//!
//! The OpenAPI document is generated from handler annotations when the
//! `openapi` feature is enabled.

#[cfg(feature = "openapi")]
pub mod openapi;
