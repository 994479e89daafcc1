//! # Application Layer Protocols
//!
//! - **[`http`]**: byte sinks, request framing and the response header scanner
//! - **[`m2x`]**: request templates and the polling client for the M2X API
//!
//! Both layers are allocation free. Request bytes are streamed into the
//! transport's packet buffer and response headers are scanned in place.

/// Minimal HTTP/1.0 request shaping and response scanning.
pub mod http;

/// M2X time-series API client.
pub mod m2x;
