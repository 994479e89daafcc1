//! HTTP/1.0 request shaping and response scanning for constrained devices.
//!
//! Nothing in this module allocates or buffers a whole message:
//!
//! - [`sink`] streams request bytes into the driver's packet buffer and
//!   measures bodies with a counting [`Counter`](sink::Counter) first, so the
//!   exact `Content-Length` can be written ahead of the body.
//! - [`request`] writes request lines, headers and RFC 1738 percent-encoded
//!   path segments.
//! - [`parser`] pulls the status code, content length and body offset out of
//!   a raw header chunk with a wildcard substring search.
//!
//! ```rust
//! use libm2x::network::application::http::parser::{read_status_code, Case};
//!
//! let status = read_status_code(b"HTTP/1.0 204 No Content\r\n\r\n", Case::Insensitive);
//! assert_eq!(status, Ok(204));
//! ```

/// Wildcard header scanners.
pub mod parser;

/// Request line and header writers.
pub mod request;

/// Counting and buffer-backed byte sinks.
pub mod sink;


pub use parser::Case;
pub use request::Method;
pub use sink::{Counter, SliceSink, Sink, VecSink, measure};
