//! Common error types for request shaping and response parsing

use core::fmt;

/// A common error type for M2X operations.
///
/// Every variant maps to a negative integer through [`Error::code`], which
/// keeps them disjoint from real HTTP status codes for callers that log or
/// forward a single number.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The status line matched but the connection ended before three digits
    /// of status code arrived, or the transport reported a failure.
    Disconnected,
    /// The `Content-Length` header is absent or zero, the header block
    /// terminator was not found while extracting a body, or a request body
    /// came out a different length than it was measured.
    Invalid,
    /// A value could not be serialized as JSON into the scratch buffer.
    JsonInvalid,
    /// No status code was captured before the configured deadline.
    Timeout,
    /// A header scan did not find its pattern.
    NoMatch,
    /// A buffer is smaller than the data it has to hold.
    ///
    /// `required` is the size that would have succeeded.
    BufferTooSmall {
        /// Bytes needed for the retry to succeed.
        required: usize,
    },
    /// The operation has no route in the configured API version.
    Unsupported,
}

impl Error {
    /// Returns the negative integer code used on the wire-compatible API.
    pub fn code(&self) -> i16 {
        match self {
            Error::Disconnected => -1,
            Error::Invalid => -2,
            Error::JsonInvalid => -3,
            Error::Timeout => -4,
            Error::NoMatch => -5,
            Error::BufferTooSmall { .. } => -6,
            Error::Unsupported => -7,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Disconnected => f.write_str("connection ended before a status code was read"),
            Error::Invalid => f.write_str("content length missing, truncated or inconsistent"),
            Error::JsonInvalid => f.write_str("value does not serialize as JSON"),
            Error::Timeout => f.write_str("timed out waiting for a response"),
            Error::NoMatch => f.write_str("pattern not found"),
            Error::BufferTooSmall { required } => {
                write!(f, "buffer too small, {required} bytes required")
            }
            Error::Unsupported => f.write_str("operation not available in this API version"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Disconnected => defmt::write!(f, "Disconnected"),
            Error::Invalid => defmt::write!(f, "Invalid"),
            Error::JsonInvalid => defmt::write!(f, "JsonInvalid"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::NoMatch => defmt::write!(f, "NoMatch"),
            Error::BufferTooSmall { required } => {
                defmt::write!(f, "BufferTooSmall({=usize})", required)
            }
            Error::Unsupported => defmt::write!(f, "Unsupported"),
        }
    }
}
