//! HTTP/1.0 request framing helpers.

use super::sink::Sink;

const CRLF: &[u8] = b"\r\n";
const VERSION: &str = " HTTP/1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Unreserved characters from RFC 1738 section 2.2, passed through as-is.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

fn hex_digit(nibble: u8) -> u8 {
    match nibble {
        0..=9 => b'0' + nibble,
        _ => b'A' + nibble - 10,
    }
}

/// Writes `segment` percent-encoded and returns the encoded length.
///
/// Everything except alphanumerics and `-_.~` becomes `%XX` with uppercase
/// hex digits.
pub fn write_encoded(sink: &mut dyn Sink, segment: &str) -> usize {
    let mut n = 0;
    for &byte in segment.as_bytes() {
        if is_unreserved(byte) {
            sink.write_byte(byte);
            n += 1;
        } else {
            sink.write_bytes(&[b'%', hex_digit(byte >> 4), hex_digit(byte & 0x0F)]);
            n += 3;
        }
    }
    n
}

/// Writes `METHOD <path> HTTP/1.0\r\n`, with `path` producing the target.
pub fn write_request_line<F>(sink: &mut dyn Sink, method: Method, path: F)
where
    F: FnOnce(&mut dyn Sink),
{
    sink.write_str(method.as_str());
    sink.write_byte(b' ');
    path(sink);
    sink.write_str(VERSION);
    sink.write_bytes(CRLF);
}

/// Writes one `Name: value\r\n` line.
pub fn write_header(sink: &mut dyn Sink, name: &str, value: &str) {
    sink.write_str(name);
    sink.write_bytes(b": ");
    sink.write_str(value);
    sink.write_bytes(CRLF);
}

/// Writes the JSON content headers when a body follows, then the blank line
/// that ends the header block.
pub fn finish_headers(sink: &mut dyn Sink, content_length: usize) {
    if content_length > 0 {
        write_header(sink, "Content-Type", "application/json");
        write!(sink, "Content-Length: {}\r\n", content_length);
    }
    sink.write_bytes(CRLF);
}
