//! Single-pass scanners over a received header chunk.
//!
//! Everything here is built on [`wait_for`], a substring search where `*` in
//! the pattern matches any one byte. The three readers are independent: a
//! caller that needs status, length and body offset scans three times.

use crate::network::error::Error;

const STATUS_LINE: &[u8] = b"HTTP/*.* ";
const CONTENT_LENGTH: &[u8] = b"Content-Length: ";
const HEADER_END: &[u8] = b"\n\r\n";
const STATUS_DIGITS: usize = 3;

/// Pattern byte that matches any single input byte.
pub const WILDCARD: u8 = b'*';

/// How header text is compared against a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Case {
    /// Byte-exact comparison.
    Sensitive,
    /// ASCII letters compare equal regardless of case.
    #[default]
    Insensitive,
}

impl Case {
    fn matches(self, a: u8, b: u8) -> bool {
        match self {
            Case::Sensitive => a == b,
            Case::Insensitive => a.eq_ignore_ascii_case(&b),
        }
    }
}

/// Finds the first match of `pattern` in `buf` and returns the offset just
/// past it.
///
/// An empty pattern matches at offset zero.
pub fn wait_for(buf: &[u8], pattern: &[u8], case: Case) -> Result<usize, Error> {
    if pattern.is_empty() {
        return Ok(0);
    }
    for start in 0..buf.len() {
        let window = &buf[start..];
        if window.len() < pattern.len() {
            break;
        }
        let hit = pattern
            .iter()
            .zip(window)
            .all(|(&p, &b)| p == WILDCARD || case.matches(b, p));
        if hit {
            return Ok(start + pattern.len());
        }
    }
    Err(Error::NoMatch)
}

/// Reads the three-digit status code following `HTTP/x.y `.
///
/// The digits are not validated. Garbage in yields a garbage code, never a
/// panic.
pub fn read_status_code(buf: &[u8], case: Case) -> Result<u16, Error> {
    let start = wait_for(buf, STATUS_LINE, case)?;
    let digits = buf
        .get(start..start + STATUS_DIGITS)
        .ok_or(Error::Disconnected)?;
    Ok(digits.iter().fold(0u16, |code, &d| {
        code.wrapping_mul(10)
            .wrapping_add(u16::from(d.wrapping_sub(b'0')))
    }))
}

/// Reads the decimal value of the `Content-Length` header.
///
/// The value must be terminated by CR or LF inside `buf`. Zero is treated as
/// absent.
pub fn read_content_length(buf: &[u8], case: Case) -> Result<usize, Error> {
    let start = wait_for(buf, CONTENT_LENGTH, case)?;
    let mut length = 0usize;
    for &c in &buf[start..] {
        if c == b'\r' || c == b'\n' {
            return match length {
                0 => Err(Error::Invalid),
                n => Ok(n),
            };
        }
        length = length
            .wrapping_mul(10)
            .wrapping_add(usize::from(c.wrapping_sub(b'0')));
    }
    Err(Error::Invalid)
}

/// Returns the offset where the body starts, right after the blank line that
/// closes the header block.
pub fn skip_header(buf: &[u8], case: Case) -> Result<usize, Error> {
    wait_for(buf, HEADER_END, case)
}
