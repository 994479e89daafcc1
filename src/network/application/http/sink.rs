//! Byte sinks that request builders stream into.
//!
//! A [`Counter`] stores nothing and only tallies, which lets a builder learn
//! the exact body size before the body is written for real. That is how a
//! correct `Content-Length` precedes the body in one forward pass without the
//! body ever being held in RAM.

use core::fmt;

use serde::Serialize;

use crate::network::error::Error;

/// Scratch space for [`write_json`](dyn Sink::write_json).
const JSON_SCRATCH_LEN: usize = 64;

/// A destination for request bytes with counted writes.
///
/// Writes never fail. Sinks with finite capacity drop what does not fit and
/// report it through their own API. A value that cannot be encoded at all is
/// remembered with [`fail`](Sink::fail) so the request built around it is
/// never sent.
pub trait Sink {
    /// Appends `bytes`.
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Total bytes offered to this sink so far, including any a bounded sink
    /// had to drop.
    fn written(&self) -> usize;

    /// Records an encoding failure. Only the first one is kept.
    fn fail(&mut self, _error: Error) {}

    /// The first recorded encoding failure.
    fn error(&self) -> Option<Error> {
        None
    }

    /// Appends a UTF-8 string.
    fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Appends one byte.
    fn write_byte(&mut self, byte: u8) {
        self.write_bytes(&[byte]);
    }

    /// Appends formatted text, so `write!(sink, ...)` works on any sink.
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        let _ = fmt::write(&mut Adapter(self), args);
    }
}

impl dyn Sink + '_ {
    /// Serializes `value` as JSON and appends it.
    ///
    /// Strings come out quoted and escaped, numbers in their shortest form.
    /// When the encoding exceeds the scratch buffer nothing is written and the
    /// sink records [`Error::JsonInvalid`], which fails the whole request.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let mut scratch = [0u8; JSON_SCRATCH_LEN];
        match serde_json_core::to_slice(value, &mut scratch) {
            Ok(len) => {
                self.write_bytes(&scratch[..len]);
                Ok(())
            }
            Err(_) => {
                self.fail(Error::JsonInvalid);
                Err(Error::JsonInvalid)
            }
        }
    }
}

struct Adapter<'s, S: ?Sized>(&'s mut S);

impl<S: Sink + ?Sized> fmt::Write for Adapter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// A sink that only counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    count: usize,
    error: Option<Error>,
}

impl Counter {
    /// Creates a counter at zero.
    pub const fn new() -> Self {
        Self {
            count: 0,
            error: None,
        }
    }
}

impl Sink for Counter {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.count += bytes.len();
    }

    fn written(&self) -> usize {
        self.count
    }

    fn fail(&mut self, error: Error) {
        self.error.get_or_insert(error);
    }

    fn error(&self) -> Option<Error> {
        self.error
    }
}

/// Runs `f` against a fresh [`Counter`] and returns how many bytes it wrote.
pub fn measure<F>(f: F) -> usize
where
    F: FnOnce(&mut dyn Sink),
{
    let mut counter = Counter::new();
    f(&mut counter);
    counter.written()
}

/// A sink over a caller-owned fixed buffer, typically the driver's packet.
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
    offered: usize,
    error: Option<Error>,
}

impl<'a> SliceSink<'a> {
    /// Wraps `buf`, writing from offset zero.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            offered: 0,
            error: None,
        }
    }

    /// Number of bytes actually stored.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether any write was cut short.
    pub fn overflowed(&self) -> bool {
        self.offered > self.pos
    }

    /// The stored bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl Sink for SliceSink<'_> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.offered += bytes.len();
        let room = self.buf.len() - self.pos;
        let n = bytes.len().min(room);
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
    }

    fn written(&self) -> usize {
        self.offered
    }

    fn fail(&mut self, error: Error) {
        self.error.get_or_insert(error);
    }

    fn error(&self) -> Option<Error> {
        self.error
    }
}

/// A sink that owns a fixed-capacity `heapless` buffer.
#[derive(Debug, Default, Clone)]
pub struct VecSink<const N: usize> {
    buf: heapless::Vec<u8, N>,
    offered: usize,
    error: Option<Error>,
}

impl<const N: usize> VecSink<N> {
    /// Creates an empty sink.
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            offered: 0,
            error: None,
        }
    }

    /// Whether any write was cut short.
    pub fn overflowed(&self) -> bool {
        self.offered > self.buf.len()
    }

    /// The stored bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Releases the buffer.
    pub fn into_inner(self) -> heapless::Vec<u8, N> {
        self.buf
    }
}

impl<const N: usize> Sink for VecSink<N> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.offered += bytes.len();
        let n = bytes.len().min(N - self.buf.len());
        // Cannot fail: `n` fits the remaining capacity.
        let _ = self.buf.extend_from_slice(&bytes[..n]);
    }

    fn written(&self) -> usize {
        self.offered
    }

    fn fail(&mut self, error: Error) {
        self.error.get_or_insert(error);
    }

    fn error(&self) -> Option<Error> {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_counts_every_write_shape() {
        let mut counter = Counter::new();
        counter.write_byte(b'{');
        counter.write_bytes(b"\"value\":");
        counter.write_str("23.5");
        write!(counter, "{}", 1234);
        assert_eq!(counter.written(), 1 + 8 + 4 + 4);
    }

    #[test]
    fn measure_matches_real_write() {
        let body = |sink: &mut dyn Sink| {
            sink.write_str("{\"value\":");
            write!(sink, "{:.2}", 21.456_f32);
            sink.write_byte(b'}');
        };
        let mut out = VecSink::<64>::new();
        body(&mut out);
        assert_eq!(measure(body), out.written());
        assert_eq!(out.as_bytes(), b"{\"value\":21.46}");
    }

    #[test]
    fn slice_sink_truncates_and_flags_overflow() {
        let mut buf = [0u8; 4];
        let mut sink = SliceSink::new(&mut buf);
        sink.write_str("HTTP");
        assert!(!sink.overflowed());
        sink.write_str("/1.0");
        assert!(sink.overflowed());
        assert_eq!(sink.position(), 4);
        assert_eq!(sink.written(), 8);
        assert_eq!(sink.as_bytes(), b"HTTP");
    }

    #[test]
    fn write_json_quotes_and_escapes_strings() {
        let mut out = VecSink::<32>::new();
        let sink: &mut dyn Sink = &mut out;
        sink.write_json("Lab \"A\"").unwrap();
        sink.write_byte(b',');
        sink.write_json(&42u32).unwrap();
        assert_eq!(out.as_bytes(), b"\"Lab \\\"A\\\"\",42");
        assert_eq!(out.error(), None);
    }

    #[test]
    fn write_json_rejects_oversized_values() {
        let mut counter = Counter::new();
        let sink: &mut dyn Sink = &mut counter;
        let long = "x".repeat(JSON_SCRATCH_LEN);
        assert_eq!(sink.write_json(long.as_str()), Err(Error::JsonInvalid));
        assert_eq!(counter.written(), 0);
        assert_eq!(counter.error(), Some(Error::JsonInvalid));
    }

    #[test]
    fn first_failure_sticks() {
        let mut buf = [0u8; 8];
        let mut sink = SliceSink::new(&mut buf);
        sink.fail(Error::JsonInvalid);
        sink.fail(Error::Invalid);
        assert_eq!(sink.error(), Some(Error::JsonInvalid));
    }

    #[test]
    fn vec_sink_counts_dropped_bytes() {
        let mut out = VecSink::<4>::new();
        out.write_str("HTTP/1.0");
        assert!(out.overflowed());
        assert_eq!(out.written(), 8);
        assert_eq!(out.as_bytes(), b"HTTP");
        assert_eq!(out.into_inner().len(), 4);
    }
}
