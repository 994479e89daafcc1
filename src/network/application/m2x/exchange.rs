//! Per-call request/response state.
//!
//! An [`Exchange`] lives for exactly one operation. It is handed to the
//! transport on every poll, regenerates the request whenever the driver asks
//! for the packet, and records the first response it sees for its own
//! connection. Everything addressed to another connection, and anything that
//! arrives after the outcome is decided, is dropped.

use super::client::Config;
use super::operation::{ApiVersion, Operation, write_request};
use crate::network::application::http::parser::{
    Case, read_content_length, read_status_code, skip_header,
};
use crate::network::application::http::sink::SliceSink;
use crate::network::error::Error;
use crate::network::{ConnectionId, Event, Handler};

const STATUS_OK: u16 = 200;

/// State of one in-flight operation.
pub struct Exchange<'a, O> {
    key: &'a str,
    api: ApiVersion,
    case: Case,
    op: O,
    connection: Option<ConnectionId>,
    outcome: Option<Result<u16, Error>>,
    body: Option<&'a mut [u8]>,
    body_len: usize,
}

impl<'a, O: Operation> Exchange<'a, O> {
    /// Prepares `op` for the endpoint in `config`, without a response body.
    pub fn new(config: &Config<'a>, op: O) -> Result<Self, Error> {
        if !op.supports(config.api) {
            warn!("operation has no route in {}", config.api);
            return Err(Error::Unsupported);
        }
        Ok(Self {
            key: config.api_key,
            api: config.api,
            case: config.case,
            op,
            connection: None,
            outcome: None,
            body: None,
            body_len: 0,
        })
    }

    /// Like [`new`](Self::new), but a 200 response's body is copied into
    /// `body`.
    pub fn with_body(config: &Config<'a>, op: O, body: &'a mut [u8]) -> Result<Self, Error> {
        let mut exchange = Self::new(config, op)?;
        exchange.body = Some(body);
        Ok(exchange)
    }

    /// Binds the exchange to the connection the transport just opened.
    pub fn bind(&mut self, id: ConnectionId) {
        self.connection = Some(id);
        self.outcome = None;
        self.body_len = 0;
    }

    /// The decided outcome, if any: a status code or a local error.
    pub fn outcome(&self) -> Option<Result<u16, Error>> {
        self.outcome
    }

    /// Bytes of body copied into the caller's buffer.
    pub fn body_len(&self) -> usize {
        self.body_len
    }

    fn is_current(&self, id: ConnectionId) -> bool {
        self.connection == Some(id)
    }

    fn decode(&mut self, data: &[u8]) -> Result<u16, Error> {
        let status = read_status_code(data, self.case)?;
        if status == STATUS_OK {
            if let Some(buf) = self.body.as_deref_mut() {
                self.body_len = copy_body(data, buf, self.case)?;
            }
        }
        Ok(status)
    }
}

/// Copies the body announced by `Content-Length` from `data` into `buf`.
fn copy_body(data: &[u8], buf: &mut [u8], case: Case) -> Result<usize, Error> {
    let length = read_content_length(data, case).map_err(|_| Error::Invalid)?;
    if buf.len() < length {
        return Err(Error::BufferTooSmall { required: length });
    }
    let offset = skip_header(data, case).map_err(|_| Error::Invalid)?;
    let body = data.get(offset..offset + length).ok_or(Error::Invalid)?;
    buf[..length].copy_from_slice(body);
    Ok(length)
}

impl<O: Operation> Handler for Exchange<'_, O> {
    fn fill(&mut self, id: ConnectionId, packet: &mut [u8]) -> usize {
        if !self.is_current(id) || self.outcome.is_some() {
            trace!("skipping fill for connection {}", id);
            return 0;
        }
        let mut sink = SliceSink::new(packet);
        let required = match write_request(&mut self.op, self.api, self.key, &mut sink) {
            Ok(required) => required,
            Err(error) => {
                warn!("request not sent: {}", error);
                self.outcome = Some(Err(error));
                return 0;
            }
        };
        if sink.overflowed() {
            warn!("request needs {} bytes, packet holds {}", required, sink.position());
            self.outcome = Some(Err(Error::BufferTooSmall { required }));
            return 0;
        }
        trace!("filled {} request bytes", required);
        required
    }

    fn receive(&mut self, id: ConnectionId, event: Event<'_>) {
        if !self.is_current(id) {
            trace!("ignoring event for stale connection {}", id);
            return;
        }
        if self.outcome.is_some() {
            trace!("ignoring event after outcome for connection {}", id);
            return;
        }
        let outcome = match event {
            Event::Data(data) => self.decode(data),
            Event::Failed(code) => {
                warn!("transport failed connection {} with {}", id, code);
                Err(Error::Disconnected)
            }
        };
        debug!("connection {} decided: {}", id, outcome);
        self.outcome = Some(outcome);
    }
}

impl<O> core::fmt::Debug for Exchange<'_, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Exchange")
            .field("api", &self.api)
            .field("connection", &self.connection)
            .field("outcome", &self.outcome)
            .field("body_len", &self.body_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::application::http::Sink;
    use crate::network::application::m2x::operation::{ServerTime, StreamValue};
    use core::net::Ipv4Addr;

    fn config() -> Config<'static> {
        Config::new("k3y", Ipv4Addr::new(10, 0, 0, 1))
    }

    fn put() -> StreamValue<'static, impl FnMut(&mut dyn Sink)> {
        StreamValue {
            device: "dev",
            stream: "temp",
            value: |sink: &mut dyn Sink| sink.write_str("21"),
        }
    }

    #[test]
    fn fill_ignores_other_connections() {
        let config = config();
        let mut exchange = Exchange::new(&config, put()).unwrap();
        let mut packet = [0u8; 256];
        assert_eq!(exchange.fill(ConnectionId(1), &mut packet), 0);
        exchange.bind(ConnectionId(2));
        assert_eq!(exchange.fill(ConnectionId(1), &mut packet), 0);
        assert!(exchange.fill(ConnectionId(2), &mut packet) > 0);
    }

    #[test]
    fn refill_produces_identical_bytes() {
        let config = config();
        let mut exchange = Exchange::new(&config, put()).unwrap();
        exchange.bind(ConnectionId(7));
        let mut first = [0u8; 256];
        let mut second = [0u8; 256];
        let n = exchange.fill(ConnectionId(7), &mut first);
        assert_eq!(exchange.fill(ConnectionId(7), &mut second), n);
        assert_eq!(first[..n], second[..n]);
    }

    #[test]
    fn small_packet_decides_buffer_too_small() {
        let config = config();
        let mut exchange = Exchange::new(&config, put()).unwrap();
        exchange.bind(ConnectionId(0));
        let mut packet = [0u8; 16];
        assert_eq!(exchange.fill(ConnectionId(0), &mut packet), 0);
        match exchange.outcome() {
            Some(Err(Error::BufferTooSmall { required })) => assert!(required > 16),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn first_response_wins() {
        let config = config();
        let mut exchange = Exchange::new(&config, put()).unwrap();
        exchange.bind(ConnectionId(3));
        exchange.receive(ConnectionId(9), Event::Data(b"HTTP/1.0 500 Oops\r\n"));
        assert_eq!(exchange.outcome(), None);
        exchange.receive(ConnectionId(3), Event::Data(b"HTTP/1.0 202 Accepted\r\n"));
        exchange.receive(ConnectionId(3), Event::Data(b"HTTP/1.0 404 Not Found\r\n"));
        exchange.receive(ConnectionId(3), Event::Failed(4));
        assert_eq!(exchange.outcome(), Some(Ok(202)));
    }

    #[test]
    fn transport_failure_is_disconnected() {
        let config = config();
        let mut exchange = Exchange::new(&config, put()).unwrap();
        exchange.bind(ConnectionId(3));
        exchange.receive(ConnectionId(3), Event::Failed(1));
        assert_eq!(exchange.outcome(), Some(Err(Error::Disconnected)));
    }

    #[test]
    fn body_is_copied_only_on_200() {
        let config = config();
        let mut buf = [0u8; 8];
        let mut exchange = Exchange::with_body(&config, ServerTime::default(), &mut buf).unwrap();
        exchange.bind(ConnectionId(1));
        exchange.receive(
            ConnectionId(1),
            Event::Data(b"HTTP/1.0 404 Not Found\r\nContent-Length: 3\r\n\r\nnop"),
        );
        assert_eq!(exchange.outcome(), Some(Ok(404)));
        assert_eq!(exchange.body_len(), 0);
    }

    #[test]
    fn truncated_body_is_invalid() {
        let config = config();
        let mut buf = [0u8; 8];
        let mut exchange = Exchange::with_body(&config, ServerTime::default(), &mut buf).unwrap();
        exchange.bind(ConnectionId(1));
        exchange.receive(
            ConnectionId(1),
            Event::Data(b"HTTP/1.0 200 OK\r\nContent-Length: 6\r\n\r\nabc"),
        );
        assert_eq!(exchange.outcome(), Some(Err(Error::Invalid)));
    }

    #[test]
    fn missing_content_length_is_invalid() {
        let config = config();
        let mut buf = [0u8; 8];
        let mut exchange = Exchange::with_body(&config, ServerTime::default(), &mut buf).unwrap();
        exchange.bind(ConnectionId(1));
        exchange.receive(ConnectionId(1), Event::Data(b"HTTP/1.0 200 OK\r\n\r\nabc"));
        assert_eq!(exchange.outcome(), Some(Err(Error::Invalid)));
    }
}
