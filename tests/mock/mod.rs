#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddrV4;

use libm2x::network::{ConnectionId, Delay, Event, Handler, Transport};

pub const PACKET_SIZE: usize = 512;

/// What the mock driver does on one poll.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Ask the handler for the outgoing packet.
    Fill,
    /// Deliver response bytes for the active connection.
    Respond(&'static [u8]),
    /// Deliver response bytes for some other connection.
    Stale(&'static [u8]),
    /// Report a driver failure for the active connection.
    Fail(u8),
    /// Nothing pending.
    Idle,
}

/// Scripted stand-in for a polling Ethernet driver.
#[derive(Debug)]
pub struct MockTransport {
    script: VecDeque<Step>,
    packet_size: usize,
    next_id: u8,
    pub active: Option<ConnectionId>,
    pub opened: Vec<SocketAddrV4>,
    pub sent: Vec<Vec<u8>>,
    pub polls: usize,
    pub refuse_open: bool,
}

impl MockTransport {
    pub fn new(script: &[Step]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            packet_size: PACKET_SIZE,
            next_id: 3,
            active: None,
            opened: Vec::new(),
            sent: Vec::new(),
            polls: 0,
            refuse_open: false,
        }
    }

    /// Sends the request, then answers with `response`.
    pub fn answering(response: &'static [u8]) -> Self {
        Self::new(&[Step::Fill, Step::Respond(response)])
    }

    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = packet_size;
        self
    }

    /// The last transmitted request as text.
    pub fn request(&self) -> String {
        let bytes = self.sent.last().expect("no request was sent");
        String::from_utf8(bytes.clone()).expect("request is not UTF-8")
    }
}

impl Transport for MockTransport {
    type Error = ();

    fn open(&mut self, remote: SocketAddrV4) -> Result<ConnectionId, Self::Error> {
        if self.refuse_open {
            return Err(());
        }
        let id = ConnectionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.active = Some(id);
        self.opened.push(remote);
        Ok(id)
    }

    fn poll(&mut self, handler: &mut dyn Handler) -> Result<(), Self::Error> {
        self.polls += 1;
        let Some(id) = self.active else {
            return Ok(());
        };
        match self.script.pop_front().unwrap_or(Step::Idle) {
            Step::Fill => {
                let mut packet = vec![0u8; self.packet_size];
                let n = handler.fill(id, &mut packet);
                if n > 0 {
                    self.sent.push(packet[..n].to_vec());
                }
            }
            Step::Respond(bytes) => handler.receive(id, Event::Data(bytes)),
            Step::Stale(bytes) => {
                let stale = ConnectionId(id.0.wrapping_add(100));
                handler.receive(stale, Event::Data(bytes));
                let mut packet = vec![0u8; self.packet_size];
                assert_eq!(handler.fill(stale, &mut packet), 0);
            }
            Step::Fail(code) => handler.receive(id, Event::Failed(code)),
            Step::Idle => {}
        }
        Ok(())
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls: u32,
    pub total_ms: u32,
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ms += ms;
    }
}

#[cfg(feature = "async")]
impl libm2x::network::AsyncDelay for MockDelay {
    async fn delay_ms(&mut self, ms: u32) {
        Delay::delay_ms(self, ms);
    }
}

/// Splits a request into its header block and body, checking that the
/// declared `Content-Length` matches the body actually written.
pub fn split(request: &str) -> (&str, &str) {
    let (head, body) = request
        .split_once("\r\n\r\n")
        .expect("request has no header terminator");
    let declared = head
        .lines()
        .find_map(|line| line.strip_prefix("Content-Length: "))
        .map(|n| n.parse::<usize>().expect("numeric content length"))
        .unwrap_or(0);
    assert_eq!(declared, body.len(), "Content-Length disagrees with body");
    (head, body)
}

/// First line of a request without its CRLF.
pub fn request_line(request: &str) -> &str {
    request.split("\r\n").next().unwrap_or_default()
}
