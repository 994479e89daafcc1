//! A polling transport abstraction for embedded Ethernet drivers
//!
//! The library never owns a socket. It relies on a driver that can queue a
//! TCP request, ask for the outgoing packet on demand, and hand back the first
//! chunk of the response, all from inside a non-blocking poll call. These
//! traits describe that capability; board support crates implement them.
//!
//! ```text
//!   Client ──open()──▶ Transport ──fill(id, packet)──▶ Handler
//!     │                    ▲     ──receive(id, event)─▶   │
//!     └──poll(handler)─────┘                              ▼
//!                                                 decided outcome
//! ```

#![allow(missing_docs)]
#![allow(async_fn_in_trait)]
#![deny(unsafe_code)]

use core::net::SocketAddrV4;

/// Common error types for network operations
pub mod error;

/// Application layer protocols built on the transport
pub mod application;

/// Re-exports of common traits
pub mod prelude {
    #[cfg(feature = "async")]
    pub use super::AsyncDelay;
    pub use super::{Delay, Handler, Transport};
}

/// Transport-assigned handle of one queued TCP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionId(pub u8);

/// A network event delivered for a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// The first chunk of response bytes, starting at the status line.
    Data(&'a [u8]),
    /// The driver gave up on the connection with its own status code.
    Failed(u8),
}

/// Receiver of transport callbacks for the request in flight.
pub trait Handler {
    /// Writes the outgoing request for `id` into `packet`, returning the
    /// number of bytes to transmit.
    ///
    /// The driver may call this more than once for the same connection when
    /// it retransmits.
    fn fill(&mut self, id: ConnectionId, packet: &mut [u8]) -> usize;

    /// Delivers a response event for `id`.
    fn receive(&mut self, id: ConnectionId, event: Event<'_>);
}

/// A cooperative, single-threaded TCP driver.
pub trait Transport {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Queues a new request to `remote`.
    fn open(&mut self, remote: SocketAddrV4) -> Result<ConnectionId, Self::Error>;

    /// Processes at most one pending network event, invoking `handler` as
    /// needed. Must return immediately when nothing is pending.
    fn poll(&mut self, handler: &mut dyn Handler) -> Result<(), Self::Error>;
}

/// Blocking board delay.
pub trait Delay {
    /// Pauses for roughly `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Delay that yields to an executor instead of spinning.
#[cfg(feature = "async")]
pub trait AsyncDelay {
    /// Pauses for roughly `ms` milliseconds.
    async fn delay_ms(&mut self, ms: u32);
}
