//! M2X time-series API client for devices behind a polling Ethernet driver.
//!
//! # Overview
//!
//! A device reports stream values and its location, and acknowledges
//! commands, over plain HTTP/1.0 on a fresh TCP connection per call:
//!
//! | Operation | Request |
//! |---|---|
//! | [`Client::update_stream_value`] | `PUT /v2/devices/{device}/streams/{stream}/value` |
//! | [`Client::post_stream_values`] | `POST /v2/devices/{device}/streams/{stream}/values` |
//! | [`Client::post_device_updates`] | `POST /v2/devices/{device}/updates` |
//! | [`Client::post_device_update`] | `POST /v2/devices/{device}/update` |
//! | [`Client::update_location`] | `PUT /v2/devices/{device}/location` |
//! | [`Client::delete_values`] | `DELETE /v2/devices/{device}/streams/{stream}/values` |
//! | [`Client::mark_command_processed`] | `POST /v2/devices/{device}/commands/{id}/process` |
//! | [`Client::mark_command_rejected`] | `POST /v2/devices/{device}/commands/{id}/reject` |
//! | [`Client::get_time`] | `GET /v2/time/{seconds,millis,iso8601}` |
//!
//! Operations return the HTTP status code, or an [`Error`](crate::network::error::Error)
//! for local failures. Nothing is retried.
//!
//! # Example
//!
//! ```rust
//! use core::net::{Ipv4Addr, SocketAddrV4};
//! use libm2x::network::application::http::Sink;
//! use libm2x::network::application::m2x::{Client, Config};
//! use libm2x::network::{ConnectionId, Delay, Event, Handler, Transport};
//!
//! /// Answers every request with `204 No Content`.
//! struct Loopback {
//!     open: Option<ConnectionId>,
//!     sent: bool,
//! }
//!
//! impl Transport for Loopback {
//!     type Error = ();
//!     fn open(&mut self, _remote: SocketAddrV4) -> Result<ConnectionId, ()> {
//!         self.open = Some(ConnectionId(1));
//!         Ok(ConnectionId(1))
//!     }
//!     fn poll(&mut self, handler: &mut dyn Handler) -> Result<(), ()> {
//!         let Some(id) = self.open else { return Ok(()) };
//!         if !self.sent {
//!             let mut packet = [0u8; 512];
//!             self.sent = handler.fill(id, &mut packet) > 0;
//!         } else {
//!             handler.receive(id, Event::Data(b"HTTP/1.0 204 No Content\r\n\r\n"));
//!         }
//!         Ok(())
//!     }
//! }
//!
//! struct NoDelay;
//! impl Delay for NoDelay {
//!     fn delay_ms(&mut self, _ms: u32) {}
//! }
//!
//! let config = Config::new("api-key", Ipv4Addr::new(127, 0, 0, 1));
//! let transport = Loopback { open: None, sent: false };
//! let mut client = Client::new(config, transport, NoDelay);
//!
//! let status = client.update_stream_value("device-id", "temperature", |sink| {
//!     write!(sink, "{:.1}", 21.5_f32);
//! });
//! assert_eq!(status, Ok(204));
//! ```

/// Polling client and endpoint configuration.
pub mod client;

/// Per-call request/response state handed to the transport.
pub mod exchange;

/// Request templates for each API call.
pub mod operation;

pub use client::{Client, Config, DEFAULT_PORT, DEFAULT_TIMEOUT_SECONDS, Reply};
pub use exchange::Exchange;
pub use operation::{
    ApiVersion, CommandAck, CommandAction, DeleteValues, DeviceUpdate, DeviceUpdates, Location,
    LocationField, Operation, RangeBound, ServerTime, StreamValue, StreamValues, TimeFormat,
};
