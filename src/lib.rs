//! # libm2x - M2X client for constrained devices
//!
//! A `no_std` HTTP client that lets a microcontroller behind a polling
//! Ethernet driver report telemetry and location to the M2X time-series
//! service, delete stream values, read the server clock, and acknowledge
//! commands.
//!
//! ## Features
//!
//! - **No allocation**: requests are streamed into the driver's packet buffer
//!   and response headers are scanned in place
//! - **Lazy bodies**: JSON bodies are produced by caller closures at fixed
//!   slots and measured with a counting sink, so `Content-Length` is exact
//!   without ever materializing the body
//! - **Transport agnostic**: any driver implementing
//!   [`Transport`](network::Transport) works; the library never touches a
//!   socket
//! - **Single pass parsing**: status code, content length and body offset
//!   come from one wildcard substring primitive
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libm2x = "0.1.0"
//! ```
//!
//! ### Reporting a reading
//!
//! ```rust,no_run
//! use core::net::Ipv4Addr;
//! use libm2x::network::application::m2x::{Client, Config};
//! # use libm2x::network::{ConnectionId, Delay, Handler, Transport};
//! # struct Driver;
//! # impl Transport for Driver {
//! #     type Error = ();
//! #     fn open(&mut self, _remote: core::net::SocketAddrV4) -> Result<ConnectionId, ()> { Ok(ConnectionId(0)) }
//! #     fn poll(&mut self, _handler: &mut dyn Handler) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct Board;
//! # impl Delay for Board {
//! #     fn delay_ms(&mut self, _ms: u32) {}
//! # }
//!
//! let config = Config::new("your-api-key", Ipv4Addr::new(54, 197, 240, 28));
//! let mut client = Client::new(config, Driver, Board);
//!
//! let readings = [21.5_f32, 21.7, 21.6];
//! let stamps = ["2024-01-01T00:00:00Z", "2024-01-01T00:01:00Z", "2024-01-01T00:02:00Z"];
//! let status = client.post_stream_values(
//!     "device-id",
//!     "temperature",
//!     readings.len(),
//!     |sink, i| {
//!         let _ = sink.write_json(stamps[i]);
//!     },
//!     |sink, i| write!(sink, "{}", readings[i]),
//! );
//! ```
//!
//! ## Optional Features
//!
//! - `std`: Implement `std::error::Error` for the error type
//! - `async`: Drive requests with an async delay instead of a blocking one
//! - `defmt`: Log request lifecycle events and derive `defmt::Format`

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Transport traits, error types and the HTTP/M2X protocol layers.
///
/// The transport traits model a cooperative Ethernet driver; the
/// [`application`](network::application) module holds everything that runs
/// on top of it.
pub mod network;
