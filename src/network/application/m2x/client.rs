//! The polling M2X client.
//!
//! Each public operation builds an [`Exchange`], queues a TCP request with the
//! transport, and then polls in 100 ms ticks until the exchange decides an
//! outcome or `timeout_seconds * 10` ticks have elapsed. Ticks are counted
//! rather than read from a clock so a wrapping millisecond counter on the
//! board cannot stretch or cut the deadline.

use core::net::{Ipv4Addr, SocketAddrV4};

use super::exchange::Exchange;
use super::operation::{
    ApiVersion, CommandAck, CommandAction, DeleteValues, DeviceUpdate, DeviceUpdates, Location,
    LocationField, Operation, RangeBound, ServerTime, StreamValue, StreamValues, TimeFormat,
};
use crate::network::application::http::{Case, Sink};
use crate::network::error::Error;
#[cfg(feature = "async")]
use crate::network::AsyncDelay;
use crate::network::{Delay, Transport};

/// Default M2X HTTP port.
pub const DEFAULT_PORT: u16 = 80;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECONDS: u16 = 15;

const TICK_MS: u32 = 100;
const TICKS_PER_SECOND: u32 = 1000 / TICK_MS;

/// An epoch second count is at most 19 decimal digits.
const SECONDS_BODY_LEN: usize = 20;

/// Endpoint and credentials for one M2X service.
///
/// # Examples
///
/// ```rust
/// use core::net::Ipv4Addr;
/// use libm2x::network::application::m2x::{ApiVersion, Config};
///
/// let mut config = Config::new("2b5e0c7f", Ipv4Addr::new(54, 197, 240, 28));
/// config.timeout_seconds = 5;
/// assert_eq!(config.remote.port(), 80);
/// assert_eq!(config.api, ApiVersion::V2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config<'a> {
    /// Value of the `X-M2X-KEY` header.
    pub api_key: &'a str,
    /// Address and port of the API server.
    pub remote: SocketAddrV4,
    /// Seconds to wait for a status line before giving up.
    pub timeout_seconds: u16,
    /// How response header names are matched.
    pub case: Case,
    /// API revision to speak.
    pub api: ApiVersion,
}

impl<'a> Config<'a> {
    /// Defaults: port 80, 15 s timeout, case-insensitive headers, API v2.
    pub fn new(api_key: &'a str, address: Ipv4Addr) -> Self {
        Self {
            api_key,
            remote: SocketAddrV4::new(address, DEFAULT_PORT),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            case: Case::default(),
            api: ApiVersion::default(),
        }
    }
}

/// Result of an operation that returns a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// HTTP status code.
    pub status: u16,
    /// Bytes of body copied into the caller's buffer; zero unless the status
    /// was 200.
    pub body_len: usize,
}

/// An M2X client bound to one endpoint.
///
/// The client owns its transport and delay. Every operation borrows the
/// client mutably, so at most one request is in flight per client.
pub struct Client<'a, T, D> {
    config: Config<'a>,
    transport: T,
    delay: D,
}

impl<'a, T: Transport, D> Client<'a, T, D> {
    /// Creates a client. No traffic is generated until an operation runs.
    pub fn new(config: Config<'a>, transport: T, delay: D) -> Self {
        Self {
            config,
            transport,
            delay,
        }
    }

    /// The endpoint configuration.
    pub fn config(&self) -> &Config<'a> {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Releases the transport and delay.
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    fn ticks(&self) -> u32 {
        u32::from(self.config.timeout_seconds) * TICKS_PER_SECOND
    }

    /// Drains one stale event, then queues the request and binds it.
    fn issue<O: Operation>(&mut self, exchange: &mut Exchange<'_, O>) -> Result<(), Error> {
        self.transport
            .poll(exchange)
            .map_err(|_| Error::Disconnected)?;
        let id = self
            .transport
            .open(self.config.remote)
            .map_err(|_| Error::Disconnected)?;
        debug!("request queued on connection {}", id);
        exchange.bind(id);
        Ok(())
    }

    /// One tick of the driver: deliver one event, then check for an outcome.
    fn tick<O: Operation>(
        &mut self,
        exchange: &mut Exchange<'_, O>,
    ) -> Result<Option<Result<u16, Error>>, Error> {
        self.transport
            .poll(exchange)
            .map_err(|_| Error::Disconnected)?;
        Ok(exchange.outcome())
    }
}

impl<'a, T: Transport, D: Delay> Client<'a, T, D> {
    /// Runs `op` and returns the HTTP status code.
    pub fn send<O: Operation>(&mut self, op: O) -> Result<u16, Error> {
        let mut exchange = Exchange::new(&self.config, op)?;
        self.drive(&mut exchange)
    }

    /// Runs `op` and copies a 200 response's body into `body`.
    pub fn fetch<O: Operation>(&mut self, op: O, body: &mut [u8]) -> Result<Reply, Error> {
        let mut exchange = Exchange::with_body(&self.config, op, body)?;
        let status = self.drive(&mut exchange)?;
        Ok(Reply {
            status,
            body_len: exchange.body_len(),
        })
    }

    fn drive<O: Operation>(&mut self, exchange: &mut Exchange<'_, O>) -> Result<u16, Error> {
        self.issue(exchange)?;
        for _ in 0..self.ticks() {
            if let Some(outcome) = self.tick(exchange)? {
                return outcome;
            }
            self.delay.delay_ms(TICK_MS);
        }
        warn!("no response within {} s", self.config.timeout_seconds);
        Err(Error::Timeout)
    }

    /// Sets the current value of `stream`.
    ///
    /// `value` writes the bare value; the library wraps it in quotes.
    pub fn update_stream_value<F>(
        &mut self,
        device: &str,
        stream: &str,
        value: F,
    ) -> Result<u16, Error>
    where
        F: FnMut(&mut dyn Sink),
    {
        self.send(StreamValue {
            device,
            stream,
            value,
        })
    }

    /// Posts `count` timestamped values to `stream`.
    pub fn post_stream_values<TS, V>(
        &mut self,
        device: &str,
        stream: &str,
        count: usize,
        timestamp: TS,
        value: V,
    ) -> Result<u16, Error>
    where
        TS: FnMut(&mut dyn Sink, usize),
        V: FnMut(&mut dyn Sink, usize),
    {
        self.send(StreamValues {
            device,
            stream,
            count,
            timestamp,
            value,
        })
    }

    /// Posts timestamped values to `streams` streams at once.
    ///
    /// See [`DeviceUpdates`] for the closure contract.
    pub fn post_device_updates<S, TS, V>(
        &mut self,
        device: &str,
        streams: usize,
        stream: S,
        timestamp: TS,
        value: V,
    ) -> Result<u16, Error>
    where
        S: FnMut(&mut dyn Sink, usize) -> usize,
        TS: FnMut(&mut dyn Sink, usize, usize),
        V: FnMut(&mut dyn Sink, usize, usize),
    {
        self.send(DeviceUpdates {
            device,
            streams,
            stream,
            timestamp,
            value,
        })
    }

    /// Posts one value to each of `streams` streams under a shared timestamp.
    ///
    /// Send a [`DeviceUpdate`] built with [`DeviceUpdate::new`] to let the
    /// server stamp the update instead.
    pub fn post_device_update<TS, S, V>(
        &mut self,
        device: &str,
        streams: usize,
        timestamp: TS,
        stream: S,
        value: V,
    ) -> Result<u16, Error>
    where
        TS: FnMut(&mut dyn Sink),
        S: FnMut(&mut dyn Sink, usize),
        V: FnMut(&mut dyn Sink, usize),
    {
        self.send(DeviceUpdate::new(device, streams, stream, value).with_timestamp(timestamp))
    }

    /// Updates the device location.
    pub fn update_location<F>(
        &mut self,
        device: &str,
        name: bool,
        elevation: bool,
        field: F,
    ) -> Result<u16, Error>
    where
        F: FnMut(&mut dyn Sink, LocationField),
    {
        self.send(Location {
            device,
            name,
            elevation,
            field,
        })
    }

    /// Deletes the values of `stream` between the two bounds `bound` writes.
    pub fn delete_values<F>(
        &mut self,
        device: &str,
        stream: &str,
        bound: F,
    ) -> Result<u16, Error>
    where
        F: FnMut(&mut dyn Sink, RangeBound),
    {
        self.send(DeleteValues {
            device,
            stream,
            bound,
        })
    }

    /// Marks `command` as processed. A `body` that writes nothing sends no
    /// body.
    pub fn mark_command_processed<B>(
        &mut self,
        device: &str,
        command: &str,
        body: B,
    ) -> Result<u16, Error>
    where
        B: FnMut(&mut dyn Sink),
    {
        self.send(CommandAck::new(device, command, CommandAction::Process).with_body(body))
    }

    /// Marks `command` as rejected. A `body` that writes nothing sends no
    /// body.
    pub fn mark_command_rejected<B>(
        &mut self,
        device: &str,
        command: &str,
        body: B,
    ) -> Result<u16, Error>
    where
        B: FnMut(&mut dyn Sink),
    {
        self.send(CommandAck::new(device, command, CommandAction::Reject).with_body(body))
    }

    /// Reads the server clock into `body`.
    ///
    /// Fails with [`Error::BufferTooSmall`] carrying the announced length when
    /// `body` cannot hold it.
    pub fn get_time(&mut self, format: TimeFormat, body: &mut [u8]) -> Result<Reply, Error> {
        self.fetch(ServerTime { format }, body)
    }

    /// Reads the server clock as seconds since the Unix epoch.
    ///
    /// Returns the status code, and the timestamp when the status is 200.
    pub fn get_time_seconds(&mut self) -> Result<(u16, Option<i64>), Error> {
        let mut body = [0u8; SECONDS_BODY_LEN];
        let reply = self.get_time(TimeFormat::Seconds, &mut body)?;
        if reply.status != 200 {
            return Ok((reply.status, None));
        }
        let seconds = core::str::from_utf8(&body[..reply.body_len])
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or(Error::Invalid)?;
        Ok((reply.status, Some(seconds)))
    }
}

#[cfg(feature = "async")]
impl<'a, T: Transport, D: AsyncDelay> Client<'a, T, D> {
    /// Runs `op`, yielding to the executor between polls.
    pub async fn send_async<O: Operation>(&mut self, op: O) -> Result<u16, Error> {
        let mut exchange = Exchange::new(&self.config, op)?;
        self.drive_async(&mut exchange).await
    }

    /// Async counterpart of [`fetch`](Client::fetch).
    pub async fn fetch_async<O: Operation>(
        &mut self,
        op: O,
        body: &mut [u8],
    ) -> Result<Reply, Error> {
        let mut exchange = Exchange::with_body(&self.config, op, body)?;
        let status = self.drive_async(&mut exchange).await?;
        Ok(Reply {
            status,
            body_len: exchange.body_len(),
        })
    }

    async fn drive_async<O: Operation>(
        &mut self,
        exchange: &mut Exchange<'_, O>,
    ) -> Result<u16, Error> {
        self.issue(exchange)?;
        for _ in 0..self.ticks() {
            if let Some(outcome) = self.tick(exchange)? {
                return outcome;
            }
            self.delay.delay_ms(TICK_MS).await;
        }
        warn!("no response within {} s", self.config.timeout_seconds);
        Err(Error::Timeout)
    }
}

impl<T, D> core::fmt::Debug for Client<'_, T, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
