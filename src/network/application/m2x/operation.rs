//! Request templates, one per M2X API call.
//!
//! A template knows the method, the path and the JSON punctuation of its body.
//! Every scalar inside the body comes from a caller closure that writes
//! straight into a [`Sink`], so the library never sees the value's type and
//! never holds the body in memory. The same closures run twice per request:
//! once against a [`Counter`](crate::network::application::http::Counter) to
//! size `Content-Length`, once for real. They must write the same bytes both
//! times.

use core::fmt;

use crate::network::application::http::request::{
    finish_headers, write_encoded, write_header, write_request_line,
};
use crate::network::application::http::{Counter, Method, Sink};
use crate::network::error::Error;

/// Value of the `User-Agent` header sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key.
pub const KEY_HEADER: &str = "X-M2X-KEY";

/// Revision of the M2X REST API to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApiVersion {
    /// Feed-based API: `/v1/feeds/{feed}`, unquoted values, `"at"` timestamps.
    V1,
    /// Device-based API: `/v2/devices/{device}`.
    #[default]
    V2,
}

/// One M2X API call.
pub trait Operation {
    /// HTTP method for `api`.
    fn method(&self, api: ApiVersion) -> Method;

    /// Whether `api` has a route for this call.
    fn supports(&self, _api: ApiVersion) -> bool {
        true
    }

    /// Writes the request target, percent-encoding identifiers.
    fn write_path(&self, api: ApiVersion, sink: &mut dyn Sink);

    /// Writes the JSON body. Writing nothing means the request has no body.
    fn write_body(&mut self, api: ApiVersion, sink: &mut dyn Sink);
}

/// Streams a complete request for `op` into `sink` and returns its size.
///
/// The body is measured first so the header block can carry an exact
/// `Content-Length`. The returned size counts every byte offered to `sink`,
/// including any a bounded sink had to drop.
///
/// # Errors
///
/// - [`Error::JsonInvalid`] when a body closure failed to encode a value
/// - [`Error::Invalid`] when the body closures wrote a different number of
///   bytes than they did while being measured
pub fn write_request<O>(
    op: &mut O,
    api: ApiVersion,
    key: &str,
    sink: &mut dyn Sink,
) -> Result<usize, Error>
where
    O: Operation + ?Sized,
{
    let mut counter = Counter::new();
    op.write_body(api, &mut counter);
    if let Some(error) = counter.error() {
        return Err(error);
    }
    let content_length = counter.written();

    let start = sink.written();
    write_request_line(sink, op.method(api), |sink| op.write_path(api, sink));
    write_header(sink, "User-Agent", USER_AGENT);
    write_header(sink, KEY_HEADER, key);
    finish_headers(sink, content_length);
    let body_start = sink.written();
    op.write_body(api, sink);
    if let Some(error) = sink.error() {
        return Err(error);
    }
    let body_len = sink.written() - body_start;
    if body_len != content_length {
        warn!("body wrote {} bytes after measuring {}", body_len, content_length);
        return Err(Error::Invalid);
    }
    Ok(sink.written() - start)
}

fn write_device(api: ApiVersion, sink: &mut dyn Sink, device: &str) {
    match api {
        ApiVersion::V1 => sink.write_str("/v1/feeds/"),
        ApiVersion::V2 => sink.write_str("/v2/devices/"),
    }
    write_encoded(sink, device);
}

fn write_stream(api: ApiVersion, sink: &mut dyn Sink, device: &str, stream: &str) {
    write_device(api, sink, device);
    sink.write_str("/streams/");
    write_encoded(sink, stream);
}

fn timestamp_key(api: ApiVersion) -> &'static str {
    match api {
        ApiVersion::V1 => "{\"at\":",
        ApiVersion::V2 => "{\"timestamp\":",
    }
}

/// Writes `"value":` followed by a value that is quoted on v2 only.
fn write_value<F>(api: ApiVersion, sink: &mut dyn Sink, value: F)
where
    F: FnOnce(&mut dyn Sink),
{
    match api {
        ApiVersion::V1 => {
            sink.write_str("\"value\":");
            value(sink);
        }
        ApiVersion::V2 => {
            sink.write_str("\"value\":\"");
            value(sink);
            sink.write_byte(b'"');
        }
    }
}

fn write_separator(sink: &mut dyn Sink, index: usize, count: usize) {
    if index + 1 != count {
        sink.write_byte(b',');
    }
}

/// Sets the current value of one stream.
///
/// v2: `PUT /v2/devices/{device}/streams/{stream}/value` with
/// `{"value":"<value>"}`.
pub struct StreamValue<'a, F> {
    pub device: &'a str,
    pub stream: &'a str,
    pub value: F,
}

impl<F> Operation for StreamValue<'_, F>
where
    F: FnMut(&mut dyn Sink),
{
    fn method(&self, _api: ApiVersion) -> Method {
        Method::Put
    }

    fn write_path(&self, api: ApiVersion, sink: &mut dyn Sink) {
        write_stream(api, sink, self.device, self.stream);
        if api == ApiVersion::V2 {
            sink.write_str("/value");
        }
    }

    fn write_body(&mut self, api: ApiVersion, sink: &mut dyn Sink) {
        sink.write_byte(b'{');
        write_value(api, sink, &mut self.value);
        sink.write_byte(b'}');
    }
}

/// Posts `count` timestamped values to one stream.
///
/// Both closures receive the value index.
pub struct StreamValues<'a, T, V> {
    pub device: &'a str,
    pub stream: &'a str,
    pub count: usize,
    pub timestamp: T,
    pub value: V,
}

impl<T, V> Operation for StreamValues<'_, T, V>
where
    T: FnMut(&mut dyn Sink, usize),
    V: FnMut(&mut dyn Sink, usize),
{
    fn method(&self, _api: ApiVersion) -> Method {
        Method::Post
    }

    fn write_path(&self, api: ApiVersion, sink: &mut dyn Sink) {
        write_stream(api, sink, self.device, self.stream);
        sink.write_str("/values");
    }

    fn write_body(&mut self, api: ApiVersion, sink: &mut dyn Sink) {
        sink.write_str("{\"values\":[");
        for i in 0..self.count {
            sink.write_str(timestamp_key(api));
            (self.timestamp)(sink, i);
            sink.write_byte(b',');
            write_value(api, sink, |sink| (self.value)(sink, i));
            sink.write_byte(b'}');
            write_separator(sink, i, self.count);
        }
        sink.write_str("]}");
    }
}

/// Posts timestamped values to several streams of one device.
///
/// `stream` writes the name of stream `si` (the library adds the quotes) and
/// returns how many values that stream carries. `timestamp` and `value`
/// receive `(value_index, stream_index)`.
pub struct DeviceUpdates<'a, S, T, V> {
    pub device: &'a str,
    pub streams: usize,
    pub stream: S,
    pub timestamp: T,
    pub value: V,
}

impl<S, T, V> Operation for DeviceUpdates<'_, S, T, V>
where
    S: FnMut(&mut dyn Sink, usize) -> usize,
    T: FnMut(&mut dyn Sink, usize, usize),
    V: FnMut(&mut dyn Sink, usize, usize),
{
    fn method(&self, _api: ApiVersion) -> Method {
        Method::Post
    }

    fn write_path(&self, api: ApiVersion, sink: &mut dyn Sink) {
        write_device(api, sink, self.device);
        if api == ApiVersion::V2 {
            sink.write_str("/updates");
        }
    }

    fn write_body(&mut self, api: ApiVersion, sink: &mut dyn Sink) {
        sink.write_str("{\"values\":{");
        for si in 0..self.streams {
            sink.write_byte(b'"');
            let values = (self.stream)(sink, si);
            sink.write_str("\":[");
            for vi in 0..values {
                sink.write_str(timestamp_key(api));
                (self.timestamp)(sink, vi, si);
                sink.write_byte(b',');
                write_value(api, sink, |sink| (self.value)(sink, vi, si));
                sink.write_byte(b'}');
                write_separator(sink, vi, values);
            }
            sink.write_byte(b']');
            write_separator(sink, si, self.streams);
        }
        sink.write_str("}}");
    }
}

/// Posts one value per stream, sharing an optional timestamp.
///
/// v2 only: `POST /v2/devices/{device}/update` with
/// `{"timestamp":<t>,"values":{"<stream>":<value>,...}}`. Values are written
/// raw, so string values must bring their own quotes.
pub struct DeviceUpdate<'a, T, S, V> {
    pub device: &'a str,
    pub streams: usize,
    pub timestamp: Option<T>,
    pub stream: S,
    pub value: V,
}

impl<'a, S, V> DeviceUpdate<'a, fn(&mut dyn Sink), S, V> {
    /// An update without a timestamp; the server stamps it on arrival.
    pub fn new(device: &'a str, streams: usize, stream: S, value: V) -> Self {
        Self {
            device,
            streams,
            timestamp: None,
            stream,
            value,
        }
    }
}

impl<'a, T, S, V> DeviceUpdate<'a, T, S, V> {
    /// Adds the shared timestamp.
    pub fn with_timestamp<U>(self, timestamp: U) -> DeviceUpdate<'a, U, S, V>
    where
        U: FnMut(&mut dyn Sink),
    {
        DeviceUpdate {
            device: self.device,
            streams: self.streams,
            timestamp: Some(timestamp),
            stream: self.stream,
            value: self.value,
        }
    }
}

impl<T, S, V> Operation for DeviceUpdate<'_, T, S, V>
where
    T: FnMut(&mut dyn Sink),
    S: FnMut(&mut dyn Sink, usize),
    V: FnMut(&mut dyn Sink, usize),
{
    fn method(&self, _api: ApiVersion) -> Method {
        Method::Post
    }

    fn supports(&self, api: ApiVersion) -> bool {
        api == ApiVersion::V2
    }

    fn write_path(&self, api: ApiVersion, sink: &mut dyn Sink) {
        write_device(api, sink, self.device);
        sink.write_str("/update");
    }

    fn write_body(&mut self, _api: ApiVersion, sink: &mut dyn Sink) {
        sink.write_byte(b'{');
        if let Some(timestamp) = self.timestamp.as_mut() {
            sink.write_str("\"timestamp\":");
            timestamp(sink);
            sink.write_byte(b',');
        }
        sink.write_str("\"values\":{");
        for si in 0..self.streams {
            sink.write_byte(b'"');
            (self.stream)(sink, si);
            sink.write_str("\":");
            (self.value)(sink, si);
            write_separator(sink, si, self.streams);
        }
        sink.write_str("}}");
    }
}

/// A field of a location update, passed to the location closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LocationField {
    Latitude,
    Longitude,
    Name,
    Elevation,
}

/// Updates the device location.
///
/// `name` and `elevation` are optional in the API and only requested from
/// the closure when their flag is set. Every field is written raw: the name
/// needs quotes, which [`write_json`](dyn Sink::write_json) provides.
pub struct Location<'a, F> {
    pub device: &'a str,
    pub name: bool,
    pub elevation: bool,
    pub field: F,
}

impl<F> Operation for Location<'_, F>
where
    F: FnMut(&mut dyn Sink, LocationField),
{
    fn method(&self, _api: ApiVersion) -> Method {
        Method::Put
    }

    fn write_path(&self, api: ApiVersion, sink: &mut dyn Sink) {
        write_device(api, sink, self.device);
        sink.write_str("/location");
    }

    fn write_body(&mut self, _api: ApiVersion, sink: &mut dyn Sink) {
        sink.write_byte(b'{');
        if self.name {
            sink.write_str("\"name\":");
            (self.field)(sink, LocationField::Name);
            sink.write_byte(b',');
        }
        if self.elevation {
            sink.write_str("\"elevation\":");
            (self.field)(sink, LocationField::Elevation);
            sink.write_byte(b',');
        }
        sink.write_str("\"latitude\":");
        (self.field)(sink, LocationField::Latitude);
        sink.write_str(",\"longitude\":");
        (self.field)(sink, LocationField::Longitude);
        sink.write_byte(b'}');
    }
}

/// End of a deletion range, passed to the range closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeBound {
    From,
    End,
}

/// Deletes the values of one stream inside a time range.
///
/// v2 only. The closure writes each bound as a JSON value, quotes included.
pub struct DeleteValues<'a, F> {
    pub device: &'a str,
    pub stream: &'a str,
    pub bound: F,
}

impl<F> Operation for DeleteValues<'_, F>
where
    F: FnMut(&mut dyn Sink, RangeBound),
{
    fn method(&self, _api: ApiVersion) -> Method {
        Method::Delete
    }

    fn supports(&self, api: ApiVersion) -> bool {
        api == ApiVersion::V2
    }

    fn write_path(&self, api: ApiVersion, sink: &mut dyn Sink) {
        write_stream(api, sink, self.device, self.stream);
        sink.write_str("/values");
    }

    fn write_body(&mut self, _api: ApiVersion, sink: &mut dyn Sink) {
        sink.write_str("{\"from\":");
        (self.bound)(sink, RangeBound::From);
        sink.write_str(",\"end\":");
        (self.bound)(sink, RangeBound::End);
        sink.write_byte(b'}');
    }
}

/// How a device answers a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandAction {
    Process,
    Reject,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Process => "process",
            CommandAction::Reject => "reject",
        }
    }
}

/// Marks a command as processed or rejected, with an optional raw body.
///
/// v2 only: `POST /v2/devices/{device}/commands/{command}/{action}`.
pub struct CommandAck<'a, B> {
    pub device: &'a str,
    pub command: &'a str,
    pub action: CommandAction,
    pub body: Option<B>,
}

impl<'a> CommandAck<'a, fn(&mut dyn Sink)> {
    /// An acknowledgement without a body.
    pub fn new(device: &'a str, command: &'a str, action: CommandAction) -> Self {
        Self {
            device,
            command,
            action,
            body: None,
        }
    }
}

impl<'a, B> CommandAck<'a, B> {
    /// Attaches a body, written verbatim.
    pub fn with_body<C>(self, body: C) -> CommandAck<'a, C>
    where
        C: FnMut(&mut dyn Sink),
    {
        CommandAck {
            device: self.device,
            command: self.command,
            action: self.action,
            body: Some(body),
        }
    }
}

impl<B> Operation for CommandAck<'_, B>
where
    B: FnMut(&mut dyn Sink),
{
    fn method(&self, _api: ApiVersion) -> Method {
        Method::Post
    }

    fn supports(&self, api: ApiVersion) -> bool {
        api == ApiVersion::V2
    }

    fn write_path(&self, api: ApiVersion, sink: &mut dyn Sink) {
        write_device(api, sink, self.device);
        sink.write_str("/commands/");
        write_encoded(sink, self.command);
        sink.write_byte(b'/');
        sink.write_str(self.action.as_str());
    }

    fn write_body(&mut self, _api: ApiVersion, sink: &mut dyn Sink) {
        if let Some(body) = self.body.as_mut() {
            body(sink);
        }
    }
}

/// Representation of the server clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeFormat {
    /// Seconds since the Unix epoch.
    Seconds,
    /// Milliseconds since the Unix epoch.
    Millis,
    /// ISO 8601 timestamp.
    #[default]
    Iso8601,
}

impl TimeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::Seconds => "seconds",
            TimeFormat::Millis => "millis",
            TimeFormat::Iso8601 => "iso8601",
        }
    }
}

/// Reads the server clock: `GET /v2/time/{format}`, no body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerTime {
    pub format: TimeFormat,
}

impl Operation for ServerTime {
    fn method(&self, _api: ApiVersion) -> Method {
        Method::Get
    }

    fn supports(&self, api: ApiVersion) -> bool {
        api == ApiVersion::V2
    }

    fn write_path(&self, _api: ApiVersion, sink: &mut dyn Sink) {
        sink.write_str("/v2/time/");
        sink.write_str(self.format.as_str());
    }

    fn write_body(&mut self, _api: ApiVersion, _sink: &mut dyn Sink) {}
}

macro_rules! debug_template {
    ($name:ident < $($param:ident),* > { $($field:ident),* }) => {
        impl<$($param),*> fmt::Debug for $name<'_, $($param),*> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($field), &self.$field))*
                    .finish_non_exhaustive()
            }
        }
    };
}

debug_template!(StreamValue<F> { device, stream });
debug_template!(StreamValues<T, V> { device, stream, count });
debug_template!(DeviceUpdates<S, T, V> { device, streams });
debug_template!(DeviceUpdate<T, S, V> { device, streams });
debug_template!(Location<F> { device, name, elevation });
debug_template!(DeleteValues<F> { device, stream });
debug_template!(CommandAck<B> { device, command, action });
