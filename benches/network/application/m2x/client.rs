use criterion::{BatchSize, Criterion, Throughput};
use libm2x::network::application::http::{Counter, Sink, SliceSink};
use libm2x::network::application::m2x::operation::write_request;
use libm2x::network::application::m2x::{ApiVersion, Client, Config, StreamValues};
use libm2x::network::{ConnectionId, Delay, Event, Handler, Transport};
use std::hint::black_box;
use std::net::{Ipv4Addr, SocketAddrV4};

const VALUES: [f32; 8] = [20.1, 20.3, 20.2, 20.6, 21.0, 21.4, 21.3, 21.1];
const RESPONSE: &[u8] = b"HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\n\r\n";

/// Answers every request on the next poll.
struct Loopback {
    id: Option<ConnectionId>,
    filled: bool,
}

impl Transport for Loopback {
    type Error = ();

    fn open(&mut self, _remote: SocketAddrV4) -> Result<ConnectionId, Self::Error> {
        self.id = Some(ConnectionId(1));
        self.filled = false;
        Ok(ConnectionId(1))
    }

    fn poll(&mut self, handler: &mut dyn Handler) -> Result<(), Self::Error> {
        let Some(id) = self.id else {
            return Ok(());
        };
        if self.filled {
            handler.receive(id, Event::Data(RESPONSE));
        } else {
            let mut packet = [0u8; 1024];
            self.filled = handler.fill(id, &mut packet) > 0;
        }
        Ok(())
    }
}

struct NoDelay;

impl Delay for NoDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

fn stream_values() -> StreamValues<
    'static,
    impl FnMut(&mut dyn Sink, usize),
    impl FnMut(&mut dyn Sink, usize),
> {
    StreamValues {
        device: "bench-device",
        stream: "temperature",
        count: VALUES.len(),
        timestamp: |sink: &mut dyn Sink, i: usize| write!(sink, "\"2024-01-01T00:0{i}:00Z\""),
        value: |sink: &mut dyn Sink, i: usize| write!(sink, "{}", VALUES[i]),
    }
}

pub fn bench_write_request(c: &mut Criterion) {
    let mut op = stream_values();
    let size = {
        let mut counter = Counter::new();
        write_request(&mut op, ApiVersion::V2, "key", &mut counter).unwrap()
    };

    let mut group = c.benchmark_group("write_request");
    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("post_stream_values", |b| {
        let mut packet = [0u8; 1024];
        b.iter(|| {
            let mut sink = SliceSink::new(&mut packet);
            write_request(&mut op, ApiVersion::V2, black_box("key"), &mut sink)
        })
    });
    group.finish();
}

pub fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    group.bench_function("post_stream_values", |b| {
        b.iter_batched_ref(
            || {
                let config = Config::new("key", Ipv4Addr::LOCALHOST);
                Client::new(config, Loopback { id: None, filled: false }, NoDelay)
            },
            |client| client.send(stream_values()).unwrap(),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
