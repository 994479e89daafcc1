use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    network::application::http::parser::bench_wait_for,
    network::application::http::parser::bench_read_response,
    network::application::m2x::client::bench_write_request,
    network::application::m2x::client::bench_round_trip
);
criterion_main!(benches);
