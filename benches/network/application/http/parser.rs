use criterion::{Criterion, Throughput};
use libm2x::network::application::http::parser::{
    Case, read_content_length, read_status_code, skip_header, wait_for,
};
use std::hint::black_box;

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Date: Tue, 01 Dec 2015 22:20:25 GMT\r\n\
Server: nginx\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Vary: Accept-Encoding\r\n\
Content-Length: 10\r\n\
\r\n\
1449008425";

pub fn bench_wait_for(c: &mut Criterion) {
    let mut group = c.benchmark_group("wait_for");
    group.throughput(Throughput::Bytes(RESPONSE.len() as u64));
    for case in [Case::Sensitive, Case::Insensitive] {
        group.bench_function(format!("{case:?}"), |b| {
            b.iter(|| wait_for(black_box(RESPONSE), black_box(b"Content-Length: "), case))
        });
    }
    group.finish();
}

pub fn bench_read_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_response");
    group.throughput(Throughput::Bytes(RESPONSE.len() as u64));
    group.bench_function("status_length_offset", |b| {
        b.iter(|| {
            let data = black_box(RESPONSE);
            let status = read_status_code(data, Case::Insensitive).unwrap();
            let length = read_content_length(data, Case::Insensitive).unwrap();
            let offset = skip_header(data, Case::Insensitive).unwrap();
            (status, length, offset)
        })
    });
    group.finish();
}
