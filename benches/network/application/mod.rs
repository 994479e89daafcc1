pub mod http;
pub mod m2x;
