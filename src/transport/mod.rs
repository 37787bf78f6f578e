//! Transport layer for reaching the producer endpoint.

mod http;

pub use http::HttpTransport;
