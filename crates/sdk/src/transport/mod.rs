//! Transport layer for the Home Assistant client.

pub mod http;

pub use http::HttpTransport;
