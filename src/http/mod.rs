//! HTTP module containing HTTP client functionality.
//!
//! This module builds the single client shared by every fetch task of a run:
//! tracing middleware, connection pool sizing, proxy and default headers.
//!
//! - [`client`] - HTTP client creation and middleware configuration

pub mod client;

pub use client::{create_http_client, HttpClientConfig};
