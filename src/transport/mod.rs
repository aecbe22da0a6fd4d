//! Transport layer: one physical HTTP exchange.
//!
//! This module provides types and traits for:
//! - Building a single HTTP exchange ([`HttpRequest`])
//! - Handling its response ([`HttpResponse`])
//! - Abstracting the underlying HTTP library ([`HttpTransport`])
//! - Production transport implementation ([`ReqwestTransport`])
//!
//! The transport performs exactly one request/response; it never follows
//! redirects itself. Redirect traversal belongs to the request engine.

mod client;
mod error;
mod http;


pub use client::ReqwestTransport;
pub use error::TransportError;
pub use self::http::{HttpRequest, HttpResponse, HttpTransport};
