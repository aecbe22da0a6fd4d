//! Error types for the transport layer.

use thiserror::Error;

/// Error type for a single physical HTTP exchange.
///
/// The request engine depends only on being able to distinguish these
/// five failure kinds; every well-formed HTTP response, including error
/// statuses, arrives as an [`HttpResponse`](super::HttpResponse) instead.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The exchange did not complete within the configured timeout.
    ///
    /// Covers both connect and read timeouts.
    #[error("Request timed out")]
    Timeout,

    /// The remote endpoint refused the connection.
    ///
    /// Includes DNS resolution pointing at a closed port and anything
    /// else the operating system reports as refusal to connect.
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// The connection was reset mid-exchange.
    #[error("Connection reset: {0}")]
    ConnectionReset(String),

    /// Any other socket-level failure (DNS, TLS handshake, I/O).
    #[error("Socket error: {0}")]
    Socket(String),

    /// The request URL could not be turned into an exchange.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
