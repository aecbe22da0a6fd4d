//! HTTP request/response value types and the transport trait.

use std::time::Duration;

use super::TransportError;

/// One physical HTTP exchange to be performed.
///
/// This is a value type that can be constructed and passed to any
/// [`HttpTransport`] implementation. It uses standard `http` crate types
/// for method and headers, ensuring compatibility with the broader
/// ecosystem. The engine builds a fresh `HttpRequest` for every hop of a
/// redirect chain.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, etc.)
    pub method: http::Method,
    /// Target URL for this exchange
    pub url: url::Url,
    /// Headers to send, fully assembled by the caller
    pub headers: http::HeaderMap,
    /// Optional request body
    pub body: Option<Vec<u8>>,
    /// Upper bound for the whole exchange
    pub timeout: Duration,
}

impl HttpRequest {
    /// Creates a new exchange with the given method, URL, and timeout.
    ///
    /// Headers are initialized to an empty map and body is `None`.
    #[must_use]
    pub fn new(method: http::Method, url: url::Url, timeout: Duration) -> Self {
        Self {
            method,
            url,
            headers: http::HeaderMap::new(),
            body: None,
            timeout,
        }
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header to the request.
    ///
    /// If the header name already exists, the value is appended
    /// (HTTP headers can have multiple values).
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// An HTTP response received from a server.
///
/// Contains the status code, headers, and body of one exchange.
/// The body is fully buffered into memory. A 3xx response is returned
/// here as-is; whether it is followed is the engine's decision.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Response body (fully buffered)
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the first value of the named header as a string, if present
    /// and valid UTF-8.
    #[must_use]
    pub fn header_str(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body as a UTF-8 string, if valid.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Trait for performing one physical HTTP exchange.
///
/// # Design
///
/// This trait abstracts the HTTP client implementation, enabling:
/// - Dependency injection for testing with scripted mock transports
/// - Swapping HTTP libraries without changing the engine
/// - Adding cross-cutting concerns (logging, metrics) via decorators
///
/// Implementations must not follow redirects on their own: the engine
/// inspects every 3xx response itself.
pub trait HttpTransport: Send + Sync {
    /// Performs a single HTTP exchange and returns the response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when:
    /// - The exchange exceeds its timeout ([`TransportError::Timeout`])
    /// - The endpoint refuses the connection ([`TransportError::ConnectionRefused`])
    /// - The connection is reset ([`TransportError::ConnectionReset`])
    /// - Any other socket-level failure occurs ([`TransportError::Socket`])
    /// - The URL cannot be used ([`TransportError::InvalidUrl`])
    fn exchange(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, TransportError>> + Send;
}
