//! The error taxonomy surfaced to callers.
//!
//! Every failed logical operation raises exactly one [`ApiError`]. The
//! HTTP-status family is a single [`StatusError`] carrying a
//! [`StatusKind`] tag rather than a class per status code; family
//! membership (client/server/intermittent) is a predicate over the kind.

use thiserror::Error;

/// Classification tag for an HTTP-status error.
///
/// Mirrors the per-status refinement of the 4xx/5xx families. Statuses
/// outside both families that are surfaced as errors (a refused
/// redirect, for example) fall back to the generic [`StatusKind::Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 410
    Gone,
    /// 413
    PayloadTooLarge,
    /// 422
    UnprocessableEntity,
    /// 429 — intermittent: the caller may reasonably retry
    TooManyRequests,
    /// Any other status surfaced as a client-side error
    Client,
    /// 500
    InternalServerError,
    /// 502 — intermittent
    BadGateway,
    /// 503 — intermittent
    Unavailable,
    /// 504 — intermittent
    GatewayTimeout,
    /// Any other 5xx
    Server,
}

impl StatusKind {
    /// Returns true for the 4xx family (including the generic fallback).
    #[must_use]
    pub const fn is_client(self) -> bool {
        !self.is_server()
    }

    /// Returns true for the 5xx family.
    #[must_use]
    pub const fn is_server(self) -> bool {
        matches!(
            self,
            Self::InternalServerError
                | Self::BadGateway
                | Self::Unavailable
                | Self::GatewayTimeout
                | Self::Server
        )
    }

    /// Returns true for kinds flagged as plausibly transient.
    ///
    /// Membership is informational for the caller; nothing in this crate
    /// retries on its own.
    #[must_use]
    pub const fn is_intermittent(self) -> bool {
        matches!(
            self,
            Self::TooManyRequests | Self::BadGateway | Self::Unavailable | Self::GatewayTimeout
        )
    }
}

/// An HTTP response surfaced as an error.
///
/// Carries the numeric status, the request URL and raw body (both
/// embedded in the message), and the parsed JSON error payload when the
/// body happens to be JSON. A body that fails to parse leaves `details`
/// as `None`; detail parsing never fails the operation itself.
#[derive(Debug, Error)]
#[error("HTTP {status} requesting {url}: {body}")]
pub struct StatusError {
    /// Classification tag
    pub kind: StatusKind,
    /// Numeric HTTP status code
    pub status: u16,
    /// The URL of the hop that produced this response
    pub url: String,
    /// Raw response body, lossily decoded
    pub body: String,
    /// Parsed JSON error payload, when the body is parseable
    pub details: Option<serde_json::Value>,
}

/// Error type for one logical API operation.
///
/// A flat taxonomy: transport-level conditions, the two redirect-protocol
/// errors, and the HTTP-status family. The crate classifies and raises;
/// it never retries and never swallows a failure silently.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A URL could not be parsed, either from caller input or from a
    /// redirect Location that resolved to nothing usable.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The operation timed out, at connect, read, or via a 408 response.
    #[error("Request timed out: {0}")]
    TimedOut(String),

    /// The remote endpoint refused the connection.
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    /// A socket-level failure (reset, DNS, TLS, I/O).
    #[error("Socket error: {0}")]
    SocketError(String),

    /// A redirect was to be followed but carried no usable Location.
    #[error("Redirect response for {url} carried no Location header")]
    RedirectLocationMissing {
        /// URL of the hop whose response lacked a Location
        url: String,
    },

    /// The redirect chain outran the configured budget.
    #[error("Stopped after {hops} redirect hops requesting {url}")]
    TooManyRedirects {
        /// URL of the hop at which traversal stopped
        url: String,
        /// Redirect hops already taken when traversal stopped
        hops: u32,
    },

    /// A well-formed HTTP response with an error status.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// A success response whose body could not be decoded as requested.
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns the numeric HTTP status, for status-family errors.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(e) => Some(e.status),
            _ => None,
        }
    }

    /// Returns true for HTTP-status errors in the 4xx family.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status(e) if e.kind.is_client())
    }

    /// Returns true for HTTP-status errors in the 5xx family.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Status(e) if e.kind.is_server())
    }

    /// Returns true for errors flagged as plausibly transient
    /// (429, 502, 503, 504).
    #[must_use]
    pub fn is_intermittent(&self) -> bool {
        matches!(self, Self::Status(e) if e.kind.is_intermittent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(kind: StatusKind, status: u16) -> ApiError {
        ApiError::Status(StatusError {
            kind,
            status,
            url: "https://api.example.com/things".to_string(),
            body: "oops".to_string(),
            details: None,
        })
    }

    #[test]
    fn status_message_embeds_url_and_body() {
        let e = status_error(StatusKind::NotFound, 404);
        let message = e.to_string();

        assert!(message.contains("404"));
        assert!(message.contains("https://api.example.com/things"));
        assert!(message.contains("oops"));
    }

    #[test]
    fn status_code_only_for_status_family() {
        assert_eq!(status_error(StatusKind::Forbidden, 403).status_code(), Some(403));
        assert_eq!(ApiError::TimedOut("t".to_string()).status_code(), None);
        assert_eq!(
            ApiError::TooManyRedirects {
                url: "https://a".to_string(),
                hops: 4
            }
            .status_code(),
            None
        );
    }

    #[test]
    fn client_and_server_families_are_disjoint() {
        let client = status_error(StatusKind::Conflict, 409);
        let server = status_error(StatusKind::BadGateway, 502);

        assert!(client.is_client_error());
        assert!(!client.is_server_error());
        assert!(server.is_server_error());
        assert!(!server.is_client_error());
    }

    #[test]
    fn intermittent_kinds_are_429_502_503_504() {
        for kind in [
            StatusKind::TooManyRequests,
            StatusKind::BadGateway,
            StatusKind::Unavailable,
            StatusKind::GatewayTimeout,
        ] {
            assert!(kind.is_intermittent(), "{kind:?} should be intermittent");
        }
        for kind in [
            StatusKind::BadRequest,
            StatusKind::NotFound,
            StatusKind::InternalServerError,
            StatusKind::Server,
            StatusKind::Client,
        ] {
            assert!(!kind.is_intermittent(), "{kind:?} should not be intermittent");
        }
    }

    #[test]
    fn non_status_errors_belong_to_no_family() {
        let e = ApiError::SocketError("reset by peer".to_string());
        assert!(!e.is_client_error());
        assert!(!e.is_server_error());
        assert!(!e.is_intermittent());
    }

    #[test]
    fn redirect_errors_display_their_context() {
        let missing = ApiError::RedirectLocationMissing {
            url: "https://a.example/x".to_string(),
        };
        let too_many = ApiError::TooManyRedirects {
            url: "https://a.example/y".to_string(),
            hops: 5,
        };

        assert!(missing.to_string().contains("https://a.example/x"));
        assert!(too_many.to_string().contains("5"));
        assert!(too_many.to_string().contains("https://a.example/y"));
    }
}
