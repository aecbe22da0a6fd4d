//! Classification of transport failures and HTTP error statuses.
//!
//! Both functions here are pure and total: every reachable status or
//! transport condition maps to exactly one [`ApiError`], with unmapped
//! statuses falling back to the generic family kinds. Classification has
//! no side effects and never itself fails.

use http::StatusCode;
use url::Url;

use crate::error::{ApiError, StatusError, StatusKind};
use crate::transport::TransportError;

/// Maps an HTTP error status onto a taxonomy error.
///
/// 408 is treated specially as [`ApiError::TimedOut`] rather than a
/// generic client error. Every other status becomes an
/// [`ApiError::Status`] whose message embeds the request URL and the raw
/// response body; when the body parses as JSON the parsed payload rides
/// along as structured details (parse failure is swallowed and the
/// details field is simply absent).
#[must_use]
pub fn classify_status(status: StatusCode, url: &Url, body: &[u8]) -> ApiError {
    if status == StatusCode::REQUEST_TIMEOUT {
        return ApiError::TimedOut(format!("{url} responded 408 Request Timeout"));
    }

    let kind = kind_for(status);
    let details = serde_json::from_slice(body).ok();
    ApiError::Status(StatusError {
        kind,
        status: status.as_u16(),
        url: url.to_string(),
        body: String::from_utf8_lossy(body).into_owned(),
        details,
    })
}

/// Maps a transport-level failure onto a taxonomy error.
#[must_use]
pub fn classify_transport(err: &TransportError, url: &Url) -> ApiError {
    match err {
        TransportError::Timeout => ApiError::TimedOut(format!("no response from {url}")),
        TransportError::ConnectionRefused(detail) => {
            ApiError::EndpointNotFound(format!("{url}: {detail}"))
        }
        TransportError::ConnectionReset(detail) | TransportError::Socket(detail) => {
            ApiError::SocketError(format!("{url}: {detail}"))
        }
        TransportError::InvalidUrl(detail) => ApiError::InvalidUrl(detail.clone()),
    }
}

/// Per-status refinement of the 4xx/5xx families.
fn kind_for(status: StatusCode) -> StatusKind {
    match status.as_u16() {
        400 => StatusKind::BadRequest,
        401 => StatusKind::Unauthorized,
        403 => StatusKind::Forbidden,
        404 => StatusKind::NotFound,
        409 => StatusKind::Conflict,
        410 => StatusKind::Gone,
        413 => StatusKind::PayloadTooLarge,
        422 => StatusKind::UnprocessableEntity,
        429 => StatusKind::TooManyRequests,
        500 => StatusKind::InternalServerError,
        502 => StatusKind::BadGateway,
        503 => StatusKind::Unavailable,
        504 => StatusKind::GatewayTimeout,
        501 | 505..=599 => StatusKind::Server,
        // Remaining 4xx plus anything outside both families (a refused
        // redirect surfaced as a terminal error, for instance).
        _ => StatusKind::Client,
    }
}
