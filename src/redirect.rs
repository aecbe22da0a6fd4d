//! Redirect policy: pure decision logic for 3xx traversal.
//!
//! Given the request method, the response status, the configuration, and
//! the fixed initial [`Origin`], [`decide`] determines whether a redirect
//! is followed and whether credentials travel with it. The engine calls
//! this once per redirect response; nothing here performs I/O.

use http::{Method, StatusCode};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// The `(scheme, host, port)` triple identifying a security boundary for
/// credential forwarding.
///
/// Recomputed per URL, never persisted. Two requests are cross-origin iff
/// their origins differ; the port defaults to the scheme's well-known
/// port when the URL does not spell one out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    /// Derives the origin of a URL.
    #[must_use]
    pub fn of(url: &Url) -> Self {
        Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host: url.host_str().unwrap_or_default().to_ascii_lowercase(),
            port: url.port_or_known_default(),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}", self.scheme, self.host, port),
            None => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

/// Why a candidate redirect was refused outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The chain outran the configured hop budget.
    TooManyRedirects,
    /// The response carried no usable Location value.
    LocationMissing,
    /// The target origin differs from the initial origin and
    /// cross-origin redirects are disabled.
    CrossOriginDisallowed,
}

/// The policy's verdict for one redirect response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Follow the redirect to `next_url`.
    Follow {
        /// Resolved target of the Location header
        next_url: Url,
        /// Whether the target origin differs from the initial origin
        cross_origin: bool,
        /// Whether credentials accompany the next hop
        forward_credentials: bool,
    },
    /// Not a followable redirect for this method/status; the caller
    /// treats the response as terminal.
    DoNotFollow,
    /// A followable redirect refused for the given reason.
    Reject(RejectReason),
}

/// Returns true for the five candidate redirect statuses.
///
/// 304 and the reserved 305/306 are never follow candidates.
#[must_use]
pub fn is_redirect_candidate(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Decides whether one redirect response is followed.
///
/// `hops_taken` counts the redirects already followed within this
/// logical operation, not counting the initial request. Cross-origin
/// comparisons are always against the *initial* origin, never the
/// previous hop's, for both the disallow check and the auth-forwarding
/// decision.
///
/// # Errors
///
/// Returns [`ApiError::InvalidUrl`] when the Location value can be
/// neither resolved against the current URL nor parsed on its own.
pub fn decide(
    method: &Method,
    status: StatusCode,
    config: &ClientConfig,
    initial_origin: &Origin,
    current_url: &Url,
    location: Option<&str>,
    hops_taken: u32,
) -> Result<RedirectOutcome, ApiError> {
    if !is_redirect_candidate(status) {
        return Ok(RedirectOutcome::DoNotFollow);
    }

    // Replaying a non-idempotent request silently is never acceptable:
    // only 307/308 preserve the method, and only when opted into.
    if *method != Method::GET && *method != Method::HEAD {
        let method_preserving = matches!(status.as_u16(), 307 | 308);
        if !method_preserving || !config.follow_non_get_redirects {
            return Ok(RedirectOutcome::DoNotFollow);
        }
    }

    let location = location.map(str::trim).filter(|l| !l.is_empty());
    let Some(location) = location else {
        return Ok(RedirectOutcome::Reject(RejectReason::LocationMissing));
    };

    let next_url = resolve_location(current_url, location)?;
    let cross_origin = Origin::of(&next_url) != *initial_origin;

    if cross_origin && !config.allow_cross_origin_redirects {
        return Ok(RedirectOutcome::Reject(RejectReason::CrossOriginDisallowed));
    }

    if hops_taken > config.max_redirects {
        return Ok(RedirectOutcome::Reject(RejectReason::TooManyRedirects));
    }

    let forward_credentials = !cross_origin || config.forward_auth_on_cross_origin_redirects;
    Ok(RedirectOutcome::Follow {
        next_url,
        cross_origin,
        forward_credentials,
    })
}

/// Resolves a Location value as a reference relative to the current
/// request URL, falling back to parsing it verbatim.
fn resolve_location(current_url: &Url, location: &str) -> Result<Url, ApiError> {
    current_url
        .join(location)
        .or_else(|_| Url::parse(location))
        .map_err(|e| ApiError::InvalidUrl(format!("Location '{location}': {e}")))
}

#[cfg(test)]
#[path = "redirect_tests.rs"]
mod tests;
