//! Ambient headers and User-Agent construction.
//!
//! Ambient headers are injected from call-context state rather than
//! passed explicitly per request. Instead of a hidden global store they
//! are an explicit collaborator: anything implementing [`AmbientHeaders`]
//! can be attached to a client, and the engine reads it once per hop.

use http::{HeaderMap, HeaderValue};

/// Source of headers scoped to the calling context.
///
/// The engine treats the returned map as read-only input and layers it
/// between its own defaults and the caller's per-request headers.
/// Implementations should exclude keys whose values are empty; the
/// engine skips them regardless.
pub trait AmbientHeaders: Send + Sync {
    /// Returns the current context's headers.
    fn current_headers(&self) -> HeaderMap;
}

/// The no-op ambient source: no context headers at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAmbientHeaders;

impl AmbientHeaders for NoAmbientHeaders {
    fn current_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }
}

/// A fixed header set attached to a client for its lifetime.
///
/// Useful for correlation identifiers or tenant headers that every
/// request through one client should carry.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    headers: HeaderMap,
}

impl StaticHeaders {
    /// Creates an ambient source over the given headers.
    #[must_use]
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

impl AmbientHeaders for StaticHeaders {
    fn current_headers(&self) -> HeaderMap {
        self.headers
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Identity sent as the `User-Agent` header on every request.
///
/// Composed as `"{name}/{version} ({contact})"`. Each component falls
/// back to a fixed placeholder when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    name: String,
    version: String,
    contact: String,
}

const PLACEHOLDER_NAME: &str = "unknown-app";
const PLACEHOLDER_VERSION: &str = "0.0";
const PLACEHOLDER_CONTACT: &str = "unknown-contact";

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            version: PLACEHOLDER_VERSION.to_string(),
            contact: PLACEHOLDER_CONTACT.to_string(),
        }
    }
}

impl UserAgent {
    /// Creates a fully specified identity.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        Self {
            name: non_empty(name.into(), PLACEHOLDER_NAME),
            version: non_empty(version.into(), PLACEHOLDER_VERSION),
            contact: non_empty(contact.into(), PLACEHOLDER_CONTACT),
        }
    }

    /// Builds an identity from the `APP_NAME`, `APP_VERSION`, and
    /// `APP_CONTACT` environment variables, with placeholders for any
    /// that are unset or empty.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("APP_NAME").unwrap_or_default(),
            std::env::var("APP_VERSION").unwrap_or_default(),
            std::env::var("APP_CONTACT").unwrap_or_default(),
        )
    }

    /// Renders the `User-Agent` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{}/{} ({})", self.name, self.version, self.contact)
    }

    /// Renders the identity as an `http` header value, substituting the
    /// all-placeholder identity if the composed string is not a legal
    /// header value.
    #[must_use]
    pub fn to_header(&self) -> HeaderValue {
        HeaderValue::from_str(&self.header_value()).unwrap_or_else(|_| {
            HeaderValue::from_static("unknown-app/0.0 (unknown-contact)")
        })
    }
}

fn non_empty(value: String, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod ambient {
        use super::*;

        #[test]
        fn no_ambient_headers_is_empty() {
            assert!(NoAmbientHeaders.current_headers().is_empty());
        }

        #[test]
        fn static_headers_returns_configured_set() {
            let mut headers = HeaderMap::new();
            headers.insert("x-request-id", HeaderValue::from_static("abc"));
            let ambient = StaticHeaders::new(headers);

            let current = ambient.current_headers();
            assert_eq!(current.get("x-request-id").unwrap(), "abc");
        }

        #[test]
        fn static_headers_excludes_empty_values() {
            let mut headers = HeaderMap::new();
            headers.insert("x-keep", HeaderValue::from_static("yes"));
            headers.insert("x-drop", HeaderValue::from_static(""));
            let ambient = StaticHeaders::new(headers);

            let current = ambient.current_headers();
            assert!(current.contains_key("x-keep"));
            assert!(!current.contains_key("x-drop"));
        }
    }

    mod user_agent {
        use super::*;

        #[test]
        fn composes_name_version_contact() {
            let ua = UserAgent::new("myapp", "1.2", "ops@example.com");
            assert_eq!(ua.header_value(), "myapp/1.2 (ops@example.com)");
        }

        #[test]
        fn default_uses_placeholders() {
            let ua = UserAgent::default();
            assert_eq!(ua.header_value(), "unknown-app/0.0 (unknown-contact)");
        }

        #[test]
        fn empty_components_fall_back_to_placeholders() {
            let ua = UserAgent::new("", "3.1", "  ");
            assert_eq!(ua.header_value(), "unknown-app/3.1 (unknown-contact)");
        }

        #[test]
        fn to_header_is_always_a_legal_value() {
            let ua = UserAgent::new("weird\napp", "1", "x");
            // Newlines are illegal in header values; the placeholder wins.
            assert_eq!(ua.to_header(), "unknown-app/0.0 (unknown-contact)");

            let ok = UserAgent::new("fine", "1", "x");
            assert_eq!(ok.to_header(), "fine/1 (x)");
        }
    }
}
