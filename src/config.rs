//! Client configuration: redirect policy knobs, timeout, credentials.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

/// Default redirect-hop budget.
pub const DEFAULT_MAX_REDIRECTS: u32 = 3;

/// Default per-exchange timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// Error type for configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The timeout must be strictly positive.
    #[error("Invalid timeout: must be greater than zero")]
    ZeroTimeout,
}

/// Credentials attached to a client.
///
/// A client carries at most one of these; setting one replaces the other.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: Basic <base64(user:password)>`
    Basic {
        /// User name
        user: String,
        /// Password
        password: String,
    },
}

impl Credentials {
    /// Renders the `Authorization` header value for these credentials.
    #[must_use]
    pub fn authorization_value(&self) -> String {
        match self {
            Self::Bearer(token) => format!("Bearer {token}"),
            Self::Basic { user, password } => {
                let encoded = BASE64.encode(format!("{user}:{password}"));
                format!("Basic {encoded}")
            }
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Credentials::Bearer(***)"),
            Self::Basic { user, .. } => write!(f, "Credentials::Basic {{ user: {user:?}, password: *** }}"),
        }
    }
}

/// Immutable configuration attached to a client instance.
///
/// Built with the `with_*` methods and never mutated afterwards; every
/// logical operation reads the same configuration for its whole redirect
/// loop.
///
/// # Example
///
/// ```
/// use restcall::config::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_max_redirects(5)
///     .with_bearer_token("t0ken")
///     .with_timeout(Duration::from_secs(10))
///     .unwrap();
/// assert_eq!(config.max_redirects, 5);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Redirect-hop budget for one logical operation
    pub max_redirects: u32,
    /// Whether redirects may leave the original request's origin at all
    pub allow_cross_origin_redirects: bool,
    /// Whether credentials follow a redirect across origins
    pub forward_auth_on_cross_origin_redirects: bool,
    /// Whether 307/308 are followed for POST/PUT/PATCH/DELETE
    pub follow_non_get_redirects: bool,
    /// Per-exchange timeout, strictly positive
    pub timeout: Duration,
    /// At most one set of credentials
    pub credentials: Option<Credentials>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            allow_cross_origin_redirects: true,
            forward_auth_on_cross_origin_redirects: false,
            follow_non_get_redirects: false,
            timeout: DEFAULT_TIMEOUT,
            credentials: None,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with the defaults described above.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the redirect-hop budget.
    ///
    /// Negative input is clamped to zero rather than rejected.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: i64) -> Self {
        self.max_redirects = u32::try_from(max_redirects.max(0)).unwrap_or(u32::MAX);
        self
    }

    /// Sets whether redirects may leave the original request's origin.
    #[must_use]
    pub const fn with_allow_cross_origin_redirects(mut self, allow: bool) -> Self {
        self.allow_cross_origin_redirects = allow;
        self
    }

    /// Sets whether credentials are forwarded on cross-origin hops.
    #[must_use]
    pub const fn with_forward_auth_on_cross_origin_redirects(mut self, forward: bool) -> Self {
        self.forward_auth_on_cross_origin_redirects = forward;
        self
    }

    /// Sets whether 307/308 are followed for non-GET/HEAD methods.
    #[must_use]
    pub const fn with_follow_non_get_redirects(mut self, follow: bool) -> Self {
        self.follow_non_get_redirects = follow;
        self
    }

    /// Sets the per-exchange timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] for a zero duration; a client
    /// with no exchange bound at all is a configuration mistake.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Attaches a bearer token, replacing any existing credentials.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Bearer(token.into()));
        self
    }

    /// Attaches basic-auth credentials, replacing any existing credentials.
    #[must_use]
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Basic {
            user: user.into(),
            password: password.into(),
        });
        self
    }
}
