//! The redirect-aware request engine.
//!
//! One call to [`RequestEngine::execute`] is one logical operation that
//! may span several physical exchanges. The engine loops: build the hop
//! request, hand it to the transport, and on a redirect consult the
//! policy before looping. The caller-supplied [`RequestDescriptor`] is
//! never mutated; each hop gets a freshly assembled
//! [`HttpRequest`](crate::transport::HttpRequest).

use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method};
use url::Url;

use crate::classify;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::headers::{AmbientHeaders, NoAmbientHeaders, UserAgent};
use crate::redirect::{self, Origin, RedirectOutcome, RejectReason};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// One logical request as described by the caller.
///
/// This is the immutable input to the engine. Redirect traversal never
/// touches it: the engine threads a separate working URL and hop counter
/// through its loop and rebuilds the physical request each iteration.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Initial target URL
    pub url: Url,
    /// Caller-supplied headers, layered over defaults and ambient headers
    pub headers: HeaderMap,
    /// Optional body payload
    pub body: Option<Vec<u8>>,
    /// Per-request timeout override; the configured timeout otherwise
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    /// Creates a descriptor with the given method and URL.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Creates a GET descriptor.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Adds a caller header.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Merges a caller-supplied header map. The supplied map itself is
    /// only read, never mutated.
    #[must_use]
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    /// Sets a raw body payload.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes a value as the JSON body payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the value cannot be serialized.
    pub fn with_json_body<B: serde::Serialize + ?Sized>(
        mut self,
        body: &B,
    ) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Overrides the configured timeout for this request only.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Executes logical operations against a transport, following redirects
/// under the configured policy.
///
/// # Type Parameters
///
/// - `T`: The transport implementation
/// - `A`: The ambient header source (defaults to [`NoAmbientHeaders`])
#[derive(Debug, Clone)]
pub struct RequestEngine<T, A = NoAmbientHeaders> {
    transport: T,
    config: ClientConfig,
    ambient: A,
    user_agent: UserAgent,
}

impl<T> RequestEngine<T, NoAmbientHeaders> {
    /// Creates an engine with no ambient headers and the default
    /// User-Agent identity.
    #[must_use]
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            ambient: NoAmbientHeaders,
            user_agent: UserAgent::default(),
        }
    }
}

impl<T, A> RequestEngine<T, A> {
    /// Replaces the ambient header source.
    #[must_use]
    pub fn with_ambient_headers<A2>(self, ambient: A2) -> RequestEngine<T, A2> {
        RequestEngine {
            transport: self.transport,
            config: self.config,
            ambient,
            user_agent: self.user_agent,
        }
    }

    /// Sets the User-Agent identity.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Returns the engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl<T: HttpTransport, A: AmbientHeaders> RequestEngine<T, A> {
    /// Executes one logical operation, following redirects as configured.
    ///
    /// The loop is bounded: at most `max_redirects + 1` redirect hops are
    /// followed on top of the initial exchange, and each exchange is
    /// bounded by the timeout. Cross-origin comparisons throughout the
    /// loop use the origin of the *initial* URL, fixed before the first
    /// exchange.
    ///
    /// # Errors
    ///
    /// Every failure is one of the classified taxonomy members or the
    /// two dedicated redirect errors; see [`ApiError`].
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse, ApiError> {
        let initial_origin = Origin::of(&request.url);
        let mut url = request.url.clone();
        // The first hop is trivially same-origin.
        let mut forward_credentials = true;
        let mut hops: u32 = 0;

        loop {
            let hop_request = self.build_hop_request(request, url.clone(), forward_credentials);
            tracing::debug!(method = %request.method, url = %url, hop = hops, "issuing exchange");

            let response = match self.transport.exchange(hop_request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "transport failure");
                    return Err(classify::classify_transport(&e, &url));
                }
            };
            tracing::debug!(status = %response.status, url = %url, hop = hops, "exchange complete");

            if redirect::is_redirect_candidate(response.status) {
                let location = response.header_str(LOCATION);
                let outcome = redirect::decide(
                    &request.method,
                    response.status,
                    &self.config,
                    &initial_origin,
                    &url,
                    location,
                    hops,
                )?;

                match outcome {
                    RedirectOutcome::Follow {
                        next_url,
                        cross_origin,
                        forward_credentials: forward,
                    } => {
                        tracing::debug!(from = %url, to = %next_url, cross_origin, "following redirect");
                        url = next_url;
                        forward_credentials = forward;
                        hops += 1;
                        continue;
                    }
                    RedirectOutcome::DoNotFollow
                    | RedirectOutcome::Reject(RejectReason::CrossOriginDisallowed) => {
                        // The redirect is refused, not hidden: the
                        // response itself is surfaced as the error.
                        return Err(classify::classify_status(
                            response.status,
                            &url,
                            &response.body,
                        ));
                    }
                    RedirectOutcome::Reject(RejectReason::LocationMissing) => {
                        return Err(ApiError::RedirectLocationMissing {
                            url: url.to_string(),
                        });
                    }
                    RedirectOutcome::Reject(RejectReason::TooManyRedirects) => {
                        return Err(ApiError::TooManyRedirects {
                            url: url.to_string(),
                            hops,
                        });
                    }
                }
            }

            if response.status.is_client_error() || response.status.is_server_error() {
                return Err(classify::classify_status(
                    response.status,
                    &url,
                    &response.body,
                ));
            }

            return Ok(response);
        }
    }

    /// Assembles the physical request for one hop.
    ///
    /// Header layering, later layers overriding earlier: engine defaults,
    /// then ambient headers, then caller headers, then credentials for
    /// this hop.
    fn build_hop_request(
        &self,
        request: &RequestDescriptor,
        url: Url,
        forward_credentials: bool,
    ) -> HttpRequest {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if request.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers.insert(USER_AGENT, self.user_agent.to_header());

        let ambient = self.ambient.current_headers();
        for name in ambient.keys() {
            headers.remove(name);
            for value in ambient.get_all(name) {
                if !value.is_empty() {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        for name in request.headers.keys() {
            headers.remove(name);
            for value in request.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        if forward_credentials {
            if let Some(credentials) = &self.config.credentials {
                if let Ok(value) = HeaderValue::from_str(&credentials.authorization_value()) {
                    headers.insert(AUTHORIZATION, value);
                }
            }
        }

        HttpRequest {
            method: request.method.clone(),
            url,
            headers,
            body: request.body.clone(),
            timeout: request.timeout.unwrap_or(self.config.timeout),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
