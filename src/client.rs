//! The caller-facing API client.
//!
//! [`ApiClient`] binds a transport, a configuration, an ambient header
//! source, and a User-Agent identity into the verb surface callers use:
//! `get` / `post` / `put` / `patch` / `delete` / `get_raw` / `get_list`.
//! Every verb runs one logical operation through the redirect-aware
//! engine and returns either a parsed-response wrapper or a taxonomy
//! error.

use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::engine::{RequestDescriptor, RequestEngine};
use crate::error::ApiError;
use crate::headers::{AmbientHeaders, NoAmbientHeaders, UserAgent};
use crate::page::{ListPage, PageFetcher, PaginatedCollection};
use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport};

/// A parsed-response wrapper for one successful operation.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: http::StatusCode,
    headers: http::HeaderMap,
    body: Vec<u8>,
}

impl From<HttpResponse> for ApiResponse {
    fn from(response: HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }
}

impl ApiResponse {
    /// The response status code.
    #[must_use]
    pub const fn status(&self) -> http::StatusCode {
        self.status
    }

    /// The response headers.
    #[must_use]
    pub const fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    /// The raw response body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Parses the JSON body into a dynamic value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the body is not valid JSON.
    pub fn value(&self) -> Result<serde_json::Value, ApiError> {
        self.json()
    }
}

/// A client of one JSON HTTP API.
///
/// Cheap to clone when its transport is (the production transport is).
/// Configuration is immutable once the client is built; per-request
/// variation goes through [`RequestDescriptor`] and [`Self::execute`].
///
/// # Example
///
/// ```no_run
/// use restcall::{ApiClient, ClientConfig};
///
/// # async fn example() -> Result<(), restcall::ApiError> {
/// let client = ApiClient::new(ClientConfig::new().with_bearer_token("t0ken"));
/// let things = client.get_list("https://api.example.com/things").await?;
/// for item in things.items() {
///     println!("{item}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient<T = ReqwestTransport, A = NoAmbientHeaders> {
    engine: RequestEngine<T, A>,
}

impl ApiClient<ReqwestTransport, NoAmbientHeaders> {
    /// Creates a client over the production transport.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(ReqwestTransport::new(), config)
    }
}

impl<T> ApiClient<T, NoAmbientHeaders> {
    /// Creates a client over the given transport.
    #[must_use]
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self {
            engine: RequestEngine::new(transport, config),
        }
    }
}

impl<T, A> ApiClient<T, A> {
    /// Replaces the ambient header source.
    #[must_use]
    pub fn with_ambient_headers<A2>(self, ambient: A2) -> ApiClient<T, A2> {
        ApiClient {
            engine: self.engine.with_ambient_headers(ambient),
        }
    }

    /// Sets the User-Agent identity.
    #[must_use]
    pub fn with_user_agent(self, user_agent: UserAgent) -> Self {
        Self {
            engine: self.engine.with_user_agent(user_agent),
        }
    }

    /// The client's configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        self.engine.config()
    }

    fn parse_url(url: &str) -> Result<Url, ApiError> {
        Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("'{url}': {e}")))
    }
}

impl<T: HttpTransport, A: AmbientHeaders> ApiClient<T, A> {
    /// Executes an arbitrary request descriptor.
    ///
    /// This is the escape hatch for per-request headers, timeouts, or
    /// methods the verb helpers do not cover.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failed operation.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ApiResponse, ApiError> {
        let response = self.engine.execute(&descriptor).await?;
        Ok(ApiResponse::from(response))
    }

    /// GETs a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failed operation.
    pub async fn get(&self, url: &str) -> Result<ApiResponse, ApiError> {
        self.execute(RequestDescriptor::get(Self::parse_url(url)?))
            .await
    }

    /// GETs a resource and returns its body as text, unparsed.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failed operation.
    pub async fn get_raw(&self, url: &str) -> Result<String, ApiError> {
        let response = self.get(url).await?;
        Ok(response.text())
    }

    /// POSTs with an optional JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failed operation.
    pub async fn post<B>(&self, url: &str, body: Option<&B>) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::POST, url, body).await
    }

    /// PUTs a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failed operation.
    pub async fn put<B>(&self, url: &str, body: &B) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::PUT, url, Some(body)).await
    }

    /// PATCHes with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failed operation.
    pub async fn patch<B>(&self, url: &str, body: &B) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::PATCH, url, Some(body)).await
    }

    /// DELETEs with an optional JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failed operation.
    pub async fn delete<B>(&self, url: &str, body: Option<&B>) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send_with_body(Method::DELETE, url, body).await
    }

    async fn send_with_body<B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut descriptor = RequestDescriptor::new(method, Self::parse_url(url)?);
        if let Some(body) = body {
            descriptor = descriptor.with_json_body(body)?;
        }
        self.execute(descriptor).await
    }
}

impl<T, A> ApiClient<T, A>
where
    T: HttpTransport + Clone + 'static,
    A: AmbientHeaders + Clone + 'static,
{
    /// GETs a paginated list resource.
    ///
    /// The returned collection navigates the page chain lazily through
    /// this client; see [`PaginatedCollection`].
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for any failed operation.
    pub async fn get_list(&self, url: &str) -> Result<PaginatedCollection<Self>, ApiError> {
        let url = Self::parse_url(url)?;
        let page = self.fetch_page(url).await?;
        Ok(PaginatedCollection::new(page, self.clone()))
    }
}

impl<T, A> PageFetcher for ApiClient<T, A>
where
    T: HttpTransport + Clone + 'static,
    A: AmbientHeaders + Clone + 'static,
{
    async fn fetch_page(&self, url: Url) -> Result<ListPage, ApiError> {
        let response = self.engine.execute(&RequestDescriptor::get(url.clone())).await?;
        ListPage::from_response(&response, &url)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
