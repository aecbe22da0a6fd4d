//! Production transport implementation using reqwest.

use super::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Production transport using reqwest.
///
/// This is a thin wrapper around `reqwest::Client` that implements the
/// [`HttpTransport`] trait. Automatic redirect following is disabled so
/// that every 3xx response reaches the request engine, which owns the
/// redirect policy. Connection pooling and TLS verification are
/// inherited from reqwest's defaults.
///
/// # Example
///
/// ```no_run
/// use restcall::transport::{ReqwestTransport, HttpTransport, HttpRequest};
/// use std::time::Duration;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = ReqwestTransport::new();
/// let url = Url::parse("https://api.example.com/things")?;
/// let request = HttpRequest::new(http::Method::GET, url, Duration::from_secs(4));
/// let response = transport.exchange(request).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a new transport with redirect following disabled.
    #[must_use]
    pub fn new() -> Self {
        let inner = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("default reqwest client construction cannot fail");
        Self { inner }
    }

    /// Creates a transport from an existing reqwest client.
    ///
    /// The caller is responsible for having disabled automatic redirect
    /// following on the supplied client; a client that follows redirects
    /// itself hides the 3xx responses the engine needs to see.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    async fn exchange(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .inner
            .request(req.method, req.url.as_str())
            .timeout(req.timeout);

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(classify_reqwest_error)?
            .to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }
}

/// Maps a reqwest error onto the five transport failure kinds.
fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        return TransportError::Timeout;
    }
    if e.is_builder() {
        return TransportError::InvalidUrl(e.to_string());
    }
    if let Some(io) = io_source(&e) {
        match io.kind() {
            std::io::ErrorKind::ConnectionRefused => {
                return TransportError::ConnectionRefused(e.to_string());
            }
            std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
                return TransportError::ConnectionReset(e.to_string());
            }
            _ => {}
        }
    }
    if e.is_connect() {
        TransportError::ConnectionRefused(e.to_string())
    } else {
        TransportError::Socket(e.to_string())
    }
}

/// Walks the source chain looking for the underlying I/O error.
fn io_source<'a>(e: &'a (dyn std::error::Error + 'static)) -> Option<&'a std::io::Error> {
    let mut source = e.source();
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        source = err.source();
    }
    None
}
