//! restcall: a redirect-aware foundation for JSON HTTP API clients.
//!
//! The crate centers on a bounded redirect-following request engine with
//! a cross-origin credential policy, a flat typed error taxonomy, and
//! lazy `Link`-header pagination with memoized page navigation.

pub mod classify;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod headers;
pub mod page;
pub mod redirect;
pub mod transport;

pub use client::{ApiClient, ApiResponse};
pub use config::{ClientConfig, ConfigError, Credentials};
pub use engine::{RequestDescriptor, RequestEngine};
pub use error::{ApiError, StatusError, StatusKind};
pub use headers::{AmbientHeaders, NoAmbientHeaders, StaticHeaders, UserAgent};
pub use page::{ItemStream, ListPage, PageFetcher, PageLinks, PageMeta, PaginatedCollection};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
