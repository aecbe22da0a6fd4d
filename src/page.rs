//! Lazy traversal of paginated list results.
//!
//! A list response is one [`ListPage`]: its items, optional counting
//! metadata, and the page URLs discovered in the `Link` response header.
//! [`PaginatedCollection`] wraps a page together with a fetch capability
//! and memoizes neighbor pages per direction, so navigating to the same
//! neighbor twice never re-issues the request. [`ItemStream`] flattens
//! the whole chain into a lazy, in-order sequence of items that fetches
//! each page at most once, and only on demand.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::HeaderMap;
use tokio::sync::OnceCell;
use tokio_stream::Stream;
use url::Url;

use crate::error::ApiError;
use crate::transport::HttpResponse;

/// Page URLs discovered from the `Link` response header.
///
/// Absence of a relation means there is no page in that direction; a
/// response without a `Link` header at all is an unpaginated,
/// single-page result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// URL of the following page
    pub next: Option<Url>,
    /// URL of the preceding page
    pub previous: Option<Url>,
    /// URL of this page itself
    pub this: Option<Url>,
}

/// Counting metadata reported alongside a page, when the server sends
/// the `X-Page` / `X-Total-Pages` / `X-Per-Page` / `X-Total-Count`
/// headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMeta {
    /// Current page number
    pub page: Option<u64>,
    /// Total number of pages
    pub total_pages: Option<u64>,
    /// Items per page
    pub page_size: Option<u64>,
    /// Total item count across all pages
    pub total_count: Option<u64>,
}

impl PageMeta {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| -> Option<u64> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        };

        let meta = Self {
            page: read("x-page"),
            total_pages: read("x-total-pages"),
            page_size: read("x-per-page"),
            total_count: read("x-total-count"),
        };

        if meta == Self::default() { None } else { Some(meta) }
    }
}

/// Parses a `Link` header value of the form
/// `<url>; rel="name", <url>; rel="name"`, resolving each URL against
/// the request URL. Unknown relations and malformed entries are skipped.
fn parse_link_header(value: &str, base: &Url) -> PageLinks {
    let mut links = PageLinks::default();

    for entry in value.split(',') {
        let mut parts = entry.split(';');
        let Some(target) = parts.next() else {
            continue;
        };
        let target = target.trim();
        let Some(target) = target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
        else {
            continue;
        };
        let Ok(url) = base.join(target) else {
            continue;
        };

        let rel = parts.find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("rel") {
                Some(value.trim().trim_matches('"').to_ascii_lowercase())
            } else {
                None
            }
        });

        match rel.as_deref() {
            Some("next") => links.next = Some(url),
            Some("previous" | "prev") => links.previous = Some(url),
            Some("self") => links.this = Some(url),
            _ => {}
        }
    }

    links
}

/// One parsed list page: an ordered sequence of items plus pagination
/// metadata. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    items: Vec<serde_json::Value>,
    meta: Option<PageMeta>,
    links: PageLinks,
}

impl ListPage {
    /// Parses a list page out of a successful response.
    ///
    /// A JSON array body becomes the item sequence; any other JSON value
    /// is treated as a single-item page. `Link` URLs are resolved
    /// against the request URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the body is not valid JSON.
    pub fn from_response(response: &HttpResponse, request_url: &Url) -> Result<Self, ApiError> {
        let items = if response.body.is_empty() {
            Vec::new()
        } else {
            match serde_json::from_slice(&response.body)? {
                serde_json::Value::Array(items) => items,
                single => vec![single],
            }
        };

        let links = response
            .header_str(http::header::LINK)
            .map(|value| parse_link_header(value, request_url))
            .unwrap_or_default();

        Ok(Self {
            items,
            meta: PageMeta::from_headers(&response.headers),
            links,
        })
    }

    /// The page's items, in response order.
    #[must_use]
    pub fn items(&self) -> &[serde_json::Value] {
        &self.items
    }

    /// Counting metadata, when the server reported any.
    #[must_use]
    pub const fn meta(&self) -> Option<PageMeta> {
        self.meta
    }

    /// The page's link relations.
    #[must_use]
    pub const fn links(&self) -> &PageLinks {
        &self.links
    }
}

/// Capability to fetch one list page by URL.
///
/// Bound to a specific client: implementations execute a GET through the
/// request engine and parse the result into a [`ListPage`].
pub trait PageFetcher: Send + Sync {
    /// Fetches and parses the page at `url`.
    fn fetch_page(
        &self,
        url: Url,
    ) -> impl Future<Output = Result<ListPage, ApiError>> + Send;
}

struct CollectionInner<F> {
    page: ListPage,
    fetcher: F,
    next_cache: OnceCell<Option<PaginatedCollection<F>>>,
    previous_cache: OnceCell<Option<PaginatedCollection<F>>>,
}

/// One fetched list page plus lazy, memoized navigation to its
/// neighbors.
///
/// Cloning is cheap and shares the underlying page and its caches: the
/// clone and the original memoize together, so a page reachable from
/// several handles is still fetched at most once. Neighbor references
/// are write-once per direction and stable for the lifetime of the page
/// object, even if the remote data changes afterwards.
pub struct PaginatedCollection<F> {
    inner: Arc<CollectionInner<F>>,
}

impl<F> Clone for PaginatedCollection<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> std::fmt::Debug for PaginatedCollection<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedCollection")
            .field("items", &self.inner.page.items().len())
            .field("has_next", &self.has_next())
            .field("has_previous", &self.has_previous())
            .finish()
    }
}

impl<F> PaginatedCollection<F> {
    /// Wraps a fetched page with its fetch capability.
    #[must_use]
    pub fn new(page: ListPage, fetcher: F) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                page,
                fetcher,
                next_cache: OnceCell::new(),
                previous_cache: OnceCell::new(),
            }),
        }
    }

    /// The wrapped page.
    #[must_use]
    pub fn page(&self) -> &ListPage {
        &self.inner.page
    }

    /// This page's items, in response order.
    #[must_use]
    pub fn items(&self) -> &[serde_json::Value] {
        self.inner.page.items()
    }

    /// True iff the page links to a following page.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.inner.page.links().next.is_some()
    }

    /// True iff the page links to a preceding page.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.inner.page.links().previous.is_some()
    }

    /// True iff both handles wrap the same page object.
    #[must_use]
    pub fn same_page(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<F> PaginatedCollection<F>
where
    F: PageFetcher + Clone + Send + Sync + 'static,
{
    /// Navigates to the following page.
    ///
    /// Returns `None` when there is no `next` link. The first successful
    /// call fetches the page; every later call returns the same cached
    /// page object without another fetch. A failed fetch leaves the
    /// cache unset so the caller may try again.
    ///
    /// # Errors
    ///
    /// Propagates the fetch's taxonomy error.
    pub async fn next(&self) -> Result<Option<Self>, ApiError> {
        self.neighbor(&self.inner.next_cache, self.inner.page.links().next.clone())
            .await
    }

    /// Navigates to the preceding page; symmetric to [`Self::next`].
    ///
    /// # Errors
    ///
    /// Propagates the fetch's taxonomy error.
    pub async fn previous(&self) -> Result<Option<Self>, ApiError> {
        self.neighbor(
            &self.inner.previous_cache,
            self.inner.page.links().previous.clone(),
        )
        .await
    }

    async fn neighbor(
        &self,
        cache: &OnceCell<Option<Self>>,
        target: Option<Url>,
    ) -> Result<Option<Self>, ApiError> {
        cache
            .get_or_try_init(|| async move {
                let Some(url) = target else {
                    return Ok(None);
                };
                tracing::debug!(url = %url, "fetching neighboring page");
                let page = self.inner.fetcher.fetch_page(url).await?;
                Ok(Some(Self::new(page, self.inner.fetcher.clone())))
            })
            .await
            .map(Clone::clone)
    }

    /// A lazy, flattened sequence of this page's items followed by every
    /// following page's items, in order.
    ///
    /// Pages are fetched strictly in traversal order, only when the
    /// preceding page's items are exhausted, and never speculatively.
    /// Because fetching goes through the memoized [`Self::next`], fully
    /// draining the stream several times from the same starting page
    /// still fetches each page exactly once.
    #[must_use]
    pub fn all_items(&self) -> ItemStream<F> {
        ItemStream {
            state: StreamState::Yielding {
                page: self.clone(),
                index: 0,
            },
        }
    }
}

type PageFuture<F> =
    Pin<Box<dyn Future<Output = Result<Option<PaginatedCollection<F>>, ApiError>> + Send>>;

enum StreamState<F> {
    Yielding { page: PaginatedCollection<F>, index: usize },
    Fetching(PageFuture<F>),
    Done,
}

/// Lazy stream over all items of a page chain.
///
/// Yields `Result` items: a failed page fetch surfaces its error once
/// and ends the stream.
pub struct ItemStream<F> {
    state: StreamState<F>,
}

impl<F> Stream for ItemStream<F>
where
    F: PageFetcher + Clone + Send + Sync + 'static,
{
    type Item = Result<serde_json::Value, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                StreamState::Yielding { page, index } => {
                    if let Some(item) = page.items().get(*index) {
                        *index += 1;
                        return Poll::Ready(Some(Ok(item.clone())));
                    }
                    let page = page.clone();
                    this.state =
                        StreamState::Fetching(Box::pin(async move { page.next().await }));
                }
                StreamState::Fetching(future) => match future.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(Some(next))) => {
                        this.state = StreamState::Yielding {
                            page: next,
                            index: 0,
                        };
                    }
                    Poll::Ready(Ok(None)) => {
                        this.state = StreamState::Done;
                        return Poll::Ready(None);
                    }
                    Poll::Ready(Err(e)) => {
                        this.state = StreamState::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                StreamState::Done => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
