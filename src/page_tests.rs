//! Tests for list pages, link parsing, and lazy traversal.

use super::{ListPage, PageFetcher, PageLinks, PageMeta, PaginatedCollection, parse_link_header};
use crate::error::ApiError;
use crate::transport::HttpResponse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_stream::StreamExt;
use url::Url;

fn base_url() -> Url {
    Url::parse("https://api.example.com/things?page=1").unwrap()
}

/// Builds a list response with the given JSON body and optional Link
/// header value.
fn list_response(body: &str, link: Option<&str>) -> HttpResponse {
    let mut headers = http::HeaderMap::new();
    if let Some(link) = link {
        headers.insert(http::header::LINK, http::HeaderValue::from_str(link).unwrap());
    }
    HttpResponse::new(http::StatusCode::OK, headers, body.as_bytes().to_vec())
}

fn parse_page(body: &str, link: Option<&str>) -> ListPage {
    ListPage::from_response(&list_response(body, link), &base_url()).unwrap()
}

mod link_header {
    use super::*;

    #[test]
    fn parses_next_previous_and_self() {
        let value = concat!(
            "<https://api.example.com/things?page=2>; rel=\"next\", ",
            "<https://api.example.com/things?page=0>; rel=\"previous\", ",
            "<https://api.example.com/things?page=1>; rel=\"self\""
        );
        let links = parse_link_header(value, &base_url());

        assert_eq!(
            links.next.unwrap().as_str(),
            "https://api.example.com/things?page=2"
        );
        assert_eq!(
            links.previous.unwrap().as_str(),
            "https://api.example.com/things?page=0"
        );
        assert_eq!(
            links.this.unwrap().as_str(),
            "https://api.example.com/things?page=1"
        );
    }

    #[test]
    fn accepts_prev_as_relation_name() {
        let links = parse_link_header("</things?page=0>; rel=\"prev\"", &base_url());
        assert!(links.previous.is_some());
    }

    #[test]
    fn resolves_relative_urls_against_request_url() {
        let links = parse_link_header("</things?page=2>; rel=\"next\"", &base_url());
        assert_eq!(
            links.next.unwrap().as_str(),
            "https://api.example.com/things?page=2"
        );
    }

    #[test]
    fn ignores_unknown_relations_and_malformed_entries() {
        let value = "<https://a.example/x>; rel=\"first\", no-brackets; rel=\"next\", <>; rel";
        let links = parse_link_header(value, &base_url());
        assert_eq!(links, PageLinks::default());
    }

    #[test]
    fn tolerates_unquoted_rel_values() {
        let links = parse_link_header("</things?page=2>; rel=next", &base_url());
        assert!(links.next.is_some());
    }
}

mod list_page {
    use super::*;

    #[test]
    fn array_body_becomes_items_in_order() {
        let page = parse_page(r#"[{"id":1},{"id":2},{"id":3}]"#, None);

        let ids: Vec<_> = page.items().iter().map(|v| v["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn non_array_body_is_a_single_item_page() {
        let page = parse_page(r#"{"id":7}"#, None);
        assert_eq!(page.items().len(), 1);
        assert_eq!(page.items()[0]["id"], 7);
    }

    #[test]
    fn empty_body_is_an_empty_page() {
        let page = parse_page("", None);
        assert!(page.items().is_empty());
    }

    #[test]
    fn invalid_json_body_is_a_decode_error() {
        let result = ListPage::from_response(&list_response("<html>", None), &base_url());
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn no_link_header_means_unpaginated() {
        let page = parse_page("[]", None);
        assert_eq!(*page.links(), PageLinks::default());
    }

    #[test]
    fn meta_is_read_from_counting_headers() {
        let mut response = list_response("[]", None);
        response.headers.insert("x-page", "2".parse().unwrap());
        response.headers.insert("x-total-pages", "5".parse().unwrap());
        response.headers.insert("x-per-page", "20".parse().unwrap());
        response.headers.insert("x-total-count", "97".parse().unwrap());

        let page = ListPage::from_response(&response, &base_url()).unwrap();
        assert_eq!(
            page.meta(),
            Some(PageMeta {
                page: Some(2),
                total_pages: Some(5),
                page_size: Some(20),
                total_count: Some(97),
            })
        );
    }

    #[test]
    fn meta_is_absent_without_counting_headers() {
        let page = parse_page("[]", None);
        assert_eq!(page.meta(), None);
    }
}

/// Mock fetcher serving pages from a URL-keyed map and counting fetches
/// per URL.
#[derive(Clone)]
struct MockFetcher {
    pages: Arc<HashMap<String, ListPage>>,
    fetch_counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockFetcher {
    fn new(pages: HashMap<String, ListPage>) -> Self {
        Self {
            pages: Arc::new(pages),
            fetch_counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn fetches_of(&self, url: &str) -> usize {
        self.fetch_counts.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn total_fetches(&self) -> usize {
        self.fetch_counts.lock().unwrap().values().sum()
    }
}

impl PageFetcher for MockFetcher {
    async fn fetch_page(&self, url: Url) -> Result<ListPage, ApiError> {
        let key = url.to_string();
        *self.fetch_counts.lock().unwrap().entry(key.clone()).or_insert(0) += 1;
        self.pages.get(&key).cloned().ok_or_else(|| ApiError::EndpointNotFound(key))
    }
}

fn page_url(n: usize) -> String {
    format!("https://api.example.com/things?page={n}")
}

/// Builds a three-page series of two items each (ids 1..=6) linked via
/// next/previous, returning the first page's collection and the fetcher.
fn three_page_series() -> (PaginatedCollection<MockFetcher>, MockFetcher) {
    let link = |n: usize, rel: &str| format!("<{}>; rel=\"{rel}\"", page_url(n));

    let page1 = parse_page(r#"[{"id":1},{"id":2}]"#, Some(&link(2, "next")));
    let page2 = parse_page(
        r#"[{"id":3},{"id":4}]"#,
        Some(&format!("{}, {}", link(3, "next"), link(1, "previous"))),
    );
    let page3 = parse_page(r#"[{"id":5},{"id":6}]"#, Some(&link(2, "previous")));

    let mut pages = HashMap::new();
    pages.insert(page_url(1), page1.clone());
    pages.insert(page_url(2), page2);
    pages.insert(page_url(3), page3);

    let fetcher = MockFetcher::new(pages);
    (PaginatedCollection::new(page1, fetcher.clone()), fetcher)
}

mod navigation {
    use super::*;

    #[tokio::test]
    async fn has_next_reflects_link_presence_at_each_boundary() {
        let (first, _) = three_page_series();
        assert!(first.has_next());
        assert!(!first.has_previous());

        let second = first.next().await.unwrap().unwrap();
        assert!(second.has_next());
        assert!(second.has_previous());

        let third = second.next().await.unwrap().unwrap();
        assert!(!third.has_next());
        assert!(third.has_previous());
    }

    #[tokio::test]
    async fn next_without_link_is_none() {
        let page = parse_page("[]", None);
        let collection = PaginatedCollection::new(page, MockFetcher::new(HashMap::new()));

        assert!(collection.next().await.unwrap().is_none());
        assert!(collection.previous().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn next_twice_returns_the_same_cached_page_without_refetch() {
        let (first, fetcher) = three_page_series();

        let a = first.next().await.unwrap().unwrap();
        let b = first.next().await.unwrap().unwrap();

        assert!(a.same_page(&b));
        assert_eq!(fetcher.fetches_of(&page_url(2)), 1);
    }

    #[tokio::test]
    async fn previous_is_memoized_independently_of_next() {
        let (first, fetcher) = three_page_series();
        let second = first.next().await.unwrap().unwrap();

        // The second page fetches its previous page fresh; the resulting
        // object is distinct from the original first-page handle but is
        // itself cached.
        let back_a = second.previous().await.unwrap().unwrap();
        let back_b = second.previous().await.unwrap().unwrap();

        assert!(back_a.same_page(&back_b));
        assert!(!back_a.same_page(&first));
        assert_eq!(fetcher.fetches_of(&page_url(1)), 1);
    }

    #[tokio::test]
    async fn failed_fetch_propagates_and_leaves_cache_retryable() {
        let page = parse_page(
            "[]",
            Some("<https://api.example.com/missing>; rel=\"next\""),
        );
        let fetcher = MockFetcher::new(HashMap::new());
        let collection = PaginatedCollection::new(page, fetcher.clone());

        assert!(collection.next().await.is_err());
        assert!(collection.next().await.is_err());
        assert_eq!(fetcher.fetches_of("https://api.example.com/missing"), 2);
    }
}

mod all_items {
    use super::*;

    #[tokio::test]
    async fn yields_all_items_in_original_order() {
        let (first, _) = three_page_series();

        let items: Vec<_> = first.all_items().collect::<Vec<_>>().await;
        let ids: Vec<_> = items
            .into_iter()
            .map(|item| item.unwrap()["id"].as_i64().unwrap())
            .collect();

        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn fetches_each_page_exactly_once_per_traversal_set() {
        let (first, fetcher) = three_page_series();

        let count = first.all_items().fold(0, |n, _| n + 1).await;
        assert_eq!(count, 6);
        assert_eq!(fetcher.fetches_of(&page_url(2)), 1);
        assert_eq!(fetcher.fetches_of(&page_url(3)), 1);

        // Re-traversing from the same root object hits only the caches.
        let count = first.all_items().fold(0, |n, _| n + 1).await;
        assert_eq!(count, 6);
        assert_eq!(fetcher.total_fetches(), 2);
    }

    #[tokio::test]
    async fn does_not_prefetch_beyond_consumed_items() {
        let (first, fetcher) = three_page_series();

        let mut stream = first.all_items();
        let first_item = stream.next().await.unwrap().unwrap();
        let second_item = stream.next().await.unwrap().unwrap();

        assert_eq!(first_item["id"], 1);
        assert_eq!(second_item["id"], 2);
        // Both items came from the first page; nothing was fetched.
        assert_eq!(fetcher.total_fetches(), 0);

        let third_item = stream.next().await.unwrap().unwrap();
        assert_eq!(third_item["id"], 3);
        assert_eq!(fetcher.fetches_of(&page_url(2)), 1);
        assert_eq!(fetcher.fetches_of(&page_url(3)), 0);
    }

    #[tokio::test]
    async fn unpaginated_page_streams_only_its_own_items() {
        let page = parse_page(r#"[{"id":1},{"id":2}]"#, None);
        let fetcher = MockFetcher::new(HashMap::new());
        let collection = PaginatedCollection::new(page, fetcher.clone());

        let items: Vec<_> = collection.all_items().collect::<Vec<_>>().await;

        assert_eq!(items.len(), 2);
        assert_eq!(fetcher.total_fetches(), 0);
    }

    #[tokio::test]
    async fn fetch_error_is_surfaced_once_then_stream_ends() {
        let page = parse_page(
            r#"[{"id":1}]"#,
            Some("<https://api.example.com/missing>; rel=\"next\""),
        );
        let fetcher = MockFetcher::new(HashMap::new());
        let collection = PaginatedCollection::new(page, fetcher);

        let mut stream = collection.all_items();
        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
