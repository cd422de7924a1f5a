//! Integration tests for the paginated page fetch loop.

use ebook_archiver_core::{ContentFetcher, ContentItem, FetchError, ProgressCounters, ResolvedAccess};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

mod support;
use support::logged_in;

/// Matches requests whose Cookie header carries all three platform cookies.
struct CarriesContentCookies;

impl Match for CarriesContentCookies {
    fn matches(&self, request: &Request) -> bool {
        let Some(cookie) = request.headers.get("cookie").and_then(|v| v.to_str().ok()) else {
            return false;
        };
        ["digi4s=sess-123", "digi4b=X", "digi4p=Y"]
            .iter()
            .all(|pair| cookie.split("; ").any(|c| c == *pair))
    }
}

fn access() -> ResolvedAccess {
    ResolvedAccess::new("X", "Y", None).expect("non-empty cookies")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .and(CarriesContentCookies)
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_all_stops_at_first_404() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(&server, "/a/ebook/abc/1.svg", "p1").await;
    mount_page(&server, "/a/ebook/abc/2.svg", "p2").await;
    mount_page(&server, "/a/ebook/abc/3.svg", "p3").await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/4.svg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/5.svg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&server)
        .await;

    let progress = ProgressCounters::new(1);
    let pages = ContentFetcher::new(&session)
        .fetch_all(&ContentItem::new("abc", "Book"), &access(), temp_dir.path(), &progress)
        .await
        .expect("fetch succeeds");

    assert_eq!(pages, 3);
    assert_eq!(progress.pages_in_item(), 3);
    for (name, body) in [("00001.svg", "p1"), ("00002.svg", "p2"), ("00003.svg", "p3")] {
        assert_eq!(std::fs::read_to_string(temp_dir.path().join(name)).unwrap(), body);
    }
    assert!(!temp_dir.path().join("00004.svg").exists());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 3);
}

#[tokio::test]
async fn test_fetch_all_uses_sub_path() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(&server, "/a/ebook/abc/1/1.svg", "only").await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/1/2.svg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let access = ResolvedAccess::new("X", "Y", Some("1".to_string())).unwrap();
    let pages = ContentFetcher::new(&session)
        .fetch_all(
            &ContentItem::new("abc", "Book"),
            &access,
            temp_dir.path(),
            &ProgressCounters::default(),
        )
        .await
        .expect("fetch succeeds");

    assert_eq!(pages, 1);
    assert!(temp_dir.path().join("00001.svg").exists());
}

#[tokio::test]
async fn test_repeated_asset_is_downloaded_once_into_marker_dir() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    let temp_dir = TempDir::new().unwrap();

    let page = r#"<svg xmlns:xlink="http://www.w3.org/1999/xlink">
        <image xlink:href="1/img/0.png"/>
        <image xlink:href="1/shade/bg.jpg"/>
        <image xlink:href="1/img/0.png"/>
    </svg>"#;
    mount_page(&server, "/a/ebook/abc/1.svg", page).await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/2.svg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/1/img/0.png"))
        .and(CarriesContentCookies)
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNG".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/1/shade/bg.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPG".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let pages = ContentFetcher::new(&session)
        .fetch_all(
            &ContentItem::new("abc", "Book"),
            &access(),
            temp_dir.path(),
            &ProgressCounters::default(),
        )
        .await
        .expect("fetch succeeds");

    assert_eq!(pages, 1);
    let root = temp_dir.path();
    assert_eq!(std::fs::read(root.join("1/img/0.png")).unwrap(), b"PNG");
    assert_eq!(std::fs::read(root.join("1/shade/bg.jpg")).unwrap(), b"JPG");
    assert_eq!(std::fs::read_to_string(root.join("00001.svg")).unwrap(), page);
}

#[tokio::test]
async fn test_server_error_is_fatal_for_item() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(&server, "/a/ebook/abc/1.svg", "p1").await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/2.svg"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = ContentFetcher::new(&session)
        .fetch_all(
            &ContentItem::new("abc", "Book"),
            &access(),
            temp_dir.path(),
            &ProgressCounters::default(),
        )
        .await;

    match result {
        Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("Expected HttpStatus error, got: {other:?}"),
    }
    assert!(temp_dir.path().join("00001.svg").exists());
    assert!(!temp_dir.path().join("00002.svg").exists());
}

#[tokio::test]
async fn test_missing_asset_fails_item_before_page_is_written() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(&server, "/a/ebook/abc/1.svg", r#"<image xlink:href="1/img/gone.png"/>"#).await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/1/img/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = ContentFetcher::new(&session)
        .fetch_all(
            &ContentItem::new("abc", "Book"),
            &access(),
            temp_dir.path(),
            &ProgressCounters::default(),
        )
        .await;

    assert!(
        matches!(result, Err(FetchError::HttpStatus { status: 404, .. })),
        "Expected asset 404 to fail the item, got: {result:?}"
    );
    assert!(!temp_dir.path().join("00001.svg").exists());
}

#[tokio::test]
async fn test_asset_on_foreign_host_is_never_requested() {
    let server = MockServer::start().await;
    let foreign = MockServer::start().await;
    let session = logged_in(&server).await;
    let temp_dir = TempDir::new().unwrap();

    let page = format!(
        r#"<svg><image xlink:href="{}/7/img/evil.png"/><image xlink:href="1/img/0.png"/></svg>"#,
        foreign.uri()
    );
    mount_page(&server, "/a/ebook/abc/1.svg", &page).await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/2.svg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a/ebook/abc/1/img/0.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNG".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"EVIL".to_vec()))
        .expect(0)
        .mount(&foreign)
        .await;

    let pages = ContentFetcher::new(&session)
        .fetch_all(
            &ContentItem::new("abc", "Book"),
            &access(),
            temp_dir.path(),
            &ProgressCounters::default(),
        )
        .await
        .expect("fetch succeeds");

    assert_eq!(pages, 1);
    assert!(foreign.received_requests().await.unwrap_or_default().is_empty());
    assert!(!temp_dir.path().join("7/img/evil.png").exists());
    assert!(temp_dir.path().join("1/img/0.png").exists());
}
