use pretty_assertions::assert_eq;
use serde_json::json;
use vibe_review::error::ReviewError;
use vibe_review::reference::RepositoryReference;
use vibe_review::source::{FETCH_FAILED_MARKER, SourceSelector};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/repos/acme/widget/contents";

fn file(server: &MockServer, name: &str, size: u64) -> serde_json::Value {
    json!({
        "type": "file",
        "name": name,
        "path": name,
        "size": size,
        "download_url": format!("{}/raw/{}", server.uri(), name),
    })
}

fn acme() -> RepositoryReference {
    RepositoryReference::parse("https://github.com/acme/widget").unwrap()
}

async fn mount_listing(server: &MockServer, listing: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(server)
        .await;
}

async fn mount_raw(server: &MockServer, name: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/raw/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn selects_at_most_five_supported_files_in_listing_order() {
    let server = MockServer::start().await;
    let mut listing = vec![
        json!({ "type": "dir", "name": "src.js", "path": "src.js", "size": 0 }),
        file(&server, "README.md", 10),
        file(&server, "huge.js", 100_000),
    ];
    for name in ["a.js", "b.py", "c.rs", "d.go", "e.ts", "f.java"] {
        listing.push(file(&server, name, 20));
        mount_raw(&server, name, &format!("body of {name}")).await;
    }
    mount_listing(&server, json!(listing)).await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let files = selector.select(&acme()).await.unwrap();

    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.js", "b.py", "d.go", "e.ts", "f.java"]);
    assert!(!paths.contains(&"c.rs"));
    assert_eq!(files[2].content, "body of d.go");
}

#[tokio::test]
async fn failed_file_fetch_becomes_marker() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([file(&server, "ok.py", 5), file(&server, "broken.py", 5)]),
    )
    .await;
    mount_raw(&server, "ok.py", "print('hi')").await;
    Mock::given(method("GET"))
        .and(path("/raw/broken.py"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let files = selector.select(&acme()).await.unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].content, "print('hi')");
    assert_eq!(files[1].content, FETCH_FAILED_MARKER);
}

#[tokio::test]
async fn missing_download_url_becomes_marker() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([{ "type": "file", "name": "x.py", "path": "x.py", "size": 1, "download_url": null }]),
    )
    .await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let files = selector.select(&acme()).await.unwrap();
    assert_eq!(files[0].content, FETCH_FAILED_MARKER);
}

#[tokio::test]
async fn no_supported_files() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([file(&server, "README.md", 10), file(&server, "LICENSE", 10)]),
    )
    .await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let err = selector.select(&acme()).await.unwrap_err();
    assert!(matches!(err, ReviewError::NoSupportedFiles));
}

#[tokio::test]
async fn listing_404_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let err = selector.select(&acme()).await.unwrap_err();
    assert!(matches!(err, ReviewError::NotFound { ref repo } if repo == "acme/widget"));
    assert!(err.user_message().contains("Repository not found"));
}

#[tokio::test]
async fn listing_403_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let err = selector.select(&acme()).await.unwrap_err();
    assert!(matches!(err, ReviewError::RateLimited));
}

#[tokio::test]
async fn listing_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let err = selector.select(&acme()).await.unwrap_err();
    assert!(matches!(err, ReviewError::RateLimited));
    assert!(err.user_message().contains("rate limit exceeded"));
}

#[tokio::test]
async fn unreachable_listing_is_network_error() {
    let selector = SourceSelector::new(reqwest::Client::new(), "http://127.0.0.1:9");
    let err = selector.select(&acme()).await.unwrap_err();
    assert!(matches!(err, ReviewError::NetworkError(_)));
    assert!(err.user_message().contains("Could not connect to GitHub"));
}

#[tokio::test]
async fn unreachable_file_host_becomes_marker() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([
            file(&server, "ok.py", 5),
            {
                "type": "file",
                "name": "gone.py",
                "path": "gone.py",
                "size": 5,
                "download_url": "http://127.0.0.1:9/raw/gone.py",
            },
        ]),
    )
    .await;
    mount_raw(&server, "ok.py", "print('hi')").await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let files = selector.select(&acme()).await.unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].content, "print('hi')");
    assert_eq!(files[1].content, FETCH_FAILED_MARKER);
}

#[tokio::test]
async fn listing_server_error_is_hosting_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let err = selector.list_root(&acme()).await.unwrap_err();
    assert!(matches!(err, ReviewError::HostingApi { status: 502 }));
}

#[tokio::test]
async fn non_array_listing_is_parse_error() {
    let server = MockServer::start().await;
    mount_listing(&server, json!({ "message": "this is a file" })).await;

    let selector = SourceSelector::new(reqwest::Client::new(), server.uri());
    let err = selector.list_root(&acme()).await.unwrap_err();
    assert!(matches!(err, ReviewError::ListingParse(_)));
}

#[tokio::test]
async fn sends_configured_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(header("user-agent", "vibe-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .user_agent("vibe-test/1.0")
        .build()
        .unwrap();
    let selector = SourceSelector::new(http, server.uri());
    assert!(selector.list_root(&acme()).await.unwrap().is_empty());
}
