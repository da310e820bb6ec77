use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use podcast_proxy::proxy::{router, ProxyState, FEED_ROUTE, UPSTREAM_ERROR_MESSAGE};

const CACHE_CONTROL: &str = "s-maxage=300, stale-while-revalidate";
const FEED: &str = r#"<?xml version="1.0"?><rss><channel><item><title>Relayed</title></item></channel></rss>"#;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn proxy_for(upstream: String) -> Router {
    router(ProxyState::new(upstream, CACHE_CONTROL).unwrap())
}

async fn get_feed(app: Router) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::get(FEED_ROUTE).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn relays_body_with_xml_and_cache_headers() {
    // Upstream sends text/plain; the relay still labels it XML.
    let upstream = serve(Router::new().route("/rss", get(|| async { FEED }))).await;

    let (status, headers, body) = get_feed(proxy_for(format!("http://{}/rss", upstream))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/xml");
    assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL);
    assert_eq!(body, FEED.as_bytes());
}

#[tokio::test]
async fn upstream_error_status_becomes_500_json() {
    let upstream = serve(Router::new().route(
        "/rss",
        get(|| async { (StatusCode::NOT_FOUND, "gone") }),
    ))
    .await;

    let (status, headers, body) = get_feed(proxy_for(format!("http://{}/rss", upstream))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "error": UPSTREAM_ERROR_MESSAGE }));
}

#[tokio::test]
async fn unreachable_upstream_becomes_500_json() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let (status, _, body) = get_feed(proxy_for(format!("http://{}/rss", addr))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], UPSTREAM_ERROR_MESSAGE);
}

#[tokio::test]
async fn healthz_answers_ok() {
    let app = proxy_for("http://127.0.0.1:9/rss".to_string());
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let upstream = serve(Router::new().route("/rss", get(|| async { FEED }))).await;
    let response = proxy_for(format!("http://{}/rss", upstream))
        .oneshot(
            Request::get(FEED_ROUTE)
                .header(header::ORIGIN, "https://player.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
