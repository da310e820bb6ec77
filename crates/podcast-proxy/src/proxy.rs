/// HTTP relay for the podcast RSS feed.
///
/// Serves `GET /api/podcast`.  Each request fetches the configured upstream
/// feed and relays the body verbatim as `application/xml`, with a short
/// shared-cache lifetime so a CDN in front of us absorbs repeat traffic.
/// Any upstream failure (connect error, non-success status, truncated body)
/// becomes a 500 with `{"error": "failed to load RSS"}`.
///
/// Design notes
/// ─────────────
/// • The body is buffered, not streamed: the status line must not be sent
///   before we know the upstream read succeeded.
/// • The proxy re-uses one `reqwest::Client` so TLS sessions are shared.
/// • CORS is permissive; the feed is public and browser players on other
///   origins need to read it.
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use reqwest::Client;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

pub const FEED_ROUTE: &str = "/api/podcast";
pub const UPSTREAM_ERROR_MESSAGE: &str = "failed to load RSS";

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

// ── Shared state ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ProxyState {
    client: Client,
    feed_url: String,
    cache_control: HeaderValue,
}

impl ProxyState {
    pub fn new(feed_url: impl Into<String>, cache_control: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            // Feed hosts commonly redirect http → https and to CDN edges
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            feed_url: feed_url.into(),
            cache_control: HeaderValue::from_str(cache_control)?,
        })
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

// ── Route handlers ────────────────────────────────────────────────────────────

async fn relay_feed(State(state): State<ProxyState>) -> Response {
    match fetch_upstream(&state).await {
        Ok(body) => {
            debug!("proxy: relaying {} bytes", body.len());
            (
                StatusCode::OK,
                [
                    (CONTENT_TYPE, HeaderValue::from_static("application/xml")),
                    (CACHE_CONTROL, state.cache_control.clone()),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            warn!("proxy: upstream {} failed: {:#}", state.feed_url, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: UPSTREAM_ERROR_MESSAGE,
                }),
            )
                .into_response()
        }
    }
}

async fn fetch_upstream(state: &ProxyState) -> anyhow::Result<Bytes> {
    info!("proxy: fetching upstream feed {}", state.feed_url);
    let upstream = state.client.get(&state.feed_url).send().await?;

    let status = upstream.status();
    if !status.is_success() {
        anyhow::bail!("upstream returned {}", status);
    }

    Ok(upstream.bytes().await?)
}

async fn healthz() -> &'static str {
    "ok"
}

// ── Server startup ────────────────────────────────────────────────────────────

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(FEED_ROUTE, get(relay_feed))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(bind_address: &str, port: u16, state: ProxyState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind_address, port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "Feed proxy listening on http://{}{} → {}",
        addr,
        FEED_ROUTE,
        state.feed_url()
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Returns the local URL the player should fetch from.
pub fn proxy_url(bind_address: &str, port: u16) -> String {
    format!("http://{}:{}{}", bind_address, port, FEED_ROUTE)
}
