//! Duration proxy: relays video metadata lookups to the upstream API with the
//! headers it requires, so a page on another origin can read them.

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::header;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const PROXY_ROUTE: &str = "/api/bilibili-proxy";
const UPSTREAM_VIEW_PATH: &str = "/x/web-interface/view";
const UPSTREAM_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const UPSTREAM_REFERER: &str = "https://www.bilibili.com";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:63342";
const DEFAULT_UPSTREAM: &str = "https://api.bilibili.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub port: u16,
    /// The only origin CORS lets through.
    pub allowed_origin: String,
    pub upstream_base: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            upstream_base: DEFAULT_UPSTREAM.to_string(),
        }
    }
}

impl ProxyConfig {
    /// Read `DURATION_PROXY_PORT`, `DURATION_PROXY_ALLOWED_ORIGIN` and
    /// `DURATION_PROXY_UPSTREAM`, keeping defaults for unset or invalid values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = match lookup("DURATION_PROXY_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid DURATION_PROXY_PORT, using default");
                defaults.port
            }),
            None => defaults.port,
        };
        Self {
            port,
            allowed_origin: lookup("DURATION_PROXY_ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
            upstream_base: lookup("DURATION_PROXY_UPSTREAM").unwrap_or(defaults.upstream_base),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("missing bvid query parameter")]
    MissingBvid,
    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            ProxyError::MissingBvid => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %self, "proxy request failed");
        let body = json!({
            "error": "Failed to fetch video data",
            "details": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Clone)]
struct ProxyState {
    client: reqwest::Client,
    upstream_base: String,
}

#[derive(Debug, Deserialize)]
struct ProxyQuery {
    bvid: Option<String>,
}

pub fn router(config: &ProxyConfig) -> Result<Router, ProxyError> {
    let origin = HeaderValue::from_str(&config.allowed_origin)
        .map_err(|_| ProxyError::InvalidOrigin(config.allowed_origin.clone()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET]);
    let state = ProxyState {
        client: reqwest::Client::new(),
        upstream_base: config.upstream_base.trim_end_matches('/').to_string(),
    };
    Ok(Router::new()
        .route(PROXY_ROUTE, get(video_info))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: ProxyConfig) -> Result<(), ProxyError> {
    let app = router(&config)?;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(
        port = config.port,
        allowed_origin = %config.allowed_origin,
        "duration proxy listening on http://localhost:{}",
        config.port
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// Upstream JSON is passed through untouched, whatever its `code`.
async fn video_info(
    State(state): State<ProxyState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Json<Value>, ProxyError> {
    let bvid = query
        .bvid
        .filter(|bvid| !bvid.trim().is_empty())
        .ok_or(ProxyError::MissingBvid)?;
    tracing::debug!(%bvid, "fetching video info");
    let data: Value = state
        .client
        .get(format!("{}{}", state.upstream_base, UPSTREAM_VIEW_PATH))
        .query(&[("bvid", bvid.as_str())])
        .header(header::USER_AGENT, UPSTREAM_USER_AGENT)
        .header(header::ACCEPT, "application/json")
        .header(header::REFERER, UPSTREAM_REFERER)
        .send()
        .await?
        .json()
        .await?;
    Ok(Json(data))
}
