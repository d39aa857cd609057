//! Resolves a video's length through the duration proxy before a timeline is
//! built. Any failure falls back to [`DEFAULT_VIDEO_DURATION_SECONDS`].

use serde_json::Value;
use thiserror::Error;

use crate::constants::{DEFAULT_VIDEO_DURATION_SECONDS, DURATION_REQUEST_TIMEOUT};
use crate::utils::{proxy_endpoint, query_param};

#[derive(Debug, Error)]
pub enum DurationError {
    #[error("player is not present")]
    MissingPlayer,
    #[error("player url has no bvid: {0}")]
    MissingBvid(String),
    #[error("duration request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("proxy returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("proxy reported code {0}")]
    Upstream(i64),
    #[error("response has no duration for page {0}")]
    MissingDuration(usize),
}

pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(DURATION_REQUEST_TIMEOUT)
        .build()
}

/// Duration in seconds of page `page_index` of the video the player points at.
pub async fn resolve_duration(
    client: &reqwest::Client,
    proxy_base: &str,
    player_src: Option<&str>,
    page_index: usize,
) -> Result<f64, DurationError> {
    let src = player_src.ok_or(DurationError::MissingPlayer)?;
    let bvid = query_param(src, "bvid").ok_or_else(|| DurationError::MissingBvid(src.to_string()))?;

    let response = client.get(proxy_endpoint(proxy_base, &bvid)).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DurationError::Status(status));
    }
    let payload: Value = response.json().await?;
    extract_duration(&payload, page_index)
}

fn extract_duration(payload: &Value, page_index: usize) -> Result<f64, DurationError> {
    let code = payload.get("code").and_then(Value::as_i64).unwrap_or(-1);
    if code != 0 {
        return Err(DurationError::Upstream(code));
    }
    payload
        .get("data")
        .and_then(|data| data.get("pages"))
        .and_then(|pages| pages.get(page_index))
        .and_then(|page| page.get("duration"))
        .and_then(Value::as_f64)
        .filter(|duration| duration.is_finite() && *duration > 0.0)
        .ok_or(DurationError::MissingDuration(page_index))
}

/// [`resolve_duration`], or the default length when it fails.
pub async fn resolve_or_default(
    client: &reqwest::Client,
    proxy_base: &str,
    player_src: Option<&str>,
    page_index: usize,
) -> f64 {
    match resolve_duration(client, proxy_base, player_src, page_index).await {
        Ok(duration) => {
            tracing::info!(duration, "resolved video duration");
            duration
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                fallback = DEFAULT_VIDEO_DURATION_SECONDS,
                "could not resolve video duration"
            );
            DEFAULT_VIDEO_DURATION_SECONDS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param as query};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PLAYER: &str = "//player.example.com/player.html?isOutside=true&bvid=BV1xx&p=1";

    async fn proxy_returning(body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bilibili-proxy"))
            .and(query("bvid", "BV1xx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_resolves_page_duration() {
        let server = proxy_returning(json!({
            "code": 0,
            "data": { "pages": [{ "duration": 754 }, { "duration": 120 }] }
        }))
        .await;
        let client = http_client().unwrap();
        let duration = resolve_duration(&client, &server.uri(), Some(PLAYER), 0).await.unwrap();
        assert_eq!(duration, 754.0);
        let duration = resolve_duration(&client, &server.uri(), Some(PLAYER), 1).await.unwrap();
        assert_eq!(duration, 120.0);
    }

    #[tokio::test]
    async fn test_nonzero_code_falls_back() {
        let server = proxy_returning(json!({ "code": -404, "message": "not found" })).await;
        let client = http_client().unwrap();
        let err = resolve_duration(&client, &server.uri(), Some(PLAYER), 0).await.unwrap_err();
        assert!(matches!(err, DurationError::Upstream(-404)));
        let duration = resolve_or_default(&client, &server.uri(), Some(PLAYER), 0).await;
        assert_eq!(duration, DEFAULT_VIDEO_DURATION_SECONDS);
    }

    #[tokio::test]
    async fn test_http_failure_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
            .mount(&server)
            .await;
        let client = http_client().unwrap();
        let err = resolve_duration(&client, &server.uri(), Some(PLAYER), 0).await.unwrap_err();
        assert!(matches!(err, DurationError::Status(_)));
    }

    #[tokio::test]
    async fn test_missing_player_or_bvid() {
        let client = http_client().unwrap();
        let err = resolve_duration(&client, "http://127.0.0.1:9", None, 0).await.unwrap_err();
        assert!(matches!(err, DurationError::MissingPlayer));
        let err = resolve_duration(&client, "http://127.0.0.1:9", Some("//p.example.com/?p=1"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DurationError::MissingBvid(_)));
        let duration = resolve_or_default(&client, "http://127.0.0.1:9", None, 0).await;
        assert_eq!(duration, DEFAULT_VIDEO_DURATION_SECONDS);
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let payload = json!({ "code": 0, "data": { "pages": [{ "duration": 0 }] } });
        assert!(matches!(extract_duration(&payload, 0), Err(DurationError::MissingDuration(0))));
        let payload = json!({ "code": 0, "data": { "pages": [] } });
        assert!(matches!(extract_duration(&payload, 0), Err(DurationError::MissingDuration(0))));
    }
}
