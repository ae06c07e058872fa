use std::time::Duration;

use axum::{
    body::Body,
    extract::Query,
    http::{header, HeaderMap, Response, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Time to upstream response headers; the body stream itself is unbounded.
const STREAM_HEADER_TIMEOUT: Duration = Duration::from_secs(30);
const INFO_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream headers the browser needs for seekable playback.
const FORWARDED_HEADERS: [&str; 4] = [
    "content-type",
    "content-length",
    "content-range",
    "accept-ranges",
];

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct VideoInfo {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub accepts_ranges: bool,
}

fn parse_upstream_url(raw: &str) -> Result<reqwest::Url, AppError> {
    let url = reqwest::Url::parse(raw)
        .map_err(|_| AppError::Validation("Invalid video URL".into()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(AppError::Validation(
            "Video URL must use http or https".into(),
        )),
    }
}

/// GET /api/video/stream?url=…
///
/// Relays the upstream bytes without buffering, forwarding the client's
/// `Range` header upstream and echoing the range-related response headers
/// back, so `<video>` seeking works through the proxy. Once headers are
/// sent, upstream failures can only terminate the body stream.
pub async fn stream(headers: HeaderMap, Query(query): Query<VideoQuery>) -> AppResult<Response<Body>> {
    let url = parse_upstream_url(&query.url)?;

    let client = reqwest::Client::new();
    let mut request = client.get(url);
    if let Some(range) = headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        request = request.header("range", range);
    }

    let upstream = tokio::time::timeout(STREAM_HEADER_TIMEOUT, request.send())
        .await
        .map_err(|_| AppError::Upstream("Upstream timed out".into()))?
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response = Response::builder().status(status);
    for name in FORWARDED_HEADERS {
        if let Some(value) = upstream.headers().get(name).and_then(|v| v.to_str().ok()) {
            response = response.header(name, value);
        }
    }

    let body = Body::from_stream(upstream.bytes_stream());
    response
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build proxy response: {}", e)))
}

/// GET /api/video/info?url=… — HEAD probe, no body transfer.
pub async fn info(Query(query): Query<VideoQuery>) -> AppResult<Json<VideoInfo>> {
    let url = parse_upstream_url(&query.url)?;

    let client = reqwest::Client::builder()
        .timeout(INFO_TIMEOUT)
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

    let upstream = client
        .head(url)
        .send()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let content_length = upstream
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    let accepts_ranges = upstream
        .headers()
        .get("accept-ranges")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.eq_ignore_ascii_case("bytes"));

    Ok(Json(VideoInfo {
        status: upstream.status().as_u16(),
        content_type,
        content_length,
        accepts_ranges,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use http_body_util::BodyExt;

    #[test]
    fn rejects_malformed_urls() {
        assert!(parse_upstream_url("not a url").is_err());
        assert!(parse_upstream_url("ftp://host/file.mp4").is_err());
        assert!(parse_upstream_url("file:///etc/passwd").is_err());
        assert!(parse_upstream_url("https://example.com/movie.mp4").is_ok());
    }

    /// Mock upstream: 1000 bytes, honors single `bytes=a-b` ranges.
    async fn range_upstream(headers: HeaderMap) -> Response<Body> {
        let data = vec![0x42u8; 1000];
        let range = headers
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("bytes="))
            .and_then(|v| {
                let (start, end) = v.split_once('-')?;
                Some((start.parse::<usize>().ok()?, end.parse::<usize>().ok()?))
            });

        match range {
            Some((start, end)) if start <= end && end < data.len() => Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header("content-type", "video/mp4")
                .header("accept-ranges", "bytes")
                .header("content-length", (end - start + 1).to_string())
                .header(
                    "content-range",
                    format!("bytes {}-{}/{}", start, end, data.len()),
                )
                .body(Body::from(data[start..=end].to_vec()))
                .unwrap(),
            _ => Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "video/mp4")
                .header("accept-ranges", "bytes")
                .header("content-length", data.len().to_string())
                .body(Body::from(data))
                .unwrap(),
        }
    }

    async fn spawn_upstream() -> String {
        let app = Router::new().route("/clip.mp4", get(range_upstream));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/clip.mp4", addr)
    }

    #[tokio::test]
    async fn range_request_is_relayed() {
        let url = spawn_upstream().await;

        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, "bytes=0-99".parse().unwrap());

        let response = stream(headers, Query(VideoQuery { url }))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers().get("content-range").unwrap(),
            "bytes 0-99/1000"
        );
        assert_eq!(response.headers().get("accept-ranges").unwrap(), "bytes");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.len(), 100);
    }

    #[tokio::test]
    async fn full_request_streams_everything() {
        let url = spawn_upstream().await;

        let response = stream(HeaderMap::new(), Query(VideoQuery { url }))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-type").unwrap(), "video/mp4");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.len(), 1000);
    }

    #[tokio::test]
    async fn info_reports_range_support() {
        let url = spawn_upstream().await;

        let Json(details) = info(Query(VideoQuery { url })).await.unwrap();
        assert_eq!(details.status, 200);
        assert_eq!(details.content_type.as_deref(), Some("video/mp4"));
        assert!(details.accepts_ranges);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_gateway_error() {
        let result = stream(
            HeaderMap::new(),
            Query(VideoQuery {
                url: "http://127.0.0.1:1/clip.mp4".into(),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Upstream(_))));
    }
}
