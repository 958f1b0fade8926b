//! HTTP implementation of [`PageFetcher`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::protocols::{FetchResult, PageFetcher};
use crate::cancellation::{run_until_cancelled, run_with_timeout, CancellationToken};
use crate::config::FetchConfig;
use crate::errors::JobScoutError;

/// Fetches pages over HTTP with retries.
///
/// The underlying client is created on first use and shared by every later
/// request. The configured timeout bounds the whole fetch, retries and
/// back-off included, and every step races the caller's cancellation token.
#[derive(Debug)]
pub struct HttpFetcher {
    config: FetchConfig,
    client: OnceCell<reqwest::Client>,
}

impl HttpFetcher {
    /// Creates a fetcher; no client is built until the first fetch.
    #[must_use]
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// The fetch configuration.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Whether the shared client has been created yet.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> Result<&reqwest::Client, JobScoutError> {
        self.client
            .get_or_try_init(|| async { build_client(&self.config) })
            .await
    }

    async fn attempt(&self, client: &reqwest::Client, url: &str) -> Result<FetchResult, JobScoutError> {
        let start = Instant::now();
        let mut response = client
            .get(url)
            .header(USER_AGENT, self.config.pick_user_agent())
            .send()
            .await
            .map_err(|e| classify(url, &e, self.config.timeout().as_secs_f64()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(JobScoutError::status(
                url,
                status,
                self.config.retry.should_retry_status(status),
            ));
        }

        if let Some(length) = response.content_length() {
            if length > self.config.max_response_size as u64 {
                return Err(too_large(url, length, self.config.max_response_size));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Chunked bodies carry no length up front; stop reading once past the limit.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify(url, &e, self.config.timeout().as_secs_f64()))?
        {
            let size = body.len() + chunk.len();
            if size > self.config.max_response_size {
                return Err(too_large(url, size as u64, self.config.max_response_size));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchResult {
            status_code: status,
            text: String::from_utf8_lossy(&body).into_owned(),
            final_url,
            content_type,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchResult, JobScoutError> {
        let client = self.client().await?;
        let timeout = self.config.timeout();
        let deadline = Instant::now() + timeout;
        let max_attempts = self.config.retry.max_attempts.max(1);
        let cancelled = || {
            JobScoutError::cancelled(url, cancel.reason().unwrap_or_else(|| "cancelled".to_string()))
        };
        let timed_out = || JobScoutError::timeout(url, timeout.as_secs_f64());

        let mut attempt = 1;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out());
            }

            debug!(url, attempt, max_attempts, ?remaining, "Fetching page");
            let result = run_until_cancelled(cancel, run_with_timeout(remaining, self.attempt(client, url)))
                .await
                .ok_or_else(cancelled)?
                .into_result_with(timed_out);

            match result {
                Ok(page) => return Ok(page),
                Err(err) if err.is_retryable() && !err.is_timeout() && attempt < max_attempts => {
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    if delay >= deadline.saturating_duration_since(Instant::now()) {
                        warn!(url, attempt, error = %err, "Fetch failed, no time left to retry");
                        return Err(err);
                    }
                    warn!(url, attempt, ?delay, error = %err, "Fetch failed, retrying");
                    run_until_cancelled(cancel, tokio::time::sleep(delay))
                        .await
                        .ok_or_else(cancelled)?;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn build_client(config: &FetchConfig) -> Result<reqwest::Client, JobScoutError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid header"),
        }
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| JobScoutError::InvalidConfig(format!("cannot build HTTP client: {e}")))
}

fn classify(url: &str, err: &reqwest::Error, timeout_seconds: f64) -> JobScoutError {
    if err.is_timeout() {
        JobScoutError::timeout(url, timeout_seconds)
    } else if err.is_connect() || err.is_request() || err.is_body() {
        JobScoutError::transient(url, err.to_string())
    } else {
        JobScoutError::fetch(url, err.to_string())
    }
}

fn too_large(url: &str, size: u64, max: usize) -> JobScoutError {
    JobScoutError::fetch(url, format!("response of {size} bytes exceeds limit of {max}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `response` to every connection; returns the base URL and a hit counter.
    async fn serve(response: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        (format!("http://{addr}/jobs"), hits)
    }

    /// Accepts connections and never answers.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}/slow")
    }

    fn fast_retry(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            retry_delay_seconds: 0.01,
            jitter: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_client_is_lazy() {
        let fetcher = HttpFetcher::new(FetchConfig::default());
        assert!(!fetcher.is_initialized());

        let token = CancellationToken::new();
        token.cancel("not needed");
        let _ = fetcher.fetch("http://127.0.0.1:9/", &token).await;
        assert!(fetcher.is_initialized());
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let (url, hits) = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<p>hello</p>\n",
        )
        .await;
        let fetcher = HttpFetcher::new(FetchConfig::default());

        let page = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap();
        assert!(page.is_success());
        assert!(page.is_html());
        assert_eq!(page.text, "<p>hello</p>\n");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_status_is_retried() {
        let (url, hits) = serve(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let fetcher = HttpFetcher::new(FetchConfig::default().with_retry(fast_retry(3)));

        let err = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, JobScoutError::Fetch { status: Some(503), .. }));
        assert!(err.is_retryable());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, hits) =
            serve("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let fetcher = HttpFetcher::new(FetchConfig::default().with_retry(fast_retry(3)));

        let err = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let (url, _) = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<p>hello</p>\n",
        )
        .await;
        let mut config = FetchConfig::default();
        config.max_response_size = 4;
        let fetcher = HttpFetcher::new(config);

        let err = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("exceeds limit"));
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_timeout() {
        let url = serve_silence().await;
        let fetcher = HttpFetcher::new(
            FetchConfig::default()
                .with_timeout(1.0)
                .with_retry(RetryConfig::none()),
        );

        let err = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_timeout_bounds_the_whole_fetch() {
        let url = serve_silence().await;
        let fetcher = HttpFetcher::new(FetchConfig::default().with_timeout(1.0));
        assert_eq!(fetcher.config().retry.max_attempts, 3);

        let start = Instant::now();
        let err = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.is_timeout(), "unexpected error: {err}");
        assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_retries_stop_at_deadline() {
        let (url, hits) = serve(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let retry = RetryConfig {
            retry_delay_seconds: 5.0,
            jitter: false,
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(FetchConfig::default().with_timeout(1.0).with_retry(retry));

        let start = Instant::now();
        let err = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, JobScoutError::Fetch { status: Some(503), .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_oversized_chunked_body_rejected() {
        let (url, _) = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
             10\r\n0123456789abcdef\r\n10\r\n0123456789abcdef\r\n0\r\n\r\n",
        )
        .await;
        let mut config = FetchConfig::default();
        config.max_response_size = 20;
        let fetcher = HttpFetcher::new(config);

        let err = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("exceeds limit of 20"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_chunked_body_within_limit() {
        let (url, _) = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
             5\r\n<p>hi\r\n4\r\n</p>\r\n0\r\n\r\n",
        )
        .await;
        let fetcher = HttpFetcher::new(FetchConfig::default());

        let page = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.text, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_fetch() {
        let url = serve_silence().await;
        let fetcher = HttpFetcher::new(FetchConfig::default().with_timeout(30.0));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel("user aborted");
        });

        let err = fetcher.fetch(&url, &token).await.unwrap_err();
        assert!(matches!(err, JobScoutError::Cancelled { ref reason, .. } if reason == "user aborted"));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_fast() {
        let fetcher = HttpFetcher::new(FetchConfig::default().with_retry(fast_retry(3)));
        let err = fetcher.fetch("not a url", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, JobScoutError::Fetch { .. }));
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let config = FetchConfig::default().with_header("bad header\n", "x");
        assert!(build_client(&config).is_ok());
    }
}
