//! Page title resolution
//!
//! Fetches a page and pulls the text of its `<title>` element. This is best
//! effort: network errors, non-success statuses, non-HTML responses and pages
//! without a title all come back as [`Resolution::Unavailable`], never as an
//! error. Every fetch is bounded by a timeout and can be cancelled through a
//! [`CancelHandle`].

use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use scraper::{Html, Selector};
use tokio::sync::watch;
use tracing::debug;

use crate::config::Config;

/// Fetch timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent with title requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; LinkCart/1.0)";

/// Outcome of a title lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The page had a non-empty title
    Resolved(String),
    /// No title could be obtained (fetch failed, timed out, or page had none)
    Unavailable,
    /// The caller cancelled the lookup
    Cancelled,
}

impl Resolution {
    pub fn title(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(title) => Some(title.as_str()),
            _ => None,
        }
    }

    /// The resolved title, or `fallback` for any other outcome
    pub fn title_or(self, fallback: impl Into<String>) -> String {
        match self {
            Resolution::Resolved(title) => title,
            _ => fallback.into(),
        }
    }
}

/// Requests cancellation of in-flight lookups holding the paired token
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes a [`CancelHandle`]
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once cancellation is requested
    ///
    /// If the handle is dropped without cancelling, this never completes.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancel handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Fetches page titles over HTTP(S)
#[derive(Debug, Clone)]
pub struct TitleResolver {
    client: reqwest::Client,
    timeout: Duration,
}

impl TitleResolver {
    /// Build a resolver with its own HTTP client
    pub fn new(timeout: Duration, user_agent: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self::with_client(client, timeout))
    }

    /// Build a resolver around an existing client
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(config.resolve_timeout(), &config.user_agent)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look up the title of `url`
    ///
    /// Resolves to `Cancelled` if `cancel` fires before the fetch settles and
    /// to `Unavailable` if the timeout expires first.
    pub async fn resolve(&self, url: &str, cancel: &CancelToken) -> Resolution {
        if cancel.is_cancelled() {
            return Resolution::Cancelled;
        }

        let mut cancel = cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Title lookup for {} cancelled", url);
                Resolution::Cancelled
            }
            result = tokio::time::timeout(self.timeout, self.fetch_title(url)) => match result {
                Ok(Ok(Some(title))) => Resolution::Resolved(title),
                Ok(Ok(None)) => {
                    debug!("No title available for {}", url);
                    Resolution::Unavailable
                }
                Ok(Err(e)) => {
                    debug!("Title fetch for {} failed: {}", url, e);
                    Resolution::Unavailable
                }
                Err(_) => {
                    debug!("Title fetch for {} timed out after {:?}", url, self.timeout);
                    Resolution::Unavailable
                }
            },
        }
    }

    async fn fetch_title(&self, url: &str) -> reqwest::Result<Option<String>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            debug!("Title fetch for {} returned {}", url, response.status());
            return Ok(None);
        }

        if !is_html(response.headers()) {
            return Ok(None);
        }

        let html = response.text().await?;
        Ok(extract_title(&html))
    }
}

/// Missing content type is given the benefit of the doubt
fn is_html(headers: &HeaderMap) -> bool {
    match headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(content_type) => content_type.to_ascii_lowercase().contains("html"),
        None => true,
    }
}

/// Extract the first `<title>` text, whitespace collapsed
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| {
            el.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn local_resolver(timeout: Duration) -> TitleResolver {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        TitleResolver::with_client(client, timeout)
    }

    /// Serve a single canned HTTP response and return the URL to fetch
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}/", addr)
    }

    /// Accept a connection and never answer
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        format!("http://{}/", addr)
    }

    fn http_response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        )
    }

    #[test]
    fn test_extract_title_basic() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head><title>Test Page</title></head>
            <body></body>
            </html>
        "#;
        assert_eq!(extract_title(html), Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_collapses_whitespace() {
        let html = "<html><head><title>\n   Rust \n  Programming  </title></head></html>";
        assert_eq!(extract_title(html), Some("Rust Programming".to_string()));
    }

    #[test]
    fn test_extract_title_missing_or_empty() {
        assert_eq!(extract_title("<html><head></head><body></body></html>"), None);
        assert_eq!(extract_title("<html><head><title>  </title></head></html>"), None);
        assert_eq!(extract_title("not html at all"), None);
    }

    #[test]
    fn test_extract_title_ignores_meta_tags() {
        let html = r#"
            <html><head>
                <meta property="og:title" content="OG Title">
                <title>Real Title</title>
            </head></html>
        "#;
        assert_eq!(extract_title(html), Some("Real Title".to_string()));
    }

    #[test]
    fn test_resolution_fallback() {
        assert_eq!(Resolution::Resolved("T".into()).title_or("u"), "T");
        assert_eq!(Resolution::Unavailable.title_or("u"), "u");
        assert_eq!(Resolution::Cancelled.title_or("u"), "u");
        assert_eq!(Resolution::Unavailable.title(), None);
    }

    #[tokio::test]
    async fn test_cancel_token_states() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());

        let mut waiting = token.clone();
        waiting.cancelled().await;

        assert!(!CancelToken::never().is_cancelled());
    }

    #[tokio::test]
    async fn test_resolves_title_from_server() {
        let url = serve_once(http_response(
            "200 OK",
            "text/html; charset=utf-8",
            "<html><head><title>Hello Cart</title></head></html>",
        ))
        .await;

        let resolution = local_resolver(Duration::from_secs(5))
            .resolve(&url, &CancelToken::never())
            .await;
        assert_eq!(resolution, Resolution::Resolved("Hello Cart".to_string()));
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let url = serve_once(http_response(
            "404 Not Found",
            "text/html",
            "<html><head><title>Not Found</title></head></html>",
        ))
        .await;

        let resolution = local_resolver(Duration::from_secs(5))
            .resolve(&url, &CancelToken::never())
            .await;
        assert_eq!(resolution, Resolution::Unavailable);
    }

    #[tokio::test]
    async fn test_non_html_is_unavailable() {
        let url = serve_once(http_response(
            "200 OK",
            "application/json",
            r#"{"title":"<title>nope</title>"}"#,
        ))
        .await;

        let resolution = local_resolver(Duration::from_secs(5))
            .resolve(&url, &CancelToken::never())
            .await;
        assert_eq!(resolution, Resolution::Unavailable);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let resolution = local_resolver(Duration::from_secs(5))
            .resolve(&format!("http://{}/", addr), &CancelToken::never())
            .await;
        assert_eq!(resolution, Resolution::Unavailable);
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let url = serve_silence().await;

        let resolution = local_resolver(Duration::from_millis(200))
            .resolve(&url, &CancelToken::never())
            .await;
        assert_eq!(resolution, Resolution::Unavailable);
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let (handle, token) = cancel_pair();
        handle.cancel();

        let resolution = local_resolver(Duration::from_secs(5))
            .resolve("http://127.0.0.1:9/", &token)
            .await;
        assert_eq!(resolution, Resolution::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_during_fetch() {
        let url = serve_silence().await;
        let (handle, token) = cancel_pair();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.cancel();
        });

        let resolution = local_resolver(Duration::from_secs(30))
            .resolve(&url, &token)
            .await;
        assert_eq!(resolution, Resolution::Cancelled);
    }
}
