//! Minimal HTTP client with safe logging, retries, and bearer auth.
//!
//! - Request options: query params and an optional bearer token
//! - Redacts sensitive query params and never logs secret values
//! - Retries 429/5xx and network failures with exponential backoff and `Retry-After` support
//! - JSON (`get_json`) and text (`get_text`) response helpers
//! - Optional *raw* request/response logging via `BYTESIZE_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), bytesize_http::HttpError> {
//! let client = bytesize_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", bytesize_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: bearer tokens are sanitized before use, and logs only record whether a
//! request was authenticated, never the secret.

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "BYTESIZE_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;
const DEFAULT_USER_AGENT: &str = concat!("bytesize/", env!("CARGO_PKG_VERSION"));

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    matches!(env::var(RAW_ENV).as_deref(), Ok("1" | "true" | "yes"))
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status for `Api` errors, `None` for transport and decode failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Request Options
// ==============================

/// Per-request options for the HTTP client.
///
/// ```
/// use bytesize_http::RequestOpts;
///
/// let opts = RequestOpts {
///     bearer: Some("token"),
///     query: Some(vec![("username", "jack".into())]),
/// };
///
/// assert!(opts.bearer.is_some());
/// assert!(RequestOpts::default().query.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    /// Sent as `Authorization: Bearer <token>` after sanitizing.
    pub bearer: Option<&'a str>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// A trailing `/` is added to the base so relative paths always extend it.
    ///
    /// ```
    /// use bytesize_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://nitter.example.com/mirror")?;
    /// assert_eq!(client.base_url().as_str(), "https://nitter.example.com/mirror/");
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget returned by [`HttpClient::new`].
    ///
    /// ```
    /// use bytesize_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.example.com")?.with_retries(0);
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let (req_id, bytes) = self.get(path, opts).await?;
        decode_json(&req_id, &bytes)
    }

    /// GET a text body (HTML pages, plain text feeds).
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let (_, bytes) = self.get(path, opts).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    // ==============================
    // Core request implementation
    // ==============================

    /// GET with retries and return the request id plus the body of a 2xx response.
    async fn get(&self, path: &str, opts: RequestOpts<'_>) -> Result<(String, Vec<u8>), HttpError> {
        let method = Method::GET;
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let query: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();
        let bearer = opts.bearer.map(sanitize_api_key).transpose()?;

        let timeout = self.default_timeout;
        let max_retries = self.max_retries;
        let req_id = format!("r{:x}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed));
        let mut attempt = 0usize;

        loop {
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);
            if !query.is_empty() {
                rb = rb.query(&query);
            }
            if let Some(tok) = &bearer {
                rb = rb.bearer_auth(tok);
            }

            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                query=?redact_pairs(&query),
                timeout_ms=timeout.as_millis() as u64,
                authenticated=bearer.is_some(),
                "http.request.start"
            );
            if raw_enabled() {
                let curl = make_curl(&method, &url, &query, bearer.is_some());
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            let t0 = std::time::Instant::now();
            let sent = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    resp.bytes().await.map(|b| (status, headers, b.to_vec()))
                }
                Err(err) => Err(err),
            };
            let (status, headers, bytes) = match sent {
                Ok(parts) => parts,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, message=%message, "http.network_error");
                    return Err(HttpError::Network(message));
                }
            };

            let upstream_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-correlation-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=t0.elapsed().as_millis() as u64,
                body_len=bytes.len(),
                x_request_id=%upstream_id,
                rate_limit.remaining=?headers.get("x-rate-limit-remaining").and_then(|v| v.to_str().ok()),
                "http.response.headers"
            );
            if raw_enabled() {
                let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
                let truncated = bytes.len() > RAW_MAX_BODY;
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    status=%status,
                    headers=?redact_headers(&headers),
                    body=%String::from_utf8_lossy(shown),
                    truncated
                );
            }

            if status.is_success() {
                return Ok((req_id, bytes));
            }

            let message = extract_error_message(&bytes);
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            if (is_429 || status.is_server_error()) && attempt < max_retries {
                attempt += 1;
                let delay = match retry_after_delay_secs(&headers) {
                    Some(secs) => Duration::from_secs(secs),
                    None if is_429 => backoff(attempt).max(Duration::from_millis(1100)),
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    message=%message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%upstream_id,
                body_snippet=%snip_body(&bytes),
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: upstream_id,
            });
        }
    }
}

// ==============================
// Helpers
// ==============================

fn decode_json<T: DeserializeOwned>(req_id: &str, bytes: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(bytes).map_err(|e| {
        let snippet = snip_body(bytes);
        tracing::warn!(
            req_id=%req_id,
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e,
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(10) as u32;
    Duration::from_millis(200u64.saturating_mul(1u64 << shift))
}

fn is_secret_key(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "apikey"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
    )
}

fn redact_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| {
            let shown = if is_secret_key(k) { "<redacted>" } else { v };
            ((*k).to_string(), shown.to_string())
        })
        .collect()
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let val = if *k == reqwest::header::AUTHORIZATION || is_secret_key(k.as_str()) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (k.as_str().to_string(), val)
        })
        .collect()
}

/// Best-effort curl line for repro; secrets are redacted.
fn make_curl(method: &Method, url: &Url, query: &[(&str, &str)], authenticated: bool) -> String {
    let mut full = url.clone();
    if !query.is_empty() {
        let mut pairs = full.query_pairs_mut();
        for (k, v) in redact_pairs(query) {
            pairs.append_pair(&k, &v);
        }
    }
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];
    if authenticated {
        parts.push("-H 'authorization: <redacted>'".to_string());
    }
    parts.push(format!("'{}'", full.as_str()));
    parts.join(" ")
}

fn extract_error_message(body: &[u8]) -> String {
    // Twitter: {"errors":[{"message":"...", "detail":"...", "title":"..."}]}
    #[derive(Deserialize)]
    struct TwErrors {
        errors: Vec<Msg>,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        error: String,
    }

    impl Msg {
        fn first_non_empty(self) -> Option<String> {
            [self.message, self.detail, self.title, self.error]
                .into_iter()
                .find(|s| !s.is_empty())
        }
    }

    if let Ok(tw) = serde_json::from_slice::<TwErrors>(body) {
        if let Some(msg) = tw.errors.into_iter().next().and_then(Msg::first_non_empty) {
            return msg;
        }
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if let Some(msg) = m.first_non_empty() {
            return msg;
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() <= SNIPPET_MAX {
        return text.into_owned();
    }
    let mut snip: String = text.chars().take(SNIPPET_MAX).collect();
    snip.push_str("...");
    snip
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }
    HeaderValue::from_str(&format!("Bearer {s}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
