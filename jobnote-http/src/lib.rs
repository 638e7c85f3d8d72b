//! Minimal JSON-over-HTTP client for model backends, with safe logging.
//!
//! - Request options: headers, `Auth`, timeout
//! - Exactly one attempt per call; failures surface to the caller unchanged
//! - Redacts sensitive query params and never logs secret values
//! - Optional *raw* request/response logging via `JOBNOTE_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), jobnote_http::HttpError> {
//! let client = jobnote_http::HttpClient::new("https://api.example.com/v1")?;
//! let got: serde_json::Value = client
//!     .post_json("chat/completions", Some("token"), &serde_json::json!({}))
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;

const RAW_ENV: &str = "JOBNOTE_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

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
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use jobnote_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Auth via query param (Gemini: `?key=`)
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use jobnote_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Query {
///         name: "key",
///         value: Cow::Borrowed("demo"),
///     }),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// A trailing slash is added to the base so that relative paths append to
    /// it instead of replacing its last segment.
    ///
    /// ```no_run
    /// use jobnote_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("http://localhost:1234/v1")?;
    /// assert_eq!(client.base_url().as_str(), "http://localhost:1234/v1/");
    /// assert_eq!(client.default_timeout, Duration::from_secs(120));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(120),
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// POST JSON using optional Bearer auth.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let opts = RequestOpts {
            auth: bearer.map(Auth::Bearer),
            ..Default::default()
        };
        self.post_json_opts(path, body, opts).await
    }

    /// POST JSON with per-request options (headers/auth/timeout).
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, body, opts).await
    }

    async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let body_bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;

        let auth_kind = match &opts.auth {
            Some(Auth::Bearer(_)) => "bearer",
            Some(Auth::Query { .. }) => "query",
            Some(Auth::None) | None => "none",
        };

        if let Some(Auth::Query { name, value }) = &opts.auth {
            url.query_pairs_mut().append_pair(name, value);
        }

        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body_bytes.clone());

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }
        if let Some(Auth::Bearer(tok)) = &opts.auth {
            rb = rb.bearer_auth(sanitize_api_key(tok)?);
        }

        let (host_path, redacted_q) = redact_query(&url);
        tracing::debug!(
            method = %method,
            host_path = %host_path,
            query = ?redacted_q,
            timeout_ms = timeout.as_millis() as u64,
            auth_kind,
            body_len = body_bytes.len(),
            "http.request.start"
        );

        if raw_enabled() {
            let mut text = String::from_utf8_lossy(&body_bytes).into_owned();
            truncate_on_boundary(&mut text, RAW_MAX_BODY);
            tracing::debug!(target: "http.raw", %host_path, body = %text, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = network_message(err, &host_path, &redacted_q);
            tracing::warn!(%host_path, message = %message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = network_message(err, &host_path, &redacted_q);
            tracing::warn!(%host_path, message = %message, "http.network_error.body");
            HttpError::Network(message)
        })?;

        tracing::debug!(
            %status,
            duration_ms = t0.elapsed().as_millis() as u64,
            body_len = bytes.len(),
            "http.response"
        );

        if raw_enabled() {
            let mut text = String::from_utf8_lossy(&bytes).into_owned();
            truncate_on_boundary(&mut text, RAW_MAX_BODY);
            tracing::info!(target: "http.raw", %status, body = %text, "response");
        }

        let snippet = snip_body(&bytes);

        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    serde_line = %e.line(),
                    serde_col = %e.column(),
                    serde_err = %e,
                    body_snippet = %snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(%status, message = %message, body_snippet = %snippet, "http.error");
        Err(HttpError::Api { status, message })
    }
}

/// Describe a transport failure without the request URL.
///
/// reqwest embeds the full URL in its error text, query string included, so
/// the URL is dropped and the redacted form appended instead.
fn network_message(err: reqwest::Error, host_path: &str, query: &[(String, String)]) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "transport error"
    };
    let err = err.without_url();
    let mut message = format!("{kind}: {err} ({host_path}");
    if !query.is_empty() {
        let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        message.push('?');
        message.push_str(&pairs.join("&"));
    }
    message.push(')');
    message
}

/// Pull a human-readable message out of an error body.
///
/// OpenAI-compatible servers and Gemini both answer `{"error":{"message":…}}`;
/// some local servers use a bare `{"error":"…"}` or `{"message":"…"}`.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }

    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Nested>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).into_owned();
    if snip.len() > SNIPPET_MAX {
        truncate_on_boundary(&mut snip, SNIPPET_MAX);
        snip.push_str("...");
    }
    snip
}

fn truncate_on_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

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

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token" | "authorization" | "auth" | "key" | "api_key" | "token" | "secret"
    )
}

/// Return "host + path" and the query list with secret values replaced.
fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    (host_path, redacted)
}
