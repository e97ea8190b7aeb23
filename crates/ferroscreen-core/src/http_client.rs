use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

const REDACTED_PARAMS: [&str; 1] = ["apikey"];

/// GET request with ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub base_url: String,
    pub query: Vec<(String, String)>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            query: Vec::new(),
            timeout_ms: 15_000,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// URL safe for logs: credential parameters are masked.
    pub fn redacted_url(&self) -> String {
        if self.query.is_empty() {
            return self.base_url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(name, value)| {
                let value = if REDACTED_PARAMS.contains(&name.as_str()) {
                    String::from("***")
                } else {
                    urlencoding::encode(value).into_owned()
                };
                format!("{}={value}", urlencoding::encode(name))
            })
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.base_url)
    }
}

/// Raw response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Other,
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    pub const fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport seam. Production uses [`ReqwestHttpClient`]; tests substitute canned responses.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("ferroscreen/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&request.base_url)
                .query(&request.query)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await
                .map_err(|e| {
                    // reqwest errors render the request URL, which carries the key
                    let e = e.without_url();
                    if e.is_timeout() {
                        HttpError::timeout(format!("request timeout: {e}"))
                    } else if e.is_connect() {
                        HttpError::new(HttpErrorKind::Connect, format!("connection failed: {e}"))
                    } else {
                        HttpError::new(HttpErrorKind::Other, format!("request failed: {e}"))
                    }
                })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    HttpError::timeout(format!("timed out reading response body: {e}"))
                } else {
                    HttpError::new(
                        HttpErrorKind::Other,
                        format!("failed to read response body: {e}"),
                    )
                }
            })?;

            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_parameters_in_order() {
        let request = HttpRequest::get("https://example.test/query")
            .with_param("function", "NEWS_SENTIMENT")
            .with_param("tickers", "BRK.B")
            .with_param("note", "a b");

        assert_eq!(
            request.redacted_url(),
            "https://example.test/query?function=NEWS_SENTIMENT&tickers=BRK.B&note=a%20b"
        );
    }

    #[test]
    fn redacted_url_masks_api_key() {
        let request = HttpRequest::get("https://example.test/query")
            .with_param("function", "OVERVIEW")
            .with_param("apikey", "secret-key");

        let redacted = request.redacted_url();
        assert!(!redacted.contains("secret-key"));
        assert!(redacted.ends_with("apikey=***"));
        assert_eq!(request.param("apikey"), Some("secret-key"));
    }

    #[tokio::test]
    async fn transport_failure_text_does_not_carry_the_api_key() {
        // Given: a request carrying a key, aimed at a port nothing listens on
        let request = HttpRequest::get("http://127.0.0.1:1/query")
            .with_param("function", "OVERVIEW")
            .with_param("apikey", "SECRET-KEY-123")
            .with_timeout_ms(2_000);

        // When: it is executed
        let result = ReqwestHttpClient::new().execute(request).await;

        // Then: the transport error omits the URL and its credentials
        let error = result.clone().expect_err("nothing listens on port 1");
        assert!(!error.message().contains("SECRET-KEY-123"), "{error}");

        // And: so does the classified failure that reaches logs and reports
        let failure =
            crate::classify::classify_json(result, "Symbol").expect_err("transport failure");
        assert!(!failure.to_string().contains("SECRET-KEY-123"), "{failure}");
    }
}
