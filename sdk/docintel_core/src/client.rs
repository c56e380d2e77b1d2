//! HTTP client for the Azure Document Intelligence REST API.
//!
//! This module provides [`DocIntelClient`], the transport used by the analyze
//! and polling calls. The client handles authentication (subscription-key
//! header), endpoint management, and automatic retry of transient errors.
//!
//! # Examples
//!
//! ```rust,no_run
//! use docintel_core::client::DocIntelClient;
//! use docintel_core::auth::DocIntelCredential;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DocIntelClient::builder()
//!     .endpoint("https://your-resource.cognitiveservices.azure.com")
//!     .credential(DocIntelCredential::api_key("your-key"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::auth::{DocIntelCredential, SUBSCRIPTION_KEY_HEADER};
use crate::error::{DocIntelError, DocIntelResult};
use reqwest::Client as HttpClient;
use url::Url;

use std::time::Duration;

/// Default API version for Document Intelligence v4.0.
pub const DEFAULT_API_VERSION: &str = "2024-11-30";

/// Default connection timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read/response timeout (60 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Determines if an HTTP status code represents a retriable error.
///
/// Retriable errors are transient server-side issues that may succeed on retry:
/// - 429 Too Many Requests (rate limiting)
/// - 500 Internal Server Error
/// - 502 Bad Gateway
/// - 503 Service Unavailable
/// - 504 Gateway Timeout
#[inline]
pub fn is_retriable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Configuration for automatic retry behavior on transient errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    /// Initial backoff duration before the first retry.
    /// Subsequent retries use exponential backoff (2^attempt * initial_backoff).
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// The base client for interacting with a Document Intelligence resource.
///
/// The client handles authentication, HTTP transport, and endpoint management.
/// It is used by `docintel_analysis` to submit analyze requests and poll
/// long-running operations.
///
/// The client is cheaply cloneable, holds no per-request state, and is safe
/// to reuse across items.
#[derive(Debug, Clone)]
pub struct DocIntelClient {
    pub(crate) http: HttpClient,
    pub(crate) endpoint: Url,
    pub(crate) credential: DocIntelCredential,
    pub(crate) api_version: String,
    pub(crate) retry_policy: RetryPolicy,
}

/// Builder for constructing a [`DocIntelClient`].
///
/// Use [`DocIntelClient::builder()`] to create a new builder.
#[derive(Debug, Default)]
pub struct DocIntelClientBuilder {
    endpoint: Option<String>,
    credential: Option<DocIntelCredential>,
    api_version: Option<String>,
    http_client: Option<HttpClient>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
}

impl DocIntelClient {
    /// Create a new builder for configuring a `DocIntelClient`.
    pub fn builder() -> DocIntelClientBuilder {
        DocIntelClientBuilder::default()
    }

    /// Get the base endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Get the API version being used.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the retry policy configuration.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Build a full URL for an API path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined to the endpoint URL.
    pub fn url(&self, path: &str) -> DocIntelResult<Url> {
        self.endpoint
            .join(path)
            .map_err(|e| DocIntelError::invalid_endpoint_with_source("failed to construct URL", e))
    }

    /// Send a GET request with automatic retry on transient errors.
    ///
    /// Automatically adds the subscription-key header. Retries on retriable
    /// HTTP errors (429, 500, 502, 503, 504) with exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retries or the server
    /// returns a non-retriable error response.
    pub async fn get(&self, path: &str) -> DocIntelResult<reqwest::Response> {
        let url = self.url(path)?;

        for attempt in 0..=self.retry_policy.max_retries {
            let response = self
                .http
                .get(url.clone())
                .header(SUBSCRIPTION_KEY_HEADER, self.credential.header_value())
                .send()
                .await?;

            let status = response.status().as_u16();

            if response.status().is_success() {
                return Ok(response);
            }

            if !is_retriable_status(status) || attempt == self.retry_policy.max_retries {
                return Self::check_response(response).await;
            }

            self.backoff(attempt).await;
        }

        unreachable!("retry loop should return before reaching here")
    }

    /// Send a POST request with a JSON body, with automatic retry.
    ///
    /// Automatically adds the subscription-key header. Retries on retriable
    /// HTTP errors (429, 500, 502, 503, 504) with exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, the request fails after all
    /// retries, or the server returns a non-retriable error response.
    pub async fn post<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> DocIntelResult<reqwest::Response> {
        let url = self.url(path)?;

        for attempt in 0..=self.retry_policy.max_retries {
            let response = self
                .http
                .post(url.clone())
                .header(SUBSCRIPTION_KEY_HEADER, self.credential.header_value())
                .json(body)
                .send()
                .await?;

            let status = response.status().as_u16();

            if response.status().is_success() {
                return Ok(response);
            }

            if !is_retriable_status(status) || attempt == self.retry_policy.max_retries {
                return Self::check_response(response).await;
            }

            self.backoff(attempt).await;
        }

        unreachable!("retry loop should return before reaching here")
    }

    /// Sleep for the backoff interval of the given attempt.
    async fn backoff(&self, attempt: u32) {
        tokio::time::sleep(self.backoff_delay(attempt)).await;
    }

    /// Backoff interval for the given attempt: exponential with a jitter
    /// factor in [0.75, 1.25], saturating instead of overflowing for large
    /// retry counts.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        let jitter = 0.75 + fastrand::f64() * 0.5;
        self.retry_policy
            .initial_backoff
            .mul_f64(jitter)
            .saturating_mul(factor)
    }

    /// Maximum length for error messages surfaced from response bodies.
    const MAX_ERROR_MESSAGE_LEN: usize = 1000;

    /// Sanitize error messages by removing subscription keys echoed by proxies
    /// or logged request dumps.
    pub(crate) fn sanitize_error_message(msg: &str) -> String {
        let mut result = msg.to_string();

        let mut search_start = 0;
        while search_start < result.len() {
            let Some(relative_pos) = result[search_start..].find(SUBSCRIPTION_KEY_HEADER) else {
                break;
            };
            let header_end = search_start + relative_pos + SUBSCRIPTION_KEY_HEADER.len();

            // Skip separators between the header name and the key value.
            let value_start = result[header_end..]
                .find(|c: char| !c.is_whitespace() && c != ':' && c != '=' && c != '"')
                .map(|pos| header_end + pos)
                .unwrap_or(result.len());

            if value_start >= result.len() {
                break;
            }
            if result[value_start..].starts_with("[REDACTED]") {
                search_start = value_start + 10;
                continue;
            }

            let value_end = result[value_start..]
                .find(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == ',')
                .map(|pos| value_start + pos)
                .unwrap_or(result.len());

            if value_end > value_start {
                result.replace_range(value_start..value_end, "[REDACTED]");
                search_start = value_start + 10; // "[REDACTED]" is 10 chars
            } else {
                search_start = value_start + 1;
            }
        }

        result
    }

    /// Truncate a message if it exceeds the maximum length.
    /// Also sanitizes sensitive data before truncating.
    pub(crate) fn truncate_message(msg: &str) -> String {
        let sanitized = Self::sanitize_error_message(msg);

        if sanitized.len() > Self::MAX_ERROR_MESSAGE_LEN {
            // The cut must land on a char boundary; walk back when the limit
            // falls inside a multi-byte character.
            let mut cut = Self::MAX_ERROR_MESSAGE_LEN;
            while !sanitized.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}... (truncated)", &sanitized[..cut])
        } else {
            sanitized
        }
    }

    /// Check the response status and return an error if not successful.
    async fn check_response(response: reqwest::Response) -> DocIntelResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            // Try to parse the Azure error shape
            if let Ok(error) = serde_json::from_str::<serde_json::Value>(&body) {
                if let Some(err_obj) = error.get("error") {
                    return Err(DocIntelError::Api {
                        code: err_obj
                            .get("code")
                            .and_then(|c| c.as_str())
                            .unwrap_or("unknown")
                            .to_string(),
                        message: Self::truncate_message(
                            err_obj
                                .get("message")
                                .and_then(|m| m.as_str())
                                .unwrap_or(&body),
                        ),
                    });
                }
            }

            Err(DocIntelError::http(status, Self::truncate_message(&body)))
        }
    }
}

impl DocIntelClientBuilder {
    /// Set the Document Intelligence endpoint URL.
    ///
    /// This should be in the format:
    /// `https://<resource-name>.cognitiveservices.azure.com`
    /// (a trailing slash is tolerated and removed).
    ///
    /// If not set, the builder will check the `AZURE_DOCINTEL_ENDPOINT`
    /// environment variable.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the credential to use for authentication.
    ///
    /// If not set, the builder will use [`DocIntelCredential::from_env()`]
    /// which reads `AZURE_DOCINTEL_API_KEY`.
    pub fn credential(mut self, credential: DocIntelCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the API version.
    ///
    /// Defaults to [`DEFAULT_API_VERSION`] (`2024-11-30`).
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set a custom HTTP client.
    ///
    /// Use this to configure proxies or other HTTP settings.
    ///
    /// **Note:** If you provide a custom HTTP client, any timeout configuration
    /// via [`connect_timeout`](Self::connect_timeout) or
    /// [`read_timeout`](Self::read_timeout) will be ignored.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the connection timeout.
    ///
    /// This is the maximum time allowed for establishing a connection to the server.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the read timeout.
    ///
    /// This is the maximum time allowed for receiving a response from the server.
    /// It covers the entire request/response cycle including reading the body.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the retry policy for transient errors.
    ///
    /// Defaults to 3 retries with 500ms initial backoff.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Build the `DocIntelClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No endpoint is provided and `AZURE_DOCINTEL_ENDPOINT` is not set
    /// - The endpoint URL is invalid
    /// - No credential is provided and `AZURE_DOCINTEL_API_KEY` is not set
    pub fn build(self) -> DocIntelResult<DocIntelClient> {
        let http = self.http_client.unwrap_or_else(|| {
            let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
            let read_timeout = self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT);

            reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .timeout(read_timeout)
                .build()
                .expect("failed to build HTTP client")
        });

        let endpoint_str = self
            .endpoint
            .or_else(|| std::env::var("AZURE_DOCINTEL_ENDPOINT").ok())
            .ok_or_else(|| {
                DocIntelError::MissingConfig(
                    "endpoint is required. Set it via builder or AZURE_DOCINTEL_ENDPOINT env var."
                        .into(),
                )
            })?;

        // The credential editor asks for the endpoint without a trailing
        // slash, but user input is trimmed here rather than rejected.
        let endpoint = Url::parse(endpoint_str.trim_end_matches('/'))
            .map_err(|e| DocIntelError::invalid_endpoint_with_source("invalid endpoint URL", e))?;

        let credential = self
            .credential
            .map(Ok)
            .unwrap_or_else(DocIntelCredential::from_env)?;

        Ok(DocIntelClient {
            http,
            endpoint,
            credential,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            retry_policy: self.retry_policy.unwrap_or_default(),
        })
    }
}
