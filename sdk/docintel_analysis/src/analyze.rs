//! Analyze calls for the Azure Document Intelligence API v4.0.
//!
//! This module covers both kinds of analysis the service offers: document
//! models (field extraction, `/documentModels/{modelId}:analyze`) and
//! classifiers (document routing and splitting,
//! `/documentClassifiers/{classifierId}:analyze`).
//!
//! Analysis is an asynchronous pattern: a submit request returns
//! `202 Accepted` with an `Operation-Location` header, and the client polls
//! that URL until the operation reaches a terminal status.
//!
//! ## Example
//!
//! ```rust,no_run
//! use docintel_core::client::DocIntelClient;
//! use docintel_core::auth::DocIntelCredential;
//! use docintel_analysis::analyze::{self, AnalyzeRequest, PREBUILT_LAYOUT};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DocIntelClient::builder()
//!     .endpoint("https://your-resource.cognitiveservices.azure.com")
//!     .credential(DocIntelCredential::api_key("your-key"))
//!     .build()?;
//!
//! let request = AnalyzeRequest::builder()
//!     .model_id(PREBUILT_LAYOUT)
//!     .url_source("https://example.com/document.pdf")
//!     .build()?;
//!
//! let handle = analyze::analyze(&client, &request).await?;
//! let operation = analyze::poll_until_complete(
//!     &client,
//!     &handle.operation_location,
//!     std::time::Duration::from_secs(1),
//!     0,
//! ).await?;
//! # Ok(())
//! # }
//! ```

use docintel_core::client::DocIntelClient;
use docintel_core::error::{DocIntelError, DocIntelResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Prebuilt model ID constants
// ---------------------------------------------------------------------------

/// Prebuilt model for general text extraction (OCR).
pub const PREBUILT_READ: &str = "prebuilt-read";

/// Prebuilt model for document layout analysis (tables, figures, sections).
pub const PREBUILT_LAYOUT: &str = "prebuilt-layout";

/// Prebuilt model for invoice data extraction.
pub const PREBUILT_INVOICE: &str = "prebuilt-invoice";

/// Prebuilt model for receipt data extraction.
pub const PREBUILT_RECEIPT: &str = "prebuilt-receipt";

/// Prebuilt model for ID document data extraction (passports, driver licenses).
pub const PREBUILT_ID_DOCUMENT: &str = "prebuilt-idDocument";

/// Prebuilt model for business card data extraction.
pub const PREBUILT_BUSINESS_CARD: &str = "prebuilt-businessCard";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Whether a model ID refers to a document model or a classifier.
///
/// Document models extract structured fields from a single document type;
/// classifiers route (and optionally split) a file among sub-models. The two
/// kinds live under different URL paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Field-extracting model (`/documentModels/{modelId}:analyze`).
    #[default]
    #[serde(rename = "documentModel")]
    DocumentModel,
    /// Routing/splitting model (`/documentClassifiers/{classifierId}:analyze`).
    #[serde(rename = "classifier")]
    Classifier,
}

/// An optional analysis feature to enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisFeature {
    /// Extract key-value pairs.
    #[serde(rename = "keyValuePairs")]
    KeyValuePairs,
    /// Detect font styles.
    #[serde(rename = "styleFont")]
    StyleFont,
    /// Detect barcodes and QR codes.
    #[serde(rename = "barcodes")]
    Barcodes,
    /// Detect mathematical formulas.
    #[serde(rename = "formulas")]
    Formulas,
    /// Detect document languages.
    #[serde(rename = "languages")]
    Languages,
    /// Enable query fields extraction.
    #[serde(rename = "queryFields")]
    QueryFields,
    /// High-resolution OCR for small or dense text.
    #[serde(rename = "ocrHighResolution")]
    OcrHighResolution,
}

impl AnalysisFeature {
    /// Returns the API string representation of this feature.
    fn as_str(&self) -> &'static str {
        match self {
            Self::KeyValuePairs => "keyValuePairs",
            Self::StyleFont => "styleFont",
            Self::Barcodes => "barcodes",
            Self::Formulas => "formulas",
            Self::Languages => "languages",
            Self::QueryFields => "queryFields",
            Self::OcrHighResolution => "ocrHighResolution",
        }
    }
}

/// Format of the `content` field in the analysis result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentFormat {
    /// Plain text.
    #[default]
    #[serde(rename = "text")]
    Text,
    /// Markdown, preserving headings and table structure.
    #[serde(rename = "markdown")]
    Markdown,
}

impl ContentFormat {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
        }
    }
}

/// A request to analyze a document.
///
/// Use the builder pattern to construct requests:
///
/// ```rust
/// use docintel_analysis::analyze::{AnalyzeRequest, PREBUILT_LAYOUT};
///
/// let request = AnalyzeRequest::builder()
///     .model_id(PREBUILT_LAYOUT)
///     .url_source("https://example.com/document.pdf")
///     .build()
///     .expect("valid request");
/// ```
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    /// The model or classifier ID to use for analysis.
    pub model_id: String,

    /// Whether `model_id` refers to a document model or a classifier.
    pub model_kind: ModelKind,

    /// URL of the document to analyze (mutually exclusive with `base64_source`).
    url_source: Option<String>,

    /// Base64-encoded document content (mutually exclusive with `url_source`).
    base64_source: Option<String>,

    /// Page ranges to analyze (e.g., "1-3,5").
    pages: Option<String>,

    /// Document locale hint (e.g., "en-US").
    locale: Option<String>,

    /// Optional analysis features to enable.
    features: Vec<AnalysisFeature>,

    /// Field labels for custom extraction (requires the queryFields feature).
    query_fields: Vec<String>,

    /// Requested content format; omitted from the query when not set.
    output_content_format: Option<ContentFormat>,

    /// Ask a classifier to split multi-document files. Only honored for
    /// classifier requests; document models ignore it.
    split_documents: bool,
}

/// The JSON body sent to the analyze endpoint.
#[derive(Debug, Serialize)]
struct AnalyzeBody {
    #[serde(rename = "urlSource", skip_serializing_if = "Option::is_none")]
    url_source: Option<String>,

    #[serde(rename = "base64Source", skip_serializing_if = "Option::is_none")]
    base64_source: Option<String>,
}

impl AnalyzeRequest {
    /// Creates a new builder for an analyze request.
    pub fn builder() -> AnalyzeRequestBuilder {
        AnalyzeRequestBuilder::default()
    }

    /// Returns the JSON body for the API request.
    fn body(&self) -> AnalyzeBody {
        AnalyzeBody {
            url_source: self.url_source.clone(),
            base64_source: self.base64_source.clone(),
        }
    }

    /// Returns the URL path of the analyze endpoint for this request.
    pub(crate) fn analyze_path(&self) -> String {
        match self.model_kind {
            ModelKind::DocumentModel => format!(
                "/documentintelligence/documentModels/{}:analyze",
                self.model_id,
            ),
            ModelKind::Classifier => format!(
                "/documentintelligence/documentClassifiers/{}:analyze",
                self.model_id,
            ),
        }
    }

    /// Builds the query string for the API request.
    ///
    /// Options left empty are omitted. `split=auto` is sent only for
    /// classifier requests with `split_documents` enabled.
    pub(crate) fn query_string(&self, api_version: &str) -> String {
        let mut params = format!("api-version={api_version}");

        if let Some(ref pages) = self.pages {
            params.push_str(&format!("&pages={pages}"));
        }
        if let Some(ref locale) = self.locale {
            params.push_str(&format!("&locale={locale}"));
        }
        if !self.features.is_empty() {
            let features: Vec<&str> = self.features.iter().map(|f| f.as_str()).collect();
            params.push_str(&format!("&features={}", features.join(",")));
        }
        if !self.query_fields.is_empty() {
            params.push_str(&format!("&queryFields={}", self.query_fields.join(",")));
        }
        if let Some(format) = self.output_content_format {
            params.push_str(&format!("&outputContentFormat={}", format.as_str()));
        }
        if self.model_kind == ModelKind::Classifier && self.split_documents {
            params.push_str("&split=auto");
        }

        params
    }
}

/// Builder for [`AnalyzeRequest`].
#[derive(Debug, Default)]
pub struct AnalyzeRequestBuilder {
    model_id: Option<String>,
    model_kind: ModelKind,
    url_source: Option<String>,
    base64_source: Option<String>,
    pages: Option<String>,
    locale: Option<String>,
    features: Vec<AnalysisFeature>,
    query_fields: Vec<String>,
    output_content_format: Option<ContentFormat>,
    split_documents: bool,
}

impl AnalyzeRequestBuilder {
    /// Sets the model or classifier ID to use for analysis (required).
    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Sets whether the model ID refers to a document model or a classifier.
    ///
    /// Defaults to [`ModelKind::DocumentModel`].
    pub fn model_kind(mut self, kind: ModelKind) -> Self {
        self.model_kind = kind;
        self
    }

    /// Sets the URL of the document to analyze.
    ///
    /// Mutually exclusive with [`base64_source`](Self::base64_source).
    pub fn url_source(mut self, url: impl Into<String>) -> Self {
        self.url_source = Some(url.into());
        self
    }

    /// Sets the base64-encoded document content.
    ///
    /// Mutually exclusive with [`url_source`](Self::url_source).
    pub fn base64_source(mut self, data: impl Into<String>) -> Self {
        self.base64_source = Some(data.into());
        self
    }

    /// Sets the page ranges to analyze (e.g., "1-3,5").
    pub fn pages(mut self, pages: impl Into<String>) -> Self {
        self.pages = Some(pages.into());
        self
    }

    /// Sets the document locale hint.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Sets optional analysis features.
    pub fn features(mut self, features: Vec<AnalysisFeature>) -> Self {
        self.features = features;
        self
    }

    /// Sets field labels for custom extraction.
    pub fn query_fields(mut self, fields: Vec<String>) -> Self {
        self.query_fields = fields;
        self
    }

    /// Requests a specific content format for the result.
    pub fn output_content_format(mut self, format: ContentFormat) -> Self {
        self.output_content_format = Some(format);
        self
    }

    /// Asks a classifier to split multi-document files.
    ///
    /// Ignored unless [`model_kind`](Self::model_kind) is
    /// [`ModelKind::Classifier`].
    pub fn split_documents(mut self, split: bool) -> Self {
        self.split_documents = split;
        self
    }

    /// Builds the request, validating all required fields.
    ///
    /// # Errors
    ///
    /// Returns [`DocIntelError::Builder`] if:
    /// - `model_id` is missing or empty
    /// - Neither `url_source` nor `base64_source` is set
    /// - Both `url_source` and `base64_source` are set
    pub fn build(self) -> DocIntelResult<AnalyzeRequest> {
        let model_id = self
            .model_id
            .filter(|m| !m.is_empty())
            .ok_or_else(|| DocIntelError::Builder("model_id is required".into()))?;

        let url_source = self.url_source.filter(|s| !s.is_empty());
        let base64_source = self.base64_source.filter(|s| !s.is_empty());
        let has_url = url_source.is_some();
        let has_base64 = base64_source.is_some();

        if !has_url && !has_base64 {
            return Err(DocIntelError::Builder(
                "source is required: set url_source or base64_source".into(),
            ));
        }

        if has_url && has_base64 {
            return Err(DocIntelError::Builder(
                "only one source allowed: set url_source or base64_source, not both".into(),
            ));
        }

        Ok(AnalyzeRequest {
            model_id,
            model_kind: self.model_kind,
            url_source,
            base64_source,
            pages: self.pages,
            locale: self.locale,
            features: self.features,
            query_fields: self.query_fields,
            output_content_format: self.output_content_format,
            split_documents: self.split_documents,
        })
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The status of an asynchronous analyze operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStatus {
    /// The operation has not started.
    NotStarted,
    /// The operation is in progress.
    Running,
    /// The operation completed successfully.
    Succeeded,
    /// The operation failed.
    Failed,
}

impl OperationStatus {
    /// Returns `true` if the status is terminal (succeeded or failed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "notStarted",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// An error reported by the service for a failed operation.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    /// The error code.
    pub code: String,
    /// Human-readable error description.
    pub message: String,
}

/// The state of an analyze operation as returned by a poll request.
///
/// The full response body is retained untouched so callers can emit it
/// verbatim; only `status` and `error` are lifted into typed fields, which is
/// all the polling contract needs.
#[derive(Debug, Clone)]
pub struct AnalyzeOperation {
    /// Current status of the operation.
    pub status: OperationStatus,

    /// Error details, present when the status is `Failed`.
    pub error: Option<OperationError>,

    /// The full decoded response body.
    body: Value,
}

impl AnalyzeOperation {
    /// Parse an operation state from a poll response body.
    pub fn from_body(body: Value) -> DocIntelResult<Self> {
        let status: OperationStatus = body
            .get("status")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| DocIntelError::Api {
                code: "MissingStatus".into(),
                message: "operation response has no status field".into(),
            })?;

        let error: Option<OperationError> = body
            .get("error")
            .filter(|v| !v.is_null())
            .cloned()
            .map(serde_json::from_value)
            .transpose()?;

        Ok(Self {
            status,
            error,
            body,
        })
    }

    /// The `analyzeResult` payload, present when the operation succeeded.
    pub fn analyze_result(&self) -> Option<&Value> {
        self.body.get("analyzeResult").filter(|v| !v.is_null())
    }

    /// Borrow the full decoded response body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume the operation, returning the full decoded response body.
    pub fn into_body(self) -> Value {
        self.body
    }
}

/// The result of submitting a document for analysis.
///
/// Contains the `Operation-Location` URL to poll for results.
#[derive(Debug, Clone)]
pub struct AnalyzeOperationHandle {
    /// The URL to poll for the analysis result.
    pub operation_location: String,
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

/// Submit a document for analysis.
///
/// Returns an [`AnalyzeOperationHandle`] with the `Operation-Location` URL to
/// poll. The API returns `202 Accepted` on success.
///
/// # Tracing
///
/// Emits a span named `docintel::analyze` with fields `model_id` and
/// `model_kind`.
#[tracing::instrument(
    name = "docintel::analyze",
    skip(client, request),
    fields(model_id = %request.model_id, model_kind = ?request.model_kind)
)]
pub async fn analyze(
    client: &DocIntelClient,
    request: &AnalyzeRequest,
) -> DocIntelResult<AnalyzeOperationHandle> {
    tracing::debug!("submitting document for analysis");

    let path = format!(
        "{}?{}",
        request.analyze_path(),
        request.query_string(client.api_version()),
    );

    let body = request.body();
    let response = client.post(&path, &body).await?;

    let operation_location = response
        .headers()
        .get("Operation-Location")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| DocIntelError::Api {
            code: "MissingHeader".into(),
            message: "Operation-Location header missing from response".into(),
        })?;

    tracing::debug!(operation_location = %operation_location, "analysis submitted");

    Ok(AnalyzeOperationHandle { operation_location })
}

/// Get the current state of an analyze operation.
///
/// # Tracing
///
/// Emits a span named `docintel::get_result`.
#[tracing::instrument(
    name = "docintel::get_result",
    skip(client),
    fields(operation_location = %operation_location)
)]
pub async fn get_result(
    client: &DocIntelClient,
    operation_location: &str,
) -> DocIntelResult<AnalyzeOperation> {
    tracing::debug!("fetching analyze result");

    // The Operation-Location is a full URL. Extract the path + query to use
    // with the client's relative path-based API.
    let parsed = url::Url::parse(operation_location).map_err(|e| {
        DocIntelError::invalid_endpoint_with_source("failed to parse Operation-Location URL", e)
    })?;

    let relative_path = match parsed.query() {
        Some(q) => format!("{}?{q}", parsed.path()),
        None => parsed.path().to_string(),
    };

    let response = client.get(&relative_path).await?;
    let body = response.json::<Value>().await?;
    let operation = AnalyzeOperation::from_body(body)?;

    tracing::debug!(status = %operation.status, "analyze result fetched");
    Ok(operation)
}

/// Poll an analyze operation until it reaches a terminal status.
///
/// Returns the final [`AnalyzeOperation`] when the status is `Succeeded` or
/// `Failed`. The caller should check the status to determine whether the
/// analysis succeeded.
///
/// # Arguments
///
/// * `client` - The Document Intelligence client.
/// * `operation_location` - The URL returned by [`analyze`].
/// * `poll_interval` - How long to wait between status checks.
/// * `max_attempts` - Maximum number of poll attempts before returning an
///   error. Set to `0` to disable the limit; completion is then bounded only
///   by the service's own operation lifecycle.
///
/// # Errors
///
/// Returns [`DocIntelError::Api`] if `max_attempts` is exceeded before the
/// operation reaches a terminal status.
///
/// # Tracing
///
/// Emits a span named `docintel::poll_until_complete`.
#[tracing::instrument(
    name = "docintel::poll_until_complete",
    skip(client),
    fields(operation_location = %operation_location)
)]
pub async fn poll_until_complete(
    client: &DocIntelClient,
    operation_location: &str,
    poll_interval: Duration,
    max_attempts: u32,
) -> DocIntelResult<AnalyzeOperation> {
    tracing::debug!("starting to poll for completion");

    let mut attempts = 0u32;

    loop {
        if max_attempts > 0 {
            attempts += 1;
            if attempts > max_attempts {
                return Err(DocIntelError::Api {
                    code: "PollTimeout".into(),
                    message: format!(
                        "poll_until_complete timed out after {max_attempts} max_attempts"
                    ),
                });
            }
        }

        let operation = get_result(client, operation_location).await?;

        if operation.status.is_terminal() {
            tracing::debug!(status = %operation.status, "operation reached terminal status");
            return Ok(operation);
        }

        tracing::trace!(
            status = %operation.status,
            attempt = attempts,
            "operation still in progress, waiting",
        );
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_mock_client;
    use wiremock::matchers::{method, path as match_path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // -----------------------------------------------------------------------
    // AnalyzeRequest builder validation
    // -----------------------------------------------------------------------

    #[test]
    fn test_analyze_request_requires_model_id() {
        let result = AnalyzeRequest::builder()
            .url_source("https://example.com/doc.pdf")
            .build();
        let err = result.expect_err("should require model_id");
        assert!(err.to_string().contains("model_id"), "error: {err}");
    }

    #[test]
    fn test_analyze_request_rejects_empty_model_id() {
        let result = AnalyzeRequest::builder()
            .model_id("")
            .url_source("https://example.com/doc.pdf")
            .build();
        let err = result.expect_err("should reject empty model_id");
        assert!(err.to_string().contains("model_id"), "error: {err}");
    }

    #[test]
    fn test_analyze_request_requires_source() {
        let result = AnalyzeRequest::builder().model_id(PREBUILT_LAYOUT).build();
        let err = result.expect_err("should require source");
        assert!(err.to_string().contains("source"), "error: {err}");
    }

    #[test]
    fn test_analyze_request_rejects_both_sources() {
        let result = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .url_source("https://example.com/doc.pdf")
            .base64_source("aGVsbG8=")
            .build();
        let err = result.expect_err("should reject both sources");
        assert!(err.to_string().contains("only one"), "error: {err}");
    }

    #[test]
    fn test_analyze_request_rejects_empty_url_source() {
        let result = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .url_source("")
            .build();
        let err = result.expect_err("empty url_source should be rejected");
        assert!(err.to_string().contains("source"), "error: {err}");
    }

    #[test]
    fn test_analyze_request_accepts_base64_source() {
        let request = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .base64_source("aGVsbG8=")
            .build()
            .expect("should accept base64_source");
        assert_eq!(request.model_id, PREBUILT_LAYOUT);
        assert_eq!(request.model_kind, ModelKind::DocumentModel);
    }

    // -----------------------------------------------------------------------
    // Request body serialization
    // -----------------------------------------------------------------------

    #[test]
    fn test_analyze_request_url_source_serialization() {
        let request = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        let json = serde_json::to_value(request.body()).expect("should serialize");
        assert_eq!(json["urlSource"], "https://example.com/doc.pdf");
        assert!(json.get("base64Source").is_none());
    }

    #[test]
    fn test_analyze_request_base64_source_serialization() {
        let request = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .base64_source("aGVsbG8=")
            .build()
            .expect("valid request");

        let json = serde_json::to_value(request.body()).expect("should serialize");
        assert_eq!(json["base64Source"], "aGVsbG8=");
        assert!(json.get("urlSource").is_none());
    }

    // -----------------------------------------------------------------------
    // Endpoint paths and query string assembly
    // -----------------------------------------------------------------------

    #[test]
    fn test_document_model_analyze_path() {
        let request = AnalyzeRequest::builder()
            .model_id("prebuilt-invoice")
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        assert_eq!(
            request.analyze_path(),
            "/documentintelligence/documentModels/prebuilt-invoice:analyze"
        );
    }

    #[test]
    fn test_classifier_analyze_path() {
        let request = AnalyzeRequest::builder()
            .model_id("my-classifier")
            .model_kind(ModelKind::Classifier)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        assert_eq!(
            request.analyze_path(),
            "/documentintelligence/documentClassifiers/my-classifier:analyze"
        );
    }

    #[test]
    fn test_query_string_includes_set_options() {
        let request = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .url_source("https://example.com/doc.pdf")
            .pages("1-3,5")
            .locale("en-US")
            .features(vec![
                AnalysisFeature::OcrHighResolution,
                AnalysisFeature::Barcodes,
            ])
            .query_fields(vec!["Field1".into(), "Field2".into()])
            .output_content_format(ContentFormat::Markdown)
            .build()
            .expect("valid request");

        let qs = request.query_string("2024-11-30");
        assert!(qs.starts_with("api-version=2024-11-30"), "qs: {qs}");
        assert!(qs.contains("pages=1-3,5"), "qs: {qs}");
        assert!(qs.contains("locale=en-US"), "qs: {qs}");
        assert!(qs.contains("features=ocrHighResolution,barcodes"), "qs: {qs}");
        assert!(qs.contains("queryFields=Field1,Field2"), "qs: {qs}");
        assert!(qs.contains("outputContentFormat=markdown"), "qs: {qs}");
    }

    #[test]
    fn test_query_string_omits_empty_options() {
        let request = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        let qs = request.query_string("2024-11-30");
        assert_eq!(qs, "api-version=2024-11-30");
    }

    #[test]
    fn test_split_sent_only_for_classifiers() {
        let classifier = AnalyzeRequest::builder()
            .model_id("my-classifier")
            .model_kind(ModelKind::Classifier)
            .split_documents(true)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");
        assert!(classifier.query_string("2024-11-30").contains("split=auto"));

        // Same flag on a document model must not produce the parameter.
        let document_model = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .split_documents(true)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");
        assert!(!document_model.query_string("2024-11-30").contains("split"));
    }

    #[test]
    fn test_split_not_sent_when_disabled() {
        let request = AnalyzeRequest::builder()
            .model_id("my-classifier")
            .model_kind(ModelKind::Classifier)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");
        assert!(!request.query_string("2024-11-30").contains("split"));
    }

    // -----------------------------------------------------------------------
    // OperationStatus and AnalyzeOperation parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_operation_status_deserialization() {
        assert_eq!(
            serde_json::from_str::<OperationStatus>(r#""notStarted""#).unwrap(),
            OperationStatus::NotStarted,
        );
        assert_eq!(
            serde_json::from_str::<OperationStatus>(r#""running""#).unwrap(),
            OperationStatus::Running,
        );
        assert_eq!(
            serde_json::from_str::<OperationStatus>(r#""succeeded""#).unwrap(),
            OperationStatus::Succeeded,
        );
        assert_eq!(
            serde_json::from_str::<OperationStatus>(r#""failed""#).unwrap(),
            OperationStatus::Failed,
        );
    }

    #[test]
    fn test_operation_status_is_terminal() {
        assert!(!OperationStatus::NotStarted.is_terminal());
        assert!(!OperationStatus::Running.is_terminal());
        assert!(OperationStatus::Succeeded.is_terminal());
        assert!(OperationStatus::Failed.is_terminal());
    }

    #[test]
    fn test_operation_status_display() {
        assert_eq!(OperationStatus::NotStarted.to_string(), "notStarted");
        assert_eq!(OperationStatus::Running.to_string(), "running");
        assert_eq!(OperationStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(OperationStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_analyze_operation_succeeded() {
        let body = serde_json::json!({
            "status": "succeeded",
            "analyzeResult": {
                "apiVersion": "2024-11-30",
                "modelId": "prebuilt-layout",
                "content": "Hello world"
            }
        });

        let operation = AnalyzeOperation::from_body(body.clone()).expect("should parse");
        assert_eq!(operation.status, OperationStatus::Succeeded);
        assert!(operation.error.is_none());
        let result = operation.analyze_result().expect("should have result");
        assert_eq!(result["content"], "Hello world");
        // Body retained verbatim for raw output
        assert_eq!(operation.into_body(), body);
    }

    #[test]
    fn test_analyze_operation_failed_with_error_details() {
        let body = serde_json::json!({
            "status": "failed",
            "error": {
                "code": "InvalidRequest",
                "message": "The document format is not supported."
            }
        });

        let operation = AnalyzeOperation::from_body(body).expect("should parse");
        assert_eq!(operation.status, OperationStatus::Failed);
        assert!(operation.analyze_result().is_none());

        let err = operation.error.expect("should have error details");
        assert_eq!(err.code, "InvalidRequest");
        assert!(err.message.contains("not supported"));
    }

    #[test]
    fn test_analyze_operation_running() {
        let operation = AnalyzeOperation::from_body(serde_json::json!({"status": "running"}))
            .expect("should parse");
        assert_eq!(operation.status, OperationStatus::Running);
        assert!(operation.analyze_result().is_none());
    }

    #[test]
    fn test_analyze_operation_rejects_missing_status() {
        let err = AnalyzeOperation::from_body(serde_json::json!({"analyzeResult": {}}))
            .expect_err("should reject missing status");
        assert!(err.to_string().contains("status"), "error: {err}");
    }

    #[test]
    fn test_analysis_feature_as_str_matches_serde() {
        let variants = [
            (AnalysisFeature::KeyValuePairs, "keyValuePairs"),
            (AnalysisFeature::StyleFont, "styleFont"),
            (AnalysisFeature::Barcodes, "barcodes"),
            (AnalysisFeature::Formulas, "formulas"),
            (AnalysisFeature::Languages, "languages"),
            (AnalysisFeature::QueryFields, "queryFields"),
            (AnalysisFeature::OcrHighResolution, "ocrHighResolution"),
        ];

        for (variant, expected) in &variants {
            assert_eq!(variant.as_str(), *expected);
            let serialized = serde_json::to_string(variant).expect("should serialize");
            assert_eq!(serialized, format!("\"{expected}\""));
        }
    }

    #[test]
    fn test_prebuilt_model_id_constants() {
        assert_eq!(PREBUILT_READ, "prebuilt-read");
        assert_eq!(PREBUILT_LAYOUT, "prebuilt-layout");
        assert_eq!(PREBUILT_INVOICE, "prebuilt-invoice");
        assert_eq!(PREBUILT_RECEIPT, "prebuilt-receipt");
        assert_eq!(PREBUILT_ID_DOCUMENT, "prebuilt-idDocument");
        assert_eq!(PREBUILT_BUSINESS_CARD, "prebuilt-businessCard");
    }

    // -----------------------------------------------------------------------
    // analyze submit paths
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_analyze_submit_success() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        let op_location = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout/analyzeResults/result-id-123",
            server.uri(),
        );

        Mock::given(method("POST"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout:analyze",
            ))
            .and(query_param("api-version", "2024-11-30"))
            .respond_with(
                ResponseTemplate::new(202)
                    .append_header("Operation-Location", op_location.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        let handle = analyze(&client, &request).await.expect("should succeed");
        assert!(
            handle.operation_location.contains("result-id-123"),
            "got: {}",
            handle.operation_location,
        );
    }

    #[tokio::test]
    async fn test_analyze_submit_classifier_path() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        let op_location = format!(
            "{}/documentintelligence/documentClassifiers/my-classifier/analyzeResults/cls-1",
            server.uri(),
        );

        Mock::given(method("POST"))
            .and(match_path(
                "/documentintelligence/documentClassifiers/my-classifier:analyze",
            ))
            .and(query_param("split", "auto"))
            .respond_with(
                ResponseTemplate::new(202)
                    .append_header("Operation-Location", op_location.as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = AnalyzeRequest::builder()
            .model_id("my-classifier")
            .model_kind(ModelKind::Classifier)
            .split_documents(true)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        let handle = analyze(&client, &request).await.expect("should succeed");
        assert!(handle.operation_location.contains("cls-1"));
    }

    #[tokio::test]
    async fn test_analyze_missing_operation_location() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        Mock::given(method("POST"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout:analyze",
            ))
            .respond_with(ResponseTemplate::new(202)) // no Operation-Location header
            .mount(&server)
            .await;

        let request = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        let err = analyze(&client, &request)
            .await
            .expect_err("should fail without Operation-Location");

        assert!(
            matches!(err, docintel_core::DocIntelError::Api { .. }),
            "expected DocIntelError::Api, got: {err:?}",
        );
        assert!(err.to_string().contains("Operation-Location"), "error: {err}");
    }

    #[tokio::test]
    async fn test_analyze_surfaces_service_error_message() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        Mock::given(method("POST"))
            .and(match_path(
                "/documentintelligence/documentModels/nonexistent:analyze",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {
                    "code": "NotFound",
                    "message": "Model 'nonexistent' not found"
                }
            })))
            .mount(&server)
            .await;

        let request = AnalyzeRequest::builder()
            .model_id("nonexistent")
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        let err = analyze(&client, &request).await.expect_err("should fail");
        assert!(
            err.to_string().contains("Model 'nonexistent' not found"),
            "unexpected error: {err}",
        );
    }

    // -----------------------------------------------------------------------
    // get_result and poll_until_complete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_result_succeeded() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        Mock::given(method("GET"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout/analyzeResults/result-id-123",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "succeeded",
                "analyzeResult": {
                    "apiVersion": "2024-11-30",
                    "modelId": "prebuilt-layout",
                    "content": "Hello world"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let op_location = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout/analyzeResults/result-id-123",
            server.uri(),
        );

        let operation = get_result(&client, &op_location)
            .await
            .expect("should succeed");
        assert_eq!(operation.status, OperationStatus::Succeeded);
        let result = operation.analyze_result().expect("should have result");
        assert_eq!(result["content"], "Hello world");
    }

    #[tokio::test]
    async fn test_get_result_with_malformed_url() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        let err = get_result(&client, "not-a-valid-url")
            .await
            .expect_err("should fail with malformed URL");

        assert!(
            matches!(err, docintel_core::DocIntelError::InvalidEndpoint { .. }),
            "expected DocIntelError::InvalidEndpoint, got: {err:?}",
        );
        assert!(
            err.to_string().contains("Operation-Location"),
            "error should mention Operation-Location: {err}",
        );
    }

    #[tokio::test]
    async fn test_poll_until_complete_waits_for_success() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        // First poll: running. Second poll: succeeded.
        Mock::given(method("GET"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout/analyzeResults/res-1",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "running"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout/analyzeResults/res-1",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "succeeded",
                "analyzeResult": {
                    "apiVersion": "2024-11-30",
                    "modelId": "prebuilt-layout",
                    "content": "Done"
                }
            })))
            .mount(&server)
            .await;

        let op_location = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout/analyzeResults/res-1",
            server.uri(),
        );

        let operation =
            poll_until_complete(&client, &op_location, Duration::from_millis(10), 10)
                .await
                .expect("should succeed");
        assert_eq!(operation.status, OperationStatus::Succeeded);
        let result = operation.analyze_result().expect("should have result");
        assert_eq!(result["content"], "Done");
    }

    #[tokio::test]
    async fn test_poll_until_complete_returns_failed_status() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        Mock::given(method("GET"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout/analyzeResults/res-fail",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "failed",
                "error": { "code": "InternalServerError", "message": "analysis failed" }
            })))
            .mount(&server)
            .await;

        let op_location = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout/analyzeResults/res-fail",
            server.uri(),
        );

        let operation =
            poll_until_complete(&client, &op_location, Duration::from_millis(10), 10)
                .await
                .expect("should return Ok even on failed status");
        assert_eq!(operation.status, OperationStatus::Failed);
        assert!(operation.error.is_some());
    }

    #[tokio::test]
    async fn test_poll_until_complete_exceeds_max_attempts() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        // Always return "running", never terminates naturally
        Mock::given(method("GET"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout/analyzeResults/infinite",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "running"})),
            )
            .mount(&server)
            .await;

        let op_location = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout/analyzeResults/infinite",
            server.uri(),
        );

        let err = poll_until_complete(&client, &op_location, Duration::from_millis(1), 3)
            .await
            .expect_err("should fail after max_attempts exceeded");

        assert!(
            matches!(err, docintel_core::DocIntelError::Api { .. }),
            "expected DocIntelError::Api, got: {err:?}",
        );
        assert!(
            err.to_string().contains("max_attempts") || err.to_string().contains("timed out"),
            "error: {err}",
        );
    }

    // -----------------------------------------------------------------------
    // Tracing spans
    // -----------------------------------------------------------------------

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_analyze_emits_span() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        let op_location = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout/analyzeResults/res-trace",
            server.uri(),
        );

        Mock::given(method("POST"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout:analyze",
            ))
            .respond_with(
                ResponseTemplate::new(202)
                    .append_header("Operation-Location", op_location.as_str()),
            )
            .mount(&server)
            .await;

        let request = AnalyzeRequest::builder()
            .model_id(PREBUILT_LAYOUT)
            .url_source("https://example.com/doc.pdf")
            .build()
            .expect("valid request");

        let _ = analyze(&client, &request).await;
        assert!(logs_contain("docintel::analyze"));
        assert!(logs_contain("prebuilt-layout"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_poll_until_complete_emits_span() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        Mock::given(method("GET"))
            .and(match_path(
                "/documentintelligence/documentModels/prebuilt-layout/analyzeResults/res-span",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "succeeded",
                "analyzeResult": {
                    "apiVersion": "2024-11-30",
                    "modelId": "prebuilt-layout"
                }
            })))
            .mount(&server)
            .await;

        let op_location = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout/analyzeResults/res-span",
            server.uri(),
        );

        let _ = poll_until_complete(&client, &op_location, Duration::from_millis(10), 10).await;
        assert!(logs_contain("docintel::poll_until_complete"));
    }
}
