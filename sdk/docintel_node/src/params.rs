//! Per-item parameter model for the node.
//!
//! The host resolves workflow configuration into a [`NodeParams`] value for
//! each input item; the shapes here mirror the node descriptor
//! ([`crate::descriptor::node_descriptor`]) field for field, so a host can
//! deserialize its resolved parameter JSON directly.

use docintel_analysis::analyze::{AnalysisFeature, ContentFormat, ModelKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the document to analyze comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    /// A binary attachment on the input item.
    #[default]
    #[serde(rename = "binary")]
    Binary,
    /// A publicly accessible URL.
    #[serde(rename = "url")]
    Url,
}

/// Shape of the emitted output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// The full decoded operation body, one item per input item.
    #[default]
    #[serde(rename = "raw")]
    Raw,
    /// Content, first document's fields, and tables, one item per input item.
    #[serde(rename = "simplified")]
    Simplified,
    /// One output item per recognized document (falls back to the simplified
    /// shape when the result holds at most one document).
    #[serde(rename = "oneItemPerDocument")]
    OneItemPerDocument,
}

/// Optional analysis settings, all omitted from the request when left at
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalOptions {
    /// Analysis features to enable.
    pub features: Vec<AnalysisFeature>,

    /// Locale hint for text recognition (e.g. "en" or "en-US").
    pub locale: String,

    /// Format of the `content` field in the result.
    pub output_content_format: Option<ContentFormat>,

    /// 1-based page numbers to analyze (e.g. "1-3,5,7").
    pub pages: String,

    /// Interval between poll attempts in milliseconds.
    pub polling_interval: u64,

    /// Comma-separated field labels for custom extraction (requires the
    /// queryFields feature).
    pub query_fields: String,

    /// Whether to split multi-document files into separate documents.
    /// Only meaningful for classifiers.
    pub split_documents: bool,
}

impl Default for AdditionalOptions {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            locale: String::new(),
            output_content_format: None,
            pages: String::new(),
            polling_interval: 1000,
            query_fields: String::new(),
            split_documents: false,
        }
    }
}

impl AdditionalOptions {
    /// The delay between poll attempts. A zero interval falls back to the
    /// 1000ms default.
    pub fn poll_interval(&self) -> Duration {
        let millis = if self.polling_interval == 0 {
            1000
        } else {
            self.polling_interval
        };
        Duration::from_millis(millis)
    }

    /// The query-field labels as a trimmed list; empty input yields no labels.
    pub fn query_field_list(&self) -> Vec<String> {
        if self.query_fields.is_empty() {
            return Vec::new();
        }
        self.query_fields
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Resolved node parameters for a single input item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeParams {
    /// Source of the document to analyze.
    pub input_source: InputSource,

    /// Name of the binary property containing the document
    /// (input source `binary`).
    pub binary_property_name: String,

    /// URL of the document to analyze (input source `url`).
    pub document_url: String,

    /// Model to use (e.g. prebuilt-layout, prebuilt-invoice, or a custom
    /// model ID).
    pub model_id: String,

    /// Whether the model ID refers to a document model or a classifier.
    pub model_type: ModelKind,

    /// Format of the output.
    pub output_mode: OutputMode,

    /// Optional analysis settings.
    pub additional_options: AdditionalOptions,
}

impl Default for NodeParams {
    fn default() -> Self {
        Self {
            input_source: InputSource::default(),
            binary_property_name: "data".into(),
            document_url: String::new(),
            model_id: "prebuilt-layout".into(),
            model_type: ModelKind::default(),
            output_mode: OutputMode::default(),
            additional_options: AdditionalOptions::default(),
        }
    }
}

impl NodeParams {
    /// Whether the request should ask the service to split documents.
    ///
    /// The split option is only shown for classifiers in the UI; the flag is
    /// additionally gated here so a stale value left in the options bag after
    /// switching the model type has no effect.
    pub fn split_documents(&self) -> bool {
        self.model_type == ModelKind::Classifier && self.additional_options.split_documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_descriptor() {
        let params = NodeParams::default();
        assert_eq!(params.input_source, InputSource::Binary);
        assert_eq!(params.binary_property_name, "data");
        assert_eq!(params.model_id, "prebuilt-layout");
        assert_eq!(params.model_type, ModelKind::DocumentModel);
        assert_eq!(params.output_mode, OutputMode::Raw);
        assert_eq!(params.additional_options.polling_interval, 1000);
    }

    #[test]
    fn deserializes_from_host_config() {
        let json = serde_json::json!({
            "inputSource": "url",
            "documentUrl": "https://example.com/doc.pdf",
            "modelId": "prebuilt-invoice",
            "modelType": "documentModel",
            "outputMode": "simplified",
            "additionalOptions": {
                "locale": "en-US",
                "pages": "1-3",
                "pollingInterval": 250,
                "features": ["keyValuePairs", "ocrHighResolution"]
            }
        });

        let params: NodeParams = serde_json::from_value(json).expect("should deserialize");
        assert_eq!(params.input_source, InputSource::Url);
        assert_eq!(params.document_url, "https://example.com/doc.pdf");
        assert_eq!(params.model_id, "prebuilt-invoice");
        assert_eq!(params.output_mode, OutputMode::Simplified);
        assert_eq!(params.additional_options.locale, "en-US");
        assert_eq!(params.additional_options.pages, "1-3");
        assert_eq!(params.additional_options.polling_interval, 250);
        assert_eq!(params.additional_options.features.len(), 2);
        // Missing keys fall back to descriptor defaults
        assert_eq!(params.binary_property_name, "data");
        assert!(!params.additional_options.split_documents);
    }

    #[test]
    fn poll_interval_falls_back_on_zero() {
        let mut options = AdditionalOptions::default();
        assert_eq!(options.poll_interval(), Duration::from_millis(1000));

        options.polling_interval = 0;
        assert_eq!(options.poll_interval(), Duration::from_millis(1000));

        options.polling_interval = 250;
        assert_eq!(options.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn query_field_list_splits_and_trims() {
        let options = AdditionalOptions {
            query_fields: "Field1, Field2 ,Field3".into(),
            ..AdditionalOptions::default()
        };
        assert_eq!(options.query_field_list(), vec!["Field1", "Field2", "Field3"]);

        let empty = AdditionalOptions::default();
        assert!(empty.query_field_list().is_empty());
    }

    #[test]
    fn split_documents_gated_on_classifier() {
        let mut params = NodeParams {
            additional_options: AdditionalOptions {
                split_documents: true,
                ..AdditionalOptions::default()
            },
            ..NodeParams::default()
        };

        // Flag set but model type is documentModel: no split
        assert!(!params.split_documents());

        params.model_type = ModelKind::Classifier;
        assert!(params.split_documents());

        params.additional_options.split_documents = false;
        assert!(!params.split_documents());
    }
}
