//! Static node and credential descriptors.
//!
//! Hosts render the parameter UI and the credential editor from these
//! declarations; nothing here executes. The shapes serialize to the host's
//! descriptor JSON convention (camelCase keys, `displayOptions.show` gating,
//! expression templates in `={{...}}` syntax).

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Kind of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyKind {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "options")]
    Options,
    #[serde(rename = "multiOptions")]
    MultiOptions,
    #[serde(rename = "collection")]
    Collection,
}

/// A selectable choice for `options` / `multiOptions` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyOption {
    pub name: &'static str,
    pub value: &'static str,
}

/// Either a selectable choice or, inside a collection, a nested parameter.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PropertyEntry {
    Choice(PropertyOption),
    Nested(Box<NodeProperty>),
}

/// Visibility conditions: the parameter is shown only when every listed
/// parameter currently holds one of the listed values.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayOptions {
    pub show: BTreeMap<&'static str, Vec<Value>>,
}

/// Extra editor hints for a parameter.
#[derive(Debug, Clone, Serialize)]
pub struct TypeOptions {
    pub password: bool,
}

/// A declared parameter of the node or credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    pub display_name: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub default: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PropertyEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_options: Option<TypeOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl NodeProperty {
    fn new(display_name: &'static str, name: &'static str, kind: PropertyKind) -> Self {
        Self {
            display_name,
            name,
            kind,
            default: Value::Null,
            options: Vec::new(),
            display_options: None,
            type_options: None,
            placeholder: None,
            description: None,
        }
    }

    fn default_value(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    fn choices(mut self, choices: Vec<PropertyOption>) -> Self {
        self.options = choices.into_iter().map(PropertyEntry::Choice).collect();
        self
    }

    fn nested(mut self, properties: Vec<NodeProperty>) -> Self {
        self.options = properties
            .into_iter()
            .map(|p| PropertyEntry::Nested(Box::new(p)))
            .collect();
        self
    }

    fn shown_when(mut self, parameter: &'static str, values: Vec<Value>) -> Self {
        let mut show = BTreeMap::new();
        show.insert(parameter, values);
        self.display_options = Some(DisplayOptions { show });
        self
    }

    fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// Default node name shown in the editor.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDefaults {
    pub name: &'static str,
}

/// Reference to a credential type the node consumes.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialRef {
    pub name: &'static str,
}

/// The node descriptor: identity, wiring, and the parameter schema.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub display_name: &'static str,
    pub name: &'static str,
    pub group: Vec<&'static str>,
    pub version: u32,
    pub description: &'static str,
    pub defaults: NodeDefaults,
    pub inputs: Vec<&'static str>,
    pub outputs: Vec<&'static str>,
    pub credentials: Vec<CredentialRef>,
    pub properties: Vec<NodeProperty>,
}

/// Header-injection authentication declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Authenticate {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: AuthenticateProperties,
}

/// Properties of a generic authentication declaration.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticateProperties {
    pub headers: BTreeMap<&'static str, &'static str>,
}

/// The request the host issues to validate a credential before saving.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialTest {
    pub request: CredentialTestRequest,
}

/// Target of the credential test request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTestRequest {
    pub base_url: &'static str,
    pub url: &'static str,
}

/// The credential descriptor: fields, authentication, and test request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub documentation_url: &'static str,
    pub properties: Vec<NodeProperty>,
    pub authenticate: Authenticate,
    pub test: CredentialTest,
}

/// The analysis features selectable in the UI.
const FEATURE_OPTIONS: [PropertyOption; 7] = [
    PropertyOption { name: "Key-Value Pairs", value: "keyValuePairs" },
    PropertyOption { name: "Style/Font", value: "styleFont" },
    PropertyOption { name: "Barcodes", value: "barcodes" },
    PropertyOption { name: "Formulas", value: "formulas" },
    PropertyOption { name: "Languages", value: "languages" },
    PropertyOption { name: "Query Fields", value: "queryFields" },
    PropertyOption { name: "OCR High Resolution", value: "ocrHighResolution" },
];

/// Build the node descriptor.
pub fn node_descriptor() -> NodeDescriptor {
    NodeDescriptor {
        display_name: "Azure Document Intelligence",
        name: "azureDocumentIntelligence",
        group: vec!["transform"],
        version: 1,
        description: "Analyze documents with Azure Document Intelligence",
        defaults: NodeDefaults {
            name: "Azure Document Intelligence",
        },
        inputs: vec!["main"],
        outputs: vec!["main"],
        credentials: vec![CredentialRef {
            name: "azureDocumentIntelligenceApi",
        }],
        properties: vec![
            NodeProperty::new("Input Source", "inputSource", PropertyKind::Options)
                .choices(vec![
                    PropertyOption { name: "Binary Data", value: "binary" },
                    PropertyOption { name: "Document URL", value: "url" },
                ])
                .default_value(json!("binary"))
                .description("Source of the document to analyze"),
            NodeProperty::new("Binary Property", "binaryPropertyName", PropertyKind::String)
                .default_value(json!("data"))
                .shown_when("inputSource", vec![json!("binary")])
                .description("Name of the binary property containing the document"),
            NodeProperty::new("Document URL", "documentUrl", PropertyKind::String)
                .default_value(json!(""))
                .shown_when("inputSource", vec![json!("url")])
                .description("URL of the document to analyze (must be publicly accessible)"),
            NodeProperty::new("Model ID", "modelId", PropertyKind::String)
                .default_value(json!("prebuilt-layout"))
                .description(
                    "Model to use (e.g. prebuilt-layout, prebuilt-invoice, prebuilt-read, or custom model ID)",
                ),
            NodeProperty::new("Model Type", "modelType", PropertyKind::Options)
                .choices(vec![
                    PropertyOption { name: "Document Model", value: "documentModel" },
                    PropertyOption { name: "Classifier", value: "classifier" },
                ])
                .default_value(json!("documentModel"))
                .description("Whether the model ID refers to a document model or a classifier"),
            NodeProperty::new("Output Mode", "outputMode", PropertyKind::Options)
                .choices(vec![
                    PropertyOption { name: "Raw (Full JSON)", value: "raw" },
                    PropertyOption { name: "Simplified", value: "simplified" },
                    PropertyOption { name: "One Item Per Document", value: "oneItemPerDocument" },
                ])
                .default_value(json!("raw"))
                .description("Format of the output"),
            NodeProperty::new("Additional Options", "additionalOptions", PropertyKind::Collection)
                .default_value(json!({}))
                .placeholder("Add Option")
                .nested(vec![
                    NodeProperty::new("Features", "features", PropertyKind::MultiOptions)
                        .choices(FEATURE_OPTIONS.to_vec())
                        .default_value(json!([]))
                        .description("Analysis features to enable"),
                    NodeProperty::new("Locale", "locale", PropertyKind::String)
                        .default_value(json!(""))
                        .placeholder("e.g. en or en-US")
                        .description("Locale hint for text recognition"),
                    NodeProperty::new(
                        "Output Content Format",
                        "outputContentFormat",
                        PropertyKind::Options,
                    )
                    .choices(vec![
                        PropertyOption { name: "Markdown", value: "markdown" },
                        PropertyOption { name: "Text", value: "text" },
                    ])
                    .default_value(json!("text"))
                    .description("Format of the content in the result"),
                    NodeProperty::new("Pages", "pages", PropertyKind::String)
                        .default_value(json!(""))
                        .placeholder("e.g. 1-3,5,7")
                        .description("1-based page numbers to analyze"),
                    NodeProperty::new("Polling Interval (Ms)", "pollingInterval", PropertyKind::Number)
                        .default_value(json!(1000))
                        .description("Interval between poll attempts in milliseconds"),
                    NodeProperty::new("Query Fields", "queryFields", PropertyKind::String)
                        .default_value(json!(""))
                        .placeholder("e.g. Field1,Field2")
                        .description(
                            "Comma-separated field labels for custom extraction (requires queryFields feature)",
                        ),
                    NodeProperty::new("Split Documents", "splitDocuments", PropertyKind::Boolean)
                        .default_value(json!(false))
                        .shown_when("/modelType", vec![json!("classifier")])
                        .description("Whether to split multi-document files into separate documents"),
                ]),
        ],
    }
}

/// Build the credential descriptor.
pub fn credential_descriptor() -> CredentialDescriptor {
    let mut headers = BTreeMap::new();
    headers.insert("Ocp-Apim-Subscription-Key", "={{$credentials.apiKey}}");

    CredentialDescriptor {
        name: "azureDocumentIntelligenceApi",
        display_name: "Azure Document Intelligence API",
        documentation_url:
            "https://learn.microsoft.com/en-us/azure/ai-services/document-intelligence/overview",
        properties: vec![
            NodeProperty::new("Endpoint", "endpoint", PropertyKind::String)
                .default_value(json!(""))
                .placeholder("https://your-resource.cognitiveservices.azure.com")
                .description(
                    "Your Azure Document Intelligence resource endpoint (without trailing slash)",
                ),
            {
                let mut api_key = NodeProperty::new("API Key", "apiKey", PropertyKind::String)
                    .default_value(json!(""))
                    .description("API key from Azure portal (Keys and Endpoint section)");
                api_key.type_options = Some(TypeOptions { password: true });
                api_key
            },
        ],
        authenticate: Authenticate {
            kind: "generic",
            properties: AuthenticateProperties { headers },
        },
        test: CredentialTest {
            request: CredentialTestRequest {
                base_url: "={{$credentials.endpoint}}/documentintelligence",
                url: "/info",
            },
        },
    }
}
