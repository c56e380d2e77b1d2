use docintel_core::DocIntelError;
use thiserror::Error;

/// Item-scoped failures raised by the execute handler.
///
/// Every variant is either propagated (aborting the remaining items) or,
/// when the host enables continue-on-fail, captured as an `{error: message}`
/// output item for the failing index.
#[derive(Error, Debug)]
pub enum NodeError {
    /// The referenced binary attachment does not exist on the input item.
    #[error("Binary property '{property}' not found on item {item_index}")]
    MissingBinaryData {
        item_index: usize,
        property: String,
    },

    /// The analyze submission was rejected by the service.
    ///
    /// Carries the service-supplied message, or "Analyze request failed"
    /// when the response had no usable message.
    #[error("{0}")]
    AnalyzeRequestFailed(String),

    /// The operation completed without an `analyzeResult` payload.
    #[error("No analysis result returned")]
    NoAnalysisResult,

    /// Any other failure (transport, serialization, polling).
    #[error(transparent)]
    Core(#[from] DocIntelError),
}

/// Result type alias for node execution.
pub type NodeResult<T> = std::result::Result<T, NodeError>;
