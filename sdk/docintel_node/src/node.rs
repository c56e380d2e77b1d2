//! The execute handler: one run over a batch of input items.
//!
//! Each item is processed sequentially. The per-item flow is resolve
//! parameters, build an analyze request from the configured source, submit,
//! poll the returned operation until it reaches a terminal status, then shape
//! the completed body into output records. When the host enables
//! continue-on-fail, a failing item is recorded as an `{error: message}`
//! record and the run moves on; otherwise the first failure aborts the run.

use crate::context::NodeContext;
use crate::error::{NodeError, NodeResult};
use crate::output::{shape_output, OutputItem};
use crate::params::{InputSource, NodeParams};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use docintel_analysis::analyze::{self, AnalyzeRequest, OperationStatus};
use docintel_core::client::DocIntelClient;
use docintel_core::error::DocIntelError;
use serde_json::json;

/// Fallback message when the service gives no usable detail for a rejected
/// submission or a failed operation.
const ANALYZE_FAILED_MESSAGE: &str = "Analyze request failed";

/// Document analysis node backed by a [`DocIntelClient`].
#[derive(Debug, Clone)]
pub struct DocumentIntelligenceNode {
    client: DocIntelClient,
}

impl DocumentIntelligenceNode {
    /// Create a node using the given client for all service calls.
    pub fn new(client: DocIntelClient) -> Self {
        Self { client }
    }

    /// Process every input item and collect the emitted records in order.
    ///
    /// # Errors
    ///
    /// Returns the first item failure unless the context enables
    /// continue-on-fail, in which case failures become `{error: message}`
    /// records for the failing item's index.
    ///
    /// # Tracing
    ///
    /// Emits a span named `docintel::node_run` with the item count.
    #[tracing::instrument(
        name = "docintel::node_run",
        skip(self, ctx),
        fields(item_count = ctx.item_count())
    )]
    pub async fn run(&self, ctx: &dyn NodeContext) -> NodeResult<Vec<OutputItem>> {
        let mut output = Vec::new();

        for item_index in 0..ctx.item_count() {
            match self.process_item(ctx, item_index).await {
                Ok(items) => output.extend(items),
                Err(err) if ctx.continue_on_fail() => {
                    tracing::warn!(item_index, error = %err, "item failed, continuing");
                    output.push(OutputItem::new(json!({"error": err.to_string()}), item_index));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(output)
    }

    /// Analyze a single input item.
    #[tracing::instrument(name = "docintel::process_item", skip(self, ctx))]
    async fn process_item(
        &self,
        ctx: &dyn NodeContext,
        item_index: usize,
    ) -> NodeResult<Vec<OutputItem>> {
        let params = ctx.params(item_index);
        let request = self.build_request(ctx, item_index, &params)?;

        let handle = analyze::analyze(&self.client, &request)
            .await
            .map_err(submission_error)?;

        let operation = analyze::poll_until_complete(
            &self.client,
            &handle.operation_location,
            params.additional_options.poll_interval(),
            0,
        )
        .await?;

        if operation.status == OperationStatus::Failed {
            let message = operation
                .error
                .as_ref()
                .map(|e| e.message.clone())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| ANALYZE_FAILED_MESSAGE.to_string());
            return Err(NodeError::AnalyzeRequestFailed(message));
        }

        if operation.analyze_result().is_none() {
            return Err(NodeError::NoAnalysisResult);
        }

        Ok(shape_output(
            params.output_mode,
            &operation.into_body(),
            item_index,
        ))
    }

    /// Translate the item's resolved parameters into an analyze request.
    fn build_request(
        &self,
        ctx: &dyn NodeContext,
        item_index: usize,
        params: &NodeParams,
    ) -> NodeResult<AnalyzeRequest> {
        let mut builder = AnalyzeRequest::builder()
            .model_id(&params.model_id)
            .model_kind(params.model_type)
            .features(params.additional_options.features.clone())
            .query_fields(params.additional_options.query_field_list())
            .split_documents(params.split_documents());

        match params.input_source {
            InputSource::Url => {
                builder = builder.url_source(&params.document_url);
            }
            InputSource::Binary => {
                let data = ctx
                    .binary_data(item_index, &params.binary_property_name)
                    .ok_or_else(|| NodeError::MissingBinaryData {
                        item_index,
                        property: params.binary_property_name.clone(),
                    })?;
                builder = builder.base64_source(BASE64.encode(&data));
            }
        }

        if !params.additional_options.pages.is_empty() {
            builder = builder.pages(&params.additional_options.pages);
        }
        if !params.additional_options.locale.is_empty() {
            builder = builder.locale(&params.additional_options.locale);
        }
        if let Some(format) = params.additional_options.output_content_format {
            builder = builder.output_content_format(format);
        }

        Ok(builder.build()?)
    }
}

/// Map a submission failure to the item-scoped error the host reports.
///
/// Service errors keep their message (falling back to a fixed one when the
/// service gave none); transport and client-side failures pass through.
fn submission_error(err: DocIntelError) -> NodeError {
    match err {
        DocIntelError::Api { message, .. } => {
            let message = if message.is_empty() {
                ANALYZE_FAILED_MESSAGE.to_string()
            } else {
                message
            };
            NodeError::AnalyzeRequestFailed(message)
        }
        DocIntelError::Http { .. } => {
            NodeError::AnalyzeRequestFailed(ANALYZE_FAILED_MESSAGE.to_string())
        }
        other => NodeError::Core(other),
    }
}
