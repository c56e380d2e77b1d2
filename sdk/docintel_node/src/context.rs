//! Seam toward the host workflow runtime.
//!
//! The host owns item iteration state, parameter resolution, and binary-data
//! storage; the node only needs read access to those, expressed by
//! [`NodeContext`]. [`ExecutionInput`] is a plain in-memory implementation
//! for hosts that materialize everything up front (and for tests).

use crate::params::NodeParams;
use bytes::Bytes;
use std::collections::HashMap;

/// Read access to the host execution state for one node run.
pub trait NodeContext {
    /// Number of input items to process.
    fn item_count(&self) -> usize;

    /// Resolved parameters for the given item.
    fn params(&self, item_index: usize) -> NodeParams;

    /// The named binary attachment of the given item, if it exists.
    fn binary_data(&self, item_index: usize, property: &str) -> Option<Bytes>;

    /// Whether a failing item should be recorded and skipped instead of
    /// aborting the run.
    fn continue_on_fail(&self) -> bool {
        false
    }
}

/// A single input item: its resolved parameters and binary attachments.
#[derive(Debug, Clone, Default)]
pub struct InputItem {
    params: NodeParams,
    binary: HashMap<String, Bytes>,
}

impl InputItem {
    /// Create an item with the given parameters and no attachments.
    pub fn new(params: NodeParams) -> Self {
        Self {
            params,
            binary: HashMap::new(),
        }
    }

    /// Attach binary data under the given property name.
    pub fn with_binary(mut self, property: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.binary.insert(property.into(), data.into());
        self
    }
}

/// In-memory [`NodeContext`] implementation.
#[derive(Debug, Clone, Default)]
pub struct ExecutionInput {
    items: Vec<InputItem>,
    continue_on_fail: bool,
}

impl ExecutionInput {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input item.
    pub fn push(&mut self, item: InputItem) {
        self.items.push(item);
    }

    /// Enable or disable continue-on-fail for this run.
    pub fn with_continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

impl NodeContext for ExecutionInput {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn params(&self, item_index: usize) -> NodeParams {
        self.items[item_index].params.clone()
    }

    fn binary_data(&self, item_index: usize, property: &str) -> Option<Bytes> {
        self.items[item_index].binary.get(property).cloned()
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }
}
