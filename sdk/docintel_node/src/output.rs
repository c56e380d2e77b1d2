//! Output shaping for the three output modes.
//!
//! The service payload is passed through untouched; shaping only selects a
//! subset of `analyzeResult` and tags every emitted record with the index of
//! the input item it came from.

use crate::params::OutputMode;
use serde::Serialize;
use serde_json::{Map, Value};

/// Reference back to the input item an output record was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairedItem {
    /// 0-based index of the source input item.
    pub item: usize,
}

/// A single emitted record, following the host's item-stream convention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputItem {
    /// The record payload.
    pub json: Value,

    /// Correlation back to the source input item.
    #[serde(rename = "pairedItem")]
    pub paired_item: PairedItem,
}

impl OutputItem {
    /// Create an output record for the given source item index.
    pub fn new(json: Value, item_index: usize) -> Self {
        Self {
            json,
            paired_item: PairedItem { item: item_index },
        }
    }
}

/// Shape a completed operation body into output records.
///
/// `body` is the full decoded poll response; the caller has already verified
/// that it carries an `analyzeResult`.
///
/// - `raw` emits the body verbatim as a single record.
/// - `simplified` (and `oneItemPerDocument` with at most one document) emits
///   a single record with `content`, the first document's fields under
///   `keyValuePairs`, `tables`, and `document` present only when the result
///   holds exactly one document.
/// - `oneItemPerDocument` with more than one document emits one record per
///   document, all tagged with the same source item index.
pub(crate) fn shape_output(mode: OutputMode, body: &Value, item_index: usize) -> Vec<OutputItem> {
    if mode == OutputMode::Raw {
        return vec![OutputItem::new(body.clone(), item_index)];
    }

    let empty = Value::Object(Map::new());
    let analyze_result = body.get("analyzeResult").unwrap_or(&empty);
    let documents: &[Value] = analyze_result
        .get("documents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    if mode == OutputMode::OneItemPerDocument && documents.len() > 1 {
        return documents
            .iter()
            .map(|doc| {
                let mut simplified = simplified_base(analyze_result, doc.get("fields"));
                simplified.insert("document".into(), doc.clone());
                OutputItem::new(Value::Object(simplified), item_index)
            })
            .collect();
    }

    let first = documents.first();
    let mut simplified = simplified_base(analyze_result, first.and_then(|d| d.get("fields")));
    if documents.len() == 1 {
        if let Some(doc) = first {
            simplified.insert("document".into(), doc.clone());
        }
    }
    vec![OutputItem::new(Value::Object(simplified), item_index)]
}

/// Common part of the simplified shape: content, key-value pairs, tables.
/// Absent values are omitted rather than emitted as nulls.
fn simplified_base(analyze_result: &Value, fields: Option<&Value>) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(content) = analyze_result.get("content") {
        map.insert("content".into(), content.clone());
    }
    if let Some(fields) = fields.filter(|v| !v.is_null()) {
        map.insert("keyValuePairs".into(), fields.clone());
    }
    if let Some(tables) = analyze_result.get("tables").filter(|v| !v.is_null()) {
        map.insert("tables".into(), tables.clone());
    }
    map
}
