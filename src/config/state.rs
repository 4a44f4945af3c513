use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ColumnSort;

/// Persisted runtime state of one column.
///
/// Plugin-contributed fields are flattened next to the core ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnState {
    pub field: String,
    pub order: usize,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<ColumnSort>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridState {
    #[serde(default)]
    pub columns: Vec<ColumnState>,
}

impl GridState {
    pub fn column(&self, field: &str) -> Option<&ColumnState> {
        self.columns.iter().find(|c| c.field == field)
    }
}
