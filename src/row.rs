use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An application record displayed by the grid.
///
/// The grid never copies rows; it holds them behind `Arc` and reads fields through this trait.
pub trait GridRow {
    /// Field names in display order, used to infer columns when none are configured.
    fn field_names(&self) -> Vec<String>;

    fn field_value(&self, field: &str) -> Option<Value>;
}

impl GridRow for Map<String, Value> {
    fn field_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl GridRow for Value {
    fn field_names(&self) -> Vec<String> {
        match self {
            Value::Object(map) => map.field_names(),
            _ => Vec::new(),
        }
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

/// Identity of a row, stable across data replacement when produced by an identity function.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Index(u64),
    Key(String),
    /// Assigned to a plugin-created display row that has no id of its own. Never equal to an
    /// id of a source row.
    Generated { display: u64 },
}

impl RowId {
    /// Reads an id out of a JSON value: integers and strings are ids, anything else is not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self::Index),
            Value::String(s) => Some(Self::Key(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => f.write_str(k),
            Self::Generated { display } => write!(f, "<display {display}>"),
        }
    }
}

impl From<u64> for RowId {
    fn from(value: u64) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::Key(value.to_owned())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

/// Caller-supplied row identity. `None` means the row has no usable id.
pub type IdentityFn<R> = Arc<dyn Fn(&R) -> Option<RowId> + Send + Sync>;
