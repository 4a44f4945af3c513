use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content contributed to the header area.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderContent {
    pub id: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub meta: IndexMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPanel {
    pub id: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(flatten)]
    pub meta: IndexMap<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarButton {
    pub id: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(flatten)]
    pub meta: IndexMap<String, Value>,
}

/// Header, tool panel and toolbar declarations of a grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_contents: Vec<HeaderContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_panels: Vec<ToolPanel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toolbar_buttons: Vec<ToolbarButton>,
}

trait ShellEntry: Clone {
    fn id(&self) -> &str;
    fn order(&self) -> i32;
}

macro_rules! shell_entry {
    ($($ty:ty),*) => {$(
        impl ShellEntry for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn order(&self) -> i32 {
                self.order
            }
        }
    )*};
}

shell_entry!(HeaderContent, ToolPanel, ToolbarButton);

/// Shell entries registered at runtime by plugins or the host, keyed by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ShellRegistry {
    pub(crate) header_contents: IndexMap<String, HeaderContent>,
    pub(crate) tool_panels: IndexMap<String, ToolPanel>,
    pub(crate) toolbar_buttons: IndexMap<String, ToolbarButton>,
}

impl ShellRegistry {
    /// Merges registrations into the config-declared shell.
    ///
    /// Registered header contents and tool panels replace declared entries with the same id;
    /// declared toolbar buttons win over registered ones. Each list is then stably ordered.
    pub(crate) fn merge(&self, declared: &ShellConfig) -> ShellConfig {
        ShellConfig {
            header_contents: merge_entries(&declared.header_contents, &self.header_contents, true),
            tool_panels: merge_entries(&declared.tool_panels, &self.tool_panels, true),
            toolbar_buttons: merge_entries(&declared.toolbar_buttons, &self.toolbar_buttons, false),
        }
    }
}

fn merge_entries<T: ShellEntry>(
    declared: &[T],
    registered: &IndexMap<String, T>,
    registered_wins: bool,
) -> Vec<T> {
    let mut merged: IndexMap<String, T> =
        IndexMap::with_capacity(declared.len() + registered.len());
    for entry in declared {
        merged.insert(entry.id().to_owned(), entry.clone());
    }
    for (id, entry) in registered {
        if registered_wins {
            merged.insert(id.clone(), entry.clone());
        } else {
            merged.entry(id.clone()).or_insert_with(|| entry.clone());
        }
    }
    let mut out: Vec<T> = merged.into_values().collect();
    out.sort_by_key(|e| e.order());
    out
}
