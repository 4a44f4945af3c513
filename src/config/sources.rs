use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{GridConfig, HeaderContent, ShellRegistry, ToolPanel, ToolbarButton};
use crate::{ColumnConfig, EditOn, FitMode};

/// Columns supplied as a list, or as a map whose keys name the field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnsSource {
    List(Vec<ColumnConfig>),
    Map(IndexMap<String, ColumnConfig>),
}

impl ColumnsSource {
    pub fn to_columns(&self) -> Vec<ColumnConfig> {
        match self {
            Self::List(columns) => columns.clone(),
            Self::Map(map) => map
                .iter()
                .map(|(key, column)| {
                    let mut column = column.clone();
                    if column.field.is_empty() {
                        column.field = key.clone();
                    }
                    column
                })
                .collect(),
        }
    }
}

impl From<Vec<ColumnConfig>> for ColumnsSource {
    fn from(columns: Vec<ColumnConfig>) -> Self {
        Self::List(columns)
    }
}

impl From<IndexMap<String, ColumnConfig>> for ColumnsSource {
    fn from(map: IndexMap<String, ColumnConfig>) -> Self {
        Self::Map(map)
    }
}

/// Raw configuration fragments. Setters only store and mark the sources changed.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConfigSources {
    grid_config: Option<GridConfig>,
    columns: Option<ColumnsSource>,
    structural: Vec<ColumnConfig>,
    fit_mode: Option<FitMode>,
    edit_on: Option<EditOn>,
    pub(crate) shell: ShellRegistry,
    changed: bool,
}

impl ConfigSources {
    pub(crate) fn is_changed(&self) -> bool {
        self.changed
    }

    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub(crate) fn clear_changed(&mut self) {
        self.changed = false;
    }

    pub(crate) fn set_grid_config(&mut self, config: Option<GridConfig>) {
        self.grid_config = config;
        self.changed = true;
    }

    pub(crate) fn set_columns(&mut self, columns: Option<ColumnsSource>) {
        self.columns = columns;
        self.changed = true;
    }

    pub(crate) fn structural(&self) -> &[ColumnConfig] {
        &self.structural
    }

    pub(crate) fn set_structural(&mut self, columns: Vec<ColumnConfig>) {
        self.structural = columns;
        self.changed = true;
    }

    pub(crate) fn set_fit_mode(&mut self, mode: Option<FitMode>) {
        self.fit_mode = mode;
        self.changed = true;
    }

    pub(crate) fn set_edit_on(&mut self, edit_on: Option<EditOn>) {
        self.edit_on = edit_on;
        self.changed = true;
    }

    pub(crate) fn register_header_content(&mut self, entry: HeaderContent) {
        self.shell.header_contents.insert(entry.id.clone(), entry);
        self.changed = true;
    }

    pub(crate) fn unregister_header_content(&mut self, id: &str) -> bool {
        let removed = self.shell.header_contents.shift_remove(id).is_some();
        self.changed |= removed;
        removed
    }

    pub(crate) fn register_tool_panel(&mut self, panel: ToolPanel) {
        self.shell.tool_panels.insert(panel.id.clone(), panel);
        self.changed = true;
    }

    pub(crate) fn unregister_tool_panel(&mut self, id: &str) -> bool {
        let removed = self.shell.tool_panels.shift_remove(id).is_some();
        self.changed |= removed;
        removed
    }

    pub(crate) fn register_toolbar_button(&mut self, button: ToolbarButton) {
        self.shell.toolbar_buttons.insert(button.id.clone(), button);
        self.changed = true;
    }

    pub(crate) fn unregister_toolbar_button(&mut self, id: &str) -> bool {
        let removed = self.shell.toolbar_buttons.shift_remove(id).is_some();
        self.changed |= removed;
        removed
    }

    /// Collects every source into one config. Shell registrations are merged separately.
    pub(crate) fn collect(&self) -> GridConfig {
        let mut config = self.grid_config.clone().unwrap_or_default();
        let explicit = self
            .columns
            .as_ref()
            .map(ColumnsSource::to_columns)
            .unwrap_or_default();
        config.columns = merge_columns(&[
            explicit.as_slice(),
            config.columns.as_slice(),
            self.structural.as_slice(),
        ]);
        if self.fit_mode.is_some() {
            config.fit_mode = self.fit_mode;
        }
        if self.edit_on.is_some() {
            config.edit_on = self.edit_on;
        }
        config
    }
}

/// Merges column layers by field, highest precedence first.
///
/// A column takes each property from the highest layer that sets it. Columns of higher layers
/// come first; columns only known to lower layers follow in their own order.
pub(crate) fn merge_columns(layers: &[&[ColumnConfig]]) -> Vec<ColumnConfig> {
    let mut merged: IndexMap<String, ColumnConfig> = IndexMap::new();
    for layer in layers {
        for column in layer.iter() {
            if column.field.is_empty() {
                tracing::debug!(target: "datagrid::config", "skipping column without a field");
                continue;
            }
            match merged.get_mut(&column.field) {
                Some(existing) => existing.fill_from(column),
                None => {
                    merged.insert(column.field.clone(), column.clone());
                }
            }
        }
    }
    merged.into_values().collect()
}
