use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CellTemplate, GridRow};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSort {
    pub direction: SortDirection,
    #[serde(default)]
    pub priority: u32,
}

/// How column widths are resolved when a column does not declare one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FitMode {
    #[default]
    Stretch,
    Fixed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditOn {
    Click,
    #[default]
    DoubleClick,
    Manual,
}

/// Produces cell text from the cell value and its row.
#[derive(Clone)]
pub struct CellRenderer(Arc<dyn Fn(Option<&Value>, &dyn GridRow) -> String + Send + Sync>);

impl CellRenderer {
    pub fn new(f: impl Fn(Option<&Value>, &dyn GridRow) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn render(&self, value: Option<&Value>, row: &dyn GridRow) -> String {
        (self.0)(value, row)
    }
}

/// Converts an edited input into the value to store, or rejects it.
#[derive(Clone)]
pub struct CellEditor(Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>);

impl CellEditor {
    pub fn new(f: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn commit(&self, input: &Value) -> Option<Value> {
        (self.0)(input)
    }
}

macro_rules! hook_impls {
    ($($ty:ident),*) => {$(
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($ty))
            }
        }
    )*};
}

hook_impls!(CellRenderer, CellEditor);

/// One column of the grid.
///
/// Unset options stay `None` until the merge pass fills defaults, so a column present in
/// several sources can take each property from the source that actually sets it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_position: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    /// Initial sort declared by configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<ColumnSort>,
    /// Inline cell template source, compiled during merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(skip)]
    pub compiled_template: Option<CellTemplate>,
    #[serde(skip)]
    pub renderer: Option<CellRenderer>,
    #[serde(skip)]
    pub editor: Option<CellEditor>,

    /// Free-form metadata owned by plugins.
    #[serde(flatten)]
    pub meta: IndexMap<String, Value>,
}

impl ColumnConfig {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = Some(min_width);
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = Some(resizable);
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn with_lock_position(mut self, lock: bool) -> Self {
        self.lock_position = Some(lock);
        self
    }

    pub fn with_lock_visible(mut self, lock: bool) -> Self {
        self.lock_visible = Some(lock);
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn with_sort(mut self, direction: SortDirection, priority: u32) -> Self {
        self.sort = Some(ColumnSort {
            direction,
            priority,
        });
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_renderer(mut self, renderer: CellRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_editor(mut self, editor: CellEditor) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden.unwrap_or(false)
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable.unwrap_or(true)
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable.unwrap_or(true)
    }

    pub fn is_position_locked(&self) -> bool {
        self.lock_position.unwrap_or(false)
    }

    pub fn is_visibility_locked(&self) -> bool {
        self.lock_visible.unwrap_or(false)
    }

    pub fn is_editable(&self) -> bool {
        self.editable.unwrap_or(false)
    }

    pub fn header_text(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.field)
    }

    /// Validates an edit through the column's editor. Non-editable columns reject every edit;
    /// editable columns without an editor accept the input as is.
    pub fn commit_edit(&self, input: &Value) -> Option<Value> {
        if !self.is_editable() {
            return None;
        }
        match &self.editor {
            Some(editor) => editor.commit(input),
            None => Some(input.clone()),
        }
    }

    /// Fills every property this column leaves unset from `lower`.
    pub(crate) fn fill_from(&mut self, lower: &ColumnConfig) {
        macro_rules! fill {
            ($($name:ident),*) => {$(
                if self.$name.is_none() {
                    self.$name = lower.$name.clone();
                }
            )*};
        }
        fill!(
            header,
            width,
            min_width,
            sortable,
            resizable,
            hidden,
            lock_position,
            lock_visible,
            editable,
            sort,
            template,
            renderer,
            editor
        );
        for (k, v) in &lower.meta {
            self.meta.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}
