use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ColumnConfig, RowAnimationKind, RowId};

/// Default text for a cell value: strings verbatim, null and missing values empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
    }
}

/// One rendered cell. Plugins decorate it in `after_cell_render`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedCell {
    pub field: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
}

impl RenderedCell {
    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Content of one pooled row surface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowContent {
    pub cells: Vec<RenderedCell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<RowAnimationKind>,
}

impl RowContent {
    pub fn cell(&self, field: &str) -> Option<&RenderedCell> {
        self.cells.iter().find(|c| c.field == field)
    }
}

/// Passed to `after_cell_render` for every cell rendered in a frame.
pub struct CellRenderContext<'a, R> {
    pub row: &'a R,
    pub row_id: &'a RowId,
    /// Index in the display row list.
    pub row_index: usize,
    pub column: &'a ColumnConfig,
    pub column_index: usize,
    pub cell: &'a mut RenderedCell,
}

pub(crate) fn render_cell<R: crate::GridRow>(row: &R, column: &ColumnConfig) -> RenderedCell {
    let value = row.field_value(&column.field);
    let text = if let Some(renderer) = &column.renderer {
        renderer.render(value.as_ref(), row)
    } else if let Some(template) = &column.compiled_template {
        template.render(value.as_ref(), row)
    } else {
        cell_text(value.as_ref())
    };
    RenderedCell {
        field: column.field.clone(),
        text,
        ..RenderedCell::default()
    }
}
