use serde_json::Value;

use crate::GridRow;
use crate::render::cell_text;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Literal(String),
    Value,
    RowField(String),
}

/// A compiled inline cell template.
///
/// Supports `{{value}}` (the cell value) and `{{row.<field>}}` (another field of the same row).
/// Anything else, including an unterminated `{{`, is kept as literal text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellTemplate {
    parts: Vec<Part>,
}

impl CellTemplate {
    pub fn compile(source: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                break;
            };
            literal.push_str(&rest[..open]);
            let tag = after[..close].trim();
            let part = if tag == "value" {
                Some(Part::Value)
            } else {
                tag.strip_prefix("row.")
                    .filter(|f| !f.is_empty())
                    .map(|f| Part::RowField(f.to_owned()))
            };
            match part {
                Some(part) => {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(part);
                }
                None => literal.push_str(&rest[open..open + 2 + close + 2]),
            }
            rest = &after[close + 2..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }
        Self { parts }
    }

    /// True when the template contains no substitutions.
    pub fn is_literal(&self) -> bool {
        self.parts.iter().all(|p| matches!(p, Part::Literal(_)))
    }

    pub fn render(&self, value: Option<&Value>, row: &dyn GridRow) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Value => out.push_str(&cell_text(value)),
                Part::RowField(field) => out.push_str(&cell_text(row.field_value(field).as_ref())),
            }
        }
        out
    }
}
