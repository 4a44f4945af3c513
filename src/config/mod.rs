mod manager;
mod shell;
mod sources;
mod state;

pub use manager::{ConfigManager, SortModel};
pub use shell::{HeaderContent, ShellConfig, ToolPanel, ToolbarButton};
pub(crate) use shell::ShellRegistry;
pub use sources::ColumnsSource;
pub(crate) use sources::ConfigSources;
pub use state::{ColumnState, GridState};

use serde::{Deserialize, Serialize};

use crate::{ColumnConfig, EditOn, FitMode};

pub(crate) const MIN_ROW_ANIMATION_MS: u64 = 200;
pub(crate) const MAX_ROW_ANIMATION_MS: u64 = 500;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationMode {
    #[default]
    On,
    /// Row animations are skipped; `animate_row` reports failure.
    Off,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationConfig {
    #[serde(default)]
    pub mode: AnimationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_duration_ms: Option<u64>,
}

/// The canonical grid description produced by merging every configuration source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_mode: Option<FitMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_on: Option<EditOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationConfig>,
    #[serde(default)]
    pub shell: ShellConfig,
}

impl GridConfig {
    pub fn column(&self, field: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn column_index(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field == field)
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode.unwrap_or_default()
    }

    pub fn edit_on(&self) -> EditOn {
        self.edit_on.unwrap_or_default()
    }

    /// Resolved row animation duration, or `None` when animations are off.
    pub fn row_animation_ms(&self) -> Option<u64> {
        let animation = self.animation.unwrap_or_default();
        match animation.mode {
            AnimationMode::Off => None,
            AnimationMode::On => animation.row_duration_ms,
        }
    }
}
