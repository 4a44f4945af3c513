use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use super::{
    AnimationMode, ColumnState, ColumnsSource, ConfigSources, GridConfig, GridState,
    HeaderContent, MAX_ROW_ANIMATION_MS, MIN_ROW_ANIMATION_MS, ToolPanel, ToolbarButton,
};
use crate::{
    CellTemplate, ColumnConfig, ColumnSort, Debouncer, EditOn, FitMode, GridOptions, GridRow,
    SortDirection,
};

/// The single active sort column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortModel {
    pub field: String,
    pub direction: SortDirection,
}

/// Owns the original and effective configuration layers.
///
/// The original layer is rebuilt from the sources only by [`merge`](Self::merge) and is never
/// mutated afterwards. The effective layer is an owned clone of it; every runtime mutation
/// lands there and [`reset_state`](Self::reset_state) replaces it with a fresh clone.
#[derive(Debug)]
pub struct ConfigManager {
    sources: ConfigSources,
    original: Option<Arc<GridConfig>>,
    effective: GridConfig,
    revision: u64,
    sort: Option<SortModel>,
    rendered_widths: HashMap<String, u32>,

    state_changed: bool,
    state_notify: Debouncer,
    structural_watch: Debouncer,
    observed_structural: Option<Vec<ColumnConfig>>,

    default_row_height: u32,
    fixed_column_width: u32,
    row_animation_ms: u64,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(&GridOptions::default())
    }
}

impl ConfigManager {
    pub fn new(options: &GridOptions) -> Self {
        Self {
            sources: ConfigSources::default(),
            original: None,
            effective: GridConfig::default(),
            revision: 0,
            sort: None,
            rendered_widths: HashMap::new(),
            state_changed: false,
            state_notify: Debouncer::new(options.state_debounce_ms),
            structural_watch: Debouncer::new(options.structural_debounce_ms),
            observed_structural: None,
            default_row_height: options.default_row_height,
            fixed_column_width: options.fixed_column_width,
            row_animation_ms: options.row_animation_ms,
        }
    }

    pub fn set_grid_config(&mut self, config: GridConfig) {
        self.sources.set_grid_config(Some(config));
    }

    pub fn clear_grid_config(&mut self) {
        self.sources.set_grid_config(None);
    }

    pub fn set_columns(&mut self, columns: impl Into<ColumnsSource>) {
        self.sources.set_columns(Some(columns.into()));
    }

    pub fn clear_columns(&mut self) {
        self.sources.set_columns(None);
    }

    pub fn set_structural_columns(&mut self, columns: Vec<ColumnConfig>) {
        self.sources.set_structural(columns);
    }

    pub fn set_fit_mode(&mut self, mode: FitMode) {
        self.sources.set_fit_mode(Some(mode));
    }

    pub fn set_edit_on(&mut self, edit_on: EditOn) {
        self.sources.set_edit_on(Some(edit_on));
    }

    pub fn register_header_content(&mut self, content: HeaderContent) {
        self.sources.register_header_content(content);
    }

    pub fn unregister_header_content(&mut self, id: &str) -> bool {
        self.sources.unregister_header_content(id)
    }

    pub fn register_tool_panel(&mut self, panel: ToolPanel) {
        self.sources.register_tool_panel(panel);
    }

    pub fn unregister_tool_panel(&mut self, id: &str) -> bool {
        self.sources.unregister_tool_panel(id)
    }

    pub fn register_toolbar_button(&mut self, button: ToolbarButton) {
        self.sources.register_toolbar_button(button);
    }

    pub fn unregister_toolbar_button(&mut self, id: &str) -> bool {
        self.sources.unregister_toolbar_button(id)
    }

    pub fn sources_changed(&self) -> bool {
        self.sources.is_changed()
    }

    /// Marks the sources changed so the next merge rebuilds both layers.
    pub fn invalidate(&mut self) {
        self.sources.mark_changed();
    }

    /// Records structural column declarations seen by a host watcher.
    ///
    /// Bursts coalesce: the declarations only become a source once `structural_debounce_ms`
    /// passed without another observation; see [`poll_structural`](Self::poll_structural).
    pub fn observe_structural_columns(&mut self, columns: Vec<ColumnConfig>, now_ms: u64) {
        if self.observed_structural.is_none() && columns == self.sources.structural() {
            return;
        }
        self.observed_structural = Some(columns);
        self.structural_watch.schedule(now_ms);
    }

    /// Applies settled structural declarations. Returns `true` when the sources changed.
    pub fn poll_structural(&mut self, now_ms: u64) -> bool {
        if !self.structural_watch.poll(now_ms) {
            return false;
        }
        match self.observed_structural.take() {
            Some(columns) if columns != self.sources.structural() => {
                debug!(
                    target: "datagrid::config",
                    count = columns.len(),
                    "structural columns changed"
                );
                self.sources.set_structural(columns);
                true
            }
            _ => false,
        }
    }

    /// Rebuilds the original and effective layers when the sources changed.
    ///
    /// `first_row` is only consulted when no source declares a column. Returns `false` (and
    /// leaves both layers untouched) when nothing needed rebuilding.
    pub fn merge(&mut self, first_row: Option<&dyn GridRow>) -> bool {
        let resolved = self.original.is_some()
            && (!self.effective.columns.is_empty() || first_row.is_none());
        if !self.sources.is_changed() && resolved {
            return false;
        }

        let mut config = self.sources.collect();
        if config.columns.is_empty() {
            if let Some(row) = first_row {
                config.columns = row.field_names().into_iter().map(ColumnConfig::new).collect();
                debug!(
                    target: "datagrid::config",
                    count = config.columns.len(),
                    "inferred columns from first row"
                );
            }
        }
        for column in &mut config.columns {
            column.sortable.get_or_insert(true);
            column.resizable.get_or_insert(true);
            column.compiled_template = column.template.as_deref().map(CellTemplate::compile);
        }
        config.shell = self.sources.shell.merge(&config.shell);

        let original = Arc::new(config);
        self.effective = GridConfig::clone(&original);
        self.original = Some(original);
        self.apply_derived();
        self.sort = initial_sort(&self.effective.columns);
        let effective = &self.effective;
        self.rendered_widths
            .retain(|field, _| effective.column(field).is_some());
        self.sources.clear_changed();
        self.revision += 1;

        debug!(
            target: "datagrid::config",
            revision = self.revision,
            columns = self.effective.columns.len(),
            "merged configuration"
        );
        true
    }

    fn apply_derived(&mut self) {
        let config = &mut self.effective;
        config.row_height.get_or_insert(self.default_row_height);
        if config.fit_mode() == FitMode::Fixed {
            for column in &mut config.columns {
                column.width.get_or_insert(self.fixed_column_width);
            }
        }
        let mut animation = config.animation.unwrap_or_default();
        animation.row_duration_ms = match animation.mode {
            AnimationMode::Off => None,
            AnimationMode::On => Some(
                animation
                    .row_duration_ms
                    .unwrap_or(self.row_animation_ms)
                    .clamp(MIN_ROW_ANIMATION_MS, MAX_ROW_ANIMATION_MS),
            ),
        };
        config.animation = Some(animation);
    }

    /// Number of merges that rebuilt the layers.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The immutable baseline, once a merge ran.
    pub fn original(&self) -> Option<&Arc<GridConfig>> {
        self.original.as_ref()
    }

    pub fn effective(&self) -> &GridConfig {
        &self.effective
    }

    pub fn columns(&self) -> &[ColumnConfig] {
        &self.effective.columns
    }

    pub fn column(&self, field: &str) -> Option<&ColumnConfig> {
        self.effective.column(field)
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnConfig> {
        self.effective.columns.iter().filter(|c| c.is_visible())
    }

    pub fn visible_fields(&self) -> Vec<String> {
        self.visible_columns().map(|c| c.field.clone()).collect()
    }

    pub fn row_height(&self) -> u32 {
        self.effective.row_height.unwrap_or(self.default_row_height)
    }

    pub fn sort_model(&self) -> Option<&SortModel> {
        self.sort.as_ref()
    }

    pub fn rendered_width(&self, field: &str) -> Option<u32> {
        self.rendered_widths.get(field).copied()
    }

    /// Records the width the host actually rendered for a column.
    pub fn report_rendered_width(&mut self, field: &str, width: u32) {
        if self.effective.column(field).is_some() {
            self.rendered_widths.insert(field.to_owned(), width);
        }
    }

    /// Shows or hides a column. Refuses to hide a visibility-locked column or the last visible
    /// one; returns `false` without touching state when refused or when nothing changes.
    pub fn set_column_visible(&mut self, field: &str, visible: bool) -> bool {
        let Some(index) = self.effective.column_index(field) else {
            return false;
        };
        let column = &self.effective.columns[index];
        if column.is_visible() == visible {
            return false;
        }
        if !visible {
            if column.is_visibility_locked() {
                debug!(target: "datagrid::config", field, "column visibility is locked");
                return false;
            }
            if self.visible_columns().count() <= 1 {
                debug!(
                    target: "datagrid::config",
                    field,
                    "refusing to hide the last visible column"
                );
                return false;
            }
        }
        self.effective.columns[index].hidden = Some(!visible);
        self.mark_state_changed();
        true
    }

    pub fn set_column_width(&mut self, field: &str, width: u32) -> bool {
        let Some(index) = self.effective.column_index(field) else {
            return false;
        };
        let column = &mut self.effective.columns[index];
        if !column.is_resizable() {
            return false;
        }
        let width = width.max(column.min_width.unwrap_or(0)).max(1);
        if column.width == Some(width) && !self.rendered_widths.contains_key(field) {
            return false;
        }
        column.width = Some(width);
        self.rendered_widths.remove(field);
        trace!(target: "datagrid::config", field, width, "column width");
        self.mark_state_changed();
        true
    }

    /// Moves a column to `to` (clamped). Position-locked columns neither move nor get displaced.
    pub fn move_column(&mut self, field: &str, to: usize) -> bool {
        let columns = &mut self.effective.columns;
        let Some(from) = columns.iter().position(|c| c.field == field) else {
            return false;
        };
        let to = to.min(columns.len() - 1);
        if from == to || columns[from].is_position_locked() || columns[to].is_position_locked() {
            return false;
        }
        let column = columns.remove(from);
        columns.insert(to, column);
        self.mark_state_changed();
        true
    }

    /// Sets (or with `None`, clears) the sort on `field`. Replaces any other active sort.
    pub fn set_sort(&mut self, field: &str, direction: Option<SortDirection>) -> bool {
        let Some(column) = self.effective.column(field) else {
            return false;
        };
        if !column.is_sortable() {
            return false;
        }
        let next = match direction {
            Some(direction) => Some(SortModel {
                field: field.to_owned(),
                direction,
            }),
            None if self.sort.as_ref().is_some_and(|s| s.field == field) => None,
            None => return false,
        };
        if next == self.sort {
            return false;
        }
        self.sort = next;
        self.mark_state_changed();
        true
    }

    /// Cycles `field` through ascending, descending and unsorted. Returns the new direction.
    pub fn toggle_sort(&mut self, field: &str) -> Option<SortDirection> {
        let current = self
            .sort
            .as_ref()
            .filter(|s| s.field == field)
            .map(|s| s.direction);
        let next = match current {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        };
        if self.set_sort(field, next) { next } else { current }
    }

    pub fn clear_sort(&mut self) -> bool {
        if self.sort.take().is_some() {
            self.mark_state_changed();
            return true;
        }
        false
    }

    pub fn set_column_meta(&mut self, field: &str, key: &str, value: Value) -> bool {
        self.update_column(field, |c| {
            c.meta.insert(key.to_owned(), value);
        })
    }

    /// Mutates a column of the effective layer directly, bypassing every guard.
    pub fn update_column(&mut self, field: &str, f: impl FnOnce(&mut ColumnConfig)) -> bool {
        let Some(index) = self.effective.column_index(field) else {
            return false;
        };
        f(&mut self.effective.columns[index]);
        self.mark_state_changed();
        true
    }

    /// Captures the runtime state of every column. `extend` appends plugin fields.
    pub fn collect_state(
        &self,
        mut extend: impl FnMut(&ColumnConfig, &mut ColumnState),
    ) -> GridState {
        let columns = self
            .effective
            .columns
            .iter()
            .enumerate()
            .map(|(order, column)| {
                let mut state = ColumnState {
                    field: column.field.clone(),
                    order,
                    visible: column.is_visible(),
                    width: self.rendered_width(&column.field).or(column.width),
                    sort: self
                        .sort
                        .as_ref()
                        .filter(|s| s.field == column.field)
                        .map(|s| ColumnSort {
                            direction: s.direction,
                            priority: 0,
                        }),
                    extra: IndexMap::new(),
                };
                extend(column, &mut state);
                state
            })
            .collect();
        GridState { columns }
    }

    /// Applies a captured state. Columns missing from `state` keep their settings and sink to
    /// the end in their current relative order; only the primary sort is restored.
    pub fn apply_state(
        &mut self,
        state: &GridState,
        mut apply: impl FnMut(&mut ColumnConfig, &ColumnState),
    ) {
        let by_field: HashMap<&str, &ColumnState> = state
            .columns
            .iter()
            .map(|s| (s.field.as_str(), s))
            .collect();

        for column in &mut self.effective.columns {
            let Some(s) = by_field.get(column.field.as_str()) else {
                continue;
            };
            if let Some(width) = s.width {
                column.width = Some(width);
                self.rendered_widths.remove(&column.field);
            }
            column.hidden = Some(!s.visible);
        }
        self.effective
            .columns
            .sort_by_key(|c| by_field.get(c.field.as_str()).map_or(usize::MAX, |s| s.order));

        let primary = state
            .columns
            .iter()
            .filter_map(|s| s.sort.map(|sort| (s, sort)))
            .min_by_key(|(_, sort)| sort.priority);
        self.sort = primary.and_then(|(s, sort)| {
            let column = self.effective.column(&s.field)?;
            column.is_sortable().then(|| SortModel {
                field: s.field.clone(),
                direction: sort.direction,
            })
        });

        for column in &mut self.effective.columns {
            if let Some(s) = by_field.get(column.field.as_str()) {
                apply(column, s);
            }
        }
        debug!(target: "datagrid::config", columns = state.columns.len(), "applied column state");
        self.mark_state_changed();
    }

    /// Replaces the effective layer with a fresh clone of the original one. `reset` lets
    /// plugins clear their per-column contributions.
    pub fn reset_state(&mut self, mut reset: impl FnMut(&mut ColumnConfig)) {
        let Some(original) = self.original.clone() else {
            return;
        };
        self.effective = GridConfig::clone(&original);
        self.apply_derived();
        self.rendered_widths.clear();
        self.sort = initial_sort(&self.effective.columns);
        for column in &mut self.effective.columns {
            reset(column);
        }
        debug!(target: "datagrid::config", "reset column state");
        self.mark_state_changed();
    }

    pub fn mark_state_changed(&mut self) {
        self.state_changed = true;
    }

    pub fn has_pending_state_change(&self) -> bool {
        self.state_changed || self.state_notify.is_pending()
    }

    /// Debounces state-change notifications: returns `true` once, `state_debounce_ms` after
    /// the last poll that saw a change.
    pub fn poll_state_change(&mut self, now_ms: u64) -> bool {
        if std::mem::take(&mut self.state_changed) {
            self.state_notify.schedule(now_ms);
        }
        self.state_notify.poll(now_ms)
    }
}

fn initial_sort(columns: &[ColumnConfig]) -> Option<SortModel> {
    columns
        .iter()
        .filter(|c| c.is_sortable())
        .filter_map(|c| c.sort.map(|s| (c, s)))
        .min_by_key(|(_, s)| s.priority)
        .map(|(c, s)| SortModel {
            field: c.field.clone(),
            direction: s.direction,
        })
}
