use std::fmt;
use std::sync::Arc;

use datagrid_scroll::MomentumConfig;

use crate::PluginEvent;

/// Receives every plugin event emitted on the grid, after the grid's own bookkeeping.
pub type HostEventCallback = Arc<dyn Fn(&PluginEvent) + Send + Sync>;

/// Grid-level tuning. Every threshold here is a budget, not a contract.
#[derive(Clone)]
pub struct GridOptions {
    /// Row height used until a row is measured, unless the config sets `rowHeight`.
    pub default_row_height: u32,
    /// Lower bound for every row height; bounds the window size.
    pub min_row_height: u32,
    pub overscan: usize,
    /// Width given to columns without one under [`FitMode::Fixed`](crate::FitMode::Fixed).
    pub fixed_column_width: u32,
    pub state_debounce_ms: u64,
    pub structural_debounce_ms: u64,
    pub scroll_reset_delay_ms: u64,
    /// Row animation duration when the config does not set one.
    pub row_animation_ms: u64,
    pub momentum: MomentumConfig,
    pub on_event: Option<HostEventCallback>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            default_row_height: 28,
            min_row_height: 20,
            overscan: 8,
            fixed_column_width: 80,
            state_debounce_ms: 100,
            structural_debounce_ms: 50,
            scroll_reset_delay_ms: 150,
            row_animation_ms: 300,
            momentum: MomentumConfig::default(),
            on_event: None,
        }
    }
}

impl GridOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_row_height(mut self, height: u32) -> Self {
        self.default_row_height = height.max(1);
        self
    }

    pub fn with_min_row_height(mut self, height: u32) -> Self {
        self.min_row_height = height.max(1);
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_fixed_column_width(mut self, width: u32) -> Self {
        self.fixed_column_width = width;
        self
    }

    pub fn with_state_debounce_ms(mut self, delay_ms: u64) -> Self {
        self.state_debounce_ms = delay_ms;
        self
    }

    pub fn with_structural_debounce_ms(mut self, delay_ms: u64) -> Self {
        self.structural_debounce_ms = delay_ms;
        self
    }

    pub fn with_scroll_reset_delay_ms(mut self, delay_ms: u64) -> Self {
        self.scroll_reset_delay_ms = delay_ms;
        self
    }

    pub fn with_row_animation_ms(mut self, duration_ms: u64) -> Self {
        self.row_animation_ms = duration_ms;
        self
    }

    pub fn with_momentum(mut self, momentum: MomentumConfig) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_on_event(mut self, f: impl Fn(&PluginEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for GridOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridOptions")
            .field("default_row_height", &self.default_row_height)
            .field("min_row_height", &self.min_row_height)
            .field("overscan", &self.overscan)
            .field("fixed_column_width", &self.fixed_column_width)
            .field("state_debounce_ms", &self.state_debounce_ms)
            .field("structural_debounce_ms", &self.structural_debounce_ms)
            .field("scroll_reset_delay_ms", &self.scroll_reset_delay_ms)
            .field("row_animation_ms", &self.row_animation_ms)
            .field("momentum", &self.momentum)
            .finish_non_exhaustive()
    }
}
