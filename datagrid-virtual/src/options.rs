use alloc::sync::Arc;

use crate::rows::VirtualRows;
use crate::{IndexKey, ViewportRect};

/// Fired after a coalesced state change. The second argument is `is_scrolling`.
pub type OnChangeCallback<K> = Arc<dyn Fn(&VirtualRows<K>, bool) + Send + Sync>;

/// Decides whether a height change of row `index` (starting at `offset`) by `delta` should shift
/// the scroll offset. The default compensates only for rows starting above the scroll offset.
pub type CompensateCallback<K> =
    Arc<dyn Fn(&VirtualRows<K>, usize, u64, i64) -> bool + Send + Sync>;

/// Configuration for [`VirtualRows`].
///
/// Closures live in `Arc`s so callers can tweak a few fields and call
/// [`VirtualRows::set_options`] without reallocating them. Replacing `estimate_height` or
/// `row_key` with a different `Arc` rebuilds the height model from the keyed cache.
pub struct VirtualRowsOptions<K = IndexKey> {
    pub count: usize,
    pub estimate_height: Arc<dyn Fn(usize) -> u32 + Send + Sync>,
    pub row_key: Arc<dyn Fn(usize) -> K + Send + Sync>,

    /// Rows materialized beyond each edge of the viewport.
    pub overscan: usize,
    /// Lower bound applied to every estimate and measurement. Window size is bounded by
    /// `ceil(viewport / min_row_height) + 1 + 2 * overscan`.
    pub min_row_height: u32,

    pub padding_start: u32,
    pub padding_end: u32,

    pub initial_viewport: Option<ViewportRect>,
    pub initial_offset: u64,

    pub on_change: Option<OnChangeCallback<K>>,
    pub should_compensate: Option<CompensateCallback<K>>,

    /// Fallback delay for resetting `is_scrolling` after the last scroll event.
    pub is_scrolling_reset_delay_ms: u64,
}

impl<K> Clone for VirtualRowsOptions<K> {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            estimate_height: Arc::clone(&self.estimate_height),
            row_key: Arc::clone(&self.row_key),
            overscan: self.overscan,
            min_row_height: self.min_row_height,
            padding_start: self.padding_start,
            padding_end: self.padding_end,
            initial_viewport: self.initial_viewport,
            initial_offset: self.initial_offset,
            on_change: self.on_change.clone(),
            should_compensate: self.should_compensate.clone(),
            is_scrolling_reset_delay_ms: self.is_scrolling_reset_delay_ms,
        }
    }
}

impl VirtualRowsOptions<IndexKey> {
    /// Options for rows keyed by their index.
    pub fn new(
        count: usize,
        estimate_height: impl Fn(usize) -> u32 + Send + Sync + 'static,
    ) -> Self {
        Self::new_keyed(count, estimate_height, |i| i as u64)
    }
}

impl<K> VirtualRowsOptions<K> {
    /// Options with a custom row identity. Measured heights are cached per key, so they follow
    /// rows across reordering and data replacement.
    pub fn new_keyed(
        count: usize,
        estimate_height: impl Fn(usize) -> u32 + Send + Sync + 'static,
        row_key: impl Fn(usize) -> K + Send + Sync + 'static,
    ) -> Self {
        Self {
            count,
            estimate_height: Arc::new(estimate_height),
            row_key: Arc::new(row_key),
            overscan: 1,
            min_row_height: 1,
            padding_start: 0,
            padding_end: 0,
            initial_viewport: None,
            initial_offset: 0,
            on_change: None,
            should_compensate: None,
            is_scrolling_reset_delay_ms: 150,
        }
    }

    pub fn with_row_key(mut self, row_key: impl Fn(usize) -> K + Send + Sync + 'static) -> Self {
        self.row_key = Arc::new(row_key);
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_min_row_height(mut self, min_row_height: u32) -> Self {
        self.min_row_height = min_row_height.max(1);
        self
    }

    pub fn with_padding(mut self, padding_start: u32, padding_end: u32) -> Self {
        self.padding_start = padding_start;
        self.padding_end = padding_end;
        self
    }

    pub fn with_initial_viewport(mut self, viewport: Option<ViewportRect>) -> Self {
        self.initial_viewport = viewport;
        self
    }

    pub fn with_initial_offset(mut self, offset: u64) -> Self {
        self.initial_offset = offset;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&VirtualRows<K>, bool) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_should_compensate(
        mut self,
        f: Option<impl Fn(&VirtualRows<K>, usize, u64, i64) -> bool + Send + Sync + 'static>,
    ) -> Self {
        self.should_compensate = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_is_scrolling_reset_delay_ms(mut self, delay_ms: u64) -> Self {
        self.is_scrolling_reset_delay_ms = delay_ms;
        self
    }
}

impl<K> core::fmt::Debug for VirtualRowsOptions<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualRowsOptions")
            .field("count", &self.count)
            .field("overscan", &self.overscan)
            .field("min_row_height", &self.min_row_height)
            .field("padding_start", &self.padding_start)
            .field("padding_end", &self.padding_end)
            .field("initial_viewport", &self.initial_viewport)
            .field("initial_offset", &self.initial_offset)
            .field(
                "is_scrolling_reset_delay_ms",
                &self.is_scrolling_reset_delay_ms,
            )
            .finish_non_exhaustive()
    }
}
