use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::cmp;

use crate::key::{KeyMap, RowKey};
use crate::offsets::OffsetIndex;
use crate::{
    Align, FrameState, IndexKey, RowRange, ScrollDirection, ScrollState, ViewportRect,
    ViewportState, VirtualRowsOptions, VirtualWindow, WindowRow,
};

/// Variable-height row virtualization state for one scrollable grid body.
///
/// The type holds no UI objects. The host feeds it viewport geometry, scroll offsets and
/// measured row heights, and reads back the window of rows to materialize.
#[derive(Clone, Debug)]
pub struct VirtualRows<K = IndexKey> {
    options: VirtualRowsOptions<K>,
    viewport: ViewportRect,
    scroll_offset: u64,
    is_scrolling: bool,
    scroll_direction: Option<ScrollDirection>,
    last_scroll_event_ms: Option<u64>,

    heights: Vec<u32>,
    measured: Vec<bool>,
    offsets: OffsetIndex,
    key_heights: KeyMap<K, u32>,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl<K: RowKey> VirtualRows<K> {
    pub fn new(options: VirtualRowsOptions<K>) -> Self {
        let viewport = options.initial_viewport.unwrap_or_default();
        vdebug!(
            count = options.count,
            overscan = options.overscan,
            min_row_height = options.min_row_height,
            "VirtualRows::new"
        );
        let mut v = Self {
            viewport,
            scroll_offset: options.initial_offset,
            is_scrolling: false,
            scroll_direction: None,
            last_scroll_event_ms: None,
            heights: Vec::new(),
            measured: Vec::new(),
            offsets: OffsetIndex::default(),
            key_heights: KeyMap::new(),
            options,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        };
        v.rebuild_heights();
        v
    }

    pub fn options(&self) -> &VirtualRowsOptions<K> {
        &self.options
    }

    pub fn set_options(&mut self, options: VirtualRowsOptions<K>) {
        let rebuild = options.count != self.options.count
            || options.min_row_height != self.options.min_row_height
            || !Arc::ptr_eq(&options.estimate_height, &self.options.estimate_height)
            || !Arc::ptr_eq(&options.row_key, &self.options.row_key);
        self.options = options;
        vtrace!(
            count = self.options.count,
            overscan = self.options.overscan,
            rebuild,
            "VirtualRows::set_options"
        );
        if rebuild {
            self.rebuild_heights();
        }
        self.notify();
    }

    /// Clones the options, applies `f`, then delegates to [`Self::set_options`].
    pub fn update_options(&mut self, f: impl FnOnce(&mut VirtualRowsOptions<K>)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self, self.is_scrolling);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Coalesces every change made inside `f` into a single `on_change` notification.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let next = self.notify_depth.get().saturating_sub(1);
        self.notify_depth.set(next);
        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    pub fn count(&self) -> usize {
        self.options.count
    }

    pub fn set_count(&mut self, count: usize) {
        if self.options.count == count {
            return;
        }
        self.options.count = count;
        self.rebuild_heights();
        self.notify();
    }

    /// Replaces the row count and identity mapping in one step (data replacement).
    ///
    /// Heights of rows whose key was measured before are restored from the cache.
    pub fn set_row_keys(
        &mut self,
        count: usize,
        row_key: impl Fn(usize) -> K + Send + Sync + 'static,
    ) {
        self.options.count = count;
        self.options.row_key = Arc::new(row_key);
        self.rebuild_heights();
        self.notify();
    }

    /// Rebuilds per-index heights after rows were reordered while the key mapping stayed the same.
    pub fn sync_row_keys(&mut self) {
        self.rebuild_heights();
        self.notify();
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        self.options.overscan = overscan;
        self.notify();
    }

    pub fn set_padding(&mut self, padding_start: u32, padding_end: u32) {
        self.options.padding_start = padding_start;
        self.options.padding_end = padding_end;
        self.notify();
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.scroll_direction
    }

    pub fn set_is_scrolling(&mut self, is_scrolling: bool) {
        if self.is_scrolling == is_scrolling {
            return;
        }
        self.is_scrolling = is_scrolling;
        if !is_scrolling {
            self.scroll_direction = None;
            self.last_scroll_event_ms = None;
        }
        self.notify();
    }

    pub fn notify_scroll_event(&mut self, now_ms: u64) {
        self.last_scroll_event_ms = Some(now_ms);
        self.set_is_scrolling(true);
    }

    /// Resets `is_scrolling` once `is_scrolling_reset_delay_ms` passed without scroll events.
    pub fn update_scrolling(&mut self, now_ms: u64) {
        if !self.is_scrolling {
            return;
        }
        let Some(last) = self.last_scroll_event_ms else {
            return;
        };
        if now_ms.saturating_sub(last) >= self.options.is_scrolling_reset_delay_ms {
            self.set_is_scrolling(false);
        }
    }

    pub fn viewport(&self) -> ViewportRect {
        self.viewport
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport.height
    }

    pub fn set_viewport(&mut self, viewport: ViewportRect) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        self.notify();
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if self.viewport.height == height {
            return;
        }
        self.viewport.height = height;
        self.notify();
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: u64) {
        if self.scroll_offset == offset {
            return;
        }
        self.scroll_direction = match offset.cmp(&self.scroll_offset) {
            cmp::Ordering::Greater => Some(ScrollDirection::Forward),
            cmp::Ordering::Less => Some(ScrollDirection::Backward),
            cmp::Ordering::Equal => self.scroll_direction,
        };
        self.scroll_offset = offset;
        self.notify();
    }

    pub fn set_scroll_offset_clamped(&mut self, offset: u64) {
        let clamped = self.clamp_scroll_offset(offset);
        self.set_scroll_offset(clamped);
    }

    /// Applies a user scroll (wheel, drag, touch) and marks the rows as scrolling.
    pub fn apply_scroll_event(&mut self, offset: u64, now_ms: u64) {
        vtrace!(offset, now_ms, "apply_scroll_event");
        self.batch_update(|v| {
            v.set_scroll_offset_clamped(offset);
            v.notify_scroll_event(now_ms);
        });
    }

    /// Applies viewport geometry and scroll offset reported together by the host.
    pub fn apply_scroll_frame(&mut self, viewport: ViewportRect, offset: u64, now_ms: u64) {
        vtrace!(
            height = viewport.height,
            width = viewport.width,
            offset,
            now_ms,
            "apply_scroll_frame"
        );
        self.batch_update(|v| {
            v.set_viewport(viewport);
            v.set_scroll_offset_clamped(offset);
            v.notify_scroll_event(now_ms);
        });
    }

    pub fn frame_state(&self) -> FrameState {
        FrameState {
            viewport: ViewportState {
                rect: self.viewport,
            },
            scroll: ScrollState {
                offset: self.scroll_offset,
                is_scrolling: self.is_scrolling,
            },
        }
    }

    pub fn restore_frame_state(&mut self, frame: FrameState, now_ms: u64) {
        if frame.scroll.is_scrolling {
            self.apply_scroll_frame(frame.viewport.rect, frame.scroll.offset, now_ms);
            return;
        }
        self.batch_update(|v| {
            v.set_viewport(frame.viewport.rect);
            v.set_scroll_offset_clamped(frame.scroll.offset);
            v.set_is_scrolling(false);
        });
    }

    /// Records a row height without touching the scroll offset.
    pub fn measure_row(&mut self, index: usize, height: u32) {
        if index >= self.options.count {
            return;
        }
        let key = self.key_for(index);
        vtrace!(index, height, "measure_row");
        self.store_height(index, key, height);
        self.notify();
    }

    pub fn measure_many(&mut self, measurements: impl IntoIterator<Item = (usize, u32)>) {
        for (index, height) in measurements {
            if index >= self.options.count {
                continue;
            }
            let key = self.key_for(index);
            self.store_height(index, key, height);
        }
        self.notify();
    }

    /// Records a changed row height and compensates the scroll offset when the row starts above
    /// it, so content already in view does not move. Returns the applied compensation.
    pub fn resize_row(&mut self, index: usize, height: u32) -> i64 {
        if index >= self.options.count {
            return 0;
        }
        let start = self.start_of(index);
        let key = self.key_for(index);
        let delta = self.store_height(index, key, height);
        if delta == 0 {
            self.notify();
            return 0;
        }

        let compensate = match &self.options.should_compensate {
            Some(f) => f(self, index, start, delta),
            None => start < self.scroll_offset,
        };
        vtrace!(index, height, delta, compensate, "resize_row");

        let applied = if compensate {
            self.scroll_offset = shift(self.scroll_offset, delta);
            delta
        } else {
            0
        };
        self.notify();
        applied
    }

    pub fn resize_many(&mut self, measurements: impl IntoIterator<Item = (usize, u32)>) -> i64 {
        let mut applied = 0i64;
        self.batch_update(|v| {
            for (index, height) in measurements {
                applied += v.resize_row(index, height);
            }
        });
        applied
    }

    fn store_height(&mut self, index: usize, key: K, height: u32) -> i64 {
        let height = height.max(self.options.min_row_height);
        let cur = self.heights[index];
        self.measured[index] = true;
        self.key_heights.insert(key, height);
        if cur == height {
            return 0;
        }
        self.heights[index] = height;
        let delta = height as i64 - cur as i64;
        self.offsets.add(index, delta);
        delta
    }

    /// Drops every cached measurement; heights fall back to estimates.
    pub fn reset_measurements(&mut self) {
        self.key_heights.clear();
        self.rebuild_heights();
        self.notify();
    }

    pub fn measurement_cache_len(&self) -> usize {
        self.key_heights.len()
    }

    pub fn export_measurement_cache(&self) -> Vec<(K, u32)> {
        self.key_heights
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    pub fn import_measurement_cache(&mut self, entries: impl IntoIterator<Item = (K, u32)>) {
        self.key_heights.clear();
        for (k, v) in entries {
            self.key_heights.insert(k, v);
        }
        vdebug!(
            entries = self.key_heights.len(),
            "import_measurement_cache"
        );
        self.rebuild_heights();
        self.notify();
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.measured.get(index).copied().unwrap_or(false)
    }

    pub fn key_for(&self, index: usize) -> K {
        (self.options.row_key)(index)
    }

    pub fn total_height(&self) -> u64 {
        (self.options.padding_start as u64)
            .saturating_add(self.offsets.total())
            .saturating_add(self.options.padding_end as u64)
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.total_height()
            .saturating_sub(self.viewport.height as u64)
    }

    pub fn clamp_scroll_offset(&self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    pub fn row_start(&self, index: usize) -> Option<u64> {
        (index < self.options.count).then(|| self.start_of(index))
    }

    pub fn row_height(&self, index: usize) -> Option<u32> {
        self.heights.get(index).copied()
    }

    pub fn row_end(&self, index: usize) -> Option<u64> {
        let start = self.row_start(index)?;
        let height = self.row_height(index)? as u64;
        Some(start.saturating_add(height))
    }

    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        self.index_at(offset)
    }

    /// Upper bound on the rows a window can hold at the current viewport height.
    pub fn max_window_rows(&self) -> usize {
        let view = self.viewport.height as usize;
        if view == 0 {
            return 0;
        }
        let min = self.options.min_row_height.max(1) as usize;
        view.div_ceil(min) + 1 + 2 * self.options.overscan
    }

    /// Rows intersecting the viewport (no overscan).
    pub fn visible_range(&self) -> RowRange {
        self.visible_range_for(self.scroll_offset, self.viewport.height)
    }

    pub fn visible_range_for(&self, scroll_offset: u64, viewport_height: u32) -> RowRange {
        let count = self.options.count;
        if count == 0 || viewport_height == 0 {
            return RowRange::EMPTY;
        }

        let view = viewport_height as u64;
        let total = self.total_height();
        let offset = scroll_offset.min(total.saturating_sub(view));
        let end = offset.saturating_add(view);

        let ps = self.options.padding_start as u64;
        if end <= ps {
            return RowRange::EMPTY;
        }
        if offset >= ps.saturating_add(self.offsets.total()) {
            return RowRange {
                start: count,
                end: count,
            };
        }

        let start = self.index_at(offset).unwrap_or(count);
        let last = self
            .index_at(end.saturating_sub(1).max(offset))
            .unwrap_or(count.saturating_sub(1));
        RowRange {
            start: start.min(count),
            end: last.saturating_add(1).min(count),
        }
    }

    /// `visible_range` widened by overscan.
    pub fn window_range(&self) -> RowRange {
        self.widen(self.visible_range())
    }

    fn widen(&self, visible: RowRange) -> RowRange {
        if visible.is_empty() {
            return visible;
        }
        let overscan = self.options.overscan;
        RowRange {
            start: visible.start.saturating_sub(overscan),
            end: cmp::min(self.options.count, visible.end.saturating_add(overscan)),
        }
    }

    /// Iterates the materialized rows in index order without allocating.
    pub fn for_each_window_row(&self, mut f: impl FnMut(WindowRow<K>)) {
        let range = self.window_range();
        if range.is_empty() {
            return;
        }
        let mut offset = self.start_of(range.start);
        for index in range.start..range.end {
            let height = self.heights[index];
            f(WindowRow {
                key: self.key_for(index),
                index,
                offset,
                height,
            });
            offset = offset.saturating_add(height as u64);
        }
    }

    pub fn window(&self) -> VirtualWindow<K> {
        let mut out = VirtualWindow::empty();
        self.window_into(&mut out);
        out
    }

    /// Writes the current window into `out`, reusing its row buffer.
    pub fn window_into(&self, out: &mut VirtualWindow<K>) {
        out.rows.clear();
        out.visible = self.visible_range();
        out.range = self.widen(out.visible);
        out.total_height = self.total_height();
        self.for_each_window_row(|row| out.rows.push(row));
    }

    /// Computes the offset that brings `index` into view with the given alignment (clamped).
    pub fn scroll_to_index_offset(&self, index: usize, align: Align) -> u64 {
        if self.options.count == 0 {
            return 0;
        }
        let index = index.min(self.options.count - 1);
        let start = self.start_of(index);
        let end = start.saturating_add(self.heights[index] as u64);
        let view = self.viewport.height as u64;

        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(view),
            Align::Center => {
                let center = start.saturating_add(self.heights[index] as u64 / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => {
                let cur = self.scroll_offset;
                if start >= cur && end <= cur.saturating_add(view) {
                    cur
                } else if start < cur {
                    start
                } else {
                    end.saturating_sub(view)
                }
            }
        };
        self.clamp_scroll_offset(target)
    }

    /// Jumps to `index` without marking the rows as scrolling. Returns the applied offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> u64 {
        let offset = self.scroll_to_index_offset(index, align);
        self.set_scroll_offset(offset);
        offset
    }

    fn rebuild_heights(&mut self) {
        let count = self.options.count;
        let min = self.options.min_row_height.max(1);
        vdebug!(count, cached = self.key_heights.len(), "rebuild_heights");
        self.heights.clear();
        self.measured.clear();
        self.heights.reserve_exact(count);
        self.measured.reserve_exact(count);
        for i in 0..count {
            let key = self.key_for(i);
            match self.key_heights.get(&key) {
                Some(&h) => {
                    self.heights.push(h.max(min));
                    self.measured.push(true);
                }
                None => {
                    self.heights.push((self.options.estimate_height)(i).max(min));
                    self.measured.push(false);
                }
            }
        }
        self.offsets = OffsetIndex::from_heights(&self.heights);
    }

    fn start_of(&self, index: usize) -> u64 {
        (self.options.padding_start as u64).saturating_add(self.offsets.prefix(index))
    }

    fn index_at(&self, offset: u64) -> Option<usize> {
        let count = self.options.count;
        if count == 0 {
            return None;
        }
        let ps = self.options.padding_start as u64;
        if offset < ps {
            return Some(0);
        }
        let within = self.offsets.rows_within(offset - ps);
        debug_assert!(within <= self.offsets.len());
        Some(within.min(count - 1))
    }
}

fn shift(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}
