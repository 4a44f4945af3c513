use datagrid_virtual::{Align, RowKey, VirtualRows, VirtualRowsOptions};

use crate::{
    Easing, Momentum, MomentumConfig, RowAnchor, TouchTracker, Tween, apply_anchor,
    capture_anchor_at, capture_first_visible_anchor,
};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Motion {
    Tween(Tween),
    Momentum(Momentum),
}

/// Drives one grid body's scroll position from host input.
///
/// The host calls `on_scroll` / `touch_*` as input arrives and `tick(now_ms)` once per frame.
/// At most one motion (a tween or touch momentum) is active; starting one or receiving direct
/// user input replaces it.
#[derive(Clone, Debug)]
pub struct ScrollController<K> {
    rows: VirtualRows<K>,
    motion: Option<Motion>,
    touch: Option<TouchTracker>,
    momentum: MomentumConfig,
}

impl<K: RowKey> ScrollController<K> {
    pub fn new(options: VirtualRowsOptions<K>) -> Self {
        Self::from_rows(VirtualRows::new(options))
    }

    pub fn from_rows(rows: VirtualRows<K>) -> Self {
        Self {
            rows,
            motion: None,
            touch: None,
            momentum: MomentumConfig::default(),
        }
    }

    pub fn with_momentum(mut self, config: MomentumConfig) -> Self {
        self.momentum = config;
        self
    }

    pub fn momentum_config(&self) -> &MomentumConfig {
        &self.momentum
    }

    pub fn rows(&self) -> &VirtualRows<K> {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut VirtualRows<K> {
        &mut self.rows
    }

    pub fn into_rows(self) -> VirtualRows<K> {
        self.rows
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.motion, Some(Motion::Tween(_)))
    }

    pub fn is_momentum_active(&self) -> bool {
        matches!(self.motion, Some(Motion::Momentum(_)))
    }

    pub fn is_touching(&self) -> bool {
        self.touch.is_some()
    }

    /// Stops any tween or momentum in place.
    pub fn cancel_motion(&mut self) {
        if self.motion.take().is_some() {
            strace!(offset = self.rows.scroll_offset(), "motion cancelled");
        }
    }

    pub fn on_viewport_height(&mut self, height: u32) {
        self.rows.set_viewport_height(height);
    }

    /// A scroll reported by the host (wheel, scrollbar drag). Cancels any motion.
    pub fn on_scroll(&mut self, offset: u64, now_ms: u64) {
        self.cancel_motion();
        self.rows.apply_scroll_event(offset, now_ms);
    }

    pub fn touch_start(&mut self, y: f32, now_ms: u64) {
        self.cancel_motion();
        self.touch = Some(TouchTracker::start(y, now_ms));
    }

    /// Scrolls by the finger movement since the previous sample. Returns the applied offset.
    pub fn touch_move(&mut self, y: f32, now_ms: u64) -> u64 {
        let Some(touch) = self.touch.as_mut() else {
            return self.rows.scroll_offset();
        };
        let delta = touch.update(y, now_ms);
        let target = offset_by(self.rows.scroll_offset(), delta);
        self.rows.apply_scroll_event(target, now_ms);
        self.rows.scroll_offset()
    }

    /// Ends the gesture and starts momentum when the release was fast enough.
    pub fn touch_end(&mut self, now_ms: u64) -> bool {
        let Some(touch) = self.touch.take() else {
            return false;
        };
        let velocity = touch.release_velocity(now_ms, &self.momentum);
        match Momentum::start(self.rows.scroll_offset(), velocity, now_ms, self.momentum) {
            Some(m) => {
                strace!(velocity, "momentum started");
                self.motion = Some(Motion::Momentum(m));
                true
            }
            None => false,
        }
    }

    /// Advances the active motion. Returns the new offset while a motion ran this tick;
    /// otherwise runs the `is_scrolling` debounce and returns `None`.
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        let Some(motion) = self.motion.as_mut() else {
            self.rows.update_scrolling(now_ms);
            return None;
        };

        let (offset, finished) = match motion {
            Motion::Tween(t) => (t.sample(now_ms), t.is_done(now_ms)),
            Motion::Momentum(m) => {
                let max = self.rows.max_scroll_offset();
                match m.step(now_ms, max) {
                    Some(off) => (off, false),
                    None => (m.clamped(max), true),
                }
            }
        };

        self.rows.apply_scroll_event(offset, now_ms);
        if finished {
            self.motion = None;
            self.rows.set_is_scrolling(false);
        }
        Some(self.rows.scroll_offset())
    }

    /// Jumps to `index`. Returns the applied offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align, now_ms: u64) -> u64 {
        let offset = self.rows.scroll_to_index_offset(index, align);
        self.scroll_to_offset(offset, now_ms)
    }

    pub fn scroll_to_offset(&mut self, offset: u64, now_ms: u64) -> u64 {
        self.cancel_motion();
        self.rows.apply_scroll_event(offset, now_ms);
        self.rows.scroll_offset()
    }

    /// Starts a tween toward `index`. Returns the clamped target offset.
    pub fn start_tween_to_index(
        &mut self,
        index: usize,
        align: Align,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> u64 {
        let to = self.rows.scroll_to_index_offset(index, align);
        self.start_tween_to_offset(to, now_ms, duration_ms, easing)
    }

    /// Starts a tween toward `offset`, retargeting an active tween from its current position.
    pub fn start_tween_to_offset(
        &mut self,
        offset: u64,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> u64 {
        let to = self.rows.clamp_scroll_offset(offset);
        let tween = match self.motion {
            Some(Motion::Tween(mut t)) => {
                t.retarget(now_ms, to, duration_ms);
                t.easing = easing;
                t
            }
            _ => Tween::new(self.rows.scroll_offset(), to, now_ms, duration_ms, easing),
        };
        self.motion = Some(Motion::Tween(tween));
        to
    }

    pub fn capture_first_visible_anchor(&self) -> Option<RowAnchor<K>> {
        capture_first_visible_anchor(&self.rows)
    }

    pub fn capture_anchor_at(&self, offset_in_viewport: u64) -> Option<RowAnchor<K>> {
        capture_anchor_at(&self.rows, offset_in_viewport)
    }

    /// Restores `anchor` after the rows changed. Cancels any motion.
    pub fn apply_anchor(
        &mut self,
        anchor: &RowAnchor<K>,
        key_to_index: impl FnMut(&K) -> Option<usize>,
    ) -> bool {
        self.cancel_motion();
        apply_anchor(&mut self.rows, anchor, key_to_index)
    }
}

fn offset_by(offset: u64, delta: f32) -> u64 {
    if delta >= 0.0 {
        offset.saturating_add(delta as u64)
    } else {
        offset.saturating_sub((-delta) as u64)
    }
}
