/// Tuning for touch momentum. Velocities are in pixels per millisecond.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MomentumConfig {
    /// Fraction of velocity kept per 16 ms frame.
    pub friction: f32,
    /// Momentum stops once speed drops below this.
    pub stop_velocity: f32,
    /// Releases slower than this do not start momentum.
    pub min_release_velocity: f32,
    /// A release this long after the last move is treated as a stationary finger.
    pub release_window_ms: u64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            friction: 0.95,
            stop_velocity: 0.02,
            min_release_velocity: 0.1,
            release_window_ms: 100,
        }
    }
}

const FRAME_MS: u64 = 16;
// Caps the decay loop for long gaps between ticks.
const MAX_DECAY_FRAMES: u64 = 240;
const SAMPLE_WEIGHT: f32 = 0.8;

fn abs(v: f32) -> f32 {
    if v < 0.0 { -v } else { v }
}

/// Tracks one touch gesture and estimates its release velocity.
///
/// Positive velocity scrolls forward (finger moving up the screen).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchTracker {
    last_y: f32,
    last_ms: u64,
    velocity: f32,
}

impl TouchTracker {
    pub fn start(y: f32, now_ms: u64) -> Self {
        Self {
            last_y: y,
            last_ms: now_ms,
            velocity: 0.0,
        }
    }

    /// Records a move and returns the scroll delta in pixels since the previous sample.
    pub fn update(&mut self, y: f32, now_ms: u64) -> f32 {
        let delta = self.last_y - y;
        let dt = now_ms.saturating_sub(self.last_ms);
        if dt > 0 {
            let sample = delta / dt as f32;
            self.velocity = SAMPLE_WEIGHT * sample + (1.0 - SAMPLE_WEIGHT) * self.velocity;
            self.last_ms = now_ms;
        }
        self.last_y = y;
        delta
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Velocity at release, or zero when the finger rested longer than the release window.
    pub fn release_velocity(&self, now_ms: u64, config: &MomentumConfig) -> f32 {
        if now_ms.saturating_sub(self.last_ms) > config.release_window_ms {
            0.0
        } else {
            self.velocity
        }
    }
}

/// Free-running scroll motion that decays by `friction` each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Momentum {
    position: f64,
    velocity: f32,
    last_ms: u64,
    config: MomentumConfig,
}

impl Momentum {
    /// Returns `None` when `velocity` is below the configured release threshold.
    pub fn start(
        position: u64,
        velocity: f32,
        now_ms: u64,
        config: MomentumConfig,
    ) -> Option<Self> {
        if abs(velocity) < config.min_release_velocity {
            return None;
        }
        Some(Self {
            position: position as f64,
            velocity,
            last_ms: now_ms,
            config,
        })
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Advances to `now_ms` and returns the new offset clamped to `[0, max_offset]`, or `None`
    /// once the motion has settled or hit a bound.
    pub fn step(&mut self, now_ms: u64, max_offset: u64) -> Option<u64> {
        let dt = now_ms.saturating_sub(self.last_ms);
        if dt == 0 {
            return Some(self.clamped(max_offset));
        }
        self.last_ms = now_ms;
        self.position += self.velocity as f64 * dt as f64;

        let frames = (dt / FRAME_MS).clamp(1, MAX_DECAY_FRAMES);
        for _ in 0..frames {
            self.velocity *= self.config.friction;
        }

        let pos = self.clamped(max_offset);
        let at_bound =
            (pos == 0 && self.velocity < 0.0) || (pos == max_offset && self.velocity > 0.0);
        if abs(self.velocity) < self.config.stop_velocity || at_bound {
            strace!(pos, "momentum settled");
            return None;
        }
        Some(pos)
    }

    /// Offset reached so far, clamped to `[0, max_offset]`.
    pub fn clamped(&self, max_offset: u64) -> u64 {
        if self.position <= 0.0 {
            0
        } else {
            (self.position as u64).min(max_offset)
        }
    }
}
