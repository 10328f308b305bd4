use crate::{
    core::Tps,
    ease::Ease,
    error::{GlissadeError, GlissadeResult},
};

/// Inertia tuning for wheel-driven scrolling.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ScrollTuning {
    /// Approximate time for wheel inertia to settle. Longer = smoother.
    pub inertia_secs: f64,
    /// Residual distance below which the position snaps to its target.
    pub settle_px: f64,
}

impl Default for ScrollTuning {
    fn default() -> Self {
        Self {
            inertia_secs: 1.8,
            settle_px: 0.4,
        }
    }
}

impl ScrollTuning {
    pub fn validate(self) -> GlissadeResult<()> {
        if !self.inertia_secs.is_finite() || self.inertia_secs <= 0.0 {
            return Err(GlissadeError::validation(
                "inertia_secs must be finite and > 0",
            ));
        }
        if !self.settle_px.is_finite() || self.settle_px < 0.0 {
            return Err(GlissadeError::validation(
                "settle_px must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Glide {
    from: f64,
    to: f64,
    duration_ticks: u64,
    elapsed: u64,
    ease: Ease,
}

/// The smooth-scroll engine: inertial wheel scrolling plus programmatic
/// glides to a target position.
///
/// A new glide or wheel input silently supersedes an in-flight glide
/// (autoKill). `stop()` freezes the engine entirely until `start()`.
#[derive(Clone, Debug)]
pub struct SmoothScroll {
    tps: Tps,
    tuning: ScrollTuning,
    pos: f64,
    target: f64,
    max_scroll: f64,
    stopped: bool,
    glide: Option<Glide>,
}

impl SmoothScroll {
    pub fn new(tps: Tps, tuning: ScrollTuning, max_scroll: f64) -> GlissadeResult<Self> {
        tuning.validate()?;
        if !max_scroll.is_finite() || max_scroll < 0.0 {
            return Err(GlissadeError::validation(
                "max_scroll must be finite and >= 0",
            ));
        }
        Ok(Self {
            tps,
            tuning,
            pos: 0.0,
            target: 0.0,
            max_scroll,
            stopped: false,
            glide: None,
        })
    }

    pub fn pos(&self) -> f64 {
        self.pos
    }

    pub fn max_scroll(&self) -> f64 {
        self.max_scroll
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// True while a programmatic glide is in flight.
    pub fn is_gliding(&self) -> bool {
        self.glide.is_some()
    }

    /// True while any motion (inertia or glide) is still settling.
    pub fn is_scrolling(&self) -> bool {
        self.glide.is_some() || (self.target - self.pos).abs() > self.tuning.settle_px
    }

    /// Accumulates wheel input into the inertia target. Supersedes an
    /// in-flight glide; ignored while stopped.
    pub fn wheel(&mut self, delta: f64) {
        if self.stopped || !delta.is_finite() {
            return;
        }
        if self.glide.take().is_some() {
            // The interrupted glide's position becomes the new baseline.
            self.target = self.pos;
        }
        self.target = (self.target + delta).clamp(0.0, self.max_scroll);
    }

    /// Starts a glide toward `y`. Supersedes an in-flight one; ignored while
    /// stopped (the engine is frozen, not an error).
    pub fn scroll_to(&mut self, y: f64, duration_secs: f64, ease: Ease) {
        if self.stopped || !y.is_finite() {
            return;
        }
        let to = y.clamp(0.0, self.max_scroll);
        let duration_ticks = self.tps.secs_to_ticks(duration_secs);
        if duration_ticks == 0 {
            self.pos = to;
            self.target = to;
            self.glide = None;
            return;
        }
        self.glide = Some(Glide {
            from: self.pos,
            to,
            duration_ticks,
            elapsed: 0,
            ease,
        });
    }

    /// Freezes the engine; cancels any in-flight glide.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.glide = None;
        self.target = self.pos;
    }

    pub fn start(&mut self) {
        self.stopped = false;
        self.target = self.pos;
    }

    /// Document height changed (resize / refresh).
    pub fn set_max_scroll(&mut self, max_scroll: f64) {
        if max_scroll.is_finite() && max_scroll >= 0.0 {
            self.max_scroll = max_scroll;
            self.pos = self.pos.clamp(0.0, max_scroll);
            self.target = self.target.clamp(0.0, max_scroll);
        }
    }

    /// Advances one tick of scroll physics.
    pub fn tick(&mut self) {
        if self.stopped {
            return;
        }
        if let Some(glide) = self.glide.as_mut() {
            glide.elapsed += 1;
            if glide.elapsed >= glide.duration_ticks {
                self.pos = glide.to;
                self.target = glide.to;
                self.glide = None;
            } else {
                let t = glide.elapsed as f64 / glide.duration_ticks as f64;
                self.pos = glide.from + (glide.to - glide.from) * glide.ease.apply(t);
            }
            return;
        }

        let delta = self.target - self.pos;
        if delta.abs() <= self.tuning.settle_px {
            self.pos = self.target;
            return;
        }
        // Exponential approach; ~99.75% of the distance is covered after
        // `inertia_secs`.
        let lambda = 6.0 / self.tuning.inertia_secs;
        let k = 1.0 - (-lambda * self.tps.tick_duration_secs()).exp();
        self.pos += delta * k;
    }
}
