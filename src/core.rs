use crate::error::{GlissadeError, GlissadeResult};

/// Index into the fixed-rate tick domain. One tick = one simulation frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Ticks per second as a rational. The nominal rate everywhere is 60/1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Tps {
    pub fn new(num: u32, den: u32) -> GlissadeResult<Self> {
        if den == 0 {
            return Err(GlissadeError::validation("Tps den must be > 0"));
        }
        if num == 0 {
            return Err(GlissadeError::validation("Tps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn tick_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Rounds like the timer-based transitions do (`round(secs * rate)`),
    /// never less than one tick for a positive duration.
    pub fn secs_to_ticks(self, secs: f64) -> u64 {
        if secs <= 0.0 {
            return 0;
        }
        ((secs * self.as_f64()).round() as u64).max(1)
    }
}

impl Default for Tps {
    fn default() -> Self {
        Self { num: 60, den: 1 }
    }
}

/// Visible window extent. Scrolling is vertical only.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub height: f64,
}

impl Viewport {
    pub fn validate(self) -> GlissadeResult<()> {
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(GlissadeError::validation(
                "viewport height must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Vertical placement of an element in document space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    pub top: f64,
    pub height: f64,
}

impl Extent {
    pub fn bottom(self) -> f64 {
        self.top + self.height
    }

    pub fn validate(self) -> GlissadeResult<()> {
        if !self.top.is_finite() || !self.height.is_finite() {
            return Err(GlissadeError::validation("extent must be finite"));
        }
        if self.height < 0.0 {
            return Err(GlissadeError::validation("extent height must be >= 0"));
        }
        Ok(())
    }

    /// Fraction of the element inside the viewport, with the viewport
    /// expanded by `margin` on both edges (IntersectionObserver rootMargin).
    /// Zero-height extents report 1.0 when their line is inside.
    pub fn visible_ratio(self, scroll_y: f64, viewport: Viewport, margin: f64) -> f64 {
        let view_top = scroll_y - margin;
        let view_bottom = scroll_y + viewport.height + margin;
        if self.height <= 0.0 {
            return if self.top >= view_top && self.top <= view_bottom {
                1.0
            } else {
                0.0
            };
        }
        let overlap = (self.bottom().min(view_bottom) - self.top.max(view_top)).max(0.0);
        (overlap / self.height).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tps_rejects_zero() {
        assert!(Tps::new(0, 1).is_err());
        assert!(Tps::new(60, 0).is_err());
    }

    #[test]
    fn secs_to_ticks_rounds() {
        let tps = Tps::default();
        assert_eq!(tps.secs_to_ticks(0.55), 33);
        assert_eq!(tps.secs_to_ticks(1.1), 66);
        assert_eq!(tps.secs_to_ticks(0.0), 0);
        // Tiny positive durations still get one tick.
        assert_eq!(tps.secs_to_ticks(0.001), 1);
    }

    #[test]
    fn visible_ratio_basic() {
        let vp = Viewport { height: 100.0 };
        let el = Extent {
            top: 50.0,
            height: 100.0,
        };
        // Half inside at scroll 0.
        assert_eq!(el.visible_ratio(0.0, vp, 0.0), 0.5);
        // Fully inside.
        assert_eq!(el.visible_ratio(50.0, vp, 0.0), 1.0);
        // Far away, but within a generous margin.
        assert_eq!(el.visible_ratio(400.0, vp, 0.0), 0.0);
        assert!(el.visible_ratio(200.0, vp, 60.0) > 0.0);
    }
}
