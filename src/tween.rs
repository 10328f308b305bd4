use std::collections::BTreeMap;

use crate::{core::Tps, ease::Ease};

/// Tweenable properties. Values are plain `f64`; their interpretation
/// (px, percent, unit scale) belongs to whoever declared the tween.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Prop {
    Opacity,
    X,
    Y,
    Scale,
    Width,
    Rotation,
    Brightness,
    Saturate,
    ClipRadius,
    Count,
}

#[derive(Clone, Debug)]
struct Tween {
    from: f64,
    to: f64,
    duration_ticks: u64,
    delay_ticks: u64,
    elapsed: u64, // counts through delay, then duration
    ease: Ease,
}

impl Tween {
    /// Advances one tick. Returns the new value and whether the tween is done.
    fn step(&mut self) -> (f64, bool) {
        self.elapsed += 1;
        if self.elapsed <= self.delay_ticks {
            return (self.from, false);
        }
        let active = self.elapsed - self.delay_ticks;
        if active >= self.duration_ticks {
            // Land exactly on the target, regardless of rounding.
            return (self.to, true);
        }
        let t = active as f64 / self.duration_ticks as f64;
        (self.from + (self.to - self.from) * self.ease.apply(t), false)
    }
}

#[derive(Clone, Debug)]
struct Channel {
    current: f64,
    tween: Option<Tween>,
}

/// The property tween stage. One instance per page; stepped once per tick.
///
/// Starting a tween on a channel that already has one in flight silently
/// supersedes it (autoKill) — never an error, never two tweens on the same
/// channel.
#[derive(Clone, Debug)]
pub struct Stage {
    tps: Tps,
    channels: BTreeMap<(String, Prop), Channel>,
}

impl Stage {
    pub fn new(tps: Tps) -> Self {
        Self {
            tps,
            channels: BTreeMap::new(),
        }
    }

    pub fn tps(&self) -> Tps {
        self.tps
    }

    /// Immediate write; cancels any in-flight tween on the channel.
    pub fn set(&mut self, el: &str, prop: Prop, value: f64) {
        let ch = self.channel_mut(el, prop, value);
        ch.current = value;
        ch.tween = None;
    }

    /// Tween from the channel's current value toward `target`.
    pub fn to(&mut self, el: &str, prop: Prop, target: f64, duration_secs: f64, ease: Ease) {
        self.to_delayed(0.0, el, prop, target, duration_secs, ease);
    }

    /// Same as [`Stage::to`] with a start delay; staggered reveals are built
    /// from increasing delays.
    pub fn to_delayed(
        &mut self,
        delay_secs: f64,
        el: &str,
        prop: Prop,
        target: f64,
        duration_secs: f64,
        ease: Ease,
    ) {
        let duration_ticks = self.tps.secs_to_ticks(duration_secs);
        let delay_ticks = self.tps.secs_to_ticks(delay_secs);
        let ch = self.channel_mut(el, prop, target);
        if duration_ticks == 0 && delay_ticks == 0 {
            ch.current = target;
            ch.tween = None;
            return;
        }
        ch.tween = Some(Tween {
            from: ch.current,
            to: target,
            duration_ticks: duration_ticks.max(1),
            delay_ticks,
            elapsed: 0,
            ease,
        });
    }

    /// Current channel value, or `default` if the channel was never touched.
    pub fn get(&self, el: &str, prop: Prop, default: f64) -> f64 {
        self.channels
            .get(&(el.to_string(), prop))
            .map_or(default, |ch| ch.current)
    }

    /// True when no tween is in flight on the channel.
    pub fn is_settled(&self, el: &str, prop: Prop) -> bool {
        self.channels
            .get(&(el.to_string(), prop))
            .is_none_or(|ch| ch.tween.is_none())
    }

    pub fn active_tweens(&self) -> usize {
        self.channels
            .values()
            .filter(|ch| ch.tween.is_some())
            .count()
    }

    /// Advances every in-flight tween one tick.
    pub fn tick(&mut self) {
        for ch in self.channels.values_mut() {
            if let Some(tw) = ch.tween.as_mut() {
                let (value, done) = tw.step();
                ch.current = value;
                if done {
                    ch.tween = None;
                }
            }
        }
    }

    /// Drops every channel. Destroy path only.
    pub fn clear(&mut self) {
        self.channels.clear();
    }

    fn channel_mut(&mut self, el: &str, prop: Prop, initial: f64) -> &mut Channel {
        self.channels
            .entry((el.to_string(), prop))
            .or_insert(Channel {
                current: initial,
                tween: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> Stage {
        Stage::new(Tps::default())
    }

    #[test]
    fn tween_lands_exactly_on_target() {
        let mut s = stage();
        s.set("a", Prop::Opacity, 0.0);
        s.to("a", Prop::Opacity, 1.0, 0.3, Ease::OutCubic);
        for _ in 0..18 {
            s.tick();
        }
        assert_eq!(s.get("a", Prop::Opacity, 0.0), 1.0);
        assert!(s.is_settled("a", Prop::Opacity));
    }

    #[test]
    fn new_tween_supersedes_in_flight_one() {
        let mut s = stage();
        s.set("a", Prop::Y, 0.0);
        s.to("a", Prop::Y, 100.0, 1.0, Ease::Linear);
        for _ in 0..30 {
            s.tick();
        }
        let mid = s.get("a", Prop::Y, 0.0);
        assert!(mid > 0.0 && mid < 100.0);

        // Supersede toward zero; starts from the interrupted value.
        s.to("a", Prop::Y, 0.0, 0.5, Ease::Linear);
        s.tick();
        assert!(s.get("a", Prop::Y, 0.0) < mid);
        for _ in 0..30 {
            s.tick();
        }
        assert_eq!(s.get("a", Prop::Y, 0.0), 0.0);
        assert_eq!(s.active_tweens(), 0);
    }

    #[test]
    fn delay_holds_from_value() {
        let mut s = stage();
        s.set("a", Prop::Scale, 0.6);
        s.to_delayed(0.1, "a", Prop::Scale, 1.0, 0.1, Ease::Linear);
        for _ in 0..5 {
            s.tick();
        }
        assert_eq!(s.get("a", Prop::Scale, 0.0), 0.6);
        for _ in 0..8 {
            s.tick();
        }
        assert_eq!(s.get("a", Prop::Scale, 0.0), 1.0);
    }

    #[test]
    fn set_cancels_tween() {
        let mut s = stage();
        s.to("a", Prop::Width, 50.0, 1.0, Ease::Linear);
        s.set("a", Prop::Width, 7.0);
        s.tick();
        assert_eq!(s.get("a", Prop::Width, 0.0), 7.0);
        assert!(s.is_settled("a", Prop::Width));
    }

    #[test]
    fn untouched_channel_reports_default() {
        let s = stage();
        assert_eq!(s.get("ghost", Prop::Opacity, 1.0), 1.0);
        assert!(s.is_settled("ghost", Prop::Opacity));
    }
}
