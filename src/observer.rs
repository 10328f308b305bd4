use crate::core::{Extent, Viewport};

/// Why an element is being watched; routes crossings to their consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchTag {
    NavSection(usize),
    Hero,
    MediaPreload,
}

#[derive(Clone, Debug)]
struct Entry {
    element: String,
    extent: Extent,
    threshold: f64,
    root_margin: f64,
    intersecting: bool,
    tag: WatchTag,
}

/// A visibility crossing: the element's at-least-threshold state flipped.
#[derive(Clone, Debug, PartialEq)]
pub struct Crossing {
    pub tag: WatchTag,
    pub element: String,
    pub entered: bool,
    pub ratio: f64,
}

/// Synchronous stand-in for viewport intersection observation. Entries are
/// evaluated once per tick from the current scroll position; crossings are
/// delivered in registration order.
#[derive(Clone, Debug, Default)]
pub struct IntersectionWatcher {
    entries: Vec<Entry>,
}

impl IntersectionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(
        &mut self,
        element: &str,
        extent: Extent,
        threshold: f64,
        root_margin: f64,
        tag: WatchTag,
    ) {
        self.entries.push(Entry {
            element: element.to_string(),
            extent,
            threshold: threshold.clamp(0.0, 1.0),
            root_margin: root_margin.max(0.0),
            intersecting: false,
            tag,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Geometry changed (resize / refresh); crossing state is kept so a
    /// refresh does not re-fire entries that stayed visible.
    pub fn update_extent(&mut self, element: &str, extent: Extent) {
        for entry in &mut self.entries {
            if entry.element == element {
                entry.extent = extent;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Forgets crossing state so the next [`IntersectionWatcher::evaluate`]
    /// re-fires an entered crossing for every entry still in view. Used when
    /// delivered crossings were consumed without being applied and the
    /// consumer needs the current visibility replayed.
    pub fn rearm(&mut self) {
        for entry in &mut self.entries {
            entry.intersecting = false;
        }
    }

    /// Recomputes every entry and returns the crossings since the last call.
    pub fn evaluate(&mut self, scroll_y: f64, viewport: Viewport) -> Vec<Crossing> {
        let mut out = Vec::new();
        for entry in &mut self.entries {
            let ratio = entry
                .extent
                .visible_ratio(scroll_y, viewport, entry.root_margin);
            let now = if entry.threshold <= 0.0 {
                ratio > 0.0
            } else {
                ratio >= entry.threshold
            };
            if now != entry.intersecting {
                entry.intersecting = now;
                out.push(Crossing {
                    tag: entry.tag,
                    element: entry.element.clone(),
                    entered: now,
                    ratio,
                });
            }
        }
        out
    }
}
