use crate::{
    ease::Ease,
    events::Key,
    page::{Page, attr},
    scroll::SmoothScroll,
    tween::{Prop, Stage},
};

const OPEN_SECS: f64 = 0.8;
const CLOSE_SECS: f64 = 0.6;
const ITEM_SECS: f64 = 0.6;
const ITEM_STAGGER_SECS: f64 = 0.08;
const ITEM_DELAY_SECS: f64 = 0.3;

/// Fully-open circular clip radius (covers the viewport diagonal).
const CLIP_OPEN: f64 = 141.42;

/// The slide-out page menu. Opening freezes the smooth-scroll engine;
/// closing releases it. Absent markup means the feature is absent.
#[derive(Clone, Debug)]
pub struct MenuOverlay {
    button: String,
    overlay: String,
    burger_lines: Vec<String>,
    items: Vec<String>,
    open: bool,
}

impl MenuOverlay {
    pub fn from_page(page: &Page, stage: &mut Stage) -> Option<Self> {
        let button = page.first_with_attr(attr::MENU_BUTTON)?.id.clone();
        let overlay = page.first_with_attr(attr::MENU_OVERLAY)?.id.clone();
        let burger_lines: Vec<String> = page
            .with_attr(attr::BURGER_LINE)
            .into_iter()
            .map(|el| el.id.clone())
            .collect();
        let items: Vec<String> = page
            .with_attr(attr::MENU_ITEM)
            .into_iter()
            .map(|el| el.id.clone())
            .collect();

        stage.set(&overlay, Prop::ClipRadius, 0.0);
        for item in &items {
            stage.set(item, Prop::Opacity, 0.0);
        }

        Some(Self {
            button,
            overlay,
            burger_lines,
            items,
            open: false,
        })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn overlay_id(&self) -> &str {
        &self.overlay
    }

    /// Click routing: the trigger toggles; an item click closes.
    pub fn handle_click(&mut self, target: &str, stage: &mut Stage, scroll: &mut SmoothScroll) {
        if target == self.button {
            if self.open {
                self.close(stage, scroll);
            } else {
                self.open(stage, scroll);
            }
        } else if self.open && self.items.iter().any(|item| item == target) {
            self.close(stage, scroll);
        }
    }

    pub fn handle_key(&mut self, key: Key, stage: &mut Stage, scroll: &mut SmoothScroll) {
        if key == Key::Escape && self.open {
            self.close(stage, scroll);
        }
    }

    pub fn open(&mut self, stage: &mut Stage, scroll: &mut SmoothScroll) {
        if self.open {
            return;
        }
        self.open = true;
        scroll.stop();

        stage.set(&self.overlay, Prop::ClipRadius, 0.0);
        stage.to(
            &self.overlay,
            Prop::ClipRadius,
            CLIP_OPEN,
            OPEN_SECS,
            Ease::InOutQuart,
        );

        // Burger → ×: outer lines fold to the middle, middle line vanishes.
        if let [top, mid, bot] = self.burger_lines.as_slice() {
            stage.to(top, Prop::Y, 8.0, 0.3, Ease::OutCubic);
            stage.to(top, Prop::Rotation, 45.0, 0.3, Ease::OutCubic);
            stage.to(mid, Prop::Opacity, 0.0, 0.1, Ease::OutCubic);
            stage.to(bot, Prop::Y, -8.0, 0.3, Ease::OutCubic);
            stage.to(bot, Prop::Rotation, -45.0, 0.3, Ease::OutCubic);
        }

        for (i, item) in self.items.iter().enumerate() {
            let delay = ITEM_DELAY_SECS + i as f64 * ITEM_STAGGER_SECS;
            stage.set(item, Prop::Y, 30.0);
            stage.set(item, Prop::Rotation, -5.0);
            stage.to_delayed(delay, item, Prop::Opacity, 1.0, ITEM_SECS, Ease::OutCubic);
            stage.to_delayed(delay, item, Prop::Y, 0.0, ITEM_SECS, Ease::OutCubic);
            stage.to_delayed(delay, item, Prop::Rotation, 0.0, ITEM_SECS, Ease::OutCubic);
        }
    }

    pub fn close(&mut self, stage: &mut Stage, scroll: &mut SmoothScroll) {
        if !self.open {
            return;
        }
        self.open = false;
        scroll.start();

        stage.to(
            &self.overlay,
            Prop::ClipRadius,
            0.0,
            CLOSE_SECS,
            Ease::InOutQuart,
        );

        if let [top, mid, bot] = self.burger_lines.as_slice() {
            stage.to(top, Prop::Y, 0.0, 0.3, Ease::OutCubic);
            stage.to(top, Prop::Rotation, 0.0, 0.3, Ease::OutCubic);
            stage.to(mid, Prop::Opacity, 1.0, 0.2, Ease::OutCubic);
            stage.to(bot, Prop::Y, 0.0, 0.3, Ease::OutCubic);
            stage.to(bot, Prop::Rotation, 0.0, 0.3, Ease::OutCubic);
        }

        for item in &self.items {
            stage.to(item, Prop::Opacity, 0.0, 0.2, Ease::OutCubic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Extent, Tps, Viewport},
        page::Element,
        scroll::ScrollTuning,
    };
    use std::collections::BTreeMap;

    fn tagged(id: &str, key: &str) -> Element {
        let mut attrs = BTreeMap::new();
        attrs.insert(key.to_string(), String::new());
        Element {
            id: id.to_string(),
            extent: Extent {
                top: 0.0,
                height: 10.0,
            },
            parent: None,
            attrs,
            heading: None,
            text: None,
        }
    }

    fn setup() -> (MenuOverlay, Stage, SmoothScroll) {
        let page = Page {
            path: "/".to_string(),
            viewport: Viewport { height: 800.0 },
            elements: vec![
                tagged("menuBtn", attr::MENU_BUTTON),
                tagged("overlay", attr::MENU_OVERLAY),
                tagged("line0", attr::BURGER_LINE),
                tagged("line1", attr::BURGER_LINE),
                tagged("line2", attr::BURGER_LINE),
                tagged("item0", attr::MENU_ITEM),
                tagged("item1", attr::MENU_ITEM),
            ],
        };
        let mut stage = Stage::new(Tps::default());
        let menu = MenuOverlay::from_page(&page, &mut stage).unwrap();
        let scroll = SmoothScroll::new(Tps::default(), ScrollTuning::default(), 2000.0).unwrap();
        (menu, stage, scroll)
    }

    #[test]
    fn missing_markup_is_absent_feature() {
        let page = Page {
            path: "/".to_string(),
            viewport: Viewport { height: 800.0 },
            elements: vec![tagged("menuBtn", attr::MENU_BUTTON)],
        };
        let mut stage = Stage::new(Tps::default());
        assert!(MenuOverlay::from_page(&page, &mut stage).is_none());
    }

    #[test]
    fn open_stops_engine_close_restarts_it() {
        let (mut menu, mut stage, mut scroll) = setup();
        menu.handle_click("menuBtn", &mut stage, &mut scroll);
        assert!(menu.is_open());
        assert!(scroll.is_stopped());

        menu.handle_click("menuBtn", &mut stage, &mut scroll);
        assert!(!menu.is_open());
        assert!(!scroll.is_stopped());
    }

    #[test]
    fn overlay_radius_opens_fully() {
        let (mut menu, mut stage, mut scroll) = setup();
        menu.open(&mut stage, &mut scroll);
        for _ in 0..60 {
            stage.tick();
        }
        assert_eq!(stage.get("overlay", Prop::ClipRadius, 0.0), CLIP_OPEN);
    }

    #[test]
    fn item_click_and_escape_close() {
        let (mut menu, mut stage, mut scroll) = setup();
        menu.open(&mut stage, &mut scroll);
        menu.handle_click("item1", &mut stage, &mut scroll);
        assert!(!menu.is_open());

        menu.open(&mut stage, &mut scroll);
        menu.handle_key(Key::Escape, &mut stage, &mut scroll);
        assert!(!menu.is_open());
        // Escape while closed is a no-op.
        menu.handle_key(Key::Escape, &mut stage, &mut scroll);
        assert!(!menu.is_open());
    }
}
