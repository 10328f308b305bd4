use crate::{
    core::{Extent, Tps},
    ease::Ease,
    events::Key,
    observer::{IntersectionWatcher, WatchTag},
    page::{Page, attr},
    scramble::Scramble,
    scroll::SmoothScroll,
    tween::{Prop, Stage},
};

/// A section becomes active once this fraction of it is visible.
pub const SECTION_THRESHOLD: f64 = 0.6;

const SCRAMBLE_SECS: f64 = 0.55;
const PROGRESS_SECS: f64 = 0.5;
const GO_SECS: f64 = 1.1;
const EXPAND_SECS: f64 = 0.4;
const BUTTON_SECS: f64 = 0.3;
const BUTTON_STAGGER_SECS: f64 = 0.05;
const MENU_SECS: f64 = 0.3;

/// A scroll-spy section resolved at construction. Order is document order;
/// sections are never added or removed afterwards.
#[derive(Clone, Debug)]
pub struct SectionMeta {
    pub element: String,
    pub title: String,
    pub extent: Extent,
}

/// The widget's mutable view model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct NavState {
    pub active: usize,
    pub expanded: bool,
    pub menu_open: bool,
}

/// The "dynamic island" scroll-spy navigation widget.
///
/// Reflects the current scroll position as an active-section indicator, a
/// progress bar and a scrambled title; accepts prev/next/keyboard commands
/// that drive the smooth-scroll engine; manages the expanded-controls and
/// menu panels. Missing optional markup (buttons, panel, progress bar)
/// degrades to the feature being absent, never an error.
#[derive(Clone, Debug)]
pub struct IslandNav {
    root: String,
    text_el: Option<String>,
    prev_btn: Option<String>,
    next_btn: Option<String>,
    progress: Option<String>,
    menu_btn: Option<String>,
    menu_panel: Option<String>,
    menu_items: Vec<(String, String)>, // (element id, href)
    menu_active: Vec<bool>,
    sections: Vec<SectionMeta>,
    state: NavState,
    scramble: Scramble,
    current_page: String,
    tps: Tps,
}

impl IslandNav {
    /// Builds the widget from page markup. Returns `None` when the island
    /// root or the section list is absent — an absent feature, not an error.
    pub fn from_page(page: &Page, seed: u64, tps: Tps) -> Option<Self> {
        let root = page.first_with_attr(attr::ISLAND)?.id.clone();

        let sections: Vec<SectionMeta> = page
            .with_attr(attr::NAV_SECTION)
            .into_iter()
            .enumerate()
            .map(|(i, el)| SectionMeta {
                element: el.id.clone(),
                title: el
                    .attr(attr::NAV_TITLE)
                    .map(str::to_string)
                    .or_else(|| el.heading.as_ref().map(|h| h.trim().to_string()))
                    .unwrap_or_else(|| format!("Section {i}")),
                extent: el.extent,
            })
            .collect();
        if sections.is_empty() {
            return None;
        }

        let find = |key: &str| page.first_with_attr(key).map(|el| el.id.clone());
        let menu_items: Vec<(String, String)> = page
            .with_attr(attr::ISLAND_MENU_ITEM)
            .into_iter()
            .map(|el| {
                (
                    el.id.clone(),
                    el.attr(attr::HREF).unwrap_or_default().to_string(),
                )
            })
            .collect();

        let menu_active = vec![false; menu_items.len()];
        Some(Self {
            root,
            text_el: find(attr::ISLAND_TEXT),
            prev_btn: find(attr::ISLAND_PREV),
            next_btn: find(attr::ISLAND_NEXT),
            progress: find(attr::ISLAND_PROGRESS),
            menu_btn: find(attr::ISLAND_MENU_BUTTON),
            menu_panel: find(attr::ISLAND_MENU_PANEL),
            menu_items,
            menu_active,
            sections,
            state: NavState {
                active: 0,
                expanded: false,
                menu_open: false,
            },
            scramble: Scramble::new("", seed),
            current_page: page.current_page().to_string(),
            tps,
        })
    }

    /// Registers every section for visibility watching.
    pub fn observe(&self, watcher: &mut IntersectionWatcher) {
        for (i, sec) in self.sections.iter().enumerate() {
            watcher.observe(
                &sec.element,
                sec.extent,
                SECTION_THRESHOLD,
                0.0,
                WatchTag::NavSection(i),
            );
        }
    }

    /// Collapsed island, hidden controls, first section active.
    pub fn init(&mut self, stage: &mut Stage) {
        stage.set(&self.root, Prop::Width, 0.0);
        for btn in [&self.prev_btn, &self.next_btn].into_iter().flatten() {
            stage.set(btn, Prop::Opacity, 0.0);
            stage.set(btn, Prop::Scale, 0.6);
        }
        if let Some(panel) = &self.menu_panel {
            stage.set(panel, Prop::Opacity, 0.0);
            stage.set(panel, Prop::Scale, 0.8);
        }
        if let Some(progress) = &self.progress {
            stage.set(progress, Prop::Width, 0.0);
        }
        self.apply_active(0, stage);
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn sections(&self) -> &[SectionMeta] {
        &self.sections
    }

    /// Exactly one section carries the active marker.
    pub fn is_section_active(&self, index: usize) -> bool {
        index == self.state.active
    }

    /// "Active page" highlighting for a menu link; reflects the loaded
    /// document's address, not scroll position.
    pub fn is_menu_item_active(&self, index: usize) -> bool {
        self.menu_active.get(index).copied().unwrap_or(false)
    }

    /// Displayed (possibly mid-scramble) title text.
    pub fn title_text(&self) -> &str {
        self.scramble.text()
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    /// Viewport crossing for section `index`. Suppressed while a
    /// programmatic glide is in flight; the glide's own target was already
    /// activated by [`IslandNav::go`].
    pub fn on_section_crossing(
        &mut self,
        index: usize,
        entered: bool,
        glide_in_flight: bool,
        stage: &mut Stage,
    ) {
        if !entered || glide_in_flight || index >= self.sections.len() {
            return;
        }
        self.set_active(index, stage);
    }

    /// Active-section transition; same-index calls are suppressed entirely.
    pub fn set_active(&mut self, index: usize, stage: &mut Stage) {
        if index == self.state.active || index >= self.sections.len() {
            return;
        }
        self.apply_active(index, stage);
    }

    fn apply_active(&mut self, index: usize, stage: &mut Stage) {
        self.state.active = index;

        let title = self.sections[index].title.to_uppercase();
        self.scramble.start(&title, SCRAMBLE_SECS, self.tps);

        if let Some(progress) = &self.progress {
            let pct = (index + 1) as f64 / self.sections.len() as f64 * 100.0;
            stage.to(progress, Prop::Width, pct, PROGRESS_SECS, Ease::OutCubic);
        }

        for (i, (_, href)) in self.menu_items.iter().enumerate() {
            self.menu_active[i] = *href == self.current_page;
        }
    }

    /// Navigation command: clamp, then glide to the target section. Without
    /// an engine handle the state still updates and no scroll is issued.
    pub fn go(&mut self, index: i64, stage: &mut Stage, scroll: Option<&mut SmoothScroll>) {
        let max = self.sections.len() as i64 - 1;
        let index = index.clamp(0, max) as usize;
        if index == self.state.active {
            return;
        }
        self.set_active(index, stage);
        if let Some(engine) = scroll {
            engine.scroll_to(self.sections[index].extent.top, GO_SECS, Ease::OutCubic);
        }
    }

    /// Document-global arrow / escape bindings.
    pub fn handle_key(&mut self, key: Key, stage: &mut Stage, scroll: Option<&mut SmoothScroll>) {
        let active = self.state.active as i64;
        match key {
            Key::ArrowUp | Key::ArrowLeft => self.go(active - 1, stage, scroll),
            Key::ArrowDown | Key::ArrowRight => self.go(active + 1, stage, scroll),
            Key::Escape => {
                self.toggle_expand(Some(false), stage);
                self.toggle_menu(Some(false), stage);
            }
        }
    }

    /// Document-global click routing.
    pub fn handle_click(
        &mut self,
        page: &Page,
        target: &str,
        stage: &mut Stage,
        scroll: Option<&mut SmoothScroll>,
    ) {
        if let Some(btn) = &self.menu_btn {
            if page.is_within(btn, target) {
                self.toggle_menu(None, stage);
                return;
            }
        }

        if page.is_within(&self.root, target) {
            let active = self.state.active as i64;
            // Arrow buttons are only interactive while expanded; collapsed,
            // the click falls through to the island body.
            if self.state.expanded {
                if self.prev_btn.as_deref().is_some_and(|b| b == target) {
                    self.go(active - 1, stage, scroll);
                    return;
                }
                if self.next_btn.as_deref().is_some_and(|b| b == target) {
                    self.go(active + 1, stage, scroll);
                    return;
                }
            }
            self.toggle_expand(None, stage);
            return;
        }

        // Outside the island and the menu trigger: both panels close.
        self.toggle_expand(Some(false), stage);
        self.toggle_menu(Some(false), stage);
    }

    /// Expanded-controls panel. Width is the collapsed→expanded fraction;
    /// arrows fade/scale in with a small stagger. Idempotent on equal state.
    pub fn toggle_expand(&mut self, force: Option<bool>, stage: &mut Stage) {
        let expanded = force.unwrap_or(!self.state.expanded);
        if expanded == self.state.expanded {
            return;
        }
        self.state.expanded = expanded;

        let width = if expanded { 1.0 } else { 0.0 };
        stage.to(&self.root, Prop::Width, width, EXPAND_SECS, Ease::OutCubic);

        let (opacity, scale) = if expanded { (1.0, 1.0) } else { (0.0, 0.6) };
        for (i, btn) in [&self.prev_btn, &self.next_btn]
            .into_iter()
            .flatten()
            .enumerate()
        {
            let delay = i as f64 * BUTTON_STAGGER_SECS;
            stage.to_delayed(delay, btn, Prop::Opacity, opacity, BUTTON_SECS, Ease::OutCubic);
            stage.to_delayed(delay, btn, Prop::Scale, scale, BUTTON_SECS, Ease::OutCubic);
        }
    }

    /// Auxiliary page-link menu panel. Idempotent on equal state.
    pub fn toggle_menu(&mut self, force: Option<bool>, stage: &mut Stage) {
        let open = force.unwrap_or(!self.state.menu_open);
        if open == self.state.menu_open {
            return;
        }
        self.state.menu_open = open;

        if let Some(panel) = &self.menu_panel {
            let (opacity, scale) = if open { (1.0, 1.0) } else { (0.0, 0.8) };
            stage.to(panel, Prop::Opacity, opacity, MENU_SECS, Ease::OutCubic);
            stage.to(panel, Prop::Scale, scale, MENU_SECS, Ease::OutCubic);
        }
    }

    /// Advances the scramble transition one frame.
    pub fn tick(&mut self) {
        self.scramble.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::Viewport,
        page::Element,
        scroll::{ScrollTuning, SmoothScroll},
    };
    use std::collections::BTreeMap;

    fn section(id: &str, top: f64, title: Option<&str>, heading: Option<&str>) -> Element {
        let mut attrs = BTreeMap::new();
        attrs.insert(attr::NAV_SECTION.to_string(), String::new());
        if let Some(t) = title {
            attrs.insert(attr::NAV_TITLE.to_string(), t.to_string());
        }
        Element {
            id: id.to_string(),
            extent: Extent { top, height: 600.0 },
            parent: None,
            attrs: attrs.clone(),
            heading: heading.map(str::to_string),
            text: None,
        }
    }

    fn tagged(id: &str, key: &str, parent: Option<&str>) -> Element {
        let mut attrs = BTreeMap::new();
        attrs.insert(key.to_string(), String::new());
        Element {
            id: id.to_string(),
            extent: Extent {
                top: 0.0,
                height: 40.0,
            },
            parent: parent.map(str::to_string),
            attrs,
            heading: None,
            text: None,
        }
    }

    fn page() -> Page {
        Page {
            path: "/index.html".to_string(),
            viewport: Viewport { height: 800.0 },
            elements: vec![
                section("s0", 0.0, Some("Intro"), None),
                section("s1", 800.0, None, Some("Work")),
                section("s2", 1600.0, None, None),
                tagged("island", attr::ISLAND, None),
                tagged("islandText", attr::ISLAND_TEXT, Some("island")),
                tagged("prevBtn", attr::ISLAND_PREV, Some("island")),
                tagged("nextBtn", attr::ISLAND_NEXT, Some("island")),
                tagged("progressBar", attr::ISLAND_PROGRESS, Some("island")),
                tagged("menuButton", attr::ISLAND_MENU_BUTTON, None),
                tagged("menuPanel", attr::ISLAND_MENU_PANEL, None),
            ],
        }
    }

    fn build() -> (IslandNav, Stage) {
        let page = page();
        let mut nav = IslandNav::from_page(&page, 1, Tps::default()).unwrap();
        let mut stage = Stage::new(Tps::default());
        nav.init(&mut stage);
        (nav, stage)
    }

    fn settle(nav: &mut IslandNav, stage: &mut Stage) {
        for _ in 0..200 {
            stage.tick();
            nav.tick();
        }
    }

    #[test]
    fn titles_resolve_override_heading_placeholder() {
        let page = page();
        let nav = IslandNav::from_page(&page, 1, Tps::default()).unwrap();
        let titles: Vec<&str> = nav.sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro", "Work", "Section 2"]);
    }

    #[test]
    fn absent_markup_is_inert() {
        let empty = Page {
            path: "/".to_string(),
            viewport: Viewport { height: 800.0 },
            elements: vec![tagged("island", attr::ISLAND, None)],
        };
        assert!(IslandNav::from_page(&empty, 1, Tps::default()).is_none());
    }

    #[test]
    fn go_clamps_and_suppresses_noop() {
        let (mut nav, mut stage) = build();
        let mut engine =
            SmoothScroll::new(Tps::default(), ScrollTuning::default(), 2000.0).unwrap();

        nav.go(-5, &mut stage, Some(&mut engine));
        assert_eq!(nav.state().active, 0);
        assert!(!engine.is_gliding(), "same-index go must not scroll");

        nav.go(99, &mut stage, Some(&mut engine));
        assert_eq!(nav.state().active, 2);
        assert!(engine.is_gliding());
    }

    #[test]
    fn go_without_engine_never_panics() {
        let (mut nav, mut stage) = build();
        nav.go(1, &mut stage, None);
        assert_eq!(nav.state().active, 1);
    }

    #[test]
    fn progress_tracks_active_section() {
        let (mut nav, mut stage) = build();
        nav.set_active(1, &mut stage);
        settle(&mut nav, &mut stage);
        let pct = stage.get("progressBar", Prop::Width, 0.0);
        assert!((pct - 2.0 / 3.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn crossing_suppressed_during_glide() {
        let (mut nav, mut stage) = build();
        nav.on_section_crossing(1, true, true, &mut stage);
        assert_eq!(nav.state().active, 0);
        nav.on_section_crossing(1, true, false, &mut stage);
        assert_eq!(nav.state().active, 1);
    }

    #[test]
    fn expand_toggle_is_idempotent() {
        let (mut nav, mut stage) = build();
        settle(&mut nav, &mut stage);

        nav.toggle_expand(Some(true), &mut stage);
        assert!(nav.state().expanded);
        settle(&mut nav, &mut stage);

        nav.toggle_expand(Some(true), &mut stage);
        assert_eq!(stage.active_tweens(), 0, "no new animation when equal");

        nav.toggle_expand(None, &mut stage);
        nav.toggle_expand(None, &mut stage);
        assert!(!nav.state().expanded);
        settle(&mut nav, &mut stage);
        assert_eq!(stage.get("island", Prop::Width, 9.0), 0.0);
    }

    #[test]
    fn collapsed_arrow_click_expands_instead_of_navigating() {
        let page = page();
        let (mut nav, mut stage) = build();
        nav.handle_click(&page, "nextBtn", &mut stage, None);
        assert!(nav.state().expanded);
        assert_eq!(nav.state().active, 0);

        nav.handle_click(&page, "nextBtn", &mut stage, None);
        assert_eq!(nav.state().active, 1);
        assert!(nav.state().expanded, "arrow click does not collapse");
    }

    #[test]
    fn outside_click_closes_both_panels() {
        let page = page();
        let (mut nav, mut stage) = build();
        nav.toggle_expand(Some(true), &mut stage);
        nav.toggle_menu(Some(true), &mut stage);

        nav.handle_click(&page, "s0", &mut stage, None);
        let st = nav.state();
        assert!(!st.expanded);
        assert!(!st.menu_open);
    }

    #[test]
    fn scramble_settles_on_new_title() {
        let (mut nav, mut stage) = build();
        nav.set_active(1, &mut stage);
        settle(&mut nav, &mut stage);
        assert_eq!(nav.title_text(), "WORK");
    }
}
