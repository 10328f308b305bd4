use std::collections::VecDeque;

use crate::{
    core::{Tick, Tps},
    ease::Ease,
    effects::Effects,
    error::{GlissadeError, GlissadeResult},
    events::InputEvent,
    island::IslandNav,
    media::Media,
    menu::MenuOverlay,
    observer::{IntersectionWatcher, WatchTag},
    page::{Page, attr},
    scroll::{ScrollTuning, SmoothScroll},
    tween::{Prop, Stage},
};

/// Hero visibility threshold for the header blend flag.
const HERO_THRESHOLD: f64 = 0.3;

const ARROW_NUDGE_PX: f64 = 5.0;

/// Engine tuning handed to [`Orchestrator::boot`]. Stands in for the
/// third-party engines the page layer depends on; invalid tuning is the
/// missing-dependency failure: boot aborts with one diagnosable error and
/// the page stays static.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    pub tps: Tps,
    pub scroll: ScrollTuning,
    /// Seed for the scramble transition's glyph noise.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tps: Tps::default(),
            scroll: ScrollTuning::default(),
            seed: 0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> GlissadeResult<()> {
        Tps::new(self.tps.num, self.tps.den)?;
        self.scroll.validate()?;
        Ok(())
    }
}

/// Serializable snapshot of the animation layer's observable state.
#[derive(Clone, Debug, serde::Serialize)]
pub struct StateReport {
    pub tick: Tick,
    pub scroll_pos: f64,
    pub scrolling: bool,
    pub active_section: Option<usize>,
    pub active_title: Option<String>,
    pub progress_pct: Option<f64>,
    pub island_expanded: bool,
    pub island_menu_open: bool,
    pub page_menu_open: bool,
    pub at_hero: bool,
}

/// The page's animation layer: owns the smooth-scroll engine, the tween
/// stage, the intersection watcher and every behavior wired off markup.
///
/// Constructed exactly once by the hosting environment via
/// [`Orchestrator::boot`]; there is no teardown path other than
/// [`Orchestrator::destroy`]. Input arrives through [`Orchestrator::dispatch`]
/// and is applied by [`Orchestrator::tick`], one deterministic frame per
/// call.
#[derive(Debug)]
pub struct Orchestrator {
    page: Page,
    scroll: SmoothScroll,
    stage: Stage,
    watcher: IntersectionWatcher,
    island: Option<IslandNav>,
    menu: Option<MenuOverlay>,
    media: Media,
    effects: Effects,
    arrows: Vec<(String, String)>, // (button, arrow child)
    queue: VecDeque<InputEvent>,
    at_hero: bool,
    pending_refresh: bool,
    tick: Tick,
    destroyed: bool,
}

impl Orchestrator {
    #[tracing::instrument(skip(page, cfg), err)]
    pub fn boot(page: Page, cfg: EngineConfig) -> GlissadeResult<Self> {
        cfg.validate().map_err(|e| {
            GlissadeError::dependency(format!("animation engines unavailable: {e}"))
        })?;
        page.validate()?;

        let scroll = SmoothScroll::new(cfg.tps, cfg.scroll, page.max_scroll())?;
        let mut stage = Stage::new(cfg.tps);
        let mut watcher = IntersectionWatcher::new();

        let menu = MenuOverlay::from_page(&page, &mut stage);
        let media = Media::from_page(&page, &mut stage, &mut watcher);

        let island = IslandNav::from_page(&page, cfg.seed, cfg.tps).map(|mut nav| {
            nav.observe(&mut watcher);
            nav.init(&mut stage);
            nav
        });

        if let Some(hero) = page.first_with_attr(attr::HERO) {
            watcher.observe(&hero.id, hero.extent, HERO_THRESHOLD, 0.0, WatchTag::Hero);
        }

        let arrows: Vec<(String, String)> = page
            .with_attr(attr::BUTTON)
            .into_iter()
            .filter_map(|btn| {
                page.children_of(&btn.id)
                    .into_iter()
                    .find(|c| c.has_attr(attr::ARROW))
                    .map(|arrow| (btn.id.clone(), arrow.id.clone()))
            })
            .collect();

        animate_page_entry(&page, &mut stage);
        let effects = Effects::compile(&page, &mut stage);

        tracing::info!(
            sections = island.as_ref().map_or(0, IslandNav::section_count),
            effects = effects.rule_count(),
            videos = media.video_count(),
            menu = menu.is_some(),
            "animation layer booted"
        );

        Ok(Self {
            page,
            scroll,
            stage,
            watcher,
            island,
            menu,
            media,
            effects,
            arrows,
            queue: VecDeque::new(),
            at_hero: false,
            pending_refresh: false,
            tick: Tick(0),
            destroyed: false,
        })
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn scroll(&self) -> &SmoothScroll {
        &self.scroll
    }

    pub fn island(&self) -> Option<&IslandNav> {
        self.island.as_ref()
    }

    pub fn media(&self) -> &Media {
        &self.media
    }

    pub fn at_hero(&self) -> bool {
        self.at_hero
    }

    /// Enqueues an input event for the next tick.
    pub fn dispatch(&mut self, event: InputEvent) {
        if !self.destroyed {
            self.queue.push_back(event);
        }
    }

    /// One simulation frame: drain input, step scroll physics, deliver
    /// visibility crossings, drive effects, advance tweens and transitions.
    pub fn tick(&mut self) {
        if self.destroyed {
            return;
        }

        while let Some(event) = self.queue.pop_front() {
            self.route(event);
        }

        if self.pending_refresh {
            self.pending_refresh = false;
            self.refresh();
        }

        self.scroll.tick();

        let crossings = self.watcher.evaluate(self.scroll.pos(), self.page.viewport);
        for crossing in crossings {
            match crossing.tag {
                WatchTag::NavSection(index) => {
                    if let Some(island) = self.island.as_mut() {
                        island.on_section_crossing(
                            index,
                            crossing.entered,
                            self.scroll.is_gliding(),
                            &mut self.stage,
                        );
                    }
                }
                WatchTag::Hero => self.at_hero = crossing.entered,
                WatchTag::MediaPreload => {
                    self.media
                        .on_preload_crossing(&crossing.element, crossing.entered);
                }
            }
        }

        self.effects.drive(self.scroll.pos(), &mut self.stage);
        self.stage.tick();
        if let Some(island) = self.island.as_mut() {
            island.tick();
        }
        self.media.tick(&self.stage);

        self.tick = self.tick.next();
    }

    fn route(&mut self, event: InputEvent) {
        let was_gliding = self.scroll.is_gliding();
        match event {
            InputEvent::Wheel { delta } => self.scroll.wheel(delta),
            InputEvent::Key { key } => {
                if let Some(menu) = self.menu.as_mut() {
                    menu.handle_key(key, &mut self.stage, &mut self.scroll);
                }
                if let Some(island) = self.island.as_mut() {
                    island.handle_key(key, &mut self.stage, Some(&mut self.scroll));
                }
            }
            InputEvent::Click { target } => {
                if let Some(menu) = self.menu.as_mut() {
                    menu.handle_click(&target, &mut self.stage, &mut self.scroll);
                }
                if let Some(island) = self.island.as_mut() {
                    island.handle_click(
                        &self.page,
                        &target,
                        &mut self.stage,
                        Some(&mut self.scroll),
                    );
                }
            }
            InputEvent::PointerEnter { target } => {
                self.media
                    .handle_pointer_enter(&self.page, &target, &mut self.stage);
                for (button, arrow) in &self.arrows {
                    if self.page.is_within(button, &target) {
                        self.stage
                            .to(arrow, Prop::X, ARROW_NUDGE_PX, 0.3, Ease::OutCubic);
                    }
                }
            }
            InputEvent::PointerLeave { target } => {
                self.media
                    .handle_pointer_leave(&self.page, &target, &mut self.stage);
                for (button, arrow) in &self.arrows {
                    if self.page.is_within(button, &target) {
                        self.stage.to(arrow, Prop::X, 0.0, 0.3, Ease::OutCubic);
                    }
                }
            }
            InputEvent::Resize { viewport_height } => {
                if viewport_height.is_finite() && viewport_height > 0.0 {
                    self.page.viewport.height = viewport_height;
                    // Coalesced: one refresh per tick no matter how many
                    // resize events arrived.
                    self.pending_refresh = true;
                }
            }
        }

        // Crossings that flipped mid-glide were consumed while the island
        // ignored them. A completed glide rests on its pre-activated target,
        // but a cancelled one (wheel autoKill, menu stop) can rest anywhere:
        // replay the current visibility so the next evaluate re-delivers it.
        if was_gliding && !self.scroll.is_gliding() {
            self.watcher.rearm();
        }
    }

    fn refresh(&mut self) {
        self.scroll.set_max_scroll(self.page.max_scroll());
        self.effects.refresh(&self.page);
        for el in &self.page.elements {
            self.watcher.update_extent(&el.id, el.extent);
        }
    }

    /// Unregisters every scroll-triggered behavior and releases the scroll
    /// engine. The orchestrator is inert afterwards.
    pub fn destroy(&mut self) {
        self.stage.clear();
        self.watcher.clear();
        self.effects.clear();
        self.queue.clear();
        self.scroll.stop();
        self.scroll.start();
        self.destroyed = true;
        tracing::info!("animation layer destroyed");
    }

    pub fn report(&self) -> StateReport {
        let island = self.island.as_ref();
        StateReport {
            tick: self.tick,
            scroll_pos: self.scroll.pos(),
            scrolling: self.scroll.is_scrolling(),
            active_section: island.map(|nav| nav.state().active),
            active_title: island.map(|nav| nav.title_text().to_string()),
            progress_pct: island.map(|nav| {
                (nav.state().active + 1) as f64 / nav.section_count() as f64 * 100.0
            }),
            island_expanded: island.is_some_and(|nav| nav.state().expanded),
            island_menu_open: island.is_some_and(|nav| nav.state().menu_open),
            page_menu_open: self.menu.as_ref().is_some_and(MenuOverlay::is_open),
            at_hero: self.at_hero,
        }
    }
}

/// The once-per-load page entry timeline: hero title lines rise in with a
/// stagger, hero media de-zooms, metadata fades up last.
fn animate_page_entry(page: &Page, stage: &mut Stage) {
    let mut titles = 0usize;
    let mut metas = 0usize;
    for el in page.with_attr(attr::ENTRY) {
        match el.attr(attr::ENTRY) {
            Some("title") => {
                stage.set(&el.id, Prop::Opacity, 0.0);
                stage.set(&el.id, Prop::Y, 100.0);
                stage.set(&el.id, Prop::Rotation, 7.0);
                let delay = 0.2 + titles as f64 * 0.12;
                stage.to_delayed(delay, &el.id, Prop::Opacity, 1.0, 1.0, Ease::OutCubic);
                stage.to_delayed(delay, &el.id, Prop::Y, 0.0, 1.0, Ease::OutCubic);
                stage.to_delayed(delay, &el.id, Prop::Rotation, 0.0, 1.0, Ease::OutCubic);
                titles += 1;
            }
            Some("media") => {
                stage.set(&el.id, Prop::Scale, 1.3);
                stage.to(&el.id, Prop::Scale, 1.0, 1.4, Ease::OutCubic);
            }
            Some("meta") => {
                stage.set(&el.id, Prop::Opacity, 0.0);
                stage.set(&el.id, Prop::Y, 20.0);
                let delay = 0.6 + metas as f64 * 0.15;
                stage.to_delayed(delay, &el.id, Prop::Opacity, 1.0, 0.8, Ease::OutCubic);
                stage.to_delayed(delay, &el.id, Prop::Y, 0.0, 0.8, Ease::OutCubic);
                metas += 1;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Extent, Viewport};
    use crate::page::Element;
    use std::collections::BTreeMap;

    fn tagged(id: &str, pairs: &[(&str, &str)], top: f64, height: f64) -> Element {
        let attrs: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Element {
            id: id.to_string(),
            extent: Extent { top, height },
            parent: None,
            attrs,
            heading: None,
            text: None,
        }
    }

    fn minimal_page() -> Page {
        Page {
            path: "/index.html".to_string(),
            viewport: Viewport { height: 800.0 },
            elements: vec![
                tagged("hero", &[(attr::HERO, "")], 0.0, 800.0),
                tagged("spacer", &[], 800.0, 2400.0),
            ],
        }
    }

    #[test]
    fn boot_rejects_invalid_engine_tuning() {
        let cfg = EngineConfig {
            tps: Tps { num: 0, den: 1 },
            ..EngineConfig::default()
        };
        let err = Orchestrator::boot(minimal_page(), cfg).unwrap_err();
        assert!(matches!(err, GlissadeError::Dependency(_)));
    }

    #[test]
    fn hero_flag_follows_visibility() {
        let mut orch = Orchestrator::boot(minimal_page(), EngineConfig::default()).unwrap();
        orch.tick();
        assert!(orch.at_hero());

        orch.dispatch(InputEvent::Wheel { delta: 2400.0 });
        for _ in 0..400 {
            orch.tick();
        }
        assert!(!orch.at_hero());
    }

    #[test]
    fn destroy_makes_the_layer_inert() {
        let mut orch = Orchestrator::boot(minimal_page(), EngineConfig::default()).unwrap();
        orch.destroy();
        assert!(orch.is_destroyed());

        orch.dispatch(InputEvent::Wheel { delta: 500.0 });
        for _ in 0..120 {
            orch.tick();
        }
        assert_eq!(orch.scroll().pos(), 0.0);
        assert_eq!(orch.stage().active_tweens(), 0);
    }

    #[test]
    fn entry_timeline_settles_visible() {
        let page = Page {
            path: "/index.html".to_string(),
            viewport: Viewport { height: 800.0 },
            elements: vec![
                tagged("line0", &[(attr::ENTRY, "title")], 0.0, 80.0),
                tagged("line1", &[(attr::ENTRY, "title")], 80.0, 80.0),
                tagged("heroImg", &[(attr::ENTRY, "media")], 0.0, 600.0),
                tagged("sub", &[(attr::ENTRY, "meta")], 700.0, 40.0),
            ],
        };
        let mut orch = Orchestrator::boot(page, EngineConfig::default()).unwrap();
        for _ in 0..200 {
            orch.tick();
        }
        let stage = orch.stage();
        assert_eq!(stage.get("line0", Prop::Opacity, 0.0), 1.0);
        assert_eq!(stage.get("line1", Prop::Opacity, 0.0), 1.0);
        assert_eq!(stage.get("heroImg", Prop::Scale, 0.0), 1.0);
        assert_eq!(stage.get("sub", Prop::Y, 9.0), 0.0);
    }

    #[test]
    fn resize_is_coalesced_and_updates_max_scroll() {
        let mut orch = Orchestrator::boot(minimal_page(), EngineConfig::default()).unwrap();
        orch.dispatch(InputEvent::Resize {
            viewport_height: 400.0,
        });
        orch.dispatch(InputEvent::Resize {
            viewport_height: 600.0,
        });
        orch.tick();
        assert_eq!(orch.page().viewport.height, 600.0);
        assert_eq!(orch.scroll().max_scroll(), 3200.0 - 600.0);
    }
}
