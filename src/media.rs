use std::collections::BTreeMap;

use crate::{
    ease::Ease,
    observer::{IntersectionWatcher, WatchTag},
    page::{Page, attr},
    tween::{Prop, Stage},
};

/// How far outside the viewport videos start preloading.
const PRELOAD_MARGIN_PX: f64 = 400.0;

const FADE_IN_SECS: f64 = 0.4;
const FADE_OUT_SECS: f64 = 0.3;

/// Playback state of one video element. Playback is only ever touched by
/// hover crossfades — scrolling never starts or stops a video.
#[derive(Clone, Debug, Default)]
pub struct VideoState {
    pub loaded: bool,
    pub playing: bool,
    pub position_ticks: u64,
    /// Browser autoplay policy refused `play()`. Swallowed, never an error.
    pub autoplay_blocked: bool,
}

#[derive(Clone, Debug)]
struct Card {
    element: String,
    image: String,
    video: String,
    hovering: bool,
    /// Fade-out finished → pause and rewind.
    pending_pause: bool,
}

/// Passive video preloading plus hover-driven image/video crossfades.
#[derive(Clone, Debug, Default)]
pub struct Media {
    videos: BTreeMap<String, VideoState>,
    cards: Vec<Card>,
}

impl Media {
    pub fn from_page(page: &Page, stage: &mut Stage, watcher: &mut IntersectionWatcher) -> Self {
        let mut videos = BTreeMap::new();
        for el in page.with_attr(attr::VIDEO) {
            let blocked = el.attr(attr::AUTOPLAY) == Some("block");
            videos.insert(
                el.id.clone(),
                VideoState {
                    autoplay_blocked: blocked,
                    ..VideoState::default()
                },
            );
            watcher.observe(&el.id, el.extent, 0.0, PRELOAD_MARGIN_PX, WatchTag::MediaPreload);
        }

        let mut cards = Vec::new();
        for card_el in page.with_attr(attr::CARD) {
            let children = page.children_of(&card_el.id);
            let image = children.iter().find(|c| c.has_attr(attr::CARD_IMAGE));
            let video = children.iter().find(|c| c.has_attr(attr::CARD_VIDEO));
            let (Some(image), Some(video)) = (image, video) else {
                continue;
            };

            stage.set(&image.id, Prop::Opacity, 1.0);
            stage.set(&video.id, Prop::Opacity, 0.0);
            // Card videos preload eagerly.
            videos
                .entry(video.id.clone())
                .or_insert_with(VideoState::default)
                .loaded = true;

            cards.push(Card {
                element: card_el.id.clone(),
                image: image.id.clone(),
                video: video.id.clone(),
                hovering: false,
                pending_pause: false,
            });
        }

        Self { videos, cards }
    }

    pub fn video(&self, id: &str) -> Option<&VideoState> {
        self.videos.get(id)
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// Preload crossing from the watcher.
    pub fn on_preload_crossing(&mut self, element: &str, entered: bool) {
        if !entered {
            return;
        }
        if let Some(video) = self.videos.get_mut(element) {
            video.loaded = true;
        }
    }

    pub fn handle_pointer_enter(&mut self, page: &Page, target: &str, stage: &mut Stage) {
        for card in &mut self.cards {
            if card.element != target && !page.is_within(&card.element, target) {
                continue;
            }
            if card.hovering {
                return;
            }
            card.hovering = true;
            card.pending_pause = false;

            stage.to(&card.image, Prop::Opacity, 0.0, FADE_IN_SECS, Ease::OutCubic);
            stage.to(&card.video, Prop::Opacity, 1.0, FADE_IN_SECS, Ease::OutCubic);

            if let Some(video) = self.videos.get_mut(&card.video) {
                video.loaded = true;
                // A blocked autoplay leaves the video paused; the hover
                // state itself is unaffected.
                if !video.autoplay_blocked {
                    video.playing = true;
                }
            }
            return;
        }
    }

    pub fn handle_pointer_leave(&mut self, page: &Page, target: &str, stage: &mut Stage) {
        for card in &mut self.cards {
            if card.element != target && !page.is_within(&card.element, target) {
                continue;
            }
            if !card.hovering {
                return;
            }
            card.hovering = false;
            card.pending_pause = true;

            stage.to(&card.video, Prop::Opacity, 0.0, FADE_OUT_SECS, Ease::OutCubic);
            stage.to(&card.image, Prop::Opacity, 1.0, FADE_OUT_SECS, Ease::OutCubic);
            return;
        }
    }

    /// Advances playback positions and finalizes settled fade-outs
    /// (pause + rewind once the video is fully hidden).
    pub fn tick(&mut self, stage: &Stage) {
        for video in self.videos.values_mut() {
            if video.playing {
                video.position_ticks += 1;
            }
        }
        for card in &mut self.cards {
            if card.pending_pause
                && stage.is_settled(&card.video, Prop::Opacity)
                && stage.get(&card.video, Prop::Opacity, 0.0) == 0.0
            {
                card.pending_pause = false;
                if let Some(video) = self.videos.get_mut(&card.video) {
                    video.playing = false;
                    video.position_ticks = 0;
                }
            }
        }
    }
}
