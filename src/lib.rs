//! Glissade is a deterministic, headless reimplementation of a marketing
//! page's animation layer: inertial smooth scrolling, scroll-linked effects
//! (fade-up, staggered reveals, parallax, bloom), a slide-out menu, hover
//! media crossfades, and a scroll-spy "dynamic island" navigation widget.
//!
//! Everything runs in a fixed-rate tick domain driven by an explicit event
//! queue, so any input script replays to the exact same frame-by-frame
//! state:
//!
//! - Describe the page as a [`Page`] document
//! - Boot an [`Orchestrator`] with an [`EngineConfig`]
//! - Feed [`InputEvent`]s through `dispatch` and step with `tick`

#![forbid(unsafe_code)]

pub mod core;
pub mod ease;
pub mod effects;
pub mod error;
pub mod events;
pub mod island;
pub mod media;
pub mod menu;
pub mod observer;
pub mod orchestrator;
pub mod page;
pub mod scramble;
pub mod scroll;
pub mod tween;

pub use crate::core::{Extent, Tick, Tps, Viewport};
pub use ease::Ease;
pub use effects::Effects;
pub use error::{GlissadeError, GlissadeResult};
pub use events::{InputEvent, Key, ScriptStep};
pub use island::{IslandNav, NavState};
pub use media::Media;
pub use menu::MenuOverlay;
pub use observer::{Crossing, IntersectionWatcher, WatchTag};
pub use orchestrator::{EngineConfig, Orchestrator, StateReport};
pub use page::{Element, Page};
pub use scramble::Scramble;
pub use scroll::{ScrollTuning, SmoothScroll};
pub use tween::{Prop, Stage};
