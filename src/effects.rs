use crate::{
    core::{Extent, Viewport},
    ease::Ease,
    page::{Page, attr},
    tween::{Prop, Stage},
};

// Trigger lines, as fractions of the viewport height measured from its top
// ("top 85%" in scroll-trigger terms).
const FADE_UP_START: f64 = 0.85;
const TITLE_SPLIT_START: f64 = 0.80;
const STAGGER_START: f64 = 0.75;
const BLOOM_START: f64 = 0.80;
const COUNTER_START: f64 = 0.80;

const BLOOM_BRIGHTNESS: f64 = 1.45;
const BLOOM_SATURATE: f64 = 1.35;
const COUNTER_SECS: f64 = 2.5;

#[derive(Clone, Debug)]
enum RuleKind {
    FadeUp,
    TitleSplit { lines: Vec<String> },
    StaggerChildren { children: Vec<String> },
    Parallax { speed: f64 },
    Bloom,
    Counter { target: f64 },
}

#[derive(Clone, Debug)]
struct Rule {
    element: String,
    extent: Extent,
    kind: RuleKind,
    entered: bool,
}

/// Scroll-linked visual effects, compiled once from page attributes and
/// driven every tick from the scroll position. Trigger-style rules fire
/// tweens on crossing their start line; the parallax rule is scrubbed —
/// written directly each tick, position-linked rather than time-linked.
#[derive(Clone, Debug)]
pub struct Effects {
    rules: Vec<Rule>,
    viewport: Viewport,
}

impl Effects {
    /// Compiles the rule table and writes every initial hidden state.
    pub fn compile(page: &Page, stage: &mut Stage) -> Self {
        let mut rules = Vec::new();

        for el in page.with_attr(attr::ANIMATE) {
            match el.attr(attr::ANIMATE) {
                Some("fade-up") => {
                    stage.set(&el.id, Prop::Opacity, 0.0);
                    stage.set(&el.id, Prop::Y, 40.0);
                    rules.push(Rule {
                        element: el.id.clone(),
                        extent: el.extent,
                        kind: RuleKind::FadeUp,
                        entered: false,
                    });
                }
                Some("title-split") => {
                    let lines: Vec<String> = page
                        .children_of(&el.id)
                        .into_iter()
                        .filter(|c| c.has_attr(attr::TITLE_LINE))
                        .map(|c| c.id.clone())
                        .collect();
                    if lines.is_empty() {
                        continue;
                    }
                    for line in &lines {
                        stage.set(line, Prop::Opacity, 0.0);
                        stage.set(line, Prop::Y, 100.0);
                        stage.set(line, Prop::Rotation, 7.0);
                    }
                    rules.push(Rule {
                        element: el.id.clone(),
                        extent: el.extent,
                        kind: RuleKind::TitleSplit { lines },
                        entered: false,
                    });
                }
                _ => {}
            }
        }

        for el in page.with_attr(attr::STAGGER_CHILDREN) {
            let children: Vec<String> = page
                .children_of(&el.id)
                .into_iter()
                .map(|c| c.id.clone())
                .collect();
            if children.is_empty() {
                continue;
            }
            for child in &children {
                stage.set(child, Prop::Opacity, 0.0);
                stage.set(child, Prop::Y, 40.0);
                stage.set(child, Prop::Scale, 0.95);
            }
            rules.push(Rule {
                element: el.id.clone(),
                extent: el.extent,
                kind: RuleKind::StaggerChildren { children },
                entered: false,
            });
        }

        for el in page.with_attr(attr::PARALLAX) {
            let speed = el
                .attr(attr::SPEED)
                .or_else(|| el.attr(attr::PARALLAX).filter(|v| !v.is_empty()))
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.5);
            stage.set(&el.id, Prop::Y, 0.0);
            rules.push(Rule {
                element: el.id.clone(),
                extent: el.extent,
                kind: RuleKind::Parallax { speed },
                entered: false,
            });
        }

        for el in page.with_attr(attr::BLOOM) {
            stage.set(&el.id, Prop::Brightness, 1.0);
            stage.set(&el.id, Prop::Saturate, 1.0);
            rules.push(Rule {
                element: el.id.clone(),
                extent: el.extent,
                kind: RuleKind::Bloom,
                entered: false,
            });
        }

        for el in page.with_attr(attr::COUNTER) {
            let Some((target, _, _)) = el.text.as_deref().and_then(split_counter_text) else {
                continue;
            };
            stage.set(&el.id, Prop::Count, 0.0);
            rules.push(Rule {
                element: el.id.clone(),
                extent: el.extent,
                kind: RuleKind::Counter { target },
                entered: false,
            });
        }

        Self {
            rules,
            viewport: page.viewport,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Re-reads geometry after a resize. Fired-once rules stay fired.
    pub fn refresh(&mut self, page: &Page) {
        self.viewport = page.viewport;
        for rule in &mut self.rules {
            if let Some(el) = page.get(&rule.element) {
                rule.extent = el.extent;
            }
        }
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Evaluates every rule against the current scroll position.
    pub fn drive(&mut self, scroll_y: f64, stage: &mut Stage) {
        let vp = self.viewport.height;
        for rule in &mut self.rules {
            match &rule.kind {
                RuleKind::FadeUp => {
                    if !rule.entered && rule.extent.top <= scroll_y + vp * FADE_UP_START {
                        rule.entered = true;
                        stage.to(&rule.element, Prop::Opacity, 1.0, 0.8, Ease::OutCubic);
                        stage.to(&rule.element, Prop::Y, 0.0, 0.8, Ease::OutCubic);
                    }
                }
                RuleKind::TitleSplit { lines } => {
                    let inside = rule.extent.top <= scroll_y + vp * TITLE_SPLIT_START;
                    if inside && !rule.entered {
                        rule.entered = true;
                        for (i, line) in lines.iter().enumerate() {
                            let delay = i as f64 * 0.1;
                            stage.to_delayed(delay, line, Prop::Opacity, 1.0, 1.0, Ease::OutCubic);
                            stage.to_delayed(delay, line, Prop::Y, 0.0, 1.0, Ease::OutCubic);
                            stage.to_delayed(delay, line, Prop::Rotation, 0.0, 1.0, Ease::OutCubic);
                        }
                    } else if !inside && rule.entered {
                        // Scrolled back above the trigger: reverse.
                        rule.entered = false;
                        for line in lines {
                            stage.to(line, Prop::Opacity, 0.0, 1.0, Ease::OutCubic);
                            stage.to(line, Prop::Y, 100.0, 1.0, Ease::OutCubic);
                            stage.to(line, Prop::Rotation, 7.0, 1.0, Ease::OutCubic);
                        }
                    }
                }
                RuleKind::StaggerChildren { children } => {
                    if !rule.entered && rule.extent.top <= scroll_y + vp * STAGGER_START {
                        rule.entered = true;
                        let step = 0.6 / children.len() as f64;
                        for (i, child) in children.iter().enumerate() {
                            let delay = i as f64 * step;
                            stage.to_delayed(delay, child, Prop::Opacity, 1.0, 0.9, Ease::OutCubic);
                            stage.to_delayed(delay, child, Prop::Y, 0.0, 0.9, Ease::OutCubic);
                            stage.to_delayed(delay, child, Prop::Scale, 1.0, 0.9, Ease::OutCubic);
                        }
                    }
                }
                RuleKind::Parallax { speed } => {
                    // Progress spans enters-bottom → leaves-top.
                    let span = vp + rule.extent.height;
                    if span <= 0.0 {
                        continue;
                    }
                    let progress = ((scroll_y + vp - rule.extent.top) / span).clamp(0.0, 1.0);
                    let y = -progress * vp * speed * 0.5;
                    stage.set(&rule.element, Prop::Y, y);
                }
                RuleKind::Bloom => {
                    let inside = rule.extent.top <= scroll_y + vp * BLOOM_START;
                    if inside && !rule.entered {
                        rule.entered = true;
                        stage.to(
                            &rule.element,
                            Prop::Brightness,
                            BLOOM_BRIGHTNESS,
                            0.8,
                            Ease::OutCubic,
                        );
                        stage.to(
                            &rule.element,
                            Prop::Saturate,
                            BLOOM_SATURATE,
                            0.8,
                            Ease::OutCubic,
                        );
                    } else if !inside && rule.entered {
                        rule.entered = false;
                        stage.to(&rule.element, Prop::Brightness, 1.0, 0.8, Ease::OutCubic);
                        stage.to(&rule.element, Prop::Saturate, 1.0, 0.8, Ease::OutCubic);
                    }
                }
                RuleKind::Counter { target } => {
                    if !rule.entered && rule.extent.top <= scroll_y + vp * COUNTER_START {
                        rule.entered = true;
                        stage.to(
                            &rule.element,
                            Prop::Count,
                            *target,
                            COUNTER_SECS,
                            Ease::OutQuad,
                        );
                    }
                }
            }
        }
    }

    /// Renders a counter element's display text from its animated value,
    /// preserving the original prefix/suffix. `None` for non-counter
    /// elements.
    pub fn counter_display(&self, page: &Page, element: &str, stage: &Stage) -> Option<String> {
        let rule = self.rules.iter().find(|r| r.element == element)?;
        let RuleKind::Counter { target } = rule.kind else {
            return None;
        };
        let (_, prefix, suffix) = page
            .get(element)
            .and_then(|el| el.text.as_deref())
            .and_then(split_counter_text)?;
        let value = stage.get(element, Prop::Count, 0.0);
        Some(format_counter(value, target, &prefix, &suffix))
    }
}

/// Splits text like `336×`, `$2.1M`, `<4h` into (number, prefix, suffix).
fn split_counter_text(text: &str) -> Option<(f64, String, String)> {
    let text = text.trim();
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let tail = &text[start..];
    let num_len = tail
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(tail.len());
    let value: f64 = tail[..num_len].parse().ok()?;
    Some((
        value,
        text[..start].to_string(),
        tail[num_len..].to_string(),
    ))
}

/// Counter snap: one decimal below 10, whole numbers above.
fn format_counter(value: f64, target: f64, prefix: &str, suffix: &str) -> String {
    if target < 10.0 {
        format!("{prefix}{:.1}{suffix}", (value * 10.0).round() / 10.0)
    } else {
        format!("{prefix}{}{suffix}", value.round() as i64)
    }
}
