use std::collections::{BTreeMap, BTreeSet};

use crate::{
    core::{Extent, Viewport},
    error::{GlissadeError, GlissadeResult},
};

/// Attribute keys recognized on page elements. This is the markup contract:
/// the hosting page tags elements with these and the engine wires behavior
/// off them.
pub mod attr {
    pub const ISLAND: &str = "island";
    pub const ISLAND_TEXT: &str = "island-text";
    pub const ISLAND_PREV: &str = "island-prev";
    pub const ISLAND_NEXT: &str = "island-next";
    pub const ISLAND_PROGRESS: &str = "island-progress";
    pub const ISLAND_MENU_BUTTON: &str = "island-menu-button";
    pub const ISLAND_MENU_PANEL: &str = "island-menu-panel";
    pub const ISLAND_MENU_ITEM: &str = "island-menu-item";
    pub const HREF: &str = "href";

    pub const NAV_SECTION: &str = "nav-section";
    pub const NAV_TITLE: &str = "nav-title";

    pub const ANIMATE: &str = "animate";
    pub const STAGGER_CHILDREN: &str = "stagger-children";
    pub const PARALLAX: &str = "parallax";
    pub const SPEED: &str = "speed";
    pub const BLOOM: &str = "bloom";
    pub const COUNTER: &str = "counter";
    pub const TITLE_LINE: &str = "title-line";

    pub const ENTRY: &str = "entry";

    pub const MENU_BUTTON: &str = "menu-button";
    pub const MENU_OVERLAY: &str = "menu-overlay";
    pub const BURGER_LINE: &str = "burger-line";
    pub const MENU_ITEM: &str = "menu-item";

    pub const VIDEO: &str = "video";
    pub const AUTOPLAY: &str = "autoplay";
    pub const CARD: &str = "card";
    pub const CARD_IMAGE: &str = "card-image";
    pub const CARD_VIDEO: &str = "card-video";

    pub const BUTTON: &str = "button";
    pub const ARROW: &str = "arrow";
    pub const HERO: &str = "hero";
}

/// One element of the hosting page: geometry plus the attributes the engine
/// reacts to. The tree is flat; nesting is expressed through `parent`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Element {
    pub id: String,
    pub extent: Extent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Text of the element's first heading, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Plain text content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }
}

/// The page document the engine animates. Discovered once at boot; elements
/// are never added or removed at runtime.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Page {
    /// Document address path, e.g. `/work/index.html`.
    pub path: String,
    pub viewport: Viewport,
    pub elements: Vec<Element>,
}

impl Page {
    pub fn validate(&self) -> GlissadeResult<()> {
        self.viewport.validate()?;

        let mut ids = BTreeSet::new();
        for el in &self.elements {
            if el.id.trim().is_empty() {
                return Err(GlissadeError::validation("element id must be non-empty"));
            }
            if !ids.insert(el.id.as_str()) {
                return Err(GlissadeError::validation(format!(
                    "duplicate element id '{}'",
                    el.id
                )));
            }
            el.extent.validate()?;
        }

        for el in &self.elements {
            if let Some(parent) = &el.parent {
                if !ids.contains(parent.as_str()) {
                    return Err(GlissadeError::validation(format!(
                        "element '{}' references missing parent '{}'",
                        el.id, parent
                    )));
                }
                if parent == &el.id {
                    return Err(GlissadeError::validation(format!(
                        "element '{}' is its own parent",
                        el.id
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }

    /// Elements carrying `key`, in document order.
    pub fn with_attr(&self, key: &str) -> Vec<&Element> {
        self.elements.iter().filter(|el| el.has_attr(key)).collect()
    }

    pub fn first_with_attr(&self, key: &str) -> Option<&Element> {
        self.elements.iter().find(|el| el.has_attr(key))
    }

    /// Direct children of `id`, in document order.
    pub fn children_of(&self, id: &str) -> Vec<&Element> {
        self.elements
            .iter()
            .filter(|el| el.parent.as_deref() == Some(id))
            .collect()
    }

    /// Whether `id` equals `ancestor` or sits anywhere below it.
    pub fn is_within(&self, ancestor: &str, id: &str) -> bool {
        let mut cursor = Some(id);
        // Parent chains are short; validate() rules out self-parents but a
        // hostile cycle still terminates via the hop budget.
        for _ in 0..64 {
            match cursor {
                None => return false,
                Some(c) if c == ancestor => return true,
                Some(c) => cursor = self.get(c).and_then(|el| el.parent.as_deref()),
            }
        }
        false
    }

    pub fn content_height(&self) -> f64 {
        self.elements
            .iter()
            .map(|el| el.extent.bottom())
            .fold(0.0, f64::max)
    }

    pub fn max_scroll(&self) -> f64 {
        (self.content_height() - self.viewport.height).max(0.0)
    }

    /// Last path segment, the "which page is loaded" identity used by menu
    /// highlighting. Empty segments resolve to `index.html`.
    pub fn current_page(&self) -> &str {
        let seg = self.path.rsplit('/').next().unwrap_or("");
        if seg.is_empty() { "index.html" } else { seg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(id: &str, top: f64, height: f64) -> Element {
        Element {
            id: id.to_string(),
            extent: Extent { top, height },
            parent: None,
            attrs: BTreeMap::new(),
            heading: None,
            text: None,
        }
    }

    fn page(elements: Vec<Element>) -> Page {
        Page {
            path: "/site/work.html".to_string(),
            viewport: Viewport { height: 800.0 },
            elements,
        }
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let p = page(vec![el("a", 0.0, 10.0), el("a", 10.0, 10.0)]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_dangling_parent() {
        let mut child = el("b", 0.0, 10.0);
        child.parent = Some("missing".to_string());
        let p = page(vec![child]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn is_within_walks_parent_chain() {
        let mut mid = el("mid", 0.0, 10.0);
        mid.parent = Some("root".to_string());
        let mut leaf = el("leaf", 0.0, 5.0);
        leaf.parent = Some("mid".to_string());
        let p = page(vec![el("root", 0.0, 100.0), mid, leaf]);
        assert!(p.is_within("root", "leaf"));
        assert!(p.is_within("root", "root"));
        assert!(!p.is_within("leaf", "root"));
    }

    #[test]
    fn current_page_defaults_to_index() {
        let mut p = page(vec![]);
        assert_eq!(p.current_page(), "work.html");
        p.path = "/site/".to_string();
        assert_eq!(p.current_page(), "index.html");
    }

    #[test]
    fn max_scroll_floors_at_zero() {
        let p = page(vec![el("a", 0.0, 300.0)]);
        assert_eq!(p.max_scroll(), 0.0);
        let p = page(vec![el("a", 0.0, 2800.0)]);
        assert_eq!(p.max_scroll(), 2000.0);
    }
}
