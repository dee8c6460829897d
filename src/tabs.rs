//! Tab/panel controller for the measure-detail card.
//!
//! Exactly one of the four panels is active at a time; the initial panel is
//! [`Panel::Original`]. Activating one of the two AI-backed panels while its
//! content is still a placeholder asks the caller to load it. The controller
//! decides "still a placeholder" by looking at the page itself, so a reset
//! performed by whoever selects a new measure is respected automatically.
use crate::ai::ArtifactKind;
use crate::dom::{Dom, classes};

/// The four mutually exclusive views of the measure-detail card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Original,
    Expanded,
    Optimized,
    Explanation,
}

impl Panel {
    pub const ALL: [Panel; 4] = [
        Panel::Original,
        Panel::Expanded,
        Panel::Optimized,
        Panel::Explanation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Expanded => "expanded",
            Self::Optimized => "optimized",
            Self::Explanation => "explanation",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|panel| panel.name().eq_ignore_ascii_case(val.trim()))
    }

    /// Identifier of the tab selector control.
    pub fn tab_id(self) -> &'static str {
        match self {
            Self::Original => "originalTab",
            Self::Expanded => "expandedTab",
            Self::Optimized => "optimizedTab",
            Self::Explanation => "explanationTab",
        }
    }

    /// Identifier of the panel's content container.
    pub fn content_id(self) -> &'static str {
        match self {
            Self::Original => "originalDefinition",
            Self::Expanded => "expandedDefinition",
            Self::Optimized => "optimizedDefinition",
            Self::Explanation => "explanationDefinition",
        }
    }

    pub fn from_tab_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|panel| panel.tab_id() == id)
    }

    /// The AI artifact that backs this panel, if any.
    pub fn artifact(self) -> Option<ArtifactKind> {
        match self {
            Self::Optimized => Some(ArtifactKind::Optimize),
            Self::Explanation => Some(ArtifactKind::Explain),
            Self::Original | Self::Expanded => None,
        }
    }
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Exclusive-selection state over [`Panel`].
#[derive(Debug, Clone)]
pub struct TabController {
    active: Panel,
}

impl Default for TabController {
    fn default() -> Self {
        Self::new()
    }
}

impl TabController {
    pub fn new() -> Self {
        Self {
            active: Panel::Original,
        }
    }

    pub fn active(&self) -> Panel {
        self.active
    }

    /// Make `panel` the only active tab and content. Missing elements are
    /// skipped.
    pub fn switch_tab(&mut self, dom: &mut dyn Dom, panel: Panel) {
        for id in dom.ids_with_class(classes::MEASURE_TAB) {
            dom.remove_class(&id, classes::ACTIVE);
        }
        for id in dom.ids_with_class(classes::TAB_CONTENT) {
            dom.remove_class(&id, classes::ACTIVE);
        }
        dom.add_class(panel.tab_id(), classes::ACTIVE);
        dom.add_class(panel.content_id(), classes::ACTIVE);
        self.active = panel;
    }

    /// Handle a user activation of `panel`.
    ///
    /// Returns the artifact to load when the panel is AI-backed and its
    /// content is still the placeholder. Panels that are loading or loaded
    /// return `None`, so switching away and back never refetches.
    pub fn activate(&mut self, dom: &mut dyn Dom, panel: Panel) -> Option<ArtifactKind> {
        self.switch_tab(dom, panel);
        panel.artifact().filter(|kind| kind.is_placeholder(dom))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
