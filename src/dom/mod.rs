//! Page document seam.
//!
//! The shell never touches a browser directly. Everything it reads or writes
//! on the page goes through the [`Dom`] trait, keyed by the fixed element
//! identifiers in [`ids`] and the state-flag class names in [`classes`].
//!
//! Every operation on an element that does not exist is a silent no-op that
//! reports `false`/`None`. UI code guards on those results rather than
//! raising, so a page missing an optional widget keeps working.
pub mod memory;
pub mod page;

pub use memory::MemoryDom;

/// Fixed element identifiers used by the dashboard page.
pub mod ids {
    pub const BODY: &str = "body";
    pub const SIDEBAR: &str = "sidebar";
    pub const SIDEBAR_TOGGLE: &str = "sidebar-toggle";
    pub const THEME_TOGGLE: &str = "theme-toggle";
    pub const HELP_BUTTON: &str = "help-button";
    pub const NOTIFICATION_CONTAINER: &str = "notification-container";
    pub const DATETIME: &str = "current-datetime";

    pub const MEASURE_NAME: &str = "measureName";
    pub const ORIGINAL_CODE: &str = "originalCode";
    pub const EXPANDED_CODE: &str = "expandedCode";
    pub const OPTIMIZED_CODE: &str = "optimizedCode";
    pub const EXPLANATION_CONTENT: &str = "explanationContent";
    pub const OPTIMIZED_LOADING: &str = "optimizedLoading";
    pub const EXPLANATION_LOADING: &str = "explanationLoading";
}

/// CSS class names used as state flags.
pub mod classes {
    pub const ACTIVE: &str = "active";
    pub const OPEN: &str = "open";
    pub const VISIBLE: &str = "visible";
    pub const DARK_MODE: &str = "dark-mode";
    pub const LIGHT_MODE: &str = "light-mode";
    pub const APP_LOADED: &str = "app-loaded";
    pub const MEASURE_TAB: &str = "measure-tab";
    pub const TAB_CONTENT: &str = "tab-content";
    pub const METRIC_VALUE: &str = "metric-value";
    pub const PLACEHOLDER_TEXT: &str = "placeholder-text";
}

/// Inline `display` style of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    None,
    Block,
    Flex,
}

impl std::fmt::Display for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Block => write!(f, "block"),
            Self::Flex => write!(f, "flex"),
        }
    }
}

/// Read/write access to the page document.
///
/// Mutators return `true` when the element existed and was updated.
pub trait Dom {
    fn exists(&self, id: &str) -> bool;

    /// Text content. For elements holding markup, tags are stripped.
    fn text(&self, id: &str) -> Option<String>;
    fn set_text(&mut self, id: &str, text: &str) -> bool;

    /// Inner markup. For elements holding plain text, the text is escaped.
    fn html(&self, id: &str) -> Option<String>;
    fn set_html(&mut self, id: &str, html: &str) -> bool;

    fn has_class(&self, id: &str, class: &str) -> bool;
    fn add_class(&mut self, id: &str, class: &str) -> bool;
    fn remove_class(&mut self, id: &str, class: &str) -> bool;

    fn toggle_class(&mut self, id: &str, class: &str) -> bool {
        if !self.exists(id) {
            return false;
        }
        if self.has_class(id, class) {
            self.remove_class(id, class)
        } else {
            self.add_class(id, class)
        }
    }

    fn attr(&self, id: &str, name: &str) -> Option<String>;
    fn set_attr(&mut self, id: &str, name: &str, value: &str) -> bool;

    fn display(&self, id: &str) -> Option<Display>;
    fn set_display(&mut self, id: &str, display: Display) -> bool;

    /// Append a new element as the last child of `parent`.
    ///
    /// Fails (returns `false`) if the parent is missing or `id` is taken.
    fn append_child(&mut self, parent: &str, id: &str, classes: &[&str], html: &str) -> bool;

    /// Detach an element (and its subtree) from the document.
    fn remove(&mut self, id: &str) -> bool;

    /// Child identifiers of `parent`, in insertion order.
    fn children(&self, parent: &str) -> Vec<String>;

    /// Identifiers of every element carrying `class`, in creation order.
    fn ids_with_class(&self, class: &str) -> Vec<String>;
}

/// Escape text for inclusion in markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
