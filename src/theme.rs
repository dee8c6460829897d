//! Theme controller: one light/dark flag, persisted, mirrored onto the page.
//!
//! The controller is the single authoritative copy of the theme. It writes
//! the preference through a [`Storage`] handle, derives the document-root
//! class and the toggle button's icon and label from it, and notifies
//! subscribers on every user-initiated change. Restoring the persisted value
//! at start-up applies it silently.
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticLog;
use crate::dom::{Dom, classes, ids};
use crate::storage::Storage;

/// The two visual themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Class set on the document root while this theme is active.
    pub fn root_class(self) -> &'static str {
        match self {
            Self::Light => classes::LIGHT_MODE,
            Self::Dark => classes::DARK_MODE,
        }
    }

    /// Toggle button markup: shows the theme a click would switch to.
    fn toggle_icon(self) -> &'static str {
        match self {
            Self::Light => r#"<i class="fas fa-moon"></i>"#,
            Self::Dark => r#"<i class="fas fa-sun"></i>"#,
        }
    }

    fn toggle_label(self) -> &'static str {
        match self {
            Self::Light => "Switch to dark mode",
            Self::Dark => "Switch to light mode",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How the preference is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeEncoding {
    /// `"true"` means dark, `"false"` means light.
    Boolean,
    /// `"dark"` / `"light"`.
    Name,
}

impl ThemeEncoding {
    pub fn encode(self, theme: Theme) -> &'static str {
        match (self, theme) {
            (Self::Boolean, Theme::Dark) => "true",
            (Self::Boolean, Theme::Light) => "false",
            (Self::Name, theme) => theme.name(),
        }
    }

    pub fn decode(self, raw: &str) -> Option<Theme> {
        match self {
            Self::Boolean => match raw.trim() {
                "true" => Some(Theme::Dark),
                "false" => Some(Theme::Light),
                _ => None,
            },
            Self::Name => Theme::parse(raw),
        }
    }
}

/// Listener invoked with the new theme after a toggle.
pub type ThemeListener = Box<dyn FnMut(Theme)>;

/// Owner of the theme state.
pub struct ThemeController {
    theme: Theme,
    default: Theme,
    storage_key: String,
    encoding: ThemeEncoding,
    storage: Box<dyn Storage>,
    listeners: Vec<ThemeListener>,
    log: DiagnosticLog,
}

impl ThemeController {
    pub fn new(
        storage: Box<dyn Storage>,
        storage_key: impl Into<String>,
        encoding: ThemeEncoding,
        default: Theme,
        log: DiagnosticLog,
    ) -> Self {
        Self {
            theme: default,
            default,
            storage_key: storage_key.into(),
            encoding,
            storage,
            listeners: Vec::new(),
            log,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Read the persisted preference (falling back to the default) and apply
    /// it to the page. Subscribers are not notified.
    pub fn init(&mut self, dom: &mut dyn Dom) -> Theme {
        self.theme = self
            .storage
            .get(&self.storage_key)
            .and_then(|raw| self.encoding.decode(&raw))
            .unwrap_or(self.default);
        self.apply(dom);
        self.theme
    }

    /// Flip the theme, persist it, update the page, and notify subscribers.
    pub fn toggle(&mut self, dom: &mut dyn Dom) -> Theme {
        self.theme = self.theme.toggled();

        if let Err(e) = self
            .storage
            .set(&self.storage_key, self.encoding.encode(self.theme))
        {
            self.log.warn("theme.persist_failed", format!("{e:#}"));
        }

        self.apply(dom);
        self.log.info("theme.changed", self.theme.name());

        let theme = self.theme;
        for listener in &mut self.listeners {
            listener(theme);
        }
        theme
    }

    /// Register a theme-changed listener.
    pub fn subscribe(&mut self, listener: impl FnMut(Theme) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn apply(&self, dom: &mut dyn Dom) {
        let theme = self.theme;
        dom.remove_class(ids::BODY, theme.toggled().root_class());
        dom.add_class(ids::BODY, theme.root_class());

        if dom.exists(ids::THEME_TOGGLE) {
            dom.set_html(ids::THEME_TOGGLE, theme.toggle_icon());
            dom.set_attr(ids::THEME_TOGGLE, "aria-label", theme.toggle_label());
        }
    }
}

impl std::fmt::Debug for ThemeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeController")
            .field("theme", &self.theme)
            .field("storage_key", &self.storage_key)
            .field("encoding", &self.encoding)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::dom::MemoryDom;
    use crate::storage::MemoryStorage;

    fn page() -> MemoryDom {
        let mut dom = MemoryDom::new();
        dom.insert(ids::BODY, &[]);
        dom.insert(ids::THEME_TOGGLE, &[]);
        dom
    }

    fn controller(storage: MemoryStorage, encoding: ThemeEncoding, default: Theme) -> ThemeController {
        ThemeController::new(
            Box::new(storage),
            "darkMode",
            encoding,
            default,
            DiagnosticLog::in_memory(),
        )
    }

    #[test]
    fn init_without_preference_uses_default() {
        let mut dom = page();
        let mut theme = controller(MemoryStorage::new(), ThemeEncoding::Boolean, Theme::Dark);
        assert_eq!(theme.init(&mut dom), Theme::Dark);
        assert!(dom.has_class(ids::BODY, classes::DARK_MODE));
        assert_eq!(
            dom.attr(ids::THEME_TOGGLE, "aria-label").as_deref(),
            Some("Switch to light mode")
        );
    }

    #[test]
    fn init_restores_persisted_preference_without_notifying() {
        let mut dom = page();
        let storage = MemoryStorage::new().with("darkMode", "false");
        let mut theme = controller(storage, ThemeEncoding::Boolean, Theme::Dark);
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        theme.subscribe(move |_| *counter.borrow_mut() += 1);

        assert_eq!(theme.init(&mut dom), Theme::Light);
        assert!(dom.has_class(ids::BODY, classes::LIGHT_MODE));
        assert!(!dom.has_class(ids::BODY, classes::DARK_MODE));
        assert!(dom.html(ids::THEME_TOGGLE).unwrap().contains("fa-moon"));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn unreadable_preference_falls_back_to_default() {
        let mut dom = page();
        let storage = MemoryStorage::new().with("darkMode", "maybe");
        let mut theme = controller(storage, ThemeEncoding::Boolean, Theme::Light);
        assert_eq!(theme.init(&mut dom), Theme::Light);
    }

    #[test]
    fn toggle_flips_persists_and_notifies() {
        let mut dom = page();
        let mut theme = controller(MemoryStorage::new(), ThemeEncoding::Name, Theme::Light);
        theme.init(&mut dom);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        theme.subscribe(move |t| sink.borrow_mut().push(t));

        assert_eq!(theme.toggle(&mut dom), Theme::Dark);
        assert!(dom.has_class(ids::BODY, classes::DARK_MODE));
        assert!(!dom.has_class(ids::BODY, classes::LIGHT_MODE));
        assert_eq!(theme.storage.get("darkMode").as_deref(), Some("dark"));
        assert!(dom.html(ids::THEME_TOGGLE).unwrap().contains("fa-sun"));

        assert_eq!(theme.toggle(&mut dom), Theme::Light);
        assert_eq!(*seen.borrow(), vec![Theme::Dark, Theme::Light]);
        assert_eq!(theme.log.entries_for("theme.changed").len(), 2);
    }

    #[test]
    fn toggle_without_toggle_button_still_updates_root() {
        let mut dom = MemoryDom::new();
        dom.insert(ids::BODY, &[]);
        let mut theme = controller(MemoryStorage::new(), ThemeEncoding::Boolean, Theme::Light);
        theme.init(&mut dom);
        theme.toggle(&mut dom);
        assert!(dom.has_class(ids::BODY, classes::DARK_MODE));
        assert!(!dom.exists(ids::THEME_TOGGLE));
    }

    #[test]
    fn encodings_round_trip() {
        for encoding in [ThemeEncoding::Boolean, ThemeEncoding::Name] {
            for theme in [Theme::Light, Theme::Dark] {
                assert_eq!(encoding.decode(encoding.encode(theme)), Some(theme));
            }
        }
        assert_eq!(ThemeEncoding::Boolean.decode("dark"), None);
        assert_eq!(ThemeEncoding::Name.decode("true"), None);
    }
}
