//! The dashboard shell.
//!
//! [`Shell`] owns the page document, the timer queue, and every UI component,
//! and is the only place where they meet. Hosts talk to it in three ways:
//!
//! 1. Direct calls on the public surface ([`Shell::switch_tab`],
//!    [`Shell::show_notification`], [`Shell::select_measure`], ...).
//! 2. [`Input`]s from the page ([`Shell::handle_input`]).
//! 3. Time ([`Shell::advance`] / [`Shell::advance_to`]), which fires every
//!    due timer in deadline order.
//!
//! Nothing in here blocks. Fetches leave through the [`Dispatcher`] and come
//! back as [`Input::FetchCompleted`].
use std::time::Duration;

use anyhow::Result;
use chrono::Local;

use crate::ai::{ArtifactKind, Delivery, FetchCoordinator};
use crate::config::UiConfig;
use crate::counter::CounterAnimator;
use crate::diagnostics::DiagnosticLog;
use crate::dom::{Dom, classes, ids};
use crate::notify::{NotificationCenter, NotificationId, NotificationKind, Phase};
use crate::runtime::{
    Debounce, DebounceKey, Debounced, Dispatcher, Event, Input, TimerId, Timers,
};
use crate::storage::Storage;
use crate::tabs::{Panel, TabController};
use crate::theme::{Theme, ThemeController};
use crate::utils::format::{format_datetime, format_number};
use crate::utils::process::open_url;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Opens external links.
pub trait Browser {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Opens links with the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        open_url(url)
    }
}

/// A measure as the selection component hands it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measure {
    pub name: String,
    pub expression: String,
    /// Expression with referenced measures inlined, if known.
    pub expanded: Option<String>,
}

impl Measure {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            expanded: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

pub struct Shell<D: Dom> {
    dom: D,
    config: UiConfig,
    timers: Timers<Event>,
    theme: ThemeController,
    tabs: TabController,
    fetches: FetchCoordinator,
    notifications: NotificationCenter,
    counters: CounterAnimator,
    dispatcher: Box<dyn Dispatcher>,
    browser: Box<dyn Browser>,
    debounced: Vec<Debounced<String>>,
    resize: Debounce<u32>,
    clock_timer: Option<TimerId>,
    initialized: bool,
    log: DiagnosticLog,
}

impl<D: Dom> Shell<D> {
    pub fn new(
        dom: D,
        config: UiConfig,
        storage: Box<dyn Storage>,
        dispatcher: Box<dyn Dispatcher>,
        log: DiagnosticLog,
    ) -> Self {
        let theme = ThemeController::new(
            storage,
            config.theme.storage_key.clone(),
            config.theme.encoding,
            config.theme.default,
            log.clone(),
        );
        Self {
            dom,
            timers: Timers::new(),
            theme,
            tabs: TabController::new(),
            fetches: FetchCoordinator::new(log.clone()),
            notifications: NotificationCenter::new(&config.notifications),
            counters: CounterAnimator::new(&config.counters),
            dispatcher,
            browser: Box::new(SystemBrowser),
            debounced: Vec::new(),
            resize: Debounce::new(Duration::from_millis(config.debounce.wait_ms)),
            clock_timer: None,
            initialized: false,
            log,
            config,
        }
    }

    pub fn with_browser(mut self, browser: Box<dyn Browser>) -> Self {
        self.browser = browser;
        self
    }

    /// Page-load sequence: restore the theme, register counters, start the
    /// clock, and schedule the `app-loaded` flag. Runs once.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let theme = self.theme.init(&mut self.dom);
        self.counters.init_counters(&mut self.dom, &mut self.timers);
        self.tick_clock();
        self.timers.schedule(
            Duration::from_millis(self.config.shell.app_loaded_delay_ms),
            Event::AppLoaded,
        );
        self.log.info(
            "shell.init",
            format!(
                "theme={theme} counters={}/{}",
                self.counters.strategy(),
                self.config.counters.trigger
            ),
        );
    }

    // -- accessors ---------------------------------------------------------

    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// Mutable page access for hosts that render outside the shell.
    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    pub fn active_tab(&self) -> Panel {
        self.tabs.active()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn counters(&self) -> &CounterAnimator {
        &self.counters
    }

    pub fn fetches(&self) -> &FetchCoordinator {
        &self.fetches
    }

    /// Whether `kind`'s panel is showing its loading indicator.
    pub fn is_loading(&self, kind: ArtifactKind) -> bool {
        self.fetches.in_flight(kind).is_some()
    }

    /// Outcome of the latest response for `kind` since the last reset.
    pub fn last_delivery(&self, kind: ArtifactKind) -> Option<&Delivery> {
        self.fetches.last_delivery(kind)
    }

    // -- time ------------------------------------------------------------

    pub fn advance(&mut self, by: Duration) {
        let until = self.timers.now() + by;
        self.advance_to(until);
    }

    /// Fire every timer due at or before `until`, including timers that
    /// handlers schedule along the way.
    pub fn advance_to(&mut self, until: Duration) {
        while let Some((timer, event)) = self.timers.pop_due(until) {
            self.on_timer(timer, event);
        }
        self.timers.set_now(until);
        self.flush_transitions();
    }

    fn on_timer(&mut self, timer: TimerId, event: Event) {
        match event {
            Event::Notification(id, step) => {
                self.notifications
                    .handle(&mut self.dom, &mut self.timers, id, step);
            }
            Event::Counter(id) => self.counters.handle(&mut self.dom, &mut self.timers, id),
            Event::Debounced(key) => {
                if let Some(debounced) = self.debounced.get_mut(key.0) {
                    debounced.fire(timer);
                }
            }
            Event::ResizeSettled => {
                if let Some(width) = self.resize.fire(timer) {
                    self.on_resize_settled(width);
                }
            }
            Event::ClockTick => {
                self.clock_timer = None;
                self.tick_clock();
            }
            Event::AppLoaded => {
                self.dom.add_class(ids::BODY, classes::APP_LOADED);
            }
        }
    }

    // -- inputs ----------------------------------------------------------

    pub fn handle_input(&mut self, input: Input) {
        match input {
            Input::Click(element) => self.click(&element),
            Input::Visibility { element, ratio } => {
                self.counters
                    .on_visibility(&mut self.dom, &mut self.timers, &element, ratio);
            }
            Input::Resize(width) => {
                self.resize
                    .call(&mut self.timers, Event::ResizeSettled, width);
            }
            Input::FetchCompleted(completion) => {
                self.fetches.complete(&mut self.dom, completion);
            }
        }
        self.flush_transitions();
    }

    /// Route a click on `element` to its handler.
    pub fn click(&mut self, element: &str) {
        match element {
            ids::THEME_TOGGLE => {
                self.toggle_theme();
            }
            ids::SIDEBAR_TOGGLE => self.toggle_sidebar(),
            ids::HELP_BUTTON => self.show_help(),
            _ => {
                if let Some(panel) = Panel::from_tab_id(element) {
                    self.switch_tab(panel);
                } else if let Some(id) = NotificationId::from_close_button(element) {
                    self.dismiss_notification(id);
                } else {
                    self.log.debug("click.unhandled", element);
                }
            }
        }
        self.flush_transitions();
    }

    // -- public surface --------------------------------------------------

    /// Activate `panel`, loading its artifact if it still shows the
    /// placeholder.
    pub fn switch_tab(&mut self, panel: Panel) {
        if let Some(kind) = self.tabs.activate(&mut self.dom, panel) {
            self.load(kind);
        }
    }

    pub fn load_optimized_definition(&mut self) {
        self.load(ArtifactKind::Optimize);
    }

    pub fn load_explanation(&mut self) {
        self.load(ArtifactKind::Explain);
    }

    fn load(&mut self, kind: ArtifactKind) {
        if let Some(request) = self.fetches.begin(&mut self.dom, kind) {
            self.dispatcher.dispatch(request);
        }
    }

    /// Restore both AI panels to their placeholders. Responses still in
    /// flight are discarded when they arrive.
    pub fn reset_artifacts(&mut self) {
        self.fetches.reset(&mut self.dom);
        self.log.debug("artifacts.reset", "");
    }

    /// Show `measure` in the detail card and reset the AI panels.
    pub fn select_measure(&mut self, measure: &Measure) {
        self.dom.set_text(ids::MEASURE_NAME, &measure.name);
        self.dom.set_text(ids::ORIGINAL_CODE, &measure.expression);
        self.dom.set_text(
            ids::EXPANDED_CODE,
            measure.expanded.as_deref().unwrap_or(&measure.expression),
        );
        self.reset_artifacts();
        self.log.info("measure.selected", measure.name.as_str());
    }

    pub fn show_notification(
        &mut self,
        message: &str,
        kind: NotificationKind,
        duration: Option<Duration>,
    ) -> Option<NotificationId> {
        let id = self.notifications.notify(
            &mut self.dom,
            &mut self.timers,
            message,
            kind,
            duration,
        );
        self.flush_transitions();
        id
    }

    pub fn dismiss_notification(&mut self, id: NotificationId) -> bool {
        let dismissed = self
            .notifications
            .dismiss(&mut self.dom, &mut self.timers, id);
        self.flush_transitions();
        dismissed
    }

    /// Register a debounced callback. `wait` defaults to the configured
    /// debounce wait.
    pub fn debounce(
        &mut self,
        wait: Option<Duration>,
        callback: impl FnMut(String) + 'static,
    ) -> DebounceKey {
        let wait = wait.unwrap_or(Duration::from_millis(self.config.debounce.wait_ms));
        self.debounced.push(Debounced::new(wait, callback));
        DebounceKey(self.debounced.len() - 1)
    }

    /// Invoke a debounced callback. Returns `false` for an unknown key.
    pub fn call_debounced(&mut self, key: DebounceKey, args: impl Into<String>) -> bool {
        match self.debounced.get_mut(key.0) {
            Some(debounced) => {
                debounced.call(&mut self.timers, Event::Debounced(key), args.into());
                true
            }
            None => false,
        }
    }

    pub fn format_number(&self, num: i64) -> String {
        format_number(num)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme.toggle(&mut self.dom)
    }

    /// Register a theme-changed listener.
    pub fn subscribe_theme(&mut self, listener: impl FnMut(Theme) + 'static) {
        self.theme.subscribe(listener);
    }

    pub fn toggle_sidebar(&mut self) {
        self.dom.toggle_class(ids::SIDEBAR, classes::OPEN);
    }

    /// Open the documentation and confirm with a toast.
    pub fn show_help(&mut self) {
        let url = self.config.shell.help_url.clone();
        if let Err(e) = self.browser.open(&url) {
            self.log.warn("help.open_failed", format!("{e:#}"));
        }
        self.show_notification(
            "Documentation opened in a new tab",
            NotificationKind::Info,
            None,
        );
    }

    // -- internals -------------------------------------------------------

    fn on_resize_settled(&mut self, width: u32) {
        if width >= self.config.shell.sidebar_breakpoint_px {
            self.dom.remove_class(ids::SIDEBAR, classes::OPEN);
        }
    }

    fn tick_clock(&mut self) {
        if !self.dom.exists(ids::DATETIME) {
            return;
        }
        self.dom
            .set_text(ids::DATETIME, &format_datetime(&Local::now()));
        if self.clock_timer.is_none() {
            let interval = Duration::from_millis(self.config.shell.clock_interval_ms.max(1));
            self.clock_timer = Some(self.timers.schedule(interval, Event::ClockTick));
        }
    }

    fn flush_transitions(&mut self) {
        for transition in self.notifications.drain_transitions() {
            let detail = format!("id={} at={}ms", transition.id, transition.at.as_millis());
            let event = match transition.phase {
                Phase::Created => "notification.created",
                Phase::Visible => "notification.visible",
                Phase::Removing => "notification.removing",
                Phase::Detached => "notification.detached",
            };
            self.log.debug(event, detail);
        }
    }
}

impl<D: Dom + std::fmt::Debug> std::fmt::Debug for Shell<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("now", &self.timers.now())
            .field("theme", &self.theme.theme())
            .field("active_tab", &self.tabs.active())
            .field("pending_timers", &self.timers.len())
            .field("debounced", &self.debounced.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
