//! Toast notifications.
//!
//! Each notification walks a fixed path:
//!
//! ```text
//! Created ──(enter delay)──▶ Visible ──(duration or dismiss)──▶ Removing ──(exit delay)──▶ Detached
//! ```
//!
//! Removal can be started by the auto-dismiss timer or by the close button,
//! whichever comes first; the other path becomes a no-op. A dismissal that
//! arrives before the enter delay marks the notification visible first, so
//! no phase is ever skipped. Every phase change is appended to an outbox
//! that the owner drains with [`NotificationCenter::drain_transitions`].
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::schema::NotificationConfig;
use crate::dom::{Dom, classes, escape_html, ids};
use crate::runtime::{Event, TimerId, Timers};

const NODE_PREFIX: &str = "notification-";
const CLOSE_SUFFIX: &str = "-close";

/// Visual kind of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl NotificationKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Parse a kind name. Unrecognized names fall back to `Info`.
    pub fn parse(val: &str) -> Self {
        match val.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "error" => Self::Error,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }

    /// Font Awesome icon class.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "fa-check-circle",
            Self::Error => "fa-exclamation-circle",
            Self::Warning => "fa-exclamation-triangle",
            Self::Info => "fa-info-circle",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Identifier of one notification. Its element id is `notification-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl NotificationId {
    pub fn element_id(self) -> String {
        format!("{NODE_PREFIX}{}", self.0)
    }

    pub fn close_button_id(self) -> String {
        format!("{NODE_PREFIX}{}{CLOSE_SUFFIX}", self.0)
    }

    /// Recover the notification behind a close-button element id.
    pub fn from_close_button(element: &str) -> Option<Self> {
        element
            .strip_prefix(NODE_PREFIX)?
            .strip_suffix(CLOSE_SUFFIX)?
            .parse()
            .ok()
            .map(Self)
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Created,
    Visible,
    Removing,
    Detached,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Visible => write!(f, "visible"),
            Self::Removing => write!(f, "removing"),
            Self::Detached => write!(f, "detached"),
        }
    }
}

/// Timer steps scheduled for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStep {
    Show,
    Expire,
    Detach,
}

/// A recorded phase change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: NotificationId,
    pub phase: Phase,
    /// Virtual time of the change.
    pub at: Duration,
}

#[derive(Debug)]
struct Notification {
    kind: NotificationKind,
    message: String,
    phase: Phase,
    show_timer: Option<TimerId>,
    expire_timer: Option<TimerId>,
}

/// Owns every live notification and their timers.
#[derive(Debug)]
pub struct NotificationCenter {
    next_id: u64,
    default_duration: Duration,
    enter_delay: Duration,
    exit_delay: Duration,
    live: BTreeMap<NotificationId, Notification>,
    outbox: Vec<Transition>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(&NotificationConfig::default())
    }
}

impl NotificationCenter {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            next_id: 1,
            default_duration: Duration::from_millis(config.duration_ms),
            enter_delay: Duration::from_millis(config.enter_delay_ms),
            exit_delay: Duration::from_millis(config.exit_delay_ms),
            live: BTreeMap::new(),
            outbox: Vec::new(),
        }
    }

    /// Attach a notification to the container and schedule its show and
    /// expiry steps. `duration` defaults to the configured duration.
    ///
    /// Returns `None` if the page has no notification container.
    pub fn notify(
        &mut self,
        dom: &mut dyn Dom,
        timers: &mut Timers<Event>,
        message: &str,
        kind: NotificationKind,
        duration: Option<Duration>,
    ) -> Option<NotificationId> {
        let id = NotificationId(self.next_id);
        let node = id.element_id();
        let kind_class = format!("notification-{}", kind.name());

        let markup = format!(
            "<div class=\"notification-icon\"><i class=\"fas {}\"></i></div>\
             <div class=\"notification-message\">{}</div>",
            kind.icon(),
            escape_html(message)
        );
        if !dom.append_child(
            ids::NOTIFICATION_CONTAINER,
            &node,
            &["notification", &kind_class],
            &markup,
        ) {
            return None;
        }
        dom.append_child(
            &node,
            &id.close_button_id(),
            &["notification-close"],
            "<i class=\"fas fa-times\"></i>",
        );
        dom.set_attr(&id.close_button_id(), "aria-label", "Close notification");
        self.next_id += 1;

        let show_timer = timers.schedule(
            self.enter_delay,
            Event::Notification(id, NotificationStep::Show),
        );
        let expire_timer = timers.schedule(
            duration.unwrap_or(self.default_duration),
            Event::Notification(id, NotificationStep::Expire),
        );

        self.live.insert(
            id,
            Notification {
                kind,
                message: message.to_string(),
                phase: Phase::Created,
                show_timer: Some(show_timer),
                expire_timer: Some(expire_timer),
            },
        );
        self.record(id, Phase::Created, timers.now());
        Some(id)
    }

    /// Begin removal on user request. Returns `false` if the notification is
    /// already leaving or gone.
    pub fn dismiss(
        &mut self,
        dom: &mut dyn Dom,
        timers: &mut Timers<Event>,
        id: NotificationId,
    ) -> bool {
        self.begin_removal(dom, timers, id)
    }

    /// Run a scheduled step.
    pub fn handle(
        &mut self,
        dom: &mut dyn Dom,
        timers: &mut Timers<Event>,
        id: NotificationId,
        step: NotificationStep,
    ) {
        match step {
            NotificationStep::Show => {
                if let Some(n) = self.live.get_mut(&id) {
                    n.show_timer = None;
                }
                self.mark_visible(dom, id, timers.now());
            }
            NotificationStep::Expire => {
                if let Some(n) = self.live.get_mut(&id) {
                    n.expire_timer = None;
                }
                self.begin_removal(dom, timers, id);
            }
            NotificationStep::Detach => {
                if self.phase(id) == Some(Phase::Removing) {
                    dom.remove(&id.element_id());
                    self.live.remove(&id);
                    self.record(id, Phase::Detached, timers.now());
                }
            }
        }
    }

    /// Current phase, or `None` once detached.
    pub fn phase(&self, id: NotificationId) -> Option<Phase> {
        self.live.get(&id).map(|n| n.phase)
    }

    pub fn kind(&self, id: NotificationId) -> Option<NotificationKind> {
        self.live.get(&id).map(|n| n.kind)
    }

    pub fn message(&self, id: NotificationId) -> Option<&str> {
        self.live.get(&id).map(|n| n.message.as_str())
    }

    /// Number of notifications not yet detached.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Take every transition recorded since the last drain.
    pub fn drain_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.outbox)
    }

    fn mark_visible(&mut self, dom: &mut dyn Dom, id: NotificationId, now: Duration) {
        let Some(n) = self.live.get_mut(&id) else {
            return;
        };
        if n.phase != Phase::Created {
            return;
        }
        n.phase = Phase::Visible;
        dom.add_class(&id.element_id(), classes::VISIBLE);
        self.record(id, Phase::Visible, now);
    }

    fn begin_removal(
        &mut self,
        dom: &mut dyn Dom,
        timers: &mut Timers<Event>,
        id: NotificationId,
    ) -> bool {
        let Some(n) = self.live.get_mut(&id) else {
            return false;
        };
        if n.phase >= Phase::Removing {
            return false;
        }
        if let Some(timer) = n.show_timer.take() {
            timers.cancel(timer);
        }
        if let Some(timer) = n.expire_timer.take() {
            timers.cancel(timer);
        }
        self.mark_visible(dom, id, timers.now());

        if let Some(n) = self.live.get_mut(&id) {
            n.phase = Phase::Removing;
        }
        dom.remove_class(&id.element_id(), classes::VISIBLE);
        timers.schedule(
            self.exit_delay,
            Event::Notification(id, NotificationStep::Detach),
        );
        self.record(id, Phase::Removing, timers.now());
        true
    }

    fn record(&mut self, id: NotificationId, phase: Phase, at: Duration) {
        self.outbox.push(Transition { id, phase, at });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    struct Harness {
        dom: MemoryDom,
        timers: Timers<Event>,
        center: NotificationCenter,
    }

    impl Harness {
        fn new() -> Self {
            let mut dom = MemoryDom::new();
            dom.insert(ids::NOTIFICATION_CONTAINER, &[]);
            Self {
                dom,
                timers: Timers::new(),
                center: NotificationCenter::default(),
            }
        }

        fn advance_to(&mut self, ms: u64) {
            let until = Duration::from_millis(ms);
            while let Some((_, event)) = self.timers.pop_due(until) {
                if let Event::Notification(id, step) = event {
                    self.center.handle(&mut self.dom, &mut self.timers, id, step);
                }
            }
            self.timers.set_now(until);
        }

        fn phases(&mut self, id: NotificationId) -> Vec<Phase> {
            self.center
                .drain_transitions()
                .into_iter()
                .filter(|t| t.id == id)
                .map(|t| t.phase)
                .collect()
        }
    }

    const ALL_PHASES: [Phase; 4] = [
        Phase::Created,
        Phase::Visible,
        Phase::Removing,
        Phase::Detached,
    ];

    #[test]
    fn kind_parse_falls_back_to_info() {
        assert_eq!(NotificationKind::parse("Success"), NotificationKind::Success);
        assert_eq!(NotificationKind::parse("warning"), NotificationKind::Warning);
        assert_eq!(NotificationKind::parse("bogus"), NotificationKind::Info);
        assert_eq!(NotificationKind::parse("bogus").icon(), "fa-info-circle");
    }

    #[test]
    fn close_button_id_round_trips() {
        let id = NotificationId(42);
        assert_eq!(id.close_button_id(), "notification-42-close");
        assert_eq!(NotificationId::from_close_button(&id.close_button_id()), Some(id));
        assert_eq!(NotificationId::from_close_button("notification-42"), None);
        assert_eq!(NotificationId::from_close_button("sidebar-toggle"), None);
    }

    #[test]
    fn auto_dismiss_walks_every_phase_in_order() {
        let mut h = Harness::new();
        let id = h
            .center
            .notify(&mut h.dom, &mut h.timers, "Saved", NotificationKind::Success, None)
            .unwrap();
        let node = id.element_id();
        assert!(h.dom.exists(&node));
        assert!(h.dom.has_class(&node, "notification-success"));
        assert!(!h.dom.has_class(&node, classes::VISIBLE));

        h.advance_to(10);
        assert!(h.dom.has_class(&node, classes::VISIBLE));

        h.advance_to(3000);
        assert_eq!(h.center.phase(id), Some(Phase::Removing));
        assert!(!h.dom.has_class(&node, classes::VISIBLE));
        assert!(h.dom.exists(&node));

        h.advance_to(3300);
        assert!(!h.dom.exists(&node));
        assert!(!h.dom.exists(&id.close_button_id()));
        assert_eq!(h.center.phase(id), None);
        assert_eq!(h.phases(id), ALL_PHASES);
    }

    #[test]
    fn dismiss_wins_and_expiry_becomes_noop() {
        let mut h = Harness::new();
        let id = h
            .center
            .notify(&mut h.dom, &mut h.timers, "Hi", NotificationKind::Info, None)
            .unwrap();
        h.advance_to(500);
        assert!(h.center.dismiss(&mut h.dom, &mut h.timers, id));
        assert!(!h.center.dismiss(&mut h.dom, &mut h.timers, id));

        h.advance_to(5000);
        assert_eq!(h.phases(id), ALL_PHASES);
        assert!(h.timers.is_empty());
    }

    #[test]
    fn dismiss_before_enter_delay_still_passes_through_visible() {
        let mut h = Harness::new();
        let id = h
            .center
            .notify(&mut h.dom, &mut h.timers, "Quick", NotificationKind::Warning, None)
            .unwrap();
        assert!(h.center.dismiss(&mut h.dom, &mut h.timers, id));

        h.advance_to(5000);
        assert_eq!(h.phases(id), ALL_PHASES);
        assert!(!h.dom.exists(&id.element_id()));
    }

    #[test]
    fn dismiss_after_detach_is_noop() {
        let mut h = Harness::new();
        let id = h
            .center
            .notify(&mut h.dom, &mut h.timers, "Bye", NotificationKind::Error, None)
            .unwrap();
        h.advance_to(4000);
        assert!(!h.center.dismiss(&mut h.dom, &mut h.timers, id));
    }

    #[test]
    fn notifications_are_independent_and_keep_insertion_order() {
        let mut h = Harness::new();
        let a = h
            .center
            .notify(&mut h.dom, &mut h.timers, "a", NotificationKind::Info, Some(Duration::from_millis(1000)))
            .unwrap();
        let b = h
            .center
            .notify(&mut h.dom, &mut h.timers, "b", NotificationKind::Info, None)
            .unwrap();
        assert_eq!(
            h.dom.children(ids::NOTIFICATION_CONTAINER),
            vec![a.element_id(), b.element_id()]
        );

        h.advance_to(1300);
        assert!(!h.dom.exists(&a.element_id()));
        assert_eq!(h.center.phase(b), Some(Phase::Visible));
        assert_eq!(h.center.live_count(), 1);
    }

    #[test]
    fn message_is_escaped() {
        let mut h = Harness::new();
        let id = h
            .center
            .notify(&mut h.dom, &mut h.timers, "<b>x</b>", NotificationKind::Info, None)
            .unwrap();
        let html = h.dom.html(&id.element_id()).unwrap();
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("fa-info-circle"));
        assert_eq!(h.center.message(id), Some("<b>x</b>"));
    }

    #[test]
    fn missing_container_yields_none() {
        let mut dom = MemoryDom::new();
        let mut timers = Timers::new();
        let mut center = NotificationCenter::default();
        assert!(
            center
                .notify(&mut dom, &mut timers, "x", NotificationKind::Info, None)
                .is_none()
        );
        assert!(timers.is_empty());
        assert!(center.drain_transitions().is_empty());
    }
}
