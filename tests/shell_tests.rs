/// Shell behavior tests.
///
/// Drive a full `Shell` over the dashboard page through virtual time. Fetches
/// go to a `RecordingDispatcher`, so each test decides when and how the
/// backend answers.
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;

use pbi_explorer_ui::ai::{
    ArtifactKind, Delivery, FetchCompletion, FetchFailure, FetchRequest, StaleReason,
};
use pbi_explorer_ui::config::UiConfig;
use pbi_explorer_ui::counter::{CounterStrategy, CounterTrigger};
use pbi_explorer_ui::diagnostics::DiagnosticLog;
use pbi_explorer_ui::dom::page::dashboard;
use pbi_explorer_ui::dom::{Display, Dom, MemoryDom, classes, ids};
use pbi_explorer_ui::notify::NotificationKind;
use pbi_explorer_ui::runtime::{Input, RecordingDispatcher};
use pbi_explorer_ui::shell::{Measure, Shell};
use pbi_explorer_ui::storage::{FileStorage, MemoryStorage, Storage};
use pbi_explorer_ui::tabs::Panel;
use pbi_explorer_ui::theme::Theme;

const OPTIMIZE: &str = "/api/optimize-dax";
const EXPLAIN: &str = "/api/explain-dax";

struct Harness {
    shell: Shell<MemoryDom>,
    requests: RecordingDispatcher,
    log: DiagnosticLog,
}

fn harness_with(config: UiConfig, storage: Box<dyn Storage>, metrics: &[(&str, &str)]) -> Harness {
    let requests = RecordingDispatcher::new();
    let log = DiagnosticLog::in_memory();
    let mut shell = Shell::new(
        dashboard(metrics),
        config,
        storage,
        Box::new(requests.clone()),
        log.clone(),
    );
    shell.init();
    Harness {
        shell,
        requests,
        log,
    }
}

fn harness() -> Harness {
    harness_with(UiConfig::default(), Box::new(MemoryStorage::new()), &[])
}

impl Harness {
    fn text(&self, id: &str) -> String {
        self.shell.dom().text(id).unwrap_or_default()
    }

    fn select(&mut self, name: &str, dax: &str) {
        self.shell.select_measure(&Measure::new(name, dax));
    }

    fn click(&mut self, id: &str) {
        self.shell.handle_input(Input::Click(id.to_string()));
    }

    fn respond(&mut self, request: FetchRequest, result: Result<serde_json::Value, FetchFailure>) {
        self.shell
            .handle_input(Input::FetchCompleted(FetchCompletion {
                ticket: request.ticket,
                result,
            }));
    }

    /// Phases logged for the notification whose display id is `id`.
    fn notification_phases(&self, id: &str) -> Vec<String> {
        let prefix = format!("id={id} ");
        self.log
            .entries()
            .into_iter()
            .filter(|e| e.event.starts_with("notification.") && e.detail.starts_with(&prefix))
            .map(|e| e.event.trim_start_matches("notification.").to_string())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tabs and fetches
// ---------------------------------------------------------------------------

#[test]
fn optimized_tab_fetches_once_until_measure_changes() {
    let mut h = harness();
    h.select("Total Sales", "SUM(Sales[Amount])");

    h.click("optimizedTab");
    assert_eq!(h.requests.count_for(OPTIMIZE), 1);
    assert_eq!(h.shell.active_tab(), Panel::Optimized);

    // Loading: switching away and back does not refetch.
    h.click("originalTab");
    h.click("optimizedTab");
    assert_eq!(h.requests.count_for(OPTIMIZE), 1);

    let request = h.requests.pop().unwrap();
    h.respond(request, Ok(json!({ "optimized_dax": "SUMX(Sales, Sales[Amount])" })));
    h.click("expandedTab");
    h.click("optimizedTab");
    assert!(h.requests.is_empty());
    assert_eq!(h.text(ids::OPTIMIZED_CODE), "SUMX(Sales, Sales[Amount])");

    h.select("Margin", "DIVIDE([Profit], [Sales])");
    assert!(ArtifactKind::Optimize.is_placeholder(h.shell.dom()));
    h.click("optimizedTab");
    assert_eq!(h.requests.count_for(OPTIMIZE), 1);
    assert_eq!(h.requests.pop().unwrap().body.measure_name, "Margin");
}

#[test]
fn no_fetch_without_a_selected_measure() {
    let mut h = harness();
    h.click("optimizedTab");
    h.click("explanationTab");
    assert!(h.requests.is_empty());
    assert!(ArtifactKind::Optimize.is_placeholder(h.shell.dom()));
    assert_eq!(h.shell.dom().display(ids::OPTIMIZED_LOADING), Some(Display::None));
}

#[test]
fn no_fetch_for_blank_expression() {
    let mut h = harness();
    h.select("Empty", "   ");
    h.shell.load_optimized_definition();
    h.shell.load_explanation();
    assert!(h.requests.is_empty());
}

#[test]
fn explanation_markdown_is_rendered() {
    let mut h = harness();
    h.select("Total", "SUM(T[x])");
    h.click("explanationTab");
    assert_eq!(h.requests.count_for(EXPLAIN), 1);
    assert_eq!(
        h.shell.dom().display(ids::EXPLANATION_LOADING),
        Some(Display::Flex)
    );

    let request = h.requests.pop().unwrap();
    h.respond(request, Ok(json!({ "explanation": "# Title\n\nSums **x**." })));

    let html = h.shell.dom().html(ids::EXPLANATION_CONTENT).unwrap();
    assert!(html.contains("<h1>Title</h1>"));
    assert!(html.contains("<strong>x</strong>"));
    assert_eq!(
        h.shell.dom().display(ids::EXPLANATION_LOADING),
        Some(Display::None)
    );
}

#[test]
fn non_2xx_shows_fixed_error_and_hides_loading() {
    let mut h = harness();
    h.select("Total", "SUM(T[x])");
    h.click("optimizedTab");
    h.click("explanationTab");
    assert_eq!(h.requests.len(), 2);

    for request in h.requests.take() {
        h.respond(request, Err(FetchFailure::Status(502)));
    }

    assert_eq!(
        h.text(ids::OPTIMIZED_CODE),
        "Error: Failed to optimize the measure. Please try again."
    );
    assert_eq!(
        h.text(ids::EXPLANATION_CONTENT),
        "Error: Failed to generate explanation. Please try again."
    );
    for kind in ArtifactKind::ALL {
        assert_eq!(h.shell.dom().display(kind.loading_id()), Some(Display::None));
        assert!(!h.shell.is_loading(kind));
    }
    assert_eq!(h.log.entries_for("fetch.failed").len(), 2);

    // A failed panel is not a placeholder, so returning to it does not retry.
    h.click("originalTab");
    h.click("optimizedTab");
    assert!(h.requests.is_empty());
}

#[test]
fn malformed_success_shows_failed_message() {
    let mut h = harness();
    h.select("Total", "SUM(T[x])");
    h.click("optimizedTab");
    let request = h.requests.pop().unwrap();
    h.respond(request, Ok(json!({ "result": "wrong field" })));
    assert_eq!(h.text(ids::OPTIMIZED_CODE), "Failed to optimize the measure.");
    assert!(h.log.entries_for("fetch.failed").is_empty());
}

#[test]
fn stale_response_never_lands_on_a_newer_measure() {
    let mut h = harness();
    h.select("First", "SUM(T[a])");
    h.click("optimizedTab");
    let stale = h.requests.pop().unwrap();

    // Two rapid measure switches while the first fetch is in flight.
    h.select("Second", "SUM(T[b])");
    h.select("Third", "SUM(T[c])");

    h.respond(stale, Ok(json!({ "optimized_dax": "optimized First" })));
    assert!(ArtifactKind::Optimize.is_placeholder(h.shell.dom()));
    assert!(!h.text(ids::OPTIMIZED_CODE).contains("First"));
    assert_eq!(h.log.entries_for("fetch.stale").len(), 1);

    h.click("optimizedTab");
    let fresh = h.requests.pop().unwrap();
    assert_eq!(fresh.body.measure_name, "Third");
    h.respond(fresh, Ok(json!({ "optimized_dax": "optimized Third" })));
    assert_eq!(h.text(ids::OPTIMIZED_CODE), "optimized Third");
}

#[test]
fn stale_response_does_not_clobber_a_newer_in_flight_request() {
    let mut h = harness();
    h.select("First", "SUM(T[a])");
    h.click("optimizedTab");
    let stale = h.requests.pop().unwrap();

    h.select("Second", "SUM(T[b])");
    h.click("optimizedTab");
    let fresh = h.requests.pop().unwrap();

    h.respond(stale, Err(FetchFailure::Status(500)));
    assert!(h.shell.is_loading(ArtifactKind::Optimize));
    assert_eq!(h.text(ids::OPTIMIZED_CODE), "Optimizing...");
    assert_eq!(
        h.shell.dom().display(ids::OPTIMIZED_LOADING),
        Some(Display::Flex)
    );

    h.respond(fresh, Ok(json!({ "optimized_dax": "ok" })));
    assert_eq!(h.text(ids::OPTIMIZED_CODE), "ok");
}

#[test]
fn measure_change_without_reset_restores_the_panel() {
    let mut h = harness();
    h.select("First", "SUM(T[a])");
    h.click("optimizedTab");
    let request = h.requests.pop().unwrap();

    // The name display changes without going through the reset hook.
    h.shell.dom_mut().set_text(ids::MEASURE_NAME, "Second");
    h.respond(request, Ok(json!({ "optimized_dax": "stale" })));

    assert_eq!(
        h.shell.dom().display(ids::OPTIMIZED_LOADING),
        Some(Display::None)
    );
    assert!(ArtifactKind::Optimize.is_placeholder(h.shell.dom()));
    assert!(!h.shell.is_loading(ArtifactKind::Optimize));
    assert_eq!(
        h.shell.last_delivery(ArtifactKind::Optimize),
        Some(&Delivery::Stale(StaleReason::MeasureChanged))
    );

    h.click("originalTab");
    h.click("optimizedTab");
    assert_eq!(h.requests.count_for(OPTIMIZE), 1);
    assert_eq!(h.requests.pop().unwrap().body.measure_name, "Second");
}

#[test]
fn stale_discard_is_logged_once() {
    let mut h = harness();
    h.select("First", "SUM(T[a])");
    h.click("explanationTab");
    let stale = h.requests.pop().unwrap();
    h.select("Second", "SUM(T[b])");

    h.respond(stale, Ok(json!({ "explanation": "old" })));
    let fetch_entries: Vec<_> = h
        .log
        .entries()
        .into_iter()
        .filter(|e| e.event.starts_with("fetch.") && e.event != "fetch.started")
        .collect();
    assert_eq!(fetch_entries.len(), 1);
    assert_eq!(fetch_entries[0].event, "fetch.stale");
}

#[test]
fn last_delivery_reports_outcome_not_content() {
    let mut h = harness();
    h.select("Total", "SUM(T[x])");
    h.click("explanationTab");
    let request = h.requests.pop().unwrap();
    h.respond(
        request,
        Ok(json!({ "explanation": "It never says Failed to generate explanation." })),
    );
    assert!(h.text(ids::EXPLANATION_CONTENT).contains("Failed to generate explanation."));
    assert_eq!(
        h.shell.last_delivery(ArtifactKind::Explain),
        Some(&Delivery::Rendered)
    );

    h.select("Other", "SUM(T[y])");
    assert!(h.shell.last_delivery(ArtifactKind::Explain).is_none());
    h.click("explanationTab");
    let request = h.requests.pop().unwrap();
    h.respond(request, Err(FetchFailure::Status(502)));
    assert_eq!(
        h.shell.last_delivery(ArtifactKind::Explain),
        Some(&Delivery::HardFailure(FetchFailure::Status(502)))
    );
}

#[test]
fn response_lands_even_after_switching_tabs_away() {
    let mut h = harness();
    h.select("Total", "SUM(T[x])");
    h.click("explanationTab");
    h.click("originalTab");

    let request = h.requests.pop().unwrap();
    h.respond(request, Ok(json!({ "explanation": "Plain text." })));
    assert!(h.text(ids::EXPLANATION_CONTENT).contains("Plain text."));
    assert_eq!(h.shell.active_tab(), Panel::Original);

    h.click("explanationTab");
    assert!(h.requests.is_empty());
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[test]
fn every_notification_walks_each_phase_once() {
    let mut h = harness();
    let full = ["created", "visible", "removing", "detached"];

    let auto = h
        .shell
        .show_notification("auto", NotificationKind::Success, None)
        .unwrap();
    let early = h
        .shell
        .show_notification("early", NotificationKind::Error, None)
        .unwrap();
    // Dismissed before the enter delay elapses.
    h.shell.dismiss_notification(early);

    h.shell.advance(Duration::from_millis(500));
    let mid = h
        .shell
        .show_notification("mid", NotificationKind::Warning, Some(Duration::from_millis(1000)))
        .unwrap();
    h.shell.advance(Duration::from_millis(200));
    h.click(&mid.close_button_id());
    h.click(&mid.close_button_id());

    // Racing: expiry fires first, then the user clicks close.
    h.shell.advance_to(Duration::from_millis(3000));
    assert!(!h.shell.dismiss_notification(auto));

    h.shell.advance(Duration::from_secs(10));
    for id in [auto, early, mid] {
        assert_eq!(h.notification_phases(&id.to_string()), full, "{id}");
        assert!(!h.shell.dom().exists(&id.element_id()));
    }
    assert!(h.shell.dom().children(ids::NOTIFICATION_CONTAINER).is_empty());
}

#[test]
fn notifications_coexist_in_insertion_order() {
    let mut h = harness();
    let ids_shown: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|m| {
            h.shell
                .show_notification(m, NotificationKind::parse("nonsense"), None)
                .unwrap()
        })
        .collect();
    let children = h.shell.dom().children(ids::NOTIFICATION_CONTAINER);
    let expected: Vec<_> = ids_shown.iter().map(|id| id.element_id()).collect();
    assert_eq!(children, expected);

    h.shell.advance(Duration::from_millis(10));
    for id in &ids_shown {
        assert!(h.shell.dom().has_class(&id.element_id(), classes::VISIBLE));
        assert!(h.shell.dom().has_class(&id.element_id(), "notification-info"));
    }
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

#[test]
fn debounced_callback_runs_once_with_last_args() {
    let mut h = harness();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    let key = h
        .shell
        .debounce(None, move |arg: String| sink.borrow_mut().push(arg));

    for i in 0..5 {
        h.shell.call_debounced(key, format!("call {i}"));
        h.shell.advance(Duration::from_millis(100));
    }
    assert!(calls.borrow().is_empty());

    h.shell.advance(Duration::from_millis(199));
    assert!(calls.borrow().is_empty());
    h.shell.advance(Duration::from_millis(1));
    assert_eq!(calls.borrow().as_slice(), ["call 4"]);

    h.shell.advance(Duration::from_secs(5));
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn separate_debounced_callbacks_are_independent() {
    let mut h = harness();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let (a_sink, b_sink) = (Rc::clone(&calls), Rc::clone(&calls));
    let a = h
        .shell
        .debounce(Some(Duration::from_millis(50)), move |s| a_sink.borrow_mut().push(format!("a:{s}")));
    let b = h
        .shell
        .debounce(Some(Duration::from_millis(100)), move |s| b_sink.borrow_mut().push(format!("b:{s}")));

    h.shell.call_debounced(a, "1");
    h.shell.call_debounced(b, "2");
    h.shell.advance(Duration::from_millis(100));
    assert_eq!(calls.borrow().as_slice(), ["a:1", "b:2"]);
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

const METRICS: [(&str, &str); 4] = [
    ("zero", "0"),
    ("one", "1"),
    ("nines", "999"),
    ("million", "1000000"),
];

fn counter_config(strategy: CounterStrategy, trigger: CounterTrigger) -> UiConfig {
    let mut config = UiConfig::default();
    config.counters.strategy = strategy;
    config.counters.trigger = trigger;
    config
}

#[test]
fn eager_counters_end_exactly_on_target() {
    for strategy in [CounterStrategy::Eased, CounterStrategy::Stepped] {
        let mut h = harness_with(
            counter_config(strategy, CounterTrigger::Eager),
            Box::new(MemoryStorage::new()),
            &METRICS,
        );
        assert_eq!(h.text("zero"), "0");

        h.shell.advance(Duration::from_millis(2000));
        for (id, target) in METRICS {
            assert_eq!(h.text(id), target, "{strategy} {id}");
        }
        assert_eq!(h.shell.counters().running_count(), 0);
    }
}

#[test]
fn visible_counters_start_once_past_threshold() {
    let mut h = harness_with(UiConfig::default(), Box::new(MemoryStorage::new()), &METRICS);
    h.shell.advance(Duration::from_secs(2));
    assert_eq!(h.text("nines"), "0");

    h.shell.handle_input(Input::Visibility {
        element: "nines".to_string(),
        ratio: 0.49,
    });
    h.shell.advance(Duration::from_secs(2));
    assert_eq!(h.text("nines"), "0");

    h.shell.handle_input(Input::Visibility {
        element: "nines".to_string(),
        ratio: 0.5,
    });
    h.shell.advance(Duration::from_millis(750));
    let midway: i64 = h.text("nines").parse().unwrap();
    assert!(midway > 0 && midway < 999);
    h.shell.advance(Duration::from_millis(800));
    assert_eq!(h.text("nines"), "999");

    // Observation ended after the first trigger.
    h.shell.dom_mut().set_text("nines", "5");
    h.shell.handle_input(Input::Visibility {
        element: "nines".to_string(),
        ratio: 1.0,
    });
    h.shell.advance(Duration::from_secs(2));
    assert_eq!(h.text("nines"), "5");
    assert_eq!(h.text("million"), "0");
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[test]
fn persisted_light_theme_is_restored_silently() {
    let storage = MemoryStorage::new().with("darkMode", "false");
    let mut h = harness_with(UiConfig::default(), Box::new(storage), &[]);
    assert_eq!(h.shell.theme(), Theme::Light);
    assert!(h.shell.dom().has_class(ids::BODY, classes::LIGHT_MODE));
    assert!(h.shell.dom().html(ids::THEME_TOGGLE).unwrap().contains("fa-moon"));
    assert!(h.log.entries_for("theme.changed").is_empty());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    h.shell.subscribe_theme(move |theme| sink.borrow_mut().push(theme));
    h.click(ids::THEME_TOGGLE);

    assert_eq!(seen.borrow().as_slice(), [Theme::Dark]);
    assert!(h.shell.dom().has_class(ids::BODY, classes::DARK_MODE));
    assert!(!h.shell.dom().has_class(ids::BODY, classes::LIGHT_MODE));
    assert_eq!(
        h.shell.dom().attr(ids::THEME_TOGGLE, "aria-label").as_deref(),
        Some("Switch to light mode")
    );
}

#[test]
fn toggle_persists_through_file_storage() {
    let dir = std::env::temp_dir().join(format!("pbi-explorer-shell-{}", std::process::id()));
    let path = dir.join("preferences.json");
    let _ = std::fs::remove_file(&path);

    let mut h = harness_with(
        UiConfig::default(),
        Box::new(FileStorage::new(path.clone())),
        &[],
    );
    assert_eq!(h.shell.theme(), Theme::Dark);
    assert_eq!(h.shell.toggle_theme(), Theme::Light);

    let reopened = FileStorage::new(path);
    assert_eq!(reopened.get("darkMode").as_deref(), Some("false"));
    let h2 = harness_with(UiConfig::default(), Box::new(reopened), &[]);
    assert_eq!(h2.shell.theme(), Theme::Light);

    let _ = std::fs::remove_dir_all(dir);
}

// ---------------------------------------------------------------------------
// Chrome
// ---------------------------------------------------------------------------

#[test]
fn resize_storm_is_debounced() {
    let mut h = harness();
    h.click(ids::SIDEBAR_TOGGLE);
    for width in [700, 900, 1000, 1100] {
        h.shell.handle_input(Input::Resize(width));
        h.shell.advance(Duration::from_millis(100));
    }
    assert!(h.shell.dom().has_class(ids::SIDEBAR, classes::OPEN));
    h.shell.advance(Duration::from_millis(200));
    assert!(!h.shell.dom().has_class(ids::SIDEBAR, classes::OPEN));
}

#[test]
fn app_loaded_and_clock() {
    let mut h = harness();
    assert!(!h.shell.dom().has_class(ids::BODY, classes::APP_LOADED));
    h.shell.advance(Duration::from_millis(100));
    assert!(h.shell.dom().has_class(ids::BODY, classes::APP_LOADED));
    assert!(!h.text(ids::DATETIME).is_empty());
}

#[test]
fn missing_elements_degrade_to_noops() {
    let requests = RecordingDispatcher::new();
    let mut shell = Shell::new(
        MemoryDom::new(),
        UiConfig::default(),
        Box::new(MemoryStorage::new()),
        Box::new(requests.clone()),
        DiagnosticLog::disabled(),
    );
    shell.init();
    shell.click("optimizedTab");
    shell.click(ids::SIDEBAR_TOGGLE);
    shell.toggle_theme();
    shell.reset_artifacts();
    assert!(
        shell
            .show_notification("nowhere to go", NotificationKind::Info, None)
            .is_none()
    );
    shell.advance(Duration::from_secs(5));
    assert!(requests.is_empty());
    assert!(shell.dom().is_empty());
}
