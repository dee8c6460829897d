//! AI fetch coordinator for the "optimized" and "explanation" panels.
//!
//! For each [`ArtifactKind`] the coordinator turns a panel activation into a
//! [`FetchRequest`] and later applies the matching [`FetchCompletion`] to
//! the page. It never performs I/O itself; the shell hands requests to a
//! dispatcher and feeds completions back in.
//!
//! # Lifecycle
//!
//! ```text
//! begin(kind) ──▶ loading shown, content = loading text, ticket stored
//!      │
//!      ▼  (dispatcher performs the POST)
//! complete(completion)
//!      ├─ ticket superseded or measure changed ─▶ Stale, page untouched
//!      ├─ 2xx with non-empty field ─────────────▶ Rendered
//!      ├─ 2xx without it ───────────────────────▶ SoftFailure message
//!      └─ transport / non-2xx / bad JSON ───────▶ HardFailure message
//! ```
//!
//! Every non-stale outcome hides the loading indicator.
//!
//! # Stale responses
//!
//! Each request carries a [`Ticket`] naming its kind, a sequence number, and
//! the measure it was issued for. A completion is applied only if its ticket
//! is still the in-flight ticket for that kind *and* the page still shows
//! that measure. [`FetchCoordinator::reset`] (called when a different
//! measure is selected) restores both placeholders and forgets in-flight
//! tickets, so a late answer for the previous measure is dropped.
pub mod client;
pub mod markdown;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

pub use client::{ArtifactRequest, FetchFailure, Transport, UreqTransport};

use crate::diagnostics::DiagnosticLog;
use crate::dom::{Display, Dom, classes, escape_html, ids};

/// Marker text identifying an unselected measure or an unloaded panel.
const SELECT_A_MEASURE: &str = "Select a measure";

/// Matches an element carrying the `placeholder-text` class.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"class\s*=\s*["'][^"']*\b{}\b"#,
        classes::PLACEHOLDER_TEXT
    ))
    .expect("placeholder regex must compile")
});

// ---------------------------------------------------------------------------
// Artifact kinds
// ---------------------------------------------------------------------------

/// Which AI-backed operation (and panel) a fetch concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Optimize,
    Explain,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Optimize, ArtifactKind::Explain];

    fn index(self) -> usize {
        match self {
            Self::Optimize => 0,
            Self::Explain => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Optimize => "optimize",
            Self::Explain => "explain",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Optimize => "/api/optimize-dax",
            Self::Explain => "/api/explain-dax",
        }
    }

    /// Field of a successful response that holds the artifact text.
    pub fn response_field(self) -> &'static str {
        match self {
            Self::Optimize => "optimized_dax",
            Self::Explain => "explanation",
        }
    }

    pub fn loading_id(self) -> &'static str {
        match self {
            Self::Optimize => ids::OPTIMIZED_LOADING,
            Self::Explain => ids::EXPLANATION_LOADING,
        }
    }

    pub fn content_id(self) -> &'static str {
        match self {
            Self::Optimize => ids::OPTIMIZED_CODE,
            Self::Explain => ids::EXPLANATION_CONTENT,
        }
    }

    /// Whether the panel still shows its placeholder.
    pub fn is_placeholder(self, dom: &dyn Dom) -> bool {
        match self {
            Self::Optimize => dom
                .text(self.content_id())
                .is_some_and(|text| text.contains(SELECT_A_MEASURE)),
            Self::Explain => dom
                .html(self.content_id())
                .is_some_and(|html| PLACEHOLDER_RE.is_match(&html)),
        }
    }

    pub fn write_placeholder(self, dom: &mut dyn Dom) {
        match self {
            Self::Optimize => {
                dom.set_text(
                    self.content_id(),
                    "Select a measure to see its optimized version",
                );
            }
            Self::Explain => {
                dom.set_html(
                    self.content_id(),
                    &format!(
                        "<div class=\"{}\">Select a measure to see its explanation</div>",
                        classes::PLACEHOLDER_TEXT
                    ),
                );
            }
        }
    }

    fn write_loading(self, dom: &mut dyn Dom) {
        match self {
            Self::Optimize => {
                dom.set_text(self.content_id(), "Optimizing...");
            }
            Self::Explain => {
                dom.set_html(
                    self.content_id(),
                    "<div class='loading-text'>Generating explanation...</div>",
                );
            }
        }
    }

    fn write_artifact(self, dom: &mut dyn Dom, text: &str) {
        match self {
            Self::Optimize => {
                dom.set_text(self.content_id(), text);
            }
            Self::Explain => {
                dom.set_html(self.content_id(), &markdown::to_html(text));
            }
        }
    }

    /// Message shown when a 2xx response lacks the artifact.
    pub fn soft_failure_message(self) -> &'static str {
        match self {
            Self::Optimize => "Failed to optimize the measure.",
            Self::Explain => "Failed to generate explanation.",
        }
    }

    /// Message shown on transport or non-2xx failure.
    pub fn hard_failure_message(self) -> &'static str {
        match self {
            Self::Optimize => "Error: Failed to optimize the measure. Please try again.",
            Self::Explain => "Error: Failed to generate explanation. Please try again.",
        }
    }

    fn write_message(self, dom: &mut dyn Dom, message: &str) {
        match self {
            Self::Optimize => {
                dom.set_text(self.content_id(), message);
            }
            Self::Explain => {
                dom.set_html(
                    self.content_id(),
                    &format!("<div class='error-text'>{}</div>", escape_html(message)),
                );
            }
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Requests and completions
// ---------------------------------------------------------------------------

/// Identity of one in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub kind: ArtifactKind,
    pub seq: u64,
    /// Measure name displayed when the request was issued.
    pub measure: String,
}

/// A request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub body: ArtifactRequest,
}

impl FetchRequest {
    pub fn endpoint(&self) -> &'static str {
        self.ticket.kind.endpoint()
    }

    /// Perform the request synchronously.
    pub fn execute(self, transport: &dyn Transport) -> FetchCompletion {
        let result = transport.post(self.endpoint(), &self.body);
        FetchCompletion {
            ticket: self.ticket,
            result,
        }
    }
}

/// The answer to a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCompletion {
    pub ticket: Ticket,
    pub result: Result<Value, FetchFailure>,
}

/// Why a completion was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// A newer request of the same kind was issued, or the panels were reset.
    Superseded,
    /// The page now shows a different measure.
    MeasureChanged,
}

/// What [`FetchCoordinator::complete`] did with a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Rendered,
    SoftFailure,
    HardFailure(FetchFailure),
    Stale(StaleReason),
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Tracks at most one in-flight request per artifact kind.
#[derive(Debug)]
pub struct FetchCoordinator {
    next_seq: u64,
    in_flight: [Option<Ticket>; 2],
    last: [Option<Delivery>; 2],
    log: DiagnosticLog,
}

impl FetchCoordinator {
    pub fn new(log: DiagnosticLog) -> Self {
        Self {
            next_seq: 1,
            in_flight: [None, None],
            last: [None, None],
            log,
        }
    }

    /// The in-flight ticket for `kind`, if any.
    pub fn in_flight(&self, kind: ArtifactKind) -> Option<&Ticket> {
        self.in_flight[kind.index()].as_ref()
    }

    /// The outcome of the most recent completion for `kind`.
    pub fn last_delivery(&self, kind: ArtifactKind) -> Option<&Delivery> {
        self.last[kind.index()].as_ref()
    }

    /// Start loading `kind` for the measure currently on the page.
    ///
    /// Returns `None` without touching the page when a required element is
    /// missing or no real expression is displayed.
    pub fn begin(&mut self, dom: &mut dyn Dom, kind: ArtifactKind) -> Option<FetchRequest> {
        if !dom.exists(kind.content_id()) || !dom.exists(kind.loading_id()) {
            return None;
        }
        let measure = dom.text(ids::MEASURE_NAME)?;
        let dax = dom.text(ids::ORIGINAL_CODE)?;
        if dax.trim().is_empty() || dax.contains(SELECT_A_MEASURE) {
            return None;
        }

        dom.set_display(kind.loading_id(), Display::Flex);
        kind.write_loading(dom);

        let ticket = Ticket {
            kind,
            seq: self.next_seq,
            measure: measure.clone(),
        };
        self.next_seq += 1;
        self.in_flight[kind.index()] = Some(ticket.clone());

        self.log.info(
            "fetch.started",
            format!("kind={kind} seq={} measure=\"{measure}\"", ticket.seq),
        );

        Some(FetchRequest {
            ticket,
            body: ArtifactRequest {
                dax,
                measure_name: measure,
            },
        })
    }

    /// Apply a completion to the page unless it is stale.
    pub fn complete(&mut self, dom: &mut dyn Dom, completion: FetchCompletion) -> Delivery {
        let kind = completion.ticket.kind;
        let delivery = self.apply(dom, completion);
        self.last[kind.index()] = Some(delivery.clone());
        delivery
    }

    fn apply(&mut self, dom: &mut dyn Dom, completion: FetchCompletion) -> Delivery {
        let FetchCompletion { ticket, result } = completion;
        let kind = ticket.kind;
        let slot = &mut self.in_flight[kind.index()];

        if slot.as_ref().map(|t| t.seq) != Some(ticket.seq) {
            self.log.warn(
                "fetch.stale",
                format!("kind={kind} seq={} superseded", ticket.seq),
            );
            return Delivery::Stale(StaleReason::Superseded);
        }
        *slot = None;

        let shown = dom.text(ids::MEASURE_NAME).unwrap_or_default();
        if shown != ticket.measure {
            self.log.warn(
                "fetch.stale",
                format!(
                    "kind={kind} seq={} issued for \"{}\" but page shows \"{shown}\"",
                    ticket.seq, ticket.measure
                ),
            );
            // Leave the panel ready to fetch for the measure now shown.
            dom.set_display(kind.loading_id(), Display::None);
            kind.write_placeholder(dom);
            return Delivery::Stale(StaleReason::MeasureChanged);
        }

        dom.set_display(kind.loading_id(), Display::None);

        match result {
            Ok(payload) => match extract_artifact(&payload, kind) {
                Some(text) => {
                    kind.write_artifact(dom, text);
                    self.log
                        .info("fetch.rendered", format!("kind={kind} seq={}", ticket.seq));
                    Delivery::Rendered
                }
                None => {
                    kind.write_message(dom, kind.soft_failure_message());
                    self.log.warn(
                        "fetch.malformed",
                        format!(
                            "kind={kind} seq={} missing field '{}'",
                            ticket.seq,
                            kind.response_field()
                        ),
                    );
                    Delivery::SoftFailure
                }
            },
            Err(failure) => {
                kind.write_message(dom, kind.hard_failure_message());
                self.log.error(
                    "fetch.failed",
                    format!("kind={kind} seq={} {failure}", ticket.seq),
                );
                Delivery::HardFailure(failure)
            }
        }
    }

    /// Restore both placeholders and forget in-flight requests.
    pub fn reset(&mut self, dom: &mut dyn Dom) {
        for kind in ArtifactKind::ALL {
            kind.write_placeholder(dom);
            dom.set_display(kind.loading_id(), Display::None);
            self.in_flight[kind.index()] = None;
            self.last[kind.index()] = None;
        }
    }
}

/// Non-empty string value of the kind's response field.
fn extract_artifact(payload: &Value, kind: ArtifactKind) -> Option<&str> {
    payload
        .get(kind.response_field())
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
