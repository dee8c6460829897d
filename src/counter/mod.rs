//! Animated metric counters.
//!
//! A counter drives an element's text from a start value to a target over a
//! duration. Two strategies are available:
//!
//! * **Eased**: one frame every `frame_interval`; elapsed time is mapped
//!   through the ease-out quartic `1 - (1 - t)^4`.
//! * **Stepped**: fixed-interval ticks of `duration / |range|`, one unit per
//!   tick. Ticks never get shorter than [`MIN_TICK`]; for large ranges the
//!   per-tick increment grows instead, so the run still spans the duration.
//!
//! Either way the last write is exactly the target. A zero range or zero
//! duration writes the target immediately.
//!
//! [`CounterAnimator::init_counters`] picks up every `.metric-value` element
//! and either animates it at once or waits until it is first at least
//! half visible. Each element animates at most once per page load.
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::schema::CounterConfig;
use crate::dom::{Dom, classes};
use crate::runtime::{Event, Timers};

/// Shortest interval between stepped ticks.
pub const MIN_TICK: Duration = Duration::from_millis(4);

/// Attribute holding a metric's target value.
pub const TARGET_ATTR: &str = "data-value";

// ---------------------------------------------------------------------------
// Configuration enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterStrategy {
    Stepped,
    #[default]
    Eased,
}

impl CounterStrategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::Stepped => "stepped",
            Self::Eased => "eased",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_ascii_lowercase().as_str() {
            "stepped" | "linear" => Some(Self::Stepped),
            "eased" | "ease-out" => Some(Self::Eased),
            _ => None,
        }
    }
}

impl std::fmt::Display for CounterStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// When metric counters start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterTrigger {
    #[default]
    OnVisible,
    Eager,
}

impl CounterTrigger {
    pub fn name(self) -> &'static str {
        match self {
            Self::OnVisible => "on-visible",
            Self::Eager => "eager",
        }
    }
}

impl std::fmt::Display for CounterTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Animation state
// ---------------------------------------------------------------------------

/// Identifier of one running animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterId(u64);

#[derive(Debug)]
enum Progress {
    Stepped { current: i64, increment: i64 },
    Eased { started_at: Duration },
}

#[derive(Debug)]
struct Animation {
    element: String,
    start: i64,
    target: i64,
    duration: Duration,
    interval: Duration,
    progress: Progress,
}

/// Runs counter animations on the shared timer queue.
#[derive(Debug)]
pub struct CounterAnimator {
    strategy: CounterStrategy,
    trigger: CounterTrigger,
    duration: Duration,
    threshold: f64,
    frame_interval: Duration,
    next_id: u64,
    running: HashMap<CounterId, Animation>,
    /// Elements waiting for their first sufficient visibility report.
    observed: BTreeSet<String>,
    started: HashSet<String>,
}

impl Default for CounterAnimator {
    fn default() -> Self {
        Self::new(&CounterConfig::default())
    }
}

impl CounterAnimator {
    pub fn new(config: &CounterConfig) -> Self {
        Self {
            strategy: config.strategy,
            trigger: config.trigger,
            duration: Duration::from_millis(config.duration_ms),
            threshold: config.visibility_threshold,
            frame_interval: Duration::from_millis(config.frame_interval_ms.max(1)),
            next_id: 1,
            running: HashMap::new(),
            observed: BTreeSet::new(),
            started: HashSet::new(),
        }
    }

    pub fn strategy(&self) -> CounterStrategy {
        self.strategy
    }

    /// Animate `element` from `start` to `target` over `duration`.
    ///
    /// Returns the id of the running animation, or `None` when the element
    /// is missing or the target was written immediately.
    pub fn animate(
        &mut self,
        dom: &mut dyn Dom,
        timers: &mut Timers<Event>,
        element: &str,
        start: i64,
        target: i64,
        duration: Duration,
    ) -> Option<CounterId> {
        if !dom.exists(element) {
            return None;
        }
        let range = target.abs_diff(start);
        if range == 0 || duration.is_zero() {
            dom.set_text(element, &target.to_string());
            return None;
        }

        let id = CounterId(self.next_id);
        self.next_id += 1;

        let (interval, progress) = match self.strategy {
            CounterStrategy::Stepped => {
                let (interval, step) = step_plan(duration, range);
                let sign = if target > start { 1 } else { -1 };
                (
                    interval,
                    Progress::Stepped {
                        current: start,
                        increment: sign * step,
                    },
                )
            }
            CounterStrategy::Eased => (
                self.frame_interval,
                Progress::Eased {
                    started_at: timers.now(),
                },
            ),
        };

        dom.set_text(element, &start.to_string());
        self.running.insert(
            id,
            Animation {
                element: element.to_string(),
                start,
                target,
                duration,
                interval,
                progress,
            },
        );
        timers.schedule(interval, Event::Counter(id));
        Some(id)
    }

    /// Advance animation `id` by one tick or frame.
    pub fn handle(&mut self, dom: &mut dyn Dom, timers: &mut Timers<Event>, id: CounterId) {
        let Some(anim) = self.running.get_mut(&id) else {
            return;
        };

        let (value, done) = match &mut anim.progress {
            Progress::Stepped { current, increment } => {
                *current = current.saturating_add(*increment);
                let done = if *increment > 0 {
                    *current >= anim.target
                } else {
                    *current <= anim.target
                };
                (*current, done)
            }
            Progress::Eased { started_at } => {
                let elapsed = timers.now().saturating_sub(*started_at);
                let t = (elapsed.as_secs_f64() / anim.duration.as_secs_f64()).min(1.0);
                let eased = ease_out_quart(t);
                let span = anim.target as f64 - anim.start as f64;
                let value = anim.start as f64 + span * eased;
                (value.round() as i64, t >= 1.0)
            }
        };

        if done {
            dom.set_text(&anim.element, &anim.target.to_string());
            self.running.remove(&id);
        } else {
            dom.set_text(&anim.element, &value.to_string());
            timers.schedule(anim.interval, Event::Counter(id));
        }
    }

    /// Register every `.metric-value` element. With the eager trigger they
    /// start animating now; otherwise they wait for
    /// [`on_visibility`](Self::on_visibility).
    pub fn init_counters(&mut self, dom: &mut dyn Dom, timers: &mut Timers<Event>) {
        for element in dom.ids_with_class(classes::METRIC_VALUE) {
            if self.started.contains(&element) {
                continue;
            }
            match self.trigger {
                CounterTrigger::Eager => self.start_metric(dom, timers, &element),
                CounterTrigger::OnVisible => {
                    self.observed.insert(element);
                }
            }
        }
    }

    /// Visibility report for `element`. Starts its animation the first time
    /// the ratio reaches the threshold, then stops observing it.
    pub fn on_visibility(
        &mut self,
        dom: &mut dyn Dom,
        timers: &mut Timers<Event>,
        element: &str,
        ratio: f64,
    ) -> bool {
        if ratio < self.threshold || !self.observed.remove(element) {
            return false;
        }
        self.start_metric(dom, timers, element);
        true
    }

    pub fn is_observed(&self, element: &str) -> bool {
        self.observed.contains(element)
    }

    pub fn is_running(&self, id: CounterId) -> bool {
        self.running.contains_key(&id)
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    fn start_metric(&mut self, dom: &mut dyn Dom, timers: &mut Timers<Event>, element: &str) {
        self.started.insert(element.to_string());
        let target = dom
            .attr(element, TARGET_ATTR)
            .map(|raw| parse_leading_int(&raw))
            .unwrap_or(0);
        self.animate(dom, timers, element, 0, target, self.duration);
    }
}

/// Ease-out quartic: fast start, slow finish.
pub fn ease_out_quart(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(4)
}

/// Tick interval and per-tick increment for a stepped run over `range`
/// units.
fn step_plan(duration: Duration, range: u64) -> (Duration, i64) {
    let per_unit = duration.as_millis() / u128::from(range);
    if per_unit >= MIN_TICK.as_millis() {
        // `per_unit` is at most `duration` in millis.
        return (Duration::from_millis(per_unit as u64), 1);
    }
    let ticks = (duration.as_millis() / MIN_TICK.as_millis()).max(1);
    let step = u128::from(range).div_ceil(ticks);
    (MIN_TICK, i64::try_from(step).unwrap_or(i64::MAX))
}

/// Parse a leading integer the way browsers parse `data-` attributes:
/// optional whitespace and sign, then digits; anything else yields 0.
pub fn parse_leading_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().unwrap_or(0);
    if negative { -magnitude } else { magnitude }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
