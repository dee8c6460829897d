//! Trailing-edge debounce on top of the shared timer queue.
//!
//! A [`Debounce`] holds at most one pending call. Every new call cancels the
//! previous timer and schedules a fresh one `wait` into the future, keeping
//! only the latest arguments. When the timer fires, the owner hands the
//! [`TimerId`] back to [`Debounce::fire`] and receives those arguments.
//! Timers from superseded calls never produce anything.
use std::time::Duration;

use super::timers::{TimerId, Timers};

/// Default debounce wait.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(300);

/// Pending-call state for one debounced callback.
#[derive(Debug)]
pub struct Debounce<A> {
    wait: Duration,
    pending: Option<(TimerId, A)>,
}

impl<A> Default for Debounce<A> {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT)
    }
}

impl<A> Debounce<A> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Register a call. Any earlier pending call is dropped and its timer
    /// cancelled; `event` is scheduled to fire after the wait interval.
    pub fn call<E>(&mut self, timers: &mut Timers<E>, event: E, args: A) -> TimerId {
        if let Some((previous, _)) = self.pending.take() {
            timers.cancel(previous);
        }
        let id = timers.schedule(self.wait, event);
        self.pending = Some((id, args));
        id
    }

    /// Consume the pending arguments if `timer` belongs to the latest call.
    pub fn fire(&mut self, timer: TimerId) -> Option<A> {
        match self.pending.take() {
            Some((id, args)) if id == timer => Some(args),
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Drop the pending call without running it.
    pub fn cancel<E>(&mut self, timers: &mut Timers<E>) {
        if let Some((id, _)) = self.pending.take() {
            timers.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// A debounced callback: the [`Debounce`] state plus the function it wraps.
pub struct Debounced<A> {
    state: Debounce<A>,
    callback: Box<dyn FnMut(A)>,
}

impl<A> Debounced<A> {
    pub fn new(wait: Duration, callback: impl FnMut(A) + 'static) -> Self {
        Self {
            state: Debounce::new(wait),
            callback: Box::new(callback),
        }
    }

    pub fn call<E>(&mut self, timers: &mut Timers<E>, event: E, args: A) -> TimerId {
        self.state.call(timers, event, args)
    }

    /// Run the callback if `timer` is the latest call's timer. Returns whether
    /// it ran.
    pub fn fire(&mut self, timer: TimerId) -> bool {
        match self.state.fire(timer) {
            Some(args) => {
                (self.callback)(args);
                true
            }
            None => false,
        }
    }
}

impl<A> std::fmt::Debug for Debounced<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounced")
            .field("wait", &self.state.wait)
            .field("pending", &self.state.is_pending())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
