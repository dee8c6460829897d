//! Virtual-time timer queue for the single-threaded UI event loop.
//!
//! Every delayed step in the shell (notification enter/exit delays,
//! auto-dismiss, counter ticks, animation frames, debounce waits, the clock
//! display) is an entry in one [`Timers`] queue. Nothing sleeps: the host
//! advances time explicitly, either from the wall clock
//! ([`super::event_loop::EventLoop`]) or from a test.
//!
//! Entries due at the same instant fire in the order they were scheduled.
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle to a scheduled timer, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Ordered queue of pending timer events.
#[derive(Debug)]
pub struct Timers<E> {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), E>,
    deadlines: HashMap<u64, Duration>,
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timers<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time (elapsed since the queue was created).
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `event` to fire `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        let deadline = self.now + delay;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((deadline, seq), event);
        self.deadlines.insert(seq, deadline);
        TimerId(seq)
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id.0) {
            Some(deadline) => self.queue.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }

    /// Whether the timer is still waiting to fire.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id.0)
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, E)> {
        let (&(deadline, seq), _) = self.queue.iter().next()?;
        if deadline > until {
            return None;
        }
        let event = self.queue.remove(&(deadline, seq))?;
        self.deadlines.remove(&seq);
        if deadline > self.now {
            self.now = deadline;
        }
        Some((TimerId(seq), event))
    }

    /// Move the clock forward without firing anything. Time never runs
    /// backwards.
    pub fn set_now(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
