//! Cooperative runtime: timer events, host inputs, and fetch dispatch.
//!
//! The shell is a single-threaded state machine. It reacts to two things:
//!
//! * [`Event`]s popped from its [`Timers`] queue as virtual time advances.
//! * [`Input`]s delivered by the host: clicks, visibility changes, window
//!   resizes, and fetch completions.
//!
//! Network I/O is the only work that leaves the event loop. A
//! [`Dispatcher`] receives each [`FetchRequest`] and is responsible for
//! getting a [`FetchCompletion`] back to the shell as
//! [`Input::FetchCompleted`].
pub mod debounce;
pub mod event_loop;
pub mod timers;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

pub use debounce::{DEFAULT_WAIT, Debounce, Debounced};
pub use event_loop::EventLoop;
pub use timers::{TimerId, Timers};

use crate::ai::{FetchCompletion, FetchFailure, FetchRequest, Transport};
use crate::counter::CounterId;
use crate::notify::{NotificationId, NotificationStep};

/// Handle to a debounced callback registered on the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DebounceKey(pub(crate) usize);

/// Everything the shell schedules on its timer queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Notification(NotificationId, NotificationStep),
    /// Next step (stepped tick or eased frame) of a counter animation.
    Counter(CounterId),
    Debounced(DebounceKey),
    ResizeSettled,
    ClockTick,
    AppLoaded,
}

/// Something the host reports to the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// The user activated the element with this identifier.
    Click(String),
    /// Fraction of an element now inside the viewport (0.0..=1.0).
    Visibility { element: String, ratio: f64 },
    /// New window width in CSS pixels.
    Resize(u32),
    FetchCompleted(FetchCompletion),
}

// ---------------------------------------------------------------------------
// Dispatchers
// ---------------------------------------------------------------------------

/// Performs fetch requests outside the event loop.
pub trait Dispatcher {
    fn dispatch(&mut self, request: FetchRequest);
}

/// Runs each request on its own worker thread and posts the completion back
/// over a channel.
pub struct ThreadDispatcher {
    transport: Arc<dyn Transport>,
    sender: Sender<Input>,
}

impl ThreadDispatcher {
    pub fn new(transport: Arc<dyn Transport>, sender: Sender<Input>) -> Self {
        Self { transport, sender }
    }
}

impl Dispatcher for ThreadDispatcher {
    fn dispatch(&mut self, request: FetchRequest) {
        let ticket = request.ticket.clone();
        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();

        let spawned = thread::Builder::new()
            .name(format!("fetch-{}-{}", ticket.kind, ticket.seq))
            .spawn(move || {
                let completion = request.execute(transport.as_ref());
                // Receiver gone means the shell was dropped; nothing to do.
                let _ = sender.send(Input::FetchCompleted(completion));
            });

        if let Err(e) = spawned {
            let _ = self.sender.send(Input::FetchCompleted(FetchCompletion {
                ticket,
                result: Err(FetchFailure::Transport(format!(
                    "failed to spawn worker: {e}"
                ))),
            }));
        }
    }
}

impl std::fmt::Debug for ThreadDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadDispatcher").finish_non_exhaustive()
    }
}

/// Queues requests for the host to complete by hand.
///
/// Clones share the queue, so a test can keep one handle while the shell
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    queue: Rc<RefCell<VecDeque<FetchRequest>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests dispatched and not yet taken.
    pub fn pending(&self) -> Vec<FetchRequest> {
        self.queue.borrow().iter().cloned().collect()
    }

    /// Remove and return every queued request, oldest first.
    pub fn take(&self) -> Vec<FetchRequest> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Remove and return the oldest queued request.
    pub fn pop(&self) -> Option<FetchRequest> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Number of queued requests addressed to `endpoint`.
    pub fn count_for(&self, endpoint: &str) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|request| request.endpoint() == endpoint)
            .count()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&mut self, request: FetchRequest) {
        self.queue.borrow_mut().push_back(request);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
