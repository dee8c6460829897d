//! Wall-clock driver for a [`Shell`].
//!
//! Maps real elapsed time onto the shell's virtual clock and multiplexes
//! timer deadlines with host inputs arriving on a channel. Worker threads
//! started by [`super::ThreadDispatcher`] post their completions to the same
//! channel.
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};

use super::Input;
use crate::dom::Dom;
use crate::shell::Shell;

/// Longest single wait, so predicates are re-checked regularly.
const MAX_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct EventLoop {
    inputs: Receiver<Input>,
}

impl EventLoop {
    pub fn new(inputs: Receiver<Input>) -> Self {
        Self { inputs }
    }

    /// Run `shell` until `done` holds or `limit` of real time passes.
    ///
    /// Returns whether the predicate was satisfied. Fails if the input
    /// channel closes while no timers are pending, since nothing could ever
    /// change the outcome.
    pub fn run_until<D: Dom>(
        &mut self,
        shell: &mut Shell<D>,
        mut done: impl FnMut(&Shell<D>) -> bool,
        limit: Duration,
    ) -> Result<bool> {
        let started = Instant::now();
        let base = shell.now();

        loop {
            let elapsed = started.elapsed();
            shell.advance_to(base + elapsed);
            if done(&*shell) {
                return Ok(true);
            }
            if elapsed >= limit {
                return Ok(false);
            }

            let mut wait = (limit - elapsed).min(MAX_WAIT);
            if let Some(deadline) = shell.next_deadline() {
                wait = wait.min(deadline.saturating_sub(shell.now()));
            }

            match self.inputs.recv_timeout(wait) {
                Ok(input) => {
                    shell.advance_to(base + started.elapsed());
                    shell.handle_input(input);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if shell.next_deadline().is_none() {
                        bail!("input channel closed with no pending work");
                    }
                    thread::sleep(wait);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
