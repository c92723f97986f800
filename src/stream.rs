//! Plot streaming protocol
//!
//! Serializes every command of every object, in order, onto the serial
//! channel. Out-of-bounds geometry aborts the whole job at the offending
//! command; skipping it instead would desynchronize pen state on the
//! device. Pacing throttles transmission to the physical drawing speed, a
//! constraint of the medium rather than the link.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::channel::SerialChannel;
use crate::errors::StreamError;
use crate::log::{debug, warn};
use crate::object::PlotObject;

/// Observable protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
}

/// How a job that ran to a stop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every command was written
    Completed,
    /// A cancel request was honored at a command boundary
    Cancelled,
}

/// Speed-based pacing: the linear speed the device cuts or draws at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub speed_mm_s: f64,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

/// Cooperative cancellation shared between the UI flow and a running job.
///
/// Observed at command boundaries only, never mid-write; an in-progress
/// pacing sleep wakes early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.inner.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Timed suspension that ends early on cancellation.
    /// Returns true when the token was cancelled.
    fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = self
                .inner
                .signal
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

/// Drives one plot job at a time over a serial channel
#[derive(Debug, Default)]
pub struct Streamer {
    state: StreamState,
}

impl Default for StreamState {
    fn default() -> Self {
        StreamState::Idle
    }
}

impl Streamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Stream every command of `objects` to `channel`.
    ///
    /// Preconditions: the channel reports open and the object list is
    /// non-empty; otherwise the job is rejected with a diagnostic and no
    /// state change. The state is `Streaming` for the duration and returns
    /// to `Idle` however the job ends: completed, cancelled, aborted on an
    /// out-of-bounds command, or aborted on channel I/O failure.
    ///
    /// Already-written commands are never retracted: the device has acted
    /// on them.
    pub fn stream<'a, C: SerialChannel>(
        &mut self,
        objects: impl IntoIterator<Item = &'a PlotObject>,
        channel: &mut C,
        pacing: Option<Pacing>,
        cancel: &CancelToken,
    ) -> Result<StreamOutcome, StreamError> {
        if !channel.is_open() {
            return Err(StreamError::ChannelUnavailable);
        }
        let objects: Vec<&PlotObject> = objects.into_iter().collect();
        if objects.is_empty() {
            return Err(StreamError::NothingToPlot);
        }

        debug!("streaming {} object(s)", objects.len());
        self.state = StreamState::Streaming;
        let result = run_job(&objects, channel, pacing, cancel);
        self.state = StreamState::Idle;
        result
    }
}

fn run_job<C: SerialChannel>(
    objects: &[&PlotObject],
    channel: &mut C,
    pacing: Option<Pacing>,
    cancel: &CancelToken,
) -> Result<StreamOutcome, StreamError> {
    for (object_index, object) in objects.iter().enumerate() {
        for index in 0..object.command_count() {
            if cancel.is_cancelled() {
                return Ok(StreamOutcome::Cancelled);
            }

            let text = object
                .serialize_command(index)
                .map_err(|source| StreamError::OutOfBounds {
                    object: object_index,
                    source,
                })?;
            channel.write(text.as_bytes())?;

            if let Some(pacing) = pacing {
                channel.flush()?;
                let seconds = object.command_mm(index) / pacing.speed_mm_s;
                if seconds <= 0.0 {
                    continue;
                }
                match Duration::try_from_secs_f64(seconds) {
                    Ok(wait) => {
                        if cancel.sleep(wait) {
                            return Ok(StreamOutcome::Cancelled);
                        }
                    }
                    Err(_) => warn!("unrepresentable pacing wait of {seconds}s, skipping"),
                }
            }
        }
    }
    Ok(StreamOutcome::Completed)
}
