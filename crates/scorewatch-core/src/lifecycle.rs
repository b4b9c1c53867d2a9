//! Stop signal for one polling session.
//!
//! [`SessionControl`] is shared (via [`Arc`](std::sync::Arc)) between the
//! poll loop and whatever decides the run is over: a signal handler, an
//! operator command, or a test. The poll loop only observes the signal at
//! tick boundaries, so a cycle already in flight always runs to completion.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Reason why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEndReason {
    /// An operator asked the session to stop.
    OperatorStop,
    /// The process received a termination signal.
    Signal,
}

/// Shared stop signal and run metadata.
#[derive(Debug)]
pub struct SessionControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the poll loop while it waits for the next tick.
    stop_notify: Notify,

    /// Reason recorded by the first stop request.
    end_reason: Mutex<Option<SessionEndReason>>,

    /// Wall-clock time when the session started.
    started_at: DateTime<Utc>,
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionControl {
    /// Create a control handle for a session starting now.
    pub fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            end_reason: Mutex::new(None),
            started_at: Utc::now(),
        }
    }

    /// Request that the session stop at the next tick boundary.
    ///
    /// Only the first request records its reason; later ones are no-ops.
    pub fn request_stop(&self, reason: SessionEndReason) {
        if self
            .stop_requested
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        if let Ok(mut guard) = self.end_reason.lock() {
            *guard = Some(reason);
        }
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop has been requested.
    ///
    /// Returns immediately if one already has.
    pub async fn stopped(&self) {
        loop {
            // Register before checking the flag so a request landing in
            // between still wakes us.
            let notified = self.stop_notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    /// The reason recorded by the first stop request, if any.
    pub fn end_reason(&self) -> Option<SessionEndReason> {
        self.end_reason.lock().ok().and_then(|guard| *guard)
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since session start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}
