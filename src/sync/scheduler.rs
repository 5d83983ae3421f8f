//! Debounce and throttle for deferred work: URL writes and fetches.
//!
//! A [`WriteScheduler`] holds at most one pending value. Scheduling a new
//! value replaces the pending one (trailing edge) and pushes its deadline to
//! `now + debounce`, but never earlier than `last_write + throttle`. Time is
//! passed in by the caller, which keeps the scheduler deterministic and lets
//! the event loop drive it from timer ticks.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    due: Instant,
}

/// Trailing-edge debounce with a minimum interval between writes.
#[derive(Debug, Clone)]
pub struct WriteScheduler<T> {
    debounce: Duration,
    throttle: Duration,
    pending: Option<Pending<T>>,
    last_write: Option<Instant>,
}

impl<T> WriteScheduler<T> {
    #[must_use]
    pub const fn new(debounce: Duration, throttle: Duration) -> Self {
        Self {
            debounce,
            throttle,
            pending: None,
            last_write: None,
        }
    }

    /// Schedules `value`, replacing any pending one.
    pub fn schedule(&mut self, value: T, now: Instant) {
        let mut due = now + self.debounce;
        if let Some(last) = self.last_write {
            due = due.max(last + self.throttle);
        }
        let coalesced = self.pending.is_some();
        let delay_ms = u64::try_from(due.saturating_duration_since(now).as_millis()).unwrap_or(u64::MAX);
        tracing::trace!(coalesced, delay_ms, "write scheduled");
        self.pending = Some(Pending { value, due });
    }

    /// Takes the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref()?.due > now {
            return None;
        }
        self.take(now)
    }

    /// Takes the pending value regardless of its deadline.
    pub fn take(&mut self, now: Instant) -> Option<T> {
        let pending = self.pending.take()?;
        self.last_write = Some(now);
        Some(pending.value)
    }

    /// Drops the pending value without writing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// The pending value, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    /// When the pending value becomes due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }
}
