//! Toast notifications.
//!
//! A [`ToastStore`] is created once by the embedding application and torn
//! down with [`ToastStore::shutdown`]. Listeners registered through
//! [`ToastStore::subscribe`] receive the full toast list after every change.
//!
//! Dismissing a toast only marks it closed. It stays in the list (so an exit
//! animation can run) until [`ToastStore::tick`] passes its removal deadline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_TOAST_LIMIT: usize = 1;
pub const DEFAULT_REMOVE_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

/// Content of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToastOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub variant: ToastVariant,
}

impl ToastOptions {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn destructive(mut self) -> Self {
        self.variant = ToastVariant::Destructive;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub options: ToastOptions,
    pub open: bool,
    remove_at: Option<Instant>,
}

/// Handle returned by [`ToastStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&[Toast])>;

pub struct ToastStore {
    toasts: Vec<Toast>,
    limit: usize,
    remove_delay: Duration,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for ToastStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastStore")
            .field("toasts", &self.toasts)
            .field("limit", &self.limit)
            .field("remove_delay", &self.remove_delay)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for ToastStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_LIMIT, DEFAULT_REMOVE_DELAY)
    }
}

impl ToastStore {
    /// Creates a store that keeps at most `limit` toasts (at least one).
    #[must_use]
    pub fn new(limit: usize, remove_delay: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            limit: limit.max(1),
            remove_delay,
            next_id: 1,
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Drops every toast and listener.
    pub fn shutdown(&mut self) {
        tracing::debug!(
            toasts = self.toasts.len(),
            listeners = self.listeners.len(),
            "toast store shut down"
        );
        self.toasts.clear();
        self.listeners.clear();
    }

    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&[Toast]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.toasts);
        }
    }

    /// Shows a toast, newest first. Returns its id.
    pub fn toast(&mut self, options: ToastOptions) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        tracing::debug!(id = %id, variant = ?options.variant, "toast added");
        self.toasts.insert(
            0,
            Toast {
                id: id.clone(),
                options,
                open: true,
                remove_at: None,
            },
        );
        self.toasts.truncate(self.limit);
        self.notify();
        id
    }

    /// Replaces the content of toast `id`.
    pub fn update(&mut self, id: &str, options: ToastOptions) -> bool {
        let Some(toast) = self.toasts.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        toast.options = options;
        self.notify();
        true
    }

    /// Closes toast `id`, or every toast with `None`, and schedules removal.
    pub fn dismiss(&mut self, id: Option<&str>, now: Instant) {
        let remove_at = now + self.remove_delay;
        for toast in &mut self.toasts {
            if id.map_or(true, |id| toast.id == id) && toast.open {
                toast.open = false;
                toast.remove_at = Some(remove_at);
            }
        }
        self.notify();
    }

    /// Removes toast `id` immediately, or every toast with `None`.
    pub fn remove(&mut self, id: Option<&str>) {
        match id {
            Some(id) => self.toasts.retain(|t| t.id != id),
            None => self.toasts.clear(),
        }
        self.notify();
    }

    /// Removes closed toasts whose delay has passed. Returns how many went.
    pub fn tick(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        self.toasts
            .retain(|t| t.remove_at.map_or(true, |deadline| deadline > now));
        let removed = before - self.toasts.len();
        if removed > 0 {
            self.notify();
        }
        removed
    }
}
