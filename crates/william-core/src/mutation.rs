// ── Mutation serialization ──
//
// Each view owns one `MutationGate`: a busy flag that rejects (never
// queues) overlapping actions, plus the view's action error. Destructive
// commands additionally pass through a `Confirmation`, which turns a
// proposal into a `Confirmed<C>` token only on explicit confirmation.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::store::lock;

/// Result of attempting a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome<T> {
    Completed(T),
    /// Another mutation was in flight; nothing happened.
    Busy,
    /// The action failed; the view's error now holds its message.
    Failed(CoreError),
}

impl<T> MutationOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationOutcome<U> {
        match self {
            Self::Completed(value) => MutationOutcome::Completed(f(value)),
            Self::Busy => MutationOutcome::Busy,
            Self::Failed(err) => MutationOutcome::Failed(err),
        }
    }

    /// Collapse into a `Result`, treating `Busy` as a validation error.
    pub fn into_result(self) -> Result<T, CoreError> {
        match self {
            Self::Completed(value) => Ok(value),
            Self::Busy => Err(CoreError::validation("Another change is still in progress.")),
            Self::Failed(err) => Err(err),
        }
    }
}

// ── Gate ─────────────────────────────────────────────────────────────

/// Busy flag and action error for one view.
#[derive(Debug)]
pub struct MutationGate {
    busy: AtomicBool,
    error: watch::Sender<Option<String>>,
}

impl Default for MutationGate {
    fn default() -> Self {
        Self::new()
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl MutationGate {
    pub fn new() -> Self {
        let (error, _) = watch::channel(None);
        Self {
            busy: AtomicBool::new(false),
            error,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// The current action error, if any.
    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub fn watch_error(&self) -> watch::Receiver<Option<String>> {
        self.error.subscribe()
    }

    pub fn clear_error(&self) {
        self.error.send_replace(None);
    }

    /// Surface `err` as the view's action error.
    pub fn report(&self, err: &CoreError) {
        self.error.send_replace(Some(err.display_message()));
    }

    /// Run `action` unless another mutation is in flight.
    ///
    /// The previous error is cleared first. The busy flag stays set until
    /// `action` (including any revalidation it awaits) has finished.
    pub async fn run<T, F, Fut>(&self, name: &str, action: F) -> MutationOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(action = name, "mutation rejected: busy");
            return MutationOutcome::Busy;
        }
        let _guard = BusyGuard(&self.busy);

        self.clear_error();
        match action().await {
            Ok(value) => {
                debug!(action = name, "mutation completed");
                MutationOutcome::Completed(value)
            }
            Err(err) => {
                warn!(action = name, error = %err, "mutation failed");
                self.report(&err);
                MutationOutcome::Failed(err)
            }
        }
    }
}

// ── Two-step confirmation ────────────────────────────────────────────

/// A pending destructive action awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    id: u64,
    /// Human-readable description to show in the confirmation prompt.
    pub prompt: String,
}

/// A command the user has explicitly confirmed.
///
/// Only obtainable from [`Confirmation::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed<C>(C);

impl<C> Confirmed<C> {
    pub fn command(&self) -> &C {
        &self.0
    }

    pub fn into_inner(self) -> C {
        self.0
    }
}

/// Holds at most one proposed command per view.
#[derive(Debug)]
pub struct Confirmation<C> {
    next_id: AtomicU64,
    pending: Mutex<Option<(u64, C)>>,
}

impl<C> Default for Confirmation<C> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(None),
        }
    }
}

impl<C> Confirmation<C> {
    /// Stage `command`, replacing any earlier proposal.
    pub fn propose(&self, command: C, prompt: impl Into<String>) -> Proposal {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        *lock(&self.pending) = Some((id, command));
        Proposal {
            id,
            prompt: prompt.into(),
        }
    }

    /// Confirm `proposal`. Returns `None` if it was cancelled or superseded.
    pub fn confirm(&self, proposal: &Proposal) -> Option<Confirmed<C>> {
        let mut pending = lock(&self.pending);
        match pending.take() {
            Some((id, command)) if id == proposal.id => Some(Confirmed(command)),
            other => {
                *pending = other;
                None
            }
        }
    }

    pub fn cancel(&self) {
        *lock(&self.pending) = None;
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }
}
