//! Single-use completion handles.
//!
//! An [`Invoker`] binds one pending operation to the callback that should
//! hear about it. It moves from [`InvocationState::Pending`] to exactly one
//! terminal state; later completions are ignored until it is
//! [`reset`](Invoker::reset).

use tracing::{trace, warn};

use crate::core::{BatchController, Callback, Completion};
use crate::error::{StorageError, StorageResult};

/// Lifecycle of an [`Invoker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    /// Not yet completed.
    Pending,
    /// Completed with a value.
    Succeeded,
    /// Completed with an error.
    Failed,
}

/// Delivers one outcome to a target callback and, optionally, a source.
///
/// The source is notified after the target with the same outcome. When a
/// [`BatchController`] is attached, successes advance it and failures mark it
/// failed; a batch that has already failed swallows further failures so that
/// callers see at most one failure per batch.
pub struct Invoker<'a, R> {
    target: &'a mut dyn Callback<R>,
    source: Option<&'a mut dyn Callback<R>>,
    batch: Option<&'a mut BatchController>,
    message: String,
    state: InvocationState,
}

impl<'a, R: Clone> Invoker<'a, R> {
    /// Creates a pending invoker.
    pub fn new(target: &'a mut dyn Callback<R>, message: impl Into<String>) -> Self {
        Self {
            target,
            source: None,
            batch: None,
            message: message.into(),
            state: InvocationState::Pending,
        }
    }

    /// Also notifies `source` after the target.
    pub fn with_source(mut self, source: &'a mut dyn Callback<R>) -> Self {
        self.source = Some(source);
        self
    }

    /// Attaches batch progress tracking.
    pub fn with_batch(mut self, batch: &'a mut BatchController) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Current state.
    pub fn state(&self) -> InvocationState {
        self.state
    }

    /// The success message handed to callbacks.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Reconfigures the invoker for another completion.
    pub fn reset(
        &mut self,
        target: &'a mut dyn Callback<R>,
        source: Option<&'a mut dyn Callback<R>>,
        message: impl Into<String>,
    ) {
        self.target = target;
        self.source = source;
        self.message = message.into();
        self.state = InvocationState::Pending;
    }

    /// Completes with a value.
    pub fn success(&mut self, value: R) {
        if !self.begin(InvocationState::Succeeded) {
            return;
        }
        if let Some(batch) = self.batch.as_deref_mut() {
            batch.increment();
        }

        let completion = Completion::new(&self.message, self.batch.as_deref());
        trace!(message = %self.message, "invocation succeeded");
        match self.source.as_deref_mut() {
            Some(source) => {
                self.target.on_success(value.clone(), &completion);
                source.on_success(value, &completion);
            }
            None => self.target.on_success(value, &completion),
        }
    }

    /// Completes with an error.
    pub fn failure(&mut self, error: StorageError) {
        if !self.begin(InvocationState::Failed) {
            return;
        }
        if let Some(batch) = self.batch.as_deref_mut() {
            if !batch.mark_failed() {
                warn!(
                    batch_id = ?batch.id(),
                    error = %error,
                    "batch already failed; dropping failure notification"
                );
                return;
            }
        }

        let completion = Completion::new("", self.batch.as_deref());
        trace!(error = %error, "invocation failed");
        match self.source.as_deref_mut() {
            Some(source) => {
                self.target.on_failure(error.clone(), &completion);
                source.on_failure(error, &completion);
            }
            None => self.target.on_failure(error, &completion),
        }
    }

    /// Completes with whichever side of `result` is present.
    pub fn complete(&mut self, result: StorageResult<R>) {
        match result {
            Ok(value) => self.success(value),
            Err(error) => self.failure(error),
        }
    }

    fn begin(&mut self, next: InvocationState) -> bool {
        if self.state != InvocationState::Pending {
            warn!(
                state = ?self.state,
                attempted = ?next,
                "invoker already completed; ignoring"
            );
            return false;
        }
        self.state = next;
        true
    }
}
