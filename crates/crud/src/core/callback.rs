//! Completion callbacks.
//!
//! Every callback-form operation reports its outcome through a [`Callback`].
//! Blocking operations are the same code path with a collecting adapter
//! ([`Capture`] or [`Gather`]) in the callback position.

use crate::core::BatchController;
use crate::error::{BackendError, StorageError, StorageResult};

/// Context passed to a callback along with the outcome.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    message: &'a str,
    batch: Option<&'a BatchController>,
}

impl<'a> Completion<'a> {
    /// Creates a completion context.
    pub fn new(message: &'a str, batch: Option<&'a BatchController>) -> Self {
        Self { message, batch }
    }

    /// The precomputed success message; empty if messages are disabled.
    pub fn message(&self) -> &'a str {
        self.message
    }

    /// Batch progress, when the outcome belongs to an active simulated batch.
    pub fn batch(&self) -> Option<&'a BatchController> {
        self.batch.filter(|b| b.is_active())
    }
}

/// Receives the outcome of an operation.
///
/// Exactly one of the two hooks is called per completion: once per operation,
/// or once per element for a simulated batch (until the first failure).
pub trait Callback<R> {
    /// Called with the result of a successful operation.
    fn on_success(&mut self, value: R, completion: &Completion<'_>);

    /// Called with the error of a failed operation.
    fn on_failure(&mut self, error: StorageError, completion: &Completion<'_>);
}

/// A callback built from two closures.
///
/// ```
/// use helios_crud::core::{Callback, Completion, Hooks};
///
/// let mut seen = Vec::new();
/// let mut hooks = Hooks::new(
///     |count: usize, _c: &Completion<'_>| seen.push(count),
///     |_e, _c: &Completion<'_>| {},
/// );
/// hooks.on_success(3, &Completion::new("", None));
/// drop(hooks);
/// assert_eq!(seen, vec![3]);
/// ```
pub struct Hooks<S, F> {
    on_success: S,
    on_failure: F,
}

impl<S, F> Hooks<S, F> {
    /// Creates a callback from a success closure and a failure closure.
    pub fn new<R>(on_success: S, on_failure: F) -> Self
    where
        S: FnMut(R, &Completion<'_>),
        F: FnMut(StorageError, &Completion<'_>),
    {
        Self {
            on_success,
            on_failure,
        }
    }
}

impl<R, S, F> Callback<R> for Hooks<S, F>
where
    S: FnMut(R, &Completion<'_>),
    F: FnMut(StorageError, &Completion<'_>),
{
    fn on_success(&mut self, value: R, completion: &Completion<'_>) {
        (self.on_success)(value, completion)
    }

    fn on_failure(&mut self, error: StorageError, completion: &Completion<'_>) {
        (self.on_failure)(error, completion)
    }
}

/// Keeps the last success value and the first error.
#[derive(Debug)]
pub struct Capture<R> {
    value: Option<R>,
    error: Option<StorageError>,
}

impl<R> Default for Capture<R> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
        }
    }
}

impl<R> Capture<R> {
    /// Creates an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no outcome has been delivered.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.error.is_none()
    }

    /// The first error if any, otherwise the last value.
    pub fn into_result(self, operation: &str) -> StorageResult<R> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.value.ok_or_else(|| {
            BackendError::NoOutcome {
                operation: operation.to_string(),
            }
            .into()
        })
    }
}

impl<R> Callback<R> for Capture<R> {
    fn on_success(&mut self, value: R, _completion: &Completion<'_>) {
        if self.error.is_none() {
            self.value = Some(value);
        }
    }

    fn on_failure(&mut self, error: StorageError, _completion: &Completion<'_>) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// Values that can be merged across per-element notifications.
pub trait Accumulate {
    /// Merges `other` into `self`.
    fn accumulate(&mut self, other: Self);
}

impl<T> Accumulate for Vec<T> {
    fn accumulate(&mut self, other: Self) {
        self.extend(other);
    }
}

impl Accumulate for usize {
    fn accumulate(&mut self, other: Self) {
        *self += other;
    }
}

/// Merges every success value and keeps the first error.
///
/// Used by blocking batch operations, where a simulated batch produces one
/// notification per element.
#[derive(Debug, Default)]
pub struct Gather<R> {
    total: R,
    notified: bool,
    error: Option<StorageError>,
}

impl<R: Accumulate + Default> Gather<R> {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self {
            total: R::default(),
            notified: false,
            error: None,
        }
    }

    /// The value accumulated so far.
    pub fn total(&self) -> &R {
        &self.total
    }

    /// The first error if any, otherwise the merged value.
    pub fn into_result(self, operation: &str) -> StorageResult<R> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !self.notified {
            return Err(BackendError::NoOutcome {
                operation: operation.to_string(),
            }
            .into());
        }
        Ok(self.total)
    }
}

impl<R: Accumulate> Callback<R> for Gather<R> {
    fn on_success(&mut self, value: R, _completion: &Completion<'_>) {
        self.notified = true;
        self.total.accumulate(value);
    }

    fn on_failure(&mut self, error: StorageError, _completion: &Completion<'_>) {
        self.notified = true;
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// Forwards the length of a listed collection to a count callback.
pub struct Counting<'a> {
    inner: &'a mut dyn Callback<usize>,
}

impl<'a> Counting<'a> {
    /// Wraps a count callback.
    pub fn new(inner: &'a mut dyn Callback<usize>) -> Self {
        Self { inner }
    }
}

impl<T> Callback<Vec<T>> for Counting<'_> {
    fn on_success(&mut self, value: Vec<T>, completion: &Completion<'_>) {
        self.inner.on_success(value.len(), completion);
    }

    fn on_failure(&mut self, error: StorageError, completion: &Completion<'_>) {
        self.inner.on_failure(error, completion);
    }
}
