//! Progress tracking for simulated batches.
//!
//! When a store cannot execute a collection natively, the orchestrator
//! iterates it one element at a time. A [`BatchController`] records how far
//! that iteration got and whether it failed, and is visible to callbacks
//! through [`Completion::batch`](crate::core::Completion::batch).

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct BatchState {
    id: Uuid,
    total_items: usize,
    processed_count: usize,
    started_at: DateTime<Utc>,
    started: Instant,
    failed: bool,
}

/// Tracks one simulated batch.
///
/// A controller is idle until [`init_batch`](Self::init_batch) is called with
/// more than one item. Single-element and empty collections never activate
/// it, so callbacks see `Completion::batch() == None` for them.
#[derive(Debug, Clone, Default)]
pub struct BatchController {
    state: Option<BatchState>,
}

impl BatchController {
    /// Creates an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a batch of `size` items.
    ///
    /// Allocates a fresh id and resets the counters when `size > 1`;
    /// otherwise clears any previous state.
    pub fn init_batch(&mut self, size: usize) {
        if size > 1 {
            self.state = Some(BatchState {
                id: Uuid::new_v4(),
                total_items: size,
                processed_count: 0,
                started_at: Utc::now(),
                started: Instant::now(),
                failed: false,
            });
        } else {
            self.state = None;
        }
    }

    /// Returns true while a batch is being tracked.
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Identifier of the current batch.
    pub fn id(&self) -> Option<Uuid> {
        self.state.as_ref().map(|s| s.id)
    }

    /// Total number of items in the batch; 0 when idle.
    pub fn size(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.total_items)
    }

    /// Number of items that completed successfully.
    pub fn count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.processed_count)
    }

    /// Fraction of items processed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        match &self.state {
            Some(s) if s.total_items > 0 => s.processed_count as f64 / s.total_items as f64,
            _ => 0.0,
        }
    }

    /// Time elapsed since the batch started.
    pub fn duration(&self) -> Duration {
        self.state
            .as_ref()
            .map_or(Duration::ZERO, |s| s.started.elapsed())
    }

    /// Wall-clock start of the batch.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.state.as_ref().map(|s| s.started_at)
    }

    /// Returns true once any item has failed.
    pub fn is_failed(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.failed)
    }

    /// Returns true when every item completed successfully.
    pub fn is_complete(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| !s.failed && s.processed_count == s.total_items)
    }

    pub(crate) fn increment(&mut self) {
        if let Some(state) = &mut self.state {
            if !state.failed {
                state.processed_count += 1;
            }
        }
    }

    /// Marks the batch failed. Returns false if it had already failed.
    pub(crate) fn mark_failed(&mut self) -> bool {
        match &mut self.state {
            Some(state) if state.failed => false,
            Some(state) => {
                state.failed = true;
                true
            }
            None => true,
        }
    }
}
