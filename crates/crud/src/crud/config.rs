//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use crate::types::SortSpec;

/// Configuration for [`Crud`](crate::crud::Crud).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrudConfig {
    /// Iterate collections one element at a time even when the backend
    /// offers a native batch operation.
    #[serde(default)]
    pub force_simulated_batch: bool,

    /// Ordering applied to template-derived queries.
    #[serde(default)]
    pub default_order_by: Vec<SortSpec>,

    /// Pass precomputed success messages (e.g. `"saved Person"`) to callbacks.
    #[serde(default = "default_true")]
    pub success_messages: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            force_simulated_batch: false,
            default_order_by: Vec::new(),
            success_messages: default_true(),
        }
    }
}

impl CrudConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces simulated batching.
    pub fn with_force_simulated_batch(mut self, force: bool) -> Self {
        self.force_simulated_batch = force;
        self
    }

    /// Sets the ordering for template-derived queries.
    pub fn with_default_order_by(mut self, order_by: Vec<SortSpec>) -> Self {
        self.default_order_by = order_by;
        self
    }

    /// Enables or disables success messages.
    pub fn with_success_messages(mut self, enabled: bool) -> Self {
        self.success_messages = enabled;
        self
    }
}
