//! The entropy governor: a decaying budget that throttles admission
//! rate by composition complexity.
//!
//! Decay is call-based, not time-based: the budget compounds one decay
//! step per consumption, matching the admission-driven throttling model.
//! `decay_rate` is the single knob to revisit if real deployments need
//! wall-clock regeneration instead.

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// Configuration for the entropy budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Starting budget.
    pub initial_budget: f64,
    /// Cost per unit of complexity.
    pub unit_cost: f64,
    /// Cap on the cost of any single operation.
    pub max_per_operation: f64,
    /// Fraction of the budget lost per consumption, in `[0, 1)`.
    pub decay_rate: f64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            initial_budget: 1000.0,
            unit_cost: 1.0,
            max_per_operation: 100.0,
            decay_rate: 0.01,
        }
    }
}

/// Owns the budget scalar. Mutates only on admitted writes; callers
/// check [`EntropyGovernor::can_admit`] immediately before
/// [`EntropyGovernor::consume`] within the same admission attempt.
#[derive(Debug, Clone)]
pub struct EntropyGovernor {
    budget: f64,
    config: GovernorConfig,
}

impl EntropyGovernor {
    /// Create a governor with a full budget.
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            budget: config.initial_budget,
            config,
        }
    }

    /// The remaining budget. Never negative.
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// The configuration in use.
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Cost of admitting a glyph of the given complexity:
    /// `min(complexity x unit_cost, max_per_operation)`.
    pub fn cost(&self, complexity: u32) -> f64 {
        (complexity as f64 * self.config.unit_cost).min(self.config.max_per_operation)
    }

    /// Whether the budget covers the cost.
    pub fn can_admit(&self, complexity: u32) -> bool {
        self.budget >= self.cost(complexity)
    }

    /// Consume the cost and apply one decay step. Returns the new
    /// budget. Fails with `InsufficientBudget` without mutating when the
    /// guard does not hold.
    pub fn consume(&mut self, complexity: u32) -> Result<f64, KernelError> {
        let cost = self.cost(complexity);
        if self.budget < cost {
            return Err(KernelError::InsufficientBudget {
                cost,
                remaining: self.budget,
            });
        }
        self.budget = (self.budget - cost) * (1.0 - self.config.decay_rate);
        Ok(self.budget)
    }

    /// Overwrite the budget (import path). Clamped at zero.
    pub fn set_budget(&mut self, budget: f64) {
        self.budget = budget.max(0.0);
    }
}
