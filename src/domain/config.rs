// ============================================================================
// Coordinator Configuration
// Timer budgets for the execution lifecycle
// ============================================================================

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timer configuration for the execution coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoordinatorConfig {
    /// How long a venue may take to acknowledge a child before it is canceled
    pub ack_timeout: Duration,

    /// How long a parent may work before it is force-completed.
    /// A target's `ttl` can shorten this, never extend it.
    pub parent_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(1500),
            parent_timeout: Duration::from_secs(5),
        }
    }
}

impl CoordinatorConfig {
    pub fn new(ack_timeout: Duration, parent_timeout: Duration) -> Self {
        Self {
            ack_timeout,
            parent_timeout,
        }
    }

    /// Builder method: Set acknowledgement timeout
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Builder method: Set parent timeout
    pub fn with_parent_timeout(mut self, timeout: Duration) -> Self {
        self.parent_timeout = timeout;
        self
    }

    /// Parent timer delay for a target with the given time-to-live
    pub fn parent_deadline(&self, ttl: Duration) -> Duration {
        if ttl.is_zero() {
            self.parent_timeout
        } else {
            ttl.min(self.parent_timeout)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.ack_timeout.is_zero() {
            return Err("Ack timeout must be positive".to_string());
        }

        if self.parent_timeout.is_zero() {
            return Err("Parent timeout must be positive".to_string());
        }

        if self.ack_timeout >= self.parent_timeout {
            return Err(format!(
                "Ack timeout ({:?}) must be shorter than parent timeout ({:?})",
                self.ack_timeout, self.parent_timeout
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Preset Configurations
// ============================================================================

impl CoordinatorConfig {
    /// Co-located venues with fast acknowledgement
    /// - Ack timeout: 250ms
    /// - Parent timeout: 2s
    pub fn low_latency() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_secs(2))
    }

    /// Slow or remote liquidity providers
    /// - Ack timeout: 5s
    /// - Parent timeout: 60s
    pub fn patient() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(60))
    }
}
