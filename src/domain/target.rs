// ============================================================================
// Flat Targets
// What a flat order must achieve, and the signal that triggered it
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;

use super::order::Side;
use super::symbol::Symbol;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TargetType {
    /// Target expressed in base units
    BaseQty,
    /// Target expressed as quote notional (price × quantity)
    QuoteNotional,
}

/// How the splitter positions a notional target in the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutionIntent {
    /// Rest on the passive side
    Maker,
    /// Cross the spread
    Taker,
    /// Treated as Maker
    Auto,
}

impl ExecutionIntent {
    pub fn crosses_spread(&self) -> bool {
        matches!(self, ExecutionIntent::Taker)
    }
}

/// Target of one parent order. Fixed at start.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetSpec {
    pub target_type: TargetType,
    pub target_value: Decimal,
    pub intent: ExecutionIntent,
    /// Parent time-to-live. Zero defers to the coordinator's parent timeout.
    pub ttl: Duration,
    /// Carried for downstream pricing; the splitter does not consume it.
    pub slippage_buffer: Decimal,
}

impl TargetSpec {
    pub fn new(target_type: TargetType, target_value: Decimal, intent: ExecutionIntent) -> Self {
        Self {
            target_type,
            target_value,
            intent,
            ttl: Duration::ZERO,
            slippage_buffer: Decimal::ZERO,
        }
    }

    pub fn base_qty(target_value: Decimal) -> Self {
        Self::new(TargetType::BaseQty, target_value, ExecutionIntent::Taker)
    }

    pub fn quote_notional(target_value: Decimal, intent: ExecutionIntent) -> Self {
        Self::new(TargetType::QuoteNotional, target_value, intent)
    }

    /// Builder method: Set time-to-live
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builder method: Set execution intent
    pub fn with_intent(mut self, intent: ExecutionIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Builder method: Set slippage buffer
    pub fn with_slippage_buffer(mut self, buffer: Decimal) -> Self {
        self.slippage_buffer = buffer;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.target_value <= Decimal::ZERO {
            return Err(format!(
                "Target value must be positive, got {}",
                self.target_value
            ));
        }

        if self.slippage_buffer < Decimal::ZERO {
            return Err("Slippage buffer cannot be negative".to_string());
        }

        Ok(())
    }
}

/// Flat trigger raised by risk or position keeping
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlatSignal {
    pub symbol: Symbol,
    pub side: Side,
    pub suggested_target: Decimal,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl FlatSignal {
    pub fn new(
        symbol: Symbol,
        side: Side,
        suggested_target: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            symbol,
            side,
            suggested_target,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_pattern() {
        let spec = TargetSpec::quote_notional(dec!(1000000), ExecutionIntent::Maker)
            .with_ttl(Duration::from_secs(3))
            .with_slippage_buffer(dec!(0.0002));

        assert_eq!(spec.target_type, TargetType::QuoteNotional);
        assert_eq!(spec.ttl, Duration::from_secs(3));
        assert_eq!(spec.slippage_buffer, dec!(0.0002));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(TargetSpec::base_qty(Decimal::ZERO).validate().is_err());
        assert!(TargetSpec::base_qty(dec!(-1)).validate().is_err());
        assert!(TargetSpec::base_qty(dec!(1))
            .with_slippage_buffer(dec!(-0.1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_only_taker_crosses() {
        assert!(ExecutionIntent::Taker.crosses_spread());
        assert!(!ExecutionIntent::Maker.crosses_spread());
        assert!(!ExecutionIntent::Auto.crosses_spread());
    }
}
