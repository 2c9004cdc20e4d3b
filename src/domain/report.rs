// ============================================================================
// Execution Report
// What a venue tells us about one child order
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::order::state::OrdStatus;
use super::order::ClientOrderId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExecutionReport {
    pub client_order_id: ClientOrderId,
    pub venue_order_id: Option<String>,
    pub status: OrdStatus,
    /// Incremental filled base quantity of this report (zero if none)
    pub last_qty: Decimal,
    /// Fill price, or the new limit price on a replace acknowledgement
    pub last_px: Decimal,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    /// Venue execution id, used to de-duplicate fills when present
    pub exec_id: Option<String>,
}

impl ExecutionReport {
    /// Status-only report with no fill
    pub fn status(
        client_order_id: ClientOrderId,
        venue_order_id: Option<String>,
        status: OrdStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            client_order_id,
            venue_order_id,
            status,
            last_qty: Decimal::ZERO,
            last_px: Decimal::ZERO,
            timestamp: Utc::now(),
            reason: reason.into(),
            exec_id: None,
        }
    }

    pub fn fill(
        client_order_id: ClientOrderId,
        venue_order_id: Option<String>,
        status: OrdStatus,
        last_qty: Decimal,
        last_px: Decimal,
    ) -> Self {
        Self {
            client_order_id,
            venue_order_id,
            status,
            last_qty,
            last_px,
            timestamp: Utc::now(),
            reason: String::new(),
            exec_id: None,
        }
    }

    /// Builder method: Set the venue execution id
    pub fn with_exec_id(mut self, exec_id: impl Into<String>) -> Self {
        self.exec_id = Some(exec_id.into());
        self
    }

    /// Builder method: Set the price carried by the report
    pub fn with_price(mut self, last_px: Decimal) -> Self {
        self.last_px = last_px;
        self
    }

    pub fn has_fill(&self) -> bool {
        self.last_qty > Decimal::ZERO
    }

    /// Notional of the incremental fill
    pub fn fill_notional(&self) -> Decimal {
        if !self.has_fill() {
            return Decimal::ZERO;
        }
        self.last_qty
            .checked_mul(self.last_px)
            .unwrap_or(Decimal::ZERO)
    }

    /// Reject negative quantities, and non-positive prices on fills.
    pub fn validate(&self) -> Result<(), String> {
        if self.last_qty < Decimal::ZERO {
            return Err(format!("Negative fill quantity {}", self.last_qty));
        }

        if self.has_fill() && self.last_px <= Decimal::ZERO {
            return Err(format!(
                "Fill of {} carries non-positive price {}",
                self.last_qty, self.last_px
            ));
        }

        if self.has_fill() && self.last_qty.checked_mul(self.last_px).is_none() {
            return Err("Fill notional overflows".to_string());
        }

        Ok(())
    }
}
