// ============================================================================
// Order Domain Model
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

use super::report::ExecutionReport;
use super::symbol::Symbol;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Identity of a parent (flat) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParentOrderId(Uuid);

impl ParentOrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ParentOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParentOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-assigned identity of a child order. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClientOrderId(String);

impl ClientOrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

// ============================================================================
// Order Status State Machine
// ============================================================================

pub mod state {
    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum OrdStatus {
        PendingNew,
        New,
        PartiallyFilled,
        Filled,
        Canceled,
        Rejected,
        Expired,
        Replaced,
    }

    impl OrdStatus {
        pub fn is_terminal(&self) -> bool {
            matches!(
                self,
                OrdStatus::Filled | OrdStatus::Canceled | OrdStatus::Rejected | OrdStatus::Expired
            )
        }

        /// Still working at the venue and eligible for a cancel request.
        /// An amended (replaced) order keeps working.
        pub fn is_live(&self) -> bool {
            matches!(
                self,
                OrdStatus::PendingNew
                    | OrdStatus::New
                    | OrdStatus::PartiallyFilled
                    | OrdStatus::Replaced
            )
        }

        /// Acknowledged and resting, so a price amendment is allowed
        pub fn can_be_replaced(&self) -> bool {
            matches!(self, OrdStatus::New | OrdStatus::PartiallyFilled)
        }

        /// Valid state transitions for the order state machine
        pub fn can_transition_to(&self, next: OrdStatus) -> bool {
            use OrdStatus::*;

            if *self == next {
                // Repeated status (e.g. successive partial fills)
                return !self.is_terminal() || next == Filled;
            }

            match (self, next) {
                (PendingNew, New) => true,
                (New, PartiallyFilled) | (New, Filled) => true,
                (PartiallyFilled, Filled) => true,

                (PendingNew | New | PartiallyFilled, Canceled | Rejected | Expired) => true,
                (New | PartiallyFilled, Replaced) => true,

                (Replaced, PartiallyFilled | Filled | Canceled | Expired) => true,

                _ => false,
            }
        }
    }
}

use state::OrdStatus;

// ============================================================================
// Child Order Entity
// ============================================================================

/// Identity of one fill, used to drop duplicated fill reports
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FillKey {
    ExecId(String),
    Fingerprint {
        venue_order_id: Option<String>,
        timestamp: DateTime<Utc>,
        qty: Decimal,
        px: Decimal,
    },
}

impl FillKey {
    pub fn of(report: &ExecutionReport) -> Self {
        match &report.exec_id {
            Some(exec_id) => FillKey::ExecId(exec_id.clone()),
            None => FillKey::Fingerprint {
                venue_order_id: report.venue_order_id.clone(),
                timestamp: report.timestamp,
                qty: report.last_qty,
                px: report.last_px,
            },
        }
    }
}

/// A venue-routed slice of a parent order. Owned by exactly one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChildOrder {
    pub client_order_id: ClientOrderId,
    pub symbol: Symbol,
    pub side: Side,
    /// Tick-aligned limit price (quote per base)
    pub price: Decimal,
    /// Requested quantity in base units
    pub qty_base: Decimal,
    pub provider_id: String,

    pub status: OrdStatus,
    pub cum_base: Decimal,
    pub venue_order_id: Option<String>,
    pub submit_ts: Option<DateTime<Utc>>,

    seen_fills: Vec<FillKey>,
}

impl ChildOrder {
    pub fn new(
        client_order_id: ClientOrderId,
        symbol: Symbol,
        side: Side,
        price: Decimal,
        qty_base: Decimal,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            client_order_id,
            symbol,
            side,
            price,
            qty_base,
            provider_id: provider_id.into(),
            status: OrdStatus::PendingNew,
            cum_base: Decimal::ZERO,
            venue_order_id: None,
            submit_ts: None,
            seen_fills: Vec::new(),
        }
    }

    pub fn remaining_qty(&self) -> Decimal {
        (self.qty_base - self.cum_base).max(Decimal::ZERO)
    }

    pub fn notional(&self) -> Decimal {
        self.qty_base.checked_mul(self.price).unwrap_or(Decimal::ZERO)
    }

    pub(crate) fn has_seen(&self, key: &FillKey) -> bool {
        self.seen_fills.contains(key)
    }

    /// Remember a fill. Returns false if it was already applied.
    pub(crate) fn record_fill(&mut self, key: FillKey) -> bool {
        if self.seen_fills.contains(&key) {
            return false;
        }
        self.seen_fills.push(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn child() -> ChildOrder {
        ChildOrder::new(
            ClientOrderId::new("C-1"),
            Symbol::new("EUR", "USD"),
            Side::Buy,
            dec!(1.1),
            dec!(2),
            "LP1",
        )
    }

    #[test]
    fn test_child_creation() {
        let child = child();
        assert_eq!(child.status, OrdStatus::PendingNew);
        assert_eq!(child.cum_base, Decimal::ZERO);
        assert_eq!(child.remaining_qty(), dec!(2));
        assert_eq!(child.notional(), dec!(2.2));
        assert!(child.venue_order_id.is_none());
    }

    #[test]
    fn test_terminal_and_live_sets() {
        use OrdStatus::*;

        for status in [Filled, Canceled, Rejected, Expired] {
            assert!(status.is_terminal());
            assert!(!status.is_live());
        }
        for status in [PendingNew, New, PartiallyFilled] {
            assert!(!status.is_terminal());
            assert!(status.is_live());
        }
        assert!(!Replaced.is_terminal());
    }

    #[test]
    fn test_transitions() {
        use OrdStatus::*;

        assert!(PendingNew.can_transition_to(New));
        assert!(New.can_transition_to(PartiallyFilled));
        assert!(PartiallyFilled.can_transition_to(PartiallyFilled));
        assert!(PartiallyFilled.can_transition_to(Filled));
        assert!(PendingNew.can_transition_to(Canceled));
        assert!(PartiallyFilled.can_transition_to(Expired));
        assert!(New.can_transition_to(Replaced));

        assert!(!PendingNew.can_transition_to(Replaced));
        assert!(!Filled.can_transition_to(New));
        assert!(!Canceled.can_transition_to(Canceled));
        assert!(!Rejected.can_transition_to(Filled));
    }

    #[test]
    fn test_fill_dedup() {
        let mut child = child();
        let report = ExecutionReport::fill(
            child.client_order_id.clone(),
            Some("V-1".into()),
            OrdStatus::PartiallyFilled,
            dec!(1),
            dec!(1.1),
        );

        assert!(child.record_fill(FillKey::of(&report)));
        assert!(!child.record_fill(FillKey::of(&report)));

        let other = report.clone().with_exec_id("E-2");
        assert!(child.record_fill(FillKey::of(&other)));
    }
}
