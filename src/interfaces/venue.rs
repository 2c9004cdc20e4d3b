// ============================================================================
// Venue Interface
// Outbound order routing and the inbound report path
// ============================================================================

use crate::domain::{ChildOrder, ExecutionReport};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Callback a venue invokes for every execution report of a child.
///
/// May be called synchronously from inside `submit`, `cancel` or `replace`,
/// or later from any thread.
pub type ReportCallback = Arc<dyn Fn(ExecutionReport) + Send + Sync>;

/// Order management gateway towards liquidity providers
pub trait VenuePort: Send + Sync {
    /// Route a new child order. Reports for it flow through `on_report`.
    fn submit(&self, child: &ChildOrder, on_report: ReportCallback);

    /// Request cancellation of a working child
    fn cancel(&self, child: &ChildOrder, on_report: ReportCallback);

    /// Request a new limit price for a working child
    fn replace(&self, child: &ChildOrder, new_price: Decimal, on_report: ReportCallback);

    /// Get the venue name for logging
    fn name(&self) -> &str {
        "venue"
    }
}
