// ============================================================================
// Splitting Strategy Interface
// Defines the contract for pluggable order splitting algorithms
// ============================================================================

use crate::domain::{ChildOrder, OrderBookSnapshot, Side, Symbol, SymbolRule, TargetSpec};

/// Strategy pattern interface for turning a parent target into child orders
pub trait SplittingStrategy: Send + Sync {
    /// Split a target across the book
    ///
    /// # Arguments
    /// * `symbol` - Instrument of the parent
    /// * `side` - Parent side
    /// * `target` - What the parent must achieve
    /// * `book` - Aggregated depth to distribute over
    /// * `rule` - Tick and scale policy
    ///
    /// # Returns
    /// Children in book order, each in PendingNew with a fresh client id.
    /// Empty when the book offers nothing usable.
    fn split(
        &self,
        symbol: &Symbol,
        side: Side,
        target: &TargetSpec,
        book: &OrderBookSnapshot,
        rule: &SymbolRule,
    ) -> Vec<ChildOrder>;

    /// Get the strategy name for logging
    fn name(&self) -> &str;
}
