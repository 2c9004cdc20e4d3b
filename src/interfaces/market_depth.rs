// ============================================================================
// Market Depth Interface
// Read-only access to aggregated books and instrument rules
// ============================================================================

use crate::domain::{OrderBookSnapshot, Symbol, SymbolRule};

/// Source of aggregated liquidity and precision rules per symbol
pub trait MarketDepthProvider: Send + Sync {
    /// Latest aggregated book, or None if the symbol has no market data
    fn latest(&self, symbol: &Symbol) -> Option<OrderBookSnapshot>;

    /// Precision rule, or None if the symbol is not configured
    fn rule_of(&self, symbol: &Symbol) -> Option<SymbolRule>;
}
