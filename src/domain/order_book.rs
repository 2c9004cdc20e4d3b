// ============================================================================
// Order Book Snapshot
// Point-in-time multi-provider depth, as read once at parent start
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::symbol::PriceReference;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Depth and Price Level
// ============================================================================

/// Quantity one liquidity provider advertises at a price level.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProviderDepth {
    pub provider_id: String,
    /// Available quantity in base units
    pub base_qty: Decimal,
}

impl ProviderDepth {
    pub fn new(provider_id: impl Into<String>, base_qty: Decimal) -> Self {
        Self {
            provider_id: provider_id.into(),
            base_qty,
        }
    }
}

/// A price level with its providers in listed (priority) order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PriceLevel {
    /// Price in quote per base
    pub price: Decimal,
    pub providers: Vec<ProviderDepth>,
}

impl PriceLevel {
    pub fn new(price: Decimal, providers: Vec<ProviderDepth>) -> Self {
        Self { price, providers }
    }

    /// Level with a single provider.
    pub fn single(price: Decimal, provider_id: impl Into<String>, base_qty: Decimal) -> Self {
        Self::new(price, vec![ProviderDepth::new(provider_id, base_qty)])
    }

    pub fn total_quantity(&self) -> Decimal {
        self.providers
            .iter()
            .map(|p| p.base_qty.max(Decimal::ZERO))
            .sum()
    }
}

// ============================================================================
// Order Book Snapshot
// ============================================================================

/// Immutable snapshot of aggregated depth
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderBookSnapshot {
    /// Ask levels, best (lowest) first
    pub asks: Vec<PriceLevel>,
    /// Bid levels, best (highest) first
    pub bids: Vec<PriceLevel>,
    pub timestamp: DateTime<Utc>,
}

impl OrderBookSnapshot {
    pub fn empty() -> Self {
        Self {
            asks: Vec::new(),
            bids: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_depth(asks: Vec<PriceLevel>, bids: Vec<PriceLevel>) -> Self {
        Self {
            asks,
            bids,
            timestamp: Utc::now(),
        }
    }

    /// Levels of one side, best first
    pub fn side(&self, reference: PriceReference) -> &[PriceLevel] {
        match reference {
            PriceReference::Bid => &self.bids,
            PriceReference::Ask => &self.asks,
        }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|level| level.price)
    }

    /// Current spread (ask - bid)
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    pub fn total_bid_quantity(&self) -> Decimal {
        self.bids.iter().map(PriceLevel::total_quantity).sum()
    }

    pub fn total_ask_quantity(&self) -> Decimal {
        self.asks.iter().map(PriceLevel::total_quantity).sum()
    }

    /// Asks strictly ascending and bids strictly descending.
    pub fn is_well_ordered(&self) -> bool {
        self.asks.windows(2).all(|w| w[0].price < w[1].price)
            && self.bids.windows(2).all(|w| w[0].price > w[1].price)
    }
}

impl Default for OrderBookSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
