// ============================================================================
// Symbol and Symbol Rule
// Instrument identity plus the tick/scale policy used for every rounding
// ============================================================================

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Symbol
// ============================================================================

/// Tradable pair. Prices are quoted in `quote` per unit of `base`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Symbol {
    pub base: String,
    pub quote: String,
}

impl Symbol {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Symbol {
    type Err = String;

    /// Parse `BASE/QUOTE`, e.g. `EUR/USD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                Ok(Self::new(base, quote))
            },
            _ => Err(format!("Invalid symbol '{}', expected BASE/QUOTE", s)),
        }
    }
}

// ============================================================================
// Price Reference
// ============================================================================

/// Which side of the book a price was taken from. Decides the tick rounding
/// direction: bid prices round down, ask prices round up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PriceReference {
    Bid,
    Ask,
}

// ============================================================================
// Symbol Rule
// ============================================================================

/// Per-instrument precision rules.
///
/// All quantity and price rounding in the crate goes through these helpers so
/// the engine never requests more base quantity than a book advertised and
/// never emits an off-tick price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SymbolRule {
    /// Minimum price increment
    pub tick_size: Decimal,
    /// Decimal places for prices (and realized VWAP)
    pub price_scale: u32,
    /// Decimal places for base quantities
    pub base_qty_scale: u32,
    /// Decimal places for quote notionals
    pub quote_notional_scale: u32,
}

impl SymbolRule {
    pub fn new(
        tick_size: Decimal,
        price_scale: u32,
        base_qty_scale: u32,
        quote_notional_scale: u32,
    ) -> Self {
        Self {
            tick_size,
            price_scale,
            base_qty_scale,
            quote_notional_scale,
        }
    }

    /// Conventional FX major rule: 5 decimal prices, pip-fraction tick.
    pub fn fx_major() -> Self {
        Self::new(Decimal::new(1, 5), 5, 2, 2)
    }

    /// Validate the rule
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_size <= Decimal::ZERO {
            return Err("Tick size must be positive".to_string());
        }

        for (name, scale) in [
            ("price", self.price_scale),
            ("base quantity", self.base_qty_scale),
            ("quote notional", self.quote_notional_scale),
        ] {
            if scale > Decimal::MAX_SCALE {
                return Err(format!(
                    "{} scale {} exceeds maximum {}",
                    name,
                    scale,
                    Decimal::MAX_SCALE
                ));
            }
        }

        Ok(())
    }

    // ========================================================================
    // Rounding Policy
    // ========================================================================

    /// Snap a raw level price onto the tick grid.
    ///
    /// Bid-referenced prices are floored to the tick, ask-referenced prices
    /// are ceiled, then the result is rendered at `price_scale` half-up.
    pub fn align_price(&self, price: Decimal, reference: PriceReference) -> Decimal {
        let ticks = match price.checked_div(self.tick_size) {
            Some(ticks) => ticks,
            None => return at_scale(Decimal::ZERO, self.price_scale),
        };

        let whole_ticks = match reference {
            PriceReference::Bid => ticks.floor(),
            PriceReference::Ask => ticks.ceil(),
        };

        let aligned = whole_ticks
            .checked_mul(self.tick_size)
            .unwrap_or(price)
            .round_dp_with_strategy(self.price_scale, RoundingStrategy::MidpointAwayFromZero);

        at_scale(aligned, self.price_scale)
    }

    /// Truncate a base quantity toward zero at `base_qty_scale`.
    pub fn truncate_base(&self, qty: Decimal) -> Decimal {
        let truncated = qty.round_dp_with_strategy(self.base_qty_scale, RoundingStrategy::ToZero);
        at_scale(truncated, self.base_qty_scale)
    }

    /// Convert a quote notional into base at `price`, half-up at
    /// `base_qty_scale`. A zero price yields zero.
    pub fn base_from_quote(&self, quote: Decimal, price: Decimal) -> Decimal {
        if price.is_zero() {
            return at_scale(Decimal::ZERO, self.base_qty_scale);
        }

        let base = quote
            .checked_div(price)
            .unwrap_or(Decimal::ZERO)
            .round_dp_with_strategy(self.base_qty_scale, RoundingStrategy::MidpointAwayFromZero);

        at_scale(base, self.base_qty_scale)
    }

    /// Round a notional half-up at `quote_notional_scale` (reporting only).
    pub fn round_quote(&self, notional: Decimal) -> Decimal {
        let rounded =
            notional.round_dp_with_strategy(self.quote_notional_scale, RoundingStrategy::MidpointAwayFromZero);
        at_scale(rounded, self.quote_notional_scale)
    }

    /// Realized volume-weighted average price, half-up at `price_scale`.
    /// Zero when nothing was filled.
    pub fn realized_vwap(&self, cum_base: Decimal, cum_quote: Decimal) -> Decimal {
        if cum_base.is_zero() {
            return at_scale(Decimal::ZERO, self.price_scale);
        }

        let vwap = cum_quote
            .checked_div(cum_base)
            .unwrap_or(Decimal::ZERO)
            .round_dp_with_strategy(self.price_scale, RoundingStrategy::MidpointAwayFromZero);

        at_scale(vwap, self.price_scale)
    }

    /// True if `price` is an exact multiple of the tick.
    pub fn is_on_tick(&self, price: Decimal) -> bool {
        price
            .checked_rem(self.tick_size)
            .map(|rem| rem.is_zero())
            .unwrap_or(false)
    }
}

/// Render `value` with exactly `scale` decimal places. Only ever called on
/// values already rounded to `scale`, so this pads and never rounds.
fn at_scale(mut value: Decimal, scale: u32) -> Decimal {
    value.rescale(scale);
    value
}
