// ============================================================================
// Volume-Weighted Splitter
// Distributes a parent target across aggregated multi-provider depth
// ============================================================================

use crate::domain::{
    ChildOrder, OrderBookSnapshot, PriceReference, Side, Symbol, SymbolRule, TargetSpec, TargetType,
};
use crate::interfaces::{ClientOrderIdGenerator, SplittingStrategy, UuidIdGenerator};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Volume-weighted splitting
///
/// Walks one side of the book from the best price outward and carves the
/// target into one child per provider contribution, so each child is sized
/// to what its provider advertised.
///
/// # Example
/// ```text
/// Asks:  1.10000 @ 2 (LP1)
///        1.10010 @ 3 (LP2)
///
/// BUY 3.5 base
/// Result: 2 @ 1.10000 (LP1), 1.5 @ 1.10010 (LP2)
/// ```
pub struct VolumeWeightedSplitter {
    ids: Arc<dyn ClientOrderIdGenerator>,
}

impl VolumeWeightedSplitter {
    pub fn new(ids: Arc<dyn ClientOrderIdGenerator>) -> Self {
        Self { ids }
    }

    /// Side to walk, as the book reference used for tick alignment
    fn reference(side: Side, target: &TargetSpec) -> PriceReference {
        let crosses = match target.target_type {
            TargetType::BaseQty => true,
            TargetType::QuoteNotional => target.intent.crosses_spread(),
        };

        match (side, crosses) {
            (Side::Buy, true) | (Side::Sell, false) => PriceReference::Ask,
            (Side::Sell, true) | (Side::Buy, false) => PriceReference::Bid,
        }
    }

    fn child(
        &self,
        symbol: &Symbol,
        side: Side,
        price: Decimal,
        qty_base: Decimal,
        provider_id: &str,
    ) -> ChildOrder {
        ChildOrder::new(
            self.ids.next_id(),
            symbol.clone(),
            side,
            price,
            qty_base,
            provider_id,
        )
    }
}

impl Default for VolumeWeightedSplitter {
    fn default() -> Self {
        Self::new(Arc::new(UuidIdGenerator))
    }
}

impl SplittingStrategy for VolumeWeightedSplitter {
    fn split(
        &self,
        symbol: &Symbol,
        side: Side,
        target: &TargetSpec,
        book: &OrderBookSnapshot,
        rule: &SymbolRule,
    ) -> Vec<ChildOrder> {
        let mut children = Vec::new();

        if target.target_value <= Decimal::ZERO {
            return children;
        }

        let reference = Self::reference(side, target);
        let mut remaining = target.target_value;

        'levels: for level in book.side(reference) {
            let price = rule.align_price(level.price, reference);

            for provider in &level.providers {
                if remaining <= Decimal::ZERO {
                    break 'levels;
                }

                let available = provider.base_qty;
                if available <= Decimal::ZERO {
                    continue;
                }

                let qty_base = match target.target_type {
                    TargetType::BaseQty => {
                        let take = remaining.min(available);
                        remaining -= take;
                        rule.truncate_base(take)
                    },
                    TargetType::QuoteNotional => {
                        let quote_available = available.checked_mul(price).unwrap_or(Decimal::MAX);
                        let take_quote = remaining.min(quote_available);
                        remaining -= take_quote;
                        rule.base_from_quote(take_quote, price)
                    },
                };

                if qty_base <= Decimal::ZERO {
                    continue;
                }

                children.push(self.child(symbol, side, price, qty_base, &provider.provider_id));
            }
        }

        tracing::debug!(
            "{} split {} {:?} {} into {} children",
            self.name(),
            symbol,
            side,
            target.target_value,
            children.len()
        );

        children
    }

    fn name(&self) -> &str {
        "VolumeWeighted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionIntent, OrdStatus, PriceLevel, ProviderDepth};
    use crate::interfaces::SequentialIdGenerator;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn splitter() -> VolumeWeightedSplitter {
        VolumeWeightedSplitter::new(Arc::new(SequentialIdGenerator::new("C")))
    }

    fn eurusd() -> Symbol {
        Symbol::new("EUR", "USD")
    }

    fn rule() -> SymbolRule {
        SymbolRule::new(dec!(0.00001), 5, 2, 2)
    }

    fn book() -> OrderBookSnapshot {
        OrderBookSnapshot::with_depth(
            vec![
                PriceLevel::single(dec!(1.10000), "LP1", dec!(2)),
                PriceLevel::single(dec!(1.10010), "LP2", dec!(3)),
            ],
            vec![
                PriceLevel::single(dec!(1.09990), "LP3", dec!(4)),
                PriceLevel::single(dec!(1.09980), "LP4", dec!(5)),
            ],
        )
    }

    fn legs(children: &[ChildOrder]) -> Vec<(Decimal, Decimal, String)> {
        children
            .iter()
            .map(|c| (c.qty_base, c.price, c.provider_id.clone()))
            .collect()
    }

    #[test]
    fn test_buy_base_qty_walks_asks() {
        let children = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::base_qty(dec!(3.5)),
            &book(),
            &rule(),
        );

        assert_eq!(
            legs(&children),
            vec![
                (dec!(2), dec!(1.10000), "LP1".to_string()),
                (dec!(1.5), dec!(1.10010), "LP2".to_string()),
            ]
        );
        assert!(children.iter().all(|c| c.status == OrdStatus::PendingNew));
        assert_eq!(children[0].client_order_id.as_str(), "C-1");
        assert_eq!(children[1].client_order_id.as_str(), "C-2");
    }

    #[test]
    fn test_sell_base_qty_walks_bids() {
        let children = splitter().split(
            &eurusd(),
            Side::Sell,
            &TargetSpec::base_qty(dec!(6)),
            &book(),
            &rule(),
        );

        assert_eq!(
            legs(&children),
            vec![
                (dec!(4), dec!(1.09990), "LP3".to_string()),
                (dec!(2), dec!(1.09980), "LP4".to_string()),
            ]
        );
        assert!(children.iter().all(|c| c.side == Side::Sell));
    }

    #[test]
    fn test_depth_exhaustion_drops_remainder() {
        let children = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::base_qty(dec!(100)),
            &book(),
            &rule(),
        );

        let total: Decimal = children.iter().map(|c| c.qty_base).sum();
        assert_eq!(total, dec!(5));
    }

    #[test]
    fn test_providers_in_listed_order() {
        let book = OrderBookSnapshot::with_depth(
            vec![PriceLevel::new(
                dec!(1.2),
                vec![
                    ProviderDepth::new("LP1", dec!(1)),
                    ProviderDepth::new("LP2", Decimal::ZERO),
                    ProviderDepth::new("LP3", dec!(-2)),
                    ProviderDepth::new("LP4", dec!(3)),
                ],
            )],
            Vec::new(),
        );

        let children = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::base_qty(dec!(2)),
            &book,
            &rule(),
        );

        assert_eq!(
            legs(&children),
            vec![
                (dec!(1), dec!(1.2), "LP1".to_string()),
                (dec!(1), dec!(1.2), "LP4".to_string()),
            ]
        );
    }

    #[test]
    fn test_prices_aligned_by_side() {
        let rule = SymbolRule::new(dec!(0.00005), 5, 2, 2);
        let book = OrderBookSnapshot::with_depth(
            vec![PriceLevel::single(dec!(1.100037), "LP1", dec!(1))],
            vec![PriceLevel::single(dec!(1.100037), "LP2", dec!(1))],
        );

        let buy = splitter().split(&eurusd(), Side::Buy, &TargetSpec::base_qty(dec!(1)), &book, &rule);
        let sell = splitter().split(&eurusd(), Side::Sell, &TargetSpec::base_qty(dec!(1)), &book, &rule);

        assert_eq!(buy[0].price, dec!(1.10005));
        assert_eq!(sell[0].price, dec!(1.10000));
    }

    #[test]
    fn test_quantity_truncated_to_scale() {
        let book = OrderBookSnapshot::with_depth(
            vec![PriceLevel::single(dec!(1.1), "LP1", dec!(1.239))],
            Vec::new(),
        );
        let children = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::base_qty(dec!(5)),
            &book,
            &rule(),
        );
        assert_eq!(children[0].qty_base, dec!(1.23));

        // A contribution that truncates to zero is not emitted
        let dust = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::base_qty(dec!(0.001)),
            &book,
            &rule(),
        );
        assert!(dust.is_empty());
    }

    #[test]
    fn test_quote_notional_taker_buys_asks() {
        // 2 @ 1.1 = 2.2 quote, then 1.1 of budget at 1.1001
        let children = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::quote_notional(dec!(3.3), ExecutionIntent::Taker),
            &book(),
            &rule(),
        );

        assert_eq!(
            legs(&children),
            vec![
                (dec!(2), dec!(1.10000), "LP1".to_string()),
                (dec!(1), dec!(1.10010), "LP2".to_string()),
            ]
        );
    }

    #[test]
    fn test_quote_notional_intent_selects_side() {
        let maker = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::quote_notional(dec!(1), ExecutionIntent::Maker),
            &book(),
            &rule(),
        );
        assert_eq!(maker[0].provider_id, "LP3");

        let auto = splitter().split(
            &eurusd(),
            Side::Sell,
            &TargetSpec::quote_notional(dec!(1), ExecutionIntent::Auto),
            &book(),
            &rule(),
        );
        assert_eq!(auto[0].provider_id, "LP1");

        let taker = splitter().split(
            &eurusd(),
            Side::Sell,
            &TargetSpec::quote_notional(dec!(1), ExecutionIntent::Taker),
            &book(),
            &rule(),
        );
        assert_eq!(taker[0].provider_id, "LP3");
    }

    #[test]
    fn test_empty_inputs_yield_no_children() {
        let empty = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::base_qty(dec!(1)),
            &OrderBookSnapshot::empty(),
            &rule(),
        );
        assert!(empty.is_empty());

        let zero = splitter().split(
            &eurusd(),
            Side::Buy,
            &TargetSpec::base_qty(Decimal::ZERO),
            &book(),
            &rule(),
        );
        assert!(zero.is_empty());
    }

    proptest! {
        #[test]
        fn prop_base_split_bounded_and_on_tick(
            target_cents in 1u32..100_000,
            depth in prop::collection::vec((1u32..5_000, 0u32..50_000), 0..12),
            buy in any::<bool>(),
        ) {
            let rule = SymbolRule::new(dec!(0.00005), 5, 2, 2);
            let levels: Vec<PriceLevel> = depth
                .iter()
                .enumerate()
                .map(|(i, (ticks, cents))| {
                    let price = Decimal::new(100_000 + *ticks as i64 + i as i64, 5);
                    PriceLevel::single(price, format!("LP{}", i), Decimal::new(*cents as i64, 2))
                })
                .collect();
            let book = OrderBookSnapshot::with_depth(levels.clone(), levels);
            let target = Decimal::new(target_cents as i64, 2);
            let side = if buy { Side::Buy } else { Side::Sell };

            let children = splitter().split(&eurusd(), side, &TargetSpec::base_qty(target), &book, &rule);

            let total: Decimal = children.iter().map(|c| c.qty_base).sum();
            prop_assert!(total <= target);
            prop_assert!(total <= book.total_ask_quantity());
            for child in &children {
                prop_assert!(child.qty_base > Decimal::ZERO);
                prop_assert!(rule.is_on_tick(child.price));
            }
        }
    }
}
