// ============================================================================
// Flat Execution Library
// Order splitting and execution coordination for flat (rebalancing) orders
// ============================================================================

//! # Flat Execution
//!
//! Turns a "flatten this position" request into child orders spread over
//! aggregated multi-provider depth, then tracks the children through venue
//! reports and timeouts until the parent completes.
//!
//! ## Features
//!
//! - **Volume-weighted splitting** over base-quantity or quote-notional targets
//! - **Tick and scale discipline** through a per-symbol rounding policy
//! - **Per-parent serialization** of reports and timers arriving on any thread
//! - **Pluggable ports** for market depth, venue, storage, events and timers
//!
//! ## Example
//!
//! ```rust
//! use flat_execution::prelude::*;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! /// Venue that acknowledges and fully fills every child on submit
//! struct InstantVenue;
//!
//! impl VenuePort for InstantVenue {
//!     fn submit(&self, child: &ChildOrder, on_report: ReportCallback) {
//!         on_report(ExecutionReport::fill(
//!             child.client_order_id.clone(),
//!             Some(format!("V-{}", child.client_order_id)),
//!             OrdStatus::Filled,
//!             child.qty_base,
//!             child.price,
//!         ));
//!     }
//!     fn cancel(&self, _child: &ChildOrder, _on_report: ReportCallback) {}
//!     fn replace(&self, _child: &ChildOrder, _new_price: Decimal, _on_report: ReportCallback) {}
//! }
//!
//! let eurusd = Symbol::new("EUR", "USD");
//! let depth = StaticMarketDepth::new().with_symbol(
//!     eurusd.clone(),
//!     SymbolRule::fx_major(),
//!     OrderBookSnapshot::with_depth(
//!         vec![
//!             PriceLevel::single(Decimal::new(110000, 5), "LP1", Decimal::from(2)),
//!             PriceLevel::single(Decimal::new(110010, 5), "LP2", Decimal::from(3)),
//!         ],
//!         vec![],
//!     ),
//! );
//!
//! let coordinator = CoordinatorBuilder::new(Arc::new(depth), Arc::new(InstantVenue))
//!     .with_scheduler(Arc::new(ManualScheduler::new()))
//!     .build()
//!     .unwrap();
//!
//! let signal = FlatSignal::new(eurusd, Side::Buy, Decimal::new(35, 1), "risk limit");
//! let parent_id = coordinator
//!     .start(signal, TargetSpec::base_qty(Decimal::new(35, 1)))
//!     .unwrap();
//!
//! let parent = coordinator.snapshot(parent_id).unwrap();
//! assert_eq!(parent.status(), OrdStatus::Filled);
//! println!("Realized VWAP: {}", parent.realized_vwap());
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;

pub use error::{Error, Result, StoreError};

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        ChildOrder, ClientOrderId, CompletionReason, CoordinatorConfig, ExecutionIntent,
        ExecutionReport, FlatOrderAggregate, FlatSignal, OrdStatus, OrderBookSnapshot,
        ParentOrderId, PriceLevel, PriceReference, ProviderDepth, Side, Symbol, SymbolRule,
        TargetSpec, TargetType,
    };
    pub use crate::engine::{
        CoordinatorBuilder, ExecutionCoordinator, InMemoryParentOrderStore, ManualScheduler,
        StaticMarketDepth, ThreadTimer, VolumeWeightedSplitter,
    };
    pub use crate::error::{Error, Result};
    pub use crate::interfaces::{
        ChannelEventSink, ClientOrderIdGenerator, EventSink, FlatEvent, LoggingEventSink,
        MarketDepthProvider, NoOpEventSink, ParentOrderStore, ReportCallback, Scheduler,
        SequentialIdGenerator, SplittingStrategy, UuidIdGenerator, VenuePort,
    };
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`, defaulting to
/// `flat_execution=info`. Does nothing if a global subscriber is already set.
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flat_execution=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
