// ============================================================================
// Coordinator Factory
// Creates execution coordinators with sensible default collaborators
// ============================================================================

use crate::domain::CoordinatorConfig;
use crate::engine::{ExecutionCoordinator, InMemoryParentOrderStore, ThreadTimer, VolumeWeightedSplitter};
use crate::error::Result;
use crate::interfaces::{
    ClientOrderIdGenerator, EventSink, MarketDepthProvider, NoOpEventSink, ParentOrderStore,
    Scheduler, SplittingStrategy, VenuePort,
};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating coordinators with fluent API
///
/// Depth and venue are required. Everything else defaults to the in-memory
/// store, a no-op event sink, a dedicated timer thread and volume-weighted
/// splitting with uuid child ids.
///
/// # Example
/// ```
/// use flat_execution::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # struct Venue;
/// # impl VenuePort for Venue {
/// #     fn submit(&self, _: &ChildOrder, _: ReportCallback) {}
/// #     fn cancel(&self, _: &ChildOrder, _: ReportCallback) {}
/// #     fn replace(&self, _: &ChildOrder, _: rust_decimal::Decimal, _: ReportCallback) {}
/// # }
/// let coordinator = CoordinatorBuilder::new(Arc::new(StaticMarketDepth::new()), Arc::new(Venue))
///     .low_latency()
///     .with_parent_timeout(Duration::from_secs(3))
///     .with_event_sink(Arc::new(LoggingEventSink))
///     .build()
///     .unwrap();
///
/// assert_eq!(coordinator.strategy_name(), "VolumeWeighted");
/// ```
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    depth: Arc<dyn MarketDepthProvider>,
    venue: Arc<dyn VenuePort>,
    store: Option<Arc<dyn ParentOrderStore>>,
    sink: Option<Arc<dyn EventSink>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    splitter: Option<Box<dyn SplittingStrategy>>,
}

impl CoordinatorBuilder {
    /// Create a new builder for the given market data and venue
    pub fn new(depth: Arc<dyn MarketDepthProvider>, venue: Arc<dyn VenuePort>) -> Self {
        Self {
            config: CoordinatorConfig::default(),
            depth,
            venue,
            store: None,
            sink: None,
            scheduler: None,
            splitter: None,
        }
    }

    // ========================================================================
    // Timer Configuration
    // ========================================================================

    /// Replace the whole configuration
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the low-latency preset
    pub fn low_latency(mut self) -> Self {
        self.config = CoordinatorConfig::low_latency();
        self
    }

    /// Use the patient preset
    pub fn patient(mut self) -> Self {
        self.config = CoordinatorConfig::patient();
        self
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.config.ack_timeout = timeout;
        self
    }

    pub fn with_parent_timeout(mut self, timeout: Duration) -> Self {
        self.config.parent_timeout = timeout;
        self
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    pub fn with_store(mut self, store: Arc<dyn ParentOrderStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_splitter(mut self, splitter: Box<dyn SplittingStrategy>) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Volume-weighted splitting with the given id source
    pub fn with_id_generator(mut self, ids: Arc<dyn ClientOrderIdGenerator>) -> Self {
        self.splitter = Some(Box::new(VolumeWeightedSplitter::new(ids)));
        self
    }

    /// Build the coordinator
    pub fn build(self) -> Result<Arc<ExecutionCoordinator>> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryParentOrderStore::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(NoOpEventSink));
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(ThreadTimer::new()?),
        };
        let splitter = self
            .splitter
            .unwrap_or_else(|| Box::new(VolumeWeightedSplitter::default()));

        ExecutionCoordinator::new(
            self.config,
            self.depth,
            self.venue,
            store,
            sink,
            scheduler,
            splitter,
        )
    }
}
