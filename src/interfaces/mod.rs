// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod event_sink;
mod id_generator;
mod market_depth;
mod scheduler;
mod splitting_strategy;
mod store;
mod venue;

pub use event_sink::{ChannelEventSink, EventSink, FlatEvent, LoggingEventSink, NoOpEventSink};
pub use id_generator::{ClientOrderIdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use market_depth::MarketDepthProvider;
pub use scheduler::{Scheduler, TimerTask};
pub use splitting_strategy::SplittingStrategy;
pub use store::ParentOrderStore;
pub use venue::{ReportCallback, VenuePort};
