// ============================================================================
// Engine Module
// Contains the splitting and execution coordination business logic
// ============================================================================

mod coordinator;
mod memory;
mod splitter;
mod timer;

pub mod factory;

pub use coordinator::ExecutionCoordinator;
pub use factory::CoordinatorBuilder;
pub use memory::{InMemoryParentOrderStore, StaticMarketDepth};
pub use splitter::VolumeWeightedSplitter;
#[cfg(feature = "async")]
pub use timer::TokioScheduler;
pub use timer::{ManualScheduler, ThreadTimer};
