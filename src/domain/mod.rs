// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod aggregate;
pub mod config;
pub mod order;
pub mod order_book;
pub mod report;
pub mod symbol;
pub mod target;

pub use aggregate::{
    Command, Completion, CompletionReason, FlatOrderAggregate, ParentInput, Transition,
};
pub use config::CoordinatorConfig;
pub use order::{ChildOrder, ClientOrderId, FillKey, ParentOrderId, Side};
pub use order_book::{OrderBookSnapshot, PriceLevel, ProviderDepth};
pub use report::ExecutionReport;
pub use symbol::{PriceReference, Symbol, SymbolRule};
pub use target::{ExecutionIntent, FlatSignal, TargetSpec, TargetType};

// Re-export state machine
pub use order::state::OrdStatus;
