// ============================================================================
// Errors
// Caller-facing failures of the execution coordinator
// ============================================================================

use crate::domain::{ClientOrderId, OrdStatus, ParentOrderId, Symbol};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures reported by a parent order store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Parent order {0} already stored")]
    Duplicate(ParentOrderId),

    #[error("Parent order {0} not stored")]
    Missing(ParentOrderId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(Symbol),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid rule for {symbol}: {reason}")]
    InvalidRule { symbol: Symbol, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parent order not found: {0}")]
    ParentNotFound(ParentOrderId),

    #[error("Child order {child} not found under parent {parent}")]
    ChildNotFound {
        parent: ParentOrderId,
        child: ClientOrderId,
    },

    #[error("Parent order {id} is no longer active (status={status:?})")]
    ParentNotActive { id: ParentOrderId, status: OrdStatus },

    #[error("Child order {child} cannot be amended in status {status:?}")]
    ChildNotAmendable {
        child: ClientOrderId,
        status: OrdStatus,
    },

    #[error("Price {price} is not positive or not on tick {tick_size}")]
    PriceNotOnTick { price: Decimal, tick_size: Decimal },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Scheduler unavailable: {0}")]
    SchedulerUnavailable(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::SchedulerUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
