// ============================================================================
// Parent Order Store Interface
// ============================================================================

use crate::domain::{FlatOrderAggregate, ParentOrderId};
use crate::error::StoreError;

/// Persistence for parent aggregates.
///
/// `load` hands out an owned copy; changes become visible only through
/// `update`. Callers serialize access per parent id.
pub trait ParentOrderStore: Send + Sync {
    fn save(&self, parent: &FlatOrderAggregate) -> Result<(), StoreError>;

    fn load(&self, id: &ParentOrderId) -> Option<FlatOrderAggregate>;

    fn update(&self, parent: &FlatOrderAggregate) -> Result<(), StoreError>;
}
