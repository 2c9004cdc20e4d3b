// ============================================================================
// Client Order Id Generation
// ============================================================================

use crate::domain::ClientOrderId;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Issues client order ids that are never reused
pub trait ClientOrderIdGenerator: Send + Sync {
    fn next_id(&self) -> ClientOrderId;
}

/// Random v4 uuids
pub struct UuidIdGenerator;

impl ClientOrderIdGenerator for UuidIdGenerator {
    fn next_id(&self) -> ClientOrderId {
        ClientOrderId::new(Uuid::new_v4().to_string())
    }
}

/// `PREFIX-1`, `PREFIX-2`, ... Deterministic, for tests and replay.
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl ClientOrderIdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> ClientOrderId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ClientOrderId::new(format!("{}-{}", self.prefix, n))
    }
}
