// ============================================================================
// Event Sink Interface
// Defines the contract for observing flat order lifecycle events
// ============================================================================

use crate::domain::{ClientOrderId, CompletionReason, OrdStatus, ParentOrderId, Side, Symbol, TargetType};
use chrono::{DateTime, Utc};
use crossbeam::channel::{self, Receiver, Sender};
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the execution coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlatEvent {
    /// Parent order created and about to be split
    Started {
        order_id: ParentOrderId,
        symbol: Symbol,
        side: Side,
        target_type: TargetType,
        target_value: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// A child order reported an incremental fill
    ChildExecuted {
        order_id: ParentOrderId,
        client_order_id: ClientOrderId,
        last_qty: Decimal,
        last_px: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// Parent order reached a terminal status
    Completed {
        order_id: ParentOrderId,
        status: OrdStatus,
        reason: CompletionReason,
        cum_base: Decimal,
        cum_quote: Decimal,
        realized_vwap: Decimal,
        timestamp: DateTime<Utc>,
    },
}

impl FlatEvent {
    pub fn order_id(&self) -> ParentOrderId {
        match self {
            FlatEvent::Started { order_id, .. }
            | FlatEvent::ChildExecuted { order_id, .. }
            | FlatEvent::Completed { order_id, .. } => *order_id,
        }
    }
}

/// Event sink trait for lifecycle events.
/// Implementations decide the transport: logs, a bus, a queue.
pub trait EventSink: Send + Sync {
    /// Handle a lifecycle event
    fn on_event(&self, event: FlatEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<FlatEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event sink for testing
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn on_event(&self, _event: FlatEvent) {
        // Do nothing
    }
}

/// Logging event sink
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn on_event(&self, event: FlatEvent) {
        tracing::debug!("Flat order event: {:?}", event);
    }
}

/// Forwards events into an unbounded crossbeam channel
pub struct ChannelEventSink {
    sender: Sender<FlatEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiving end of its channel
    pub fn new() -> (Self, Receiver<FlatEvent>) {
        let (sender, receiver) = channel::unbounded();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn on_event(&self, event: FlatEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Event receiver dropped, discarding flat order event");
        }
    }
}
