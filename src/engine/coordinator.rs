// ============================================================================
// Execution Coordinator
// Drives flat parent orders from split to completion
// ============================================================================

use crate::domain::{
    ChildOrder, ClientOrderId, Command, CoordinatorConfig, ExecutionReport, FlatOrderAggregate,
    FlatSignal, OrdStatus, ParentInput, ParentOrderId, TargetSpec,
};
use crate::error::{Error, Result};
use crate::interfaces::{
    EventSink, FlatEvent, MarketDepthProvider, ParentOrderStore, ReportCallback, Scheduler,
    SplittingStrategy, VenuePort,
};
use chrono::Utc;
use crossbeam_skiplist::SkipMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Coordinates the lifecycle of flat parent orders.
///
/// Venue reports and timer callbacks may arrive on any thread. Work on one
/// parent is serialized by a per-parent lock; venue calls are made after the
/// lock is released, so a venue may report synchronously from inside
/// `submit`, `cancel` or `replace`.
pub struct ExecutionCoordinator {
    config: CoordinatorConfig,

    /// Aggregated books and symbol rules
    depth: Arc<dyn MarketDepthProvider>,

    /// Order routing
    venue: Arc<dyn VenuePort>,

    /// Parent persistence
    store: Arc<dyn ParentOrderStore>,

    /// Lifecycle event consumer
    sink: Arc<dyn EventSink>,

    /// One-shot timers
    scheduler: Arc<dyn Scheduler>,

    /// Pluggable splitting algorithm
    splitter: Box<dyn SplittingStrategy>,

    /// Per-parent locks
    locks: SkipMap<ParentOrderId, Arc<Mutex<()>>>,

    /// Handle captured by venue and timer callbacks
    this: Weak<ExecutionCoordinator>,
}

impl ExecutionCoordinator {
    /// Create a coordinator. Fails if the configuration is invalid.
    pub fn new(
        config: CoordinatorConfig,
        depth: Arc<dyn MarketDepthProvider>,
        venue: Arc<dyn VenuePort>,
        store: Arc<dyn ParentOrderStore>,
        sink: Arc<dyn EventSink>,
        scheduler: Arc<dyn Scheduler>,
        splitter: Box<dyn SplittingStrategy>,
    ) -> Result<Arc<Self>> {
        config.validate().map_err(Error::InvalidConfig)?;

        Ok(Arc::new_cyclic(|this| Self {
            config,
            depth,
            venue,
            store,
            sink,
            scheduler,
            splitter,
            locks: SkipMap::new(),
            this: this.clone(),
        }))
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Name of the splitting strategy in use
    pub fn strategy_name(&self) -> &str {
        self.splitter.name()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Start a flat parent order for `signal` with `target`.
    ///
    /// Reads the book and rule once, splits once, submits every child with
    /// its ack timer, then arms the parent timer. A split with no children completes
    /// the parent before this returns.
    pub fn start(&self, signal: FlatSignal, target: TargetSpec) -> Result<ParentOrderId> {
        target.validate().map_err(Error::InvalidTarget)?;

        let symbol = signal.symbol;
        let rule = self
            .depth
            .rule_of(&symbol)
            .ok_or_else(|| Error::UnknownSymbol(symbol.clone()))?;
        rule.validate().map_err(|reason| Error::InvalidRule {
            symbol: symbol.clone(),
            reason,
        })?;
        let book = self
            .depth
            .latest(&symbol)
            .ok_or_else(|| Error::UnknownSymbol(symbol.clone()))?;

        let now = Utc::now();
        let id = ParentOrderId::new();
        let mut parent = FlatOrderAggregate::new(id, symbol, signal.side, &target, rule, now);

        let lock = self.lock_for(id);
        let children = {
            let _guard = lock.lock();

            self.store.save(&parent)?;
            self.sink.on_event(FlatEvent::Started {
                order_id: id,
                symbol: parent.symbol.clone(),
                side: parent.side,
                target_type: parent.target_type,
                target_value: parent.target_value(),
                timestamp: now,
            });

            let children = self.splitter.split(
                &parent.symbol,
                parent.side,
                &target,
                &book,
                &parent.rule,
            );
            let transition = parent.attach_children(children, now);
            self.store.update(&parent)?;
            self.sink.on_events(transition.events.into_vec());

            parent.children().to_vec()
        };

        tracing::info!(
            "Started flat order {} ({}): {:?} {} {:?} {} via {} with {} children",
            id,
            signal.reason,
            parent.side,
            parent.symbol,
            parent.target_type,
            parent.target_value(),
            self.splitter.name(),
            children.len()
        );

        if parent.is_done() {
            tracing::info!("Flat order {} found no usable depth", id);
            return Ok(id);
        }

        // Each child is claimed under the lock right before it is sent, so a
        // parent that completes mid-loop stops further submissions. The
        // parent timer is armed last: it cannot fire before every child it
        // would have to cancel has been sent.
        let on_report = self.report_callback(id);
        for planned in &children {
            let Some(child) = self.claim_for_submit(id, &planned.client_order_id) else {
                tracing::debug!(
                    "Flat order {} done before child {} was sent",
                    id,
                    planned.client_order_id
                );
                continue;
            };

            self.arm_ack_timer(id, child.client_order_id.clone());
            self.venue.submit(&child, Arc::clone(&on_report));
            self.cancel_if_orphaned(id, &child.client_order_id, &on_report);
        }

        self.arm_parent_timer(id, self.config.parent_deadline(target.ttl));

        Ok(id)
    }

    /// Apply an execution report for a child of `parent_id`.
    ///
    /// Malformed reports and reports for unknown parents or children are
    /// logged and dropped.
    pub fn on_report(&self, parent_id: ParentOrderId, report: ExecutionReport) {
        if let Err(reason) = report.validate() {
            tracing::warn!(
                "Dropping report for {} under {}: {}",
                report.client_order_id,
                parent_id,
                reason
            );
            return;
        }

        tracing::trace!(
            "Report for {}: {:?} last_qty={} last_px={}",
            report.client_order_id,
            report.status,
            report.last_qty,
            report.last_px
        );

        self.handle(parent_id, ParentInput::Report(report));
    }

    /// Cancel the child if the venue never acknowledged it
    pub fn on_ack_timeout(&self, parent_id: ParentOrderId, client_order_id: ClientOrderId) {
        self.handle(parent_id, ParentInput::AckTimeout(client_order_id));
    }

    /// Force-complete the parent if it is still working
    pub fn on_parent_timeout(&self, parent_id: ParentOrderId) {
        self.handle(parent_id, ParentInput::ParentTimeout);
    }

    /// Abort a parent: cancel its live children and complete it as
    /// `Canceled`. Returns false if it had already completed.
    pub fn cancel(&self, parent_id: ParentOrderId) -> Result<bool> {
        match self.apply(parent_id, ParentInput::Cancel)? {
            Some(cancels) => {
                tracing::info!("Flat order {} canceled by caller", parent_id);
                self.dispatch_cancels(parent_id, cancels);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Request a new limit price for a working child.
    ///
    /// The child keeps its price until the venue confirms with a `Replaced`
    /// report.
    pub fn amend(
        &self,
        parent_id: ParentOrderId,
        client_order_id: &ClientOrderId,
        new_price: Decimal,
    ) -> Result<()> {
        let child = {
            let lock = self.existing_lock(parent_id)?;
            let _guard = lock.lock();

            let parent = self
                .store
                .load(&parent_id)
                .ok_or(Error::ParentNotFound(parent_id))?;

            if parent.is_done() {
                return Err(Error::ParentNotActive {
                    id: parent_id,
                    status: parent.status(),
                });
            }

            let child = parent
                .child(client_order_id)
                .ok_or_else(|| Error::ChildNotFound {
                    parent: parent_id,
                    child: client_order_id.clone(),
                })?;

            if !child.status.can_be_replaced() {
                return Err(Error::ChildNotAmendable {
                    child: client_order_id.clone(),
                    status: child.status,
                });
            }

            if new_price <= Decimal::ZERO || !parent.rule.is_on_tick(new_price) {
                return Err(Error::PriceNotOnTick {
                    price: new_price,
                    tick_size: parent.rule.tick_size,
                });
            }

            child.clone()
        };

        tracing::info!(
            "Amending {} under {}: {} -> {}",
            client_order_id,
            parent_id,
            child.price,
            new_price
        );
        self.venue
            .replace(&child, new_price, self.report_callback(parent_id));

        Ok(())
    }

    /// Current status of a parent
    pub fn status(&self, parent_id: ParentOrderId) -> Result<OrdStatus> {
        self.snapshot(parent_id).map(|parent| parent.status())
    }

    /// Owned copy of a parent as last stored
    pub fn snapshot(&self, parent_id: ParentOrderId) -> Result<FlatOrderAggregate> {
        self.store
            .load(&parent_id)
            .ok_or(Error::ParentNotFound(parent_id))
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn lock_for(&self, parent_id: ParentOrderId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .get_or_insert(parent_id, Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Lock of a stored parent. Ids that were never stored get no table
    /// entry, so stray reports cannot grow the table.
    fn existing_lock(&self, parent_id: ParentOrderId) -> Result<Arc<Mutex<()>>> {
        if let Some(entry) = self.locks.get(&parent_id) {
            return Ok(Arc::clone(entry.value()));
        }

        // Stored through a shared store by another coordinator
        if self.store.load(&parent_id).is_none() {
            return Err(Error::ParentNotFound(parent_id));
        }
        Ok(self.lock_for(parent_id))
    }

    /// Mark a child as sent, unless its parent is already done
    fn claim_for_submit(&self, parent_id: ParentOrderId, client_order_id: &ClientOrderId) -> Option<ChildOrder> {
        let lock = self.existing_lock(parent_id).ok()?;
        let _guard = lock.lock();

        let mut parent = self.store.load(&parent_id)?;
        let child = parent.mark_submitted(client_order_id, Utc::now())?;

        if let Err(e) = self.store.update(&parent) {
            tracing::warn!("Failed to record submission of {} under {}: {}", client_order_id, parent_id, e);
            return None;
        }
        Some(child)
    }

    /// A parent completing between the claim and the submit may have sent
    /// its cancel ahead of the order itself. Cancel again once the venue has
    /// seen the submit.
    fn cancel_if_orphaned(&self, parent_id: ParentOrderId, client_order_id: &ClientOrderId, on_report: &ReportCallback) {
        let orphan = {
            let Ok(lock) = self.existing_lock(parent_id) else {
                return;
            };
            let _guard = lock.lock();

            self.store
                .load(&parent_id)
                .filter(|parent| parent.is_done())
                .and_then(|parent| parent.child(client_order_id).filter(|c| c.status.is_live()).cloned())
        };

        if let Some(child) = orphan {
            tracing::debug!("Canceling child {} of completed {}", client_order_id, parent_id);
            self.venue.cancel(&child, Arc::clone(on_report));
        }
    }

    /// Load, apply, store and emit under the parent lock.
    ///
    /// Returns the children to cancel, or None if the input changed nothing.
    fn apply(&self, parent_id: ParentOrderId, input: ParentInput) -> Result<Option<Vec<ChildOrder>>> {
        let lock = self.existing_lock(parent_id)?;
        let _guard = lock.lock();

        let mut parent = self
            .store
            .load(&parent_id)
            .ok_or(Error::ParentNotFound(parent_id))?;

        let transition = match parent.apply(input, Utc::now()) {
            Some(transition) => transition,
            None => return Ok(None),
        };

        self.store.update(&parent)?;

        let cancels: Vec<ChildOrder> = transition
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::CancelChild(id) => parent.child(id).cloned(),
            })
            .collect();

        if let Some(completion) = parent.completion().filter(|_| {
            transition
                .events
                .iter()
                .any(|e| matches!(e, FlatEvent::Completed { .. }))
        }) {
            tracing::info!(
                "Flat order {} completed: {:?} {:?} cum_base={} cum_quote={} vwap={}",
                parent_id,
                parent.status(),
                completion.reason,
                parent.cum_base(),
                parent.cum_quote(),
                completion.realized_vwap
            );
        }

        self.sink.on_events(transition.events.into_vec());

        Ok(Some(cancels))
    }

    /// Callback-path variant of `apply`: failures are logged, not returned.
    fn handle(&self, parent_id: ParentOrderId, input: ParentInput) {
        match self.apply(parent_id, input) {
            Ok(Some(cancels)) => self.dispatch_cancels(parent_id, cancels),
            Ok(None) => {},
            Err(Error::ParentNotFound(_)) => {
                tracing::debug!("Parent {} not found, input dropped", parent_id);
            },
            Err(e) => tracing::warn!("Failed to update parent {}: {}", parent_id, e),
        }
    }

    fn dispatch_cancels(&self, parent_id: ParentOrderId, cancels: Vec<ChildOrder>) {
        if cancels.is_empty() {
            return;
        }

        let on_report = self.report_callback(parent_id);
        for child in &cancels {
            tracing::debug!("Canceling child {} of {}", child.client_order_id, parent_id);
            self.venue.cancel(child, Arc::clone(&on_report));
        }
    }

    fn report_callback(&self, parent_id: ParentOrderId) -> ReportCallback {
        let this = self.this.clone();
        Arc::new(move |report| {
            if let Some(coordinator) = this.upgrade() {
                coordinator.on_report(parent_id, report);
            }
        })
    }

    fn arm_ack_timer(&self, parent_id: ParentOrderId, client_order_id: ClientOrderId) {
        let this = self.this.clone();
        self.scheduler.schedule(
            self.config.ack_timeout,
            Box::new(move || {
                if let Some(coordinator) = this.upgrade() {
                    coordinator.on_ack_timeout(parent_id, client_order_id);
                }
            }),
        );
    }

    fn arm_parent_timer(&self, parent_id: ParentOrderId, delay: Duration) {
        let this = self.this.clone();
        self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(coordinator) = this.upgrade() {
                    coordinator.on_parent_timeout(parent_id);
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CompletionReason, OrderBookSnapshot, PriceLevel, Side, Symbol, SymbolRule,
    };
    use crate::engine::{
        InMemoryParentOrderStore, ManualScheduler, StaticMarketDepth, VolumeWeightedSplitter,
    };
    use crate::interfaces::{ChannelEventSink, SequentialIdGenerator};
    use crossbeam::channel::Receiver;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum VenueCall {
        Submit(ClientOrderId),
        Cancel(ClientOrderId),
        Replace(ClientOrderId, Decimal),
    }

    /// Records calls and never reports on its own
    #[derive(Default)]
    struct RecordingVenue {
        calls: Mutex<Vec<VenueCall>>,
    }

    impl RecordingVenue {
        fn calls(&self) -> Vec<VenueCall> {
            self.calls.lock().clone()
        }

        fn cancels(&self) -> Vec<ClientOrderId> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    VenueCall::Cancel(id) => Some(id),
                    _ => None,
                })
                .collect()
        }
    }

    impl VenuePort for RecordingVenue {
        fn submit(&self, child: &ChildOrder, _on_report: ReportCallback) {
            self.calls
                .lock()
                .push(VenueCall::Submit(child.client_order_id.clone()));
        }

        fn cancel(&self, child: &ChildOrder, _on_report: ReportCallback) {
            self.calls
                .lock()
                .push(VenueCall::Cancel(child.client_order_id.clone()));
        }

        fn replace(&self, child: &ChildOrder, new_price: Decimal, _on_report: ReportCallback) {
            self.calls
                .lock()
                .push(VenueCall::Replace(child.client_order_id.clone(), new_price));
        }
    }

    struct Fixture {
        coordinator: Arc<ExecutionCoordinator>,
        venue: Arc<RecordingVenue>,
        scheduler: Arc<ManualScheduler>,
        events: Receiver<FlatEvent>,
    }

    fn eurusd() -> Symbol {
        Symbol::new("EUR", "USD")
    }

    fn buy_signal() -> FlatSignal {
        FlatSignal::new(eurusd(), Side::Buy, dec!(3.5), "test")
    }

    fn id(client_order_id: &str) -> ClientOrderId {
        ClientOrderId::new(client_order_id)
    }

    fn coordinator_with(
        book: OrderBookSnapshot,
        venue: Arc<dyn VenuePort>,
        scheduler: Arc<ManualScheduler>,
    ) -> (Arc<ExecutionCoordinator>, Receiver<FlatEvent>) {
        let depth = StaticMarketDepth::new().with_symbol(
            eurusd(),
            SymbolRule::new(dec!(0.00001), 5, 2, 2),
            book,
        );
        let (sink, events) = ChannelEventSink::new();

        let coordinator = ExecutionCoordinator::new(
            CoordinatorConfig::default(),
            Arc::new(depth),
            venue,
            Arc::new(InMemoryParentOrderStore::new()),
            Arc::new(sink),
            scheduler,
            Box::new(VolumeWeightedSplitter::new(Arc::new(SequentialIdGenerator::new("C")))),
        )
        .unwrap();

        (coordinator, events)
    }

    fn fixture_with(book: OrderBookSnapshot) -> Fixture {
        let venue = Arc::new(RecordingVenue::default());
        let scheduler = Arc::new(ManualScheduler::new());
        let (coordinator, events) = coordinator_with(book, venue.clone(), scheduler.clone());

        Fixture {
            coordinator,
            venue,
            scheduler,
            events,
        }
    }

    fn two_provider_book() -> OrderBookSnapshot {
        OrderBookSnapshot::with_depth(
            vec![
                PriceLevel::single(dec!(1.10000), "LP1", dec!(2)),
                PriceLevel::single(dec!(1.10010), "LP2", dec!(3)),
            ],
            Vec::new(),
        )
    }

    fn fixture() -> Fixture {
        fixture_with(two_provider_book())
    }

    /// Every submitted child must see a cancel after its submit
    fn assert_no_orphans(calls: &[VenueCall]) {
        for (at, call) in calls.iter().enumerate() {
            if let VenueCall::Submit(child) = call {
                assert!(
                    calls[at..].contains(&VenueCall::Cancel(child.clone())),
                    "child {} left working: {:?}",
                    child,
                    calls
                );
            }
        }
    }

    /// Lets the clock run past every timer while the first submit is in flight
    struct StallingVenue {
        inner: RecordingVenue,
        scheduler: Arc<ManualScheduler>,
        stalled: AtomicBool,
    }

    impl VenuePort for StallingVenue {
        fn submit(&self, child: &ChildOrder, on_report: ReportCallback) {
            self.inner.submit(child, on_report);
            if !self.stalled.swap(true, Ordering::SeqCst) {
                self.scheduler.advance(Duration::from_secs(6));
            }
        }

        fn cancel(&self, child: &ChildOrder, on_report: ReportCallback) {
            self.inner.cancel(child, on_report);
        }

        fn replace(&self, child: &ChildOrder, new_price: Decimal, on_report: ReportCallback) {
            self.inner.replace(child, new_price, on_report);
        }
    }

    /// Aborts the parent from inside the first submit
    #[derive(Default)]
    struct CancelingVenue {
        inner: RecordingVenue,
        wiring: Mutex<Option<(Weak<ExecutionCoordinator>, Receiver<FlatEvent>)>>,
    }

    impl VenuePort for CancelingVenue {
        fn submit(&self, child: &ChildOrder, on_report: ReportCallback) {
            self.inner.submit(child, on_report);

            let Some((coordinator, events)) = self.wiring.lock().clone() else {
                return;
            };
            let started = events.try_iter().find_map(|event| match event {
                FlatEvent::Started { order_id, .. } => Some(order_id),
                _ => None,
            });
            if let (Some(parent_id), Some(coordinator)) = (started, coordinator.upgrade()) {
                assert!(coordinator.cancel(parent_id).unwrap());
            }
        }

        fn cancel(&self, child: &ChildOrder, on_report: ReportCallback) {
            self.inner.cancel(child, on_report);
        }

        fn replace(&self, child: &ChildOrder, new_price: Decimal, on_report: ReportCallback) {
            self.inner.replace(child, new_price, on_report);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = ExecutionCoordinator::new(
            CoordinatorConfig::default().with_ack_timeout(Duration::from_secs(10)),
            Arc::new(StaticMarketDepth::new()),
            Arc::new(RecordingVenue::default()),
            Arc::new(InMemoryParentOrderStore::new()),
            Arc::new(crate::interfaces::NoOpEventSink),
            Arc::new(ManualScheduler::new()),
            Box::new(VolumeWeightedSplitter::default()),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_start_submits_children_and_arms_timers() {
        let f = fixture();
        let parent_id = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();

        assert_eq!(
            f.venue.calls(),
            vec![VenueCall::Submit(id("C-1")), VenueCall::Submit(id("C-2"))]
        );
        // One parent timer plus one ack timer per child
        assert_eq!(f.scheduler.pending(), 3);

        let parent = f.coordinator.snapshot(parent_id).unwrap();
        assert_eq!(parent.status(), OrdStatus::New);
        assert_eq!(parent.children().len(), 2);
        assert!(parent.children().iter().all(|c| c.submit_ts.is_some()));

        assert!(matches!(
            f.events.try_recv(),
            Ok(FlatEvent::Started { order_id, .. }) if order_id == parent_id
        ));
    }

    #[test]
    fn test_start_errors() {
        let f = fixture();

        let unknown = FlatSignal::new(Symbol::new("USD", "JPY"), Side::Buy, dec!(1), "test");
        assert!(matches!(
            f.coordinator.start(unknown, TargetSpec::base_qty(dec!(1))),
            Err(Error::UnknownSymbol(_))
        ));

        assert!(matches!(
            f.coordinator.start(buy_signal(), TargetSpec::base_qty(Decimal::ZERO)),
            Err(Error::InvalidTarget(_))
        ));
        assert!(f.venue.calls().is_empty());
    }

    #[test]
    fn test_empty_book_completes_immediately() {
        let f = fixture_with(OrderBookSnapshot::empty());
        let parent_id = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(1)))
            .unwrap();

        assert_eq!(f.coordinator.status(parent_id).unwrap(), OrdStatus::Expired);
        assert!(f.venue.calls().is_empty());
        assert_eq!(f.scheduler.pending(), 0);

        let events: Vec<FlatEvent> = f.events.try_iter().collect();
        assert!(matches!(
            events.last(),
            Some(FlatEvent::Completed {
                reason: CompletionReason::ChildrenExhausted,
                ..
            })
        ));
    }

    #[test]
    fn test_ack_timeout_cancels_unacknowledged_child_once() {
        let f = fixture();
        let parent_id = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();

        f.coordinator.on_report(
            parent_id,
            ExecutionReport::status(id("C-2"), Some("V-2".into()), OrdStatus::New, "ACK"),
        );

        assert_eq!(f.scheduler.advance(Duration::from_millis(1500)), 2);
        assert_eq!(f.venue.cancels(), vec![id("C-1")]);
        assert_eq!(
            f.coordinator.status(parent_id).unwrap(),
            OrdStatus::New
        );
    }

    #[test]
    fn test_parent_timeout_expires_and_cancels_live_children() {
        let f = fixture();
        let parent_id = f
            .coordinator
            .start(
                buy_signal(),
                TargetSpec::base_qty(dec!(3.5)).with_ttl(Duration::from_secs(2)),
            )
            .unwrap();

        for child in ["C-1", "C-2"] {
            f.coordinator.on_report(
                parent_id,
                ExecutionReport::status(id(child), None, OrdStatus::New, "ACK"),
            );
        }
        f.coordinator.on_report(
            parent_id,
            ExecutionReport::fill(id("C-1"), None, OrdStatus::PartiallyFilled, dec!(1), dec!(1.1)),
        );

        f.scheduler.advance(Duration::from_secs(2));

        let parent = f.coordinator.snapshot(parent_id).unwrap();
        assert_eq!(parent.status(), OrdStatus::Expired);
        assert_eq!(
            parent.completion().map(|c| c.reason),
            Some(CompletionReason::ParentTimeout)
        );
        assert_eq!(f.venue.cancels(), vec![id("C-1"), id("C-2")]);
    }

    #[test]
    fn test_fills_complete_parent() {
        let f = fixture();
        let parent_id = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();

        f.coordinator.on_report(
            parent_id,
            ExecutionReport::fill(id("C-1"), Some("V-1".into()), OrdStatus::Filled, dec!(2), dec!(1.1)),
        );
        assert_eq!(
            f.coordinator.status(parent_id).unwrap(),
            OrdStatus::PartiallyFilled
        );

        f.coordinator.on_report(
            parent_id,
            ExecutionReport::fill(id("C-2"), Some("V-2".into()), OrdStatus::Filled, dec!(1.5), dec!(1.1001)),
        );

        let parent = f.coordinator.snapshot(parent_id).unwrap();
        assert_eq!(parent.status(), OrdStatus::Filled);
        assert_eq!(parent.cum_base(), dec!(3.5));
        assert!(f.venue.cancels().is_empty());

        // Timers firing after completion are no-ops
        f.scheduler.advance(Duration::from_secs(10));
        assert!(f.venue.cancels().is_empty());
        assert_eq!(f.coordinator.status(parent_id).unwrap(), OrdStatus::Filled);
    }

    #[test]
    fn test_malformed_and_unknown_reports_dropped() {
        let f = fixture();
        let parent_id = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();

        f.coordinator.on_report(
            parent_id,
            ExecutionReport::fill(id("C-1"), None, OrdStatus::PartiallyFilled, dec!(-1), dec!(1.1)),
        );
        f.coordinator.on_report(
            parent_id,
            ExecutionReport::fill(id("C-1"), None, OrdStatus::PartiallyFilled, dec!(1), Decimal::ZERO),
        );
        f.coordinator.on_report(
            parent_id,
            ExecutionReport::fill(id("C-9"), None, OrdStatus::Filled, dec!(1), dec!(1.1)),
        );
        f.coordinator.on_report(
            ParentOrderId::new(),
            ExecutionReport::fill(id("C-1"), None, OrdStatus::Filled, dec!(1), dec!(1.1)),
        );

        let parent = f.coordinator.snapshot(parent_id).unwrap();
        assert_eq!(parent.cum_base(), Decimal::ZERO);
        assert_eq!(parent.status(), OrdStatus::New);
    }

    #[test]
    fn test_cancel_parent() {
        let f = fixture();
        let parent_id = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();

        assert!(f.coordinator.cancel(parent_id).unwrap());
        assert_eq!(f.coordinator.status(parent_id).unwrap(), OrdStatus::Canceled);
        assert_eq!(f.venue.cancels(), vec![id("C-1"), id("C-2")]);

        assert!(!f.coordinator.cancel(parent_id).unwrap());
        assert!(matches!(
            f.coordinator.cancel(ParentOrderId::new()),
            Err(Error::ParentNotFound(_))
        ));
    }

    #[test]
    fn test_amend_rules() {
        let f = fixture();
        let parent_id = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();

        // Not yet acknowledged
        assert!(matches!(
            f.coordinator.amend(parent_id, &id("C-1"), dec!(1.09990)),
            Err(Error::ChildNotAmendable { .. })
        ));

        f.coordinator.on_report(
            parent_id,
            ExecutionReport::status(id("C-1"), Some("V-1".into()), OrdStatus::New, "ACK"),
        );

        assert!(matches!(
            f.coordinator.amend(parent_id, &id("C-1"), dec!(1.099995)),
            Err(Error::PriceNotOnTick { .. })
        ));
        assert!(matches!(
            f.coordinator.amend(parent_id, &id("C-1"), Decimal::ZERO),
            Err(Error::PriceNotOnTick { .. })
        ));
        assert!(matches!(
            f.coordinator.amend(parent_id, &id("C-7"), dec!(1.1)),
            Err(Error::ChildNotFound { .. })
        ));

        f.coordinator
            .amend(parent_id, &id("C-1"), dec!(1.09990))
            .unwrap();
        assert!(f
            .venue
            .calls()
            .contains(&VenueCall::Replace(id("C-1"), dec!(1.09990))));

        f.coordinator.cancel(parent_id).unwrap();
        assert!(matches!(
            f.coordinator.amend(parent_id, &id("C-1"), dec!(1.09990)),
            Err(Error::ParentNotActive { .. })
        ));
    }

    #[test]
    fn test_independent_parents_for_same_symbol() {
        let f = fixture();
        let first = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(1)))
            .unwrap();
        let second = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(1)))
            .unwrap();

        assert_ne!(first, second);
        f.coordinator.cancel(first).unwrap();
        assert_eq!(f.coordinator.status(second).unwrap(), OrdStatus::New);
    }

    #[test]
    fn test_slow_submit_never_leaves_children_working() {
        let scheduler = Arc::new(ManualScheduler::new());
        let venue = Arc::new(StallingVenue {
            inner: RecordingVenue::default(),
            scheduler: scheduler.clone(),
            stalled: AtomicBool::new(false),
        });
        let (coordinator, _events) =
            coordinator_with(two_provider_book(), venue.clone(), scheduler.clone());

        let parent_id = coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();

        // Only the first ack timer can fire during the stall
        assert_eq!(
            venue.inner.calls(),
            vec![
                VenueCall::Submit(id("C-1")),
                VenueCall::Cancel(id("C-1")),
                VenueCall::Submit(id("C-2")),
            ]
        );
        assert_eq!(coordinator.status(parent_id).unwrap(), OrdStatus::New);

        scheduler.advance(Duration::from_secs(10));

        assert_eq!(coordinator.status(parent_id).unwrap(), OrdStatus::Expired);
        assert_no_orphans(&venue.inner.calls());
    }

    #[test]
    fn test_parent_done_mid_start_skips_remaining_children() {
        let scheduler = Arc::new(ManualScheduler::new());
        let venue = Arc::new(CancelingVenue::default());
        let (coordinator, events) =
            coordinator_with(two_provider_book(), venue.clone(), scheduler.clone());
        *venue.wiring.lock() = Some((Arc::downgrade(&coordinator), events));

        let parent_id = coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();

        let calls = venue.inner.calls();
        assert!(!calls.contains(&VenueCall::Submit(id("C-2"))));
        assert!(venue.inner.cancels().iter().all(|c| *c == id("C-1")));
        assert_no_orphans(&calls);

        let parent = coordinator.snapshot(parent_id).unwrap();
        assert_eq!(parent.status(), OrdStatus::Canceled);
        assert!(parent.child(&id("C-2")).unwrap().submit_ts.is_none());

        // Ack timer for C-1 only, plus the parent timer
        assert_eq!(scheduler.pending(), 2);
        scheduler.advance(Duration::from_secs(10));
        assert!(!venue.inner.calls().contains(&VenueCall::Cancel(id("C-2"))));
    }

    #[test]
    fn test_unknown_parents_leave_no_lock_entries() {
        let f = fixture();
        let parent_id = f
            .coordinator
            .start(buy_signal(), TargetSpec::base_qty(dec!(3.5)))
            .unwrap();
        assert_eq!(f.coordinator.locks.len(), 1);

        for _ in 0..100 {
            let stray = ParentOrderId::new();
            f.coordinator.on_report(
                stray,
                ExecutionReport::status(id("C-1"), None, OrdStatus::New, "ACK"),
            );
            f.coordinator.on_ack_timeout(stray, id("C-1"));
            f.coordinator.on_parent_timeout(stray);
            assert!(f.coordinator.cancel(stray).is_err());
            assert!(f.coordinator.amend(stray, &id("C-1"), dec!(1.1)).is_err());
        }

        assert_eq!(f.coordinator.locks.len(), 1);
        assert!(f.coordinator.locks.contains_key(&parent_id));
    }
}
