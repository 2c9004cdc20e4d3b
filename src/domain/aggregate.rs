// ============================================================================
// Flat Order Aggregate
// The parent order and the single transition function that mutates it
// ============================================================================
//
// Every change to a parent (report, ack timeout, parent timeout, caller
// cancel) goes through `FlatOrderAggregate::apply`, which returns the
// side-effects to perform instead of performing them. The coordinator runs
// `apply` under the parent's lock and executes the commands afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use smallvec::SmallVec;

use super::order::state::OrdStatus;
use super::order::{ChildOrder, ClientOrderId, FillKey, ParentOrderId, Side};
use super::report::ExecutionReport;
use super::symbol::{Symbol, SymbolRule};
use super::target::{TargetSpec, TargetType};
use crate::interfaces::FlatEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Inputs, Commands and Transitions
// ============================================================================

/// Something that happened to a parent order
#[derive(Debug, Clone)]
pub enum ParentInput {
    Report(ExecutionReport),
    AckTimeout(ClientOrderId),
    ParentTimeout,
    Cancel,
}

/// Side-effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CancelChild(ClientOrderId),
}

/// Output of one transition
#[derive(Debug, Default)]
pub struct Transition {
    pub commands: SmallVec<[Command; 4]>,
    pub events: SmallVec<[FlatEvent; 2]>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty()
    }
}

/// Why a parent order stopped working
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CompletionReason {
    /// Cumulative fills reached the target
    TargetMet,
    /// Every child is terminal and the target was not reached
    ChildrenExhausted,
    /// The parent timer fired first
    ParentTimeout,
    /// Aborted by the caller
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Completion {
    pub reason: CompletionReason,
    pub realized_vwap: Decimal,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlatOrderAggregate {
    pub id: ParentOrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub target_type: TargetType,
    pub target_base: Decimal,
    pub target_quote: Decimal,
    /// Rule read at start; used for the realized VWAP
    pub rule: SymbolRule,
    pub created_at: DateTime<Utc>,

    children: Vec<ChildOrder>,
    status: OrdStatus,
    cum_base: Decimal,
    cum_quote: Decimal,
    completion: Option<Completion>,
}

impl FlatOrderAggregate {
    pub fn new(
        id: ParentOrderId,
        symbol: Symbol,
        side: Side,
        target: &TargetSpec,
        rule: SymbolRule,
        now: DateTime<Utc>,
    ) -> Self {
        let (target_base, target_quote) = match target.target_type {
            TargetType::BaseQty => (target.target_value, Decimal::ZERO),
            TargetType::QuoteNotional => (Decimal::ZERO, target.target_value),
        };

        Self {
            id,
            symbol,
            side,
            target_type: target.target_type,
            target_base,
            target_quote,
            rule,
            created_at: now,
            children: Vec::new(),
            status: OrdStatus::PendingNew,
            cum_base: Decimal::ZERO,
            cum_quote: Decimal::ZERO,
            completion: None,
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    pub fn status(&self) -> OrdStatus {
        self.status
    }

    pub fn cum_base(&self) -> Decimal {
        self.cum_base
    }

    pub fn cum_quote(&self) -> Decimal {
        self.cum_quote
    }

    pub fn children(&self) -> &[ChildOrder] {
        &self.children
    }

    pub fn child(&self, id: &ClientOrderId) -> Option<&ChildOrder> {
        self.children.iter().find(|c| &c.client_order_id == id)
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn target_value(&self) -> Decimal {
        match self.target_type {
            TargetType::BaseQty => self.target_base,
            TargetType::QuoteNotional => self.target_quote,
        }
    }

    pub fn target_met(&self) -> bool {
        match self.target_type {
            TargetType::BaseQty => self.cum_base >= self.target_base,
            TargetType::QuoteNotional => self.cum_quote >= self.target_quote,
        }
    }

    /// True when no child can produce further fills. Vacuously true without
    /// children.
    pub fn all_terminal(&self) -> bool {
        self.children.iter().all(|c| c.status.is_terminal())
    }

    pub fn realized_vwap(&self) -> Decimal {
        self.rule.realized_vwap(self.cum_base, self.cum_quote)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Take ownership of the split result and go active. An empty split
    /// completes the parent immediately.
    pub fn attach_children(&mut self, children: Vec<ChildOrder>, now: DateTime<Utc>) -> Transition {
        let mut transition = Transition::default();

        self.children = children;

        if self.children.is_empty() {
            self.finish(CompletionReason::ChildrenExhausted, now, &mut transition);
        } else {
            self.status = OrdStatus::New;
        }

        transition
    }

    /// Claim a child for submission. Returns the child to send, or `None`
    /// once the parent is done: a child is never sent after completion.
    pub fn mark_submitted(&mut self, child_id: &ClientOrderId, now: DateTime<Utc>) -> Option<ChildOrder> {
        if self.is_done() {
            return None;
        }

        let child = self
            .children
            .iter_mut()
            .find(|c| &c.client_order_id == child_id)?;
        child.submit_ts = Some(now);
        Some(child.clone())
    }

    /// Apply one input. `None` means the input changed nothing.
    pub fn apply(&mut self, input: ParentInput, now: DateTime<Utc>) -> Option<Transition> {
        match input {
            ParentInput::Report(report) => self.on_report(report, now),
            ParentInput::AckTimeout(child_id) => self.on_ack_timeout(&child_id),
            ParentInput::ParentTimeout => {
                if self.is_done() {
                    return None;
                }
                let mut transition = Transition::default();
                self.finish(CompletionReason::ParentTimeout, now, &mut transition);
                Some(transition)
            },
            ParentInput::Cancel => {
                if self.is_done() {
                    return None;
                }
                let mut transition = Transition::default();
                self.finish(CompletionReason::Canceled, now, &mut transition);
                Some(transition)
            },
        }
    }

    fn on_report(&mut self, report: ExecutionReport, now: DateTime<Utc>) -> Option<Transition> {
        let index = self
            .children
            .iter()
            .position(|c| c.client_order_id == report.client_order_id)?;

        let mut transition = Transition::default();

        // Totals are computed before anything is touched so that a fill the
        // decimal range cannot hold is dropped as a whole.
        let mut increment = None;
        if report.has_fill() {
            let child = &self.children[index];
            let key = FillKey::of(&report);

            if child.has_seen(&key) {
                tracing::debug!(
                    "Duplicate fill of {} @ {} for child {} ignored",
                    report.last_qty,
                    report.last_px,
                    child.client_order_id
                );
            } else {
                let totals = (
                    child.cum_base.checked_add(report.last_qty),
                    self.cum_base.checked_add(report.last_qty),
                    self.cum_quote.checked_add(report.fill_notional()),
                );
                match totals {
                    (Some(child_base), Some(cum_base), Some(cum_quote)) => {
                        increment = Some((key, child_base, cum_base, cum_quote));
                    },
                    _ => {
                        tracing::warn!(
                            "Fill of {} @ {} for child {} overflows cumulative totals, dropped",
                            report.last_qty,
                            report.last_px,
                            child.client_order_id
                        );
                        return None;
                    },
                }
            }
        }

        {
            let child = &mut self.children[index];

            if let Some(venue_order_id) = &report.venue_order_id {
                child.venue_order_id = Some(venue_order_id.clone());
            }

            if !child.status.can_transition_to(report.status) {
                tracing::debug!(
                    "Out-of-order status for child {}: {:?} -> {:?}",
                    child.client_order_id,
                    child.status,
                    report.status
                );
            }
            child.status = report.status;

            if report.status == OrdStatus::Replaced && report.last_px > Decimal::ZERO {
                child.price = report.last_px;
            }

            if let Some((key, child_base, _, _)) = &increment {
                child.record_fill(key.clone());
                child.cum_base = *child_base;
            }
        }

        if let Some((_, _, cum_base, cum_quote)) = increment {
            self.cum_base = cum_base;
            self.cum_quote = cum_quote;
            transition.events.push(FlatEvent::ChildExecuted {
                order_id: self.id,
                client_order_id: report.client_order_id.clone(),
                last_qty: report.last_qty,
                last_px: report.last_px,
                timestamp: now,
            });
        }

        if self.is_done() {
            return Some(transition);
        }

        if self.cum_base > Decimal::ZERO {
            self.status = OrdStatus::PartiallyFilled;
        }

        if self.target_met() {
            self.finish(CompletionReason::TargetMet, now, &mut transition);
        } else if self.all_terminal() {
            self.finish(CompletionReason::ChildrenExhausted, now, &mut transition);
        }

        Some(transition)
    }

    fn on_ack_timeout(&mut self, child_id: &ClientOrderId) -> Option<Transition> {
        if self.is_done() {
            return None;
        }

        let child = self.child(child_id)?;
        if child.status != OrdStatus::PendingNew {
            return None;
        }

        let mut transition = Transition::default();
        transition
            .commands
            .push(Command::CancelChild(child.client_order_id.clone()));
        Some(transition)
    }

    fn finish(&mut self, reason: CompletionReason, now: DateTime<Utc>, transition: &mut Transition) {
        // Children that never reached the venue have nothing to cancel
        for child in self
            .children
            .iter()
            .filter(|c| c.status.is_live() && c.submit_ts.is_some())
        {
            transition
                .commands
                .push(Command::CancelChild(child.client_order_id.clone()));
        }

        self.status = match reason {
            CompletionReason::Canceled => OrdStatus::Canceled,
            _ if self.target_met() => OrdStatus::Filled,
            _ => OrdStatus::Expired,
        };

        let realized_vwap = self.realized_vwap();
        self.completion = Some(Completion {
            reason,
            realized_vwap,
            completed_at: now,
        });

        transition.events.push(FlatEvent::Completed {
            order_id: self.id,
            status: self.status,
            reason,
            cum_base: self.cum_base,
            cum_quote: self.cum_quote,
            realized_vwap,
            timestamp: now,
        });
    }
}
