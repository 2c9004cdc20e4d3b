// ============================================================================
// In-Memory Adapters
// Parent order store and static market depth backed by process memory
// ============================================================================

use crate::domain::{FlatOrderAggregate, OrderBookSnapshot, ParentOrderId, Symbol, SymbolRule};
use crate::error::StoreError;
use crate::interfaces::{MarketDepthProvider, ParentOrderStore};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Parent store holding aggregates in a map. Loads return owned copies.
#[derive(Default)]
pub struct InMemoryParentOrderStore {
    parents: RwLock<HashMap<ParentOrderId, FlatOrderAggregate>>,
}

impl InMemoryParentOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.read().is_empty()
    }
}

impl ParentOrderStore for InMemoryParentOrderStore {
    fn save(&self, parent: &FlatOrderAggregate) -> Result<(), StoreError> {
        let mut parents = self.parents.write();
        if parents.contains_key(&parent.id) {
            return Err(StoreError::Duplicate(parent.id));
        }
        parents.insert(parent.id, parent.clone());
        Ok(())
    }

    fn load(&self, id: &ParentOrderId) -> Option<FlatOrderAggregate> {
        self.parents.read().get(id).cloned()
    }

    fn update(&self, parent: &FlatOrderAggregate) -> Result<(), StoreError> {
        match self.parents.write().get_mut(&parent.id) {
            Some(stored) => {
                *stored = parent.clone();
                Ok(())
            },
            None => Err(StoreError::Missing(parent.id)),
        }
    }
}

/// Market depth that serves whatever was last published per symbol
#[derive(Default)]
pub struct StaticMarketDepth {
    books: RwLock<HashMap<Symbol, OrderBookSnapshot>>,
    rules: RwLock<HashMap<Symbol, SymbolRule>>,
}

impl StaticMarketDepth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for a symbol
    pub fn publish(&self, symbol: Symbol, book: OrderBookSnapshot) {
        self.books.write().insert(symbol, book);
    }

    /// Replace the rule for a symbol
    pub fn set_rule(&self, symbol: Symbol, rule: SymbolRule) {
        self.rules.write().insert(symbol, rule);
    }

    /// Builder method: Register a symbol with its rule and book
    pub fn with_symbol(self, symbol: Symbol, rule: SymbolRule, book: OrderBookSnapshot) -> Self {
        self.set_rule(symbol.clone(), rule);
        self.publish(symbol, book);
        self
    }
}

impl MarketDepthProvider for StaticMarketDepth {
    fn latest(&self, symbol: &Symbol) -> Option<OrderBookSnapshot> {
        self.books.read().get(symbol).cloned()
    }

    fn rule_of(&self, symbol: &Symbol) -> Option<SymbolRule> {
        self.rules.read().get(symbol).copied()
    }
}
