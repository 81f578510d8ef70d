//! Pool book: registry, inventory, total liquidity and the event log
//!
//! Every mutable piece is journaled so one checkpoint covers the whole book.

use crate::error::{check_pair, ExchangeError, Result};
use crate::events::ExchangeEvent;
use crate::inventory::{InventoryStore, PoolInventory};
use crate::journal::Journaled;
use meridian_amm::Quoter;
use meridian_config::LimitsConfig;
use std::collections::HashMap;
use std::sync::Arc;
use types::{PoolId, PoolKey, QuoterRef};

/// Position in every journal at the start of an atomic call
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    pools: usize,
    inventory: usize,
    liquidity: usize,
    events: usize,
    transfers: usize,
}

pub struct PoolBook {
    pools: Journaled<PoolId, PoolKey>,
    inventory: InventoryStore,
    liquidity: Journaled<PoolId, u128>,
    /// Append-only until drained; checkpoints index into it
    events: Vec<ExchangeEvent>,
    quoters: HashMap<QuoterRef, Arc<dyn Quoter>>,
    limits: LimitsConfig,
    depth: usize,
}

impl PoolBook {
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            pools: Journaled::default(),
            inventory: InventoryStore::new(limits.reserve_cap()),
            liquidity: Journaled::default(),
            events: Vec::new(),
            quoters: HashMap::new(),
            limits,
            depth: 0,
        }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub fn register_quoter(&mut self, quoter_ref: QuoterRef, quoter: Arc<dyn Quoter>) {
        self.quoters.insert(quoter_ref, quoter);
    }

    pub fn quoter(&self, quoter_ref: QuoterRef) -> Result<&Arc<dyn Quoter>> {
        self.quoters
            .get(&quoter_ref)
            .ok_or(ExchangeError::UnknownQuoter(quoter_ref))
    }

    pub fn pool(&self, pool_id: &PoolId) -> Option<&PoolKey> {
        self.pools.get(pool_id)
    }

    pub fn require_pool(&self, pool_id: PoolId) -> Result<&PoolKey> {
        self.pools.get(&pool_id).ok_or(ExchangeError::PoolNotFound(pool_id))
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn pools(&self) -> impl Iterator<Item = (&PoolId, &PoolKey)> {
        self.pools.iter()
    }

    /// Register pool metadata; the key is written once and never changes
    pub fn insert_pool(&mut self, key: PoolKey) -> Result<PoolId> {
        check_pair(key.asset0, key.asset1)?;
        self.quoter(key.quoter)?;
        let pool_id = key.id();
        if self.pools.contains(&pool_id) {
            return Err(ExchangeError::PoolAlreadyExists(pool_id));
        }
        self.pools.insert(pool_id, key);
        Ok(pool_id)
    }

    pub fn inventory(&self, pool_id: &PoolId) -> PoolInventory {
        self.inventory.get(pool_id)
    }

    pub fn update_inventory(&mut self, pool_id: PoolId, delta0: i128, delta1: i128) -> Result<PoolInventory> {
        self.inventory.update(pool_id, delta0, delta1)
    }

    pub fn total_liquidity(&self, pool_id: &PoolId) -> u128 {
        self.liquidity.get(pool_id).copied().unwrap_or(0)
    }

    pub(crate) fn set_total_liquidity(&mut self, pool_id: PoolId, total: u128) {
        self.liquidity.insert(pool_id, total);
    }

    /// Events emitted since the last [`take_events`](Self::take_events).
    /// The log is unbounded; long-running callers drain it after each call.
    pub fn events(&self) -> &[ExchangeEvent] {
        &self.events
    }

    pub(crate) fn emit(&mut self, event: ExchangeEvent) {
        self.events.push(event);
    }

    /// Drain the event log
    pub fn take_events(&mut self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn begin(&mut self, transfers: usize) -> Checkpoint {
        self.depth += 1;
        Checkpoint {
            pools: self.pools.checkpoint(),
            inventory: self.inventory.checkpoint(),
            liquidity: self.liquidity.checkpoint(),
            events: self.events.len(),
            transfers,
        }
    }

    pub(crate) fn commit(&mut self, _checkpoint: Checkpoint) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.pools.discard_journal();
            self.inventory.discard_journal();
            self.liquidity.discard_journal();
        }
    }

    /// Roll every journal back; returns the transfer checkpoint to restore
    pub(crate) fn revert(&mut self, checkpoint: Checkpoint) -> usize {
        self.depth = self.depth.saturating_sub(1);
        self.pools.revert_to(checkpoint.pools);
        self.inventory.revert_to(checkpoint.inventory);
        self.liquidity.revert_to(checkpoint.liquidity);
        self.events.truncate(checkpoint.events);
        checkpoint.transfers
    }
}
