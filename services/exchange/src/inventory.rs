//! Pool inventory store
//!
//! Both reserves of a pool are read and written together. Updates apply
//! signed deltas and fail instead of wrapping when a reserve would go
//! negative or past the configured cap.

use crate::error::{ExchangeError, Result};
use crate::journal::Journaled;
use serde::{Deserialize, Serialize};
use types::PoolId;

/// Reserve pair of one pool in canonical (asset0, asset1) order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInventory {
    pub reserve0: u128,
    pub reserve1: u128,
}

impl PoolInventory {
    pub const fn new(reserve0: u128, reserve1: u128) -> Self {
        Self { reserve0, reserve1 }
    }

    /// (reserve_in, reserve_out) for a trade direction
    pub fn directed(&self, zero_for_one: bool) -> (u128, u128) {
        if zero_for_one {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reserve0 == 0 && self.reserve1 == 0
    }
}

#[derive(Debug)]
pub struct InventoryStore {
    reserves: Journaled<PoolId, PoolInventory>,
    reserve_cap: u128,
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self::new(u128::MAX)
    }
}

impl InventoryStore {
    pub fn new(reserve_cap: u128) -> Self {
        Self {
            reserves: Journaled::default(),
            reserve_cap,
        }
    }

    pub fn reserve_cap(&self) -> u128 {
        self.reserve_cap
    }

    /// Current reserves; an untouched pool reads as empty
    pub fn get(&self, pool_id: &PoolId) -> PoolInventory {
        self.reserves.get(pool_id).copied().unwrap_or_default()
    }

    /// Apply signed deltas to both reserves in one step
    pub fn update(&mut self, pool_id: PoolId, delta0: i128, delta1: i128) -> Result<PoolInventory> {
        let current = self.get(&pool_id);
        if delta0 == 0 && delta1 == 0 {
            return Ok(current);
        }

        let updated = PoolInventory {
            reserve0: self.apply(pool_id, 0, current.reserve0, delta0)?,
            reserve1: self.apply(pool_id, 1, current.reserve1, delta1)?,
        };
        if updated != current {
            self.reserves.insert(pool_id, updated);
        }
        Ok(updated)
    }

    fn apply(&self, pool: PoolId, side: u8, reserve: u128, delta: i128) -> Result<u128> {
        if delta >= 0 {
            reserve
                .checked_add(delta.unsigned_abs())
                .filter(|value| *value <= self.reserve_cap)
                .ok_or(ExchangeError::ReserveOverflow {
                    pool,
                    side,
                    reserve,
                    delta,
                    cap: self.reserve_cap,
                })
        } else {
            reserve
                .checked_sub(delta.unsigned_abs())
                .ok_or(ExchangeError::ReserveUnderflow {
                    pool,
                    side,
                    reserve,
                    delta,
                })
        }
    }

    pub(crate) fn checkpoint(&self) -> usize {
        self.reserves.checkpoint()
    }

    pub(crate) fn revert_to(&mut self, checkpoint: usize) {
        self.reserves.revert_to(checkpoint);
    }

    pub(crate) fn discard_journal(&mut self) {
        self.reserves.discard_journal();
    }
}
