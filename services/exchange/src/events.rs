//! Exchange event log
//!
//! Events are appended as operations commit and dropped again when the
//! enclosing call reverts.

use serde::{Deserialize, Serialize};
use types::{AccountId, AssetId, PoolId, PoolKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangeEvent {
    PoolCreated {
        pool_id: PoolId,
        key: PoolKey,
    },
    LiquidityAdded {
        pool_id: PoolId,
        provider: AccountId,
        amount0: u128,
        amount1: u128,
        liquidity: u128,
    },
    LiquidityRemoved {
        pool_id: PoolId,
        provider: AccountId,
        amount0: u128,
        amount1: u128,
        liquidity: u128,
    },
    Swapped {
        recipient: AccountId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: u128,
        amount_out: u128,
        hops: usize,
    },
    PoolCreationFailed {
        index: usize,
        pool_id: PoolId,
        reason: String,
    },
    BatchPoolsCreated {
        created: usize,
        skipped: usize,
        failed: usize,
    },
    SessionSettled {
        owner: AccountId,
        transfers: usize,
    },
}

impl ExchangeEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
