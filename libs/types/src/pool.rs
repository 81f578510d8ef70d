//! Canonical pool keys
//!
//! A [`PoolKey`] is the immutable metadata recorded once per pool: the
//! ordered asset pair, the quoter and the marking. A [`PoolFamily`] is the
//! same thing without the marking, i.e. every bucket of one pair/quoter.

use crate::identifiers::{AssetId, PoolId, QuoterRef};
use crate::marking::Marking;
use serde::{Deserialize, Serialize};

/// Immutable pool metadata with `asset0 <= asset1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub asset0: AssetId,
    pub asset1: AssetId,
    pub quoter: QuoterRef,
    pub marking: Marking,
}

impl PoolKey {
    /// Build a key, sorting the assets into canonical order
    pub fn new(asset_a: AssetId, asset_b: AssetId, quoter: QuoterRef, marking: Marking) -> Self {
        let (asset0, asset1) = sort_pair(asset_a, asset_b);
        Self {
            asset0,
            asset1,
            quoter,
            marking,
        }
    }

    pub fn id(&self) -> PoolId {
        PoolId::assemble(self.asset0, self.asset1, self.quoter, self.marking)
    }

    pub fn family(&self) -> PoolFamily {
        PoolFamily {
            asset0: self.asset0,
            asset1: self.asset1,
            quoter: self.quoter,
        }
    }
}

/// Pair + quoter shared by every marking bucket of a pool family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolFamily {
    pub asset0: AssetId,
    pub asset1: AssetId,
    pub quoter: QuoterRef,
}

impl PoolFamily {
    pub fn new(asset_a: AssetId, asset_b: AssetId, quoter: QuoterRef) -> Self {
        let (asset0, asset1) = sort_pair(asset_a, asset_b);
        Self {
            asset0,
            asset1,
            quoter,
        }
    }

    pub fn key(&self, marking: Marking) -> PoolKey {
        PoolKey {
            asset0: self.asset0,
            asset1: self.asset1,
            quoter: self.quoter,
            marking,
        }
    }
}

#[inline]
fn sort_pair(a: AssetId, b: AssetId) -> (AssetId, AssetId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
