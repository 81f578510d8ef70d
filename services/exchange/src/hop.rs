//! Hop execution
//!
//! A hop converts one asset into another through one or more marking
//! buckets of the same pair and quoter. Multi-bucket hops split the input by
//! leg weight and price every bucket in a single batch quote. Each pool's
//! inventory moves by exactly the amounts the hop traded.

use crate::error::{check_pair, to_delta, ExchangeError, Result};
use crate::state::PoolBook;
use meridian_amm::{BatchQuoteRequest, QuoteRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use types::{AssetId, Marking, PoolId, PoolKey, QuoterRef};

/// One marking bucket of a hop and its share of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopLeg {
    pub marking: Marking,
    pub weight: u64,
}

impl HopLeg {
    pub fn new(marking: Marking, weight: u64) -> Self {
        Self { marking, weight }
    }
}

/// Conversion step between two assets through one pool family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub asset0: AssetId,
    pub asset1: AssetId,
    pub quoter: QuoterRef,
    /// `true` when asset0 is sold for asset1
    pub zero_for_one: bool,
    pub legs: Vec<HopLeg>,
}

impl Hop {
    pub fn new(asset_in: AssetId, asset_out: AssetId, quoter: QuoterRef, legs: Vec<HopLeg>) -> Self {
        let zero_for_one = asset_in <= asset_out;
        let (asset0, asset1) = if zero_for_one {
            (asset_in, asset_out)
        } else {
            (asset_out, asset_in)
        };
        Self {
            asset0,
            asset1,
            quoter,
            zero_for_one,
            legs,
        }
    }

    /// Hop through a single bucket
    pub fn single(asset_in: AssetId, asset_out: AssetId, quoter: QuoterRef, marking: Marking) -> Self {
        Self::new(asset_in, asset_out, quoter, vec![HopLeg::new(marking, 1)])
    }

    pub fn asset_in(&self) -> AssetId {
        if self.zero_for_one {
            self.asset0
        } else {
            self.asset1
        }
    }

    pub fn asset_out(&self) -> AssetId {
        if self.zero_for_one {
            self.asset1
        } else {
            self.asset0
        }
    }

    pub fn is_batched(&self) -> bool {
        self.legs.len() > 1
    }

    pub fn key(&self, marking: Marking) -> PoolKey {
        PoolKey {
            asset0: self.asset0,
            asset1: self.asset1,
            quoter: self.quoter,
            marking,
        }
    }

    pub fn pool_id(&self, marking: Marking) -> PoolId {
        self.key(marking).id()
    }

    /// First marking that more than one leg routes through
    fn duplicate_marking(&self) -> Option<Marking> {
        self.legs
            .iter()
            .enumerate()
            .find(|(i, leg)| self.legs[..*i].iter().any(|prior| prior.marking == leg.marking))
            .map(|(_, leg)| leg.marking)
    }

    /// Input share per leg: floor by weight, remainder to the last leg
    pub fn split(&self, amount_in: u128) -> Result<Vec<u128>> {
        if self.legs.is_empty() {
            return Err(ExchangeError::EmptyHop {
                asset_in: self.asset_in(),
                asset_out: self.asset_out(),
            });
        }
        if let Some(marking) = self.duplicate_marking() {
            return Err(ExchangeError::DuplicateLeg {
                asset_in: self.asset_in(),
                asset_out: self.asset_out(),
                marking,
            });
        }
        if self.legs.len() == 1 {
            return Ok(vec![amount_in]);
        }

        let total: u128 = self.legs.iter().map(|leg| leg.weight as u128).sum();
        if total == 0 {
            return Err(ExchangeError::InvalidLegWeights {
                asset_in: self.asset_in(),
                asset_out: self.asset_out(),
            });
        }

        let mut shares = Vec::with_capacity(self.legs.len());
        let mut assigned = 0u128;
        for leg in &self.legs[..self.legs.len() - 1] {
            let share = crate::error::mul_div(amount_in, leg.weight as u128, total)?;
            assigned += share;
            shares.push(share);
        }
        shares.push(amount_in - assigned);
        Ok(shares)
    }
}

/// Amounts one bucket traded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegFill {
    pub pool_id: PoolId,
    pub amount_in: u128,
    pub amount_out: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopOutcome {
    pub amount_out: u128,
    pub legs: Vec<LegFill>,
}

pub struct HopExecutor<'a> {
    book: &'a mut PoolBook,
}

impl<'a> HopExecutor<'a> {
    pub fn new(book: &'a mut PoolBook) -> Self {
        Self { book }
    }

    pub fn execute(&mut self, hop: &Hop, amount_in: u128) -> Result<HopOutcome> {
        check_pair(hop.asset0, hop.asset1)?;
        let shares = hop.split(amount_in)?;
        let pool_ids: Vec<PoolId> = hop.legs.iter().map(|leg| hop.pool_id(leg.marking)).collect();
        for pool_id in &pool_ids {
            self.book.require_pool(*pool_id)?;
        }

        let amounts_out = if hop.is_batched() {
            self.quote_batch(hop, &shares, &pool_ids)?
        } else {
            vec![self.quote_single(hop, shares[0], &pool_ids[0])?]
        };

        let mut outcome = HopOutcome {
            amount_out: 0,
            legs: Vec::with_capacity(hop.legs.len()),
        };
        for ((pool_id, share), out) in pool_ids.into_iter().zip(shares).zip(amounts_out) {
            self.apply_fill(hop, pool_id, share, out)?;
            outcome.amount_out = outcome
                .amount_out
                .checked_add(out)
                .ok_or(ExchangeError::ArithmeticOverflow {
                    context: "summing hop output",
                })?;
            outcome.legs.push(LegFill {
                pool_id,
                amount_in: share,
                amount_out: out,
            });
        }

        debug!(
            asset_in = %hop.asset_in(),
            asset_out = %hop.asset_out(),
            amount_in,
            amount_out = outcome.amount_out,
            legs = outcome.legs.len(),
            "hop executed"
        );
        Ok(outcome)
    }

    fn quote_single(&self, hop: &Hop, amount_in: u128, pool_id: &PoolId) -> Result<u128> {
        let inventory = self.book.inventory(pool_id);
        let request = QuoteRequest {
            asset0: hop.asset0,
            asset1: hop.asset1,
            marking: hop.legs[0].marking,
            amount_in,
            zero_for_one: hop.zero_for_one,
            reserve0: inventory.reserve0,
            reserve1: inventory.reserve1,
        };
        Ok(self.book.quoter(hop.quoter)?.quote(&request)?)
    }

    fn quote_batch(&self, hop: &Hop, shares: &[u128], pool_ids: &[PoolId]) -> Result<Vec<u128>> {
        let inventories: Vec<_> = pool_ids.iter().map(|id| self.book.inventory(id)).collect();
        let request = BatchQuoteRequest {
            asset0: hop.asset0,
            asset1: hop.asset1,
            quoter: hop.quoter,
            markings: hop.legs.iter().map(|leg| leg.marking).collect(),
            amounts_in: shares.to_vec(),
            zero_for_one: hop.zero_for_one,
            reserves0: inventories.iter().map(|inv| inv.reserve0).collect(),
            reserves1: inventories.iter().map(|inv| inv.reserve1).collect(),
        };

        let quote = self.book.quoter(hop.quoter)?.quote_batch(&request)?;
        if quote.amounts_out.len() != pool_ids.len() || quote.pool_ids.len() != pool_ids.len() {
            return Err(ExchangeError::QuoterResponseMismatch {
                reason: format!(
                    "expected {} entries, got {} amounts and {} pool ids",
                    pool_ids.len(),
                    quote.amounts_out.len(),
                    quote.pool_ids.len()
                ),
            });
        }
        if let Some(index) = quote.pool_ids.iter().zip(pool_ids).position(|(got, want)| got != want) {
            return Err(ExchangeError::QuoterResponseMismatch {
                reason: format!("pool id at index {index} does not match the requested bucket"),
            });
        }
        trace!(buckets = pool_ids.len(), "batch quote accepted");
        Ok(quote.amounts_out)
    }

    fn apply_fill(&mut self, hop: &Hop, pool_id: PoolId, amount_in: u128, amount_out: u128) -> Result<()> {
        let inventory = self.book.inventory(&pool_id);
        let (_, reserve_out) = inventory.directed(hop.zero_for_one);
        if amount_out > reserve_out {
            return Err(ExchangeError::InsufficientLiquidity {
                pool: pool_id,
                asset: hop.asset_out(),
                required: amount_out,
                available: reserve_out,
            });
        }

        let delta_in = to_delta(amount_in)?;
        let delta_out = -to_delta(amount_out)?;
        let (delta0, delta1) = if hop.zero_for_one {
            (delta_in, delta_out)
        } else {
            (delta_out, delta_in)
        };
        self.book.update_inventory(pool_id, delta0, delta1)?;
        Ok(())
    }
}
