//! Shared market fixture for integration tests

#![allow(dead_code)]

use meridian_amm::ConstantProductQuoter;
use meridian_exchange::{Exchange, Hop, TransferLog};
use std::sync::Arc;
use types::{AccountId, AssetId, Marking, PoolFamily, PoolKey, QuoterRef};

/// 30 bps bucket with spot-price data
pub const FEE_30: u32 = 0x1e1;
/// 5 bps bucket with spot-price data
pub const FEE_5: u32 = 0x051;

pub const SEED: u128 = 1_000_000;

pub struct Market {
    pub exchange: Exchange<TransferLog>,
    pub quoter: QuoterRef,
    pub a: AssetId,
    pub b: AssetId,
    pub c: AssetId,
    pub lp: AccountId,
    pub trader: AccountId,
}

impl Market {
    /// A/B and B/C pools in the 30 bps bucket, seeded 1:1
    pub fn new() -> Self {
        let mut exchange = Exchange::new(TransferLog::new());
        let quoter = QuoterRef::from_low_u64_be(0x51);
        exchange.register_quoter(quoter, Arc::new(ConstantProductQuoter::new()));

        let mut market = Self {
            exchange,
            quoter,
            a: AssetId::from_low_u64_be(0xa),
            b: AssetId::from_low_u64_be(0xb),
            c: AssetId::from_low_u64_be(0xc),
            lp: AccountId::from_low_u64_be(0x1001),
            trader: AccountId::from_low_u64_be(0x2002),
        };
        let (a, b, c) = (market.a, market.b, market.c);
        market.seed_pool(a, b, FEE_30, SEED, SEED);
        market.seed_pool(b, c, FEE_30, SEED, SEED);
        market
    }

    pub fn key(&self, x: AssetId, y: AssetId, marking: u32) -> PoolKey {
        PoolKey::new(x, y, self.quoter, Marking::from_bits(marking))
    }

    pub fn family(&self, x: AssetId, y: AssetId) -> PoolFamily {
        PoolFamily::new(x, y, self.quoter)
    }

    pub fn hop(&self, from: AssetId, to: AssetId) -> Hop {
        Hop::single(from, to, self.quoter, Marking::from_bits(FEE_30))
    }

    pub fn seed_pool(&mut self, x: AssetId, y: AssetId, marking: u32, amount0: u128, amount1: u128) -> PoolKey {
        let key = self.key(x, y, marking);
        self.exchange.create_pool(key).expect("pool created");
        self.exchange
            .add_liquidity(self.lp, &key, amount0, amount1)
            .expect("pool seeded");
        key
    }
}
