//! Liquidity accounting and batch operations through the public API

mod common;

use common::{Market, FEE_30, FEE_5, SEED};
use meridian_amm::ConstantProductQuoter;
use meridian_exchange::{
    CreationStatus, Exchange, ExchangeError, ExchangeEvent, LiquidityDeposit, LiquidityWithdrawal, TransferLog,
};
use proptest::prelude::*;
use std::sync::Arc;
use types::{AccountId, AssetId, Marking, PoolKey, QuoterRef};

fn fresh_exchange() -> (Exchange<TransferLog>, PoolKey) {
    let mut exchange = Exchange::new(TransferLog::new());
    let quoter = QuoterRef::from_low_u64_be(3);
    exchange.register_quoter(quoter, Arc::new(ConstantProductQuoter::new()));
    let key = PoolKey::new(
        AssetId::from_low_u64_be(100),
        AssetId::from_low_u64_be(200),
        quoter,
        Marking::from_bits(FEE_30),
    );
    exchange.create_pool(key).unwrap();
    (exchange, key)
}

#[test_log::test]
fn test_first_deposit_sets_reserves_and_supply() {
    let (mut exchange, key) = fresh_exchange();
    let provider = AccountId::from_low_u64_be(1);

    let minted = exchange.add_liquidity(provider, &key, 3_000, 7_000).unwrap();

    assert_eq!(minted, 10_000);
    let inventory = exchange.inventory(&key.id());
    assert_eq!((inventory.reserve0, inventory.reserve1), (3_000, 7_000));
    assert_eq!(exchange.total_liquidity(&key.id()), 10_000);
}

#[test_log::test]
fn test_remove_all_liquidity_empties_pool() {
    let (mut exchange, key) = fresh_exchange();
    let provider = AccountId::from_low_u64_be(1);
    exchange.add_liquidity(provider, &key, 3_000, 7_000).unwrap();

    let withdrawn = exchange.remove_liquidity(provider, &key, 10_000).unwrap();

    assert_eq!((withdrawn.amount0, withdrawn.amount1), (3_000, 7_000));
    assert!(exchange.inventory(&key.id()).is_empty());
    assert_eq!(exchange.total_liquidity(&key.id()), 0);
    assert_eq!(exchange.transfer().net_flow(provider, key.asset0), 0);

    assert!(matches!(
        exchange.remove_liquidity(provider, &key, 1),
        Err(ExchangeError::InsufficientTotalLiquidity { total: 0, .. })
    ));
}

#[test_log::test]
fn test_batch_add_across_buckets() {
    let mut m = Market::new();
    let (a, b, lp) = (m.a, m.b, m.lp);
    m.exchange.create_pool(m.key(a, b, FEE_5)).unwrap();
    let family = m.family(a, b);
    let before = m.exchange.transfer().len();

    let minted = m
        .exchange
        .batch_add_liquidity(
            lp,
            family,
            &[
                LiquidityDeposit {
                    marking: Marking::from_bits(FEE_30),
                    amount0: 1_000,
                    amount1: 1_000,
                },
                LiquidityDeposit {
                    marking: Marking::from_bits(FEE_5),
                    amount0: 500,
                    amount1: 1_500,
                },
            ],
        )
        .unwrap();

    // Existing 1:1 pool with supply 2*SEED, then a first deposit
    assert_eq!(minted, vec![2_000, 2_000]);
    // One collection per asset for the whole batch
    assert_eq!(m.exchange.transfer().len() - before, 2);
    assert_eq!(
        m.exchange.transfer().transfers()[before..]
            .iter()
            .map(|t| t.asset())
            .collect::<Vec<_>>(),
        vec![a, b]
    );
}

#[test_log::test]
fn test_batch_remove_is_all_or_nothing() {
    let mut m = Market::new();
    let (a, b, lp) = (m.a, m.b, m.lp);
    m.seed_pool(a, b, FEE_5, 10_000, 10_000);
    let family = m.family(a, b);
    let fee30 = m.key(a, b, FEE_30).id();
    let before = m.exchange.inventory(&fee30);

    let err = m
        .exchange
        .batch_remove_liquidity(
            lp,
            family,
            &[
                LiquidityWithdrawal {
                    marking: Marking::from_bits(FEE_30),
                    liquidity: SEED,
                },
                LiquidityWithdrawal {
                    marking: Marking::from_bits(FEE_5),
                    liquidity: 20_001,
                },
            ],
        )
        .unwrap_err();

    assert!(matches!(err, ExchangeError::InsufficientTotalLiquidity { requested: 20_001, .. }));
    assert_eq!(m.exchange.inventory(&fee30), before);
    assert_eq!(m.exchange.total_liquidity(&fee30), 2 * SEED);
}

#[test_log::test]
fn test_batch_create_reports_each_entry() {
    let mut m = Market::new();
    let (a, b, c) = (m.a, m.b, m.c);
    m.exchange.take_events();
    let keys = [
        m.key(a, c, FEE_30),
        m.key(a, b, FEE_30),
        m.key(a, c, FEE_5),
    ];

    let report = m.exchange.batch_create_pools(&keys, true).unwrap();
    assert_eq!(report.created(), 2);
    assert_eq!(report.outcomes[1].status, CreationStatus::Skipped);

    let strict = [m.key(b, c, FEE_5), m.key(a, b, FEE_30), m.key(b, b, FEE_30)];
    let report = m.exchange.batch_create_pools(&strict, false).unwrap();
    assert_eq!((report.created(), report.skipped(), report.failed()), (1, 0, 2));

    let events = m.exchange.take_events();
    let failures: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ExchangeEvent::PoolCreationFailed { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![1, 2]);
    assert!(matches!(
        events.last(),
        Some(ExchangeEvent::BatchPoolsCreated {
            created: 1,
            skipped: 0,
            failed: 2
        })
    ));
    assert_eq!(m.exchange.pool_count(), 5);
}

#[test_log::test]
fn test_rebalance_moves_liquidity_between_buckets() {
    let mut m = Market::new();
    let (a, b, lp) = (m.a, m.b, m.lp);
    let fee5 = m.key(a, b, FEE_5);
    m.exchange.create_pool(fee5).unwrap();
    let family = m.family(a, b);
    let before = m.exchange.transfer().len();

    let report = m
        .exchange
        .batch_rebalance(
            lp,
            family,
            &[LiquidityWithdrawal {
                marking: Marking::from_bits(FEE_30),
                liquidity: 200_000,
            }],
            &[LiquidityDeposit {
                marking: Marking::from_bits(FEE_5),
                amount0: 100_000,
                amount1: 100_000,
            }],
        )
        .unwrap();

    assert_eq!(report.withdrawn[0].amount0, 100_000);
    assert_eq!(report.minted, vec![200_000]);
    // Withdrawn amounts fund the deposit exactly: nothing to transfer
    assert_eq!(report.transfers, 0);
    assert_eq!(m.exchange.transfer().len(), before);
    assert_eq!(m.exchange.inventory(&fee5.id()).reserve0, 100_000);
}

#[test_log::test]
fn test_batch_preconditions() {
    let mut m = Market::new();
    let family = m.family(m.a, m.b);
    assert!(matches!(
        m.exchange.batch_add_liquidity(m.lp, family, &[]),
        Err(ExchangeError::EmptyBatch)
    ));

    let deposits = vec![
        LiquidityDeposit {
            marking: Marking::from_bits(FEE_30),
            amount0: 1,
            amount1: 1,
        };
        257
    ];
    assert!(matches!(
        m.exchange.batch_add_liquidity(m.lp, family, &deposits),
        Err(ExchangeError::BatchTooLarge { len: 257, .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_add_then_remove_returns_deposit(
        seed0 in 1_000u128..1_000_000_000,
        seed1 in 1_000u128..1_000_000_000,
        scale in 1u128..1_000,
    ) {
        let (mut exchange, key) = fresh_exchange();
        let founder = AccountId::from_low_u64_be(1);
        let provider = AccountId::from_low_u64_be(2);
        exchange.add_liquidity(founder, &key, seed0, seed1).unwrap();

        // Deposit at the pool ratio
        let amount0 = seed0 * scale;
        let amount1 = seed1 * scale;
        let minted = exchange.add_liquidity(provider, &key, amount0, amount1).unwrap();
        let withdrawn = exchange.remove_liquidity(provider, &key, minted).unwrap();

        prop_assert!(withdrawn.amount0 <= amount0);
        prop_assert!(withdrawn.amount1 <= amount1);
        // Floors lose at most one unit per side relative to the pool ratio
        prop_assert!(amount0 - withdrawn.amount0 <= 1);
        prop_assert!(amount1 - withdrawn.amount1 <= 1);
    }

    #[test]
    fn prop_exact_ratio_mint_is_proportional(
        seed in 1u128..1_000_000,
        ratio in 1u128..100,
        scale in 1u128..100,
    ) {
        let (mut exchange, key) = fresh_exchange();
        let founder = AccountId::from_low_u64_be(1);
        exchange.add_liquidity(founder, &key, seed, seed * ratio).unwrap();
        let supply = exchange.total_liquidity(&key.id());

        let minted = exchange
            .add_liquidity(founder, &key, seed * scale, seed * ratio * scale)
            .unwrap();

        prop_assert_eq!(minted, supply * scale);
    }
}
