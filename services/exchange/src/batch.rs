//! Liquidity primitives and batch operations
//!
//! Single-entry add/remove mint and burn against one pool. The batch forms
//! apply many entries of one pool family and write one ledger entry per
//! asset for the whole batch. Pool creation batches are the only partial
//! success path: each entry reports its own outcome.

use crate::error::{check_pair, mul_div, to_delta, ExchangeError, Result};
use crate::events::ExchangeEvent;
use crate::ledger::FlashLedger;
use crate::session::SessionManager;
use crate::state::PoolBook;
use crate::transfer::AssetTransfer;
use crate::{log_failure, log_liquidity, log_pool};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::{AccountId, Marking, PoolFamily, PoolId, PoolKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityDeposit {
    pub marking: Marking,
    pub amount0: u128,
    pub amount1: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityWithdrawal {
    pub marking: Marking,
    pub liquidity: u128,
}

/// Amounts released by a burn, in canonical asset order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Withdrawn {
    pub amount0: u128,
    pub amount1: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationStatus {
    Created,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCreation {
    pub pool_id: PoolId,
    pub status: CreationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchCreateReport {
    pub outcomes: Vec<PoolCreation>,
}

impl BatchCreateReport {
    pub fn created(&self) -> usize {
        self.count(|status| matches!(status, CreationStatus::Created))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, CreationStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, CreationStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&CreationStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub withdrawn: Vec<Withdrawn>,
    pub minted: Vec<u128>,
    pub transfers: usize,
}

pub struct BatchOperationsEngine<'a, T> {
    book: &'a mut PoolBook,
    sessions: &'a SessionManager,
    transfer: &'a mut T,
}

impl<'a, T: AssetTransfer> BatchOperationsEngine<'a, T> {
    pub fn new(book: &'a mut PoolBook, sessions: &'a SessionManager, transfer: &'a mut T) -> Self {
        Self {
            book,
            sessions,
            transfer,
        }
    }

    /// Deposit into one pool; returns liquidity minted. `native_value`
    /// funds a native asset0 and is rejected when settlement is deferred.
    pub fn add_liquidity(
        &mut self,
        ledger: &mut FlashLedger,
        provider: AccountId,
        key: &PoolKey,
        amounts: (u128, u128),
        native_value: u128,
    ) -> Result<u128> {
        if native_value > 0 && self.sessions.is_active(provider) {
            return Err(ExchangeError::NativeValueDeferred { value: native_value });
        }
        let (amount0, amount1) = amounts;
        let minted = self.mint_into(provider, key, amount0, amount1)?;
        ledger.record(provider, key.asset0, -to_delta(amount0)?)?;
        ledger.record(provider, key.asset1, -to_delta(amount1)?)?;
        self.settle(ledger, provider, key.family(), native_value)?;
        Ok(minted)
    }

    /// Burn liquidity from one pool; returns the released amounts
    pub fn remove_liquidity(
        &mut self,
        ledger: &mut FlashLedger,
        provider: AccountId,
        key: &PoolKey,
        liquidity: u128,
    ) -> Result<Withdrawn> {
        let withdrawn = self.burn_from(provider, key, liquidity)?;
        ledger.record(provider, key.asset0, to_delta(withdrawn.amount0)?)?;
        ledger.record(provider, key.asset1, to_delta(withdrawn.amount1)?)?;
        self.settle(ledger, provider, key.family(), 0)?;
        Ok(withdrawn)
    }

    pub fn batch_add_liquidity(
        &mut self,
        ledger: &mut FlashLedger,
        provider: AccountId,
        family: PoolFamily,
        deposits: &[LiquidityDeposit],
    ) -> Result<Vec<u128>> {
        self.check_batch(deposits.len())?;

        let mut minted = Vec::with_capacity(deposits.len());
        let (mut total0, mut total1) = (0u128, 0u128);
        for deposit in deposits {
            let key = family.key(deposit.marking);
            minted.push(self.mint_into(provider, &key, deposit.amount0, deposit.amount1)?);
            total0 = checked_sum(total0, deposit.amount0)?;
            total1 = checked_sum(total1, deposit.amount1)?;
        }

        ledger.record(provider, family.asset0, -to_delta(total0)?)?;
        ledger.record(provider, family.asset1, -to_delta(total1)?)?;
        self.settle(ledger, provider, family, 0)?;
        info!(entries = deposits.len(), total0, total1, "batch liquidity added");
        Ok(minted)
    }

    pub fn batch_remove_liquidity(
        &mut self,
        ledger: &mut FlashLedger,
        provider: AccountId,
        family: PoolFamily,
        withdrawals: &[LiquidityWithdrawal],
    ) -> Result<Vec<Withdrawn>> {
        self.check_batch(withdrawals.len())?;

        let mut released = Vec::with_capacity(withdrawals.len());
        let (mut total0, mut total1) = (0u128, 0u128);
        for withdrawal in withdrawals {
            let key = family.key(withdrawal.marking);
            let withdrawn = self.burn_from(provider, &key, withdrawal.liquidity)?;
            total0 = checked_sum(total0, withdrawn.amount0)?;
            total1 = checked_sum(total1, withdrawn.amount1)?;
            released.push(withdrawn);
        }

        ledger.record(provider, family.asset0, to_delta(total0)?)?;
        ledger.record(provider, family.asset1, to_delta(total1)?)?;
        self.settle(ledger, provider, family, 0)?;
        info!(entries = withdrawals.len(), total0, total1, "batch liquidity removed");
        Ok(released)
    }

    /// Create many pools; failures are reported per entry and never abort
    /// the batch
    pub fn batch_create_pools(&mut self, keys: &[PoolKey], skip_existing: bool) -> Result<BatchCreateReport> {
        self.check_batch(keys.len())?;

        let mut report = BatchCreateReport {
            outcomes: Vec::with_capacity(keys.len()),
        };
        for (index, key) in keys.iter().enumerate() {
            let pool_id = key.id();
            let status = match self.book.insert_pool(*key) {
                Ok(_) => {
                    self.book.emit(ExchangeEvent::PoolCreated { pool_id, key: *key });
                    CreationStatus::Created
                }
                Err(ExchangeError::PoolAlreadyExists(_)) if skip_existing => {
                    debug!(%pool_id, index, "pool exists, skipped");
                    CreationStatus::Skipped
                }
                Err(err) => {
                    let reason = err.to_string();
                    log_failure!("pool creation {} failed: {}", index, reason);
                    self.book.emit(ExchangeEvent::PoolCreationFailed {
                        index,
                        pool_id,
                        reason: reason.clone(),
                    });
                    CreationStatus::Failed(reason)
                }
            };
            report.outcomes.push(PoolCreation { pool_id, status });
        }

        let (created, skipped, failed) = (report.created(), report.skipped(), report.failed());
        self.book.emit(ExchangeEvent::BatchPoolsCreated {
            created,
            skipped,
            failed,
        });
        log_pool!("batch create: {} created, {} skipped, {} failed", created, skipped, failed);
        Ok(report)
    }

    /// All removals, then all additions, then one settlement
    pub fn batch_rebalance(
        &mut self,
        ledger: &mut FlashLedger,
        provider: AccountId,
        family: PoolFamily,
        removals: &[LiquidityWithdrawal],
        additions: &[LiquidityDeposit],
    ) -> Result<RebalanceReport> {
        let entries = removals.len() + additions.len();
        self.check_batch(entries)?;

        let mut report = RebalanceReport::default();
        for removal in removals {
            let key = family.key(removal.marking);
            let withdrawn = self.burn_from(provider, &key, removal.liquidity)?;
            ledger.record(provider, family.asset0, to_delta(withdrawn.amount0)?)?;
            ledger.record(provider, family.asset1, to_delta(withdrawn.amount1)?)?;
            report.withdrawn.push(withdrawn);
        }
        for addition in additions {
            let key = family.key(addition.marking);
            report
                .minted
                .push(self.mint_into(provider, &key, addition.amount0, addition.amount1)?);
            ledger.record(provider, family.asset0, -to_delta(addition.amount0)?)?;
            ledger.record(provider, family.asset1, -to_delta(addition.amount1)?)?;
        }

        report.transfers = self.settle(ledger, provider, family, 0)?;
        info!(
            removals = removals.len(),
            additions = additions.len(),
            transfers = report.transfers,
            "rebalanced"
        );
        Ok(report)
    }

    fn check_batch(&self, len: usize) -> Result<()> {
        if len == 0 {
            return Err(ExchangeError::EmptyBatch);
        }
        let max = self.book.limits().max_batch_size;
        if len > max {
            return Err(ExchangeError::BatchTooLarge { len, max });
        }
        Ok(())
    }

    /// Settle both assets of the family unless the provider's session defers
    /// it; the native asset always sorts first, so value funds asset0
    fn settle(
        &mut self,
        ledger: &mut FlashLedger,
        provider: AccountId,
        family: PoolFamily,
        native_value: u128,
    ) -> Result<usize> {
        if self.sessions.is_active(provider) {
            return Ok(0);
        }
        ledger.settle_pair(provider, family.asset0, family.asset1, native_value, &mut *self.transfer)
    }

    fn mint_into(&mut self, provider: AccountId, key: &PoolKey, amount0: u128, amount1: u128) -> Result<u128> {
        check_pair(key.asset0, key.asset1)?;
        let pool_id = key.id();
        self.book.require_pool(pool_id)?;
        let inventory = self.book.inventory(&pool_id);
        let total = self.book.total_liquidity(&pool_id);

        let minted = if total == 0 || inventory.is_empty() {
            checked_sum(amount0, amount1)?
        } else {
            // A side with no reserve places no bound on the mint
            let by0 = (inventory.reserve0 > 0)
                .then(|| mul_div(amount0, total, inventory.reserve0))
                .transpose()?;
            let by1 = (inventory.reserve1 > 0)
                .then(|| mul_div(amount1, total, inventory.reserve1))
                .transpose()?;
            match (by0, by1) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => 0,
            }
        };
        if minted == 0 {
            return Err(ExchangeError::ZeroLiquidityMinted { pool: pool_id });
        }

        self.book
            .update_inventory(pool_id, to_delta(amount0)?, to_delta(amount1)?)?;
        let new_total = total.checked_add(minted).ok_or(ExchangeError::ArithmeticOverflow {
            context: "minting liquidity",
        })?;
        self.book.set_total_liquidity(pool_id, new_total);
        self.book.emit(ExchangeEvent::LiquidityAdded {
            pool_id,
            provider,
            amount0,
            amount1,
            liquidity: minted,
        });
        log_liquidity!(mint, "{} minted in {} ({} / {})", minted, pool_id, amount0, amount1);
        Ok(minted)
    }

    fn burn_from(&mut self, provider: AccountId, key: &PoolKey, liquidity: u128) -> Result<Withdrawn> {
        if liquidity == 0 {
            return Err(ExchangeError::ZeroAmount);
        }
        check_pair(key.asset0, key.asset1)?;
        let pool_id = key.id();
        self.book.require_pool(pool_id)?;
        let total = self.book.total_liquidity(&pool_id);
        if liquidity > total {
            return Err(ExchangeError::InsufficientTotalLiquidity {
                pool: pool_id,
                requested: liquidity,
                total,
            });
        }

        let inventory = self.book.inventory(&pool_id);
        let withdrawn = Withdrawn {
            amount0: mul_div(liquidity, inventory.reserve0, total)?,
            amount1: mul_div(liquidity, inventory.reserve1, total)?,
        };
        self.book.update_inventory(
            pool_id,
            -to_delta(withdrawn.amount0)?,
            -to_delta(withdrawn.amount1)?,
        )?;
        self.book.set_total_liquidity(pool_id, total - liquidity);
        self.book.emit(ExchangeEvent::LiquidityRemoved {
            pool_id,
            provider,
            amount0: withdrawn.amount0,
            amount1: withdrawn.amount1,
            liquidity,
        });
        log_liquidity!(
            burn,
            "{} burned from {} ({} / {})",
            liquidity,
            pool_id,
            withdrawn.amount0,
            withdrawn.amount1
        );
        Ok(withdrawn)
    }
}

fn checked_sum(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(ExchangeError::ArithmeticOverflow {
        context: "summing deposit amounts",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferLog;
    use meridian_amm::ConstantProductQuoter;
    use meridian_config::LimitsConfig;
    use std::sync::Arc;
    use types::{AssetId, QuoterRef};

    struct Fixture {
        book: PoolBook,
        sessions: SessionManager,
        transfer: TransferLog,
        family: PoolFamily,
    }

    impl Fixture {
        fn new(markings: &[u32]) -> Self {
            let mut book = PoolBook::new(LimitsConfig::default());
            let quoter = QuoterRef::from_low_u64_be(7);
            book.register_quoter(quoter, Arc::new(ConstantProductQuoter::new()));
            let family = PoolFamily::new(AssetId::from_low_u64_be(1), AssetId::from_low_u64_be(2), quoter);
            for &bits in markings {
                book.insert_pool(family.key(Marking::from_bits(bits))).unwrap();
            }
            Self {
                book,
                sessions: SessionManager::new(),
                transfer: TransferLog::new(),
                family,
            }
        }

        fn engine(&mut self) -> BatchOperationsEngine<'_, TransferLog> {
            BatchOperationsEngine::new(&mut self.book, &self.sessions, &mut self.transfer)
        }
    }

    fn provider() -> AccountId {
        AccountId::from_low_u64_be(42)
    }

    #[test]
    fn test_first_deposit_mints_sum() {
        let mut fx = Fixture::new(&[0x10]);
        let key = fx.family.key(Marking::from_bits(0x10));
        let mut ledger = FlashLedger::new();

        let minted = fx.engine().add_liquidity(&mut ledger, provider(), &key, (1_000, 4_000), 0).unwrap();

        assert_eq!(minted, 5_000);
        let inventory = fx.book.inventory(&key.id());
        assert_eq!((inventory.reserve0, inventory.reserve1), (1_000, 4_000));
        assert_eq!(fx.book.total_liquidity(&key.id()), 5_000);
        assert!(ledger.is_empty());
        assert_eq!(fx.transfer.net_flow(provider(), key.asset0), 1_000);
        assert_eq!(fx.transfer.net_flow(provider(), key.asset1), 4_000);
    }

    #[test]
    fn test_exact_ratio_and_imbalanced_deposits() {
        let mut fx = Fixture::new(&[0x10]);
        let key = fx.family.key(Marking::from_bits(0x10));
        let mut ledger = FlashLedger::new();
        fx.engine().add_liquidity(&mut ledger, provider(), &key, (1_000, 4_000), 0).unwrap();

        // Exact ratio: no penalty
        let exact = fx.engine().add_liquidity(&mut ledger, provider(), &key, (100, 400), 0).unwrap();
        assert_eq!(exact, 500);

        // Extra asset1 is donated, mint follows the scarcer side
        let skewed = fx.engine().add_liquidity(&mut ledger, provider(), &key, (100, 800), 0).unwrap();
        assert_eq!(skewed, 5_500 * 100 / 1_100);
    }

    #[test]
    fn test_zero_mint_rejected() {
        let mut fx = Fixture::new(&[0x10]);
        let key = fx.family.key(Marking::from_bits(0x10));
        let mut ledger = FlashLedger::new();
        fx.engine().add_liquidity(&mut ledger, provider(), &key, (1_000_000, 1_000_000), 0).unwrap();

        assert!(matches!(
            fx.engine().add_liquidity(&mut ledger, provider(), &key, (0, 5), 0),
            Err(ExchangeError::ZeroLiquidityMinted { .. })
        ));
    }

    #[test]
    fn test_batch_add_writes_one_delta_per_asset() {
        let mut fx = Fixture::new(&[0x10, 0x20, 0x30]);
        fx.sessions.start(provider()).unwrap();
        let deposits: Vec<_> = [0x10, 0x20, 0x30]
            .iter()
            .map(|&bits| LiquidityDeposit {
                marking: Marking::from_bits(bits),
                amount0: 100,
                amount1: 200,
            })
            .collect();
        let mut ledger = FlashLedger::new();
        let family = fx.family;

        let minted = fx
            .engine()
            .batch_add_liquidity(&mut ledger, provider(), family, &deposits)
            .unwrap();

        assert_eq!(minted, vec![300, 300, 300]);
        assert_eq!(ledger.writes(), 2);
        assert_eq!(ledger.delta(provider(), family.asset0), -300);
        assert_eq!(ledger.delta(provider(), family.asset1), -600);
        assert!(fx.transfer.is_empty());
    }

    #[test]
    fn test_batch_remove_over_total_fails() {
        let mut fx = Fixture::new(&[0x10, 0x20]);
        let family = fx.family;
        let mut ledger = FlashLedger::new();
        for bits in [0x10, 0x20] {
            let key = family.key(Marking::from_bits(bits));
            fx.engine().add_liquidity(&mut ledger, provider(), &key, (50, 50), 0).unwrap();
        }

        let withdrawals = [
            LiquidityWithdrawal {
                marking: Marking::from_bits(0x10),
                liquidity: 40,
            },
            LiquidityWithdrawal {
                marking: Marking::from_bits(0x20),
                liquidity: 101,
            },
        ];
        assert!(matches!(
            fx.engine().batch_remove_liquidity(&mut ledger, provider(), family, &withdrawals),
            Err(ExchangeError::InsufficientTotalLiquidity {
                requested: 101,
                total: 100,
                ..
            })
        ));
    }

    #[test]
    fn test_batch_create_skip_semantics() {
        let mut fx = Fixture::new(&[0x10]);
        let family = fx.family;
        let keys = [
            family.key(Marking::from_bits(0x10)),
            family.key(Marking::from_bits(0x20)),
            family.key(Marking::from_bits(0x30)),
        ];

        let report = fx.engine().batch_create_pools(&keys, true).unwrap();
        assert_eq!((report.created(), report.skipped(), report.failed()), (2, 1, 0));
        assert_eq!(report.outcomes[0].status, CreationStatus::Skipped);

        let fresh = [family.key(Marking::from_bits(0x40)), keys[1]];
        let report = fx.engine().batch_create_pools(&fresh, false).unwrap();
        assert_eq!((report.created(), report.skipped(), report.failed()), (1, 0, 1));
        assert!(matches!(report.outcomes[1].status, CreationStatus::Failed(_)));
        assert_eq!(fx.book.pool_count(), 4);
    }

    #[test]
    fn test_batch_limits() {
        let mut fx = Fixture::new(&[]);
        assert!(matches!(
            fx.engine().batch_create_pools(&[], true),
            Err(ExchangeError::EmptyBatch)
        ));

        let key = fx.family.key(Marking::default());
        let keys = vec![key; 257];
        assert!(matches!(
            fx.engine().batch_create_pools(&keys, true),
            Err(ExchangeError::BatchTooLarge { len: 257, max: 256 })
        ));
    }
}
