//! Flash accounting ledger
//!
//! Tracks the signed net obligation of each (account, asset) pair while a
//! call runs. Negative means the account owes the exchange, positive means
//! the exchange owes the account. Settlement turns each non-zero entry into
//! exactly one transfer and zeroes it.

use crate::error::{ExchangeError, Result};
use crate::transfer::AssetTransfer;
use std::collections::HashMap;
use tracing::debug;
use types::{AccountId, AssetId};

#[derive(Debug, Clone, Default)]
pub struct FlashLedger {
    deltas: HashMap<(AccountId, AssetId), i128>,
    writes: usize,
}

impl FlashLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the entry; a zero delta is not a write
    pub fn record(&mut self, account: AccountId, asset: AssetId, delta: i128) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let entry = self.deltas.entry((account, asset)).or_insert(0);
        *entry = entry
            .checked_add(delta)
            .ok_or(ExchangeError::ArithmeticOverflow {
                context: "accumulating a ledger delta",
            })?;
        if *entry == 0 {
            self.deltas.remove(&(account, asset));
        }
        self.writes += 1;
        Ok(())
    }

    pub fn delta(&self, account: AccountId, asset: AssetId) -> i128 {
        self.deltas.get(&(account, asset)).copied().unwrap_or(0)
    }

    /// Remove and return the entry
    pub fn take(&mut self, account: AccountId, asset: AssetId) -> i128 {
        self.deltas.remove(&(account, asset)).unwrap_or(0)
    }

    /// Number of non-zero `record` calls so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Non-zero entries in deterministic order
    pub fn outstanding(&self) -> Vec<(AccountId, AssetId, i128)> {
        let mut entries: Vec<_> = self
            .deltas
            .iter()
            .map(|(&(account, asset), &delta)| (account, asset, delta))
            .collect();
        entries.sort_by_key(|&(account, asset, _)| (account, asset));
        entries
    }

    /// Settle the input and output entries of one swap; returns the number
    /// of transfers made. Native value funds the input side only.
    pub fn settle_pair<T: AssetTransfer>(
        &mut self,
        account: AccountId,
        input: AssetId,
        output: AssetId,
        native_value: u128,
        transfer: &mut T,
    ) -> Result<usize> {
        if input == output {
            return Ok(self.settle_one(account, input, native_value, transfer)? as usize);
        }
        // Collections before payouts
        let collected = self.settle_one(account, input, native_value, transfer)?;
        let paid = self.settle_one(account, output, 0, transfer)?;
        Ok(collected as usize + paid as usize)
    }

    /// Settle every listed asset once, ignoring duplicates. Collections run
    /// before payouts regardless of list order.
    pub fn settle_tokens<T: AssetTransfer>(
        &mut self,
        account: AccountId,
        tokens: &[AssetId],
        transfer: &mut T,
    ) -> Result<usize> {
        let mut unique: Vec<AssetId> = Vec::with_capacity(tokens.len());
        for &asset in tokens {
            if !unique.contains(&asset) {
                unique.push(asset);
            }
        }
        let (collect, pay): (Vec<AssetId>, Vec<AssetId>) = unique
            .into_iter()
            .partition(|&asset| self.delta(account, asset) < 0);

        let mut count = 0;
        for asset in collect.into_iter().chain(pay) {
            count += self.settle_one(account, asset, 0, transfer)? as usize;
        }
        Ok(count)
    }

    fn settle_one<T: AssetTransfer>(
        &mut self,
        account: AccountId,
        asset: AssetId,
        native_value: u128,
        transfer: &mut T,
    ) -> Result<bool> {
        let delta = self.take(account, asset);
        if delta < 0 {
            let amount = delta.unsigned_abs();
            debug!(%account, %asset, amount, "collecting");
            transfer.transfer_in(asset, account, amount, native_value)?;
        } else if delta > 0 {
            let amount = delta.unsigned_abs();
            debug!(%account, %asset, amount, "paying out");
            transfer.transfer_out(asset, account, amount)?;
        } else {
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{Transfer, TransferLog};

    fn ids() -> (AccountId, AssetId, AssetId) {
        (
            AccountId::from_low_u64_be(1),
            AssetId::from_low_u64_be(10),
            AssetId::from_low_u64_be(20),
        )
    }

    #[test]
    fn test_record_accumulates_and_clears() {
        let (alice, a, _) = ids();
        let mut ledger = FlashLedger::new();

        ledger.record(alice, a, -100).unwrap();
        ledger.record(alice, a, 40).unwrap();
        assert_eq!(ledger.delta(alice, a), -60);

        ledger.record(alice, a, 60).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.writes(), 3);

        ledger.record(alice, a, 0).unwrap();
        assert_eq!(ledger.writes(), 3);
    }

    #[test]
    fn test_record_overflow() {
        let (alice, a, _) = ids();
        let mut ledger = FlashLedger::new();
        ledger.record(alice, a, i128::MAX).unwrap();

        assert!(matches!(
            ledger.record(alice, a, 1),
            Err(ExchangeError::ArithmeticOverflow { .. })
        ));
        assert_eq!(ledger.delta(alice, a), i128::MAX);
    }

    #[test]
    fn test_settle_pair_collects_then_pays() {
        let (alice, a, b) = ids();
        let mut ledger = FlashLedger::new();
        let mut log = TransferLog::new();
        ledger.record(alice, a, -100).unwrap();
        ledger.record(alice, b, 181).unwrap();

        let count = ledger.settle_pair(alice, a, b, 0, &mut log).unwrap();

        assert_eq!(count, 2);
        assert!(ledger.is_empty());
        assert_eq!(
            log.transfers(),
            &[
                Transfer::In {
                    asset: a,
                    account: alice,
                    amount: 100
                },
                Transfer::Out {
                    asset: b,
                    account: alice,
                    amount: 181
                },
            ]
        );
    }

    #[test]
    fn test_settle_pair_same_asset_merges() {
        let (alice, a, _) = ids();
        let mut ledger = FlashLedger::new();
        let mut log = TransferLog::new();
        ledger.record(alice, a, -100).unwrap();
        ledger.record(alice, a, 97).unwrap();

        assert_eq!(ledger.settle_pair(alice, a, a, 0, &mut log).unwrap(), 1);
        assert_eq!(log.net_flow(alice, a), 3);
    }

    #[test]
    fn test_settle_tokens_dedupes() {
        let (alice, a, b) = ids();
        let mut ledger = FlashLedger::new();
        let mut log = TransferLog::new();
        ledger.record(alice, a, 5).unwrap();

        let count = ledger.settle_tokens(alice, &[a, b, a], &mut log).unwrap();

        assert_eq!(count, 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_settle_tokens_collects_before_paying() {
        let (alice, a, b) = ids();
        let mut ledger = FlashLedger::new();
        let mut log = TransferLog::new();
        ledger.record(alice, a, 181).unwrap();
        ledger.record(alice, b, -100).unwrap();

        assert_eq!(ledger.settle_tokens(alice, &[a, b], &mut log).unwrap(), 2);
        assert!(ledger.is_empty());
        assert_eq!(
            log.transfers(),
            &[
                Transfer::In {
                    asset: b,
                    account: alice,
                    amount: 100
                },
                Transfer::Out {
                    asset: a,
                    account: alice,
                    amount: 181
                },
            ]
        );
    }

    #[test]
    fn test_outstanding_sorted() {
        let (alice, a, b) = ids();
        let mut ledger = FlashLedger::new();
        ledger.record(alice, b, 2).unwrap();
        ledger.record(alice, a, -1).unwrap();

        assert_eq!(ledger.outstanding(), vec![(alice, a, -1), (alice, b, 2)]);
    }
}
