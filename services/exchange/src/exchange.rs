//! Exchange facade
//!
//! Every public operation is one atomic call: it opens a checkpoint on the
//! pool book and the transfer backend, runs to completion and either commits
//! or rolls back all of its writes. Flash sessions run the caller's callback
//! inside a single atomic call and settle once at the end.

use crate::batch::{
    BatchCreateReport, BatchOperationsEngine, LiquidityDeposit, LiquidityWithdrawal, RebalanceReport,
    Withdrawn,
};
use crate::error::{ExchangeError, Result};
use crate::events::ExchangeEvent;
use crate::hop::Hop;
use crate::inventory::PoolInventory;
use crate::ledger::FlashLedger;
use crate::log_settle;
use crate::router::{BatchSwapRouter, SwapReceipt, SwapRoute};
use crate::session::SessionManager;
use crate::state::PoolBook;
use crate::transfer::AssetTransfer;
use meridian_amm::Quoter;
use meridian_config::{ExchangeConfig, LimitsConfig};
use std::sync::Arc;
use tracing::{debug, info};
use types::{AccountId, AssetId, PoolFamily, PoolId, PoolKey, QuoterRef};

pub struct Exchange<T> {
    book: PoolBook,
    sessions: SessionManager,
    transfer: T,
}

impl<T: AssetTransfer> Exchange<T> {
    /// Exchange with default limits
    pub fn new(transfer: T) -> Self {
        Self::with_limits(LimitsConfig::default(), transfer)
    }

    pub fn with_limits(limits: LimitsConfig, transfer: T) -> Self {
        Self {
            book: PoolBook::new(limits),
            sessions: SessionManager::new(),
            transfer,
        }
    }

    /// Exchange from a validated configuration
    pub fn with_config(config: &ExchangeConfig, transfer: T) -> anyhow::Result<Self> {
        config.validate()?;
        info!(
            max_hops = config.limits.max_hops,
            max_batch_size = config.limits.max_batch_size,
            reserve_bits = config.limits.reserve_bits,
            "exchange initialized"
        );
        Ok(Self::with_limits(config.limits.clone(), transfer))
    }

    pub fn register_quoter(&mut self, quoter_ref: QuoterRef, quoter: Arc<dyn Quoter>) {
        debug!(%quoter_ref, name = quoter.name(), "quoter registered");
        self.book.register_quoter(quoter_ref, quoter);
    }

    pub fn create_pool(&mut self, key: PoolKey) -> Result<PoolId> {
        self.atomic(|exchange| {
            let pool_id = exchange.book.insert_pool(key)?;
            exchange.book.emit(ExchangeEvent::PoolCreated { pool_id, key });
            info!(%pool_id, asset0 = %key.asset0, asset1 = %key.asset1, marking = %key.marking, "pool created");
            Ok(pool_id)
        })
    }

    pub fn add_liquidity(&mut self, provider: AccountId, key: &PoolKey, amount0: u128, amount1: u128) -> Result<u128> {
        self.add_liquidity_with_value(provider, key, amount0, amount1, 0)
    }

    /// Deposit with native value attached, for pools whose asset0 is native
    pub fn add_liquidity_with_value(
        &mut self,
        provider: AccountId,
        key: &PoolKey,
        amount0: u128,
        amount1: u128,
        native_value: u128,
    ) -> Result<u128> {
        let mut ledger = FlashLedger::new();
        self.atomic(|exchange| {
            exchange
                .batch_engine()
                .add_liquidity(&mut ledger, provider, key, (amount0, amount1), native_value)
        })
    }

    pub fn remove_liquidity(&mut self, provider: AccountId, key: &PoolKey, liquidity: u128) -> Result<Withdrawn> {
        let mut ledger = FlashLedger::new();
        self.atomic(|exchange| {
            exchange
                .batch_engine()
                .remove_liquidity(&mut ledger, provider, key, liquidity)
        })
    }

    /// One-hop route
    pub fn swap(
        &mut self,
        recipient: AccountId,
        hop: Hop,
        amount_in: u128,
        native_value: u128,
        min_amount_out: u128,
    ) -> Result<SwapReceipt> {
        let route = SwapRoute::new(recipient, vec![hop], amount_in)
            .with_native_value(native_value)
            .with_min_out(min_amount_out);
        self.batch_swap(&route)
    }

    pub fn batch_swap(&mut self, route: &SwapRoute) -> Result<SwapReceipt> {
        let mut ledger = FlashLedger::new();
        self.atomic(|exchange| exchange.router().execute(&mut ledger, route))
    }

    pub fn batch_add_liquidity(
        &mut self,
        provider: AccountId,
        family: PoolFamily,
        deposits: &[LiquidityDeposit],
    ) -> Result<Vec<u128>> {
        let mut ledger = FlashLedger::new();
        self.atomic(|exchange| {
            exchange
                .batch_engine()
                .batch_add_liquidity(&mut ledger, provider, family, deposits)
        })
    }

    pub fn batch_remove_liquidity(
        &mut self,
        provider: AccountId,
        family: PoolFamily,
        withdrawals: &[LiquidityWithdrawal],
    ) -> Result<Vec<Withdrawn>> {
        let mut ledger = FlashLedger::new();
        self.atomic(|exchange| {
            exchange
                .batch_engine()
                .batch_remove_liquidity(&mut ledger, provider, family, withdrawals)
        })
    }

    pub fn batch_create_pools(&mut self, keys: &[PoolKey], skip_existing: bool) -> Result<BatchCreateReport> {
        self.atomic(|exchange| exchange.batch_engine().batch_create_pools(keys, skip_existing))
    }

    pub fn batch_rebalance(
        &mut self,
        provider: AccountId,
        family: PoolFamily,
        removals: &[LiquidityWithdrawal],
        additions: &[LiquidityDeposit],
    ) -> Result<RebalanceReport> {
        let mut ledger = FlashLedger::new();
        self.atomic(|exchange| {
            exchange
                .batch_engine()
                .batch_rebalance(&mut ledger, provider, family, removals, additions)
        })
    }

    /// Run `callback` inside a session owned by `owner`
    ///
    /// Operations for the owner only record ledger deltas. When the callback
    /// returns, each asset in `tokens` is settled with at most one transfer
    /// and any remaining non-zero delta fails the whole session. The session
    /// ends whether or not the call succeeds.
    pub fn flash_session<D, R, F>(&mut self, owner: AccountId, data: D, tokens: &[AssetId], callback: F) -> Result<R>
    where
        F: FnOnce(&mut FlashSession<'_, T>, D) -> Result<R>,
    {
        self.sessions.start(owner)?;
        debug!(%owner, "session started");

        let result = self.atomic(|exchange| {
            let mut session = FlashSession {
                exchange,
                owner,
                ledger: FlashLedger::new(),
            };
            let value = callback(&mut session, data)?;

            let FlashSession { exchange, mut ledger, .. } = session;
            let transfers = ledger.settle_tokens(owner, tokens, &mut exchange.transfer)?;
            if let Some((account, asset, amount)) = ledger.outstanding().into_iter().next() {
                return Err(ExchangeError::UnsettledDelta {
                    account,
                    asset,
                    amount,
                });
            }

            exchange.book.emit(ExchangeEvent::SessionSettled { owner, transfers });
            log_settle!("session for {} settled with {} transfer(s)", owner, transfers);
            Ok(value)
        });

        self.sessions.end(owner)?;
        result
    }

    /// Commit on success, roll back every journal and the transfer backend on failure
    fn atomic<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let checkpoint = self.book.begin(self.transfer.checkpoint());
        match op(self) {
            Ok(value) => {
                self.book.commit(checkpoint);
                Ok(value)
            }
            Err(err) => {
                let transfers = self.book.revert(checkpoint);
                self.transfer.revert_to(transfers);
                debug!(error = %err, "call reverted");
                Err(err)
            }
        }
    }

    /// Atomic call against an outer ledger; the ledger is restored on failure
    fn atomic_with_ledger<R>(
        &mut self,
        ledger: &mut FlashLedger,
        op: impl FnOnce(&mut Self, &mut FlashLedger) -> Result<R>,
    ) -> Result<R> {
        let saved = ledger.clone();
        let result = self.atomic(|exchange| op(exchange, &mut *ledger));
        if result.is_err() {
            *ledger = saved;
        }
        result
    }

    fn router(&mut self) -> BatchSwapRouter<'_, T> {
        BatchSwapRouter::new(&mut self.book, &self.sessions, &mut self.transfer)
    }

    fn batch_engine(&mut self) -> BatchOperationsEngine<'_, T> {
        BatchOperationsEngine::new(&mut self.book, &self.sessions, &mut self.transfer)
    }

    pub fn pool(&self, pool_id: &PoolId) -> Option<&PoolKey> {
        self.book.pool(pool_id)
    }

    pub fn pool_count(&self) -> usize {
        self.book.pool_count()
    }

    pub fn inventory(&self, pool_id: &PoolId) -> PoolInventory {
        self.book.inventory(pool_id)
    }

    pub fn total_liquidity(&self, pool_id: &PoolId) -> u128 {
        self.book.total_liquidity(pool_id)
    }

    /// Undrained events; the log grows until [`take_events`](Self::take_events) is called
    pub fn events(&self) -> &[ExchangeEvent] {
        self.book.events()
    }

    pub fn take_events(&mut self) -> Vec<ExchangeEvent> {
        self.book.take_events()
    }

    pub fn is_session_active(&self, account: AccountId) -> bool {
        self.sessions.is_active(account)
    }

    pub fn limits(&self) -> &LimitsConfig {
        self.book.limits()
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn transfer_mut(&mut self) -> &mut T {
        &mut self.transfer
    }
}

/// Handle passed to a flash-session callback
///
/// Each operation is its own nested atomic call; a failed operation leaves
/// the session ledger and the book as they were, so the callback may recover
/// and continue.
pub struct FlashSession<'a, T> {
    exchange: &'a mut Exchange<T>,
    owner: AccountId,
    ledger: FlashLedger,
}

impl<T: AssetTransfer> FlashSession<'_, T> {
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    /// Running delta of the owner for `asset`
    pub fn delta(&self, asset: AssetId) -> i128 {
        self.ledger.delta(self.owner, asset)
    }

    pub fn ledger(&self) -> &FlashLedger {
        &self.ledger
    }

    pub fn exchange(&self) -> &Exchange<T> {
        &*self.exchange
    }

    pub fn swap(&mut self, hop: Hop, amount_in: u128, min_amount_out: u128) -> Result<SwapReceipt> {
        let route = SwapRoute::new(self.owner, vec![hop], amount_in).with_min_out(min_amount_out);
        self.batch_swap(&route)
    }

    pub fn batch_swap(&mut self, route: &SwapRoute) -> Result<SwapReceipt> {
        self.exchange
            .atomic_with_ledger(&mut self.ledger, |exchange, ledger| exchange.router().execute(ledger, route))
    }

    pub fn create_pool(&mut self, key: PoolKey) -> Result<PoolId> {
        self.exchange.create_pool(key)
    }

    pub fn add_liquidity(&mut self, key: &PoolKey, amount0: u128, amount1: u128) -> Result<u128> {
        let owner = self.owner;
        self.exchange.atomic_with_ledger(&mut self.ledger, |exchange, ledger| {
            exchange
                .batch_engine()
                .add_liquidity(ledger, owner, key, (amount0, amount1), 0)
        })
    }

    pub fn remove_liquidity(&mut self, key: &PoolKey, liquidity: u128) -> Result<Withdrawn> {
        let owner = self.owner;
        self.exchange.atomic_with_ledger(&mut self.ledger, |exchange, ledger| {
            exchange
                .batch_engine()
                .remove_liquidity(ledger, owner, key, liquidity)
        })
    }

    pub fn batch_add_liquidity(&mut self, family: PoolFamily, deposits: &[LiquidityDeposit]) -> Result<Vec<u128>> {
        let owner = self.owner;
        self.exchange.atomic_with_ledger(&mut self.ledger, |exchange, ledger| {
            exchange
                .batch_engine()
                .batch_add_liquidity(ledger, owner, family, deposits)
        })
    }

    pub fn batch_remove_liquidity(
        &mut self,
        family: PoolFamily,
        withdrawals: &[LiquidityWithdrawal],
    ) -> Result<Vec<Withdrawn>> {
        let owner = self.owner;
        self.exchange.atomic_with_ledger(&mut self.ledger, |exchange, ledger| {
            exchange
                .batch_engine()
                .batch_remove_liquidity(ledger, owner, family, withdrawals)
        })
    }

    pub fn batch_create_pools(&mut self, keys: &[PoolKey], skip_existing: bool) -> Result<BatchCreateReport> {
        self.exchange.batch_create_pools(keys, skip_existing)
    }

    pub fn batch_rebalance(
        &mut self,
        family: PoolFamily,
        removals: &[LiquidityWithdrawal],
        additions: &[LiquidityDeposit],
    ) -> Result<RebalanceReport> {
        let owner = self.owner;
        self.exchange.atomic_with_ledger(&mut self.ledger, |exchange, ledger| {
            exchange
                .batch_engine()
                .batch_rebalance(ledger, owner, family, removals, additions)
        })
    }
}
