//! Multi-hop batch swap router
//!
//! Chains hops by carrying the intermediate amount forward. Only the first
//! input asset and the last output asset reach the recipient's ledger;
//! intermediate assets net out inside the pools.

use crate::error::{to_delta, ExchangeError, Result};
use crate::events::ExchangeEvent;
use crate::hop::{Hop, HopExecutor, HopOutcome};
use crate::ledger::FlashLedger;
use crate::session::SessionManager;
use crate::state::PoolBook;
use crate::transfer::AssetTransfer;
use crate::log_swap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use types::{AccountId, AssetId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRoute {
    pub hops: Vec<Hop>,
    pub amount_in: u128,
    /// Native value attached to the call; funds a native first-hop input
    pub native_value: u128,
    pub recipient: AccountId,
    pub min_amount_out: u128,
}

impl SwapRoute {
    pub fn new(recipient: AccountId, hops: Vec<Hop>, amount_in: u128) -> Self {
        Self {
            hops,
            amount_in,
            native_value: 0,
            recipient,
            min_amount_out: 0,
        }
    }

    pub fn with_min_out(mut self, min_amount_out: u128) -> Self {
        self.min_amount_out = min_amount_out;
        self
    }

    pub fn with_native_value(mut self, native_value: u128) -> Self {
        self.native_value = native_value;
        self
    }

    pub fn asset_in(&self) -> Option<AssetId> {
        self.hops.first().map(Hop::asset_in)
    }

    pub fn asset_out(&self) -> Option<AssetId> {
        self.hops.last().map(Hop::asset_out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub amount_in: u128,
    pub amount_out: u128,
    pub hops: Vec<HopOutcome>,
    /// False when settlement was left to the recipient's session
    pub settled: bool,
    pub transfers: usize,
}

pub struct BatchSwapRouter<'a, T> {
    book: &'a mut PoolBook,
    sessions: &'a SessionManager,
    transfer: &'a mut T,
}

impl<'a, T: AssetTransfer> BatchSwapRouter<'a, T> {
    pub fn new(book: &'a mut PoolBook, sessions: &'a SessionManager, transfer: &'a mut T) -> Self {
        Self {
            book,
            sessions,
            transfer,
        }
    }

    /// Execute every hop in order, record the net deltas and settle unless
    /// the recipient's session defers it
    pub fn execute(&mut self, ledger: &mut FlashLedger, route: &SwapRoute) -> Result<SwapReceipt> {
        let (first, last) = match (route.hops.first(), route.hops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ExchangeError::EmptyRoute),
        };
        let max_hops = self.book.limits().max_hops;
        if route.hops.len() > max_hops {
            return Err(ExchangeError::RouteTooLong {
                hops: route.hops.len(),
                max: max_hops,
            });
        }
        if route.amount_in == 0 {
            return Err(ExchangeError::ZeroAmount);
        }
        let deferred = self.sessions.is_active(route.recipient);
        if deferred && route.native_value > 0 {
            return Err(ExchangeError::NativeValueDeferred {
                value: route.native_value,
            });
        }

        for (index, pair) in route.hops.windows(2).enumerate() {
            if pair[0].asset_out() != pair[1].asset_in() {
                warn!(
                    hop = index + 1,
                    expected = %pair[0].asset_out(),
                    actual = %pair[1].asset_in(),
                    "discontinuous route, executing as given"
                );
            }
        }

        let mut amount = route.amount_in;
        let mut outcomes = Vec::with_capacity(route.hops.len());
        for (index, hop) in route.hops.iter().enumerate() {
            let outcome = HopExecutor::new(&mut *self.book).execute(hop, amount)?;
            debug!(hop = index, amount_in = amount, amount_out = outcome.amount_out, "route step");
            amount = outcome.amount_out;
            outcomes.push(outcome);
        }

        if amount < route.min_amount_out {
            return Err(ExchangeError::SlippageExceeded {
                min_out: route.min_amount_out,
                actual: amount,
            });
        }

        let (asset_in, asset_out) = (first.asset_in(), last.asset_out());
        ledger.record(route.recipient, asset_in, -to_delta(route.amount_in)?)?;
        ledger.record(route.recipient, asset_out, to_delta(amount)?)?;

        let transfers = if deferred {
            0
        } else {
            ledger.settle_pair(
                route.recipient,
                asset_in,
                asset_out,
                route.native_value,
                &mut *self.transfer,
            )?
        };

        self.book.emit(ExchangeEvent::Swapped {
            recipient: route.recipient,
            asset_in,
            asset_out,
            amount_in: route.amount_in,
            amount_out: amount,
            hops: route.hops.len(),
        });
        log_swap!(
            "{} {} -> {} {} over {} hop(s){}",
            route.amount_in,
            asset_in,
            amount,
            asset_out,
            route.hops.len(),
            if deferred { " (deferred)" } else { "" }
        );

        Ok(SwapReceipt {
            amount_in: route.amount_in,
            amount_out: amount,
            hops: outcomes,
            settled: !deferred,
            transfers,
        })
    }
}
