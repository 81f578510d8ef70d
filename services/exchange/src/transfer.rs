//! Asset transfer boundary
//!
//! Settlement moves assets between the exchange and an account through an
//! [`AssetTransfer`] implementation. The native asset is collected from the
//! value attached to the call rather than pulled from the account.
//! [`TransferLog`] is an in-memory implementation that records every
//! movement and nets flows per (account, asset).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use types::{AccountId, AssetId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Transfer of {asset} for {account} rejected: {reason}")]
    Rejected {
        asset: AssetId,
        account: AccountId,
        reason: String,
    },

    #[error("Native value {provided} does not cover required {required}")]
    InsufficientNativeValue { required: u128, provided: u128 },
}

/// Moves assets between the exchange and accounts
pub trait AssetTransfer {
    /// Collect `amount` of `asset` from `from`; `native_value` is the value
    /// attached to the call and funds native-asset collections
    fn transfer_in(
        &mut self,
        asset: AssetId,
        from: AccountId,
        amount: u128,
        native_value: u128,
    ) -> Result<(), TransferError>;

    /// Pay `amount` of `asset` to `to`
    fn transfer_out(&mut self, asset: AssetId, to: AccountId, amount: u128) -> Result<(), TransferError>;

    /// Mark the current position so a failed call can undo its transfers
    fn checkpoint(&self) -> usize {
        0
    }

    /// Undo transfers made after `checkpoint`; backends that cannot undo
    /// keep the default no-op
    fn revert_to(&mut self, _checkpoint: usize) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transfer {
    In {
        asset: AssetId,
        account: AccountId,
        amount: u128,
    },
    Out {
        asset: AssetId,
        account: AccountId,
        amount: u128,
    },
}

impl Transfer {
    pub fn asset(&self) -> AssetId {
        match self {
            Transfer::In { asset, .. } | Transfer::Out { asset, .. } => *asset,
        }
    }

    pub fn account(&self) -> AccountId {
        match self {
            Transfer::In { account, .. } | Transfer::Out { account, .. } => *account,
        }
    }
}

/// Recording transfer backend
#[derive(Debug, Default, Clone)]
pub struct TransferLog {
    transfers: Vec<Transfer>,
    failing: HashSet<AssetId>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every later transfer of `asset`
    pub fn fail_on_asset(&mut self, asset: AssetId) {
        self.failing.insert(asset);
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Transfers touching one (account, asset) pair
    pub fn count_for(&self, account: AccountId, asset: AssetId) -> usize {
        self.transfers
            .iter()
            .filter(|t| t.account() == account && t.asset() == asset)
            .count()
    }

    /// Net flow from the exchange's side: positive when the account paid in
    pub fn net_flow(&self, account: AccountId, asset: AssetId) -> i128 {
        self.net_flows().get(&(account, asset)).copied().unwrap_or(0)
    }

    pub fn net_flows(&self) -> HashMap<(AccountId, AssetId), i128> {
        let mut flows = HashMap::new();
        for transfer in &self.transfers {
            let (key, signed) = match *transfer {
                Transfer::In {
                    asset,
                    account,
                    amount,
                } => ((account, asset), amount as i128),
                Transfer::Out {
                    asset,
                    account,
                    amount,
                } => ((account, asset), -(amount as i128)),
            };
            *flows.entry(key).or_insert(0) += signed;
        }
        flows
    }

    fn check(&self, asset: AssetId, account: AccountId) -> Result<(), TransferError> {
        if self.failing.contains(&asset) {
            return Err(TransferError::Rejected {
                asset,
                account,
                reason: "asset transfers disabled".to_string(),
            });
        }
        Ok(())
    }
}

impl AssetTransfer for TransferLog {
    fn transfer_in(
        &mut self,
        asset: AssetId,
        from: AccountId,
        amount: u128,
        native_value: u128,
    ) -> Result<(), TransferError> {
        self.check(asset, from)?;
        if asset.is_native() && native_value < amount {
            return Err(TransferError::InsufficientNativeValue {
                required: amount,
                provided: native_value,
            });
        }
        self.transfers.push(Transfer::In {
            asset,
            account: from,
            amount,
        });
        Ok(())
    }

    fn transfer_out(&mut self, asset: AssetId, to: AccountId, amount: u128) -> Result<(), TransferError> {
        self.check(asset, to)?;
        self.transfers.push(Transfer::Out {
            asset,
            account: to,
            amount,
        });
        Ok(())
    }

    fn checkpoint(&self) -> usize {
        self.transfers.len()
    }

    fn revert_to(&mut self, checkpoint: usize) {
        self.transfers.truncate(checkpoint);
    }
}
