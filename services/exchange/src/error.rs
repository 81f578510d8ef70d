//! Exchange error taxonomy
//!
//! Preconditions fail before any state is touched. Solvency failures abort
//! the enclosing call and every write it made is reverted. Collaborator
//! failures (quoter, asset transfer) are wrapped unchanged.

use crate::transfer::TransferError;
use meridian_amm::QuoteError;
use thiserror::Error;
use types::{AccountId, AssetId, Marking, PoolId, QuoterRef};

pub type Result<T, E = ExchangeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ExchangeError {
    // Preconditions
    #[error("Route has no hops")]
    EmptyRoute,

    #[error("Route has {hops} hops, limit is {max}")]
    RouteTooLong { hops: usize, max: usize },

    #[error("Hop {asset_in} -> {asset_out} carries no legs")]
    EmptyHop { asset_in: AssetId, asset_out: AssetId },

    #[error("Hop {asset_in} -> {asset_out} has leg weights summing to zero")]
    InvalidLegWeights { asset_in: AssetId, asset_out: AssetId },

    #[error("Hop {asset_in} -> {asset_out} lists marking {marking} more than once")]
    DuplicateLeg {
        asset_in: AssetId,
        asset_out: AssetId,
        marking: Marking,
    },

    #[error("Batch is empty")]
    EmptyBatch,

    #[error("Batch of {len} entries exceeds limit {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("Pool assets must differ, got {0} on both sides")]
    IdenticalAssets(AssetId),

    #[error("Pair {asset0}/{asset1} is not in canonical order")]
    NonCanonicalPair { asset0: AssetId, asset1: AssetId },

    #[error("Amount must be non-zero")]
    ZeroAmount,

    #[error("Quoter {0} is not registered")]
    UnknownQuoter(QuoterRef),

    #[error("Pool {0} does not exist")]
    PoolNotFound(PoolId),

    #[error("Pool {0} already exists")]
    PoolAlreadyExists(PoolId),

    #[error("Quoter response mismatch: {reason}")]
    QuoterResponseMismatch { reason: String },

    #[error("Native value {value} cannot be attached to a deferred settlement")]
    NativeValueDeferred { value: u128 },

    // Solvency
    #[error("Insufficient liquidity in pool {pool} for {asset}: required {required}, available {available}")]
    InsufficientLiquidity {
        pool: PoolId,
        asset: AssetId,
        required: u128,
        available: u128,
    },

    #[error("Deposit into pool {pool} mints zero liquidity")]
    ZeroLiquidityMinted { pool: PoolId },

    #[error("Burn of {requested} exceeds total liquidity {total} of pool {pool}")]
    InsufficientTotalLiquidity {
        pool: PoolId,
        requested: u128,
        total: u128,
    },

    #[error("Reserve {side} of pool {pool} would go negative: reserve {reserve}, delta {delta}")]
    ReserveUnderflow {
        pool: PoolId,
        side: u8,
        reserve: u128,
        delta: i128,
    },

    #[error("Reserve {side} of pool {pool} would exceed cap {cap}: reserve {reserve}, delta {delta}")]
    ReserveOverflow {
        pool: PoolId,
        side: u8,
        reserve: u128,
        delta: i128,
        cap: u128,
    },

    #[error("Arithmetic overflow while {context}")]
    ArithmeticOverflow { context: &'static str },

    #[error("Output {actual} below minimum {min_out}")]
    SlippageExceeded { min_out: u128, actual: u128 },

    // Sessions
    #[error("Session already active for {0}")]
    SessionAlreadyActive(AccountId),

    #[error("No active session for {0}")]
    NoActiveSession(AccountId),

    #[error("Delta of {amount} on {asset} for {account} left unsettled")]
    UnsettledDelta {
        account: AccountId,
        asset: AssetId,
        amount: i128,
    },

    // Collaborators
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl ExchangeError {
    /// True for failures raised before the call touched any state
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EmptyRoute
                | Self::RouteTooLong { .. }
                | Self::EmptyHop { .. }
                | Self::InvalidLegWeights { .. }
                | Self::DuplicateLeg { .. }
                | Self::EmptyBatch
                | Self::BatchTooLarge { .. }
                | Self::IdenticalAssets(_)
                | Self::NonCanonicalPair { .. }
                | Self::ZeroAmount
                | Self::UnknownQuoter(_)
                | Self::PoolNotFound(_)
                | Self::NativeValueDeferred { .. }
        )
    }
}

/// Pool metadata must list distinct assets in ascending order
pub(crate) fn check_pair(asset0: AssetId, asset1: AssetId) -> Result<()> {
    if asset0 == asset1 {
        return Err(ExchangeError::IdenticalAssets(asset0));
    }
    if asset0 > asset1 {
        return Err(ExchangeError::NonCanonicalPair { asset0, asset1 });
    }
    Ok(())
}

/// Signed ledger delta for an unsigned amount
pub(crate) fn to_delta(amount: u128) -> Result<i128> {
    i128::try_from(amount).map_err(|_| ExchangeError::ArithmeticOverflow {
        context: "converting an amount to a ledger delta",
    })
}

/// `amount * numerator / denominator` without intermediate overflow where possible
pub(crate) fn mul_div(amount: u128, numerator: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(ExchangeError::ArithmeticOverflow {
            context: "dividing by an empty total",
        });
    }
    match amount.checked_mul(numerator) {
        Some(product) => Ok(product / denominator),
        None => {
            // (q*d + r) * n / d = q*n + r*n/d
            let quotient = amount / denominator;
            let remainder = amount % denominator;
            let whole = quotient.checked_mul(numerator);
            let part = remainder.checked_mul(numerator).map(|p| p / denominator);
            whole
                .zip(part)
                .and_then(|(w, p)| w.checked_add(p))
                .ok_or(ExchangeError::ArithmeticOverflow {
                    context: "scaling an amount by a pool ratio",
                })
        }
    }
}
