//! # Meridian Exchange Core
//!
//! Multi-asset exchange engine: a registry of pools keyed by
//! [`types::PoolId`], their inventories, multi-hop and multi-bucket swaps
//! priced through pluggable [`meridian_amm::Quoter`] strategies, and
//! flash-accounted settlement that nets every account's obligations into at
//! most one transfer per asset.
//!
//! ## Architecture
//!
//! ```text
//! Exchange ─┬─ BatchSwapRouter ── HopExecutor ── Quoter
//!           ├─ BatchOperationsEngine
//!           ├─ FlashLedger ── AssetTransfer
//!           ├─ SessionManager
//!           └─ PoolBook (pools, InventoryStore, liquidity, events)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use meridian_amm::ConstantProductQuoter;
//! use meridian_exchange::{Exchange, Hop, TransferLog};
//! use std::sync::Arc;
//! use types::{AccountId, AssetId, Marking, PoolKey, QuoterRef};
//!
//! let mut exchange = Exchange::new(TransferLog::new());
//! let quoter = QuoterRef::from_low_u64_be(1);
//! exchange.register_quoter(quoter, Arc::new(ConstantProductQuoter::new()));
//!
//! let (a, b) = (AssetId::from_low_u64_be(10), AssetId::from_low_u64_be(20));
//! let key = PoolKey::new(a, b, quoter, Marking::from_bits(0x1e0));
//! exchange.create_pool(key)?;
//! exchange.add_liquidity(AccountId::from_low_u64_be(1), &key, 1_000, 2_000)?;
//!
//! let trader = AccountId::from_low_u64_be(2);
//! let receipt = exchange.swap(trader, Hop::single(a, b, quoter, key.marking), 100, 0, 0)?;
//! assert_eq!(receipt.amount_out, 181);
//! # Ok::<(), meridian_exchange::ExchangeError>(())
//! ```

pub mod batch;
pub mod error;
pub mod events;
pub mod exchange;
pub mod hop;
pub mod inventory;
mod journal;
pub mod ledger;
pub mod logging;
pub mod router;
pub mod session;
pub mod state;
pub mod transfer;

pub use batch::{
    BatchCreateReport, BatchOperationsEngine, CreationStatus, LiquidityDeposit, LiquidityWithdrawal,
    PoolCreation, RebalanceReport, Withdrawn,
};
pub use error::{ExchangeError, Result};
pub use events::ExchangeEvent;
pub use exchange::{Exchange, FlashSession};
pub use hop::{Hop, HopExecutor, HopLeg, HopOutcome, LegFill};
pub use inventory::{InventoryStore, PoolInventory};
pub use ledger::FlashLedger;
pub use logging::{init_tracing, LogEmoji};
pub use router::{BatchSwapRouter, SwapReceipt, SwapRoute};
pub use session::{SessionManager, SessionState};
pub use state::PoolBook;
pub use transfer::{AssetTransfer, Transfer, TransferError, TransferLog};
