//! # Meridian AMM - Pricing Engine Boundary
//!
//! ## Purpose
//!
//! Defines the [`Quoter`] capability set the exchange core prices trades
//! through, and ships one reference strategy ([`ConstantProductQuoter`]) so the
//! engine can be exercised end to end. Concrete pricing engines (oracle
//! averaging, TWAP, inventory-skewed quoting) plug in behind the same trait.
//!
//! ## Integration Points
//!
//! - **Input**: pool pair, marking, input amount, direction and the pool's
//!   current reserves, supplied by the hop executor
//! - **Output**: output amounts (and pool ids for batched requests)
//! - **Trust boundary**: the exchange checks every returned amount against the
//!   output reserve before applying it; nothing else about a quote is trusted
//!   or verified
//!
//! ## Batching
//!
//! A hop that fans across several marking buckets of one pair issues a single
//! [`Quoter::quote_batch`] call. Strategies that cannot batch natively get a
//! default implementation that loops over [`Quoter::quote`].

pub mod constant_product;
pub mod quoter;

pub use constant_product::{ConstantProductMath, ConstantProductQuoter};
pub use quoter::{BatchQuote, BatchQuoteRequest, QuoteError, QuoteRequest, Quoter};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
