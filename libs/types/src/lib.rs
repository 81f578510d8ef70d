//! # Meridian Types
//!
//! Shared vocabulary for the exchange core: 20-byte account, asset and quoter
//! addresses, the canonical [`PoolId`] derived from a pool's constituents, and
//! the [`Marking`] bitfield that selects a pool's pricing-data requirements and
//! fee bucket.
//!
//! ## Pool identity
//!
//! ```rust
//! use types::{AssetId, Marking, PoolId, QuoterRef};
//!
//! let weth = AssetId::from_low_u64_be(1);
//! let usdc = AssetId::from_low_u64_be(2);
//! let quoter = QuoterRef::from_low_u64_be(7);
//! let marking = Marking::from_bits(0x1e1);
//!
//! // Argument order never changes the identity
//! assert_eq!(
//!     PoolId::assemble(weth, usdc, quoter, marking),
//!     PoolId::assemble(usdc, weth, quoter, marking),
//! );
//! ```

pub mod errors;
pub mod identifiers;
pub mod marking;
pub mod pool;

pub use errors::IdentifierError;
pub use identifiers::{AccountId, AssetId, PoolId, QuoterRef};
pub use marking::{Marking, MarkingFields};
pub use pool::{PoolFamily, PoolKey};
