//! # Identifiers
//!
//! Fixed-width address wrappers for accounts, assets and quoters, plus the
//! 32-byte [`PoolId`] assembled from a pool's constituents.
//!
//! Addresses are plain 20-byte values so they can be copied freely, used as
//! `HashMap` keys, and compared lexicographically. Lexicographic order is what
//! canonicalizes an asset pair: the smaller address is always `asset0`.

use crate::errors::IdentifierError;
use crate::marking::Marking;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Width in bytes of every address-style identifier
pub const ADDRESS_LEN: usize = 20;

macro_rules! define_address {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub [u8; ADDRESS_LEN]);

        impl $name {
            /// The all-zero address
            pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

            #[inline(always)]
            pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
                Self(bytes)
            }

            /// Address whose low 8 bytes hold `value` big-endian, the rest zero
            pub fn from_low_u64_be(value: u64) -> Self {
                let mut bytes = [0u8; ADDRESS_LEN];
                bytes[ADDRESS_LEN - 8..].copy_from_slice(&value.to_be_bytes());
                Self(bytes)
            }

            /// Parse a hex address with or without the `0x` prefix
            pub fn from_hex(input: &str) -> Result<Self, IdentifierError> {
                let stripped = input.strip_prefix("0x").unwrap_or(input);
                let decoded = hex::decode(stripped).map_err(|e| IdentifierError::InvalidHex {
                    input: input.to_string(),
                    reason: e.to_string(),
                })?;
                let bytes: [u8; ADDRESS_LEN] =
                    decoded
                        .as_slice()
                        .try_into()
                        .map_err(|_| IdentifierError::InvalidLength {
                            expected: ADDRESS_LEN,
                            actual: decoded.len(),
                        })?;
                Ok(Self(bytes))
            }

            #[inline(always)]
            pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; ADDRESS_LEN]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{})", stringify!($name), hex::encode(self.0))
            }
        }

        impl From<[u8; ADDRESS_LEN]> for $name {
            fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
                Self(bytes)
            }
        }
    };
}

define_address!(
    /// An account that owes or is owed assets (trader, liquidity provider, session owner)
    AccountId
);

define_address!(
    /// A tradable asset. [`AssetId::NATIVE`] denotes the chain-native asset.
    AssetId
);

define_address!(
    /// Reference to a registered pricing engine
    QuoterRef
);

impl AssetId {
    /// The chain-native asset, paid with attached native value rather than pulled
    pub const NATIVE: Self = Self::ZERO;

    pub fn is_native(&self) -> bool {
        self.is_zero()
    }
}

/// Canonical 32-byte pool identity
///
/// `keccak256(min(asset0, asset1) || max(asset0, asset1) || quoter || marking_be)`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub [u8; 32]);

impl PoolId {
    /// Derive the pool identity; argument order of the two assets is irrelevant
    pub fn assemble(asset0: AssetId, asset1: AssetId, quoter: QuoterRef, marking: Marking) -> Self {
        let (low, high) = if asset0 <= asset1 {
            (asset0, asset1)
        } else {
            (asset1, asset0)
        };

        let mut hasher = Keccak256::new();
        hasher.update(low.as_bytes());
        hasher.update(high.as_bytes());
        hasher.update(quoter.as_bytes());
        hasher.update(marking.bits().to_be_bytes());

        let mut id = [0u8; 32];
        id.copy_from_slice(&hasher.finalize());
        Self(id)
    }

    #[inline(always)]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId(0x{}..)", hex::encode(&self.0[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hex_roundtrip() {
        let asset = AssetId::from_hex("0x2791bca1f2de4661ed88a30c99a7a9449aa84174").unwrap();
        assert_eq!(
            asset.to_string(),
            "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"
        );
        assert_eq!(AssetId::from_hex(&asset.to_string()).unwrap(), asset);
    }

    #[test]
    fn test_hex_rejects_wrong_length() {
        let err = AssetId::from_hex("0xdeadbeef").unwrap_err();
        assert_eq!(
            err,
            IdentifierError::InvalidLength {
                expected: 20,
                actual: 4
            }
        );
        assert!(matches!(
            QuoterRef::from_hex("0xzz"),
            Err(IdentifierError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_native_asset_is_zero_address() {
        assert!(AssetId::NATIVE.is_native());
        assert!(!AssetId::from_low_u64_be(1).is_native());
    }

    #[test]
    fn test_pool_id_distinguishes_quoter_and_marking() {
        let a = AssetId::from_low_u64_be(1);
        let b = AssetId::from_low_u64_be(2);
        let q1 = QuoterRef::from_low_u64_be(10);
        let q2 = QuoterRef::from_low_u64_be(11);
        let m = Marking::from_bits(0x30);

        let base = PoolId::assemble(a, b, q1, m);
        assert_ne!(base, PoolId::assemble(a, b, q2, m));
        assert_ne!(base, PoolId::assemble(a, b, q1, Marking::from_bits(0x31)));
    }

    fn address() -> impl Strategy<Value = [u8; 20]> {
        prop::array::uniform20(any::<u8>())
    }

    proptest! {
        /// Property: pool identity does not depend on asset argument order
        #[test]
        fn pool_id_is_order_independent(
            a in address(),
            b in address(),
            q in address(),
            bits in any::<u32>(),
        ) {
            prop_assume!(a != b);
            let (a, b, q) = (AssetId(a), AssetId(b), QuoterRef(q));
            let marking = Marking::from_bits(bits);
            prop_assert_eq!(
                PoolId::assemble(a, b, q, marking),
                PoolId::assemble(b, a, q, marking)
            );
        }
    }
}
