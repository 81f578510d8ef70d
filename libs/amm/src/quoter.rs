//! Quoter trait definitions for the pluggable pricing boundary

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::{AssetId, Marking, PoolId, QuoterRef};

/// Pricing engine failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Batch request length mismatch: {markings} markings, {amounts} amounts, {reserves0}/{reserves1} reserves")]
    LengthMismatch {
        markings: usize,
        amounts: usize,
        reserves0: usize,
        reserves1: usize,
    },

    #[error("Reserves must be positive (reserve_in={reserve_in}, reserve_out={reserve_out})")]
    EmptyReserves { reserve_in: u128, reserve_out: u128 },

    #[error("Amount {amount} cannot be represented in quoter arithmetic")]
    AmountOutOfRange { amount: u128 },

    #[error("Invalid calculation: {0}")]
    Math(String),
}

/// Single-bucket quote request; reserves are in canonical (asset0, asset1) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub asset0: AssetId,
    pub asset1: AssetId,
    pub marking: Marking,
    pub amount_in: u128,
    /// `true` when asset0 is sold for asset1
    pub zero_for_one: bool,
    pub reserve0: u128,
    pub reserve1: u128,
}

impl QuoteRequest {
    /// (reserve_in, reserve_out) for this request's direction
    pub fn directed_reserves(&self) -> (u128, u128) {
        if self.zero_for_one {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }
}

/// Multi-bucket request against one pair and one quoter; vectors are parallel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQuoteRequest {
    pub asset0: AssetId,
    pub asset1: AssetId,
    pub quoter: QuoterRef,
    pub markings: Vec<Marking>,
    pub amounts_in: Vec<u128>,
    pub zero_for_one: bool,
    pub reserves0: Vec<u128>,
    pub reserves1: Vec<u128>,
}

impl BatchQuoteRequest {
    pub fn len(&self) -> usize {
        self.markings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markings.is_empty()
    }

    /// Check that every parallel vector has the same length
    pub fn validate(&self) -> Result<(), QuoteError> {
        let n = self.markings.len();
        if self.amounts_in.len() != n || self.reserves0.len() != n || self.reserves1.len() != n {
            return Err(QuoteError::LengthMismatch {
                markings: n,
                amounts: self.amounts_in.len(),
                reserves0: self.reserves0.len(),
                reserves1: self.reserves1.len(),
            });
        }
        Ok(())
    }

    /// The i-th bucket as a single request
    pub fn entry(&self, index: usize) -> QuoteRequest {
        QuoteRequest {
            asset0: self.asset0,
            asset1: self.asset1,
            marking: self.markings[index],
            amount_in: self.amounts_in[index],
            zero_for_one: self.zero_for_one,
            reserve0: self.reserves0[index],
            reserve1: self.reserves1[index],
        }
    }
}

/// Batch response: one output and one pool id per requested bucket
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchQuote {
    pub amounts_out: Vec<u128>,
    pub pool_ids: Vec<PoolId>,
}

/// Unified pricing interface
pub trait Quoter: Send + Sync {
    /// Output amount for one bucket
    fn quote(&self, request: &QuoteRequest) -> Result<u128, QuoteError>;

    /// Output amounts for several buckets of one pair in one call
    fn quote_batch(&self, request: &BatchQuoteRequest) -> Result<BatchQuote, QuoteError> {
        request.validate()?;

        let mut quote = BatchQuote {
            amounts_out: Vec::with_capacity(request.len()),
            pool_ids: Vec::with_capacity(request.len()),
        };
        for index in 0..request.len() {
            let entry = request.entry(index);
            quote.amounts_out.push(self.quote(&entry)?);
            quote.pool_ids.push(PoolId::assemble(
                request.asset0,
                request.asset1,
                request.quoter,
                entry.marking,
            ));
        }
        Ok(quote)
    }

    /// Short human-readable name for logs
    fn name(&self) -> &str {
        "quoter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns half the input regardless of reserves
    struct HalfQuoter;

    impl Quoter for HalfQuoter {
        fn quote(&self, request: &QuoteRequest) -> Result<u128, QuoteError> {
            Ok(request.amount_in / 2)
        }
    }

    fn batch(markings: Vec<Marking>, amounts: Vec<u128>) -> BatchQuoteRequest {
        let n = markings.len();
        BatchQuoteRequest {
            asset0: AssetId::from_low_u64_be(1),
            asset1: AssetId::from_low_u64_be(2),
            quoter: QuoterRef::from_low_u64_be(3),
            markings,
            amounts_in: amounts,
            zero_for_one: true,
            reserves0: vec![1_000; n],
            reserves1: vec![1_000; n],
        }
    }

    #[test]
    fn test_default_batch_loops_single_quotes() {
        let request = batch(
            vec![Marking::from_bits(0x10), Marking::from_bits(0x20)],
            vec![100, 40],
        );
        let quote = HalfQuoter.quote_batch(&request).unwrap();

        assert_eq!(quote.amounts_out, vec![50, 20]);
        assert_eq!(
            quote.pool_ids[1],
            PoolId::assemble(
                request.asset0,
                request.asset1,
                request.quoter,
                Marking::from_bits(0x20)
            )
        );
    }

    #[test]
    fn test_default_batch_rejects_ragged_request() {
        let mut request = batch(vec![Marking::from_bits(0x10)], vec![100]);
        request.reserves1.push(5);

        assert!(matches!(
            HalfQuoter.quote_batch(&request),
            Err(QuoteError::LengthMismatch { reserves1: 2, .. })
        ));
    }

    #[test]
    fn test_directed_reserves() {
        let mut request = batch(vec![Marking::default()], vec![1]).entry(0);
        request.reserve0 = 7;
        request.reserve1 = 9;
        assert_eq!(request.directed_reserves(), (7, 9));
        request.zero_for_one = false;
        assert_eq!(request.directed_reserves(), (9, 7));
    }
}
