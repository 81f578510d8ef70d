//! Constant-product (x*y=k) reference quoter
//!
//! Math runs in `Decimal` to avoid floating-point drift; quoted amounts are
//! floored back to integer units so the pool never pays out more than the
//! curve allows. The fee in basis points is the marking's bucket id.

use crate::quoter::{QuoteError, QuoteRequest, Quoter};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::trace;
use types::Marking;

const BPS_DENOMINATOR: u32 = 10_000;

/// Constant-product math with exact decimal arithmetic
pub struct ConstantProductMath;

impl ConstantProductMath {
    /// Exact output amount for the x*y=k curve
    ///
    /// # Arguments
    /// * `amount_in` - Input token amount
    /// * `reserve_in` - Input token reserve
    /// * `reserve_out` - Output token reserve
    /// * `fee_bps` - Fee in basis points (30 = 0.3%)
    pub fn output_amount(
        amount_in: Decimal,
        reserve_in: Decimal,
        reserve_out: Decimal,
        fee_bps: u32,
    ) -> Result<Decimal, QuoteError> {
        if amount_in <= dec!(0) {
            return Err(QuoteError::Math("Input amount must be positive".into()));
        }
        if reserve_in <= dec!(0) || reserve_out <= dec!(0) {
            return Err(QuoteError::Math("Reserves must be positive".into()));
        }
        if fee_bps >= BPS_DENOMINATOR {
            return Err(QuoteError::Math(format!("Fee {fee_bps} bps consumes the whole input")));
        }

        // amount_in_after_fee = amount_in * (10000 - fee_bps) / 10000
        let fee_multiplier = Decimal::from(BPS_DENOMINATOR - fee_bps) / dec!(10000);
        let amount_in_after_fee = amount_in
            .checked_mul(fee_multiplier)
            .ok_or_else(|| QuoteError::Math("fee adjustment overflow".into()))?;

        // output = (amount_in_after_fee * reserve_out) / (reserve_in + amount_in_after_fee)
        let denominator = reserve_in
            .checked_add(amount_in_after_fee)
            .ok_or_else(|| QuoteError::Math("denominator overflow".into()))?;

        let output = match amount_in_after_fee.checked_mul(reserve_out) {
            Some(numerator) => numerator.checked_div(denominator),
            // Large reserves: take the ratio first, it is always <= 1
            None => (amount_in_after_fee / denominator).checked_mul(reserve_out),
        };
        output.ok_or_else(|| QuoteError::Math("output overflow".into()))
    }
}

/// Reference strategy quoting every bucket on the constant-product curve
#[derive(Debug, Clone, Default)]
pub struct ConstantProductQuoter {
    fixed_fee_bps: Option<u32>,
}

impl ConstantProductQuoter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore the marking bucket and charge `fee_bps` on every pool
    pub fn with_fixed_fee(fee_bps: u32) -> Self {
        Self {
            fixed_fee_bps: Some(fee_bps),
        }
    }

    pub fn fee_bps(&self, marking: Marking) -> u32 {
        self.fixed_fee_bps.unwrap_or(marking.bucket() as u32)
    }
}

fn to_decimal(amount: u128) -> Result<Decimal, QuoteError> {
    Decimal::from_u128(amount).ok_or(QuoteError::AmountOutOfRange { amount })
}

impl Quoter for ConstantProductQuoter {
    fn quote(&self, request: &QuoteRequest) -> Result<u128, QuoteError> {
        if request.amount_in == 0 {
            return Ok(0);
        }

        let (reserve_in, reserve_out) = request.directed_reserves();
        if reserve_in == 0 || reserve_out == 0 {
            return Err(QuoteError::EmptyReserves {
                reserve_in,
                reserve_out,
            });
        }

        let fee_bps = self.fee_bps(request.marking);
        let output = ConstantProductMath::output_amount(
            to_decimal(request.amount_in)?,
            to_decimal(reserve_in)?,
            to_decimal(reserve_out)?,
            fee_bps,
        )?;

        let amount_out = output
            .floor()
            .to_u128()
            .ok_or_else(|| QuoteError::Math(format!("output {output} not representable")))?
            // Decimal rounding must never hand out the whole reserve
            .min(reserve_out - 1);

        trace!(
            amount_in = request.amount_in,
            amount_out,
            fee_bps,
            "constant-product quote"
        );
        Ok(amount_out)
    }

    fn name(&self) -> &str {
        "constant-product"
    }
}
