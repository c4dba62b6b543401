//! Fixed-Point Math for the Glue Protocol
//!
//! Every ratio is an 18-decimal fixed-point number. Products are taken in a
//! 256-bit intermediate so `a * b / d` never overflows before the division.
//! Amounts that favor the protocol round up, amounts that favor the user
//! round down.

use uint::construct_uint;

use crate::constants::{fees, precision::PRECISION};
use crate::errors::{GlueError, GlueResult};

construct_uint! {
    /// 256-bit unsigned integer used for intermediate products
    pub struct U256(4);
}

/// Rounding direction of a division
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Toward zero (user-favoring)
    Down,
    /// Away from zero (protocol-favoring)
    Up,
}

/// Computes `a * b / denominator` with a full-precision intermediate.
///
/// # Errors
/// `DivisionByZero` for a zero denominator, `Overflow` if the result does
/// not fit in 128 bits.
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> GlueResult<u128> {
    if denominator == 0 {
        return Err(GlueError::DivisionByZero);
    }

    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let (mut quotient, remainder) = product.div_mod(denominator);

    if rounding == Rounding::Up && !remainder.is_zero() {
        quotient = quotient + U256::one();
    }

    if quotient > U256::from(u128::MAX) {
        return Err(GlueError::Overflow);
    }
    Ok(quotient.as_u128())
}

/// Share of outstanding supply being surrendered.
///
/// supply_delta = floor(real_amount * PRECISION / supply_before)
pub fn supply_delta(real_amount: u128, supply_before: u128) -> GlueResult<u128> {
    if real_amount > supply_before {
        return Err(GlueError::ExceedsSupply {
            amount: real_amount,
            supply: supply_before,
        });
    }
    if real_amount == 0 {
        return Ok(0);
    }
    mul_div(real_amount, PRECISION, supply_before, Rounding::Down)
}

/// Collateral available to a redemption: floor(balance * delta / PRECISION)
pub fn collateral_share(balance: u128, supply_delta: u128) -> GlueResult<u128> {
    mul_div(balance, supply_delta.min(PRECISION), PRECISION, Rounding::Down)
}

/// Protocol fee on a payout, rounded up
pub fn protocol_fee(availability: u128) -> GlueResult<u128> {
    mul_div(availability, fees::PROTOCOL_FEE, PRECISION, Rounding::Up)
}

/// Flash loan fee on an allocation, rounded up
pub fn flash_loan_fee(amount: u128) -> GlueResult<u128> {
    mul_div(amount, fees::FLASH_LOAN_FEE, PRECISION, Rounding::Up)
}

/// Operator cut of the protocol fee, rounded down and capped at the fee
pub fn operator_cut(protocol_fee: u128, operator_share: u128) -> GlueResult<u128> {
    let cut = mul_div(protocol_fee, operator_share, PRECISION, Rounding::Down)?;
    Ok(cut.min(protocol_fee))
}

/// Slice of `amount` claimed by a hook; the fraction is capped at 100%
pub fn hook_share(amount: u128, fraction: u128) -> GlueResult<u128> {
    mul_div(amount, fraction.min(PRECISION), PRECISION, Rounding::Down)
}

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> GlueResult<u128> {
    a.checked_add(b).ok_or(GlueError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> GlueResult<u128> {
    a.checked_sub(b).ok_or(GlueError::Underflow)
}
