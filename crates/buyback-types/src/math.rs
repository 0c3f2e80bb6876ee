//! Fixed-point helpers.
//!
//! Prices and discounts are [`Decimal`] values carrying at most
//! [`PRECISION`] fractional digits. Arithmetic that ends in an integer token
//! or payment amount is done on "atto" integers (`value × 10^18` as `u128`)
//! with floor division, so every conversion truncates toward zero and every
//! node computes the same result.
//!
//! ```text
//!   Decimal 0.2375  ──to_atto──►  237_500_000_000_000_000
//!   mul_div_floor(100e18, 237.5e15, 1e18)  ──►  23.75e18
//! ```

use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{ONE, PRECISION};
use crate::error::{BuybackError, Result};

/// Truncate a decimal to [`PRECISION`] fractional digits, toward zero.
#[must_use]
pub fn truncate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION, RoundingStrategy::ToZero)
}

/// Convert a non-negative decimal into its 18-digit fixed-point integer.
pub fn to_atto(value: Decimal) -> Result<u128> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(BuybackError::Arithmetic(format!(
            "negative fixed-point value {value}"
        )));
    }
    let value = truncate(value);
    let mantissa = u128::try_from(value.mantissa())
        .map_err(|_| BuybackError::Arithmetic(format!("negative mantissa in {value}")))?;
    let factor = 10u128
        .checked_pow(PRECISION - value.scale())
        .ok_or_else(|| BuybackError::Arithmetic("scale factor overflow".into()))?;
    mantissa
        .checked_mul(factor)
        .ok_or_else(|| BuybackError::Arithmetic(format!("fixed-point overflow for {value}")))
}

/// Convert an 18-digit fixed-point integer back into a decimal.
pub fn from_atto(value: u128) -> Result<Decimal> {
    let signed = i128::try_from(value)
        .map_err(|_| BuybackError::Arithmetic(format!("fixed-point value {value} too large")))?;
    Decimal::try_from_i128_with_scale(signed, PRECISION)
        .map(|d| d.normalize())
        .map_err(|e| BuybackError::Arithmetic(format!("cannot represent {value}e-18: {e}")))
}

/// `floor(a × b / c)` without intermediate overflow where avoidable.
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(BuybackError::Arithmetic("division by zero".into()));
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / c);
    }
    // a×b = (q·c + r)·b  →  q·b + r·b/c, exact under floor division.
    split_mul_div(a, b, c)
        .or_else(|| split_mul_div(b, a, c))
        .ok_or_else(|| BuybackError::Arithmetic(format!("overflow computing {a} × {b} / {c}")))
}

fn split_mul_div(a: u128, b: u128, c: u128) -> Option<u128> {
    let q = a / c;
    let r = a % c;
    q.checked_mul(b)?.checked_add(r.checked_mul(b)? / c)
}

/// `1 − fraction` in fixed point. The fraction must be below one.
pub fn complement(fraction: Decimal) -> Result<u128> {
    let atto = to_atto(fraction)?;
    ONE.checked_sub(atto)
        .ok_or_else(|| BuybackError::Arithmetic(format!("fraction {fraction} exceeds one")))
}

/// Multiply a fixed-point price by a fixed-point factor, flooring.
pub fn mul_price(price: Decimal, factor_atto: u128) -> Result<Decimal> {
    from_atto(mul_div_floor(to_atto(price)?, factor_atto, ONE)?)
}
