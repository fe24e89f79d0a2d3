//! Checked fixed-point helpers
//!
//! Every amount in the engine is an unsigned integer in the asset's native scale.
//! These helpers make the rounding direction explicit at each call site:
//!
//! - [`div_down`] truncates, favouring the trader's counterparty (the pool)
//! - [`div_up`] rounds up, used when extracting fees so the pool never undercharges
//!
//! Products of two amounts can exceed 128 bits, so [`mul_div_down`] and
//! [`mul_div_up`] carry the intermediate in a 256-bit integer and only fail if the
//! final quotient does not fit.

use crate::common::errors::{Result, TwammError};
use crate::constants::MAX_U112;
use ethnum::U256;

/// Truncating division. `a == 0` short-circuits to zero.
#[inline]
pub fn div_down(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(TwammError::DivisionByZero);
    }
    if a == 0 {
        return Ok(0);
    }
    Ok(a / b)
}

/// Ceiling division: `1 + (a - 1) / b` for non-zero `a`.
#[inline]
pub fn div_up(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(TwammError::DivisionByZero);
    }
    if a == 0 {
        return Ok(0);
    }
    Ok(1 + (a - 1) / b)
}

#[inline]
pub fn checked_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(TwammError::Overflow)
}

#[inline]
pub fn checked_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(TwammError::Underflow)
}

#[inline]
pub fn checked_mul(a: u128, b: u128) -> Result<u128> {
    a.checked_mul(b).ok_or(TwammError::Overflow)
}

/// Narrow a 256-bit value, failing instead of truncating
#[inline]
pub fn u256_to_u128(value: U256) -> Result<u128> {
    let (high, low) = value.into_words();
    if high != 0 {
        return Err(TwammError::Overflow);
    }
    Ok(low)
}

/// `floor(a * b / c)` with a 256-bit intermediate
pub fn mul_div_down(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(TwammError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    u256_to_u128(product / U256::from(c))
}

/// `ceil(a * b / c)` with a 256-bit intermediate
pub fn mul_div_up(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(TwammError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    if product == U256::ZERO {
        return Ok(0);
    }
    u256_to_u128((product - U256::ONE) / U256::from(c) + U256::ONE)
}

/// Reject values outside the 112-bit range every ledger bucket is bounded to
#[inline]
pub fn ensure_u112(value: u128) -> Result<u128> {
    if value > MAX_U112 {
        return Err(TwammError::AmountExceedsU112 { value });
    }
    Ok(value)
}

/// Integer square root by Newton's method, truncated
///
/// Starts from `ceil(n / 2)` which is always at or above the root, so the
/// iterate decreases monotonically until it stops moving.
pub fn isqrt(n: U256) -> U256 {
    if n < U256::new(2) {
        return n;
    }
    let mut x = n;
    let mut y = (n >> 1) + (n & U256::ONE);
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }
    x
}

/// `isqrt(a * b)` for two amounts; the root of a product of two `u128` always fits
pub fn isqrt_product(a: u128, b: u128) -> Result<u128> {
    u256_to_u128(isqrt(U256::from(a) * U256::from(b)))
}
