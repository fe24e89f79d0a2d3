//! # TWAMM Shared Types
//!
//! Types shared by every TWAMM crate: the error taxonomy, checked fixed-point
//! helpers, identifiers and protocol-wide constants.
//!
//! ## Design Principles
//!
//! - **Integer Only**: All amounts are `u128` in the asset's native scale, bounded to 112 bits
//! - **Checked Arithmetic**: Every helper returns [`Result`] instead of wrapping
//! - **Explicit Rounding**: Callers pick [`div_down`] or [`div_up`] at every division
//! - **Wide Intermediates**: Products of two amounts go through 256-bit integers
//!
//! ## Quick Start
//!
//! ```rust
//! use twamm_types::{div_up, mul_div_down, FEE_DENOMINATOR};
//!
//! // 0.3% fee on 1_000_001 units, rounded in favour of the pool
//! let gross = div_up(1_000_001 * 300, FEE_DENOMINATOR).unwrap();
//! assert_eq!(gross, 3_001);
//!
//! // reserve_out * amount / reserve_in without overflowing u128
//! let out = mul_div_down(u128::MAX >> 20, 1 << 30, 1 << 40).unwrap();
//! assert_eq!(out, (u128::MAX >> 20) >> 10);
//! ```

pub mod common;
pub mod constants;

pub use common::errors::{ErrorCategory, Result, TwammError};
pub use common::fixed_point::{
    checked_add, checked_mul, checked_sub, div_down, div_up, ensure_u112, isqrt, isqrt_product,
    mul_div_down, mul_div_up, u256_to_u128,
};
pub use common::identifiers::{Address, Asset, Direction, OrderId, PoolId};
pub use constants::*;

/// 256-bit unsigned integer used for wide intermediates and proceeds accumulators
pub use ethnum::U256;
