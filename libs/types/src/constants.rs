//! Protocol-wide constants
//!
//! Fee rates are basis points of [`FEE_DENOMINATOR`] (100 = 0.1%). Fractions of a
//! fee are 18-decimal fixed point against [`ONE_18`].

/// Denominator for every fee rate and penalty expressed in basis points
pub const FEE_DENOMINATOR: u128 = 100_000;

/// Upper bound for short-term, partner and long-term fee rates (1%)
pub const MAX_FEE_BP: u32 = 1_000;

/// 18-decimal fixed point unit
pub const ONE_18: u128 = 1_000_000_000_000_000_000;

/// Upper bound for the protocol share of a gross fee (50%)
pub const MAX_PROTOCOL_FEE_FRACTION: u128 = ONE_18 / 2;

/// Shares locked to the null holder on the bootstrap mint
pub const MIN_LIQUIDITY: u128 = 1_000;

/// Largest value any ledger bucket may hold
pub const MAX_U112: u128 = (1u128 << 112) - 1;

/// Proceeds accumulators are scaled by `2^PROCEEDS_SCALE_SHIFT`
pub const PROCEEDS_SCALE_SHIFT: u32 = 64;

/// Valid auxiliary fee shifts, giving 2:1, 4:1, 8:1 and 16:1 LP:auxiliary splits
pub const MIN_FEE_SHIFT: u8 = 1;
pub const MAX_FEE_SHIFT: u8 = 4;

/// Longest order span a pool may allow, in steps
pub const MAX_ORDER_SPAN: u64 = 1 << 32;

/// Upper bound for the early-exit penalty on LP burns (5%)
pub const MAX_HOLDING_PENALTY_BP: u32 = 5_000;
