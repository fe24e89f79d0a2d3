//! Error taxonomy for the TWAMM engine
//!
//! Errors fall into three classes:
//!
//! - **Validation**: caller-correctable, returned before any state is touched
//! - **Invariant**: the engine detected an inconsistency in its own books
//! - **Arithmetic**: checked arithmetic overflowed or divided by zero
//!
//! Invariant and arithmetic errors are fatal: the pool that raised one halts.

use crate::common::identifiers::{Asset, OrderId};
use thiserror::Error;

/// Broad classification used by hosts to decide between "reject" and "halt"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Invariant,
    Arithmetic,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TwammError {
    #[error("Fee rate {rate_bp} exceeds maximum {max_bp} (denominator 100000)")]
    InvalidFeeRate { rate_bp: u32, max_bp: u32 },

    #[error("Fee shift {shift} must be between 1 and 4")]
    InvalidFeeShift { shift: u8 },

    #[error("Protocol fee fraction {fraction} exceeds maximum {max}")]
    InvalidProtocolFeeFraction { fraction: u128, max: u128 },

    #[error("Order interval must be non-zero")]
    InvalidOrderInterval,

    #[error("Max intervals {max_intervals} at interval {order_interval} exceeds the longest order span")]
    InvalidMaxIntervals { max_intervals: u64, order_interval: u64 },

    #[error("Holding penalty {penalty_bp} exceeds maximum {max_bp}")]
    InvalidHoldingPenalty { penalty_bp: u32, max_bp: u32 },

    #[error("Amount must be non-zero")]
    ZeroAmount,

    #[error("Order amount {amount} is below one unit per step over {trade_steps} steps")]
    OrderAmountTooSmall { amount: u128, trade_steps: u64 },

    #[error("Interval count {count} exceeds maximum {max}")]
    IntervalCountTooLarge { count: u64, max: u64 },

    #[error("Actor is neither owner nor delegate of {order_id}")]
    NotOwnerOrDelegate { order_id: OrderId },

    #[error("Delegate of {order_id} may only withdraw to the owner")]
    RecipientNotOwner { order_id: OrderId },

    #[error("{order_id} expired at step {expiry_step} (current step {current_step})")]
    AlreadyExpired {
        order_id: OrderId,
        expiry_step: u64,
        current_step: u64,
    },

    #[error("{order_id} is already cancelled or withdrawn")]
    AlreadyTerminal { order_id: OrderId },

    #[error("{order_id} not found")]
    OrderNotFound { order_id: OrderId },

    #[error("Initial liquidity of {shares} shares does not exceed the minimum {min}")]
    InsufficientInitialLiquidity { shares: u128, min: u128 },

    #[error("Deposit is too small to mint any shares")]
    InsufficientLiquidityMinted,

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },

    #[error("Insufficient {asset} balance: requested {requested}, available {available}")]
    InsufficientBalance {
        asset: Asset,
        requested: u128,
        available: u128,
    },

    #[error("Pool has no liquidity yet")]
    PoolNotInitialized,

    #[error("Pool already has liquidity")]
    PoolAlreadyInitialized,

    #[error("Pool is paused")]
    PoolPaused,

    #[error("Step {step} is before the last executed step {last_executed}")]
    StepRegression { step: u64, last_executed: u64 },

    #[error("Value {value} exceeds the 112-bit range")]
    AmountExceedsU112 { value: u128 },

    #[error("Pool {pool_id} not found")]
    PoolNotFound { pool_id: u64 },

    #[error("Pool {pool_id} already registered")]
    PoolExists { pool_id: u64 },

    #[error("Conservation violated for {asset}: {detail}")]
    ConservationViolation { asset: Asset, detail: String },

    #[error("Two-sided update overran its inputs: reserve {reserve} > sum {sum} for {asset}")]
    ApproximationViolation {
        asset: Asset,
        reserve: u128,
        sum: u128,
    },

    #[error("Pool halted after a fatal error")]
    PoolHalted,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Division by zero")]
    DivisionByZero,
}

impl TwammError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConservationViolation { .. }
            | Self::ApproximationViolation { .. }
            | Self::PoolHalted => ErrorCategory::Invariant,
            Self::Overflow | Self::Underflow | Self::DivisionByZero => ErrorCategory::Arithmetic,
            _ => ErrorCategory::Validation,
        }
    }

    /// Fatal errors mean "halt the pool", never "retry"
    pub fn is_fatal(&self) -> bool {
        self.category() != ErrorCategory::Validation
    }
}

pub type Result<T> = std::result::Result<T, TwammError>;
