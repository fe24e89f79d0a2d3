//! Pool-level parameters that are not fees
//!
//! Built from a [`PoolKind`] preset and optionally overridden from
//! [`PoolSettings`]. Validation happens here so a constructed [`PoolParams`] is
//! always usable by the engine.

use twamm_config::defaults::{DEFAULT_HOLDING_PENALTY_BP, DEFAULT_HOLDING_PERIOD};
use twamm_config::{PoolKind, PoolSettings, RemainderPolicy};
use twamm_types::{Result, TwammError, MAX_HOLDING_PENALTY_BP, MAX_ORDER_SPAN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    pub kind: PoolKind,
    /// Steps between allowed order expiry boundaries
    pub order_interval: u64,
    /// Longest order, in intervals
    pub max_intervals: u64,
    /// Steps freshly minted shares must be held to avoid the early-exit penalty
    pub holding_period: u64,
    /// Early-exit penalty in basis points of 100 000
    pub holding_penalty_bp: u32,
    pub remainder_policy: RemainderPolicy,
}

impl PoolParams {
    pub fn preset(kind: PoolKind) -> Self {
        let preset = kind.preset();
        Self {
            kind,
            order_interval: preset.order_interval,
            max_intervals: preset.max_intervals,
            holding_period: DEFAULT_HOLDING_PERIOD,
            holding_penalty_bp: DEFAULT_HOLDING_PENALTY_BP,
            remainder_policy: RemainderPolicy::Refund,
        }
    }

    pub fn from_settings(settings: &PoolSettings) -> Result<Self> {
        let mut params = Self::preset(settings.pool.pool_type);
        if let Some(interval) = settings.pool.order_interval {
            params.order_interval = interval;
        }
        if let Some(max) = settings.pool.max_intervals {
            params.max_intervals = max;
        }
        if let Some(period) = settings.liquidity.holding_period {
            params.holding_period = period;
        }
        if let Some(penalty) = settings.liquidity.holding_penalty_bp {
            params.holding_penalty_bp = penalty;
        }
        params.remainder_policy = settings.orders.remainder_policy;
        params.validate()?;
        Ok(params)
    }

    pub fn with_order_interval(mut self, order_interval: u64) -> Self {
        self.order_interval = order_interval;
        self
    }

    pub fn with_holding(mut self, holding_period: u64, holding_penalty_bp: u32) -> Self {
        self.holding_period = holding_period;
        self.holding_penalty_bp = holding_penalty_bp;
        self
    }

    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.order_interval == 0 {
            return Err(TwammError::InvalidOrderInterval);
        }
        let span = self
            .max_intervals
            .checked_add(1)
            .and_then(|count| count.checked_mul(self.order_interval));
        if !matches!(span, Some(span) if span <= MAX_ORDER_SPAN) {
            return Err(TwammError::InvalidMaxIntervals {
                max_intervals: self.max_intervals,
                order_interval: self.order_interval,
            });
        }
        if self.holding_penalty_bp > MAX_HOLDING_PENALTY_BP {
            return Err(TwammError::InvalidHoldingPenalty {
                penalty_bp: self.holding_penalty_bp,
                max_bp: MAX_HOLDING_PENALTY_BP,
            });
        }
        Ok(())
    }
}

impl Default for PoolParams {
    fn default() -> Self {
        Self::preset(PoolKind::default())
    }
}
