//! Pool type presets
//!
//! Each pool type trades off order granularity against execution cost: stable
//! pairs settle on short intervals and charge little, volatile pairs settle on
//! long intervals and charge more.

use serde::{Deserialize, Serialize};

/// Steps an LP must hold freshly minted shares to avoid the early-exit penalty
pub const DEFAULT_HOLDING_PERIOD: u64 = 7_200;

/// Early-exit penalty in basis points of 100 000 (1%)
pub const DEFAULT_HOLDING_PENALTY_BP: u32 = 1_000;

/// Default protocol share of gross fees, 18-decimal (0%)
pub const DEFAULT_PROTOCOL_FEE_FRACTION: u64 = 0;

/// Default auxiliary fee shift (8:1 LP:auxiliary)
pub const DEFAULT_FEE_SHIFT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    Stable,
    #[default]
    Liquid,
    Volatile,
}

/// Default parameters for one pool type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPreset {
    pub order_interval: u64,
    pub max_intervals: u64,
    pub short_term_bp: u32,
    pub partner_bp: u32,
    pub long_term_bp: u32,
}

impl PoolKind {
    pub const fn preset(self) -> PoolPreset {
        match self {
            PoolKind::Stable => PoolPreset {
                order_interval: 75,
                max_intervals: 176_102,
                short_term_bp: 10,
                partner_bp: 5,
                long_term_bp: 30,
            },
            PoolKind::Liquid => PoolPreset {
                order_interval: 300,
                max_intervals: 43_830,
                short_term_bp: 50,
                partner_bp: 25,
                long_term_bp: 150,
            },
            PoolKind::Volatile => PoolPreset {
                order_interval: 1_200,
                max_intervals: 10_957,
                short_term_bp: 100,
                partner_bp: 50,
                long_term_bp: 300,
            },
        }
    }
}
