//! # TWAMM Engine - Accounting and Virtual Order Execution
//!
//! ## Purpose
//!
//! State-transition engine for a two-asset time-weighted average market maker.
//! Long-term orders sell a fixed amount continuously over many steps; the engine
//! batches those sales between the steps at which callers touch the pool, splits
//! every fee between LPs, the protocol and an auxiliary recipient, and keeps the
//! vault balance reconciled against every internal bucket after each operation.
//!
//! ## Integration Points
//!
//! - **Clock**: the host passes the current step to every call; the engine never reads time
//! - **Custody**: receipts carry the exact amounts the host transfers in or out
//! - **Configuration**: [`PoolSettings`] from `twamm-config`, or presets per [`PoolKind`]
//! - **Concurrency**: [`PoolRegistry`] serializes access per pool
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────┐
//!  caller ──▶│  TwammPool   │── receipts ──▶ host custody
//!            └──────┬───────┘
//!                   │ advance to step, then mutate
//!       ┌───────────┼──────────────┬───────────────┐
//!       ▼           ▼              ▼               ▼
//!  execution     orders        lp supply       fees
//!       │        sales_rate        │               │
//!       └───────────┴──────────────┴───────┬───────┘
//!                                          ▼
//!                                   ledger (ReserveState)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use twamm_amm::{FeeConfiguration, PoolParams, TwammPool};
//! use twamm_types::{Address, Direction};
//!
//! let lp = Address::from_low_byte(1);
//! let trader = Address::from_low_byte(2);
//! let params = PoolParams::default().with_order_interval(100);
//! let mut pool = TwammPool::new(params, FeeConfiguration::default(), 0).unwrap();
//!
//! pool.provide_liquidity(lp, 1_000_000, 1_000_000, 0).unwrap();
//! let order = pool
//!     .submit_order(trader, None, Direction::ZeroToOne, 1_000, 3, 99)
//!     .unwrap();
//! assert_eq!(order.selling_rate, 3);
//! assert_eq!(order.refunded, 97);
//!
//! let done = pool.withdraw_order(order.order_id, trader, trader, 400).unwrap();
//! assert!(done.closed);
//! pool.audit().unwrap();
//! ```

pub mod execution;
pub mod fees;
pub mod history;
pub mod ledger;
pub mod lp;
pub mod orders;
pub mod params;
pub mod pool;
pub mod pool_traits;
pub mod registry;
pub mod sales_rate;

pub use execution::{Advance, StepReport, VirtualOrderEngine};
pub use fees::{FeeConfiguration, LongTermFee, ShortTermFee, SwapKind};
pub use history::VersionHistory;
pub use ledger::{FeeBucket, ReserveState};
pub use lp::{BurnAmount, JoinEvent, LpMath, LpSupply};
pub use orders::{plan_order, LongTermOrder, OrderBook, OrderPlan, OrderState};
pub use params::PoolParams;
pub use pool::{
    BurnReceipt, CancelReceipt, FeeSweep, LiquidityReceipt, OrderProceeds, OrderReceipt,
    SwapReceipt, TwammPool, VirtualReserves, WithdrawReceipt,
};
pub use pool_traits::AmmPool;
pub use registry::{PoolRegistry, RegistryStats, SharedPool};
pub use sales_rate::{proceeds_between, ProceedsAccumulator, SalesRateAggregate};

pub use twamm_config::{PoolKind, PoolSettings, RemainderPolicy};

/// Common types for price queries
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
