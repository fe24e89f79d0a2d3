//! # TWAMM Pool Configuration
//!
//! Loads the host-settable parameters of a pool and provides the preset defaults
//! for each pool type. Values are only parsed here; the engine validates them
//! when it builds a pool.
//!
//! ## Sources (later sources override earlier ones)
//!
//! 1. Base TOML file (required)
//! 2. `environments/<env>.toml` next to the base file (optional)
//! 3. `TWAMM__<SECTION>__<KEY>` environment variables
//!
//! ## Usage
//!
//! ```rust
//! use twamm_config::{PoolKind, PoolSettings};
//!
//! let settings = PoolSettings::from_toml_str(r#"
//! [pool]
//! pool_type = "liquid"
//!
//! [fees]
//! long_term_bp = 200
//! "#).unwrap();
//!
//! assert_eq!(settings.pool.pool_type, PoolKind::Liquid);
//! assert_eq!(settings.fees.long_term_bp, Some(200));
//! ```

pub mod defaults;
pub mod pool_settings;

pub use defaults::{PoolKind, PoolPreset};
pub use pool_settings::{
    load_settings, FeeSection, LiquiditySection, OrderSection, PoolSection, PoolSettings,
    RemainderPolicy,
};
