//! Pool Settings Module
//!
//! Provides settings loading for TWAMM pools. Supports loading from TOML files
//! with environment-specific overrides and `TWAMM__` environment variables.

use crate::defaults::PoolKind;
use anyhow::{Context, Result};
use config_crate::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use twamm_types::Address;

/// Complete settings document for one pool
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PoolSettings {
    #[serde(default)]
    pub pool: PoolSection,

    #[serde(default)]
    pub fees: FeeSection,

    #[serde(default)]
    pub liquidity: LiquiditySection,

    #[serde(default)]
    pub orders: OrderSection,
}

/// Pool type and interval overrides
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PoolSection {
    #[serde(default)]
    pub pool_type: PoolKind,

    /// Steps between allowed order expiry boundaries
    pub order_interval: Option<u64>,

    /// Longest order, in intervals
    pub max_intervals: Option<u64>,

    #[serde(default)]
    pub paused: bool,
}

/// Fee rates and collection switches; unset rates fall back to the pool type preset
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct FeeSection {
    pub short_term_bp: Option<u32>,
    pub partner_bp: Option<u32>,
    pub long_term_bp: Option<u32>,

    #[serde(default)]
    pub collect_protocol_fee: bool,

    /// Protocol share of the gross fee, 18-decimal fixed point
    pub protocol_fee_fraction: Option<u64>,

    #[serde(default)]
    pub collect_auxiliary_fee: bool,

    pub auxiliary_recipient: Option<Address>,

    pub fee_shift: Option<u8>,
}

/// LP early-exit parameters
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct LiquiditySection {
    pub holding_period: Option<u64>,
    pub holding_penalty_bp: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct OrderSection {
    #[serde(default)]
    pub remainder_policy: RemainderPolicy,
}

/// What happens to the amount truncated away when a long-term order's total is
/// divided into a per-step selling rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Returned to the submitter in the same operation
    #[default]
    Refund,
    /// Kept by the pool as a donation to LPs
    Retain,
}

impl PoolSettings {
    /// Load settings from a base file with an optional environment overlay
    pub fn load(base_path: &Path, environment: Option<&str>) -> Result<Self> {
        Self::load_with_env(base_path, environment, None)
    }

    /// Same as [`PoolSettings::load`], with an explicit environment-variable map
    /// in place of the process environment
    pub fn load_with_env(
        base_path: &Path,
        environment: Option<&str>,
        env_source: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::from(base_path).required(true));

        if let Some(env) = environment {
            let env_file = base_path
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment pool settings: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment pool settings not found: {:?}", env_file);
            }
        }

        Self::finish(builder, env_source)
            .with_context(|| format!("Failed to load pool settings from {:?}", base_path))
    }

    /// Parse settings from an in-memory TOML document, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .context("Failed to build pool settings")?
            .try_deserialize()
            .context("Failed to deserialize pool settings")
    }

    /// Render as TOML, e.g. to persist the effective settings next to a pool snapshot
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize pool settings")
    }

    fn finish(
        builder: ConfigBuilder<config_crate::builder::DefaultState>,
        env_source: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        // Override with environment variables (TWAMM__SECTION__KEY)
        let builder = builder.add_source(
            Environment::with_prefix("TWAMM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env_source),
        );

        let config = builder.build().context("Failed to build pool settings")?;
        let settings: Self = config
            .try_deserialize()
            .context("Failed to deserialize pool settings")?;

        debug!(
            pool_type = ?settings.pool.pool_type,
            collect_protocol_fee = settings.fees.collect_protocol_fee,
            collect_auxiliary_fee = settings.fees.collect_auxiliary_fee,
            "Pool settings loaded"
        );
        Ok(settings)
    }
}

/// Convenience function: load `pool.toml` from a directory with an optional environment
pub fn load_settings(dir: &Path, environment: Option<&str>) -> Result<PoolSettings> {
    let base: PathBuf = dir.join("pool.toml");
    PoolSettings::load(&base, environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BASE: &str = r#"
[pool]
pool_type = "stable"
order_interval = 100

[fees]
short_term_bp = 20
collect_protocol_fee = true
protocol_fee_fraction = 250000000000000000
collect_auxiliary_fee = true
auxiliary_recipient = "0x00000000000000000000000000000000000000fe"
fee_shift = 2

[liquidity]
holding_period = 600

[orders]
remainder_policy = "retain"
"#;

    #[test]
    fn test_load_base_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        fs::write(&path, BASE).unwrap();

        let settings = PoolSettings::load_with_env(&path, None, Some(HashMap::new())).unwrap();

        assert_eq!(settings.pool.pool_type, PoolKind::Stable);
        assert_eq!(settings.pool.order_interval, Some(100));
        assert_eq!(settings.pool.max_intervals, None);
        assert_eq!(settings.fees.short_term_bp, Some(20));
        assert!(settings.fees.collect_protocol_fee);
        assert_eq!(settings.fees.protocol_fee_fraction, Some(250_000_000_000_000_000));
        assert_eq!(
            settings.fees.auxiliary_recipient,
            Some(Address::from_low_byte(0xfe))
        );
        assert_eq!(settings.fees.fee_shift, Some(2));
        assert_eq!(settings.liquidity.holding_period, Some(600));
        assert_eq!(settings.orders.remainder_policy, RemainderPolicy::Retain);
    }

    #[test]
    fn test_environment_overlay_and_variables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        fs::write(&path, BASE).unwrap();
        fs::create_dir(dir.path().join("environments")).unwrap();
        fs::write(
            dir.path().join("environments").join("staging.toml"),
            "[fees]\nshort_term_bp = 30\npartner_bp = 15\n",
        )
        .unwrap();

        let env = HashMap::from([(
            "TWAMM__FEES__PARTNER_BP".to_string(),
            "12".to_string(),
        )]);
        let settings = PoolSettings::load_with_env(&path, Some("staging"), Some(env)).unwrap();

        // overlay beats base, variables beat overlay
        assert_eq!(settings.fees.short_term_bp, Some(30));
        assert_eq!(settings.fees.partner_bp, Some(12));
        assert_eq!(settings.pool.pool_type, PoolKind::Stable);
    }

    #[test]
    fn test_missing_environment_file_is_not_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pool.toml"), BASE).unwrap();

        let settings = load_settings(dir.path(), Some("does-not-exist"));
        assert!(settings.is_ok());
    }

    #[test]
    fn test_missing_base_file_fails() {
        let dir = tempdir().unwrap();
        let err = PoolSettings::load(&dir.path().join("pool.toml"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to load pool settings"));
    }

    #[test]
    fn test_defaults_from_empty_document() {
        let settings = PoolSettings::from_toml_str("").unwrap();
        assert_eq!(settings, PoolSettings::default());
        assert_eq!(settings.pool.pool_type, PoolKind::Liquid);
        assert_eq!(settings.orders.remainder_policy, RemainderPolicy::Refund);
    }

    #[test]
    fn test_toml_rendering_parses_back() {
        let settings = PoolSettings::from_toml_str(BASE).unwrap();
        let rendered = settings.to_toml_string().unwrap();
        assert_eq!(PoolSettings::from_toml_str(&rendered).unwrap(), settings);
    }
}
