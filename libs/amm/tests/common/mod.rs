//! Shared fixtures for the integration suites

#![allow(dead_code)]

use tracing_subscriber::EnvFilter;
use twamm_amm::{FeeConfiguration, PoolKind, PoolParams, TwammPool};
use twamm_types::Address;

pub const LP: Address = Address::from_low_byte(0x10);
pub const ALICE: Address = Address::from_low_byte(0xa1);
pub const BOB: Address = Address::from_low_byte(0xb0);
pub const CAROL: Address = Address::from_low_byte(0xc0);

/// Install a test subscriber once; `RUST_LOG=twamm_amm=debug` shows every step
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Liquid preset with a short interval so scenarios stay readable
pub fn params(order_interval: u64) -> PoolParams {
    PoolParams::preset(PoolKind::Liquid).with_order_interval(order_interval)
}

/// Pool bootstrapped by [`LP`] at step 0
pub fn seeded_pool(params: PoolParams, fees: FeeConfiguration, reserves: [u128; 2]) -> TwammPool {
    init_tracing();
    let mut pool = TwammPool::new(params, fees, 0).expect("valid params");
    pool.provide_liquidity(LP, reserves[0], reserves[1], 0)
        .expect("bootstrap liquidity");
    pool
}

/// Vault equals working plus every committed bucket, for both assets
pub fn assert_conserved(pool: &TwammPool) {
    let ledger = pool.ledger();
    for asset in twamm_types::Asset::ALL {
        assert_eq!(
            ledger.vault_balance(asset),
            ledger.working_reserve(asset)
                + ledger.order_principal(asset)
                + ledger.unclaimed_proceeds(asset)
                + ledger.fee_bucket(twamm_amm::FeeBucket::Protocol, asset)
                + ledger.fee_bucket(twamm_amm::FeeBucket::Auxiliary, asset),
            "conservation broken for {asset}"
        );
    }
    pool.audit().expect("audit");
}
