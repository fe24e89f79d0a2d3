//! Pool registry
//!
//! Hosts running many pools keep them here. Each pool sits behind its own
//! mutex so operations on one pool are serialized while independent pools
//! proceed in parallel. The map itself is sharded ([`DashMap`]), so lookups
//! never contend with a long-running pool operation.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use twamm_types::{PoolId, Result, TwammError};

use crate::pool::TwammPool;

pub type SharedPool = Arc<Mutex<TwammPool>>;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_pools: usize,
    pub halted_pools: usize,
    pub total_operations: u64,
    pub failed_operations: u64,
}

#[derive(Default)]
pub struct PoolRegistry {
    pools: DashMap<PoolId, SharedPool>,
    stats: RwLock<RegistryStats>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, pool_id: PoolId, pool: TwammPool) -> Result<SharedPool> {
        let shared = Arc::new(Mutex::new(pool));
        match self.pools.entry(pool_id) {
            Entry::Occupied(_) => {
                return Err(TwammError::PoolExists {
                    pool_id: pool_id.inner(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&shared));
            }
        }
        self.stats.write().total_pools = self.pools.len();
        info!(%pool_id, "Pool registered");
        Ok(shared)
    }

    pub fn get(&self, pool_id: PoolId) -> Option<SharedPool> {
        self.pools.get(&pool_id).map(|entry| entry.value().clone())
    }

    /// Run `op` with exclusive access to one pool
    pub fn with_pool<T>(&self, pool_id: PoolId, op: impl FnOnce(&mut TwammPool) -> Result<T>) -> Result<T> {
        let shared = self.get(pool_id).ok_or(TwammError::PoolNotFound {
            pool_id: pool_id.inner(),
        })?;
        let mut pool = shared.lock();
        let was_halted = pool.is_halted();
        let result = op(&mut pool);

        let mut stats = self.stats.write();
        stats.total_operations += 1;
        if result.is_err() {
            stats.failed_operations += 1;
        }
        if !was_halted && pool.is_halted() {
            stats.halted_pools += 1;
            warn!(%pool_id, "Registered pool halted");
        }
        result
    }

    pub fn remove(&self, pool_id: PoolId) -> Option<SharedPool> {
        let removed = self.pools.remove(&pool_id).map(|(_, pool)| pool);
        if let Some(pool) = &removed {
            // pool lock before stats lock, same order as with_pool
            let halted = pool.lock().is_halted();
            let mut stats = self.stats.write();
            stats.total_pools = self.pools.len();
            if halted {
                stats.halted_pools = stats.halted_pools.saturating_sub(1);
            }
            info!(%pool_id, "Pool removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn pool_ids(&self) -> Vec<PoolId> {
        let mut ids: Vec<PoolId> = self.pools.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FeeConfiguration, PoolParams};
    use std::thread;
    use twamm_types::Address;

    fn pool() -> TwammPool {
        let mut pool = TwammPool::new(PoolParams::default(), FeeConfiguration::default(), 0).unwrap();
        pool.provide_liquidity(Address::from_low_byte(1), 1_000_000, 1_000_000, 0)
            .unwrap();
        pool
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = PoolRegistry::new();
        registry.register(PoolId::new(2), pool()).unwrap();
        registry.register(PoolId::new(1), pool()).unwrap();

        assert!(matches!(
            registry.register(PoolId::new(1), pool()),
            Err(TwammError::PoolExists { pool_id: 1 })
        ));
        assert_eq!(registry.pool_ids(), vec![PoolId::new(1), PoolId::new(2)]);
        assert_eq!(
            registry.with_pool(PoolId::new(7), |p| Ok(p.total_shares())),
            Err(TwammError::PoolNotFound { pool_id: 7 })
        );

        assert!(registry.remove(PoolId::new(2)).is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.stats().total_pools, 1);
    }

    #[test]
    fn test_pools_serialize_per_pool_across_threads() {
        let registry = Arc::new(PoolRegistry::new());
        for id in 0..4 {
            registry.register(PoolId::new(id), pool()).unwrap();
        }

        let handles: Vec<_> = (0..8u64)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..25 {
                        registry
                            .with_pool(PoolId::new(worker % 4), |p| {
                                let step = p.last_executed_step() + 1;
                                p.donate(1, 1, step)
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // two workers per pool, 25 unit donations each
        for id in 0..4 {
            let reserves = registry
                .with_pool(PoolId::new(id), |p| Ok(p.working_reserves()))
                .unwrap();
            assert_eq!(reserves, [1_000_050, 1_000_050]);
        }
        assert_eq!(registry.stats().failed_operations, 0);
    }
}
