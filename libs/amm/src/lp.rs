//! LP supply accounting
//!
//! Share balances per holder plus the mint/burn formulas. `MIN_LIQUIDITY`
//! shares are locked to [`Address::NULL`] on the first mint and can never be
//! burned, so the working reserves never drain to zero.
//!
//! Each mint is recorded as a join event. Burns consume join events oldest
//! first; shares taken from events younger than the holding period are
//! penalized.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use twamm_types::{
    checked_add, checked_sub, ensure_u112, isqrt_product, mul_div_down, mul_div_up, Address, Result,
    TwammError, FEE_DENOMINATOR, MIN_LIQUIDITY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinEvent {
    pub step: u64,
    pub shares: u128,
}

/// Redemption of one asset on burn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BurnAmount {
    /// Paid out to the holder, penalty already deducted
    pub amount: u128,
    /// Left in the pool for the remaining LPs
    pub penalty: u128,
}

/// Share math over working reserves
pub struct LpMath;

fn share_quote(amount: u128, total_shares: u128, reserve: u128) -> Result<u128> {
    match mul_div_down(amount, total_shares, reserve) {
        Err(TwammError::Overflow) => Ok(u128::MAX),
        quote => quote,
    }
}

impl LpMath {
    /// Total shares created by the bootstrap deposit, including the locked minimum
    pub fn initial_shares(amount0: u128, amount1: u128) -> Result<u128> {
        let shares = isqrt_product(amount0, amount1)?;
        if shares <= MIN_LIQUIDITY {
            return Err(TwammError::InsufficientInitialLiquidity {
                shares,
                min: MIN_LIQUIDITY,
            });
        }
        Ok(shares)
    }

    /// Shares for a proportional deposit; the scarcer side decides
    ///
    /// A side whose quote does not fit in `u128` never decides. The resulting
    /// supply must stay within 112 bits.
    pub fn mint_shares(amounts: [u128; 2], working: [u128; 2], total_shares: u128) -> Result<u128> {
        let by0 = share_quote(amounts[0], total_shares, working[0])?;
        let by1 = share_quote(amounts[1], total_shares, working[1])?;
        let shares = by0.min(by1);
        if shares == 0 {
            return Err(TwammError::InsufficientLiquidityMinted);
        }
        ensure_u112(total_shares.saturating_add(shares))?;
        Ok(shares)
    }

    /// Proportional redemption minus the early-exit penalty on `penalized` shares
    pub fn burn_amounts(
        shares: u128,
        penalized: u128,
        penalty_bp: u32,
        working: [u128; 2],
        total_shares: u128,
    ) -> Result<[BurnAmount; 2]> {
        let mut out = [BurnAmount::default(); 2];
        for (slot, reserve) in out.iter_mut().zip(working) {
            let amount = mul_div_down(reserve, shares, total_shares)?;
            let penalty = if penalized > 0 {
                let exposed = mul_div_down(reserve, penalized, total_shares)?;
                mul_div_up(exposed, u128::from(penalty_bp), FEE_DENOMINATOR)?
            } else {
                0
            };
            *slot = BurnAmount {
                amount: checked_sub(amount, penalty)?,
                penalty,
            };
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpSupply {
    total_shares: u128,
    balances: HashMap<Address, u128>,
    joins: HashMap<Address, VecDeque<JoinEvent>>,
}

impl LpSupply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    pub fn is_initialized(&self) -> bool {
        self.total_shares > 0
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn join_events(&self, holder: &Address) -> impl Iterator<Item = &JoinEvent> {
        self.joins.get(holder).into_iter().flatten()
    }

    /// Split a bootstrap mint between the locked minimum and the provider
    pub fn mint_initial(&mut self, provider: Address, total: u128, step: u64) -> Result<u128> {
        if self.is_initialized() {
            return Err(TwammError::PoolAlreadyInitialized);
        }
        let minted = checked_sub(total, MIN_LIQUIDITY)?;
        self.credit(Address::NULL, MIN_LIQUIDITY, step)?;
        self.credit(provider, minted, step)?;
        Ok(minted)
    }

    pub fn mint(&mut self, provider: Address, shares: u128, step: u64) -> Result<()> {
        if !self.is_initialized() {
            return Err(TwammError::PoolNotInitialized);
        }
        self.credit(provider, shares, step)
    }

    /// Remove `shares` from `holder`, returning how many fell inside the holding period
    pub fn burn(&mut self, holder: Address, shares: u128, step: u64, holding_period: u64) -> Result<u128> {
        let available = if holder.is_null() { 0 } else { self.balance_of(&holder) };
        if shares == 0 {
            return Err(TwammError::ZeroAmount);
        }
        if shares > available {
            return Err(TwammError::InsufficientShares {
                requested: shares,
                available,
            });
        }

        let mut penalized = 0u128;
        let mut left = shares;
        if let Some(queue) = self.joins.get_mut(&holder) {
            while left > 0 {
                let Some(front) = queue.front_mut() else {
                    break;
                };
                let taken = left.min(front.shares);
                if step.saturating_sub(front.step) < holding_period {
                    penalized += taken;
                }
                front.shares -= taken;
                left -= taken;
                if front.shares == 0 {
                    queue.pop_front();
                }
            }
        }

        self.balances.insert(holder, available - shares);
        self.total_shares = checked_sub(self.total_shares, shares)?;
        Ok(penalized)
    }

    fn credit(&mut self, holder: Address, shares: u128, step: u64) -> Result<()> {
        let balance = checked_add(self.balance_of(&holder), shares)?;
        self.total_shares = checked_add(self.total_shares, shares)?;
        self.balances.insert(holder, balance);
        self.joins
            .entry(holder)
            .or_default()
            .push_back(JoinEvent { step, shares });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twamm_types::MAX_U112;

    #[test]
    fn test_bootstrap_requires_more_than_minimum() {
        assert!(matches!(
            LpMath::initial_shares(0, 5_000),
            Err(TwammError::InsufficientInitialLiquidity { shares: 0, .. })
        ));
        assert!(matches!(
            LpMath::initial_shares(5_000, 0),
            Err(TwammError::InsufficientInitialLiquidity { .. })
        ));
        assert_eq!(
            LpMath::initial_shares(1_000, 1_000),
            Err(TwammError::InsufficientInitialLiquidity {
                shares: 1_000,
                min: MIN_LIQUIDITY
            })
        );
        assert_eq!(LpMath::initial_shares(1_000_000, 4_000_000).unwrap(), 2_000_000);
    }

    #[test]
    fn test_mint_uses_scarcer_side() {
        let shares = LpMath::mint_shares([100, 500], [1_000, 2_000], 10_000).unwrap();
        assert_eq!(shares, 1_000);
        assert_eq!(
            LpMath::mint_shares([0, 500], [1_000, 2_000], 10_000),
            Err(TwammError::InsufficientLiquidityMinted)
        );
    }

    #[test]
    fn test_mint_on_skewed_reserves_is_rejected_not_overflowed() {
        // quote on the thin side exceeds u128, the deep side still decides
        let working = [1u128 << 100, 1 << 20];
        let total = 1u128 << 60;
        let shares = LpMath::mint_shares([MAX_U112, MAX_U112], working, total).unwrap();
        assert_eq!(shares, MAX_U112 >> 40);

        // both quotes past 112 bits of supply
        assert_eq!(
            LpMath::mint_shares([MAX_U112, MAX_U112], [1 << 20, 1 << 20], total),
            Err(TwammError::AmountExceedsU112 { value: u128::MAX })
        );
    }

    #[test]
    fn test_burn_penalty_stays_in_pool() {
        // 10% of the pool, half of it penalized at 1%
        let out = LpMath::burn_amounts(1_000, 500, 1_000, [100_000, 50_000], 10_000).unwrap();
        assert_eq!(out[0], BurnAmount { amount: 9_950, penalty: 50 });
        assert_eq!(out[1], BurnAmount { amount: 4_975, penalty: 25 });

        let clean = LpMath::burn_amounts(1_000, 0, 1_000, [100_000, 50_000], 10_000).unwrap();
        assert_eq!(clean[0], BurnAmount { amount: 10_000, penalty: 0 });
    }

    #[test]
    fn test_supply_locks_minimum_to_null() {
        let alice = Address::from_low_byte(1);
        let mut supply = LpSupply::new();
        let minted = supply.mint_initial(alice, 2_000_000, 0).unwrap();

        assert_eq!(minted, 1_999_000);
        assert_eq!(supply.balance_of(&Address::NULL), MIN_LIQUIDITY);
        assert_eq!(supply.total_shares(), 2_000_000);
        assert_eq!(
            supply.burn(Address::NULL, 1, 10, 0),
            Err(TwammError::InsufficientShares {
                requested: 1,
                available: 0
            })
        );
        assert_eq!(
            supply.mint_initial(alice, 2_000_000, 0),
            Err(TwammError::PoolAlreadyInitialized)
        );
    }

    #[test]
    fn test_burn_consumes_oldest_joins_first() {
        let alice = Address::from_low_byte(1);
        let mut supply = LpSupply::new();
        supply.mint_initial(alice, 11_000, 0).unwrap(); // 10_000 to alice at step 0
        supply.mint(alice, 4_000, 900).unwrap();

        // at step 1_000 with a 500-step holding period only the second join is young
        let penalized = supply.burn(alice, 12_000, 1_000, 500).unwrap();
        assert_eq!(penalized, 2_000);
        assert_eq!(supply.balance_of(&alice), 2_000);
        assert_eq!(
            supply.join_events(&alice).copied().collect::<Vec<_>>(),
            vec![JoinEvent {
                step: 900,
                shares: 2_000
            }]
        );

        assert!(matches!(
            supply.burn(alice, 2_001, 1_000, 500),
            Err(TwammError::InsufficientShares { .. })
        ));
    }
}
