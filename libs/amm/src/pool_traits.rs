//! Read-only pool interface shared by live pools and projections

use rust_decimal::prelude::FromPrimitive;
use twamm_types::{Direction, Result};

use crate::execution::VirtualOrderEngine;
use crate::Decimal;

/// Reserve view common to [`crate::TwammPool`] and [`crate::VirtualReserves`]
pub trait AmmPool {
    /// AMM-tradeable reserves, indexed by asset
    fn working_reserves(&self) -> [u128; 2];

    /// Token1 per token0 at the working reserves
    ///
    /// `None` while the pool is empty or when the reserves exceed what a
    /// `Decimal` can represent.
    fn spot_price(&self) -> Option<Decimal> {
        let [r0, r1] = self.working_reserves();
        if r0 == 0 {
            return None;
        }
        Decimal::from_u128(r1)?.checked_div(Decimal::from_u128(r0)?)
    }

    /// Constant-product output for an already fee-reduced input
    fn get_amount_out(&self, direction: Direction, amount_less_fees: u128) -> Result<u128> {
        let reserves = self.working_reserves();
        VirtualOrderEngine::single_sided_output(
            reserves[direction.sold().index()],
            reserves[direction.bought().index()],
            amount_less_fees,
        )
    }
}
