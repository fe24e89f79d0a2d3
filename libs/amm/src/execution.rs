//! Virtual order execution engine
//!
//! Advances the ledger, sales-rate aggregate and proceeds accumulator from the
//! last executed step to a target step. The span is split at every step where
//! an aggregate rate ends; within each piece the rates are constant and the
//! piece is executed as a single batch:
//!
//! ```text
//! last ──────── b1 ──────── b2 ──── target
//!      step          step      residual step
//!               snapshot     snapshot
//!               expire       expire
//! ```
//!
//! A batch with flow on one side is a plain constant-product swap of the
//! fee-reduced input. A batch with flow on both sides uses the symmetric
//! closed-form update, which keeps `new0 * new1 == r0 * r1` up to rounding:
//!
//! ```text
//! sum0 = r0 + less0          new0 = r1 * sum0 / sum1      out0 = sum0 - new0
//! sum1 = r1 + less1          new1 = r0 * sum1 / sum0      out1 = sum1 - new1
//! ```
//!
//! Everything is computed into an [`Advance`], a detached copy of the state.
//! The pool commits it on success or discards it on error, and read-only
//! projections simply never commit it.

use tracing::debug;
use twamm_types::{checked_add, checked_mul, mul_div_down, Direction, Result, TwammError};

use crate::fees::{FeeConfiguration, LongTermFee};
use crate::ledger::{FeeBucket, ReserveState};
use crate::sales_rate::{ProceedsAccumulator, SalesRateAggregate};

/// What one batch did, indexed by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub from_step: u64,
    pub to_step: u64,
    /// Principal sold by each direction
    pub sold: [u128; 2],
    pub fees: [LongTermFee; 2],
    /// Amount of the opposite asset bought by each direction
    pub bought: [u128; 2],
}

/// Uncommitted result of executing virtual orders up to a step
#[derive(Debug, Clone)]
pub struct Advance {
    pub ledger: ReserveState,
    pub rates: SalesRateAggregate,
    pub proceeds: ProceedsAccumulator,
    pub last_executed_step: u64,
    pub steps: Vec<StepReport>,
}

impl Advance {
    fn start(
        ledger: &ReserveState,
        rates: &SalesRateAggregate,
        proceeds: &ProceedsAccumulator,
        last_executed_step: u64,
    ) -> Self {
        Self {
            ledger: *ledger,
            rates: rates.clone(),
            proceeds: proceeds.clone(),
            last_executed_step,
            steps: Vec::new(),
        }
    }
}

/// Stateless execution routines
pub struct VirtualOrderEngine;

impl VirtualOrderEngine {
    /// Execute every virtual order sale in `(last_executed_step, target_step]`
    pub fn advance(
        ledger: &ReserveState,
        rates: &SalesRateAggregate,
        proceeds: &ProceedsAccumulator,
        fees: &FeeConfiguration,
        last_executed_step: u64,
        target_step: u64,
    ) -> Result<Advance> {
        if target_step < last_executed_step {
            return Err(TwammError::StepRegression {
                step: target_step,
                last_executed: last_executed_step,
            });
        }

        let mut advance = Advance::start(ledger, rates, proceeds, last_executed_step);
        while let Some(boundary) = advance
            .rates
            .next_boundary(advance.last_executed_step, target_step)
        {
            Self::execute_step(&mut advance, fees, boundary)?;
            advance.proceeds.snapshot(boundary);
            let expired = advance.rates.expire(boundary)?;
            debug!(
                step = boundary,
                expired_zero_to_one = expired[0],
                expired_one_to_zero = expired[1],
                "Sales rates expired"
            );
        }
        Self::execute_step(&mut advance, fees, target_step)?;

        Ok(advance)
    }

    /// One batch at constant rates from the advance cursor to `to_step`
    fn execute_step(advance: &mut Advance, fees: &FeeConfiguration, to_step: u64) -> Result<()> {
        let from_step = advance.last_executed_step;
        let elapsed = to_step - from_step;
        let rates = advance.rates.current_rates();
        advance.last_executed_step = to_step;
        if elapsed == 0 || rates == [0, 0] {
            return Ok(());
        }

        let mut sold = [0u128; 2];
        let mut step_fees = [LongTermFee::default(); 2];
        for direction in Direction::ALL {
            let i = direction.index();
            sold[i] = checked_mul(rates[i], u128::from(elapsed))?;
            if sold[i] > 0 {
                step_fees[i] = fees.compute_long_term_fee(sold[i])?;
            }
        }

        // outputs are priced against the reserves before any fee lands in them
        let reserves = advance.ledger.working_reserves();
        let less = [
            step_fees[0].amount_less_fees,
            step_fees[1].amount_less_fees,
        ];
        let bought = match (sold[0] > 0, sold[1] > 0) {
            (true, true) => {
                let [out0, out1] = Self::two_sided_update(reserves, less)?;
                [out1, out0]
            }
            (true, false) => [Self::single_sided_output(reserves[0], reserves[1], less[0])?, 0],
            (false, true) => [0, Self::single_sided_output(reserves[1], reserves[0], less[1])?],
            (false, false) => [0, 0],
        };

        let ledger = &mut advance.ledger;
        for direction in Direction::ALL {
            let i = direction.index();
            let asset = direction.sold();
            ledger.release_order_principal(asset, sold[i])?;
            ledger.move_to_fee_bucket(FeeBucket::Protocol, asset, step_fees[i].protocol_fee)?;
            ledger.move_to_fee_bucket(FeeBucket::Auxiliary, asset, step_fees[i].auxiliary_fee)?;
        }
        for direction in Direction::ALL {
            let i = direction.index();
            ledger.move_to_proceeds(direction.bought(), bought[i])?;
            advance.proceeds.accrue(direction, bought[i], rates[i])?;
        }

        debug!(
            from_step,
            to_step,
            sold_zero_to_one = sold[0],
            sold_one_to_zero = sold[1],
            bought_zero_to_one = bought[0],
            bought_one_to_zero = bought[1],
            "Executed virtual orders"
        );

        advance.steps.push(StepReport {
            from_step,
            to_step,
            sold,
            fees: step_fees,
            bought,
        });
        Ok(())
    }

    /// Constant-product output for a fee-reduced input, rounded down
    pub fn single_sided_output(reserve_in: u128, reserve_out: u128, amount_less_fees: u128) -> Result<u128> {
        if amount_less_fees == 0 {
            return Ok(0);
        }
        let denominator = checked_add(reserve_in, amount_less_fees)?;
        mul_div_down(reserve_out, amount_less_fees, denominator)
    }

    /// Symmetric closed-form update for simultaneous opposing flows
    ///
    /// Returns the amounts of asset 0 and asset 1 leaving the working reserves,
    /// i.e. what the one-to-zero and zero-to-one sides bought respectively.
    pub fn two_sided_update(reserves: [u128; 2], less: [u128; 2]) -> Result<[u128; 2]> {
        let [r0, r1] = reserves;
        let sum0 = checked_add(r0, less[0])?;
        let sum1 = checked_add(r1, less[1])?;
        let new0 = mul_div_down(r1, sum0, sum1)?;
        let new1 = mul_div_down(r0, sum1, sum0)?;

        if new0 > sum0 {
            return Err(TwammError::ApproximationViolation {
                asset: twamm_types::Asset::Token0,
                reserve: new0,
                sum: sum0,
            });
        }
        if new1 > sum1 {
            return Err(TwammError::ApproximationViolation {
                asset: twamm_types::Asset::Token1,
                reserve: new1,
                sum: sum1,
            });
        }
        Ok([sum0 - new0, sum1 - new1])
    }
}
