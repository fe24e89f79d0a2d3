//! Sales-rate aggregate and proceeds accumulator
//!
//! The aggregate answers "how much is being sold per step right now" without
//! scanning orders: each direction keeps the sum of active rates plus a map of
//! the rate that stops at each expiry step.
//!
//! The accumulator answers "how much did one unit of selling rate earn" between
//! two points in time. It grows by `(output << 64) / rate` on every execution
//! step, and is snapshotted at each expiry so expired orders settle against the
//! value at their own expiry rather than the current one.

use std::collections::BTreeMap;

use twamm_types::{
    checked_add, u256_to_u128, Direction, Result, TwammError, PROCEEDS_SCALE_SHIFT, U256,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesRateAggregate {
    current: [u128; 2],
    ending: BTreeMap<u64, [u128; 2]>,
}

impl SalesRateAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate selling rate of one direction
    pub fn current(&self, direction: Direction) -> u128 {
        self.current[direction.index()]
    }

    pub fn current_rates(&self) -> [u128; 2] {
        self.current
    }

    /// Rate that stops being sold at `step`
    pub fn ending_at(&self, step: u64, direction: Direction) -> u128 {
        self.ending
            .get(&step)
            .map_or(0, |rates| rates[direction.index()])
    }

    /// Expiry steps with a pending rate change, in order
    pub fn expiries(&self) -> impl Iterator<Item = u64> + '_ {
        self.ending.keys().copied()
    }

    /// First rate-change boundary in `(after, up_to]`
    pub fn next_boundary(&self, after: u64, up_to: u64) -> Option<u64> {
        if up_to <= after {
            return None;
        }
        self.ending
            .range(after + 1..=up_to)
            .next()
            .map(|(step, _)| *step)
    }

    pub fn is_idle(&self) -> bool {
        self.current == [0, 0]
    }

    pub fn add_order(&mut self, direction: Direction, rate: u128, expiry_step: u64) -> Result<()> {
        let i = direction.index();
        let current = checked_add(self.current[i], rate)?;
        let ending = checked_add(self.ending_at(expiry_step, direction), rate)?;
        self.ending.entry(expiry_step).or_insert([0, 0])[i] = ending;
        self.current[i] = current;
        Ok(())
    }

    /// Remove a cancelled order's rate ahead of its expiry
    pub fn remove_order(&mut self, direction: Direction, rate: u128, expiry_step: u64) -> Result<()> {
        let i = direction.index();
        let ending = self.ending_at(expiry_step, direction);
        if ending < rate || self.current[i] < rate {
            return Err(TwammError::ConservationViolation {
                asset: direction.sold(),
                detail: format!(
                    "removing rate {rate} ending at {expiry_step}, aggregate {} ending {ending}",
                    self.current[i]
                ),
            });
        }
        self.current[i] -= rate;
        if let Some(slot) = self.ending.get_mut(&expiry_step) {
            slot[i] -= rate;
            if *slot == [0, 0] {
                self.ending.remove(&expiry_step);
            }
        }
        Ok(())
    }

    /// Retire every rate ending at `step`, returning what was removed
    pub fn expire(&mut self, step: u64) -> Result<[u128; 2]> {
        let Some(ending) = self.ending.remove(&step) else {
            return Ok([0, 0]);
        };
        for direction in Direction::ALL {
            let i = direction.index();
            self.current[i] = self.current[i].checked_sub(ending[i]).ok_or_else(|| {
                TwammError::ConservationViolation {
                    asset: direction.sold(),
                    detail: format!(
                        "rate {} ending at {step} exceeds aggregate {}",
                        ending[i], self.current[i]
                    ),
                }
            })?;
        }
        Ok(ending)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProceedsAccumulator {
    scaled: [U256; 2],
    at_expiry: BTreeMap<u64, [U256; 2]>,
}

impl ProceedsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proceeds per unit of rate earned so far, scaled by 2^64
    pub fn current(&self, direction: Direction) -> U256 {
        self.scaled[direction.index()]
    }

    pub fn snapshot_at(&self, step: u64, direction: Direction) -> Option<U256> {
        self.at_expiry
            .get(&step)
            .map(|values| values[direction.index()])
    }

    /// Credit `output` bought by the aggregate `rate` of one direction
    pub fn accrue(&mut self, direction: Direction, output: u128, rate: u128) -> Result<()> {
        if output == 0 || rate == 0 {
            return Ok(());
        }
        let increment = (U256::from(output) << PROCEEDS_SCALE_SHIFT) / U256::from(rate);
        let slot = &mut self.scaled[direction.index()];
        *slot = slot.checked_add(increment).ok_or(TwammError::Overflow)?;
        Ok(())
    }

    /// Freeze the accumulator values for orders expiring at `step`
    pub fn snapshot(&mut self, step: u64) {
        self.at_expiry.insert(step, self.scaled);
    }

    /// Accumulator value an order settles against once execution has reached `executed`
    pub fn settlement_value(&self, direction: Direction, expiry_step: u64, executed: u64) -> Result<U256> {
        if executed < expiry_step {
            return Ok(self.current(direction));
        }
        self.snapshot_at(expiry_step, direction)
            .ok_or_else(|| TwammError::ConservationViolation {
                asset: direction.bought(),
                detail: format!("no proceeds snapshot at expiry {expiry_step}"),
            })
    }
}

/// Proceeds owed to `rate` between two accumulator values, rounded down
pub fn proceeds_between(rate: u128, from: U256, to: U256) -> Result<u128> {
    let delta = to.checked_sub(from).ok_or(TwammError::Underflow)?;
    let owed = U256::from(rate)
        .checked_mul(delta)
        .ok_or(TwammError::Overflow)?;
    u256_to_u128(owed >> PROCEEDS_SCALE_SHIFT)
}
