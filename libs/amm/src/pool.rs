//! TWAMM pool
//!
//! [`TwammPool`] owns every piece of per-pool state and is the only place that
//! sequences them. Each mutating operation follows the same shape:
//!
//! 1. refuse if the pool is halted
//! 2. execute virtual orders up to the caller's step and commit the advance
//! 3. validate the request against the now-current state
//! 4. compute ledger movements on a copy, then commit everything at once
//!
//! A validation error after step 2 leaves the committed advance in place. A
//! fatal error (invariant or arithmetic) restores the state from before the
//! call, advance included, and halts the pool; every later mutation returns
//! [`TwammError::PoolHalted`].
//!
//! Receipts report the exact amounts the host has to move in or out of custody.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use twamm_config::{PoolSettings, RemainderPolicy};
use twamm_types::{
    checked_add, ensure_u112, Address, Asset, Direction, OrderId, Result, TwammError,
};

use crate::execution::{Advance, StepReport, VirtualOrderEngine};
use crate::fees::{FeeConfiguration, ShortTermFee, SwapKind};
use crate::ledger::{FeeBucket, ReserveState};
use crate::lp::{BurnAmount, LpMath, LpSupply};
use crate::orders::{plan_order, LongTermOrder, OrderBook, OrderState};
use crate::params::PoolParams;
use crate::pool_traits::AmmPool;
use crate::sales_rate::{ProceedsAccumulator, SalesRateAggregate};
use crate::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub shares: u128,
    /// Deposited, indexed by asset
    pub amounts: [u128; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    pub shares: u128,
    pub penalized_shares: u128,
    pub amounts: [BurnAmount; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub direction: Direction,
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee: ShortTermFee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub direction: Direction,
    pub selling_rate: u128,
    pub expiry_step: u64,
    /// Transferred in by the submitter
    pub deposited: u128,
    /// Sold over the life of the order
    pub committed: u128,
    /// Truncation remainder returned to the submitter
    pub refunded: u128,
    /// Truncation remainder kept by the pool
    pub retained: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReceipt {
    pub order_id: OrderId,
    pub owner: Address,
    /// Unsold principal, in the sold asset
    pub refund: u128,
    /// Proceeds so far, in the bought asset
    pub proceeds: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    pub order_id: OrderId,
    pub recipient: Address,
    pub proceeds: u128,
    /// The order expired and is now closed
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSweep {
    pub bucket: FeeBucket,
    pub recipient: Option<Address>,
    pub amounts: [u128; 2],
}

/// Read-only view of the pool after executing virtual orders to `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualReserves {
    pub step: u64,
    pub working: [u128; 2],
    pub unclaimed_proceeds: [u128; 2],
    pub sales_rates: [u128; 2],
}

impl AmmPool for VirtualReserves {
    fn working_reserves(&self) -> [u128; 2] {
        self.working
    }
}

/// What one order could claim at a given step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProceeds {
    pub order_id: OrderId,
    pub step: u64,
    pub proceeds: u128,
    pub remaining_principal: u128,
}

#[derive(Debug, Clone)]
pub struct TwammPool {
    params: PoolParams,
    fees: FeeConfiguration,
    ledger: ReserveState,
    rates: SalesRateAggregate,
    proceeds: ProceedsAccumulator,
    orders: OrderBook,
    lp: LpSupply,
    last_executed_step: u64,
    paused: bool,
    halted: bool,
}

impl TwammPool {
    pub fn new(params: PoolParams, fees: FeeConfiguration, start_step: u64) -> Result<Self> {
        params.validate()?;
        info!(
            kind = ?params.kind,
            order_interval = params.order_interval,
            start_step,
            "Pool created"
        );
        Ok(Self {
            params,
            fees,
            ledger: ReserveState::new(),
            rates: SalesRateAggregate::new(),
            proceeds: ProceedsAccumulator::new(),
            orders: OrderBook::new(),
            lp: LpSupply::new(),
            last_executed_step: start_step,
            paused: false,
            halted: false,
        })
    }

    pub fn from_settings(settings: &PoolSettings, start_step: u64) -> Result<Self> {
        let params = PoolParams::from_settings(settings)?;
        let fees = FeeConfiguration::from_settings(params.kind, &settings.fees)?;
        let mut pool = Self::new(params, fees, start_step)?;
        pool.paused = settings.pool.paused;
        Ok(pool)
    }

    // ---------------------------------------------------------------------
    // Virtual order execution
    // ---------------------------------------------------------------------

    /// Bring the ledger current to `step` without any other mutation
    pub fn execute_virtual_orders(&mut self, step: u64) -> Result<Vec<StepReport>> {
        self.run("execute_virtual_orders", |pool| pool.advance_to(step))
    }

    /// Reserves as they would be after executing virtual orders to `step`
    pub fn project(&self, step: u64) -> Result<VirtualReserves> {
        let advance = self.compute_advance(step)?;
        Ok(VirtualReserves {
            step,
            working: advance.ledger.working_reserves(),
            unclaimed_proceeds: [
                advance.ledger.unclaimed_proceeds(Asset::Token0),
                advance.ledger.unclaimed_proceeds(Asset::Token1),
            ],
            sales_rates: advance.rates.current_rates(),
        })
    }

    /// What `order_id` could withdraw at `step`
    pub fn order_proceeds(&self, order_id: OrderId, step: u64) -> Result<OrderProceeds> {
        let order = self.orders.get(order_id)?;
        if order.state.is_terminal() {
            return Err(TwammError::AlreadyTerminal { order_id });
        }
        let advance = self.compute_advance(step)?;
        let (proceeds, _) = order.accrued_proceeds(&advance.proceeds, advance.last_executed_step)?;
        Ok(OrderProceeds {
            order_id,
            step,
            proceeds,
            remaining_principal: order.remaining_principal(step)?,
        })
    }

    fn compute_advance(&self, step: u64) -> Result<Advance> {
        VirtualOrderEngine::advance(
            &self.ledger,
            &self.rates,
            &self.proceeds,
            &self.fees,
            self.last_executed_step,
            step,
        )
    }

    fn advance_to(&mut self, step: u64) -> Result<Vec<StepReport>> {
        let advance = self.compute_advance(step)?;
        self.ledger = advance.ledger;
        self.rates = advance.rates;
        self.proceeds = advance.proceeds;
        self.last_executed_step = advance.last_executed_step;
        Ok(advance.steps)
    }

    // ---------------------------------------------------------------------
    // Liquidity
    // ---------------------------------------------------------------------

    /// Deposit both assets for shares; the first deposit bootstraps the pool
    pub fn provide_liquidity(
        &mut self,
        provider: Address,
        amount0: u128,
        amount1: u128,
        step: u64,
    ) -> Result<LiquidityReceipt> {
        self.run("provide_liquidity", |pool| {
            pool.advance_to(step)?;
            pool.ensure_open()?;
            ensure_u112(amount0)?;
            ensure_u112(amount1)?;

            let mut lp = pool.lp.clone();
            let shares = if lp.is_initialized() {
                let shares = LpMath::mint_shares(
                    [amount0, amount1],
                    pool.ledger.working_reserves(),
                    lp.total_shares(),
                )?;
                lp.mint(provider, shares, step)?;
                shares
            } else {
                let total = LpMath::initial_shares(amount0, amount1)?;
                lp.mint_initial(provider, total, step)?
            };

            let mut ledger = pool.ledger;
            ledger.apply_deposit(Asset::Token0, amount0)?;
            ledger.apply_deposit(Asset::Token1, amount1)?;

            pool.ledger = ledger;
            pool.lp = lp;
            info!(%provider, shares, amount0, amount1, step, "Liquidity provided");
            Ok(LiquidityReceipt {
                shares,
                amounts: [amount0, amount1],
            })
        })
    }

    /// Burn shares for a proportional cut of the working reserves
    pub fn remove_liquidity(&mut self, provider: Address, shares: u128, step: u64) -> Result<BurnReceipt> {
        self.run("remove_liquidity", |pool| {
            pool.advance_to(step)?;
            pool.ensure_initialized()?;

            let mut lp = pool.lp.clone();
            let total = lp.total_shares();
            let penalized_shares = lp.burn(provider, shares, step, pool.params.holding_period)?;
            let amounts = LpMath::burn_amounts(
                shares,
                penalized_shares,
                pool.params.holding_penalty_bp,
                pool.ledger.working_reserves(),
                total,
            )?;

            let mut ledger = pool.ledger;
            for asset in Asset::ALL {
                ledger.apply_withdrawal(asset, amounts[asset.index()].amount)?;
            }

            pool.ledger = ledger;
            pool.lp = lp;
            info!(
                %provider,
                shares,
                penalized_shares,
                amount0 = amounts[0].amount,
                amount1 = amounts[1].amount,
                step,
                "Liquidity removed"
            );
            Ok(BurnReceipt {
                shares,
                penalized_shares,
                amounts,
            })
        })
    }

    /// Add to the working reserves without minting shares
    pub fn donate(&mut self, amount0: u128, amount1: u128, step: u64) -> Result<()> {
        self.run("donate", |pool| {
            pool.advance_to(step)?;
            pool.ensure_open()?;
            pool.ensure_initialized()?;
            if amount0 == 0 && amount1 == 0 {
                return Err(TwammError::ZeroAmount);
            }
            ensure_u112(amount0)?;
            ensure_u112(amount1)?;

            let mut ledger = pool.ledger;
            ledger.apply_deposit(Asset::Token0, amount0)?;
            ledger.apply_deposit(Asset::Token1, amount1)?;
            pool.ledger = ledger;
            info!(amount0, amount1, step, "Donation received");
            Ok(())
        })
    }

    // ---------------------------------------------------------------------
    // Short-term swaps
    // ---------------------------------------------------------------------

    pub fn swap(
        &mut self,
        direction: Direction,
        amount_in: u128,
        kind: SwapKind,
        step: u64,
    ) -> Result<SwapReceipt> {
        self.run("swap", |pool| {
            pool.advance_to(step)?;
            pool.ensure_open()?;
            pool.ensure_initialized()?;
            if amount_in == 0 {
                return Err(TwammError::ZeroAmount);
            }
            ensure_u112(amount_in)?;

            let fee = pool.fees.compute_short_term_fee(amount_in, kind)?;
            let amount_out = pool.get_amount_out(direction, fee.amount_less_fees)?;

            let mut ledger = pool.ledger;
            ledger.apply_deposit(direction.sold(), amount_in)?;
            ledger.move_to_fee_bucket(FeeBucket::Protocol, direction.sold(), fee.protocol_fee)?;
            ledger.apply_withdrawal(direction.bought(), amount_out)?;
            pool.ledger = ledger;

            info!(?direction, ?kind, amount_in, amount_out, step, "Swap executed");
            Ok(SwapReceipt {
                direction,
                amount_in,
                amount_out,
                fee,
            })
        })
    }

    // ---------------------------------------------------------------------
    // Long-term orders
    // ---------------------------------------------------------------------

    /// Sell `amount` of the direction's sold asset evenly until an interval boundary
    pub fn submit_order(
        &mut self,
        owner: Address,
        delegate: Option<Address>,
        direction: Direction,
        amount: u128,
        interval_count: u64,
        step: u64,
    ) -> Result<OrderReceipt> {
        self.run("submit_order", |pool| {
            pool.advance_to(step)?;
            pool.ensure_open()?;
            pool.ensure_initialized()?;

            let plan = plan_order(
                amount,
                interval_count,
                step,
                pool.params.order_interval,
                pool.params.max_intervals,
            )?;
            let sold = direction.sold();

            let mut ledger = pool.ledger;
            ledger.apply_deposit(sold, amount)?;
            ledger.move_to_order_principal(sold, plan.committed)?;
            let (refunded, retained) = match pool.params.remainder_policy {
                RemainderPolicy::Refund => {
                    ledger.apply_withdrawal(sold, plan.remainder)?;
                    (plan.remainder, 0)
                }
                RemainderPolicy::Retain => (0, plan.remainder),
            };

            pool.rates
                .add_order(direction, plan.selling_rate, plan.expiry_step)?;
            pool.ledger = ledger;

            let order_id = pool.orders.next_id();
            pool.orders.insert(LongTermOrder {
                id: order_id,
                owner,
                delegate,
                direction,
                selling_rate: plan.selling_rate,
                start_step: step,
                expiry_step: plan.expiry_step,
                state: OrderState::Active,
                proceeds_checkpoint: pool.proceeds.current(direction),
            })?;

            info!(
                %order_id,
                %owner,
                ?direction,
                selling_rate = plan.selling_rate,
                expiry_step = plan.expiry_step,
                committed = plan.committed,
                refunded,
                "Long-term order submitted"
            );
            if retained > 0 {
                warn!(%order_id, retained, "Order truncation remainder retained by the pool");
            }

            Ok(OrderReceipt {
                order_id,
                direction,
                selling_rate: plan.selling_rate,
                expiry_step: plan.expiry_step,
                deposited: amount,
                committed: plan.committed,
                refunded,
                retained,
            })
        })
    }

    /// Stop an order early; unsold principal and proceeds go to the owner
    pub fn cancel_order(&mut self, order_id: OrderId, actor: Address, step: u64) -> Result<CancelReceipt> {
        self.run("cancel_order", |pool| {
            pool.advance_to(step)?;

            let mut order = pool.orders.get(order_id)?.clone();
            order.authorize_cancel(actor, step)?;

            let refund = order.remaining_principal(step)?;
            let (proceeds, _) = order.accrued_proceeds(&pool.proceeds, pool.last_executed_step)?;

            let mut ledger = pool.ledger;
            let sold = order.direction.sold();
            let bought = order.direction.bought();
            ledger.release_order_principal(sold, refund)?;
            ledger.apply_withdrawal(sold, refund)?;
            ledger.release_proceeds(bought, proceeds)?;
            ledger.apply_withdrawal(bought, proceeds)?;

            pool.rates
                .remove_order(order.direction, order.selling_rate, order.expiry_step)?;
            pool.ledger = ledger;
            order.state = OrderState::Cancelled;
            let owner = order.owner;
            pool.orders.replace(order);

            info!(%order_id, %actor, refund, proceeds, step, "Long-term order cancelled");
            Ok(CancelReceipt {
                order_id,
                owner,
                refund,
                proceeds,
            })
        })
    }

    /// Pay out accrued proceeds; at or after expiry this also closes the order
    pub fn withdraw_order(
        &mut self,
        order_id: OrderId,
        actor: Address,
        recipient: Address,
        step: u64,
    ) -> Result<WithdrawReceipt> {
        self.run("withdraw_order", |pool| {
            pool.advance_to(step)?;

            let mut order = pool.orders.get(order_id)?.clone();
            order.authorize_withdrawal(actor, recipient)?;

            let (proceeds, settled_at) =
                order.accrued_proceeds(&pool.proceeds, pool.last_executed_step)?;

            let mut ledger = pool.ledger;
            let bought = order.direction.bought();
            ledger.release_proceeds(bought, proceeds)?;
            ledger.apply_withdrawal(bought, proceeds)?;
            pool.ledger = ledger;

            let closed = order.is_expired_at(step);
            order.proceeds_checkpoint = settled_at;
            if closed {
                order.state = OrderState::Withdrawn;
            }
            pool.orders.replace(order);

            info!(%order_id, %actor, %recipient, proceeds, closed, step, "Long-term order withdrawn");
            Ok(WithdrawReceipt {
                order_id,
                recipient,
                proceeds,
                closed,
            })
        })
    }

    // ---------------------------------------------------------------------
    // Fee buckets
    // ---------------------------------------------------------------------

    pub fn collect_protocol_fees(&mut self, step: u64) -> Result<FeeSweep> {
        self.run("collect_protocol_fees", |pool| {
            pool.sweep(FeeBucket::Protocol, None, step)
        })
    }

    pub fn collect_auxiliary_fees(&mut self, step: u64) -> Result<FeeSweep> {
        self.run("collect_auxiliary_fees", |pool| {
            let recipient = pool.fees.auxiliary_recipient();
            pool.sweep(FeeBucket::Auxiliary, recipient, step)
        })
    }

    fn sweep(&mut self, bucket: FeeBucket, recipient: Option<Address>, step: u64) -> Result<FeeSweep> {
        self.advance_to(step)?;
        let mut ledger = self.ledger;
        let amounts = [
            ledger.collect_fee_bucket(bucket, Asset::Token0)?,
            ledger.collect_fee_bucket(bucket, Asset::Token1)?,
        ];
        self.ledger = ledger;
        info!(?bucket, amount0 = amounts[0], amount1 = amounts[1], step, "Fee bucket swept");
        Ok(FeeSweep {
            bucket,
            recipient,
            amounts,
        })
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    /// Fee changes apply from `step` on; earlier sales settle at the old rates
    pub fn set_fee_rates(&mut self, short_term_bp: u32, partner_bp: u32, long_term_bp: u32, step: u64) -> Result<()> {
        self.update_fees("set_fee_rates", step, |fees| {
            fees.set_rates(short_term_bp, partner_bp, long_term_bp)
        })
    }

    pub fn set_protocol_fee(&mut self, collect: bool, fraction: u128, step: u64) -> Result<()> {
        self.update_fees("set_protocol_fee", step, |fees| {
            fees.set_protocol_fee(collect, fraction)
        })
    }

    /// `None` stops auxiliary collection
    pub fn set_auxiliary_fee(&mut self, recipient: Option<Address>, step: u64) -> Result<()> {
        self.update_fees("set_auxiliary_fee", step, |fees| {
            fees.set_auxiliary_fee(recipient);
            Ok(())
        })
    }

    pub fn set_fee_shift(&mut self, shift: u8, step: u64) -> Result<()> {
        self.update_fees("set_fee_shift", step, |fees| fees.set_fee_shift(shift))
    }

    fn update_fees(
        &mut self,
        operation: &'static str,
        step: u64,
        update: impl FnOnce(&mut FeeConfiguration) -> Result<()>,
    ) -> Result<()> {
        self.run(operation, |pool| {
            pool.advance_to(step)?;
            let mut fees = pool.fees.clone();
            update(&mut fees)?;
            info!(operation, ?fees, step, "Fee configuration updated");
            pool.fees = fees;
            Ok(())
        })
    }

    pub fn set_holding_parameters(&mut self, holding_period: u64, holding_penalty_bp: u32) -> Result<()> {
        self.run("set_holding_parameters", |pool| {
            let params = pool
                .params
                .clone()
                .with_holding(holding_period, holding_penalty_bp);
            params.validate()?;
            pool.params = params;
            info!(holding_period, holding_penalty_bp, "Holding parameters updated");
            Ok(())
        })
    }

    /// Paused pools still allow cancels, withdrawals, burns and fee sweeps
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        info!(paused, "Pool pause flag updated");
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn fees(&self) -> &FeeConfiguration {
        &self.fees
    }

    pub fn ledger(&self) -> &ReserveState {
        &self.ledger
    }

    pub fn working_reserves(&self) -> [u128; 2] {
        self.ledger.working_reserves()
    }

    pub fn spot_price(&self) -> Option<Decimal> {
        AmmPool::spot_price(self)
    }

    pub fn order(&self, order_id: OrderId) -> Result<&LongTermOrder> {
        self.orders.get(order_id)
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    pub fn sales_rates(&self) -> &SalesRateAggregate {
        &self.rates
    }

    pub fn proceeds_accumulator(&self) -> &ProceedsAccumulator {
        &self.proceeds
    }

    pub fn total_shares(&self) -> u128 {
        self.lp.total_shares()
    }

    pub fn shares_of(&self, holder: &Address) -> u128 {
        self.lp.balance_of(holder)
    }

    pub fn last_executed_step(&self) -> u64 {
        self.last_executed_step
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Cross-check the ledger against the order book and the aggregate
    ///
    /// Committed principal must equal what active orders still have to sell,
    /// the aggregate must equal the sum of unexpired rates, and unclaimed
    /// proceeds must cover what every active order could withdraw right now.
    pub fn audit(&self) -> Result<()> {
        self.ledger.verify()?;

        let executed = self.last_executed_step;
        let principal = self.orders.committed_principal(executed)?;
        let mut rates = [0u128; 2];
        let mut claimable = [0u128; 2];
        for order in self.orders.active() {
            let i = order.direction.index();
            if !order.is_expired_at(executed) {
                rates[i] = checked_add(rates[i], order.selling_rate)?;
            }
            let (owed, _) = order.accrued_proceeds(&self.proceeds, executed)?;
            let j = order.direction.bought().index();
            claimable[j] = checked_add(claimable[j], owed)?;
        }

        for asset in Asset::ALL {
            let i = asset.index();
            if self.ledger.order_principal(asset) != principal[i] {
                return Err(TwammError::ConservationViolation {
                    asset,
                    detail: format!(
                        "ledger principal {} but orders hold {}",
                        self.ledger.order_principal(asset),
                        principal[i]
                    ),
                });
            }
            if self.rates.current_rates()[i] != rates[i] {
                return Err(TwammError::ConservationViolation {
                    asset,
                    detail: format!(
                        "aggregate rate {} but orders sell {}",
                        self.rates.current_rates()[i],
                        rates[i]
                    ),
                });
            }
            if self.ledger.unclaimed_proceeds(asset) < claimable[i] {
                return Err(TwammError::ConservationViolation {
                    asset,
                    detail: format!(
                        "unclaimed proceeds {} below claimable {}",
                        self.ledger.unclaimed_proceeds(asset),
                        claimable[i]
                    ),
                });
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Guards
    // ---------------------------------------------------------------------

    fn run<T>(&mut self, operation: &'static str, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.halted {
            return Err(TwammError::PoolHalted);
        }
        let checkpoint = self.clone();
        let result = op(self);
        if let Err(err) = &result {
            if err.is_fatal() {
                // includes the advance already committed by `op`
                *self = checkpoint;
                self.halted = true;
                error!(operation, error = %err, step = self.last_executed_step, "Pool halted");
            }
        }
        result
    }

    fn ensure_open(&self) -> Result<()> {
        if self.paused {
            return Err(TwammError::PoolPaused);
        }
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if !self.lp.is_initialized() {
            return Err(TwammError::PoolNotInitialized);
        }
        Ok(())
    }
}

impl AmmPool for TwammPool {
    fn working_reserves(&self) -> [u128; 2] {
        self.ledger.working_reserves()
    }
}
