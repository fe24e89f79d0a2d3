//! Long-term order manager
//!
//! Order planning (rate and expiry alignment), the order book, and the
//! authorization rules for cancel and withdraw. Ledger movements live in
//! [`crate::pool`]; this module only decides amounts and who may act.

use std::collections::HashMap;

use twamm_types::{
    checked_add, checked_mul, div_down, ensure_u112, Address, Direction, OrderId, Result,
    TwammError, U256,
};

use crate::sales_rate::{proceeds_between, ProceedsAccumulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderState {
    Active,
    Cancelled,
    Withdrawn,
}

impl OrderState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderState::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongTermOrder {
    pub id: OrderId,
    pub owner: Address,
    pub delegate: Option<Address>,
    pub direction: Direction,
    pub selling_rate: u128,
    pub start_step: u64,
    pub expiry_step: u64,
    pub state: OrderState,
    /// Accumulator value at submission or at the last partial withdrawal
    pub proceeds_checkpoint: U256,
}

impl LongTermOrder {
    pub fn is_expired_at(&self, step: u64) -> bool {
        step >= self.expiry_step
    }

    /// Principal not yet sold once execution has reached `step`
    pub fn remaining_principal(&self, step: u64) -> Result<u128> {
        let steps = self.expiry_step.saturating_sub(step);
        checked_mul(self.selling_rate, u128::from(steps))
    }

    /// Proceeds accrued since the checkpoint, settled against the expiry snapshot
    /// once execution has passed the expiry
    pub fn accrued_proceeds(&self, acc: &ProceedsAccumulator, executed: u64) -> Result<(u128, U256)> {
        let end = acc.settlement_value(self.direction, self.expiry_step, executed)?;
        let owed = proceeds_between(self.selling_rate, self.proceeds_checkpoint, end)?;
        Ok((owed, end))
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(TwammError::AlreadyTerminal { order_id: self.id });
        }
        Ok(())
    }

    /// Cancel rights: owner or delegate, active, not yet expired
    pub fn authorize_cancel(&self, actor: Address, step: u64) -> Result<()> {
        if actor != self.owner && Some(actor) != self.delegate {
            return Err(TwammError::NotOwnerOrDelegate { order_id: self.id });
        }
        self.ensure_active()?;
        if self.is_expired_at(step) {
            return Err(TwammError::AlreadyExpired {
                order_id: self.id,
                expiry_step: self.expiry_step,
                current_step: step,
            });
        }
        Ok(())
    }

    /// Withdraw rights: the owner may pay anyone, the delegate only the owner
    pub fn authorize_withdrawal(&self, actor: Address, recipient: Address) -> Result<()> {
        if actor == self.owner {
            return self.ensure_active();
        }
        if Some(actor) != self.delegate {
            return Err(TwammError::NotOwnerOrDelegate { order_id: self.id });
        }
        self.ensure_active()?;
        if recipient != self.owner {
            return Err(TwammError::RecipientNotOwner { order_id: self.id });
        }
        Ok(())
    }
}

/// Rate, expiry and truncation remainder of a prospective order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderPlan {
    pub expiry_step: u64,
    pub trade_steps: u64,
    pub selling_rate: u128,
    pub committed: u128,
    pub remainder: u128,
}

/// Align an order to the interval grid and derive its per-step rate
///
/// The order trades from `start_step` to the boundary `interval_count + 1`
/// intervals after the start of the current interval. The rate is floored, so
/// `committed <= total` and the difference is the truncation remainder.
pub fn plan_order(
    total: u128,
    interval_count: u64,
    start_step: u64,
    order_interval: u64,
    max_intervals: u64,
) -> Result<OrderPlan> {
    if total == 0 {
        return Err(TwammError::ZeroAmount);
    }
    ensure_u112(total)?;
    if order_interval == 0 {
        return Err(TwammError::InvalidOrderInterval);
    }
    if interval_count > max_intervals {
        return Err(TwammError::IntervalCountTooLarge {
            count: interval_count,
            max: max_intervals,
        });
    }

    let aligned_start = start_step - start_step % order_interval;
    // an expiry past the step range is a caller error
    let too_large = TwammError::IntervalCountTooLarge {
        count: interval_count,
        max: max_intervals,
    };
    let expiry_step = interval_count
        .checked_add(1)
        .and_then(|count| count.checked_mul(order_interval))
        .and_then(|span| aligned_start.checked_add(span))
        .ok_or(too_large)?;
    let trade_steps = expiry_step - start_step;

    let selling_rate = div_down(total, u128::from(trade_steps))?;
    if selling_rate == 0 {
        return Err(TwammError::OrderAmountTooSmall {
            amount: total,
            trade_steps,
        });
    }
    let committed = checked_mul(selling_rate, u128::from(trade_steps))?;

    Ok(OrderPlan {
        expiry_step,
        trade_steps,
        selling_rate,
        committed,
        remainder: total - committed,
    })
}

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: HashMap<OrderId, LongTermOrder>,
    next_id: OrderId,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted order will receive
    pub fn next_id(&self) -> OrderId {
        self.next_id
    }

    pub fn insert(&mut self, order: LongTermOrder) -> Result<OrderId> {
        let id = order.id;
        self.next_id = id.next().ok_or(TwammError::Overflow)?;
        self.orders.insert(id, order);
        Ok(id)
    }

    pub fn get(&self, id: OrderId) -> Result<&LongTermOrder> {
        self.orders
            .get(&id)
            .ok_or(TwammError::OrderNotFound { order_id: id })
    }

    pub fn replace(&mut self, order: LongTermOrder) {
        self.orders.insert(order.id, order);
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &LongTermOrder> {
        self.orders.values().filter(|o| !o.state.is_terminal())
    }

    /// Principal still committed by active, unexpired orders at `step`
    pub fn committed_principal(&self, step: u64) -> Result<[u128; 2]> {
        let mut totals = [0u128; 2];
        for order in self.active() {
            let i = order.direction.index();
            totals[i] = checked_add(totals[i], order.remaining_principal(step)?)?;
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(owner: Address, delegate: Option<Address>) -> LongTermOrder {
        LongTermOrder {
            id: OrderId::new(4),
            owner,
            delegate,
            direction: Direction::ZeroToOne,
            selling_rate: 3,
            start_step: 99,
            expiry_step: 400,
            state: OrderState::Active,
            proceeds_checkpoint: U256::ZERO,
        }
    }

    #[test]
    fn test_plan_truncation_remainder() {
        let plan = plan_order(1_000, 3, 99, 100, 10).unwrap();
        assert_eq!(plan.expiry_step, 400);
        assert_eq!(plan.trade_steps, 301);
        assert_eq!(plan.selling_rate, 3);
        assert_eq!(plan.committed, 903);
        assert_eq!(plan.remainder, 97);
    }

    #[test]
    fn test_plan_on_boundary_and_zero_intervals() {
        // a start on the boundary trades one full interval per count
        let plan = plan_order(600, 2, 300, 100, 10).unwrap();
        assert_eq!(plan.expiry_step, 600);
        assert_eq!(plan.selling_rate, 2);
        assert_eq!(plan.remainder, 0);

        // zero intervals trades to the next boundary
        let plan = plan_order(50, 0, 375, 100, 10).unwrap();
        assert_eq!(plan.expiry_step, 400);
        assert_eq!(plan.trade_steps, 25);
    }

    #[test]
    fn test_plan_rejections() {
        assert_eq!(plan_order(0, 1, 0, 100, 10), Err(TwammError::ZeroAmount));
        assert_eq!(
            plan_order(100, 11, 0, 100, 10),
            Err(TwammError::IntervalCountTooLarge { count: 11, max: 10 })
        );
        assert_eq!(
            plan_order(150, 1, 0, 100, 10),
            Err(TwammError::OrderAmountTooSmall {
                amount: 150,
                trade_steps: 200
            })
        );

        // an unbounded interval limit still rejects an unrepresentable expiry
        assert_eq!(
            plan_order(1_000, u64::MAX - 1, 0, 100, u64::MAX),
            Err(TwammError::IntervalCountTooLarge {
                count: u64::MAX - 1,
                max: u64::MAX
            })
        );
        assert!(matches!(
            plan_order(1_000, 1, u64::MAX - 50, 100, 10),
            Err(TwammError::IntervalCountTooLarge { .. })
        ));
    }

    #[test]
    fn test_cancel_authorization() {
        let owner = Address::from_low_byte(1);
        let delegate = Address::from_low_byte(2);
        let stranger = Address::from_low_byte(3);
        let o = order(owner, Some(delegate));

        assert!(o.authorize_cancel(owner, 100).is_ok());
        assert!(o.authorize_cancel(delegate, 100).is_ok());
        assert_eq!(
            o.authorize_cancel(stranger, 100),
            Err(TwammError::NotOwnerOrDelegate { order_id: o.id })
        );
        assert!(matches!(
            o.authorize_cancel(owner, 400),
            Err(TwammError::AlreadyExpired { expiry_step: 400, .. })
        ));
    }

    #[test]
    fn test_delegate_may_only_pay_owner() {
        let owner = Address::from_low_byte(1);
        let delegate = Address::from_low_byte(2);
        let o = order(owner, Some(delegate));

        assert!(o.authorize_withdrawal(owner, delegate).is_ok());
        assert!(o.authorize_withdrawal(delegate, owner).is_ok());
        assert_eq!(
            o.authorize_withdrawal(delegate, delegate),
            Err(TwammError::RecipientNotOwner { order_id: o.id })
        );

        let mut closed = o.clone();
        closed.state = OrderState::Withdrawn;
        assert_eq!(
            closed.authorize_withdrawal(owner, owner),
            Err(TwammError::AlreadyTerminal { order_id: o.id })
        );
    }

    #[test]
    fn test_order_book_assigns_and_sums() {
        let mut book = OrderBook::new();
        assert_eq!(book.next_id(), OrderId::new(0));

        let mut first = order(Address::from_low_byte(1), None);
        first.id = book.next_id();
        assert_eq!(book.insert(first).unwrap(), OrderId::new(0));
        assert_eq!(book.next_id(), OrderId::new(1));

        let mut last = order(Address::from_low_byte(2), None);
        last.id = OrderId::new(u64::MAX);
        assert_eq!(book.insert(last), Err(TwammError::Overflow));

        assert_eq!(book.committed_principal(100).unwrap(), [900, 0]);
        assert_eq!(book.committed_principal(500).unwrap(), [0, 0]);
        assert!(matches!(
            book.get(OrderId::new(9)),
            Err(TwammError::OrderNotFound { .. })
        ));
    }
}
