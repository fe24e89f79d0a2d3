//! Reserve ledger
//!
//! Tracks, per asset, everything the vault holds on behalf of someone:
//!
//! ```text
//! vault_balance = working_reserve + order_principal + unclaimed_proceeds
//!               + protocol_fee + auxiliary_fee
//! ```
//!
//! `working_reserve` is never stored. It is whatever remains of the vault after
//! the committed buckets, so the invariant reduces to "the buckets never exceed
//! the vault". Every mutating method works on a copy, re-validates, and only then
//! writes back, so a failed call leaves the ledger untouched.

use serde::{Deserialize, Serialize};
use twamm_types::{checked_add, checked_sub, ensure_u112, Asset, Result, TwammError, MAX_U112};

/// Fee buckets that can be swept out of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeBucket {
    Protocol,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    OrderPrincipal,
    Proceeds,
    Fee(FeeBucket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReserveState {
    vault_balance: [u128; 2],
    order_principal: [u128; 2],
    unclaimed_proceeds: [u128; 2],
    protocol_fee: [u128; 2],
    auxiliary_fee: [u128; 2],
}

impl ReserveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vault_balance(&self, asset: Asset) -> u128 {
        self.vault_balance[asset.index()]
    }

    pub fn order_principal(&self, asset: Asset) -> u128 {
        self.order_principal[asset.index()]
    }

    pub fn unclaimed_proceeds(&self, asset: Asset) -> u128 {
        self.unclaimed_proceeds[asset.index()]
    }

    pub fn fee_bucket(&self, kind: FeeBucket, asset: Asset) -> u128 {
        match kind {
            FeeBucket::Protocol => self.protocol_fee[asset.index()],
            FeeBucket::Auxiliary => self.auxiliary_fee[asset.index()],
        }
    }

    /// Sum of every bucket that is not tradeable liquidity
    pub fn committed(&self, asset: Asset) -> u128 {
        let i = asset.index();
        // each bucket is bounded to 112 bits, so the sum cannot overflow
        self.order_principal[i]
            + self.unclaimed_proceeds[i]
            + self.protocol_fee[i]
            + self.auxiliary_fee[i]
    }

    /// AMM-tradeable balance
    pub fn working_reserve(&self, asset: Asset) -> u128 {
        self.vault_balance(asset).saturating_sub(self.committed(asset))
    }

    pub fn working_reserves(&self) -> [u128; 2] {
        [
            self.working_reserve(Asset::Token0),
            self.working_reserve(Asset::Token1),
        ]
    }

    /// Tokens entered custody; they join the working reserve
    pub fn apply_deposit(&mut self, asset: Asset, amount: u128) -> Result<()> {
        let mut next = *self;
        let i = asset.index();
        // the vault never exceeds 112 bits, so only an oversized deposit saturates
        next.vault_balance[i] = ensure_u112(next.vault_balance[i].saturating_add(amount))?;
        next.commit_into(self)
    }

    /// Tokens leave custody out of the working reserve
    pub fn apply_withdrawal(&mut self, asset: Asset, amount: u128) -> Result<()> {
        let available = self.working_reserve(asset);
        if amount > available {
            return Err(TwammError::InsufficientBalance {
                asset,
                requested: amount,
                available,
            });
        }
        let mut next = *self;
        let i = asset.index();
        next.vault_balance[i] = checked_sub(next.vault_balance[i], amount)?;
        next.commit_into(self)
    }

    /// Working reserve → unclaimed proceeds
    pub fn move_to_proceeds(&mut self, asset: Asset, amount: u128) -> Result<()> {
        self.from_working(Bucket::Proceeds, asset, amount)
    }

    /// Unclaimed proceeds → working reserve, ahead of a payout
    pub fn release_proceeds(&mut self, asset: Asset, amount: u128) -> Result<()> {
        self.to_working(Bucket::Proceeds, asset, amount)
    }

    /// Working reserve → committed order principal
    pub fn move_to_order_principal(&mut self, asset: Asset, amount: u128) -> Result<()> {
        self.from_working(Bucket::OrderPrincipal, asset, amount)
    }

    /// Committed order principal → working reserve (sold, or ahead of a refund)
    pub fn release_order_principal(&mut self, asset: Asset, amount: u128) -> Result<()> {
        self.to_working(Bucket::OrderPrincipal, asset, amount)
    }

    /// Working reserve → fee bucket
    pub fn move_to_fee_bucket(&mut self, kind: FeeBucket, asset: Asset, amount: u128) -> Result<()> {
        self.from_working(Bucket::Fee(kind), asset, amount)
    }

    /// Zero a fee bucket and remove its balance from custody, returning the amount swept
    pub fn collect_fee_bucket(&mut self, kind: FeeBucket, asset: Asset) -> Result<u128> {
        let amount = self.fee_bucket(kind, asset);
        let mut next = *self;
        let i = asset.index();
        next.bucket_mut(Bucket::Fee(kind))[i] = 0;
        next.vault_balance[i] = checked_sub(next.vault_balance[i], amount)?;
        next.commit_into(self)?;
        Ok(amount)
    }

    /// Conservation check: the committed buckets never exceed the vault
    pub fn verify(&self) -> Result<()> {
        for asset in Asset::ALL {
            let vault = self.vault_balance(asset);
            let committed = self.committed(asset);
            if vault > MAX_U112 {
                return Err(TwammError::ConservationViolation {
                    asset,
                    detail: format!("vault balance {vault} exceeds 112 bits"),
                });
            }
            if committed > vault {
                return Err(TwammError::ConservationViolation {
                    asset,
                    detail: format!("committed {committed} exceeds vault balance {vault}"),
                });
            }
        }
        Ok(())
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut [u128; 2] {
        match bucket {
            Bucket::OrderPrincipal => &mut self.order_principal,
            Bucket::Proceeds => &mut self.unclaimed_proceeds,
            Bucket::Fee(FeeBucket::Protocol) => &mut self.protocol_fee,
            Bucket::Fee(FeeBucket::Auxiliary) => &mut self.auxiliary_fee,
        }
    }

    fn from_working(&mut self, bucket: Bucket, asset: Asset, amount: u128) -> Result<()> {
        let available = self.working_reserve(asset);
        if amount > available {
            return Err(TwammError::ConservationViolation {
                asset,
                detail: format!("moving {amount} into {bucket:?} with working reserve {available}"),
            });
        }
        let mut next = *self;
        let slot = &mut next.bucket_mut(bucket)[asset.index()];
        *slot = checked_add(*slot, amount)?;
        next.commit_into(self)
    }

    fn to_working(&mut self, bucket: Bucket, asset: Asset, amount: u128) -> Result<()> {
        let mut next = *self;
        let slot = &mut next.bucket_mut(bucket)[asset.index()];
        *slot = slot
            .checked_sub(amount)
            .ok_or_else(|| TwammError::ConservationViolation {
                asset,
                detail: format!("releasing {amount} from {bucket:?} holding {}", *slot),
            })?;
        next.commit_into(self)
    }

    fn commit_into(self, target: &mut Self) -> Result<()> {
        self.verify()?;
        *target = self;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(amount0: u128, amount1: u128) -> ReserveState {
        let mut ledger = ReserveState::new();
        ledger.apply_deposit(Asset::Token0, amount0).unwrap();
        ledger.apply_deposit(Asset::Token1, amount1).unwrap();
        ledger
    }

    fn assert_conserved(ledger: &ReserveState) {
        for asset in Asset::ALL {
            assert_eq!(
                ledger.vault_balance(asset),
                ledger.working_reserve(asset)
                    + ledger.order_principal(asset)
                    + ledger.unclaimed_proceeds(asset)
                    + ledger.fee_bucket(FeeBucket::Protocol, asset)
                    + ledger.fee_bucket(FeeBucket::Auxiliary, asset)
            );
        }
    }

    #[test]
    fn test_buckets_reduce_working_reserve() {
        let mut ledger = funded(1_000, 2_000);
        ledger.move_to_order_principal(Asset::Token0, 100).unwrap();
        ledger.move_to_proceeds(Asset::Token1, 50).unwrap();
        ledger
            .move_to_fee_bucket(FeeBucket::Protocol, Asset::Token0, 7)
            .unwrap();
        ledger
            .move_to_fee_bucket(FeeBucket::Auxiliary, Asset::Token0, 3)
            .unwrap();

        assert_eq!(ledger.working_reserves(), [890, 1_950]);
        assert_eq!(ledger.vault_balance(Asset::Token0), 1_000);
        assert_conserved(&ledger);

        ledger.release_order_principal(Asset::Token0, 40).unwrap();
        assert_eq!(ledger.working_reserve(Asset::Token0), 930);
        assert_conserved(&ledger);
    }

    #[test]
    fn test_withdrawal_limited_to_working_reserve() {
        let mut ledger = funded(1_000, 1_000);
        ledger.move_to_order_principal(Asset::Token0, 600).unwrap();

        let err = ledger.apply_withdrawal(Asset::Token0, 401).unwrap_err();
        assert_eq!(
            err,
            TwammError::InsufficientBalance {
                asset: Asset::Token0,
                requested: 401,
                available: 400
            }
        );
        assert!(!err.is_fatal());

        ledger.apply_withdrawal(Asset::Token0, 400).unwrap();
        assert_eq!(ledger.working_reserve(Asset::Token0), 0);
        assert_eq!(ledger.vault_balance(Asset::Token0), 600);
    }

    #[test]
    fn test_overdrawn_bucket_is_fatal_and_leaves_state() {
        let mut ledger = funded(100, 100);
        ledger.move_to_proceeds(Asset::Token1, 60).unwrap();
        let before = ledger;

        let err = ledger.move_to_proceeds(Asset::Token1, 41).unwrap_err();
        assert!(err.is_fatal());
        let err = ledger.release_proceeds(Asset::Token1, 61).unwrap_err();
        assert!(matches!(err, TwammError::ConservationViolation { .. }));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_collect_fee_bucket_sweeps_out_of_vault() {
        let mut ledger = funded(1_000, 1_000);
        ledger
            .move_to_fee_bucket(FeeBucket::Protocol, Asset::Token1, 25)
            .unwrap();

        let swept = ledger
            .collect_fee_bucket(FeeBucket::Protocol, Asset::Token1)
            .unwrap();
        assert_eq!(swept, 25);
        assert_eq!(ledger.fee_bucket(FeeBucket::Protocol, Asset::Token1), 0);
        assert_eq!(ledger.vault_balance(Asset::Token1), 975);
        assert_eq!(ledger.working_reserve(Asset::Token1), 975);

        let again = ledger
            .collect_fee_bucket(FeeBucket::Protocol, Asset::Token1)
            .unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_deposit_bounded_to_u112() {
        let mut ledger = funded(MAX_U112, 0);
        assert!(matches!(
            ledger.apply_deposit(Asset::Token0, 1),
            Err(TwammError::AmountExceedsU112 { .. })
        ));
        assert_eq!(ledger.vault_balance(Asset::Token0), MAX_U112);

        assert_eq!(
            ledger.apply_deposit(Asset::Token1, u128::MAX),
            Err(TwammError::AmountExceedsU112 { value: u128::MAX })
        );
        assert_eq!(ledger.vault_balance(Asset::Token1), 0);
    }
}
