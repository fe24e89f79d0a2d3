//! Fee engine
//!
//! Pure functions splitting a gross fee between LPs, the protocol and the
//! auxiliary recipient. Nothing here touches the ledger; the caller applies the
//! returned deltas.
//!
//! Rounding, per split:
//!
//! | Quantity            | Rounding                                          |
//! |---------------------|---------------------------------------------------|
//! | gross fee           | up (`div_up(amount * bp, 100_000)`)              |
//! | short-term protocol | up (`div_up(gross * fraction, 1e18)`)            |
//! | long-term LP share  | down, remainder lands in protocol                |
//! | auxiliary share     | down (`div_down(gross * rem, 1e18 * (N + 1))`)   |
//!
//! With protocol collection switched off the rounding remainder of the auxiliary
//! split goes to LPs instead, so a disabled protocol fee never accrues anything.

use serde::{Deserialize, Serialize};
use tracing::debug;
use twamm_config::defaults::{DEFAULT_FEE_SHIFT, DEFAULT_PROTOCOL_FEE_FRACTION};
use twamm_config::{FeeSection, PoolKind};
use twamm_types::{
    checked_mul, checked_sub, mul_div_down, mul_div_up, Address, Result, TwammError,
    FEE_DENOMINATOR, MAX_FEE_BP, MAX_FEE_SHIFT, MAX_PROTOCOL_FEE_FRACTION, MIN_FEE_SHIFT, ONE_18,
};

/// Which short-term rate applies to a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapKind {
    Regular,
    /// Registered arbitrage partner, charged the partner rate
    Partner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShortTermFee {
    pub amount_less_fees: u128,
    pub gross_fee: u128,
    pub protocol_fee: u128,
    pub lp_fee: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LongTermFee {
    pub amount_less_fees: u128,
    pub gross_fee: u128,
    pub protocol_fee: u128,
    pub auxiliary_fee: u128,
    pub lp_fee: u128,
}

/// Validated fee parameters of one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfiguration {
    short_term_bp: u32,
    partner_bp: u32,
    long_term_bp: u32,
    collect_protocol_fee: bool,
    protocol_fee_fraction: u128,
    collect_auxiliary_fee: bool,
    auxiliary_recipient: Option<Address>,
    fee_shift: u8,
}

impl FeeConfiguration {
    /// Preset rates for a pool type, protocol and auxiliary collection off
    pub fn for_kind(kind: PoolKind) -> Self {
        let preset = kind.preset();
        Self {
            short_term_bp: preset.short_term_bp,
            partner_bp: preset.partner_bp,
            long_term_bp: preset.long_term_bp,
            collect_protocol_fee: false,
            protocol_fee_fraction: DEFAULT_PROTOCOL_FEE_FRACTION as u128,
            collect_auxiliary_fee: false,
            auxiliary_recipient: None,
            fee_shift: DEFAULT_FEE_SHIFT,
        }
    }

    pub fn from_settings(kind: PoolKind, section: &FeeSection) -> Result<Self> {
        let mut fees = Self::for_kind(kind);
        fees.set_rates(
            section.short_term_bp.unwrap_or(fees.short_term_bp),
            section.partner_bp.unwrap_or(fees.partner_bp),
            section.long_term_bp.unwrap_or(fees.long_term_bp),
        )?;
        fees.set_protocol_fee(
            section.collect_protocol_fee,
            section
                .protocol_fee_fraction
                .map(u128::from)
                .unwrap_or(fees.protocol_fee_fraction),
        )?;
        if let Some(shift) = section.fee_shift {
            fees.set_fee_shift(shift)?;
        }
        fees.auxiliary_recipient = section.auxiliary_recipient;
        fees.collect_auxiliary_fee = section.collect_auxiliary_fee && fees.auxiliary_recipient.is_some();
        Ok(fees)
    }

    pub fn short_term_bp(&self) -> u32 {
        self.short_term_bp
    }

    pub fn partner_bp(&self) -> u32 {
        self.partner_bp
    }

    pub fn long_term_bp(&self) -> u32 {
        self.long_term_bp
    }

    pub fn collects_protocol_fee(&self) -> bool {
        self.collect_protocol_fee
    }

    pub fn protocol_fee_fraction(&self) -> u128 {
        self.protocol_fee_fraction
    }

    pub fn collects_auxiliary_fee(&self) -> bool {
        self.collect_auxiliary_fee
    }

    pub fn auxiliary_recipient(&self) -> Option<Address> {
        self.auxiliary_recipient
    }

    pub fn fee_shift(&self) -> u8 {
        self.fee_shift
    }

    pub fn set_rates(&mut self, short_term_bp: u32, partner_bp: u32, long_term_bp: u32) -> Result<()> {
        for rate_bp in [short_term_bp, partner_bp, long_term_bp] {
            if rate_bp > MAX_FEE_BP {
                return Err(TwammError::InvalidFeeRate {
                    rate_bp,
                    max_bp: MAX_FEE_BP,
                });
            }
        }
        self.short_term_bp = short_term_bp;
        self.partner_bp = partner_bp;
        self.long_term_bp = long_term_bp;
        Ok(())
    }

    pub fn set_protocol_fee(&mut self, collect: bool, fraction: u128) -> Result<()> {
        if fraction > MAX_PROTOCOL_FEE_FRACTION {
            return Err(TwammError::InvalidProtocolFeeFraction {
                fraction,
                max: MAX_PROTOCOL_FEE_FRACTION,
            });
        }
        self.collect_protocol_fee = collect;
        self.protocol_fee_fraction = fraction;
        Ok(())
    }

    /// `Some(recipient)` turns auxiliary collection on, `None` turns it off.
    /// The last recipient is kept so fees already accrued can still be swept.
    pub fn set_auxiliary_fee(&mut self, recipient: Option<Address>) {
        match recipient {
            Some(address) => {
                self.collect_auxiliary_fee = true;
                self.auxiliary_recipient = Some(address);
            }
            None => self.collect_auxiliary_fee = false,
        }
    }

    pub fn set_fee_shift(&mut self, shift: u8) -> Result<()> {
        if !(MIN_FEE_SHIFT..=MAX_FEE_SHIFT).contains(&shift) {
            return Err(TwammError::InvalidFeeShift { shift });
        }
        self.fee_shift = shift;
        Ok(())
    }

    fn short_term_rate(&self, kind: SwapKind) -> u32 {
        match kind {
            SwapKind::Regular => self.short_term_bp,
            SwapKind::Partner => self.partner_bp,
        }
    }

    /// Fee split for an immediate swap
    pub fn compute_short_term_fee(&self, amount_in: u128, kind: SwapKind) -> Result<ShortTermFee> {
        let gross_fee = gross_fee(amount_in, self.short_term_rate(kind))?;
        let amount_less_fees = checked_sub(amount_in, gross_fee)?;

        let protocol_fee = if self.collect_protocol_fee {
            mul_div_up(gross_fee, self.protocol_fee_fraction, ONE_18)?
        } else {
            0
        };
        let lp_fee = checked_sub(gross_fee, protocol_fee)?;

        Ok(ShortTermFee {
            amount_less_fees,
            gross_fee,
            protocol_fee,
            lp_fee,
        })
    }

    /// Fee split for the amount sold by long-term orders in one execution step
    pub fn compute_long_term_fee(&self, amount_in: u128) -> Result<LongTermFee> {
        let gross_fee = gross_fee(amount_in, self.long_term_bp)?;
        let amount_less_fees = checked_sub(amount_in, gross_fee)?;

        let remainder = if self.collect_protocol_fee {
            checked_sub(ONE_18, self.protocol_fee_fraction)?
        } else {
            ONE_18
        };

        let (lp_fee, auxiliary_fee) = if self.collect_auxiliary_fee {
            let ratio = 1u128 << self.fee_shift;
            let share = mul_div_down(gross_fee, remainder, checked_mul(ONE_18, ratio + 1)?)?;
            let lp_fee = checked_mul(share, ratio)?;
            if self.collect_protocol_fee {
                (lp_fee, share)
            } else {
                (checked_sub(gross_fee, share)?, share)
            }
        } else {
            (mul_div_down(gross_fee, remainder, ONE_18)?, 0)
        };

        let protocol_fee = checked_sub(checked_sub(gross_fee, lp_fee)?, auxiliary_fee)?;

        debug!(
            amount_in,
            gross_fee, lp_fee, protocol_fee, auxiliary_fee, "Long-term fee split"
        );

        Ok(LongTermFee {
            amount_less_fees,
            gross_fee,
            protocol_fee,
            auxiliary_fee,
            lp_fee,
        })
    }
}

impl Default for FeeConfiguration {
    fn default() -> Self {
        Self::for_kind(PoolKind::default())
    }
}

fn gross_fee(amount_in: u128, rate_bp: u32) -> Result<u128> {
    mul_div_up(amount_in, u128::from(rate_bp), FEE_DENOMINATOR)
}
