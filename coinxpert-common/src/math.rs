//! Fee and value arithmetic for coin selection
//!
//! Everything on the selection path is integer satoshi arithmetic. A fee rate is
//! stored as satoshis per 1000 size units (sat/kvB) so that fractional sat/vB
//! rates such as `2.5` stay exact, and every fee is rounded up:
//!
//! ```text
//! fee = ceil(rate_per_kvb * size / 1000)
//! size = base_overhead + inputs * per_input_weight + outputs * per_output_weight
//! ```
//!
//! Floating point only appears in [`btc_to_sats`] and [`sats_to_btc`], which sit
//! at the display boundary.
//!
//! Example:
//! ```
//! use coinxpert_common::math::{FeeModel, FeeRate};
//! use bitcoin::Amount;
//!
//! let model = FeeModel::new(FeeRate::from_sat_per_vb(20), 10, 146, 34);
//!
//! // One input, payment plus change
//! assert_eq!(model.fee_for(1, 2), Amount::from_sat(20 * (10 + 146 + 2 * 34)));
//! assert_eq!(model.effective_value(Amount::from_sat(10_000)), 10_000 - 20 * 146);
//! ```

use crate::error::{CoinXpertError, CoinXpertResult};
use crate::types::{MAX_BITCOIN_SUPPLY, SATS_PER_BTC};
use bitcoin::Amount;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default transaction overhead in size units
pub const DEFAULT_BASE_OVERHEAD: u64 = 10;

/// Default size of one input (legacy P2PKH)
pub const DEFAULT_INPUT_WEIGHT: u64 = 146;

/// Default size of one output (legacy P2PKH)
pub const DEFAULT_OUTPUT_WEIGHT: u64 = 34;

/// Default fee rate in sat/vB
pub const DEFAULT_FEE_RATE_SAT_PER_VB: u64 = 20;

/// Fee rate in satoshis per 1000 size units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate(u64);

impl FeeRate {
    /// Zero fee rate, used for exact-value arithmetic
    pub const ZERO: FeeRate = FeeRate(0);

    pub const fn from_sat_per_kvb(sat_per_kvb: u64) -> Self {
        FeeRate(sat_per_kvb)
    }

    pub const fn from_sat_per_vb(sat_per_vb: u64) -> Self {
        FeeRate(sat_per_vb.saturating_mul(1000))
    }

    /// Build a fee rate from a decimal sat/vB value, rounding up to the next sat/kvB
    ///
    /// Negative rates and rates too large for the integer representation are rejected.
    pub fn from_sat_per_vb_decimal(sat_per_vb: Decimal) -> CoinXpertResult<Self> {
        if sat_per_vb.is_sign_negative() && !sat_per_vb.is_zero() {
            return Err(CoinXpertError::invalid_input(format!(
                "fee rate must not be negative, got {} sat/vB",
                sat_per_vb
            )));
        }

        let per_kvb = sat_per_vb
            .checked_mul(Decimal::from(1000))
            .map(|d| d.ceil())
            .and_then(|d| d.to_u64())
            .ok_or_else(|| {
                CoinXpertError::invalid_input(format!("fee rate {} sat/vB is out of range", sat_per_vb))
            })?;

        Ok(FeeRate(per_kvb))
    }

    pub const fn as_sat_per_kvb(&self) -> u64 {
        self.0
    }

    /// The rate as a decimal sat/vB value
    pub fn as_sat_per_vb(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(1000)
    }

    /// Fee for `size` units at this rate, rounded up
    pub fn fee_for_size(&self, size: u64) -> u64 {
        let scaled = u128::from(self.0) * u128::from(size);
        let fee = (scaled + 999) / 1000;
        u64::try_from(fee).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/vB", self.as_sat_per_vb().normalize())
    }
}

/// Linear transaction size model paired with a fee rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeModel {
    pub fee_rate: FeeRate,
    pub base_overhead: u64,
    pub per_input_weight: u64,
    pub per_output_weight: u64,
}

impl Default for FeeModel {
    fn default() -> Self {
        Self::new(
            FeeRate::from_sat_per_vb(DEFAULT_FEE_RATE_SAT_PER_VB),
            DEFAULT_BASE_OVERHEAD,
            DEFAULT_INPUT_WEIGHT,
            DEFAULT_OUTPUT_WEIGHT,
        )
    }
}

impl FeeModel {
    pub fn new(
        fee_rate: FeeRate,
        base_overhead: u64,
        per_input_weight: u64,
        per_output_weight: u64,
    ) -> Self {
        Self {
            fee_rate,
            base_overhead,
            per_input_weight,
            per_output_weight,
        }
    }

    /// Same size model at a different fee rate
    pub fn with_fee_rate(self, fee_rate: FeeRate) -> Self {
        Self { fee_rate, ..self }
    }

    /// Estimated size of a transaction with the given input and output counts
    pub fn tx_size(&self, num_inputs: usize, num_outputs: usize) -> u64 {
        self.base_overhead
            .saturating_add((num_inputs as u64).saturating_mul(self.per_input_weight))
            .saturating_add((num_outputs as u64).saturating_mul(self.per_output_weight))
    }

    /// Fee of a whole transaction, rounded up
    pub fn fee_for(&self, num_inputs: usize, num_outputs: usize) -> Amount {
        Amount::from_sat(self.fee_rate.fee_for_size(self.tx_size(num_inputs, num_outputs)))
    }

    /// Marginal fee of one input
    pub fn input_fee(&self) -> Amount {
        Amount::from_sat(self.fee_rate.fee_for_size(self.per_input_weight))
    }

    /// Marginal fee of one output
    pub fn output_fee(&self) -> Amount {
        Amount::from_sat(self.fee_rate.fee_for_size(self.per_output_weight))
    }

    /// Value of a UTXO minus the fee of spending it; negative for uneconomical inputs
    pub fn effective_value(&self, value: Amount) -> i64 {
        sats_as_i64(value) - sats_as_i64(self.input_fee())
    }

    /// Cost of creating a change output now and spending it later
    pub fn cost_of_change(&self) -> Amount {
        Amount::from_sat(
            self.output_fee()
                .to_sat()
                .saturating_add(self.input_fee().to_sat()),
        )
    }
}

/// Convert an amount to signed satoshis. Amounts never exceed the supply cap, so this is lossless.
pub(crate) fn sats_as_i64(amount: Amount) -> i64 {
    i64::try_from(amount.to_sat()).unwrap_or(i64::MAX)
}

/// Determines if an amount is at or below the dust threshold
pub fn is_dust_amount(amount_sats: u64, dust_threshold: u64) -> bool {
    amount_sats <= dust_threshold
}

/// Convert a whole-coin value to satoshis, rounding half away from zero
///
/// Negative, non-finite and above-supply values are rejected.
pub fn btc_to_sats(btc: f64) -> CoinXpertResult<u64> {
    if !btc.is_finite() {
        return Err(CoinXpertError::invalid_input(format!(
            "amount {} is not a finite number",
            btc
        )));
    }
    if btc < 0.0 {
        return Err(CoinXpertError::invalid_input(format!(
            "amount {} BTC is negative",
            btc
        )));
    }

    let sats = Decimal::from_f64(btc)
        .and_then(|d| d.checked_mul(Decimal::from(SATS_PER_BTC)))
        .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_u64())
        .ok_or_else(|| CoinXpertError::invalid_input(format!("amount {} BTC is out of range", btc)))?;

    if sats > MAX_BITCOIN_SUPPLY {
        return Err(CoinXpertError::invalid_input(format!(
            "amount {} BTC exceeds the maximum bitcoin supply",
            btc
        )));
    }

    Ok(sats)
}

/// Convert satoshis to a whole-coin value for display
pub fn sats_to_btc(sats: u64) -> f64 {
    Amount::from_sat(sats).to_btc()
}
