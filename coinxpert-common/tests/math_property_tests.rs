//! Property-based tests for the math module
//!
//! These tests use quickcheck to verify the fee model and the display
//! conversions used at the request boundary.

use bitcoin::Amount;
use coinxpert_common::math::{self, FeeModel, FeeRate};
use coinxpert_common::types::*;
use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::quickcheck;

// Helper to generate valid satoshi amounts
#[derive(Clone, Debug)]
struct ValidSatoshiAmount(u64);

impl Arbitrary for ValidSatoshiAmount {
    fn arbitrary(g: &mut Gen) -> Self {
        let sats = u64::arbitrary(g) % (MAX_BITCOIN_SUPPLY + 1);
        ValidSatoshiAmount(sats)
    }
}

// Helper to generate size models with realistic weights
#[derive(Clone, Debug)]
struct SizeModel {
    base: u64,
    input: u64,
    output: u64,
}

impl Arbitrary for SizeModel {
    fn arbitrary(g: &mut Gen) -> Self {
        SizeModel {
            base: u64::arbitrary(g) % 100,
            input: u64::arbitrary(g) % 400 + 1,
            output: u64::arbitrary(g) % 100 + 1,
        }
    }
}

impl SizeModel {
    fn at(&self, sat_per_kvb: u64) -> FeeModel {
        FeeModel::new(
            FeeRate::from_sat_per_kvb(sat_per_kvb),
            self.base,
            self.input,
            self.output,
        )
    }
}

#[quickcheck]
fn sats_to_btc_to_sats_is_identity(amount: ValidSatoshiAmount) -> bool {
    let btc = math::sats_to_btc(amount.0);
    math::btc_to_sats(btc).map(|sats| sats == amount.0).unwrap_or(false)
}

#[quickcheck]
fn negative_btc_is_rejected(btc: f64) -> TestResult {
    if !(btc < 0.0) {
        return TestResult::discard();
    }
    TestResult::from_bool(math::btc_to_sats(btc).is_err())
}

#[quickcheck]
fn fee_never_decreases_with_rate(model: SizeModel, a: u32, b: u32, inputs: u8, outputs: u8) -> bool {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let (inputs, outputs) = (inputs as usize, outputs as usize);

    model.at(u64::from(low)).fee_for(inputs, outputs) <= model.at(u64::from(high)).fee_for(inputs, outputs)
}

#[quickcheck]
fn fee_never_decreases_with_more_inputs(model: SizeModel, rate: u32, inputs: u8) -> bool {
    let fee_model = model.at(u64::from(rate));
    let n = inputs as usize;
    fee_model.fee_for(n, 1) <= fee_model.fee_for(n + 1, 1)
        && fee_model.fee_for(n, 1) <= fee_model.fee_for(n, 2)
}

#[quickcheck]
fn marginal_fees_bound_the_total_fee(model: SizeModel, rate: u32, inputs: u8) -> bool {
    let fee_model = model.at(u64::from(rate));
    let n = inputs as usize;

    // Rounding each input up separately never undercounts the whole transaction
    let bound = fee_model.fee_for(0, 1).to_sat() + n as u64 * fee_model.input_fee().to_sat();
    fee_model.fee_for(n, 1).to_sat() <= bound
}

#[quickcheck]
fn effective_value_plus_input_fee_is_value(model: SizeModel, rate: u32, sats: u32) -> bool {
    let fee_model = model.at(u64::from(rate));
    let value = Amount::from_sat(u64::from(sats));
    fee_model.effective_value(value) + fee_model.input_fee().to_sat() as i64 == i64::from(sats)
}

#[quickcheck]
fn zero_rate_means_zero_fee(model: SizeModel, inputs: u8, outputs: u8) -> bool {
    model.at(0).fee_for(inputs as usize, outputs as usize) == Amount::ZERO
}

#[quickcheck]
fn dust_threshold_is_consistent(amount: u64) -> bool {
    if amount <= DUST_THRESHOLD {
        math::is_dust_amount(amount, DUST_THRESHOLD)
    } else {
        !math::is_dust_amount(amount, DUST_THRESHOLD)
    }
}

#[test]
fn test_default_fee_model_matches_reference_constants() {
    let model = FeeModel::default();
    assert_eq!(model.fee_rate, FeeRate::from_sat_per_vb(20));
    assert_eq!(model.fee_for(2, 1), Amount::from_sat(20 * (10 + 2 * 146 + 34)));
    assert_eq!(model.fee_for(0, 1), Amount::from_sat(880));
    assert_eq!(FeeRate::from_sat_per_vb(20).to_string(), "20 sat/vB");
}
