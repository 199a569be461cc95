//! Property-based and scenario tests for the comparison harness
//!
//! The properties run both strategies through the harness on random pools and
//! check the accounting and determinism guarantees every result must keep.

use bitcoin::Amount;
use coinxpert_common::comparison::{ComparisonHarness, ComparisonRecord, Outcome};
use coinxpert_common::logging::{self, LogConfig, LogLevel};
use coinxpert_common::math::{FeeModel, FeeRate};
use coinxpert_common::utxo_selection::strategies::base::covers_payment;
use coinxpert_common::utxo_selection::{InputSet, SelectionParams, SelectionResult, Target, Utxo};
use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::quickcheck;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

fn setup() {
    INIT_LOGGER.call_once(|| {
        let config = LogConfig {
            level: LogLevel::Error,
            quiet: true,
            timestamps: false,
            ..LogConfig::default()
        };
        let _ = logging::init(&config);
    });
}

// Helper to generate UTXO pools with unique ids
#[derive(Clone, Debug)]
struct Pool(Vec<Utxo>);

impl Arbitrary for Pool {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 16;
        let utxos = (0..len)
            .map(|i| {
                let sats = u64::arbitrary(g) % 2_000_000 + 1;
                Utxo::new(format!("utxo-{}", i), Amount::from_sat(sats))
            })
            .collect();
        Pool(utxos)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let utxos = self.0.clone();
        Box::new((0..utxos.len()).map(move |skip| {
            Pool(
                utxos
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, u)| u.clone())
                    .collect(),
            )
        }))
    }
}

// Helper to generate payment targets
#[derive(Clone, Copy, Debug)]
struct PaymentTarget(u64);

impl Arbitrary for PaymentTarget {
    fn arbitrary(g: &mut Gen) -> Self {
        PaymentTarget(u64::arbitrary(g) % 3_000_000 + 1)
    }
}

// Helper to generate fee rates between 0 and 50 sat/vB
#[derive(Clone, Copy, Debug)]
struct Rate(u64);

impl Arbitrary for Rate {
    fn arbitrary(g: &mut Gen) -> Self {
        Rate(u64::arbitrary(g) % 50_001)
    }
}

fn params(rate: Rate) -> SelectionParams {
    SelectionParams::new(FeeModel::new(
        FeeRate::from_sat_per_kvb(rate.0),
        10,
        146,
        34,
    ))
}

fn compare(pool: &[Utxo], target: u64, params: &SelectionParams) -> ComparisonRecord {
    ComparisonHarness::new()
        .compare(pool, Amount::from_sat(target), params)
        .expect("generated input is valid")
}

fn accounting_holds(result: &SelectionResult, target: u64, params: &SelectionParams) -> bool {
    let selection = match &result.selection {
        Some(selection) => selection,
        None => return true,
    };

    let target = Amount::from_sat(target);
    let spendable = match selection.total_input_value.checked_sub(selection.total_fee) {
        Some(spendable) => spendable,
        None => return false,
    };

    let balanced = match selection.change {
        Some(change) => spendable.checked_sub(target) == Some(change.value),
        None => spendable == target,
    };

    let economical = selection
        .inputs
        .iter()
        .all(|u| params.fee_model.effective_value(u.value) > 0);

    balanced && economical && spendable >= target
}

#[quickcheck]
fn selections_balance_exactly(pool: Pool, target: PaymentTarget, rate: Rate) -> bool {
    setup();
    let params = params(rate);
    let record = compare(&pool.0, target.0, &params);

    accounting_holds(&record.reference, target.0, &params)
        && accounting_holds(&record.alternative, target.0, &params)
}

#[quickcheck]
fn reference_funds_every_coverable_payment(pool: Pool, target: PaymentTarget, rate: Rate) -> TestResult {
    setup();
    let params = params(rate);
    let set = InputSet::new(&pool.0, params.fee_model).unwrap();
    let payment = Target::new(Amount::from_sat(target.0)).unwrap();
    if !covers_payment(&params.fee_model, &set.candidates(), payment) {
        return TestResult::discard();
    }

    let record = compare(&pool.0, target.0, &params);
    TestResult::from_bool(record.reference.is_feasible())
}

#[quickcheck]
fn comparison_is_idempotent(pool: Pool, target: PaymentTarget, rate: Rate) -> bool {
    setup();
    let params = params(rate);
    let first = serde_json::to_string(&compare(&pool.0, target.0, &params)).unwrap();
    let second = serde_json::to_string(&compare(&pool.0, target.0, &params)).unwrap();
    first == second
}

#[quickcheck]
fn permuting_utxos_does_not_change_selections(pool: Pool, target: PaymentTarget, rate: Rate) -> bool {
    setup();
    let params = params(rate);
    let mut reversed = pool.0.clone();
    reversed.reverse();
    let mut rotated = pool.0.clone();
    if !rotated.is_empty() {
        rotated.rotate_left(1);
    }

    let original = compare(&pool.0, target.0, &params);
    [reversed, rotated].iter().all(|permuted| {
        let record = compare(permuted, target.0, &params);
        record.reference == original.reference && record.alternative == original.alternative
    })
}

#[quickcheck]
fn adding_utxos_keeps_feasible_targets_feasible(
    pool: Pool,
    extra: Pool,
    target: PaymentTarget,
    rate: Rate,
) -> TestResult {
    setup();
    let params = params(rate);
    let before = compare(&pool.0, target.0, &params);
    if before.outcome == Outcome::Neither {
        return TestResult::discard();
    }

    let mut grown = pool.0.clone();
    grown.extend(
        extra
            .0
            .into_iter()
            .map(|u| Utxo::new(format!("extra-{}", u.id), u.value)),
    );
    let after = compare(&grown, target.0, &params);

    TestResult::from_bool(
        (!before.reference.is_feasible() || after.reference.is_feasible())
            && (!before.alternative.is_feasible() || after.alternative.is_feasible()),
    )
}

#[quickcheck]
fn parallel_and_sequential_runs_agree(pool: Pool, target: PaymentTarget, rate: Rate) -> bool {
    setup();
    let params = params(rate);
    let sequential = ComparisonHarness::new()
        .compare(&pool.0, Amount::from_sat(target.0), &params)
        .unwrap();
    let parallel = ComparisonHarness::new()
        .parallel(true)
        .compare(&pool.0, Amount::from_sat(target.0), &params)
        .unwrap();
    sequential == parallel
}

#[quickcheck]
fn raising_fee_rate_never_lowers_the_fee_of_a_single_input(
    value: u32,
    target: PaymentTarget,
    low: Rate,
    high: Rate,
) -> TestResult {
    setup();
    let (low, high) = if low.0 <= high.0 { (low, high) } else { (high, low) };
    let pool = vec![Utxo::new("only", Amount::from_sat(u64::from(value) + 1))];

    let cheap = compare(&pool, target.0, &params(low));
    let dear = compare(&pool, target.0, &params(high));

    match (cheap.fee_btc_core, dear.fee_btc_core) {
        (Some(cheap_fee), Some(dear_fee)) => TestResult::from_bool(cheap_fee <= dear_fee),
        _ => TestResult::discard(),
    }
}

#[test]
fn test_exact_match_scenario() {
    setup();
    let pool = vec![
        Utxo::new("five", Amount::from_sat(5)),
        Utxo::new("three", Amount::from_sat(3)),
        Utxo::new("two", Amount::from_sat(2)),
    ];
    let record = compare(&pool, 5, &params(Rate(0)));

    let core = record.reference.selection.as_ref().unwrap();
    assert_eq!(core.inputs.len(), 1);
    assert_eq!(core.inputs[0].id.as_str(), "five");
    assert_eq!(record.fee_btc_core, Some(Amount::ZERO));
    assert_eq!(record.waste_core, Some(0));
}

#[test]
fn test_infeasible_scenario() {
    setup();
    let pool = vec![
        Utxo::new("a", Amount::from_sat(1)),
        Utxo::new("b", Amount::from_sat(1)),
    ];
    let record = compare(&pool, 10, &params(Rate(0)));

    assert_eq!(record.outcome, Outcome::Neither);
    assert_eq!(record.fee_btc_core, None);
    assert_eq!(record.fee_coinxpert, None);
    assert_eq!(record.fee_delta, None);
    assert_eq!(record.waste_delta, None);
}

#[test]
fn test_record_reports_fee_and_waste_deltas() {
    setup();
    let params = SelectionParams::default();
    let pool = vec![
        Utxo::new("a", Amount::from_sat(100_000)),
        Utxo::new("b", Amount::from_sat(60_000)),
    ];
    let record = compare(&pool, 50_000, &params);

    assert!(record.both_feasible());
    // Both spend one input and create change
    assert_eq!(record.fee_btc_core, Some(Amount::from_sat(4_480)));
    assert_eq!(record.fee_coinxpert, Some(Amount::from_sat(4_480)));
    assert_eq!(record.fee_delta, Some(0));
    assert_eq!(record.waste_core, Some(4_480 - 880));
    assert_eq!(record.waste_delta, Some(0));
    assert_eq!(record.inputs, pool);

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["fee_delta"], 0);
    assert_eq!(json["waste_delta"], 0);
    assert_eq!(json["fee_btc_core"], 4_480);
}

#[test]
fn test_compare_does_not_mutate_input() {
    setup();
    let pool = vec![
        Utxo::new("b", Amount::from_sat(10_000)),
        Utxo::new("a", Amount::from_sat(90_000)),
    ];
    let snapshot = pool.clone();
    let _ = compare(&pool, 20_000, &SelectionParams::default());
    assert_eq!(pool, snapshot);
}

#[test]
fn test_zero_target_is_rejected() {
    setup();
    let result = ComparisonHarness::new().compare(
        &[Utxo::new("a", Amount::from_sat(1_000))],
        Amount::ZERO,
        &SelectionParams::default(),
    );
    assert!(result.is_err());
}
