use bitcoin::Amount;
use coinxpert_common::logging::{self, LogConfig, LogFormat, LogLevel};
use coinxpert_common::math::{FeeModel, FeeRate};
use coinxpert_common::utxo_selection::{
    BitcoinCoreStrategy, CoinXpertStrategy, InputSet, SelectionParams, SelectionResult, Strategy,
    Target, Utxo, UtxoId, UtxoSelector,
};
use coinxpert_common::{CoinXpertError, DUST_THRESHOLD};
use std::sync::Once;

// Initialize once for UTXO selection tests
static INIT_LOGGER: Once = Once::new();

fn setup() {
    INIT_LOGGER.call_once(|| {
        let config = LogConfig {
            level: LogLevel::Error,
            log_file: None,
            timestamps: false,
            source_location: false,
            format: LogFormat::Text,
            quiet: true,
        };

        let _ = logging::init(&config);
    });
}

fn utxos(values: &[u64]) -> Vec<Utxo> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Utxo::new(format!("utxo-{}", i), Amount::from_sat(*v)))
        .collect()
}

fn zero_fee_params() -> SelectionParams {
    SelectionParams::new(FeeModel::new(FeeRate::ZERO, 10, 148, 34))
}

fn run(strategy: &dyn Strategy, utxos: &[Utxo], target: u64, params: &SelectionParams) -> SelectionResult {
    let inputs = InputSet::new(utxos, params.fee_model).unwrap();
    UtxoSelector::new(params).select(strategy, &inputs, Target::new(Amount::from_sat(target)).unwrap())
}

fn selected_ids(result: &SelectionResult) -> Vec<String> {
    result
        .selection
        .as_ref()
        .map(|s| s.inputs.iter().map(|u| u.id.to_string()).collect())
        .unwrap_or_default()
}

#[test]
fn test_core_exact_match_uses_single_input() {
    setup();
    let params = zero_fee_params();
    let result = run(&BitcoinCoreStrategy::new(), &utxos(&[5, 3, 2]), 5, &params);

    assert_eq!(result.strategy_name, "core");
    let selection = result.selection.expect("exact match should be feasible");
    assert_eq!(selection.inputs.len(), 1);
    assert_eq!(selection.inputs[0].value, Amount::from_sat(5));
    assert_eq!(selection.total_fee, Amount::ZERO);
    assert!(selection.change.is_none());
}

#[test]
fn test_insufficient_funds_is_infeasible_for_both() {
    setup();
    let pool = utxos(&[1, 1]);

    for params in [zero_fee_params(), SelectionParams::default()] {
        assert!(!run(&BitcoinCoreStrategy::new(), &pool, 10, &params).is_feasible());
        assert!(!run(&CoinXpertStrategy::new(), &pool, 10, &params).is_feasible());
    }
}

#[test]
fn test_negative_effective_value_inputs_are_never_selected() {
    setup();
    let pool = vec![
        Utxo::new("dust", Amount::from_sat(2_000)),
        Utxo::new("a", Amount::from_sat(100_000)),
        Utxo::new("b", Amount::from_sat(60_000)),
    ];
    let params = SelectionParams::default();

    let core = run(&BitcoinCoreStrategy::new(), &pool, 50_000, &params);
    let coinxpert = run(&CoinXpertStrategy::new(), &pool, 50_000, &params);

    assert_eq!(selected_ids(&core), vec!["b"]);
    assert_eq!(selected_ids(&coinxpert), vec!["a"]);
    for result in [&core, &coinxpert] {
        assert!(!result
            .selection
            .as_ref()
            .unwrap()
            .contains(&UtxoId::new("dust")));
    }
}

#[test]
fn test_change_accounting_is_exact() {
    setup();
    let params = SelectionParams::default();
    let pool = utxos(&[100_000, 60_000]);
    let target = Amount::from_sat(50_000);

    let result = run(&BitcoinCoreStrategy::new(), &pool, target.to_sat(), &params);
    let selection = result.selection.unwrap();

    // 60_000 - 50_000 - fee_for(1, 2) at 20 sat/vB
    let change = selection.change.expect("change above dust");
    assert_eq!(selection.total_fee, params.fee_model.fee_for(1, 2));
    assert_eq!(change.value, Amount::from_sat(60_000 - 50_000 - 4_480));
    assert_eq!(
        selection.total_input_value - selection.total_fee - target,
        change.value
    );
    assert!(change.value.to_sat() > DUST_THRESHOLD);
}

#[test]
fn test_surplus_below_dust_goes_to_fee() {
    setup();
    let params = SelectionParams::default();
    // fee_for(1, 1) = 3_800, fee_for(1, 2) = 4_480 at 20 sat/vB
    let pool = utxos(&[55_000]);

    let result = run(&CoinXpertStrategy::new(), &pool, 50_600, &params);
    let selection = result.selection.unwrap();

    assert!(selection.change.is_none());
    assert_eq!(selection.total_fee, Amount::from_sat(55_000 - 50_600));
    assert_eq!(
        selection.total_input_value - selection.total_fee,
        Amount::from_sat(50_600)
    );
}

#[test]
fn test_core_avoids_change_when_a_combination_fits_the_window() {
    setup();
    let params = SelectionParams::default();
    let input_fee = params.fee_model.input_fee().to_sat();
    let payment_fee = params.fee_model.fee_for(0, 1).to_sat();

    // Two inputs whose effective values sum exactly to target + fee_for(0, 1)
    let target = 70_000;
    let pool = vec![
        Utxo::new("x", Amount::from_sat(40_000 + input_fee)),
        Utxo::new("y", Amount::from_sat(30_000 + payment_fee + input_fee)),
        Utxo::new("z", Amount::from_sat(500_000)),
    ];

    let result = run(&BitcoinCoreStrategy::new(), &pool, target, &params);
    let selection = result.selection.as_ref().unwrap();

    assert_eq!(selected_ids(&result), vec!["x", "y"]);
    assert!(selection.change.is_none());
    assert_eq!(
        selection.total_input_value - selection.total_fee,
        Amount::from_sat(target)
    );
}

#[test]
fn test_coinxpert_on_empty_pool_is_infeasible() {
    setup();
    let result = run(&CoinXpertStrategy::new(), &[], 1_000, &SelectionParams::default());
    assert_eq!(result.strategy_name, "coinxpert");
    assert!(result.selection.is_none());
}

#[test]
fn test_tiny_search_budget_still_finds_a_selection() {
    setup();
    let params = SelectionParams::default().with_bnb_max_tries(1);
    let pool = utxos(&[80_000, 70_000, 65_000, 20_000]);

    let result = run(&BitcoinCoreStrategy::new(), &pool, 100_000, &params);
    let selection = result.selection.expect("fallback should produce a selection");
    assert!(selection.total_input_value - selection.total_fee >= Amount::from_sat(100_000));
}

#[test]
fn test_invalid_input_is_rejected_before_search() {
    setup();
    assert!(matches!(
        Target::new(Amount::ZERO),
        Err(CoinXpertError::InvalidInput(_))
    ));

    let duplicated = vec![
        Utxo::new("same", Amount::from_sat(1_000)),
        Utxo::new("same", Amount::from_sat(2_000)),
    ];
    assert!(matches!(
        InputSet::new(&duplicated, SelectionParams::default().fee_model),
        Err(CoinXpertError::DuplicateUtxo(_))
    ));
}

#[test]
fn test_oversized_fee_model_is_infeasible_without_overflow() {
    setup();
    let params = SelectionParams::new(FeeModel::new(
        FeeRate::from_sat_per_vb(20),
        10,
        146,
        1 << 62,
    ));
    let pool = utxos(&[100_000, 60_000]);

    let core = run(&BitcoinCoreStrategy::new(), &pool, 50_000, &params);
    let coinxpert = run(&CoinXpertStrategy::new(), &pool, 50_000, &params);

    assert!(core.selection.is_none());
    assert!(coinxpert.selection.is_none());
}
