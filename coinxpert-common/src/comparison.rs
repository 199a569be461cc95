//! Side-by-side comparison of two selection strategies
//!
//! The [`ComparisonHarness`] builds a single [`InputSet`] for a request and runs
//! a reference and an alternative strategy over it. Both results go through the
//! same change policy. The caller's UTXO list is never modified, and the record
//! is the same whether the strategies run one after the other or on two
//! threads.
//!
//! # Usage
//!
//! ```
//! use coinxpert_common::comparison::{ComparisonHarness, Outcome};
//! use coinxpert_common::utxo_selection::{SelectionParams, Utxo};
//! use bitcoin::Amount;
//!
//! let utxos = vec![
//!     Utxo::new("a", Amount::from_sat(120_000)),
//!     Utxo::new("b", Amount::from_sat(40_000)),
//! ];
//!
//! let record = ComparisonHarness::new()
//!     .compare(&utxos, Amount::from_sat(100_000), &SelectionParams::default())
//!     .unwrap();
//!
//! assert_eq!(record.outcome, Outcome::Both);
//! assert!(record.fee_btc_core.is_some());
//! ```

use std::thread;

use bitcoin::Amount;
use serde::Serialize;
use serde_json::json;

use crate::error::CoinXpertResult;
use crate::logging::{self, LogLevel};
use crate::math::{sats_as_i64, FeeRate};
use crate::types::as_sats;
use crate::utxo_selection::{
    BitcoinCoreStrategy, CoinXpertStrategy, InputSet, SelectionParams, SelectionResult, Strategy,
    Target, Utxo, UtxoSelector,
};

/// Which strategies produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Both,
    ReferenceOnly,
    AlternativeOnly,
    Neither,
}

/// Results of both strategies for one request
///
/// Fields suffixed `_core` describe the reference strategy and fields suffixed
/// `_coinxpert` the alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRecord {
    /// UTXOs as supplied by the caller
    pub inputs: Vec<Utxo>,
    pub target: Target,
    pub fee_rate: FeeRate,
    pub reference: SelectionResult,
    pub alternative: SelectionResult,
    #[serde(with = "as_sats::opt")]
    pub fee_btc_core: Option<Amount>,
    #[serde(with = "as_sats::opt")]
    pub fee_coinxpert: Option<Amount>,
    /// Fee paid beyond the bare payment transaction, `total_fee - fee_for(0, 1)`
    pub waste_core: Option<i64>,
    pub waste_coinxpert: Option<i64>,
    /// Alternative fee minus reference fee, when both succeeded
    pub fee_delta: Option<i64>,
    /// Alternative waste minus reference waste, when both succeeded
    pub waste_delta: Option<i64>,
    pub outcome: Outcome,
}

impl ComparisonRecord {
    fn new(
        inputs: Vec<Utxo>,
        target: Target,
        params: &SelectionParams,
        reference: SelectionResult,
        alternative: SelectionResult,
    ) -> Self {
        let overhead = sats_as_i64(params.fee_model.fee_for(0, 1));
        let waste = |result: &SelectionResult| result.fee().map(|fee| sats_as_i64(fee) - overhead);

        let outcome = match (reference.is_feasible(), alternative.is_feasible()) {
            (true, true) => Outcome::Both,
            (true, false) => Outcome::ReferenceOnly,
            (false, true) => Outcome::AlternativeOnly,
            (false, false) => Outcome::Neither,
        };

        let waste_core = waste(&reference);
        let waste_coinxpert = waste(&alternative);
        let fee_delta = match (reference.fee(), alternative.fee()) {
            (Some(core), Some(coinxpert)) => Some(sats_as_i64(coinxpert) - sats_as_i64(core)),
            _ => None,
        };
        let waste_delta = match (waste_core, waste_coinxpert) {
            (Some(core), Some(coinxpert)) => Some(coinxpert - core),
            _ => None,
        };

        Self {
            inputs,
            target,
            fee_rate: params.fee_model.fee_rate,
            fee_btc_core: reference.fee(),
            fee_coinxpert: alternative.fee(),
            waste_core,
            waste_coinxpert,
            fee_delta,
            waste_delta,
            reference,
            alternative,
            outcome,
        }
    }

    pub fn both_feasible(&self) -> bool {
        self.outcome == Outcome::Both
    }
}

/// Runs a reference and an alternative strategy over the same input set
pub struct ComparisonHarness {
    reference: Box<dyn Strategy>,
    alternative: Box<dyn Strategy>,
    parallel: bool,
}

impl Default for ComparisonHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonHarness {
    /// Bitcoin Core branch-and-bound against the CoinXpert greedy strategy, run sequentially
    pub fn new() -> Self {
        Self::with_strategies(
            Box::new(BitcoinCoreStrategy::new()),
            Box::new(CoinXpertStrategy::new()),
        )
    }

    pub fn with_strategies(reference: Box<dyn Strategy>, alternative: Box<dyn Strategy>) -> Self {
        Self {
            reference,
            alternative,
            parallel: false,
        }
    }

    /// Run the two strategies on separate threads
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn reference(&self) -> &dyn Strategy {
        self.reference.as_ref()
    }

    pub fn alternative(&self) -> &dyn Strategy {
        self.alternative.as_ref()
    }

    /// Compare both strategies for a payment of `target` from `utxos`
    ///
    /// Fails only on invalid input: a zero target or duplicate UTXO ids.
    /// Infeasibility is reported inside the record.
    pub fn compare(
        &self,
        utxos: &[Utxo],
        target: Amount,
        params: &SelectionParams,
    ) -> CoinXpertResult<ComparisonRecord> {
        let target = Target::new(target)?;
        let inputs = InputSet::new(utxos, params.fee_model)?;
        let selector = UtxoSelector::new(params);

        let (reference, alternative) = if self.parallel {
            self.run_parallel(&selector, &inputs, target)
        } else {
            (
                selector.select(self.reference.as_ref(), &inputs, target),
                selector.select(self.alternative.as_ref(), &inputs, target),
            )
        };

        let record = ComparisonRecord::new(utxos.to_vec(), target, params, reference, alternative);

        logging::log_comparison(
            LogLevel::Info,
            "comparison_completed",
            Some(json!({
                "utxos": utxos.len(),
                "target": target.amount().to_sat(),
                "fee_rate": record.fee_rate.to_string(),
                "outcome": record.outcome,
                "fee_core": record.fee_btc_core.map(|f| f.to_sat()),
                "fee_coinxpert": record.fee_coinxpert.map(|f| f.to_sat()),
            })),
        );

        Ok(record)
    }

    fn run_parallel(
        &self,
        selector: &UtxoSelector,
        inputs: &InputSet,
        target: Target,
    ) -> (SelectionResult, SelectionResult) {
        let alternative = self.alternative.as_ref();
        thread::scope(|scope| {
            let handle = scope.spawn(|| selector.select(alternative, inputs, target));
            let reference = selector.select(self.reference.as_ref(), inputs, target);
            let alternative = match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            (reference, alternative)
        })
    }
}
