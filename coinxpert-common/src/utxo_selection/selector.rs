//! Main UTXO selector implementation
//!
//! The `UtxoSelector` is the context of the Strategy pattern: it runs a
//! [`Strategy`] over an [`InputSet`], passes the picks through the
//! [`ChangePolicy`] and wraps the outcome in a [`SelectionResult`].
//!
//! # Usage
//!
//! ```
//! use coinxpert_common::utxo_selection::input_set::InputSet;
//! use coinxpert_common::utxo_selection::selector::UtxoSelector;
//! use coinxpert_common::utxo_selection::strategies::BitcoinCoreStrategy;
//! use coinxpert_common::utxo_selection::types::{SelectionParams, Target, Utxo};
//! use bitcoin::Amount;
//!
//! let params = SelectionParams::default();
//! let utxos = vec![Utxo::new("a", Amount::from_sat(200_000))];
//! let inputs = InputSet::new(&utxos, params.fee_model).unwrap();
//!
//! let selector = UtxoSelector::new(&params);
//! let result = selector.select(
//!     &BitcoinCoreStrategy::new(),
//!     &inputs,
//!     Target::new(Amount::from_sat(50_000)).unwrap(),
//! );
//!
//! assert_eq!(result.strategy_name, "core");
//! assert!(result.is_feasible());
//! ```

use serde_json::json;

use crate::logging::{log_selection, LogLevel};

use crate::utxo_selection::change::ChangePolicy;
use crate::utxo_selection::input_set::InputSet;
use crate::utxo_selection::strategies::Strategy;
use crate::utxo_selection::types::{SelectionParams, SelectionResult, Target};

/// Runs strategies and applies the shared change policy to their picks
pub struct UtxoSelector {
    params: SelectionParams,
    change_policy: ChangePolicy,
}

impl UtxoSelector {
    pub fn new(params: &SelectionParams) -> Self {
        Self {
            params: *params,
            change_policy: ChangePolicy::new(params.fee_model, params.dust_threshold),
        }
    }

    pub fn params(&self) -> &SelectionParams {
        &self.params
    }

    /// Run `strategy` and settle fee and change for its picks
    pub fn select(
        &self,
        strategy: &dyn Strategy,
        inputs: &InputSet,
        target: Target,
    ) -> SelectionResult {
        let name = strategy.name();

        let picks = match strategy.select(inputs, target, &self.params) {
            Some(picks) => picks,
            None => {
                log_selection(
                    LogLevel::Debug,
                    "selection_infeasible",
                    Some(json!({
                        "strategy": name,
                        "target": target.amount().to_sat(),
                        "inputs": inputs.len(),
                    })),
                );
                return SelectionResult::infeasible(name);
            }
        };

        match self.change_policy.apply(picks, target) {
            Some(selection) => {
                log_selection(
                    LogLevel::Debug,
                    "selection_completed",
                    Some(json!({
                        "strategy": name,
                        "inputs": selection.input_count(),
                        "fee": selection.total_fee.to_sat(),
                        "change": selection.change_value().to_sat(),
                    })),
                );
                SelectionResult::success(name, selection)
            }
            None => {
                log_selection(
                    LogLevel::Warn,
                    "picks_do_not_cover_fee",
                    Some(json!({ "strategy": name })),
                );
                SelectionResult::infeasible(name)
            }
        }
    }
}
