//! CoinXpert UTXO selection strategy
//!
//! A largest-first greedy baseline. Inputs are taken in descending order of raw
//! value until they pay for the target and a two-output transaction (payment
//! plus change). The fee is recomputed after each addition.

use crate::logging::{log_params, log_selection, LogLevel};
use crate::utxo_selection::input_set::InputSet;
use crate::utxo_selection::strategies::base;
use crate::utxo_selection::strategies::Strategy;
use crate::utxo_selection::types::{SelectionParams, Target, Utxo};

/// Alternative strategy: largest value first until payment and change are funded
#[derive(Debug, Default, Clone, Copy)]
pub struct CoinXpertStrategy;

impl CoinXpertStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for CoinXpertStrategy {
    fn name(&self) -> &'static str {
        "coinxpert"
    }

    fn select(
        &self,
        inputs: &InputSet,
        target: Target,
        _params: &SelectionParams,
    ) -> Option<Vec<Utxo>> {
        let model = inputs.fee_model();

        let mut candidates = inputs.candidates();
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by(|a, b| b.value().cmp(&a.value()).then_with(|| a.id().cmp(b.id())));

        let mut selected = Vec::new();
        let mut total = 0u64;

        for candidate in candidates {
            selected.push(candidate);
            total += candidate.value().to_sat();

            let needed = target
                .amount()
                .to_sat()
                .saturating_add(model.fee_for(selected.len(), 2).to_sat());
            if total >= needed {
                return Some(base::to_utxos(&selected));
            }
        }

        // Change cannot be funded; settle for paying the target alone
        if base::covers_payment(model, &selected, target) {
            log_selection(
                LogLevel::Debug,
                "coinxpert_no_change",
                Some(log_params(vec![("inputs", selected.len().to_string())])),
            );
            return Some(base::to_utxos(&selected));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{FeeModel, FeeRate};
    use bitcoin::Amount;

    fn set(values: &[u64], rate: u64) -> InputSet {
        let utxos: Vec<Utxo> = values
            .iter()
            .enumerate()
            .map(|(i, v)| Utxo::new(format!("u{}", i), Amount::from_sat(*v)))
            .collect();
        InputSet::new(&utxos, FeeModel::new(FeeRate::from_sat_per_vb(rate), 10, 148, 34)).unwrap()
    }

    fn select(set: &InputSet, target: u64) -> Option<Vec<u64>> {
        let params = SelectionParams::new(*set.fee_model());
        CoinXpertStrategy::new()
            .select(set, Target::new(Amount::from_sat(target)).unwrap(), &params)
            .map(|picks| picks.iter().map(|u| u.value.to_sat()).collect())
    }

    #[test]
    fn takes_largest_first() {
        let set = set(&[20_000, 70_000, 50_000], 1);
        // 70_000 < 80_000 + fee, 70_000 + 50_000 covers it
        assert_eq!(select(&set, 80_000), Some(vec![70_000, 50_000]));
    }

    #[test]
    fn empty_pool_is_infeasible() {
        assert_eq!(select(&set(&[], 1), 1_000), None);
    }

    #[test]
    fn accepts_payment_without_change_when_change_is_unaffordable() {
        // fee_for(1, 1) = 192, fee_for(1, 2) = 226 at 1 sat/vB
        let set = set(&[10_200], 1);
        assert_eq!(select(&set, 10_000), Some(vec![10_200]));
    }

    #[test]
    fn insufficient_funds_is_infeasible() {
        let set = set(&[1, 1], 0);
        assert_eq!(select(&set, 10), None);
    }
}
