//! Base utilities for UTXO selection strategies

use crate::math::{sats_as_i64, FeeModel};
use crate::utxo_selection::types::{EffectiveUtxo, Target, Utxo};

/// Effective value a selection must reach: the payment plus the fee of a
/// transaction with no inputs and a single output
pub fn selection_target(model: &FeeModel, target: Target) -> i64 {
    sats_as_i64(target.amount()).saturating_add(sats_as_i64(model.fee_for(0, 1)))
}

/// Sum of effective values
pub fn effective_total(picks: &[&EffectiveUtxo]) -> i64 {
    picks.iter().map(|u| u.effective_value).sum()
}

/// Sum of input fees
pub fn input_fees(picks: &[&EffectiveUtxo]) -> i64 {
    picks.iter().map(|u| sats_as_i64(u.input_fee)).sum()
}

/// Fees paid for the inputs plus the excess over `selection_target`
pub fn waste(picks: &[&EffectiveUtxo], selection_target: i64) -> i64 {
    input_fees(picks) + (effective_total(picks) - selection_target)
}

/// Whether `picks` pay for `target` and a one-output transaction
pub fn covers_payment(model: &FeeModel, picks: &[&EffectiveUtxo], target: Target) -> bool {
    if picks.is_empty() {
        return false;
    }
    let total: u64 = picks.iter().map(|u| u.value().to_sat()).sum();
    let needed = target
        .amount()
        .to_sat()
        .saturating_add(model.fee_for(picks.len(), 1).to_sat());
    total >= needed
}

pub fn to_utxos(picks: &[&EffectiveUtxo]) -> Vec<Utxo> {
    picks.iter().map(|u| u.utxo.clone()).collect()
}

/// Lower waste wins, then fewer inputs; `a` is kept on a full tie
pub fn prefer<'u>(
    a: Vec<&'u EffectiveUtxo>,
    b: Vec<&'u EffectiveUtxo>,
    selection_target: i64,
) -> Vec<&'u EffectiveUtxo> {
    let key_a = (waste(&a, selection_target), a.len());
    let key_b = (waste(&b, selection_target), b.len());
    if key_b < key_a {
        b
    } else {
        a
    }
}
