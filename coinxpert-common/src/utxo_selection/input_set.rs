//! Candidate pool for one selection run
//!
//! An [`InputSet`] is built once per run from a UTXO snapshot and a fee model.
//! It owns the annotated inputs and is shared read-only by every strategy, so
//! all strategies see the same effective values.

use std::collections::HashSet;

use bitcoin::Amount;

use crate::error::{CoinXpertError, CoinXpertResult};
use crate::math::FeeModel;
use crate::utxo_selection::types::{EffectiveUtxo, Utxo};

#[derive(Debug, Clone)]
pub struct InputSet {
    fee_model: FeeModel,
    utxos: Vec<EffectiveUtxo>,
}

impl InputSet {
    /// Annotate `utxos` with their effective values under `fee_model`
    ///
    /// Fails with [`CoinXpertError::DuplicateUtxo`] if two UTXOs share an id.
    pub fn new(utxos: &[Utxo], fee_model: FeeModel) -> CoinXpertResult<Self> {
        let mut seen = HashSet::with_capacity(utxos.len());
        for utxo in utxos {
            if !seen.insert(&utxo.id) {
                return Err(CoinXpertError::DuplicateUtxo(utxo.id.to_string()));
            }
        }

        let utxos = utxos
            .iter()
            .cloned()
            .map(|utxo| EffectiveUtxo::new(utxo, &fee_model))
            .collect();

        Ok(Self { fee_model, utxos })
    }

    pub fn fee_model(&self) -> &FeeModel {
        &self.fee_model
    }

    /// Every UTXO in the set, in the order it was supplied
    pub fn all(&self) -> &[EffectiveUtxo] {
        &self.utxos
    }

    /// Inputs worth spending: positive effective value, sorted by effective value
    /// descending and then by id
    pub fn candidates(&self) -> Vec<&EffectiveUtxo> {
        let mut candidates: Vec<&EffectiveUtxo> = self
            .utxos
            .iter()
            .filter(|u| u.effective_value > 0)
            .collect();
        candidates.sort_by(|a, b| {
            b.effective_value
                .cmp(&a.effective_value)
                .then_with(|| a.id().cmp(b.id()))
        });
        candidates
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn total_value(&self) -> Amount {
        self.utxos.iter().map(|u| u.value()).sum()
    }

    /// Sum of the positive effective values, i.e. the most any selection can contribute
    pub fn total_effective_value(&self) -> i64 {
        self.utxos
            .iter()
            .map(|u| u.effective_value)
            .filter(|v| *v > 0)
            .sum()
    }
}
