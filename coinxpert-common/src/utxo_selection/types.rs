//! Core types for UTXO selection
//!
//! # Key Types
//!
//! - [`Utxo`]: a spendable output, identified by an opaque id
//! - [`EffectiveUtxo`]: a UTXO annotated with its input fee and effective value
//! - [`Target`]: the payment amount, always positive
//! - [`Selection`]: the inputs chosen for a payment plus the fee and optional change
//! - [`SelectionResult`]: a strategy's outcome; an absent selection means infeasible
//! - [`SelectionParams`]: the per-call configuration handed to strategies
//!
//! # Example
//!
//! ```
//! use coinxpert_common::utxo_selection::types::{Target, Utxo};
//! use bitcoin::Amount;
//!
//! let utxo = Utxo::new("a:0", Amount::from_sat(10_000));
//! assert_eq!(utxo.id.as_str(), "a:0");
//!
//! assert!(Target::new(Amount::ZERO).is_err());
//! assert_eq!(Target::new(Amount::from_sat(5_000)).unwrap().amount(), Amount::from_sat(5_000));
//! ```

use crate::error::{CoinXpertError, CoinXpertResult};
use crate::math::FeeModel;
use crate::types::{as_sats, DUST_THRESHOLD};
use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Default node-visit budget for the branch-and-bound search
pub const DEFAULT_BNB_MAX_TRIES: usize = 100_000;

/// Opaque UTXO identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtxoId(String);

impl UtxoId {
    pub fn new(id: impl Into<String>) -> Self {
        UtxoId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UtxoId {
    fn from(id: &str) -> Self {
        UtxoId::new(id)
    }
}

impl From<String> for UtxoId {
    fn from(id: String) -> Self {
        UtxoId(id)
    }
}

/// Unspent transaction output as seen by the selection engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utxo {
    /// Identifier, unique within one input set
    pub id: UtxoId,

    /// Value of the output
    #[serde(with = "as_sats")]
    pub value: Amount,
}

impl Utxo {
    pub fn new(id: impl Into<UtxoId>, value: Amount) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// A UTXO annotated with its marginal input fee at the active fee rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveUtxo {
    pub utxo: Utxo,
    pub input_fee: Amount,
    pub effective_value: i64,
}

impl EffectiveUtxo {
    pub fn new(utxo: Utxo, model: &FeeModel) -> Self {
        Self {
            input_fee: model.input_fee(),
            effective_value: model.effective_value(utxo.value),
            utxo,
        }
    }

    pub fn id(&self) -> &UtxoId {
        &self.utxo.id
    }

    pub fn value(&self) -> Amount {
        self.utxo.value
    }
}

/// Payment amount for one run; always strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Target(#[serde(with = "as_sats")] Amount);

impl Target {
    pub fn new(amount: Amount) -> CoinXpertResult<Self> {
        if amount == Amount::ZERO {
            return Err(CoinXpertError::invalid_input(
                "target amount must be greater than zero",
            ));
        }
        Ok(Target(amount))
    }

    pub fn amount(&self) -> Amount {
        self.0
    }
}

/// Change returned to the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOutput {
    #[serde(with = "as_sats")]
    pub value: Amount,
}

/// Inputs chosen for a payment together with the resulting fee and change
///
/// `total_input_value - total_fee - target` is zero without change, and exactly
/// the change value with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Selected inputs in canonical order: value descending, then id ascending
    pub inputs: Vec<Utxo>,
    #[serde(with = "as_sats")]
    pub total_input_value: Amount,
    #[serde(with = "as_sats")]
    pub total_fee: Amount,
    pub change: Option<ChangeOutput>,
}

impl Selection {
    /// Build a selection, putting the inputs into canonical order
    pub fn new(
        mut inputs: Vec<Utxo>,
        total_fee: Amount,
        change: Option<ChangeOutput>,
    ) -> Self {
        inputs.sort_by(canonical_value_order);
        let total_input_value = inputs.iter().map(|u| u.value).sum();
        Self {
            inputs,
            total_input_value,
            total_fee,
            change,
        }
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        if self.change.is_some() {
            2
        } else {
            1
        }
    }

    pub fn change_value(&self) -> Amount {
        self.change.map(|c| c.value).unwrap_or(Amount::ZERO)
    }

    pub fn contains(&self, id: &UtxoId) -> bool {
        self.inputs.iter().any(|u| &u.id == id)
    }
}

/// Order by value descending, then id ascending
pub fn canonical_value_order(a: &Utxo, b: &Utxo) -> Ordering {
    b.value.cmp(&a.value).then_with(|| a.id.cmp(&b.id))
}

/// Outcome of running one strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionResult {
    pub strategy_name: String,
    pub selection: Option<Selection>,
}

impl SelectionResult {
    pub fn success(strategy_name: impl Into<String>, selection: Selection) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            selection: Some(selection),
        }
    }

    pub fn infeasible(strategy_name: impl Into<String>) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            selection: None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.selection.is_some()
    }

    pub fn fee(&self) -> Option<Amount> {
        self.selection.as_ref().map(|s| s.total_fee)
    }
}

/// Per-call selection configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionParams {
    pub fee_model: FeeModel,
    pub dust_threshold: u64,
    pub bnb_max_tries: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            fee_model: FeeModel::default(),
            dust_threshold: DUST_THRESHOLD,
            bnb_max_tries: DEFAULT_BNB_MAX_TRIES,
        }
    }
}

impl SelectionParams {
    pub fn new(fee_model: FeeModel) -> Self {
        Self {
            fee_model,
            ..Self::default()
        }
    }

    pub fn with_dust_threshold(mut self, dust_threshold: u64) -> Self {
        self.dust_threshold = dust_threshold;
        self
    }

    pub fn with_bnb_max_tries(mut self, bnb_max_tries: usize) -> Self {
        self.bnb_max_tries = bnb_max_tries;
        self
    }
}
