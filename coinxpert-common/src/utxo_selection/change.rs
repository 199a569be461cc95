//! Change output policy
//!
//! Given the inputs a strategy picked, decide whether the surplus becomes a
//! change output or is left to the miner. The same policy is applied to every
//! strategy so that results are comparable.
//!
//! With `n` inputs, the no-change fee is `fee_for(n, 1)` and the with-change fee
//! is `fee_for(n, 2)`. Change is emitted only when both hold:
//!
//! - the change value `inputs - target - fee_for(n, 2)` is above the dust threshold
//! - the no-change surplus `inputs - target - fee_for(n, 1)` is above the cost of
//!   the extra output, `fee_for(n, 2) - fee_for(n, 1)`
//!
//! Otherwise the whole surplus is folded into the fee, so that
//! `inputs - fee - target` is zero.

use bitcoin::Amount;

use crate::math::{is_dust_amount, FeeModel};
use crate::utxo_selection::types::{ChangeOutput, Selection, Target, Utxo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangePolicy {
    fee_model: FeeModel,
    dust_threshold: u64,
}

impl ChangePolicy {
    pub fn new(fee_model: FeeModel, dust_threshold: u64) -> Self {
        Self {
            fee_model,
            dust_threshold,
        }
    }

    /// Turn raw picks into a [`Selection`]
    ///
    /// Returns `None` if the inputs do not even cover the target and the no-change fee.
    pub fn apply(&self, inputs: Vec<Utxo>, target: Target) -> Option<Selection> {
        if inputs.is_empty() {
            return None;
        }

        let count = inputs.len();
        let total_in: Amount = inputs.iter().map(|u| u.value).sum();
        let fee_without_change = self.fee_model.fee_for(count, 1);
        let fee_with_change = self.fee_model.fee_for(count, 2);

        let surplus = total_in.checked_sub(target.amount().checked_add(fee_without_change)?)?;
        let change = self.change_value(total_in, target, fee_without_change, fee_with_change, surplus);

        let selection = match change {
            Some(value) => Selection::new(inputs, fee_with_change, Some(ChangeOutput { value })),
            None => Selection::new(inputs, total_in - target.amount(), None),
        };
        Some(selection)
    }

    fn change_value(
        &self,
        total_in: Amount,
        target: Target,
        fee_without_change: Amount,
        fee_with_change: Amount,
        surplus: Amount,
    ) -> Option<Amount> {
        let change = total_in.checked_sub(target.amount().checked_add(fee_with_change)?)?;
        let cost_of_change_output = fee_with_change.checked_sub(fee_without_change)?;

        if is_dust_amount(change.to_sat(), self.dust_threshold) || surplus <= cost_of_change_output {
            return None;
        }
        Some(change)
    }
}
