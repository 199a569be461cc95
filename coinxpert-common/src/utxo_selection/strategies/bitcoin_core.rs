//! Branch-and-bound UTXO selection modelled on Bitcoin Core
//!
//! The search looks for an input set whose effective value lands in the
//! change-avoidance window
//!
//! ```text
//! [selection_target, selection_target + cost_of_change]
//! ```
//!
//! so that the transaction needs no change output. Among all such sets it keeps
//! the one with the lowest waste, then the fewest inputs.
//!
//! The search is a depth-first walk over candidates sorted by descending
//! effective value. Each candidate is first included, then excluded on
//! backtrack. The walk is driven by an explicit selection stack and bounded by
//! a node budget. When it finds nothing, a knapsack-style accumulation and a
//! single-input pass are tried and the cheaper of the two is used. If neither
//! reaches the search target, inputs are added largest first until they pay the
//! real fee of a one-output transaction.

use serde_json::json;
use thiserror::Error;

use crate::logging::{log_params, log_selection, LogLevel};
use crate::math::{sats_as_i64, FeeModel};
use crate::utxo_selection::input_set::InputSet;
use crate::utxo_selection::strategies::base;
use crate::utxo_selection::strategies::Strategy;
use crate::utxo_selection::types::{EffectiveUtxo, SelectionParams, Target, Utxo};

/// Why the exact search produced nothing. Handled by the fallback, never surfaced.
#[derive(Debug, Error, PartialEq, Eq)]
enum SearchError {
    #[error("no input set lands inside the change-avoidance window")]
    NoSolution,

    #[error("search budget of {tries} tries exhausted without a solution")]
    BudgetExceeded { tries: usize },
}

/// Reference strategy: branch-and-bound with knapsack and single-input fallbacks
#[derive(Debug, Default, Clone, Copy)]
pub struct BitcoinCoreStrategy;

impl BitcoinCoreStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for BitcoinCoreStrategy {
    fn name(&self) -> &'static str {
        "core"
    }

    fn select(
        &self,
        inputs: &InputSet,
        target: Target,
        params: &SelectionParams,
    ) -> Option<Vec<Utxo>> {
        let model = inputs.fee_model();
        let candidates = inputs.candidates();

        // Feasibility is judged on raw value against the real transaction fee;
        // summed effective values overcharge at fractional rates
        if !base::covers_payment(model, &candidates, target) {
            log_selection(
                LogLevel::Debug,
                "core_infeasible",
                Some(json!({
                    "candidates": candidates.len(),
                    "target": target.amount().to_sat(),
                })),
            );
            return None;
        }

        let need = base::selection_target(model, target);
        let cost_of_change = sats_as_i64(model.cost_of_change());

        let picks = match branch_and_bound(&candidates, need, cost_of_change, params.bnb_max_tries)
        {
            Ok(picks) => picks,
            Err(err) => {
                log_selection(
                    LogLevel::Debug,
                    "core_fallback",
                    Some(log_params(vec![("reason", err.to_string())])),
                );
                fallback(&candidates, need, cost_of_change)
                    .unwrap_or_else(|| accumulate(&candidates, model, target))
            }
        };

        Some(base::to_utxos(&picks))
    }
}

/// Largest effective values first until the inputs pay for the target and a
/// one-output transaction
///
/// Only reached when effective values fall short of the search target while
/// raw values still cover the payment, which happens when per-input fee
/// rounding adds up to more than the rounding of the whole transaction.
fn accumulate<'u>(
    candidates: &[&'u EffectiveUtxo],
    model: &FeeModel,
    target: Target,
) -> Vec<&'u EffectiveUtxo> {
    let mut picks = Vec::new();
    for candidate in candidates {
        picks.push(*candidate);
        if base::covers_payment(model, &picks, target) {
            break;
        }
    }
    picks
}

/// Best (waste, input count) leaf found so far
struct Best {
    waste: i64,
    count: usize,
    selection: Vec<bool>,
}

fn branch_and_bound<'u>(
    candidates: &[&'u EffectiveUtxo],
    selection_target: i64,
    cost_of_change: i64,
    max_tries: usize,
) -> Result<Vec<&'u EffectiveUtxo>, SearchError> {
    let upper_bound = selection_target.saturating_add(cost_of_change);

    let mut curr_value: i64 = 0;
    let mut curr_fees: i64 = 0;
    let mut curr_available_value: i64 = base::effective_total(candidates);

    // current_selection[i] tells whether candidates[i] is in the current branch
    let mut current_selection: Vec<bool> = Vec::with_capacity(candidates.len());
    let mut best: Option<Best> = None;
    let mut exhausted = false;

    for _ in 0..max_tries {
        let mut backtrack = false;

        // Any extension adds inputs of positive effective value, so this is a lower bound
        let waste_floor = curr_fees + (curr_value - selection_target).max(0);

        if curr_value + curr_available_value < selection_target
            || curr_value > upper_bound
            || best.as_ref().map_or(false, |b| waste_floor > b.waste)
        {
            backtrack = true;
        } else if curr_value >= selection_target {
            let waste = curr_fees + (curr_value - selection_target);
            let count = current_selection.iter().filter(|s| **s).count();
            let improves = best
                .as_ref()
                .map_or(true, |b| (waste, count) < (b.waste, b.count));
            if improves {
                best = Some(Best {
                    waste,
                    count,
                    selection: current_selection.clone(),
                });
            }
            backtrack = true;
        }

        // Reached a leaf without a solution
        if current_selection.len() == candidates.len() {
            backtrack = true;
        }

        if backtrack {
            // Walk back past the omitted branches
            while let Some(false) = current_selection.last() {
                current_selection.pop();
                curr_available_value += candidates[current_selection.len()].effective_value;
            }

            match current_selection.last_mut() {
                Some(last) => *last = false,
                None => {
                    exhausted = true;
                    break;
                }
            }

            let deselected = candidates[current_selection.len() - 1];
            curr_value -= deselected.effective_value;
            curr_fees -= sats_as_i64(deselected.input_fee);
        } else {
            let index = current_selection.len();
            let candidate = candidates[index];
            curr_available_value -= candidate.effective_value;

            // Including an input equal to one we just excluded explores the same sums again
            let repeats_excluded = index > 0
                && !current_selection[index - 1]
                && candidates[index - 1].effective_value == candidate.effective_value
                && candidates[index - 1].input_fee == candidate.input_fee;

            if repeats_excluded {
                current_selection.push(false);
            } else {
                current_selection.push(true);
                curr_value += candidate.effective_value;
                curr_fees += sats_as_i64(candidate.input_fee);
            }
        }
    }

    match best {
        Some(best) => {
            if !exhausted {
                log_selection(
                    LogLevel::Debug,
                    "core_budget_exhausted",
                    Some(json!({ "tries": max_tries, "kept_best": true })),
                );
            }
            Ok(candidates
                .iter()
                .zip(best.selection.iter())
                .filter(|(_, selected)| **selected)
                .map(|(candidate, _)| *candidate)
                .collect())
        }
        None if exhausted => Err(SearchError::NoSolution),
        None => Err(SearchError::BudgetExceeded { tries: max_tries }),
    }
}

/// Knapsack accumulation or single input, whichever wastes less
fn fallback<'u>(
    candidates: &[&'u EffectiveUtxo],
    need: i64,
    cost_of_change: i64,
) -> Option<Vec<&'u EffectiveUtxo>> {
    let knapsack = knapsack(candidates, need, cost_of_change);
    let single = single_input(candidates, need);

    match (knapsack, single) {
        (Some(knapsack), Some(single)) => Some(base::prefer(single, knapsack, need)),
        (knapsack, single) => knapsack.or(single),
    }
}

/// Accumulate the smallest inputs that do not overshoot the window, then close
/// any remaining gap with the smallest skipped input that does
fn knapsack<'u>(
    candidates: &[&'u EffectiveUtxo],
    need: i64,
    cost_of_change: i64,
) -> Option<Vec<&'u EffectiveUtxo>> {
    let upper_bound = need.saturating_add(cost_of_change);

    let mut ascending = candidates.to_vec();
    ascending.sort_by(|a, b| {
        a.effective_value
            .cmp(&b.effective_value)
            .then_with(|| a.id().cmp(b.id()))
    });

    let mut chosen = Vec::new();
    let mut skipped = Vec::new();
    let mut total: i64 = 0;

    for candidate in ascending {
        if total >= need {
            break;
        }
        if total + candidate.effective_value > upper_bound {
            skipped.push(candidate);
        } else {
            total += candidate.effective_value;
            chosen.push(candidate);
        }
    }

    while total < need {
        let gap = need - total;
        // skipped is ascending; take the smallest that closes the gap, else the largest
        let position = skipped
            .iter()
            .position(|c| c.effective_value >= gap)
            .or_else(|| skipped.len().checked_sub(1))?;
        let candidate = skipped.remove(position);
        total += candidate.effective_value;
        chosen.push(candidate);
    }

    Some(chosen)
}

/// Smallest single input that covers the target on its own
fn single_input<'u>(candidates: &[&'u EffectiveUtxo], need: i64) -> Option<Vec<&'u EffectiveUtxo>> {
    candidates
        .iter()
        .filter(|c| c.effective_value >= need)
        .min_by(|a, b| {
            a.effective_value
                .cmp(&b.effective_value)
                .then_with(|| a.id().cmp(b.id()))
        })
        .map(|c| vec![*c])
}
