//! Payment sequence simulation
//!
//! Replays a series of payments against a wallet snapshot to see how a strategy
//! behaves over time rather than for a single request. Every payment spends
//! the selected inputs and returns any change to the wallet as a new UTXO, so
//! early choices shape the pool later payments draw from.
//!
//! Each strategy is replayed against its own copy of the starting wallet.

use std::collections::HashSet;

use bitcoin::Amount;
use serde::Serialize;
use serde_json::json;

use crate::comparison::ComparisonHarness;
use crate::error::{CoinXpertError, CoinXpertResult};
use crate::logging::{self, LogLevel};
use crate::types::as_sats;
use crate::utxo_selection::{
    InputSet, SelectionParams, SelectionResult, Strategy, Target, Utxo, UtxoId, UtxoSelector,
};

/// A UTXO snapshot that payments can be made from and into
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedWallet {
    utxos: Vec<Utxo>,
    next_output: u64,
}

impl SimulatedWallet {
    pub fn new(utxos: Vec<Utxo>) -> CoinXpertResult<Self> {
        let mut wallet = Self::default();
        for utxo in utxos {
            wallet.add(utxo)?;
        }
        Ok(wallet)
    }

    /// Add a UTXO; ids must stay unique
    pub fn add(&mut self, utxo: Utxo) -> CoinXpertResult<()> {
        if self.utxos.iter().any(|u| u.id == utxo.id) {
            return Err(CoinXpertError::DuplicateUtxo(utxo.id.to_string()));
        }
        self.utxos.push(utxo);
        Ok(())
    }

    /// Remove the given UTXOs, returning how many were present
    pub fn remove(&mut self, ids: &[UtxoId]) -> usize {
        let ids: HashSet<&UtxoId> = ids.iter().collect();
        let before = self.utxos.len();
        self.utxos.retain(|u| !ids.contains(&u.id));
        before - self.utxos.len()
    }

    pub fn balance(&self) -> Amount {
        self.utxos.iter().map(|u| u.value).sum()
    }

    pub fn utxos(&self) -> &[Utxo] {
        &self.utxos
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Receive a new output with an id of the form `<prefix>-<n>` not yet in the wallet
    fn receive(&mut self, prefix: &str, value: Amount) -> UtxoId {
        loop {
            let id = UtxoId::new(format!("{}-{}", prefix, self.next_output));
            self.next_output += 1;
            if !self.utxos.iter().any(|u| u.id == id) {
                self.utxos.push(Utxo::new(id.clone(), value));
                return id;
            }
        }
    }
}

/// Pay `amount` from `sender` to `receiver` using `strategy`
///
/// On success the selected inputs leave the sender, the payment lands in the
/// receiver as `payment-<n>` and any change returns to the sender as
/// `change-<n>`. An infeasible payment leaves both wallets untouched.
pub fn simulate_transaction(
    sender: &mut SimulatedWallet,
    receiver: &mut SimulatedWallet,
    amount: Amount,
    strategy: &dyn Strategy,
    params: &SelectionParams,
) -> CoinXpertResult<SelectionResult> {
    let target = Target::new(amount)?;
    let inputs = InputSet::new(sender.utxos(), params.fee_model)?;
    let result = UtxoSelector::new(params).select(strategy, &inputs, target);

    if let Some(selection) = &result.selection {
        let spent: Vec<UtxoId> = selection.inputs.iter().map(|u| u.id.clone()).collect();
        sender.remove(&spent);
        receiver.receive("payment", amount);
        if let Some(change) = selection.change {
            sender.receive("change", change.value);
        }
    }

    Ok(result)
}

/// How one strategy fared over a payment sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyReport {
    pub strategy_name: String,
    pub payments_completed: usize,
    pub payments_failed: usize,
    #[serde(with = "as_sats")]
    pub total_fees: Amount,
    pub change_outputs_created: usize,
    #[serde(with = "as_sats")]
    pub final_balance: Amount,
    pub final_utxo_count: usize,
}

/// Reports for the reference and alternative strategies over the same payments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub payments: usize,
    pub reference: StrategyReport,
    pub alternative: StrategyReport,
}

/// Replay `payments` from a copy of `wallet` with one strategy
///
/// A payment the wallet cannot fund is counted as failed and skipped; later
/// payments are still attempted.
pub fn simulate_payments(
    wallet: &SimulatedWallet,
    payments: &[Amount],
    strategy: &dyn Strategy,
    params: &SelectionParams,
) -> CoinXpertResult<StrategyReport> {
    let mut sender = wallet.clone();
    let mut receiver = SimulatedWallet::default();

    let mut report = StrategyReport {
        strategy_name: strategy.name().to_string(),
        payments_completed: 0,
        payments_failed: 0,
        total_fees: Amount::ZERO,
        change_outputs_created: 0,
        final_balance: Amount::ZERO,
        final_utxo_count: 0,
    };

    for amount in payments {
        let result = simulate_transaction(&mut sender, &mut receiver, *amount, strategy, params)?;
        match result.selection {
            Some(selection) => {
                report.payments_completed += 1;
                report.total_fees += selection.total_fee;
                if selection.change.is_some() {
                    report.change_outputs_created += 1;
                }
            }
            None => report.payments_failed += 1,
        }
    }

    report.final_balance = sender.balance();
    report.final_utxo_count = sender.len();
    Ok(report)
}

/// Replay `payments` with both of the harness's strategies
pub fn compare_payment_sequences(
    wallet: &SimulatedWallet,
    payments: &[Amount],
    harness: &ComparisonHarness,
    params: &SelectionParams,
) -> CoinXpertResult<SimulationReport> {
    let reference = simulate_payments(wallet, payments, harness.reference(), params)?;
    let alternative = simulate_payments(wallet, payments, harness.alternative(), params)?;

    logging::log_simulation(
        LogLevel::Info,
        "simulation_completed",
        Some(json!({
            "payments": payments.len(),
            "reference_fees": reference.total_fees.to_sat(),
            "alternative_fees": alternative.total_fees.to_sat(),
            "reference_failed": reference.payments_failed,
            "alternative_failed": alternative.payments_failed,
        })),
    );

    Ok(SimulationReport {
        payments: payments.len(),
        reference,
        alternative,
    })
}
