//! Wire messages for the selection endpoint
//!
//! Amounts on the wire are whole-coin floats; fees are integer satoshis.
//!
//! Request:
//! ```json
//! { "utxos": [{ "value": 0.5 }, { "value": 0.2 }], "target": 0.3 }
//! ```
//!
//! Response:
//! ```json
//! {
//!   "selected_utxos_core": [{ "value": 0.5 }],
//!   "change_utxo_core": { "value": 0.1999552 },
//!   "selected_utxos_coinxpert": [{ "value": 0.5 }],
//!   "change_utxo_coinxpert": { "value": 0.1999552 },
//!   "fee_btc_core": 4480,
//!   "fee_coinxpert": 4480
//! }
//! ```

use serde::{Deserialize, Serialize};

use coinxpert_common::error::{CoinXpertError, CoinXpertResult, ErrorContext};
use coinxpert_common::math::{btc_to_sats, sats_to_btc};
use coinxpert_common::utxo_selection::{SelectionResult, Utxo, UtxoId};
use coinxpert_common::Amount;

/// Request succeeded
pub const STATUS_OK: u16 = 200;

/// At least one strategy could not fund the payment
pub const STATUS_BAD_REQUEST: u16 = 400;

/// The request was malformed or carried invalid amounts
pub const STATUS_UNPROCESSABLE: u16 = 422;

/// Anything else
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Detail message for infeasible requests
pub const INSUFFICIENT_BALANCE: &str = "Insufficient balance to meet target amount";

/// A UTXO or output as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueModel {
    /// Value in BTC
    pub value: f64,
}

impl ValueModel {
    pub fn from_amount(amount: Amount) -> Self {
        Self {
            value: sats_to_btc(amount.to_sat()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub utxos: Vec<ValueModel>,
    /// Payment amount in BTC
    pub target: f64,
}

impl SelectionRequest {
    /// Engine UTXOs for this request, identified as `utxo-<index>`
    pub fn to_utxos(&self) -> CoinXpertResult<Vec<Utxo>> {
        self.utxos
            .iter()
            .enumerate()
            .map(|(index, utxo)| {
                let sats = btc_to_sats(utxo.value).context(format!("utxo {}", index))?;
                Ok(Utxo::new(
                    UtxoId::new(format!("utxo-{}", index)),
                    Amount::from_sat(sats),
                ))
            })
            .collect()
    }

    pub fn target_amount(&self) -> CoinXpertResult<Amount> {
        let sats = btc_to_sats(self.target).context("target")?;
        Ok(Amount::from_sat(sats))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub selected_utxos_core: Vec<ValueModel>,
    pub change_utxo_core: Option<ValueModel>,
    pub selected_utxos_coinxpert: Vec<ValueModel>,
    pub change_utxo_coinxpert: Option<ValueModel>,
    /// Fee of the reference selection in satoshis
    pub fee_btc_core: Option<u64>,
    /// Fee of the alternative selection in satoshis
    pub fee_coinxpert: Option<u64>,
}

impl SelectionResponse {
    pub fn from_results(core: &SelectionResult, coinxpert: &SelectionResult) -> Self {
        let (selected_utxos_core, change_utxo_core, fee_btc_core) = wire_parts(core);
        let (selected_utxos_coinxpert, change_utxo_coinxpert, fee_coinxpert) =
            wire_parts(coinxpert);

        Self {
            selected_utxos_core,
            change_utxo_core,
            selected_utxos_coinxpert,
            change_utxo_coinxpert,
            fee_btc_core,
            fee_coinxpert,
        }
    }
}

fn wire_parts(result: &SelectionResult) -> (Vec<ValueModel>, Option<ValueModel>, Option<u64>) {
    match &result.selection {
        Some(selection) => (
            selection
                .inputs
                .iter()
                .map(|u| ValueModel::from_amount(u.value))
                .collect(),
            selection.change.map(|c| ValueModel::from_amount(c.value)),
            Some(selection.total_fee.to_sat()),
        ),
        None => (Vec::new(), None, None),
    }
}

/// Error body returned with a non-200 status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub detail: String,
    /// Results of the strategies that did succeed, for infeasible requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<SelectionResponse>,
}

impl ErrorResponse {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            partial: None,
        }
    }

    pub fn with_partial(mut self, partial: SelectionResponse) -> Self {
        self.partial = Some(partial);
        self
    }
}

impl From<CoinXpertError> for ErrorResponse {
    fn from(err: CoinXpertError) -> Self {
        let status = if err.is_input_error() {
            STATUS_UNPROCESSABLE
        } else {
            STATUS_INTERNAL_ERROR
        };
        ErrorResponse::new(status, err.to_string())
    }
}
