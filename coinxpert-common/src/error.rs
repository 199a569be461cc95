//! Errors raised by the selection engine
//!
//! Infeasible selections are not errors: a strategy that cannot fund a payment
//! reports an absent selection instead. Errors are reserved for input that must
//! be rejected before any search runs.
//!
//! ```
//! use coinxpert_common::error::{CoinXpertResult, ErrorContext};
//! use coinxpert_common::math::btc_to_sats;
//!
//! fn utxo_value(index: usize, btc: f64) -> CoinXpertResult<u64> {
//!     btc_to_sats(btc).context(format!("utxo {}", index))
//! }
//!
//! let err = utxo_value(3, -1.0).unwrap_err();
//! assert!(err.to_string().starts_with("Invalid input: utxo 3: "));
//! ```

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoinXpertError {
    /// Non-positive target, negative or non-finite amount, unusable fee rate
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two UTXOs in one input set share an identifier
    #[error("Duplicate UTXO identifier: {0}")]
    DuplicateUtxo(String),
}

impl CoinXpertError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoinXpertError::InvalidInput(message.into())
    }

    /// Whether the caller can fix this by changing the request
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoinXpertError::InvalidInput(_) | CoinXpertError::DuplicateUtxo(_)
        )
    }
}

/// Prefix an error with the item it concerns
pub trait ErrorContext<T> {
    fn context(self, context: impl Into<String>) -> CoinXpertResult<T>;
}

impl<T> ErrorContext<T> for CoinXpertResult<T> {
    fn context(self, context: impl Into<String>) -> CoinXpertResult<T> {
        self.map_err(|err| match err {
            CoinXpertError::InvalidInput(detail) => {
                CoinXpertError::InvalidInput(format!("{}: {}", context.into(), detail))
            }
            duplicate @ CoinXpertError::DuplicateUtxo(_) => duplicate,
        })
    }
}

pub type CoinXpertResult<T> = Result<T, CoinXpertError>;
