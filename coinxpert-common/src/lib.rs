//! CoinXpert Common Library
//!
//! This crate provides the coin selection engine used by the CoinXpert tools:
//! given a snapshot of spendable UTXOs and a payment target, choose inputs,
//! settle fee and change, and compare two selection strategies on the same
//! request.
//!
//! # Modules
//!
//! - `types`: Shared constants and serde helpers
//! - `math`: Fee rates, the transaction size model and amount conversions
//! - `error`: Error types
//! - `logging`: Logging infrastructure
//! - `config`: Configuration management
//! - `utxo_selection`: Input sets, strategies, change policy and the selector
//! - `comparison`: The two-strategy comparison harness
//! - `simulation`: Replaying payment sequences against a wallet snapshot

/// Shared constants and serde helpers
pub mod types;

/// Fee and value arithmetic
pub mod math;

/// Error types
pub mod error;

/// Logging functionality
pub mod logging;

/// Configuration management
pub mod config;

/// UTXO selection algorithms and utilities
pub mod utxo_selection;

/// Two-strategy comparison harness
pub mod comparison;

/// Payment sequence simulation
pub mod simulation;

// Re-export important Bitcoin types
pub use bitcoin::Amount;

/// Re-export UTXO selection types
pub use utxo_selection::{
    BitcoinCoreStrategy, ChangeOutput, CoinXpertStrategy, InputSet, Selection, SelectionParams,
    SelectionResult, Strategy, Target, Utxo, UtxoId, UtxoSelector,
};

/// Re-export comparison types
pub use comparison::{ComparisonHarness, ComparisonRecord, Outcome};

/// Re-export common types for convenience
pub use error::{CoinXpertError, CoinXpertResult};
pub use math::{btc_to_sats, is_dust_amount, sats_to_btc, FeeModel, FeeRate};
pub use types::{DUST_THRESHOLD, MAX_BITCOIN_SUPPLY, SATS_PER_BTC};

/// Version of the engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
