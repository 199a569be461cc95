//! UTXO selection module
//!
//! Given a snapshot of spendable UTXOs and a payment target, choose the inputs
//! that fund the payment and decide whether a change output is warranted.
//!
//! # Module Structure
//!
//! - `types.rs` - Core data structures for UTXO selection
//! - `input_set.rs` - The candidate pool shared by all strategies in a run
//! - `change.rs` - Change output policy applied to every strategy
//! - `selector.rs` - Main UTXO selector implementation (Strategy pattern context)
//! - `strategies/` - Strategy implementations
//!   - `bitcoin_core.rs` - Branch-and-bound with knapsack and single-input fallbacks
//!   - `coinxpert.rs` - Largest-first greedy accumulation
//!
//! # Feature Highlights
//!
//! - **Strategy Pattern**: strategies only pick inputs; fee and change accounting is shared
//! - **Integer arithmetic**: fees are computed in satoshis and rounded up
//! - **Determinism**: candidates are ordered by value and id, never by input order

pub mod change;
pub mod input_set;
pub mod selector;
pub mod strategies;
pub mod types;

pub use change::ChangePolicy;
pub use input_set::InputSet;
pub use selector::UtxoSelector;
pub use strategies::{BitcoinCoreStrategy, CoinXpertStrategy, Strategy};
pub use types::{
    ChangeOutput, EffectiveUtxo, Selection, SelectionParams, SelectionResult, Target, Utxo, UtxoId,
};
