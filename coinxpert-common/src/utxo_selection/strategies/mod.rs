//! UTXO selection strategies
//!
//! Each strategy implements [`Strategy`] and only decides *which* inputs to
//! spend. Fee and change accounting is applied afterwards by the
//! [`UtxoSelector`](crate::utxo_selection::selector::UtxoSelector), identically
//! for every strategy.

use crate::utxo_selection::input_set::InputSet;
use crate::utxo_selection::types::{SelectionParams, Target, Utxo};

pub mod base;
pub mod bitcoin_core;
pub mod coinxpert;

// Re-export implementations
pub use bitcoin_core::BitcoinCoreStrategy;
pub use coinxpert::CoinXpertStrategy;

/// Trait defining a UTXO selection strategy
///
/// Strategies receive a read-only view of the input set and may run
/// concurrently with each other.
pub trait Strategy: Send + Sync {
    /// Name of this strategy, reported in every result it produces
    fn name(&self) -> &'static str;

    /// Choose inputs for `target`
    ///
    /// # Returns
    /// * `Some(inputs)` - inputs that cover the target and the no-change fee
    /// * `None` - no subset of the input set can fund the payment
    fn select(
        &self,
        inputs: &InputSet,
        target: Target,
        params: &SelectionParams,
    ) -> Option<Vec<Utxo>>;
}
