//! Core domain constants and shared serde helpers
//!
//! Amounts are carried as `bitcoin::Amount` inside the engine. The helpers in
//! [`as_sats`] serialize them as plain integer satoshis so that records written
//! by the engine stay readable by tools that know nothing about the bitcoin crate.

/// Bitcoin dust threshold in satoshis
pub const DUST_THRESHOLD: u64 = 546;

/// Number of satoshis in one bitcoin
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Maximum number of satoshis that can ever exist
pub const MAX_BITCOIN_SUPPLY: u64 = 21_000_000 * SATS_PER_BTC;

/// Serialize `Amount` fields as integer satoshis.
///
/// ```
/// use bitcoin::Amount;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Payment {
///     #[serde(with = "coinxpert_common::types::as_sats")]
///     value: Amount,
/// }
///
/// let json = serde_json::to_string(&Payment { value: Amount::from_sat(1_500) }).unwrap();
/// assert_eq!(json, r#"{"value":1500}"#);
/// ```
pub mod as_sats {
    use bitcoin::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(amount.to_sat())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        u64::deserialize(deserializer).map(Amount::from_sat)
    }

    /// Same as the parent module for `Option<Amount>`
    pub mod opt {
        use bitcoin::Amount;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            amount: &Option<Amount>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match amount {
                Some(amount) => serializer.serialize_some(&amount.to_sat()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Amount>, D::Error> {
            Option::<u64>::deserialize(deserializer).map(|sats| sats.map(Amount::from_sat))
        }
    }
}
