//! Configuration management for CoinXpert.
//!
//! Settings live in a TOML file with three sections:
//!
//! ```toml
//! [selection]
//! fee_rate = "20"          # sat/vB, fractional rates allowed
//! dust_threshold = 546
//! base_overhead = 10
//! per_input_weight = 146
//! per_output_weight = 34
//! bnb_max_tries = 100000
//!
//! [comparison]
//! parallel = false
//!
//! [logging]
//! level = "Info"
//! ```
//!
//! Every field has a default, so a partial (or empty) file is valid. The
//! engine never reads configuration on its own; callers convert the
//! `[selection]` section into [`SelectionParams`] and pass it per call.

use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::logging::{self, LogConfig, LogLevel};
use crate::math::{
    FeeModel, FeeRate, DEFAULT_BASE_OVERHEAD, DEFAULT_INPUT_WEIGHT, DEFAULT_OUTPUT_WEIGHT,
};
use crate::types::{DUST_THRESHOLD, MAX_BITCOIN_SUPPLY};
use crate::utxo_selection::types::{SelectionParams, DEFAULT_BNB_MAX_TRIES};

/// Input count at which `validate` requires the fee to stay within the bitcoin supply
const MAX_FEE_CHECKED_INPUTS: usize = 10_000;

/// Main configuration structure for CoinXpert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub comparison: ComparisonConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Fee model and search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Fee rate in sat/vB
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,

    /// Change at or below this many satoshis is folded into the fee
    #[serde(default = "default_dust_threshold")]
    pub dust_threshold: u64,

    /// Fixed transaction overhead in vbytes
    #[serde(default = "default_base_overhead")]
    pub base_overhead: u64,

    #[serde(default = "default_input_weight")]
    pub per_input_weight: u64,

    #[serde(default = "default_output_weight")]
    pub per_output_weight: u64,

    /// Node budget for the branch-and-bound search
    #[serde(default = "default_bnb_max_tries")]
    pub bnb_max_tries: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
            dust_threshold: default_dust_threshold(),
            base_overhead: default_base_overhead(),
            per_input_weight: default_input_weight(),
            per_output_weight: default_output_weight(),
            bnb_max_tries: default_bnb_max_tries(),
        }
    }
}

impl SelectionConfig {
    /// Build the per-call selection parameters
    pub fn to_params(&self) -> Result<SelectionParams> {
        let fee_rate = FeeRate::from_sat_per_vb_decimal(self.fee_rate)
            .map_err(|e| anyhow!("Invalid fee rate: {}", e))?;

        let fee_model = FeeModel::new(
            fee_rate,
            self.base_overhead,
            self.per_input_weight,
            self.per_output_weight,
        );

        Ok(SelectionParams::new(fee_model)
            .with_dust_threshold(self.dust_threshold)
            .with_bnb_max_tries(self.bnb_max_tries))
    }
}

/// Comparison harness settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ComparisonConfig {
    /// Run the two strategies on separate threads
    #[serde(default)]
    pub parallel: bool,
}

impl Config {
    /// Read and parse a TOML configuration file
    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path))?;
        let config: Config =
            toml::from_str(&text).with_context(|| format!("Malformed configuration in {}", path))?;

        logging::log_config(
            LogLevel::Debug,
            "config_loaded",
            Some(json!({ "path": path, "fee_rate": config.selection.fee_rate.to_string() })),
        );

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let text = toml::to_string_pretty(self).context("Cannot encode configuration")?;
        fs::write(path, text).with_context(|| format!("Cannot write {}", path))
    }

    /// Reject settings the fee model cannot work with
    pub fn validate(&self) -> Result<()> {
        let selection = &self.selection;

        if selection.fee_rate.is_sign_negative() && !selection.fee_rate.is_zero() {
            bail!("Invalid fee rate: must not be negative");
        }
        if selection.per_input_weight == 0 {
            bail!("Invalid input weight: must be greater than 0");
        }
        if selection.per_output_weight == 0 {
            bail!("Invalid output weight: must be greater than 0");
        }
        if selection.bnb_max_tries == 0 {
            bail!("Invalid search budget: must be greater than 0");
        }

        // Catches rates too large for the integer fee representation
        let params = selection.to_params()?;

        let largest_fee = params.fee_model.fee_for(MAX_FEE_CHECKED_INPUTS, 2).to_sat();
        if largest_fee > MAX_BITCOIN_SUPPLY {
            bail!(
                "Invalid fee model: a {}-input transaction would cost {} sats, above the bitcoin supply",
                MAX_FEE_CHECKED_INPUTS,
                largest_fee
            );
        }

        Ok(())
    }
}

/// Write a default configuration to `path` unless a file is already there
///
/// Missing parent directories are created. Returns whether a file was written.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?
        }
        _ => {}
    }

    let path = path
        .to_str()
        .ok_or_else(|| anyhow!("Configuration path {} is not valid UTF-8", path.display()))?;
    Config::default().save(path)?;

    logging::log_config(LogLevel::Info, "config_created", Some(json!({ "path": path })));
    Ok(true)
}

// Default value functions

fn default_fee_rate() -> Decimal {
    dec!(20)
}

fn default_dust_threshold() -> u64 {
    DUST_THRESHOLD
}

fn default_base_overhead() -> u64 {
    DEFAULT_BASE_OVERHEAD
}

fn default_input_weight() -> u64 {
    DEFAULT_INPUT_WEIGHT
}

fn default_output_weight() -> u64 {
    DEFAULT_OUTPUT_WEIGHT
}

fn default_bnb_max_tries() -> usize {
    DEFAULT_BNB_MAX_TRIES
}
