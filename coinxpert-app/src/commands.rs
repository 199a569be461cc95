use anyhow::{anyhow, bail, Context, Result};
use log::info;
use serde::Serialize;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use coinxpert_common::comparison::ComparisonHarness;
use coinxpert_common::config::{self, Config};
use coinxpert_common::logging;
use coinxpert_common::simulation::{compare_payment_sequences, SimulatedWallet};
use coinxpert_common::{btc_to_sats, Amount, Utxo};
use coinxpert_ipc::messages::{SelectionRequest, STATUS_OK};
use coinxpert_ipc::RequestHandler;

use crate::{CompareArgs, InitConfigArgs, SimulateArgs};

pub fn compare(args: CompareArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let input = match args.input {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request from {}", path))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if args.record {
        let request: SelectionRequest = serde_json::from_str(&input)?;
        let params = config.selection.to_params()?;
        let harness = ComparisonHarness::new().parallel(config.comparison.parallel);
        let record = harness.compare(&request.to_utxos()?, request.target_amount()?, &params)?;
        return write_json(args.output.as_deref(), &record);
    }

    let handler = RequestHandler::from_config(&config)?;
    let (status, body) = handler.handle_json(&input);
    let body: serde_json::Value = serde_json::from_str(&body)?;
    write_json(args.output.as_deref(), &body)?;

    if status != STATUS_OK {
        bail!("Selection request failed with status {}", status);
    }
    Ok(())
}

pub fn simulate(args: SimulateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let params = config.selection.to_params()?;

    let utxos = parse_btc_list(&args.utxos)?
        .into_iter()
        .enumerate()
        .map(|(index, value)| Utxo::new(format!("utxo-{}", index), value))
        .collect();
    let wallet = SimulatedWallet::new(utxos)?;
    let payments = parse_btc_list(&args.payments)?;

    let harness = ComparisonHarness::new().parallel(config.comparison.parallel);
    let report = compare_payment_sequences(&wallet, &payments, &harness, &params)?;

    write_json(args.output.as_deref(), &report)
}

pub fn init_config(args: InitConfigArgs) -> Result<()> {
    if !config::ensure_config_exists(Path::new(&args.path))? {
        bail!("Configuration file {} already exists", args.path);
    }
    println!("Wrote default configuration to {}", args.path);
    Ok(())
}

/// Load the configuration and start logging with its settings
fn load_config(path: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.validate()?;

    logging::init(&config.logging).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
    info!("CoinXpert {} starting", coinxpert_common::VERSION);

    Ok(config)
}

fn open_output(path: Option<&str>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file {}", path))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    Ok(writer)
}

/// Pretty-print `value` as one newline-terminated JSON document
fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let mut writer = open_output(path)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    // Dropping a BufWriter swallows write errors
    writer.flush().context("Failed to write output")?;
    Ok(())
}

/// Parse a comma-separated list of BTC amounts
fn parse_btc_list(list: &str) -> Result<Vec<Amount>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| -> Result<Amount> {
            let btc: f64 = item
                .parse()
                .with_context(|| format!("Invalid amount '{}'", item))?;
            Ok(Amount::from_sat(btc_to_sats(btc)?))
        })
        .collect()
}
