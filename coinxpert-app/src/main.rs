mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(name = "coinxpert", version, about = "Compare coin selection strategies")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run both strategies on a selection request
    Compare(CompareArgs),
    /// Replay a sequence of payments from a wallet with both strategies
    Simulate(SimulateArgs),
    /// Write a default configuration file
    InitConfig(InitConfigArgs),
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Request file, read from stdin when omitted
    input: Option<String>,
    /// Output file path
    #[clap(short, long)]
    output: Option<String>,
    /// Emit the full comparison record instead of the wire response
    #[clap(long)]
    record: bool,
    /// Configuration file
    #[clap(short, long, env = "COINXPERT_CONFIG")]
    config: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SimulateArgs {
    /// Comma-separated UTXO values in BTC
    #[clap(long)]
    utxos: String,
    /// Comma-separated payment amounts in BTC
    #[clap(long)]
    payments: String,
    /// Output file path
    #[clap(short, long)]
    output: Option<String>,
    /// Configuration file
    #[clap(short, long, env = "COINXPERT_CONFIG")]
    config: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the configuration
    path: String,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = Cli::parse();
    match args.command {
        Commands::Compare(args) => commands::compare(args)?,
        Commands::Simulate(args) => commands::simulate(args)?,
        Commands::InitConfig(args) => commands::init_config(args)?,
    }
    Ok(())
}
