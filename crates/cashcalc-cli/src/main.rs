mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::annual::{AnnualArgs, CompareCitiesArgs};
use commands::convert::ConvertArgs;
use commands::recon::ReconArgs;
use commands::structure::{BreakdownArgs, CompareOffersArgs};

/// Salary, tax and contribution calculations for Chinese cities
#[derive(Parser)]
#[command(
    name = "cashcalc",
    version,
    about = "Salary, tax and contribution calculations for Chinese cities",
    long_about = "Computes monthly net pay under cumulative withholding, optimized \
                  year-end bonus tax, per-city social-insurance and housing-fund \
                  contributions, and comprehensive-value comparisons between \
                  compensation structures, with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the full-year net pay summary for one package
    Annual(AnnualArgs),
    /// Break down an arbitrary salary structure (alt channel, stock, custom bases)
    Breakdown(BreakdownArgs),
    /// Solve the monthly base under a target structure for a desired raise
    Convert(ConvertArgs),
    /// Replay one package across several cities and rank by net cash
    CompareCities(CompareCitiesArgs),
    /// Compare multiple offers by comprehensive value
    CompareOffers(CompareOffersArgs),
    /// Estimate the year-end settlement (tax owed or refundable)
    Recon(ReconArgs),
    /// List the compiled-in city contribution policies
    Cities,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Annual(args) => commands::annual::run_annual(args),
        Commands::Breakdown(args) => commands::structure::run_breakdown(args),
        Commands::Convert(args) => commands::convert::run_convert(args),
        Commands::CompareCities(args) => commands::annual::run_compare_cities(args),
        Commands::CompareOffers(args) => commands::structure::run_compare_offers(args),
        Commands::Recon(args) => commands::recon::run_recon(args),
        Commands::Cities => commands::cities::run_cities(),
        Commands::Version => {
            println!("cashcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
