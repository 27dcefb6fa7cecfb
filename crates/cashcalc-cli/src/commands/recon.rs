use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use cashcalc_core::reconciliation::{reconcile_annual_tax, ReconciliationInput};

use crate::commands::parse_city;
use crate::input;

/// Arguments for the year-end settlement estimate
#[derive(Args)]
pub struct ReconArgs {
    /// Monthly base salary in yuan
    #[arg(long)]
    pub monthly_base: Option<Decimal>,

    /// Salary months per year
    #[arg(long, default_value = "12")]
    pub months: Decimal,

    /// City id (beijing, shanghai, guangzhou, ...)
    #[arg(long, default_value = "beijing")]
    pub city: String,

    /// Housing fund rate in percent; defaults to the city's standard rate
    #[arg(long)]
    pub housing_fund_rate: Option<Decimal>,

    /// Monthly special additional deduction in yuan
    #[arg(long, default_value = "0")]
    pub additional_deduction: Decimal,

    /// Other comprehensive income at face value, yuan per year
    #[arg(long, default_value = "0")]
    pub other_income: Decimal,

    /// Labor service income at face value, yuan per year
    #[arg(long, default_value = "0")]
    pub labor_income: Decimal,

    /// Royalty income at face value, yuan per year
    #[arg(long, default_value = "0")]
    pub royalty_income: Decimal,

    /// Extra itemized deductions claimed at settlement, yuan per year
    #[arg(long, default_value = "0")]
    pub itemized_deductions: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_recon(args: ReconArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let recon_input: ReconciliationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ReconciliationInput {
            city: parse_city(&args.city)?,
            monthly_base: args
                .monthly_base
                .ok_or("--monthly-base is required (or provide --input)")?,
            total_months: args.months,
            housing_fund_rate: args.housing_fund_rate,
            additional_deduction: args.additional_deduction,
            other_income: args.other_income,
            labor_income: args.labor_income,
            royalty_income: args.royalty_income,
            itemized_deductions: args.itemized_deductions,
        }
    };

    let result = reconcile_annual_tax(&recon_input)?;
    Ok(serde_json::to_value(result)?)
}
