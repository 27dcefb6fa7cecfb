use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use cashcalc_core::structure::breakdown::{
    calc_structure_breakdown, ContributionBaseKind, SalaryStructure,
};
use cashcalc_core::structure::compare::compare_offers;

use crate::commands::parse_city;
use crate::input;

/// Arguments for a single structure breakdown
#[derive(Args)]
pub struct BreakdownArgs {
    /// Monthly base salary in yuan
    #[arg(long)]
    pub monthly_base: Option<Decimal>,

    /// Salary months per year
    #[arg(long, default_value = "12")]
    pub months: Decimal,

    /// City id (beijing, shanghai, guangzhou, ...)
    #[arg(long, default_value = "beijing")]
    pub city: String,

    /// Social insurance base kind: full, minimum or custom
    #[arg(long, default_value = "full")]
    pub si_base_kind: String,

    /// Custom social insurance base (with --si-base-kind custom)
    #[arg(long)]
    pub custom_si_base: Option<Decimal>,

    /// Housing fund base kind: full, minimum or custom
    #[arg(long, default_value = "full")]
    pub hf_base_kind: String,

    /// Custom housing fund base (with --hf-base-kind custom)
    #[arg(long)]
    pub custom_hf_base: Option<Decimal>,

    /// Housing fund rate in percent; defaults to the city's standard rate
    #[arg(long)]
    pub housing_fund_rate: Option<Decimal>,

    /// Share of pay routed outside official payroll, percent
    #[arg(long, default_value = "0")]
    pub alt_channel_ratio: Decimal,

    /// Flat fee on the alternate channel, percent
    #[arg(long, default_value = "0")]
    pub alt_channel_fee_rate: Decimal,

    /// Annual stock grant at face value, yuan
    #[arg(long, default_value = "0")]
    pub annual_stock_value: Decimal,

    /// Percent of face value the grant is counted at
    #[arg(long, default_value = "100")]
    pub stock_discount: Decimal,

    /// Monthly special additional deduction in yuan
    #[arg(long, default_value = "0")]
    pub special_deduction: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the multi-offer comparison
#[derive(Args)]
pub struct CompareOffersArgs {
    /// Path to a JSON file with an array of salary structures
    #[arg(long)]
    pub input: Option<String>,
}

fn parse_base_kind(kind: &str) -> Result<ContributionBaseKind, Box<dyn std::error::Error>> {
    match kind {
        "full" => Ok(ContributionBaseKind::Full),
        "minimum" => Ok(ContributionBaseKind::Minimum),
        "custom" => Ok(ContributionBaseKind::Custom),
        other => Err(format!(
            "Unknown contribution base kind '{}' (expected full, minimum or custom)",
            other
        )
        .into()),
    }
}

fn structure_from_flags(args: &BreakdownArgs) -> Result<SalaryStructure, Box<dyn std::error::Error>> {
    Ok(SalaryStructure {
        city: parse_city(&args.city)?,
        monthly_base: args
            .monthly_base
            .ok_or("--monthly-base is required (or provide --input)")?,
        months: args.months,
        social_insurance_base_kind: parse_base_kind(&args.si_base_kind)?,
        custom_social_insurance_base: args.custom_si_base,
        housing_fund_base_kind: parse_base_kind(&args.hf_base_kind)?,
        custom_housing_fund_base: args.custom_hf_base,
        housing_fund_rate: args.housing_fund_rate,
        alt_channel_ratio: args.alt_channel_ratio,
        alt_channel_fee_rate: args.alt_channel_fee_rate,
        annual_stock_value: args.annual_stock_value,
        stock_discount: args.stock_discount,
        special_deduction: args.special_deduction,
    })
}

pub fn run_breakdown(args: BreakdownArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let structure: SalaryStructure = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        structure_from_flags(&args)?
    };

    let result = calc_structure_breakdown(&structure)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare_offers(args: CompareOffersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let offers: Vec<SalaryStructure> = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file with an array of structures is required".into());
    };

    let result = compare_offers(&offers)?;
    Ok(serde_json::to_value(result)?)
}
