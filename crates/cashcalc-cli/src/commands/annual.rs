use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use cashcalc_core::payroll::annual::{calculate_all, SalaryInput};
use cashcalc_core::payroll::cross_city::compare_across_cities;
use cashcalc_core::policy::CityId;

use crate::commands::{parse_bonus_mode, parse_city};
use crate::input;

/// Arguments for the annual net pay calculation
#[derive(Args)]
pub struct AnnualArgs {
    /// Monthly base salary in yuan
    #[arg(long)]
    pub monthly_base: Option<Decimal>,

    /// Salary months per year (13 and up means year-end bonus months)
    #[arg(long, default_value = "12")]
    pub months: Decimal,

    /// City id (beijing, shanghai, guangzhou, ...)
    #[arg(long, default_value = "beijing")]
    pub city: String,

    /// Housing fund rate in percent (5-12); defaults to the city's standard rate
    #[arg(long)]
    pub housing_fund_rate: Option<Decimal>,

    /// Monthly special additional deduction in yuan
    #[arg(long, default_value = "0")]
    pub additional_deduction: Decimal,

    /// Bonus tax mode: separate, combined or auto
    #[arg(long, default_value = "auto")]
    pub bonus_tax_mode: String,

    /// Custom social insurance base, clamped into the city range
    #[arg(long)]
    pub social_insurance_base: Option<Decimal>,

    /// Custom housing fund base, clamped into the city range
    #[arg(long)]
    pub housing_fund_base: Option<Decimal>,

    /// Supplementary housing fund rate in percent (both sides combined)
    #[arg(long)]
    pub supplement_hf_rate: Option<Decimal>,

    /// Enterprise annuity rate in percent
    #[arg(long)]
    pub enterprise_annuity_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the cross-city comparison
#[derive(Args)]
pub struct CompareCitiesArgs {
    /// Monthly base salary in yuan
    #[arg(long)]
    pub monthly_base: Option<Decimal>,

    /// Salary months per year
    #[arg(long, default_value = "12")]
    pub months: Decimal,

    /// Housing fund rate in percent, clamped per city
    #[arg(long, default_value = "12")]
    pub housing_fund_rate: Decimal,

    /// Monthly special additional deduction in yuan
    #[arg(long, default_value = "0")]
    pub additional_deduction: Decimal,

    /// Comma-separated city ids to compare
    #[arg(long, value_delimiter = ',', default_value = "beijing,shanghai,shenzhen,hangzhou")]
    pub cities: Vec<String>,

    /// Path to JSON input file with the base package (overrides flags)
    #[arg(long)]
    pub input: Option<String>,
}

fn input_from_flags(args: &AnnualArgs) -> Result<SalaryInput, Box<dyn std::error::Error>> {
    Ok(SalaryInput {
        city: parse_city(&args.city)?,
        monthly_base: args
            .monthly_base
            .ok_or("--monthly-base is required (or provide --input)")?,
        total_months: args.months,
        housing_fund_rate: args.housing_fund_rate,
        additional_deduction: args.additional_deduction,
        social_insurance_base: args.social_insurance_base,
        housing_fund_base: args.housing_fund_base,
        bonus_tax_mode: parse_bonus_mode(&args.bonus_tax_mode)?,
        supplement_hf_rate: args.supplement_hf_rate,
        enterprise_annuity_rate: args.enterprise_annuity_rate,
    })
}

pub fn run_annual(args: AnnualArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let salary_input: SalaryInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        input_from_flags(&args)?
    };

    let result = calculate_all(&salary_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare_cities(args: CompareCitiesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base_input: SalaryInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SalaryInput {
            city: CityId::Beijing,
            monthly_base: args
                .monthly_base
                .ok_or("--monthly-base is required (or provide --input)")?,
            total_months: args.months,
            housing_fund_rate: Some(args.housing_fund_rate),
            additional_deduction: args.additional_deduction,
            social_insurance_base: None,
            housing_fund_base: None,
            bonus_tax_mode: Default::default(),
            supplement_hf_rate: None,
            enterprise_annuity_rate: None,
        }
    };

    let cities = args
        .cities
        .iter()
        .map(|id| parse_city(id))
        .collect::<Result<Vec<_>, _>>()?;

    let result = compare_across_cities(&base_input, &cities)?;
    Ok(serde_json::to_value(result)?)
}
