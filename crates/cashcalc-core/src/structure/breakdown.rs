use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SalaryEngineError;
use crate::payroll::annual::resolve_housing_fund_rate;
use crate::payroll::contribution::{employee_contributions, employer_contributions};
use crate::payroll::withholding::run_withholding;
use crate::policy::{get_city_policy, BaseRange, CityId};
use crate::tax;
use crate::types::{round2, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::SalaryResult;

// ---------------------------------------------------------------------------
// Value weights
// ---------------------------------------------------------------------------

// Comprehensive value counts cash and housing fund at face, pension at half
// (locked until retirement), and nothing for the risk-pool insurances.
pub const CASH_VALUE_WEIGHT: Rate = dec!(1.0);
pub const HOUSING_FUND_VALUE_WEIGHT: Rate = dec!(1.0);
pub const PENSION_VALUE_WEIGHT: Rate = dec!(0.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the contribution base is chosen for a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionBaseKind {
    /// Clamp the monthly base into the policy range.
    #[default]
    Full,
    /// The policy floor, a common cost-cutting arrangement.
    Minimum,
    /// A caller-supplied base, clamped; falls back to `Full` when absent.
    Custom,
}

fn default_city() -> CityId {
    CityId::Beijing
}

fn twelve_months() -> Decimal {
    dec!(12)
}

fn full_stock_discount() -> Percent {
    dec!(100)
}

/// A compensation structure to evaluate: how much is paid, through which
/// channels, and on what contribution bases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStructure {
    #[serde(default = "default_city")]
    pub city: CityId,
    /// Defaults to zero so conversion targets can omit it.
    #[serde(default)]
    pub monthly_base: Money,
    #[serde(default = "twelve_months")]
    pub months: Decimal,
    #[serde(default)]
    pub social_insurance_base_kind: ContributionBaseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_social_insurance_base: Option<Money>,
    #[serde(default)]
    pub housing_fund_base_kind: ContributionBaseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_housing_fund_base: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housing_fund_rate: Option<Percent>,
    /// Share of monthly pay routed outside official payroll, 0-100.
    #[serde(default)]
    pub alt_channel_ratio: Percent,
    /// Flat service fee charged on the alternate channel, 0-100.
    #[serde(default)]
    pub alt_channel_fee_rate: Percent,
    #[serde(default)]
    pub annual_stock_value: Money,
    /// Percent of face value the grant is counted at.
    #[serde(default = "full_stock_discount")]
    pub stock_discount: Percent,
    /// Monthly special additional deduction used during withholding.
    #[serde(default)]
    pub special_deduction: Money,
}

/// Annual totals for one structure. Mirrors the annual summary but adds
/// alternate-channel, stock and employer-cost figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureBreakdown {
    pub gross_annual: Money,
    pub official_salary_annual: Money,
    pub alt_channel_annual: Money,
    pub alt_channel_fee: Money,
    pub employee_insurance_annual: Money,
    pub employee_housing_fund_annual: Money,
    pub employee_pension_annual: Money,
    pub income_tax: Money,
    pub take_home_cash: Money,
    pub employer_insurance_annual: Money,
    pub employer_housing_fund_annual: Money,
    pub employer_pension_annual: Money,
    pub employer_total_cost: Money,
    pub stock_face_value: Money,
    pub stock_value: Money,
    pub comprehensive_value: Money,
}

// ---------------------------------------------------------------------------
// Base resolution
// ---------------------------------------------------------------------------

fn resolve_structure_base(
    kind: ContributionBaseKind,
    custom: Option<Money>,
    monthly_base: Money,
    range: &BaseRange,
) -> Money {
    match kind {
        ContributionBaseKind::Minimum => range.min,
        ContributionBaseKind::Custom => match custom {
            Some(base) if base > Decimal::ZERO => range.clamp(base),
            _ => range.clamp(monthly_base),
        },
        ContributionBaseKind::Full => range.clamp(monthly_base),
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Raw breakdown without the output envelope; the solver iterates on this.
///
/// Unlike `calculate_all` there is no bonus-mode override here: bonus tax is
/// always the cheaper of the two regimes.
pub(crate) fn breakdown_of(structure: &SalaryStructure) -> StructureBreakdown {
    let policy = get_city_policy(structure.city);
    let monthly_base = structure.monthly_base;
    let hf_rate = policy.housing_fund.resolve_rate(structure.housing_fund_rate);

    let si_base = resolve_structure_base(
        structure.social_insurance_base_kind,
        structure.custom_social_insurance_base,
        monthly_base,
        &policy.social_insurance.base,
    );
    let hf_base = resolve_structure_base(
        structure.housing_fund_base_kind,
        structure.custom_housing_fund_base,
        monthly_base,
        &policy.housing_fund.base,
    );

    let employee = employee_contributions(si_base, hf_base, hf_rate, &policy);
    let employer = employer_contributions(si_base, hf_base, hf_rate, &policy);

    // Only the official-channel share runs through payroll withholding.
    let official_monthly =
        round2(monthly_base * (Decimal::ONE - structure.alt_channel_ratio / dec!(100)));
    let official_annual = round2(official_monthly * structure.months);
    let official_bonus_part =
        round2(official_monthly * (structure.months - dec!(12)).max(Decimal::ZERO));

    let run = run_withholding(official_monthly, employee.total, structure.special_deduction);

    let separate_tax = tax::bonus_tax_separate(official_bonus_part);
    let pre_bonus_income = run.cumulative_taxable_income.max(Decimal::ZERO);
    let combined_extra_tax = round2(
        tax::cumulative_tax(pre_bonus_income + official_bonus_part)
            - tax::cumulative_tax(pre_bonus_income),
    );
    let bonus_tax = separate_tax.min(combined_extra_tax);

    let income_tax = round2(run.cumulative_tax_paid + bonus_tax);

    let official_take_home = round2(official_annual - employee.total * dec!(12) - income_tax);

    let alt_channel_annual =
        round2(monthly_base * (structure.alt_channel_ratio / dec!(100)) * structure.months);
    let alt_channel_fee = round2(alt_channel_annual * (structure.alt_channel_fee_rate / dec!(100)));
    let alt_channel_take_home = round2(alt_channel_annual - alt_channel_fee);

    let take_home_cash = round2(official_take_home + alt_channel_take_home);
    let gross_annual = round2(monthly_base * structure.months);

    let stock_value = round2(structure.annual_stock_value * (structure.stock_discount / dec!(100)));

    let comprehensive_value = round2(
        take_home_cash * CASH_VALUE_WEIGHT
            + (employee.housing_fund + employer.housing_fund) * dec!(12) * HOUSING_FUND_VALUE_WEIGHT
            + (employee.pension + employer.pension) * dec!(12) * PENSION_VALUE_WEIGHT
            + stock_value,
    );

    let employer_total_cost = round2(gross_annual + employer.total * dec!(12));

    StructureBreakdown {
        gross_annual,
        official_salary_annual: official_annual,
        alt_channel_annual,
        alt_channel_fee,
        employee_insurance_annual: round2(employee.total * dec!(12)),
        employee_housing_fund_annual: round2(employee.housing_fund * dec!(12)),
        employee_pension_annual: round2(employee.pension * dec!(12)),
        income_tax,
        take_home_cash,
        employer_insurance_annual: round2(employer.total * dec!(12)),
        employer_housing_fund_annual: round2(employer.housing_fund * dec!(12)),
        employer_pension_annual: round2(employer.pension * dec!(12)),
        employer_total_cost,
        stock_face_value: structure.annual_stock_value,
        stock_value,
        comprehensive_value,
    }
}

pub(crate) fn validate_structure(structure: &SalaryStructure) -> SalaryResult<()> {
    if structure.monthly_base < Decimal::ZERO {
        return Err(SalaryEngineError::InvalidInput {
            field: "monthly_base".to_string(),
            reason: "Monthly base must not be negative".to_string(),
        });
    }
    if structure.months < dec!(12) {
        return Err(SalaryEngineError::InvalidInput {
            field: "months".to_string(),
            reason: "Months must be at least 12".to_string(),
        });
    }
    if structure.alt_channel_ratio < Decimal::ZERO || structure.alt_channel_ratio > dec!(100) {
        return Err(SalaryEngineError::InvalidInput {
            field: "alt_channel_ratio".to_string(),
            reason: "Alternate channel ratio must be between 0 and 100".to_string(),
        });
    }
    if structure.alt_channel_fee_rate < Decimal::ZERO || structure.alt_channel_fee_rate > dec!(100)
    {
        return Err(SalaryEngineError::InvalidInput {
            field: "alt_channel_fee_rate".to_string(),
            reason: "Alternate channel fee rate must be between 0 and 100".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluates one salary structure into its annual breakdown and
/// comprehensive value.
pub fn calc_structure_breakdown(
    structure: &SalaryStructure,
) -> SalaryResult<ComputationOutput<StructureBreakdown>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_structure(structure)?;

    let policy = get_city_policy(structure.city);
    resolve_housing_fund_rate(structure.housing_fund_rate, &policy, &mut warnings);

    let result = breakdown_of(structure);

    let assumptions = serde_json::json!({
        "city": structure.city,
        "monthly_base": structure.monthly_base.to_string(),
        "months": structure.months.to_string(),
        "alt_channel_ratio": structure.alt_channel_ratio.to_string(),
        "social_insurance_base_kind": structure.social_insurance_base_kind,
        "housing_fund_base_kind": structure.housing_fund_base_kind,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Channel-split annual breakdown with cumulative withholding and weighted comprehensive value",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
