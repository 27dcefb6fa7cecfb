use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SalaryEngineError;
use crate::payroll::bonus::{optimize_bonus_tax, BonusTaxMode, BonusTaxResult};
use crate::payroll::contribution::{
    employee_contributions, employer_contributions, resolve_contribution_base,
    EmployerInsuranceBreakdown, InsuranceBreakdown,
};
use crate::payroll::withholding::run_withholding;
use crate::policy::{get_city_policy, CityId, CityPolicy};
use crate::types::{round2, with_metadata, ComputationOutput, Money, Percent};
use crate::SalaryResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_city() -> CityId {
    CityId::Beijing
}

fn twelve_months() -> Decimal {
    dec!(12)
}

/// One salary package as entered by the caller. Optional fields default at
/// deserialization time; an absent housing-fund rate means the city default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryInput {
    #[serde(default = "default_city")]
    pub city: CityId,
    pub monthly_base: Money,
    /// Salary months per year, 13 and up meaning year-end bonus months.
    #[serde(default = "twelve_months")]
    pub total_months: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housing_fund_rate: Option<Percent>,
    /// Monthly special additional deduction (children, housing loan, ...).
    #[serde(default)]
    pub additional_deduction: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_insurance_base: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housing_fund_base: Option<Money>,
    #[serde(default)]
    pub bonus_tax_mode: BonusTaxMode,
    /// Supplementary housing fund rate, both sides combined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplement_hf_rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_annuity_rate: Option<Percent>,
}

/// One calendar month of the year, contributions included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    pub month: u32,
    pub gross_salary: Money,
    pub social_insurance_base: Money,
    pub housing_fund_base: Money,
    pub employee_insurance: InsuranceBreakdown,
    pub employer_insurance: EmployerInsuranceBreakdown,
    pub taxable_income: Money,
    pub cumulative_taxable_income: Money,
    pub cumulative_tax: Money,
    pub monthly_tax: Money,
    pub net_salary: Money,
}

/// Full-year aggregation: the engine's primary output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    pub total_gross_income: Money,
    pub total_salary_gross: Money,
    pub bonus_gross: Money,
    pub total_employee_insurance: Money,
    pub total_tax: Money,
    pub salary_tax: Money,
    pub bonus_tax: Money,
    pub total_net_cash: Money,
    pub total_pension_employee: Money,
    pub total_pension_employer: Money,
    pub total_housing_fund_employee: Money,
    pub total_housing_fund_employer: Money,
    pub total_pension: Money,
    pub total_housing_fund: Money,
    /// Net cash plus both-sides pension and housing fund, plus supplements.
    pub total_value: Money,
    pub bonus_tax_result: BonusTaxResult,
    pub monthly_details: Vec<MonthlyBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_supplement_hf: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_enterprise_annuity: Option<Money>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &SalaryInput) -> SalaryResult<()> {
    if input.monthly_base < Decimal::ZERO {
        return Err(SalaryEngineError::InvalidInput {
            field: "monthly_base".to_string(),
            reason: "Monthly base must not be negative".to_string(),
        });
    }
    if input.total_months < dec!(12) {
        return Err(SalaryEngineError::InvalidInput {
            field: "total_months".to_string(),
            reason: "Total months must be at least 12".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn resolve_housing_fund_rate(
    requested: Option<Percent>,
    policy: &CityPolicy,
    warnings: &mut Vec<String>,
) -> Percent {
    let resolved = policy.housing_fund.resolve_rate(requested);
    if let Some(rate) = requested {
        if rate != resolved {
            warnings.push(format!(
                "Housing fund rate {}% is outside {}'s {}%-{}% range, clamped to {}%",
                rate,
                policy.short_name,
                policy.housing_fund.rate_range.min,
                policy.housing_fund.rate_range.max,
                resolved,
            ));
        }
    }
    resolved
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Computes the full-year picture for one salary package: per-month
/// withholding, both-sides contributions, optimized bonus tax and the
/// comprehensive-value total.
pub fn calculate_all(input: &SalaryInput) -> SalaryResult<ComputationOutput<AnnualSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let policy = get_city_policy(input.city);
    let hf_rate = resolve_housing_fund_rate(input.housing_fund_rate, &policy, &mut warnings);

    let si_base = resolve_contribution_base(
        input.monthly_base,
        input.social_insurance_base,
        &policy.social_insurance.base,
    );
    let hf_base = resolve_contribution_base(
        input.monthly_base,
        input.housing_fund_base,
        &policy.housing_fund.base,
    );

    // Contributions are constant across the year in this model.
    let employee_ins = employee_contributions(si_base, hf_base, hf_rate, &policy);
    let employer_ins = employer_contributions(si_base, hf_base, hf_rate, &policy);

    let run = run_withholding(input.monthly_base, employee_ins.total, input.additional_deduction);

    let monthly_details: Vec<MonthlyBreakdown> = run
        .months
        .iter()
        .map(|m| MonthlyBreakdown {
            month: m.month,
            gross_salary: input.monthly_base,
            social_insurance_base: si_base,
            housing_fund_base: hf_base,
            employee_insurance: employee_ins.clone(),
            employer_insurance: employer_ins.clone(),
            taxable_income: m.taxable_income,
            cumulative_taxable_income: m.cumulative_taxable_income,
            cumulative_tax: m.cumulative_tax,
            monthly_tax: m.monthly_tax,
            net_salary: m.net_salary,
        })
        .collect();

    let bonus_amount = round2(input.monthly_base * (input.total_months - dec!(12)));
    let bonus_tax_result = optimize_bonus_tax(bonus_amount, run.cumulative_taxable_income);
    let effective_bonus_tax = bonus_tax_result.effective_tax(input.bonus_tax_mode);

    let total_salary_gross = round2(input.monthly_base * dec!(12));
    let total_gross_income = round2(total_salary_gross + bonus_amount);
    let total_employee_insurance = round2(employee_ins.total * dec!(12));
    let salary_tax = round2(run.cumulative_tax_paid);
    let total_tax = round2(salary_tax + effective_bonus_tax);
    let salary_net_cash: Money = monthly_details.iter().map(|m| m.net_salary).sum();
    let bonus_net_cash = round2(bonus_amount - effective_bonus_tax);
    let total_net_cash = round2(salary_net_cash + bonus_net_cash);

    let total_pension_employee = round2(employee_ins.pension * dec!(12));
    let total_pension_employer = round2(employer_ins.pension * dec!(12));
    let total_housing_fund_employee = round2(employee_ins.housing_fund * dec!(12));
    let total_housing_fund_employer = round2(employer_ins.housing_fund * dec!(12));
    let total_pension = round2(total_pension_employee + total_pension_employer);
    let total_housing_fund = round2(total_housing_fund_employee + total_housing_fund_employer);

    let supplement_rate = input.supplement_hf_rate.unwrap_or(Decimal::ZERO);
    let annuity_rate = input.enterprise_annuity_rate.unwrap_or(Decimal::ZERO);
    // Supplement rates model both sides folded into one figure, hence the x2.
    let total_supplement_hf = round2(hf_base * (supplement_rate / dec!(100)) * dec!(2) * dec!(12));
    let total_enterprise_annuity =
        round2(input.monthly_base * (annuity_rate / dec!(100)) * dec!(2) * dec!(12));

    let total_value = round2(
        total_net_cash
            + total_pension
            + total_housing_fund
            + total_supplement_hf
            + total_enterprise_annuity * dec!(0.5),
    );

    let summary = AnnualSummary {
        total_gross_income,
        total_salary_gross,
        bonus_gross: bonus_amount,
        total_employee_insurance,
        total_tax,
        salary_tax,
        bonus_tax: effective_bonus_tax,
        total_net_cash,
        total_pension_employee,
        total_pension_employer,
        total_housing_fund_employee,
        total_housing_fund_employer,
        total_pension,
        total_housing_fund,
        total_value,
        bonus_tax_result,
        monthly_details,
        total_supplement_hf: (total_supplement_hf > Decimal::ZERO).then_some(total_supplement_hf),
        total_enterprise_annuity: (total_enterprise_annuity > Decimal::ZERO)
            .then_some(total_enterprise_annuity),
    };

    let assumptions = serde_json::json!({
        "city": input.city,
        "monthly_base": input.monthly_base.to_string(),
        "total_months": input.total_months.to_string(),
        "housing_fund_rate": hf_rate.to_string(),
        "social_insurance_base": si_base.to_string(),
        "housing_fund_base": hf_base.to_string(),
        "bonus_tax_mode": input.bonus_tax_mode,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cumulative withholding over 12 months with dual-regime bonus tax optimization",
        &assumptions,
        warnings,
        elapsed,
        summary,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payroll::bonus::TaxRegime;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn beijing_input(monthly_base: Money, total_months: Decimal) -> SalaryInput {
        SalaryInput {
            city: CityId::Beijing,
            monthly_base,
            total_months,
            housing_fund_rate: Some(dec!(12)),
            additional_deduction: dec!(0),
            social_insurance_base: None,
            housing_fund_base: None,
            bonus_tax_mode: BonusTaxMode::Auto,
            supplement_hf_rate: None,
            enterprise_annuity_rate: None,
        }
    }

    #[test]
    fn test_beijing_10000_fifteen_months() {
        let output = calculate_all(&beijing_input(dec!(10000), dec!(15))).unwrap();
        let s = &output.result;

        assert_eq!(s.total_salary_gross, dec!(120000));
        assert_eq!(s.bonus_gross, dec!(30000));
        assert_eq!(s.total_gross_income, dec!(150000));
        assert_eq!(s.total_employee_insurance, dec!(27000));
        assert_eq!(s.salary_tax, dec!(990));
        assert_eq!(s.bonus_tax, dec!(900));
        assert_eq!(s.total_tax, dec!(1890));
        assert_eq!(s.total_net_cash, dec!(121110));
        assert_eq!(s.total_pension_employee, dec!(9600));
        assert_eq!(s.total_pension_employer, dec!(19200));
        assert_eq!(s.total_pension, dec!(28800));
        assert_eq!(s.total_housing_fund, dec!(28800));
        assert_eq!(s.total_value, dec!(178710));
        assert_eq!(s.total_supplement_hf, None);
        assert_eq!(s.total_enterprise_annuity, None);

        let first = &s.monthly_details[0];
        assert_eq!(first.monthly_tax, dec!(82.50));
        assert_eq!(first.net_salary, dec!(7667.50));
        assert_eq!(first.social_insurance_base, dec!(10000));
        assert_eq!(first.employee_insurance.total, dec!(2250));

        assert_eq!(s.bonus_tax_result.recommended_mode, TaxRegime::Separate);
        assert_eq!(s.bonus_tax_result.combined_tax, dec!(2790));
    }

    #[test]
    fn test_no_bonus_when_twelve_months() {
        let output = calculate_all(&beijing_input(dec!(25000), dec!(12))).unwrap();
        let s = &output.result;

        assert_eq!(s.bonus_gross, dec!(0));
        assert_eq!(s.bonus_tax_result.separate_tax, dec!(0));
        assert_eq!(s.bonus_tax_result.combined_tax, dec!(0));
        assert_eq!(s.bonus_tax_result.recommended_mode, TaxRegime::Separate);
        assert_eq!(s.salary_tax, dec!(17580));
        assert_eq!(s.total_tax, dec!(17580));
    }

    #[test]
    fn test_explicit_mode_overrides_recommendation() {
        let mut input = beijing_input(dec!(10000), dec!(15));
        input.bonus_tax_mode = BonusTaxMode::Combined;
        let output = calculate_all(&input).unwrap();
        let s = &output.result;

        // combined is the worse regime here and must still be honored
        assert_eq!(s.bonus_tax_result.recommended_mode, TaxRegime::Separate);
        assert_eq!(s.bonus_tax, dec!(2790));
        assert_eq!(s.total_tax, dec!(3780));
    }

    #[test]
    fn test_supplement_and_annuity_in_total_value() {
        let mut input = beijing_input(dec!(10000), dec!(15));
        input.supplement_hf_rate = Some(dec!(5));
        input.enterprise_annuity_rate = Some(dec!(4));
        let output = calculate_all(&input).unwrap();
        let s = &output.result;

        assert_eq!(s.total_supplement_hf, Some(dec!(12000)));
        assert_eq!(s.total_enterprise_annuity, Some(dec!(9600)));
        // annuity enters total value at half weight
        assert_eq!(s.total_value, dec!(195510));
    }

    #[test]
    fn test_custom_bases_resolve_independently() {
        let mut input = beijing_input(dec!(30000), dec!(12));
        input.social_insurance_base = Some(dec!(8000));
        input.housing_fund_base = Some(dec!(2000));
        let output = calculate_all(&input).unwrap();
        let first = &output.result.monthly_details[0];

        assert_eq!(first.social_insurance_base, dec!(8000));
        // housing fund base clamps up to the Beijing floor
        assert_eq!(first.housing_fund_base, dec!(2540));
    }

    #[test]
    fn test_out_of_range_hf_rate_warns_and_clamps() {
        let mut input = beijing_input(dec!(10000), dec!(12));
        input.housing_fund_rate = Some(dec!(20));
        let output = calculate_all(&input).unwrap();

        assert!(!output.warnings.is_empty());
        assert_eq!(
            output.result.monthly_details[0].employee_insurance.housing_fund,
            dec!(1200)
        );
    }

    #[test]
    fn test_absent_hf_rate_uses_city_default() {
        let mut input = beijing_input(dec!(10000), dec!(12));
        input.city = CityId::Shanghai;
        input.housing_fund_rate = None;
        let output = calculate_all(&input).unwrap();

        // Shanghai defaults to 7%
        assert_eq!(
            output.result.monthly_details[0].employee_insurance.housing_fund,
            dec!(700)
        );
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_negative_base_rejected() {
        let result = calculate_all(&beijing_input(dec!(-1), dec!(12)));
        match result.unwrap_err() {
            SalaryEngineError::InvalidInput { field, .. } => assert_eq!(field, "monthly_base"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_short_year_rejected() {
        assert!(calculate_all(&beijing_input(dec!(10000), dec!(11))).is_err());
    }

    #[test]
    fn test_zero_base_degenerates_to_zero() {
        let output = calculate_all(&beijing_input(dec!(0), dec!(12))).unwrap();
        let s = &output.result;

        assert_eq!(s.total_tax, dec!(0));
        // contributions still accrue on the clamped-up minimum bases
        assert!(s.total_employee_insurance > dec!(0));
    }

    #[test]
    fn test_idempotent() {
        let input = beijing_input(dec!(23456.78), dec!(14));
        let a = calculate_all(&input).unwrap();
        let b = calculate_all(&input).unwrap();
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn test_input_deserializes_with_defaults() {
        let input: SalaryInput =
            serde_json::from_str(r#"{"monthly_base": "10000"}"#).unwrap();
        assert_eq!(input.city, CityId::Beijing);
        assert_eq!(input.total_months, dec!(12));
        assert_eq!(input.bonus_tax_mode, BonusTaxMode::Auto);
        assert_eq!(input.housing_fund_rate, None);
    }
}
