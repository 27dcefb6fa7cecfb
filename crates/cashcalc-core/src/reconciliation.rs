use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SalaryEngineError;
use crate::payroll::annual::resolve_housing_fund_rate;
use crate::payroll::contribution::employee_contributions;
use crate::payroll::withholding::run_withholding;
use crate::policy::{get_city_policy, CityId, BASIC_DEDUCTION_MONTHLY};
use crate::tax;
use crate::types::{round2, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::SalaryResult;

// Statutory haircuts on non-salary comprehensive income: labor and royalty
// income count at 80% after the expense deduction, royalties take a further
// 30% reduction.
pub const EXPENSE_DEDUCTION_SHARE: Rate = dec!(0.8);
pub const ROYALTY_REDUCTION_SHARE: Rate = dec!(0.7);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_city() -> CityId {
    CityId::Beijing
}

fn twelve_months() -> Decimal {
    dec!(12)
}

/// Inputs for the year-end settlement estimate: the salary picture plus the
/// other comprehensive-income categories the withholding agent never saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationInput {
    #[serde(default = "default_city")]
    pub city: CityId,
    pub monthly_base: Money,
    #[serde(default = "twelve_months")]
    pub total_months: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housing_fund_rate: Option<Percent>,
    #[serde(default)]
    pub additional_deduction: Money,
    /// Other comprehensive income reported at face value.
    #[serde(default)]
    pub other_income: Money,
    #[serde(default)]
    pub labor_income: Money,
    #[serde(default)]
    pub royalty_income: Money,
    /// Extra itemized deductions claimed only at settlement time.
    #[serde(default)]
    pub itemized_deductions: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub annual_gross: Money,
    pub annual_insurance: Money,
    pub annual_basic_deduction: Money,
    pub annual_additional_deduction: Money,
    /// Non-salary income after haircuts, combined.
    pub annual_other_income: Money,
    pub labor_after_deduction: Money,
    pub royalty_after_deduction: Money,
    pub total_taxable_income: Money,
    pub annual_tax_due: Money,
    pub withheld_salary_tax: Money,
    pub withheld_bonus_tax: Money,
    pub total_withheld: Money,
    /// Positive means tax owed at settlement, negative means a refund.
    pub difference: Money,
    pub marginal_rate: Rate,
    pub effective_rate: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Estimates the annual settlement: recomputes the true tax on total
/// comprehensive income and compares it with what withholding collected
/// during the year (cumulative salary withholding plus the separate-regime
/// bonus tax).
pub fn reconcile_annual_tax(
    input: &ReconciliationInput,
) -> SalaryResult<ComputationOutput<ReconciliationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

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

    let policy = get_city_policy(input.city);
    let hf_rate = resolve_housing_fund_rate(input.housing_fund_rate, &policy, &mut warnings);

    let si_base = policy.social_insurance.base.clamp(input.monthly_base);
    let hf_base = policy.housing_fund.base.clamp(input.monthly_base);
    let employee_ins = employee_contributions(si_base, hf_base, hf_rate, &policy);
    let annual_insurance = round2(employee_ins.total * dec!(12));

    // What withholding actually collected during the year.
    let run = run_withholding(input.monthly_base, employee_ins.total, input.additional_deduction);
    let withheld_salary_tax = round2(run.cumulative_tax_paid);

    let bonus_amount = round2(input.monthly_base * (input.total_months - dec!(12)).max(Decimal::ZERO));
    let withheld_bonus_tax = tax::bonus_tax_separate(bonus_amount);

    // The settlement view of the same year.
    let annual_salary_gross = round2(input.monthly_base * dec!(12));
    let annual_gross = round2(annual_salary_gross + bonus_amount);
    let annual_basic_deduction = round2(BASIC_DEDUCTION_MONTHLY * dec!(12));
    let annual_additional_deduction = round2(input.additional_deduction * dec!(12));

    let labor_after_deduction = if input.labor_income > Decimal::ZERO {
        round2(input.labor_income * EXPENSE_DEDUCTION_SHARE)
    } else {
        Decimal::ZERO
    };
    let royalty_after_deduction = if input.royalty_income > Decimal::ZERO {
        round2(input.royalty_income * EXPENSE_DEDUCTION_SHARE * ROYALTY_REDUCTION_SHARE)
    } else {
        Decimal::ZERO
    };
    let other_income = round2(input.other_income);

    let total_taxable_income = round2(
        (annual_gross + other_income + labor_after_deduction + royalty_after_deduction
            - annual_insurance
            - annual_basic_deduction
            - annual_additional_deduction
            - input.itemized_deductions)
            .max(Decimal::ZERO),
    );

    let annual_tax_due = tax::cumulative_tax(total_taxable_income);
    let total_withheld = round2(withheld_salary_tax + withheld_bonus_tax);
    let difference = round2(annual_tax_due - total_withheld);

    let marginal_rate = if total_taxable_income > Decimal::ZERO {
        tax::find_tax_bracket(total_taxable_income).rate
    } else {
        Decimal::ZERO
    };
    let effective_rate = if annual_gross > Decimal::ZERO {
        round2(annual_tax_due / annual_gross * dec!(100))
    } else {
        Decimal::ZERO
    };

    let result = ReconciliationResult {
        annual_gross,
        annual_insurance,
        annual_basic_deduction,
        annual_additional_deduction,
        annual_other_income: round2(other_income + labor_after_deduction + royalty_after_deduction),
        labor_after_deduction,
        royalty_after_deduction,
        total_taxable_income,
        annual_tax_due,
        withheld_salary_tax,
        withheld_bonus_tax,
        total_withheld,
        difference,
        marginal_rate,
        effective_rate,
    };

    let assumptions = serde_json::json!({
        "city": input.city,
        "monthly_base": input.monthly_base.to_string(),
        "total_months": input.total_months.to_string(),
        "housing_fund_rate": hf_rate.to_string(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Year-end settlement: annual tax on total comprehensive income versus tax withheld",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn salary_only(monthly_base: Money, total_months: Decimal) -> ReconciliationInput {
        ReconciliationInput {
            city: CityId::Beijing,
            monthly_base,
            total_months,
            housing_fund_rate: Some(dec!(12)),
            additional_deduction: dec!(0),
            other_income: dec!(0),
            labor_income: dec!(0),
            royalty_income: dec!(0),
            itemized_deductions: dec!(0),
        }
    }

    #[test]
    fn test_bonus_merger_creates_payment_due() {
        // 20000 x 15 in Beijing: the separate-regime bonus withholding is
        // cheaper than folding 60000 into annual income, so settlement on
        // merged income shows tax still owed
        let output = reconcile_annual_tax(&salary_only(dec!(20000), dec!(15))).unwrap();
        let r = &output.result;

        assert_eq!(r.annual_gross, dec!(300000));
        assert_eq!(r.annual_insurance, dec!(54000));
        assert_eq!(r.annual_basic_deduction, dec!(60000));
        assert_eq!(r.total_taxable_income, dec!(186000));
        assert_eq!(r.annual_tax_due, dec!(20280));
        assert_eq!(r.withheld_salary_tax, dec!(10080));
        assert_eq!(r.withheld_bonus_tax, dec!(5790));
        assert_eq!(r.total_withheld, dec!(15870));
        assert_eq!(r.difference, dec!(4410));
        assert_eq!(r.marginal_rate, dec!(0.20));
        assert_eq!(r.effective_rate, dec!(6.76));
    }

    #[test]
    fn test_salary_only_year_settles_to_zero() {
        // no bonus and no other income: cumulative withholding already
        // matches the annual liability to the cent
        let output = reconcile_annual_tax(&salary_only(dec!(20000), dec!(12))).unwrap();
        let r = &output.result;

        assert_eq!(r.withheld_bonus_tax, dec!(0));
        assert_eq!(r.annual_tax_due, r.withheld_salary_tax);
        assert_eq!(r.difference, dec!(0));
    }

    #[test]
    fn test_labor_and_royalty_haircuts() {
        let mut input = salary_only(dec!(20000), dec!(12));
        input.labor_income = dec!(10000);
        input.royalty_income = dec!(10000);
        input.other_income = dec!(5000);
        let output = reconcile_annual_tax(&input).unwrap();
        let r = &output.result;

        assert_eq!(r.labor_after_deduction, dec!(8000));
        assert_eq!(r.royalty_after_deduction, dec!(5600));
        assert_eq!(r.annual_other_income, dec!(18600));
        // extra income is taxed but nothing extra was withheld
        assert!(r.difference > dec!(0));
    }

    #[test]
    fn test_itemized_deductions_can_produce_refund() {
        let mut input = salary_only(dec!(20000), dec!(12));
        input.itemized_deductions = dec!(24000);
        let output = reconcile_annual_tax(&input).unwrap();
        let r = &output.result;

        // 126000 taxable shrinks to 102000, due 7680 vs 10080 withheld
        assert_eq!(r.total_taxable_income, dec!(102000));
        assert_eq!(r.annual_tax_due, dec!(7680));
        assert_eq!(r.difference, dec!(-2400));
    }

    #[test]
    fn test_low_income_fully_exempt() {
        let output = reconcile_annual_tax(&salary_only(dec!(5000), dec!(12))).unwrap();
        let r = &output.result;

        assert_eq!(r.total_taxable_income, dec!(0));
        assert_eq!(r.annual_tax_due, dec!(0));
        assert_eq!(r.marginal_rate, dec!(0));
        assert_eq!(r.effective_rate, dec!(0));
    }
}
