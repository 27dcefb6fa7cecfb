use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::policy::BASIC_DEDUCTION_MONTHLY;
use crate::tax;
use crate::types::{round2, Money};

/// Months covered by one withholding pass. Salary beyond the twelfth month
/// is bonus pay and taxed by the bonus regimes, not here.
pub const WITHHOLDING_MONTHS: u32 = 12;

/// One month of the cumulative-withholding pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithholdingMonth {
    pub month: u32,
    pub taxable_income: Money,
    /// Year-to-date taxable income as reported, clamped at zero.
    pub cumulative_taxable_income: Money,
    pub cumulative_tax: Money,
    pub monthly_tax: Money,
    pub net_salary: Money,
}

/// Result of a 12-month withholding pass.
#[derive(Debug, Clone, PartialEq)]
pub struct WithholdingRun {
    pub months: Vec<WithholdingMonth>,
    /// Running taxable income after month 12. Deliberately NOT clamped at
    /// zero: a deduction surplus carries forward into the bonus-combination
    /// decision exactly as the withholding agent would report it.
    pub cumulative_taxable_income: Money,
    pub cumulative_tax_paid: Money,
}

/// Runs the statutory cumulative-withholding method over twelve months of
/// identical gross pay.
///
/// Each month the year-to-date taxable income grows by
/// `gross − 5000 − insurance − additional deduction`; the month's tax is the
/// increase in cumulative liability, floored at zero so an early-year
/// deduction surplus is never refunded mid-year. Chronically negative
/// taxable income simply withholds nothing all year.
pub fn run_withholding(
    monthly_gross: Money,
    monthly_insurance: Money,
    additional_deduction: Money,
) -> WithholdingRun {
    let mut cumulative_taxable_income = Decimal::ZERO;
    let mut cumulative_tax_paid = Decimal::ZERO;
    let mut months = Vec::with_capacity(WITHHOLDING_MONTHS as usize);

    for month in 1..=WITHHOLDING_MONTHS {
        let month_taxable =
            monthly_gross - BASIC_DEDUCTION_MONTHLY - monthly_insurance - additional_deduction;
        cumulative_taxable_income += month_taxable;
        let effective_cumulative = cumulative_taxable_income.max(Decimal::ZERO);

        let cumulative_due = tax::cumulative_tax(effective_cumulative);
        let monthly_tax = round2((cumulative_due - cumulative_tax_paid).max(Decimal::ZERO));
        cumulative_tax_paid += monthly_tax;

        let net_salary = round2(monthly_gross - monthly_insurance - monthly_tax);

        months.push(WithholdingMonth {
            month,
            taxable_income: round2(month_taxable),
            cumulative_taxable_income: round2(effective_cumulative),
            cumulative_tax: round2(cumulative_tax_paid),
            monthly_tax,
            net_salary,
        });
    }

    WithholdingRun {
        months,
        cumulative_taxable_income,
        cumulative_tax_paid,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_first_bracket_year() {
        // 10000 gross, 2250 insurance: 2750 taxable per month, cumulative
        // income stays inside the 3% bracket all year
        let run = run_withholding(dec!(10000), dec!(2250), dec!(0));

        assert_eq!(run.months.len(), 12);
        for m in &run.months {
            assert_eq!(m.monthly_tax, dec!(82.50));
            assert_eq!(m.net_salary, dec!(7667.50));
        }
        assert_eq!(run.months[0].cumulative_taxable_income, dec!(2750));
        assert_eq!(run.months[11].cumulative_taxable_income, dec!(33000));
        assert_eq!(run.cumulative_tax_paid, dec!(990));
        assert_eq!(run.cumulative_taxable_income, dec!(33000));
    }

    #[test]
    fn test_bracket_crossing_mid_year() {
        // 25000 gross, 5625 insurance: 14375 taxable per month, crossing the
        // 36000 bound in month 3
        let run = run_withholding(dec!(25000), dec!(5625), dec!(0));

        assert_eq!(run.months[0].monthly_tax, dec!(431.25));
        assert_eq!(run.months[1].monthly_tax, dec!(431.25));
        // month 3: cumulative 43125 at 10% minus 2520 = 1792.50 due
        assert_eq!(run.months[2].monthly_tax, dec!(930));
        assert_eq!(run.cumulative_tax_paid, dec!(17580));
    }

    #[test]
    fn test_monthly_tax_sums_to_cumulative() {
        let run = run_withholding(dec!(25000), dec!(5625), dec!(1000));
        let sum: Money = run.months.iter().map(|m| m.monthly_tax).sum();
        assert_eq!(sum, run.cumulative_tax_paid);
        for m in &run.months {
            assert!(m.monthly_tax >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_deductions_exceed_gross_all_year() {
        // 6000 gross with the SI base clamped up to 7162: 1472.01 insurance,
        // taxable is negative every month and nothing is ever withheld
        let run = run_withholding(dec!(6000), dec!(1472.01), dec!(0));

        for m in &run.months {
            assert_eq!(m.monthly_tax, dec!(0));
            assert_eq!(m.cumulative_taxable_income, dec!(0));
            assert_eq!(m.net_salary, dec!(4527.99));
        }
        assert_eq!(run.cumulative_tax_paid, dec!(0));
        // the raw running total keeps the deficit
        assert_eq!(run.cumulative_taxable_income, dec!(-5664.12));
    }

    #[test]
    fn test_additional_deduction_lowers_tax() {
        let without = run_withholding(dec!(20000), dec!(4500), dec!(0));
        let with = run_withholding(dec!(20000), dec!(4500), dec!(2000));
        assert!(with.cumulative_tax_paid < without.cumulative_tax_paid);
        assert_eq!(without.cumulative_tax_paid, dec!(10080));
    }
}
