use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::policy::{TaxBracket, BONUS_TAX_BRACKETS, TAX_BRACKETS};
use crate::types::{round2, Money};

/// Finds the bracket for a cumulative taxable income: the first whose
/// inclusive upper bound covers it.
pub fn find_tax_bracket(cumulative_income: Money) -> &'static TaxBracket {
    for bracket in &TAX_BRACKETS {
        if cumulative_income <= bracket.upper {
            return bracket;
        }
    }
    &TAX_BRACKETS[TAX_BRACKETS.len() - 1]
}

/// Cumulative tax due on a year-to-date taxable income under the
/// quick-deduction form of the progressive table. Non-positive income owes
/// nothing.
pub fn cumulative_tax(cumulative_taxable_income: Money) -> Money {
    if cumulative_taxable_income <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let bracket = find_tax_bracket(cumulative_taxable_income);
    round2(cumulative_taxable_income * bracket.rate - bracket.deduction)
}

/// Year-end bonus tax under the standalone regime: the bracket is chosen by
/// the monthly average (bonus / 12), but the rate applies to the whole bonus
/// and the quick deduction is subtracted once.
pub fn bonus_tax_separate(bonus: Money) -> Money {
    if bonus <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let monthly_avg = bonus / dec!(12);
    for bracket in &BONUS_TAX_BRACKETS {
        if monthly_avg <= bracket.upper {
            return round2(bonus * bracket.rate - bracket.deduction);
        }
    }
    let last = &BONUS_TAX_BRACKETS[BONUS_TAX_BRACKETS.len() - 1];
    round2(bonus * last.rate - last.deduction)
}

/// Marginal tax on a bonus merged into comprehensive income: the increase in
/// cumulative tax when the bonus is added on top of the year's taxable
/// income.
pub fn bonus_tax_combined(cumulative_taxable_income: Money, bonus: Money) -> Money {
    let tax_without = cumulative_tax(cumulative_taxable_income);
    let tax_with = cumulative_tax(cumulative_taxable_income + bonus);
    round2(tax_with - tax_without)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cumulative_tax_first_bracket() {
        assert_eq!(cumulative_tax(dec!(2750)), dec!(82.50));
        assert_eq!(cumulative_tax(dec!(36000)), dec!(1080));
    }

    #[test]
    fn test_cumulative_tax_bracket_boundaries() {
        // 36000 is the last income taxed at a flat 3%
        assert_eq!(cumulative_tax(dec!(36000)), dec!(1080));
        assert_eq!(cumulative_tax(dec!(36001)), dec!(1080.10));
        // 144000 boundary: 10% bracket with 2520 quick deduction
        assert_eq!(cumulative_tax(dec!(144000)), dec!(11880));
        assert_eq!(cumulative_tax(dec!(144001)), dec!(11880.20));
    }

    #[test]
    fn test_cumulative_tax_top_bracket() {
        assert_eq!(cumulative_tax(dec!(1000000)), dec!(268080));
    }

    #[test]
    fn test_cumulative_tax_non_positive() {
        assert_eq!(cumulative_tax(dec!(0)), dec!(0));
        assert_eq!(cumulative_tax(dec!(-5000)), dec!(0));
    }

    #[test]
    fn test_cumulative_tax_monotonic() {
        let mut previous = Decimal::ZERO;
        let mut income = Decimal::ZERO;
        while income <= dec!(1200000) {
            let tax = cumulative_tax(income);
            assert!(tax >= previous, "tax decreased at income {}", income);
            previous = tax;
            income += dec!(1500);
        }
    }

    #[test]
    fn test_bonus_tax_separate_zero() {
        assert_eq!(bonus_tax_separate(dec!(0)), dec!(0));
        assert_eq!(bonus_tax_separate(dec!(-100)), dec!(0));
    }

    #[test]
    fn test_bonus_tax_separate_bracket_by_monthly_average() {
        // 30000 / 12 = 2500 falls in the 3% bracket
        assert_eq!(bonus_tax_separate(dec!(30000)), dec!(900));
        // 36000 / 12 = 3000 sits exactly on the first bound, still 3%
        assert_eq!(bonus_tax_separate(dec!(36000)), dec!(1080));
        // 36001 / 12 crosses into 10% with the 210 quick deduction
        assert_eq!(bonus_tax_separate(dec!(36001)), dec!(3390.10));
        // 75000 / 12 = 6250, 10% bracket
        assert_eq!(bonus_tax_separate(dec!(75000)), dec!(7290));
    }

    #[test]
    fn test_bonus_tax_combined_marginal() {
        // 33000 without bonus stays at 3%; adding 30000 crosses into 10%
        assert_eq!(bonus_tax_combined(dec!(33000), dec!(30000)), dec!(2790));
        assert_eq!(bonus_tax_combined(dec!(0), dec!(0)), dec!(0));
    }
}
