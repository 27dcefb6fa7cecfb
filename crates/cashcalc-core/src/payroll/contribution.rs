use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::policy::{BaseRange, CityPolicy};
use crate::types::{round2, Money, Percent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Monthly employee-side contributions, one field per insurance line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceBreakdown {
    pub pension: Money,
    pub medical: Money,
    pub unemployment: Money,
    pub housing_fund: Money,
    pub total: Money,
}

/// Monthly employer-side contributions; the employer additionally carries
/// work-injury insurance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployerInsuranceBreakdown {
    pub pension: Money,
    pub medical: Money,
    pub unemployment: Money,
    pub injury: Money,
    pub housing_fund: Money,
    pub total: Money,
}

// ---------------------------------------------------------------------------
// Base resolution
// ---------------------------------------------------------------------------

/// Resolves a contribution base: a positive custom base wins, otherwise the
/// monthly base is used; either way the result is clamped into the policy
/// range. Social-insurance and housing-fund bases resolve independently and
/// may clamp against different ranges.
pub fn resolve_contribution_base(
    monthly_base: Money,
    custom_base: Option<Money>,
    range: &BaseRange,
) -> Money {
    match custom_base {
        Some(base) if base > Decimal::ZERO => range.clamp(base),
        _ => range.clamp(monthly_base),
    }
}

// ---------------------------------------------------------------------------
// Contribution breakdowns
// ---------------------------------------------------------------------------

/// Employee contributions for one month. Each component is rounded to the
/// cent on its own; the total is the sum of the rounded components, matching
/// how the lines appear on a payslip.
pub fn employee_contributions(
    si_base: Money,
    hf_base: Money,
    hf_rate: Percent,
    policy: &CityPolicy,
) -> InsuranceBreakdown {
    let rates = &policy.social_insurance.employee;
    let pension = round2(si_base * rates.pension);
    let medical = round2(si_base * rates.medical);
    let unemployment = round2(si_base * rates.unemployment);
    let housing_fund = round2(hf_base * (hf_rate / dec!(100)));
    InsuranceBreakdown {
        pension,
        medical,
        unemployment,
        housing_fund,
        total: round2(pension + medical + unemployment + housing_fund),
    }
}

/// Employer contributions for one month, same rounding discipline.
pub fn employer_contributions(
    si_base: Money,
    hf_base: Money,
    hf_rate: Percent,
    policy: &CityPolicy,
) -> EmployerInsuranceBreakdown {
    let rates = &policy.social_insurance.employer;
    let pension = round2(si_base * rates.pension);
    let medical = round2(si_base * rates.medical);
    let unemployment = round2(si_base * rates.unemployment);
    let injury = round2(si_base * rates.injury);
    let housing_fund = round2(hf_base * (hf_rate / dec!(100)));
    EmployerInsuranceBreakdown {
        pension,
        medical,
        unemployment,
        injury,
        housing_fund,
        total: round2(pension + medical + unemployment + injury + housing_fund),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
