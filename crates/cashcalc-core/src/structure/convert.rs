use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::structure::breakdown::{breakdown_of, validate_structure, SalaryStructure, StructureBreakdown};
use crate::types::{round2, with_metadata, ComputationOutput, Money, Percent};
use crate::SalaryResult;

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Search bounds for the monthly base, in whole yuan.
pub const SOLVER_BASE_LOWER_BOUND: i64 = 0;
pub const SOLVER_BASE_UPPER_BOUND: i64 = 500_000;

/// Fixed iteration cap. Halving [0, 500000] reaches single-yuan precision in
/// under 20 steps; the cap keeps the solve deterministic and bounded rather
/// than chasing a floating tolerance.
pub const SOLVER_MAX_ITERATIONS: u32 = 50;

/// Finds the smallest whole-yuan monthly base whose breakdown reaches the
/// target comprehensive value, by bisection. The template's own
/// `monthly_base` is ignored.
///
/// Relies on comprehensive value being non-decreasing in the base. A target
/// above what 500000/month can produce saturates silently at the upper
/// bound; callers that care inspect the returned base against the bound.
pub fn solve_monthly_base(template: &SalaryStructure, target_comprehensive_value: Money) -> Money {
    let mut lo = SOLVER_BASE_LOWER_BOUND;
    let mut hi = SOLVER_BASE_UPPER_BOUND;
    let mut probe = template.clone();

    for _ in 0..SOLVER_MAX_ITERATIONS {
        let mid = (lo + hi) / 2;
        if mid == lo {
            break;
        }
        probe.monthly_base = Decimal::from(mid);
        let breakdown = breakdown_of(&probe);
        if breakdown.comprehensive_value < target_comprehensive_value {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Decimal::from(hi)
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub target_monthly_base: Money,
    pub current_breakdown: StructureBreakdown,
    pub target_breakdown: StructureBreakdown,
    pub raise_percent: Percent,
    pub cash_raise_percent: Percent,
    pub employer_cost_change_percent: Percent,
}

/// Answers "what monthly base under the target structure is worth
/// `raise_percent` more than the current package", then reports how cash
/// and employer cost actually move at that base.
pub fn convert_salary_structure(
    current: &SalaryStructure,
    target_template: &SalaryStructure,
    raise_percent: Percent,
) -> SalaryResult<ComputationOutput<ConversionResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_structure(current)?;
    validate_structure(target_template)?;

    let current_breakdown = breakdown_of(current);
    let target_comprehensive_value =
        round2(current_breakdown.comprehensive_value * (Decimal::ONE + raise_percent / dec!(100)));

    let target_monthly_base = solve_monthly_base(target_template, target_comprehensive_value);

    let mut target_structure = target_template.clone();
    target_structure.monthly_base = target_monthly_base;
    let target_breakdown = breakdown_of(&target_structure);

    if target_monthly_base >= Decimal::from(SOLVER_BASE_UPPER_BOUND)
        && target_breakdown.comprehensive_value < target_comprehensive_value
    {
        warnings.push(format!(
            "Target comprehensive value {} is not reachable within the {} yuan/month search bound; result saturated",
            target_comprehensive_value, SOLVER_BASE_UPPER_BOUND,
        ));
    }

    let cash_raise_percent = if current_breakdown.take_home_cash > Decimal::ZERO {
        round2(
            (target_breakdown.take_home_cash - current_breakdown.take_home_cash)
                / current_breakdown.take_home_cash
                * dec!(100),
        )
    } else {
        Decimal::ZERO
    };

    let employer_cost_change_percent = if current_breakdown.employer_total_cost > Decimal::ZERO {
        round2(
            (target_breakdown.employer_total_cost - current_breakdown.employer_total_cost)
                / current_breakdown.employer_total_cost
                * dec!(100),
        )
    } else {
        Decimal::ZERO
    };

    let result = ConversionResult {
        target_monthly_base,
        current_breakdown,
        target_breakdown,
        raise_percent,
        cash_raise_percent,
        employer_cost_change_percent,
    };

    let assumptions = serde_json::json!({
        "current_city": current.city,
        "target_city": target_template.city,
        "raise_percent": raise_percent.to_string(),
        "target_comprehensive_value": target_comprehensive_value.to_string(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bisection over the monthly base to match a raised comprehensive-value target",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
