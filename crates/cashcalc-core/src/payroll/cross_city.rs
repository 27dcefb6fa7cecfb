use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SalaryEngineError;
use crate::payroll::annual::{calculate_all, AnnualSummary, SalaryInput};
use crate::policy::{get_city_policy, CityId};
use crate::types::{with_metadata, ComputationOutput, Percent};
use crate::SalaryResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityComparisonEntry {
    pub city: CityId,
    pub city_name: String,
    /// Rate actually applied, after clamping into the city's range.
    pub housing_fund_rate: Percent,
    pub summary: AnnualSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityComparison {
    pub entries: Vec<CityComparisonEntry>,
    /// Index of the city with the highest annual net cash.
    pub best_index: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Replays one salary package across several cities. The requested
/// housing-fund rate is clamped into each city's permitted range, so a 12%
/// Shanghai package still compares fairly against cities capped lower.
pub fn compare_across_cities(
    base_input: &SalaryInput,
    cities: &[CityId],
) -> SalaryResult<ComputationOutput<CityComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if cities.is_empty() {
        return Err(SalaryEngineError::InsufficientData(
            "City comparison needs at least one city".to_string(),
        ));
    }

    let mut entries: Vec<CityComparisonEntry> = Vec::with_capacity(cities.len());
    for city in cities {
        let mut input = base_input.clone();
        input.city = *city;

        let output = calculate_all(&input)?;
        for w in &output.warnings {
            warnings.push(format!("{}: {}", city, w));
        }

        let policy = get_city_policy(*city);
        entries.push(CityComparisonEntry {
            city: *city,
            city_name: policy.name.clone(),
            housing_fund_rate: policy.housing_fund.resolve_rate(base_input.housing_fund_rate),
            summary: output.result,
        });
    }

    // strict comparison so the earliest city wins ties
    let mut best_index = 0;
    for (i, entry) in entries.iter().enumerate().skip(1) {
        if entry.summary.total_net_cash > entries[best_index].summary.total_net_cash {
            best_index = i;
        }
    }

    let result = CityComparison { entries, best_index };

    let assumptions = serde_json::json!({
        "cities": cities,
        "monthly_base": base_input.monthly_base.to_string(),
        "total_months": base_input.total_months.to_string(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Same package replayed across city policies, ranked by annual net cash",
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
    use crate::payroll::bonus::BonusTaxMode;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn base_input(monthly_base: Decimal) -> SalaryInput {
        SalaryInput {
            city: CityId::Beijing,
            monthly_base,
            total_months: dec!(12),
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
    fn test_empty_city_list_rejected() {
        let result = compare_across_cities(&base_input(dec!(20000)), &[]);
        assert!(matches!(
            result.unwrap_err(),
            SalaryEngineError::InsufficientData(_)
        ));
    }

    #[test]
    fn test_shenzhen_beats_beijing_on_net_cash() {
        let output = compare_across_cities(
            &base_input(dec!(20000)),
            &[CityId::Beijing, CityId::Shenzhen],
        )
        .unwrap();
        let r = &output.result;

        assert_eq!(r.entries.len(), 2);
        // Beijing: 4500/month insurance, 10080 annual tax
        assert_eq!(r.entries[0].summary.total_net_cash, dec!(175920));
        // Shenzhen's lower unemployment rate leaves more cash despite more tax
        assert_eq!(r.entries[1].summary.total_net_cash, dec!(176352));
        assert_eq!(r.best_index, 1);
    }

    #[test]
    fn test_base_city_field_is_ignored() {
        let mut input = base_input(dec!(20000));
        input.city = CityId::Chengdu;
        let output = compare_across_cities(&input, &[CityId::Beijing]).unwrap();
        assert_eq!(output.result.entries[0].city, CityId::Beijing);
    }

    #[test]
    fn test_entry_reports_clamped_rate() {
        // requested 12% is fine everywhere today, a lowball 3% clamps up to 5%
        let mut input = base_input(dec!(20000));
        input.housing_fund_rate = Some(dec!(3));
        let output = compare_across_cities(&input, &[CityId::Beijing]).unwrap();
        assert_eq!(output.result.entries[0].housing_fund_rate, dec!(5));
        assert!(!output.warnings.is_empty());
    }
}
