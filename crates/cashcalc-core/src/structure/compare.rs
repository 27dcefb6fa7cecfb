use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SalaryEngineError;
use crate::structure::breakdown::{breakdown_of, validate_structure, SalaryStructure, StructureBreakdown};
use crate::types::{with_metadata, ComputationOutput};
use crate::SalaryResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferComparison {
    pub breakdowns: Vec<StructureBreakdown>,
    /// Index of the offer with the highest comprehensive value.
    pub best_index: usize,
}

/// Evaluates several offers side by side and picks the one with the highest
/// comprehensive value. Ties keep the earliest offer.
pub fn compare_offers(offers: &[SalaryStructure]) -> SalaryResult<ComputationOutput<OfferComparison>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if offers.is_empty() {
        return Err(SalaryEngineError::InsufficientData(
            "Offer comparison needs at least one offer".to_string(),
        ));
    }

    let mut breakdowns: Vec<StructureBreakdown> = Vec::with_capacity(offers.len());
    for offer in offers {
        validate_structure(offer)?;
        breakdowns.push(breakdown_of(offer));
    }

    let mut best_index = 0;
    for (i, b) in breakdowns.iter().enumerate().skip(1) {
        if b.comprehensive_value > breakdowns[best_index].comprehensive_value {
            best_index = i;
        }
    }

    let result = OfferComparison { breakdowns, best_index };

    let assumptions = serde_json::json!({
        "offer_count": offers.len(),
        "cities": offers.iter().map(|o| o.city).collect::<Vec<_>>(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Side-by-side structure breakdowns ranked by comprehensive value",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CityId;
    use crate::structure::breakdown::ContributionBaseKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn offer(monthly_base: Decimal, months: Decimal) -> SalaryStructure {
        SalaryStructure {
            city: CityId::Beijing,
            monthly_base,
            months,
            social_insurance_base_kind: ContributionBaseKind::Full,
            custom_social_insurance_base: None,
            housing_fund_base_kind: ContributionBaseKind::Full,
            custom_housing_fund_base: None,
            housing_fund_rate: Some(dec!(12)),
            alt_channel_ratio: dec!(0),
            alt_channel_fee_rate: dec!(0),
            annual_stock_value: dec!(0),
            stock_discount: dec!(70),
            special_deduction: dec!(0),
        }
    }

    #[test]
    fn test_empty_offers_rejected() {
        assert!(matches!(
            compare_offers(&[]).unwrap_err(),
            SalaryEngineError::InsufficientData(_)
        ));
    }

    #[test]
    fn test_best_offer_by_comprehensive_value() {
        let offers = vec![
            offer(dec!(20000), dec!(14)),
            offer(dec!(25000), dec!(12)),
            offer(dec!(22000), dec!(15)),
        ];
        let output = compare_offers(&offers).unwrap();
        let r = &output.result;

        assert_eq!(r.breakdowns.len(), 3);
        // 22000 x 15 grosses the most and wins on value too
        assert_eq!(r.best_index, 2);
        for pair in r.breakdowns.windows(2) {
            assert_ne!(pair[0].comprehensive_value, pair[1].comprehensive_value);
        }
    }

    #[test]
    fn test_stock_can_flip_the_ranking() {
        let cash_heavy = offer(dec!(30000), dec!(12));
        let mut stock_heavy = offer(dec!(28000), dec!(12));
        stock_heavy.annual_stock_value = dec!(200000);
        stock_heavy.stock_discount = dec!(70);

        let output = compare_offers(&[cash_heavy, stock_heavy]).unwrap();
        assert_eq!(output.result.best_index, 1);
    }

    #[test]
    fn test_tie_keeps_first_offer() {
        let output = compare_offers(&[offer(dec!(20000), dec!(13)), offer(dec!(20000), dec!(13))])
            .unwrap();
        assert_eq!(output.result.best_index, 0);
    }
}
