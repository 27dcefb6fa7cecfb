use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Statutory rates expressed as decimals (0.08 = 8%). Never as percentages.
pub type Rate = Decimal;

/// User-facing rates on a 0–100 scale (12 = 12%), divided by 100 exactly once
/// at the point of use.
pub type Percent = Decimal;

/// Round to two decimal places, midpoint away from zero.
///
/// Applied after every intermediate monetary step, not only at the end. The
/// rounding points are a compatibility contract with published payslip
/// figures and must not be moved.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_midpoint_away_from_zero() {
        assert_eq!(round2(dec!(50.005)), dec!(50.01));
        assert_eq!(round2(dec!(82.504)), dec!(82.50));
        assert_eq!(round2(dec!(-50.005)), dec!(-50.01));
        assert_eq!(round2(dec!(1200)), dec!(1200));
    }
}
