use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tax;
use crate::types::{round2, Money};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two statutory ways of taxing a year-end bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxRegime {
    /// Standalone taxation with the monthly-average bracket lookup.
    Separate,
    /// Merged into the year's comprehensive income.
    Combined,
}

/// Caller's choice of bonus regime. `Auto` resolves to whichever regime the
/// optimizer recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BonusTaxMode {
    Separate,
    Combined,
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTaxResult {
    pub bonus_amount: Money,
    pub separate_tax: Money,
    pub combined_tax: Money,
    pub recommended_mode: TaxRegime,
    pub separate_net_bonus: Money,
    pub combined_net_bonus: Money,
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Prices the bonus under both regimes and recommends the cheaper one.
/// Ties go to `Separate`, which also covers the zero-bonus case.
pub fn optimize_bonus_tax(bonus_amount: Money, cumulative_taxable_income: Money) -> BonusTaxResult {
    let separate_tax = tax::bonus_tax_separate(bonus_amount);
    let combined_tax =
        tax::bonus_tax_combined(cumulative_taxable_income.max(Decimal::ZERO), bonus_amount);

    let recommended_mode = if separate_tax <= combined_tax {
        TaxRegime::Separate
    } else {
        TaxRegime::Combined
    };

    BonusTaxResult {
        bonus_amount,
        separate_tax,
        combined_tax,
        recommended_mode,
        separate_net_bonus: round2(bonus_amount - separate_tax),
        combined_net_bonus: round2(bonus_amount - combined_tax),
    }
}

impl BonusTaxResult {
    /// Tax actually charged under the caller's chosen mode.
    pub fn effective_tax(&self, mode: BonusTaxMode) -> Money {
        match mode {
            BonusTaxMode::Separate => self.separate_tax,
            BonusTaxMode::Combined => self.combined_tax,
            BonusTaxMode::Auto => match self.recommended_mode {
                TaxRegime::Separate => self.separate_tax,
                TaxRegime::Combined => self.combined_tax,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
