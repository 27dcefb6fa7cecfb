use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SalaryEngineError;
use crate::types::{Money, Percent, Rate};
use crate::SalaryResult;

// ---------------------------------------------------------------------------
// City identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityId {
    Beijing,
    Shanghai,
    Guangzhou,
    Shenzhen,
    Hangzhou,
    Chengdu,
    Nanjing,
    Wuhan,
    Suzhou,
    Tianjin,
}

pub const CITY_LIST: [CityId; 10] = [
    CityId::Beijing,
    CityId::Shanghai,
    CityId::Guangzhou,
    CityId::Shenzhen,
    CityId::Hangzhou,
    CityId::Chengdu,
    CityId::Nanjing,
    CityId::Wuhan,
    CityId::Suzhou,
    CityId::Tianjin,
];

impl CityId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CityId::Beijing => "beijing",
            CityId::Shanghai => "shanghai",
            CityId::Guangzhou => "guangzhou",
            CityId::Shenzhen => "shenzhen",
            CityId::Hangzhou => "hangzhou",
            CityId::Chengdu => "chengdu",
            CityId::Nanjing => "nanjing",
            CityId::Wuhan => "wuhan",
            CityId::Suzhou => "suzhou",
            CityId::Tianjin => "tianjin",
        }
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CityId {
    type Err = SalaryEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beijing" => Ok(CityId::Beijing),
            "shanghai" => Ok(CityId::Shanghai),
            "guangzhou" => Ok(CityId::Guangzhou),
            "shenzhen" => Ok(CityId::Shenzhen),
            "hangzhou" => Ok(CityId::Hangzhou),
            "chengdu" => Ok(CityId::Chengdu),
            "nanjing" => Ok(CityId::Nanjing),
            "wuhan" => Ok(CityId::Wuhan),
            "suzhou" => Ok(CityId::Suzhou),
            "tianjin" => Ok(CityId::Tianjin),
            other => Err(SalaryEngineError::UnknownCity(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaseRange {
    pub min: Money,
    pub max: Money,
}

impl BaseRange {
    pub fn clamp(&self, value: Money) -> Money {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentRange {
    pub min: Percent,
    pub max: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmployeeRates {
    pub pension: Rate,
    pub medical: Rate,
    pub unemployment: Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmployerRates {
    pub pension: Rate,
    pub medical: Rate,
    pub unemployment: Rate,
    pub injury: Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SocialInsurancePolicy {
    pub base: BaseRange,
    pub employee: EmployeeRates,
    pub employer: EmployerRates,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HousingFundPolicy {
    pub base: BaseRange,
    pub rate_range: PercentRange,
    pub default_rate: Percent,
}

impl HousingFundPolicy {
    /// Resolve a requested housing-fund rate: absent means the city default,
    /// out-of-range values are clamped into the city's permitted range.
    pub fn resolve_rate(&self, requested: Option<Percent>) -> Percent {
        match requested {
            Some(rate) => rate.clamp(self.rate_range.min, self.rate_range.max),
            None => self.default_rate,
        }
    }
}

/// Per-city contribution parameters, as published by the municipal human
/// resources and social security bureaus for the 2025 policy year.
#[derive(Debug, Clone, Serialize)]
pub struct CityPolicy {
    pub id: CityId,
    pub name: String,
    pub short_name: String,
    pub policy_year: String,
    pub policy_period: String,
    pub social_insurance: SocialInsurancePolicy,
    pub housing_fund: HousingFundPolicy,
}

// ---------------------------------------------------------------------------
// Tax brackets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxBracket {
    /// Inclusive upper bound of the bracket; the last bracket is unbounded.
    pub upper: Money,
    pub rate: Rate,
    pub deduction: Money,
}

/// Monthly basic deduction for individual income tax (5000 yuan).
pub const BASIC_DEDUCTION_MONTHLY: Money = dec!(5000);

/// Seven-level progressive table for cumulative withholding, annual scale.
pub const TAX_BRACKETS: [TaxBracket; 7] = [
    TaxBracket { upper: dec!(36000), rate: dec!(0.03), deduction: dec!(0) },
    TaxBracket { upper: dec!(144000), rate: dec!(0.10), deduction: dec!(2520) },
    TaxBracket { upper: dec!(300000), rate: dec!(0.20), deduction: dec!(16920) },
    TaxBracket { upper: dec!(420000), rate: dec!(0.25), deduction: dec!(31920) },
    TaxBracket { upper: dec!(660000), rate: dec!(0.30), deduction: dec!(52920) },
    TaxBracket { upper: dec!(960000), rate: dec!(0.35), deduction: dec!(85920) },
    TaxBracket { upper: Decimal::MAX, rate: dec!(0.45), deduction: dec!(181920) },
];

/// Bracket table for the standalone year-end-bonus regime. Same rates, but
/// bounds are on the monthly-average (bonus / 12) scale.
pub const BONUS_TAX_BRACKETS: [TaxBracket; 7] = [
    TaxBracket { upper: dec!(3000), rate: dec!(0.03), deduction: dec!(0) },
    TaxBracket { upper: dec!(12000), rate: dec!(0.10), deduction: dec!(210) },
    TaxBracket { upper: dec!(25000), rate: dec!(0.20), deduction: dec!(1410) },
    TaxBracket { upper: dec!(35000), rate: dec!(0.25), deduction: dec!(2660) },
    TaxBracket { upper: dec!(55000), rate: dec!(0.30), deduction: dec!(4410) },
    TaxBracket { upper: dec!(80000), rate: dec!(0.35), deduction: dec!(7160) },
    TaxBracket { upper: Decimal::MAX, rate: dec!(0.45), deduction: dec!(15160) },
];

// ---------------------------------------------------------------------------
// Policy lookup
// ---------------------------------------------------------------------------

/// Returns the compiled-in policy for a city. Total over the supported set;
/// string ids go through [`find_city_policy`] instead.
pub fn get_city_policy(city: CityId) -> CityPolicy {
    match city {
        CityId::Beijing => CityPolicy {
            id: CityId::Beijing,
            name: "北京市".to_string(),
            short_name: "北京".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(7162), max: dec!(35811) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.005),
                },
                employer: EmployerRates {
                    pension: dec!(0.16),
                    medical: dec!(0.1037),
                    unemployment: dec!(0.005),
                    injury: dec!(0.002),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2540), max: dec!(35811) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(12),
            },
        },
        CityId::Shanghai => CityPolicy {
            id: CityId::Shanghai,
            name: "上海市".to_string(),
            short_name: "上海".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(7384), max: dec!(36921) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.005),
                },
                employer: EmployerRates {
                    pension: dec!(0.16),
                    medical: dec!(0.095),
                    unemployment: dec!(0.005),
                    injury: dec!(0.0016),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2690), max: dec!(36921) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(7),
            },
        },
        CityId::Guangzhou => CityPolicy {
            id: CityId::Guangzhou,
            name: "广州市".to_string(),
            short_name: "广州".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(5284), max: dec!(27501) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.002),
                },
                employer: EmployerRates {
                    pension: dec!(0.14),
                    medical: dec!(0.055),
                    unemployment: dec!(0.0032),
                    injury: dec!(0.002),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2300), max: dec!(41472) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(12),
            },
        },
        CityId::Shenzhen => CityPolicy {
            id: CityId::Shenzhen,
            name: "深圳市".to_string(),
            short_name: "深圳".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(2360), max: dec!(27501) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.003),
                },
                employer: EmployerRates {
                    pension: dec!(0.14),
                    medical: dec!(0.05),
                    unemployment: dec!(0.007),
                    injury: dec!(0.002),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2360), max: dec!(41190) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(5),
            },
        },
        CityId::Hangzhou => CityPolicy {
            id: CityId::Hangzhou,
            name: "杭州市".to_string(),
            short_name: "杭州".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(4812), max: dec!(24060) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.005),
                },
                employer: EmployerRates {
                    pension: dec!(0.14),
                    medical: dec!(0.095),
                    unemployment: dec!(0.005),
                    injury: dec!(0.002),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2490), max: dec!(38322) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(12),
            },
        },
        CityId::Chengdu => CityPolicy {
            id: CityId::Chengdu,
            name: "成都市".to_string(),
            short_name: "成都".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(4246), max: dec!(21228) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.004),
                },
                employer: EmployerRates {
                    pension: dec!(0.16),
                    medical: dec!(0.069),
                    unemployment: dec!(0.006),
                    injury: dec!(0.002),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2280), max: dec!(30456) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(12),
            },
        },
        CityId::Nanjing => CityPolicy {
            id: CityId::Nanjing,
            name: "南京市".to_string(),
            short_name: "南京".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(4879), max: dec!(24396) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.005),
                },
                employer: EmployerRates {
                    pension: dec!(0.16),
                    medical: dec!(0.08),
                    unemployment: dec!(0.005),
                    injury: dec!(0.004),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2490), max: dec!(36000) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(12),
            },
        },
        CityId::Wuhan => CityPolicy {
            id: CityId::Wuhan,
            name: "武汉市".to_string(),
            short_name: "武汉".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(4494), max: dec!(22467) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.003),
                },
                employer: EmployerRates {
                    pension: dec!(0.16),
                    medical: dec!(0.08),
                    unemployment: dec!(0.007),
                    injury: dec!(0.004),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2210), max: dec!(29230) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(12),
            },
        },
        CityId::Suzhou => CityPolicy {
            id: CityId::Suzhou,
            name: "苏州市".to_string(),
            short_name: "苏州".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(4879), max: dec!(24396) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.005),
                },
                employer: EmployerRates {
                    pension: dec!(0.16),
                    medical: dec!(0.07),
                    unemployment: dec!(0.005),
                    injury: dec!(0.004),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2490), max: dec!(36000) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(12),
            },
        },
        CityId::Tianjin => CityPolicy {
            id: CityId::Tianjin,
            name: "天津市".to_string(),
            short_name: "天津".to_string(),
            policy_year: "2025".to_string(),
            policy_period: "2025.7 ~ 2026.6".to_string(),
            social_insurance: SocialInsurancePolicy {
                base: BaseRange { min: dec!(5310), max: dec!(26541) },
                employee: EmployeeRates {
                    pension: dec!(0.08),
                    medical: dec!(0.02),
                    unemployment: dec!(0.005),
                },
                employer: EmployerRates {
                    pension: dec!(0.16),
                    medical: dec!(0.09),
                    unemployment: dec!(0.005),
                    injury: dec!(0.002),
                },
            },
            housing_fund: HousingFundPolicy {
                base: BaseRange { min: dec!(2320), max: dec!(30420) },
                rate_range: PercentRange { min: dec!(5), max: dec!(12) },
                default_rate: dec!(11),
            },
        },
    }
}

/// String-keyed lookup for untyped boundaries (CLI flags, stored records).
pub fn find_city_policy(id: &str) -> SalaryResult<CityPolicy> {
    let city = CityId::from_str(id)?;
    Ok(get_city_policy(city))
}

/// All supported policies in display order.
pub fn all_city_policies() -> Vec<CityPolicy> {
    CITY_LIST.iter().map(|id| get_city_policy(*id)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_city_id_round_trip() {
        for city in CITY_LIST {
            assert_eq!(city.as_str().parse::<CityId>().unwrap(), city);
        }
    }

    #[test]
    fn test_unknown_city_error() {
        let err = "atlantis".parse::<CityId>().unwrap_err();
        match err {
            SalaryEngineError::UnknownCity(id) => assert_eq!(id, "atlantis"),
            other => panic!("Expected UnknownCity, got {:?}", other),
        }
    }

    #[test]
    fn test_find_city_policy() {
        let policy = find_city_policy("beijing").unwrap();
        assert_eq!(policy.id, CityId::Beijing);
        assert_eq!(policy.social_insurance.base.min, dec!(7162));
        assert_eq!(policy.social_insurance.base.max, dec!(35811));
        assert_eq!(policy.housing_fund.base.min, dec!(2540));
        assert_eq!(policy.housing_fund.default_rate, dec!(12));

        assert!(find_city_policy("moscow").is_err());
    }

    #[test]
    fn test_all_policies_well_formed() {
        let policies = all_city_policies();
        assert_eq!(policies.len(), 10);

        for p in policies {
            assert!(p.social_insurance.base.min <= p.social_insurance.base.max, "{}", p.id);
            assert!(p.housing_fund.base.min <= p.housing_fund.base.max, "{}", p.id);
            assert!(p.housing_fund.rate_range.min <= p.housing_fund.rate_range.max);
            assert!(p.housing_fund.default_rate >= p.housing_fund.rate_range.min);
            assert!(p.housing_fund.default_rate <= p.housing_fund.rate_range.max);

            for rate in [
                p.social_insurance.employee.pension,
                p.social_insurance.employee.medical,
                p.social_insurance.employee.unemployment,
                p.social_insurance.employer.pension,
                p.social_insurance.employer.medical,
                p.social_insurance.employer.unemployment,
                p.social_insurance.employer.injury,
            ] {
                assert!(rate >= dec!(0) && rate <= dec!(1), "{}: {}", p.id, rate);
            }
        }
    }

    #[test]
    fn test_bracket_bounds_strictly_increasing() {
        for table in [&TAX_BRACKETS, &BONUS_TAX_BRACKETS] {
            for pair in table.windows(2) {
                assert!(pair[0].upper < pair[1].upper);
            }
            assert_eq!(table[table.len() - 1].upper, Decimal::MAX);
        }
    }

    #[test]
    fn test_base_range_clamp() {
        let range = BaseRange { min: dec!(7162), max: dec!(35811) };
        assert_eq!(range.clamp(dec!(10000)), dec!(10000));
        assert_eq!(range.clamp(dec!(5000)), dec!(7162));
        assert_eq!(range.clamp(dec!(50000)), dec!(35811));
    }

    #[test]
    fn test_resolve_housing_fund_rate() {
        let policy = get_city_policy(CityId::Shanghai);
        assert_eq!(policy.housing_fund.resolve_rate(None), dec!(7));
        assert_eq!(policy.housing_fund.resolve_rate(Some(dec!(12))), dec!(12));
        assert_eq!(policy.housing_fund.resolve_rate(Some(dec!(15))), dec!(12));
        assert_eq!(policy.housing_fund.resolve_rate(Some(dec!(3))), dec!(5));
    }
}
