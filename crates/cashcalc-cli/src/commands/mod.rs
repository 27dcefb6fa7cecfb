pub mod annual;
pub mod cities;
pub mod convert;
pub mod recon;
pub mod structure;

use cashcalc_core::policy::CityId;
use cashcalc_core::payroll::bonus::BonusTaxMode;

/// Parse a city id, surfacing the engine's unknown-city error.
pub fn parse_city(id: &str) -> Result<CityId, Box<dyn std::error::Error>> {
    Ok(id.parse::<CityId>()?)
}

pub fn parse_bonus_mode(mode: &str) -> Result<BonusTaxMode, Box<dyn std::error::Error>> {
    match mode {
        "separate" => Ok(BonusTaxMode::Separate),
        "combined" => Ok(BonusTaxMode::Combined),
        "auto" => Ok(BonusTaxMode::Auto),
        other => Err(format!("Unknown bonus tax mode '{}' (expected separate, combined or auto)", other).into()),
    }
}
