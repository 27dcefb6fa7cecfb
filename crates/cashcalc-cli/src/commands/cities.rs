use serde_json::Value;

use cashcalc_core::policy::all_city_policies;

pub fn run_cities() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(all_city_policies())?)
}
