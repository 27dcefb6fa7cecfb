use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use cashcalc_core::structure::breakdown::SalaryStructure;
use cashcalc_core::structure::convert::convert_salary_structure;

use crate::input;

/// Arguments for the structure conversion solver
#[derive(Args)]
pub struct ConvertArgs {
    /// Path to a JSON file with the current structure
    #[arg(long)]
    pub current: Option<String>,

    /// Path to a JSON file with the target structure (its monthly base is ignored)
    #[arg(long)]
    pub target: Option<String>,

    /// Desired comprehensive-value raise in percent
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub raise: Decimal,

    /// Path to a combined JSON document {current, target, raise_percent}
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct ConvertRequest {
    current: SalaryStructure,
    target: SalaryStructure,
    #[serde(default)]
    raise_percent: Decimal,
}

pub fn run_convert(args: ConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ConvertRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let current_path = args
            .current
            .as_ref()
            .ok_or("--current is required (or provide --input)")?;
        let target_path = args
            .target
            .as_ref()
            .ok_or("--target is required (or provide --input)")?;
        ConvertRequest {
            current: input::file::read_json(current_path)?,
            target: input::file::read_json(target_path)?,
            raise_percent: args.raise,
        }
    };

    let result = convert_salary_structure(&request.current, &request.target, request.raise_percent)?;
    Ok(serde_json::to_value(result)?)
}
