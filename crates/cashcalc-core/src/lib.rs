pub mod error;
pub mod policy;
pub mod tax;
pub mod types;

pub mod payroll;

#[cfg(feature = "structure")]
pub mod structure;

#[cfg(feature = "reconciliation")]
pub mod reconciliation;

pub use error::SalaryEngineError;
pub use types::*;

/// Standard result type for all engine operations
pub type SalaryResult<T> = Result<T, SalaryEngineError>;
