pub mod annual;
pub mod bonus;
pub mod contribution;
pub mod cross_city;
pub mod withholding;
