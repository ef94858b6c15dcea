pub mod analyzer;
pub mod cost;
pub mod types;

pub use analyzer::{FeeInputs, analyze, classify, daily_fees};
pub use cost::{CostBenefit, break_even_hours, rebalance_cost_usd};
pub use types::{RebalanceAnalysis, RebalancePriority, RebalanceReason, RebalanceRecord};
