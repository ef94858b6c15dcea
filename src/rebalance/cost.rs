use serde::Serialize;

use crate::rebalance::types::RebalanceAnalysis;
use crate::utils::format_hours;

const HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBenefit {
    pub net_daily_gain: f64,
    pub rebalance_cost_usd: f64,
    pub break_even_hours: f64,
    /// `"N/A"` when the rebalance never pays back.
    pub break_even_label: String,
}

impl CostBenefit {
    pub fn evaluate(current_daily_fees: f64, projected_daily_fees: f64, cost_usd: f64) -> Self {
        let hours = break_even_hours(current_daily_fees, projected_daily_fees, cost_usd);
        Self {
            net_daily_gain: projected_daily_fees - current_daily_fees,
            rebalance_cost_usd: cost_usd,
            break_even_hours: hours,
            break_even_label: format_hours(hours),
        }
    }

    pub fn from_analysis(analysis: &RebalanceAnalysis) -> Self {
        Self::evaluate(
            analysis.current_daily_fees,
            analysis.projected_daily_fees,
            analysis.rebalance_cost,
        )
    }

    pub fn pays_back(&self) -> bool {
        self.break_even_hours.is_finite()
    }
}

/// On-chain action cost in SOL converted to USD.
pub fn rebalance_cost_usd(cost_sol: f64, sol_usd: f64) -> f64 {
    cost_sol * sol_usd
}

/// Hours of extra fee income needed to cover `cost_usd`; `+∞` without a gain.
pub fn break_even_hours(current_daily_fees: f64, projected_daily_fees: f64, cost_usd: f64) -> f64 {
    let net = projected_daily_fees - current_daily_fees;
    if net > 0.0 {
        cost_usd / net * HOURS_PER_DAY
    } else {
        f64::INFINITY
    }
}
