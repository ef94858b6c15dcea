//! Rebalance urgency for an existing position.

use crate::models::{PoolSnapshot, Position};
use crate::rebalance::cost::break_even_hours;
use crate::rebalance::types::{RebalanceAnalysis, RebalancePriority};

/// Funded bins below this share of the position's span mark it HIGH.
const MIN_FUNDED_SHARE: f64 = 0.4;
const MEDIUM_DISTANCE: f64 = 10.0;
const LOW_DISTANCE: f64 = 5.0;

const DEFAULT_IN_RANGE_TIME: f64 = 0.95;
const DEFAULT_OUT_OF_RANGE_TIME: f64 = 0.65;

/// USD prices and fee telemetry used to value the position.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeInputs {
    pub x_usd: f64,
    pub y_usd: f64,
    /// Fraction of time the position was in range, when tracked.
    pub time_in_range: Option<f64>,
    /// Multiplier from current to projected daily fees.
    pub fee_uplift: f64,
    pub rebalance_cost_usd: f64,
}

/// Priority and a human-readable reason, from position geometry alone.
pub fn classify(position: &Position) -> (RebalancePriority, String) {
    let range = position.range();
    let active = position.active_bin_id;
    if !range.contains(active) {
        let side = if active < range.min_bin_id { "below" } else { "above" };
        return (
            RebalancePriority::Critical,
            format!(
                "active bin {active} is {side} range [{}, {}], position earns no fees",
                range.min_bin_id, range.max_bin_id
            ),
        );
    }

    if let Some(share) = funded_share(position) {
        if share < MIN_FUNDED_SHARE {
            return (
                RebalancePriority::High,
                format!(
                    "only {:.0}% of the {} bins still hold liquidity",
                    share * 100.0,
                    range.span()
                ),
            );
        }
    }

    let distance = (active as f64 - range.center()).abs();
    if distance > MEDIUM_DISTANCE {
        (
            RebalancePriority::Medium,
            format!("active bin drifted {distance:.1} bins from center"),
        )
    } else if distance > LOW_DISTANCE {
        (
            RebalancePriority::Low,
            format!("active bin {distance:.1} bins from center"),
        )
    } else {
        (
            RebalancePriority::None,
            "position is centered around the active bin".to_string(),
        )
    }
}

/// Share of the position's bins holding any liquidity; `None` without per-bin data.
fn funded_share(position: &Position) -> Option<f64> {
    if position.bins.is_empty() {
        return None;
    }
    let range = position.range();
    let span = range.span();
    if span == 0 {
        return None;
    }
    let funded = position
        .bins
        .iter()
        .filter(|b| range.contains(b.bin_id) && (b.x_amount > 0.0 || b.y_amount > 0.0))
        .count();
    Some(funded as f64 / span as f64)
}

/// Expected fee income per day for a position worth `value_usd`.
pub fn daily_fees(value_usd: f64, apr_percent: Option<f64>, time_in_range: f64) -> f64 {
    let Some(apr) = apr_percent.filter(|a| a.is_finite() && *a > 0.0) else {
        return 0.0;
    };
    value_usd * apr / 100.0 / 365.0 * time_in_range
}

pub fn analyze(position: &Position, pool: &PoolSnapshot, inputs: &FeeInputs) -> RebalanceAnalysis {
    let (priority, reason) = classify(position);
    let in_range = position.is_in_range();
    let time_in_range = inputs
        .time_in_range
        .filter(|t| t.is_finite())
        .map(|t| t.clamp(0.0, 1.0))
        .unwrap_or(if in_range {
            DEFAULT_IN_RANGE_TIME
        } else {
            DEFAULT_OUT_OF_RANGE_TIME
        });

    let value = position.value_usd(inputs.x_usd, inputs.y_usd);
    let current_daily_fees = daily_fees(value, pool.apr, time_in_range);
    let projected_daily_fees = current_daily_fees * inputs.fee_uplift;

    RebalanceAnalysis {
        priority,
        should_rebalance: priority.should_rebalance(),
        reason,
        current_in_range: in_range,
        distance_from_center: (position.active_bin_id as f64 - position.range().center()).abs(),
        current_daily_fees,
        projected_daily_fees,
        rebalance_cost: inputs.rebalance_cost_usd,
        break_even_hours: break_even_hours(
            current_daily_fees,
            projected_daily_fees,
            inputs.rebalance_cost_usd,
        ),
    }
}
