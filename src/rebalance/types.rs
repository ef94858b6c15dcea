use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::models::BinRange;

/// Rebalance urgency, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RebalancePriority {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RebalancePriority {
    pub fn should_rebalance(self) -> bool {
        self >= Self::High
    }

    pub fn reason_code(self) -> RebalanceReason {
        match self {
            Self::Critical => RebalanceReason::OutOfRange,
            Self::High => RebalanceReason::LowCoverage,
            Self::Medium => RebalanceReason::CenterDrift,
            Self::Low => RebalanceReason::MinorDrift,
            Self::None => RebalanceReason::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceReason {
    OutOfRange,
    LowCoverage,
    CenterDrift,
    MinorDrift,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceAnalysis {
    pub priority: RebalancePriority,
    pub should_rebalance: bool,
    pub reason: String,
    pub current_in_range: bool,
    /// Bins between the active bin and the midpoint of the position.
    pub distance_from_center: f64,
    pub current_daily_fees: f64,
    pub projected_daily_fees: f64,
    /// USD cost of one remove + recreate cycle.
    pub rebalance_cost: f64,
    /// `f64::INFINITY` when rebalancing never pays back.
    pub break_even_hours: f64,
}

/// History entry the executor may persist after a rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRecord {
    /// Unix seconds.
    pub timestamp: u64,
    pub old_range: BinRange,
    pub new_range: BinRange,
    pub fees_claimed_usd: f64,
    pub cost_usd: f64,
    pub reason_code: RebalanceReason,
}

impl RebalanceRecord {
    pub fn new(
        old_range: BinRange,
        new_range: BinRange,
        fees_claimed_usd: f64,
        cost_usd: f64,
        reason_code: RebalanceReason,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            timestamp,
            old_range,
            new_range,
            fees_claimed_usd,
            cost_usd,
            reason_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_are_ordered_by_urgency() {
        use RebalancePriority::*;
        assert!(None < Low && Low < Medium && Medium < High && High < Critical);
        assert!(!Medium.should_rebalance());
        assert!(High.should_rebalance() && Critical.should_rebalance());
    }

    #[test]
    fn record_serializes_reason_as_snake_case() {
        let record = RebalanceRecord::new(
            BinRange::new(-10, 10),
            BinRange::new(20, 40),
            3.5,
            0.3,
            RebalancePriority::Critical.reason_code(),
        );
        assert!(record.timestamp > 0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["reason_code"], "out_of_range");
        assert_eq!(json["new_range"]["min_bin_id"], 20);
    }
}
