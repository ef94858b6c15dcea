use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bins::{PriceRange, price_range};
use crate::errors::AdvisorError;
use crate::market::VolumeBias;
use crate::models::{BinRange, PoolSnapshot};

/// Liquidity shape across the chosen bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Uniform.
    Spot,
    /// Concentrated near the center.
    Curve,
    /// Weighted towards the range edges, sized per side.
    BidAsk,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Spot => "Spot",
            Self::Curve => "Curve",
            Self::BidAsk => "BidAsk",
        };
        f.write_str(name)
    }
}

impl FromStr for Strategy {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Self::Spot),
            "curve" => Ok(Self::Curve),
            "bidask" | "bid-ask" | "bid_ask" => Ok(Self::BidAsk),
            other => Err(AdvisorError::Config(format!("unknown strategy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeWidth {
    Symmetric { bins_per_side: i32 },
    Split { bid_bins: i32, ask_bins: i32 },
}

/// Values the recommender actually used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationMetrics {
    pub volatility_score: f64,
    pub price_deviation: f64,
    pub volume_bias: VolumeBias,
    pub atr_percent: Option<f64>,
    pub center_shift: i32,
    pub bid_target: Option<f64>,
    pub ask_target: Option<f64>,
    pub bid_coverage: Option<f64>,
    pub ask_coverage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRecommendation {
    pub strategy: Strategy,
    pub min_bin_id: i32,
    pub max_bin_id: i32,
    pub center_bin: i32,
    pub width: RangeWidth,
    /// Ordered justification lines.
    pub rationale: Vec<String>,
    pub metrics: RecommendationMetrics,
}

impl RangeRecommendation {
    pub fn range(&self) -> BinRange {
        BinRange::new(self.min_bin_id, self.max_bin_id)
    }

    pub fn price_range(&self, pool: &PoolSnapshot) -> PriceRange {
        price_range(
            self.range(),
            pool.bin_step,
            pool.token_x.decimals,
            pool.token_y.decimals,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strategy_names() {
        assert_eq!("Spot".parse::<Strategy>().unwrap(), Strategy::Spot);
        assert_eq!(" curve ".parse::<Strategy>().unwrap(), Strategy::Curve);
        assert_eq!("bid-ask".parse::<Strategy>().unwrap(), Strategy::BidAsk);
        assert_eq!("BID_ASK".parse::<Strategy>().unwrap(), Strategy::BidAsk);
        assert!("wedge".parse::<Strategy>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for s in [Strategy::Spot, Strategy::Curve, Strategy::BidAsk] {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
    }
}
