use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::{AdvisorError, Result};
use crate::models::{ActiveBin, BinLiquiditySample, PoolSnapshot, Position, PricePoint};
use crate::sources::{BinSource, PriceOracle};

/// Wrapped SOL mint, used to price on-chain action costs.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Snapshot of pool, bins and oracle data captured to a JSON document.
///
/// Serves both collaborator traits so the advisor can run offline.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSource {
    pub pool: PoolSnapshot,
    #[serde(default)]
    pub bins: Vec<BinLiquiditySample>,
    #[serde(default)]
    pub usd_prices: HashMap<String, f64>,
    #[serde(default)]
    pub price_series: HashMap<String, Vec<PricePoint>>,
    #[serde(default)]
    pub position: Option<Position>,
    /// SDK-side paired amount estimate to cross-check against.
    #[serde(default)]
    pub reference_amount_y: Option<f64>,
}

impl FixtureSource {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }
}

#[async_trait]
impl BinSource for FixtureSource {
    async fn active_bin(&self) -> Result<ActiveBin> {
        let active_id = self.pool.active_bin_id;
        self.bins
            .iter()
            .find(|b| b.bin_id == active_id)
            .map(|b| ActiveBin {
                bin_id: b.bin_id,
                x_amount: b.x_amount,
                y_amount: b.y_amount,
            })
            .ok_or_else(|| {
                AdvisorError::DataUnavailable(format!("active bin {active_id} not in fixture"))
            })
    }

    async fn bins_around_active(&self, radius: u32) -> Result<Vec<BinLiquiditySample>> {
        if self.bins.is_empty() {
            return Err(AdvisorError::external("fixture", "no bins recorded"));
        }
        let active = self.pool.active_bin_id as i64;
        let radius = radius as i64;
        Ok(self
            .bins
            .iter()
            .filter(|b| (b.bin_id as i64 - active).abs() <= radius)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PriceOracle for FixtureSource {
    async fn usd_prices(&self, mints: &[String]) -> Result<HashMap<String, f64>> {
        Ok(mints
            .iter()
            .filter_map(|m| self.usd_prices.get(m).map(|p| (m.clone(), *p)))
            .collect())
    }

    async fn usd_price_series(&self, mint: &str, hours: u32) -> Result<Option<Vec<PricePoint>>> {
        let Some(series) = self.price_series.get(mint) else {
            return Ok(None);
        };
        let Some(latest) = series.iter().map(|p| p.timestamp).max() else {
            return Ok(None);
        };
        let cutoff = latest - hours as i64 * 3_600;
        let mut window: Vec<PricePoint> = series
            .iter()
            .filter(|p| p.timestamp >= cutoff)
            .copied()
            .collect();
        window.sort_by_key(|p| p.timestamp);
        Ok(Some(window))
    }

    async fn price_ratio(&self, mint_x: &str, mint_y: &str) -> Result<Option<f64>> {
        let (Some(x), Some(y)) = (self.usd_prices.get(mint_x), self.usd_prices.get(mint_y)) else {
            return Ok(None);
        };
        if *y <= 0.0 {
            return Ok(None);
        }
        Ok(Some(x / y))
    }
}
