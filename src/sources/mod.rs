//! External collaborators the advisor reads from.
//!
//! Responsibilities:
//! • Expose the bin ladder around the active bin (protocol client).
//! • Quote USD prices, price history and pair ratios (price oracle).
//!
//! Retries, caching and transport belong to the implementations; the advisor
//! treats every failure here as missing data and falls back.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{ActiveBin, BinLiquiditySample, PricePoint};

pub mod fixture;

pub use fixture::{FixtureSource, SOL_MINT};

/// Read-only access to a pool's bins.
#[async_trait]
pub trait BinSource: Send + Sync {
    async fn active_bin(&self) -> Result<ActiveBin>;

    /// `radius` bins on each side of the active bin, plus the active bin.
    async fn bins_around_active(&self, radius: u32) -> Result<Vec<BinLiquiditySample>>;
}

/// USD price quotes and history.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Quotes for the mints the oracle knows; unknown mints are simply absent.
    async fn usd_prices(&self, mints: &[String]) -> Result<HashMap<String, f64>>;

    /// Price history over the last `hours`, or `None` when the oracle has none.
    async fn usd_price_series(&self, mint: &str, hours: u32) -> Result<Option<Vec<PricePoint>>>;

    /// Y per X for the pair, or `None` when either side is unquoted.
    async fn price_ratio(&self, mint_x: &str, mint_y: &str) -> Result<Option<f64>>;
}
