//! Market context: liquidity-weighted price nodes plus volatility, built in
//! two phases. [`MarketContextBuilder::gather`] does all the I/O and never
//! fails; [`build_context`] is pure.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AdvisorConfig;
use crate::market::volatility::{self, VolatilityInputs, VolatilitySource};
use crate::models::{BinLiquiditySample, PoolSnapshot, PricePoint};
use crate::sources::{BinSource, PriceOracle};

/// Number of heaviest bins kept as volume nodes.
pub const TOP_VOLUME_NODES: usize = 5;
/// Weight on one side must exceed the other by this factor to count as a bias.
const BIAS_THRESHOLD: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeNode {
    pub price: f64,
    /// USD notional, normalised against the other kept nodes.
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageNode {
    pub bin_id: i32,
    pub price: f64,
    pub weight: f64,
}

/// Where the heavier liquidity sits relative to the pool price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeBias {
    Bearish,
    Neutral,
    Bullish,
}

impl VolumeBias {
    pub fn signum(self) -> i32 {
        match self {
            Self::Bearish => -1,
            Self::Neutral => 0,
            Self::Bullish => 1,
        }
    }

    /// Compare node weight above and below `pool_price`.
    pub fn from_nodes(nodes: &[VolumeNode], pool_price: f64) -> Self {
        let (above, below) = nodes.iter().fold((0.0, 0.0), |(above, below), n| {
            match n.price.partial_cmp(&pool_price) {
                Some(Ordering::Greater) => (above + n.weight, below),
                Some(Ordering::Less) => (above, below + n.weight),
                _ => (above, below),
            }
        });
        if above > below * BIAS_THRESHOLD {
            Self::Bullish
        } else if below > above * BIAS_THRESHOLD {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub volume_nodes: Vec<VolumeNode>,
    pub volatility_score: Option<f64>,
    pub atr_percent: Option<f64>,
    pub recent_high_price: Option<f64>,
    pub recent_low_price: Option<f64>,
    /// Bins at or below the active bin, nearest first.
    pub bid_coverage_nodes: Vec<CoverageNode>,
    /// Bins above the active bin, nearest first.
    pub ask_coverage_nodes: Vec<CoverageNode>,
    pub volume_bias: Option<VolumeBias>,
    pub volatility_source: Option<VolatilitySource>,
}

impl MarketContext {
    /// No market signal available.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.volume_nodes.is_empty()
    }
}

/// Raw data collected for one context build.
#[derive(Debug, Clone, Default)]
pub struct MarketInputs {
    pub bins: Vec<BinLiquiditySample>,
    pub x_usd: Option<f64>,
    pub y_usd: Option<f64>,
    pub x_series: Option<Vec<PricePoint>>,
    pub y_series: Option<Vec<PricePoint>>,
}

/// Gathers bins and oracle data for a pool using injected collaborators.
pub struct MarketContextBuilder<'a, B: BinSource, O: PriceOracle> {
    bins: &'a B,
    oracle: &'a O,
    config: &'a AdvisorConfig,
}

impl<'a, B: BinSource, O: PriceOracle> MarketContextBuilder<'a, B, O> {
    pub fn new(bins: &'a B, oracle: &'a O, config: &'a AdvisorConfig) -> Self {
        Self {
            bins,
            oracle,
            config,
        }
    }

    /// Fetch everything the context needs. `None` only when bin sampling
    /// fails; oracle failures are logged and leave the field empty.
    pub async fn gather(&self, pool: &PoolSnapshot) -> Option<MarketInputs> {
        let bins = match self.bins.bins_around_active(self.config.sample_radius).await {
            Ok(bins) => bins,
            Err(e) => {
                warn!(pool = %pool.address, error = %e, "[CTX] bin sampling failed");
                return None;
            }
        };

        let mints = [pool.token_x.mint.clone(), pool.token_y.mint.clone()];
        let (x_usd, y_usd) = match self.oracle.usd_prices(&mints).await {
            Ok(quotes) => (
                quotes.get(&pool.token_x.mint).copied(),
                quotes.get(&pool.token_y.mint).copied(),
            ),
            Err(e) => {
                warn!(pool = %pool.address, error = %e, "[CTX] usd price lookup failed");
                (None, None)
            }
        };

        let hours = self.config.series_lookback_hours;
        let (x_series, y_series) = futures::join!(
            self.fetch_series(&pool.token_x.mint, hours),
            self.fetch_series(&pool.token_y.mint, hours),
        );

        Some(MarketInputs {
            bins,
            x_usd,
            y_usd,
            x_series,
            y_series,
        })
    }

    async fn fetch_series(&self, mint: &str, hours: u32) -> Option<Vec<PricePoint>> {
        match self.oracle.usd_price_series(mint, hours).await {
            Ok(series) => series,
            Err(e) => {
                warn!(mint, error = %e, "[CTX] price series fetch failed");
                None
            }
        }
    }

    /// Gather then compute. Returns [`MarketContext::empty`] when no bins could be sampled.
    pub async fn build(&self, pool: &PoolSnapshot) -> MarketContext {
        let Some(inputs) = self.gather(pool).await else {
            return MarketContext::empty();
        };
        let ctx = build_context(pool, &inputs);
        info!(
            pool = %pool.address,
            nodes = ctx.volume_nodes.len(),
            bid_nodes = ctx.bid_coverage_nodes.len(),
            ask_nodes = ctx.ask_coverage_nodes.len(),
            volatility = ?ctx.volatility_score,
            atr = ?ctx.atr_percent,
            source = ?ctx.volatility_source,
            "[CTX] market context built"
        );
        ctx
    }
}

/// Turn gathered inputs into a market context.
pub fn build_context(pool: &PoolSnapshot, inputs: &MarketInputs) -> MarketContext {
    let pool_price = pool.pool_price();
    let (x_usd, y_usd) = resolve_usd_prices(inputs.x_usd, inputs.y_usd, pool_price);

    let mut bins: Vec<BinLiquiditySample> = inputs
        .bins
        .iter()
        .map(|b| BinLiquiditySample {
            price: pool.price_at(b.bin_id),
            ..b.clone()
        })
        .collect();
    bins.sort_by_key(|b| b.bin_id);

    let weighted: Vec<(i32, f64, f64)> = bins
        .iter()
        .map(|b| (b.bin_id, b.price, b.x_amount * x_usd + b.y_amount * y_usd))
        .filter(|(_, _, w)| w.is_finite() && *w > 0.0)
        .collect();

    let volume_nodes = top_volume_nodes(&weighted);
    let (bid_coverage_nodes, ask_coverage_nodes) =
        coverage_nodes(&weighted, pool.active_bin_id);

    let series = ratio_series(
        inputs.x_series.as_deref(),
        inputs.y_series.as_deref(),
        inputs.y_usd,
    );
    if series.is_none() {
        debug!(pool = %pool.address, "[CTX] no usable price-ratio series");
    }
    let vol = volatility::estimate(&VolatilityInputs {
        ratio_series: series.as_deref(),
        bins: &bins,
        volume_24h: pool.volume_24h,
        tvl: pool.tvl,
    });

    MarketContext {
        volume_nodes,
        volatility_score: Some(vol.score),
        atr_percent: vol.atr_percent,
        recent_high_price: vol.recent_high,
        recent_low_price: vol.recent_low,
        bid_coverage_nodes,
        ask_coverage_nodes,
        volume_bias: None,
        volatility_source: Some(vol.source),
    }
}

/// Fill a missing USD quote from the pool's Y-per-X price. With no quotes at
/// all, weights are expressed in Y.
pub(crate) fn resolve_usd_prices(
    x_usd: Option<f64>,
    y_usd: Option<f64>,
    pool_price: f64,
) -> (f64, f64) {
    let valid = |p: Option<f64>| p.filter(|v| v.is_finite() && *v > 0.0);
    match (valid(x_usd), valid(y_usd)) {
        (Some(x), Some(y)) => (x, y),
        (Some(x), None) => (x, x / pool_price),
        (None, Some(y)) => (pool_price * y, y),
        (None, None) => (pool_price, 1.0),
    }
}

fn top_volume_nodes(weighted: &[(i32, f64, f64)]) -> Vec<VolumeNode> {
    let mut sorted: Vec<&(i32, f64, f64)> = weighted.iter().collect();
    // Stable sort keeps ascending bin order between equal weights.
    sorted.sort_by(|a, b| b.2.total_cmp(&a.2));
    sorted.truncate(TOP_VOLUME_NODES);
    let total: f64 = sorted.iter().map(|n| n.2).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    sorted
        .into_iter()
        .map(|&(_, price, weight)| VolumeNode {
            price,
            weight: weight / total,
        })
        .collect()
}

fn coverage_nodes(
    weighted: &[(i32, f64, f64)],
    active_bin_id: i32,
) -> (Vec<CoverageNode>, Vec<CoverageNode>) {
    let (bid, ask): (Vec<_>, Vec<_>) = weighted
        .iter()
        .copied()
        .partition(|(bin_id, _, _)| *bin_id <= active_bin_id);
    (
        normalize_side(bid, active_bin_id),
        normalize_side(ask, active_bin_id),
    )
}

fn normalize_side(side: Vec<(i32, f64, f64)>, active_bin_id: i32) -> Vec<CoverageNode> {
    let total: f64 = side.iter().map(|n| n.2).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut nodes: Vec<CoverageNode> = side
        .into_iter()
        .map(|(bin_id, price, weight)| CoverageNode {
            bin_id,
            price,
            weight: weight / total,
        })
        .collect();
    nodes.sort_by_key(|n| (n.bin_id as i64 - active_bin_id as i64).abs());
    nodes
}

/// X/Y price ratio over time. Both histories are sorted by timestamp and
/// paired from the newest point backwards; the longer history loses its
/// oldest points. A missing Y history falls back to the Y spot quote.
fn ratio_series(
    x_series: Option<&[PricePoint]>,
    y_series: Option<&[PricePoint]>,
    y_spot: Option<f64>,
) -> Option<Vec<f64>> {
    let mut xs: Vec<PricePoint> = x_series?.to_vec();
    xs.sort_by_key(|p| p.timestamp);

    let ratios: Vec<f64> = match y_series.filter(|s| s.len() >= 2) {
        Some(ys) => {
            let mut ys = ys.to_vec();
            ys.sort_by_key(|p| p.timestamp);
            let mut paired: Vec<f64> = xs
                .iter()
                .rev()
                .zip(ys.iter().rev())
                .filter(|(_, y)| y.price > 0.0)
                .map(|(x, y)| x.price / y.price)
                .collect();
            paired.reverse();
            paired
        }
        None => {
            let y = y_spot.filter(|v| v.is_finite() && *v > 0.0)?;
            xs.iter().map(|x| x.price / y).collect()
        }
    };
    let ratios: Vec<f64> = ratios
        .into_iter()
        .filter(|r| r.is_finite() && *r > 0.0)
        .collect();
    (ratios.len() >= 2).then_some(ratios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::volatility::MAX_VOLATILITY;
    use crate::errors::{AdvisorError, Result};
    use crate::models::{ActiveBin, TokenMeta};
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn pool() -> PoolSnapshot {
        PoolSnapshot {
            address: "pool".into(),
            token_x: TokenMeta {
                mint: "MX".into(),
                symbol: "X".into(),
                decimals: 6,
            },
            token_y: TokenMeta {
                mint: "MY".into(),
                symbol: "Y".into(),
                decimals: 6,
            },
            bin_step: 20,
            active_bin_id: 0,
            price: None,
            tvl: Some(1_000_000.0),
            volume_24h: Some(400_000.0),
            apr: None,
        }
    }

    fn sample(bin_id: i32, x: f64, y: f64) -> BinLiquiditySample {
        BinLiquiditySample {
            bin_id,
            price: 0.0,
            x_amount: x,
            y_amount: y,
        }
    }

    fn ladder() -> Vec<BinLiquiditySample> {
        vec![
            sample(-3, 0.0, 30.0),
            sample(-2, 0.0, 10.0),
            sample(-1, 0.0, 0.0),
            sample(0, 5.0, 5.0),
            sample(1, 20.0, 0.0),
            sample(2, 40.0, 0.0),
            sample(4, 1.0, 0.0),
            sample(6, 2.0, 0.0),
            sample(7, 3.0, 0.0),
        ]
    }

    fn inputs() -> MarketInputs {
        MarketInputs {
            bins: ladder(),
            x_usd: Some(1.0),
            y_usd: Some(1.0),
            x_series: None,
            y_series: None,
        }
    }

    #[test]
    fn volume_nodes_are_top_five_normalised() {
        let ctx = build_context(&pool(), &inputs());
        assert_eq!(ctx.volume_nodes.len(), TOP_VOLUME_NODES);
        let total: f64 = ctx.volume_nodes.iter().map(|n| n.weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
        // Heaviest bin is +2 (40), then -3 (30), +1 (20), then -2 and 0 at 10.
        let p = pool();
        assert_eq!(ctx.volume_nodes[0].price, p.price_at(2));
        assert_eq!(ctx.volume_nodes[1].price, p.price_at(-3));
        assert!((ctx.volume_nodes[0].weight - 40.0 / 110.0).abs() < 1e-12);
        assert!(ctx.volume_nodes.windows(2).all(|w| w[0].weight >= w[1].weight));
    }

    #[test]
    fn coverage_partitions_at_active_bin_nearest_first() {
        let ctx = build_context(&pool(), &inputs());
        let bid_ids: Vec<i32> = ctx.bid_coverage_nodes.iter().map(|n| n.bin_id).collect();
        let ask_ids: Vec<i32> = ctx.ask_coverage_nodes.iter().map(|n| n.bin_id).collect();
        // Bin -1 is empty and dropped.
        assert_eq!(bid_ids, vec![0, -2, -3]);
        assert_eq!(ask_ids, vec![1, 2, 4, 6, 7]);
        let bid_total: f64 = ctx.bid_coverage_nodes.iter().map(|n| n.weight).sum();
        let ask_total: f64 = ctx.ask_coverage_nodes.iter().map(|n| n.weight).sum();
        assert!((bid_total - 1.0).abs() < 1e-12);
        assert!((ask_total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_usd_quote_is_derived_from_pool_price() {
        assert_eq!(resolve_usd_prices(Some(3.0), Some(1.5), 2.0), (3.0, 1.5));
        assert_eq!(resolve_usd_prices(Some(3.0), None, 2.0), (3.0, 1.5));
        assert_eq!(resolve_usd_prices(None, Some(1.5), 2.0), (3.0, 1.5));
        assert_eq!(resolve_usd_prices(None, None, 2.0), (2.0, 1.0));
    }

    #[test]
    fn series_drives_volatility_when_available() {
        let mut inp = inputs();
        inp.x_series = Some(vec![
            PricePoint { timestamp: 2, price: 110.0 },
            PricePoint { timestamp: 1, price: 100.0 },
        ]);
        inp.y_series = None;
        let ctx = build_context(&pool(), &inp);
        assert_eq!(ctx.volatility_source, Some(VolatilitySource::PriceSeries));
        assert!((ctx.volatility_score.unwrap() - 0.1).abs() < 1e-12);
        assert!((ctx.atr_percent.unwrap() - 10.0 / 110.0).abs() < 1e-12);
        assert_eq!(ctx.recent_high_price, Some(110.0));
    }

    #[test]
    fn ratio_series_divides_aligned_points() {
        let xs = [
            PricePoint { timestamp: 1, price: 10.0 },
            PricePoint { timestamp: 2, price: 12.0 },
        ];
        let ys = [
            PricePoint { timestamp: 2, price: 4.0 },
            PricePoint { timestamp: 1, price: 5.0 },
        ];
        assert_eq!(ratio_series(Some(&xs), Some(&ys), None), Some(vec![2.0, 3.0]));
        assert_eq!(ratio_series(Some(&xs), None, Some(2.0)), Some(vec![5.0, 6.0]));
        assert_eq!(ratio_series(Some(&xs), None, None), None);
        assert_eq!(ratio_series(None, Some(&ys), Some(1.0)), None);
    }

    #[test]
    fn ratio_series_pairs_uneven_histories_from_newest() {
        let xs = [
            PricePoint { timestamp: 1, price: 100.0 },
            PricePoint { timestamp: 2, price: 100.0 },
            PricePoint { timestamp: 3, price: 100.0 },
            PricePoint { timestamp: 4, price: 200.0 },
        ];
        let ys = [
            PricePoint { timestamp: 4, price: 1.0 },
            PricePoint { timestamp: 3, price: 1.0 },
        ];
        assert_eq!(ratio_series(Some(&xs), Some(&ys), None), Some(vec![100.0, 200.0]));
        // A longer Y history is trimmed the same way.
        assert_eq!(ratio_series(Some(&ys), Some(&xs), None), Some(vec![0.01, 0.005]));
    }

    #[test]
    fn uneven_histories_see_the_latest_move() {
        let mut inp = inputs();
        inp.x_series = Some(vec![
            PricePoint { timestamp: 1, price: 100.0 },
            PricePoint { timestamp: 2, price: 100.0 },
            PricePoint { timestamp: 3, price: 100.0 },
            PricePoint { timestamp: 4, price: 200.0 },
        ]);
        inp.y_series = Some(vec![
            PricePoint { timestamp: 3, price: 1.0 },
            PricePoint { timestamp: 4, price: 1.0 },
        ]);
        let ctx = build_context(&pool(), &inp);
        assert_eq!(ctx.volatility_source, Some(VolatilitySource::PriceSeries));
        assert_eq!(ctx.recent_high_price, Some(200.0));
        assert_eq!(ctx.volatility_score, Some(MAX_VOLATILITY));
        assert_eq!(ctx.recent_low_price, Some(100.0));
    }

    #[test]
    fn bin_spread_used_without_series() {
        let ctx = build_context(&pool(), &inputs());
        assert_eq!(ctx.volatility_source, Some(VolatilitySource::BinSpread));
    }

    #[test]
    fn bias_compares_weight_around_price() {
        let nodes = [
            VolumeNode { price: 1.1, weight: 0.7 },
            VolumeNode { price: 0.9, weight: 0.3 },
        ];
        assert_eq!(VolumeBias::from_nodes(&nodes, 1.0), VolumeBias::Bullish);
        assert_eq!(VolumeBias::from_nodes(&nodes, 1.2), VolumeBias::Bearish);
        let even = [
            VolumeNode { price: 1.1, weight: 0.52 },
            VolumeNode { price: 0.9, weight: 0.48 },
        ];
        assert_eq!(VolumeBias::from_nodes(&even, 1.0), VolumeBias::Neutral);
        assert_eq!(VolumeBias::from_nodes(&[], 1.0), VolumeBias::Neutral);
    }

    struct FailingBins;

    #[async_trait]
    impl BinSource for FailingBins {
        async fn active_bin(&self) -> Result<ActiveBin> {
            Err(AdvisorError::external("rpc", "connection refused"))
        }
        async fn bins_around_active(&self, _radius: u32) -> Result<Vec<BinLiquiditySample>> {
            Err(AdvisorError::external("rpc", "connection refused"))
        }
    }

    struct StaticBins(Vec<BinLiquiditySample>);

    #[async_trait]
    impl BinSource for StaticBins {
        async fn active_bin(&self) -> Result<ActiveBin> {
            Ok(ActiveBin {
                bin_id: 0,
                x_amount: 5.0,
                y_amount: 5.0,
            })
        }
        async fn bins_around_active(&self, _radius: u32) -> Result<Vec<BinLiquiditySample>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenOracle;

    #[async_trait]
    impl PriceOracle for BrokenOracle {
        async fn usd_prices(&self, _mints: &[String]) -> Result<HashMap<String, f64>> {
            Err(AdvisorError::external("price-api", "503"))
        }
        async fn usd_price_series(
            &self,
            _mint: &str,
            _hours: u32,
        ) -> Result<Option<Vec<PricePoint>>> {
            Err(AdvisorError::external("price-api", "503"))
        }
        async fn price_ratio(&self, _x: &str, _y: &str) -> Result<Option<f64>> {
            Err(AdvisorError::external("price-api", "503"))
        }
    }

    #[tokio::test]
    async fn bin_failure_yields_empty_context() {
        let cfg = AdvisorConfig::default();
        let builder = MarketContextBuilder::new(&FailingBins, &BrokenOracle, &cfg);
        let ctx = builder.build(&pool()).await;
        assert!(ctx.is_empty());
        assert_eq!(ctx, MarketContext::empty());
    }

    #[tokio::test]
    async fn oracle_failure_still_builds_from_bins() {
        let cfg = AdvisorConfig::default();
        let bins = StaticBins(ladder());
        let builder = MarketContextBuilder::new(&bins, &BrokenOracle, &cfg);
        let ctx = builder.build(&pool()).await;
        assert_eq!(ctx.volume_nodes.len(), TOP_VOLUME_NODES);
        assert_eq!(ctx.volatility_source, Some(VolatilitySource::BinSpread));
    }
}
