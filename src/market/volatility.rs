//! Volatility and ATR estimation with an explicit fallback chain.
//!
//! Sources are tried in [`FALLBACK_ORDER`]; the first one that can produce an
//! estimate from the gathered data wins. [`VolatilitySource::Default`] always
//! produces one, so the chain never comes back empty.

use serde::{Deserialize, Serialize};

use crate::models::BinLiquiditySample;

pub const MIN_VOLATILITY: f64 = 0.02;
pub const MAX_VOLATILITY: f64 = 0.5;
pub const DEFAULT_VOLATILITY: f64 = 0.06;

const TURNOVER_SCALE: f64 = 0.15;
const MIN_TURNOVER_VOLATILITY: f64 = 0.025;
const MAX_TURNOVER_VOLATILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilitySource {
    /// Oracle price-ratio history.
    PriceSeries,
    /// High/low of the sampled bins that hold liquidity.
    BinSpread,
    /// 24h volume over TVL.
    Turnover,
    Default,
}

pub const FALLBACK_ORDER: [VolatilitySource; 4] = [
    VolatilitySource::PriceSeries,
    VolatilitySource::BinSpread,
    VolatilitySource::Turnover,
    VolatilitySource::Default,
];

/// Everything the chain may draw on, already fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolatilityInputs<'a> {
    pub ratio_series: Option<&'a [f64]>,
    pub bins: &'a [BinLiquiditySample],
    pub volume_24h: Option<f64>,
    pub tvl: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityEstimate {
    pub score: f64,
    pub atr_percent: Option<f64>,
    pub recent_high: Option<f64>,
    pub recent_low: Option<f64>,
    pub source: VolatilitySource,
}

impl VolatilitySource {
    pub fn estimate(self, inputs: &VolatilityInputs<'_>) -> Option<VolatilityEstimate> {
        match self {
            Self::PriceSeries => inputs.ratio_series.and_then(from_price_series),
            Self::BinSpread => from_bin_spread(inputs.bins),
            Self::Turnover => from_turnover(inputs.volume_24h, inputs.tvl),
            Self::Default => Some(VolatilityEstimate {
                score: DEFAULT_VOLATILITY,
                atr_percent: None,
                recent_high: None,
                recent_low: None,
                source: Self::Default,
            }),
        }
    }
}

/// Walk [`FALLBACK_ORDER`] and return the first estimate.
pub fn estimate(inputs: &VolatilityInputs<'_>) -> VolatilityEstimate {
    FALLBACK_ORDER
        .iter()
        .find_map(|source| source.estimate(inputs))
        .unwrap_or(VolatilityEstimate {
            score: DEFAULT_VOLATILITY,
            atr_percent: None,
            recent_high: None,
            recent_low: None,
            source: VolatilitySource::Default,
        })
}

/// ATR is the mean absolute step divided by the last price; the score is the
/// high/low range over the low, clamped.
pub fn from_price_series(series: &[f64]) -> Option<VolatilityEstimate> {
    if series.len() < 2 || series.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
        return None;
    }
    let last = *series.last()?;
    let mean_step = series
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .sum::<f64>()
        / (series.len() - 1) as f64;
    let (low, high) = min_max(series.iter().copied())?;
    Some(VolatilityEstimate {
        score: ((high - low) / low).clamp(MIN_VOLATILITY, MAX_VOLATILITY),
        atr_percent: Some(mean_step / last),
        recent_high: Some(high),
        recent_low: Some(low),
        source: VolatilitySource::PriceSeries,
    })
}

/// Spread of prices across funded bins stands in for both metrics.
pub fn from_bin_spread(bins: &[BinLiquiditySample]) -> Option<VolatilityEstimate> {
    let funded = bins
        .iter()
        .filter(|b| b.has_liquidity() && b.price.is_finite() && b.price > 0.0);
    if funded.clone().count() < 2 {
        return None;
    }
    let (low, high) = min_max(funded.map(|b| b.price))?;
    let spread = (high - low) / low;
    Some(VolatilityEstimate {
        score: spread.clamp(MIN_VOLATILITY, MAX_VOLATILITY),
        atr_percent: Some(spread),
        recent_high: Some(high),
        recent_low: Some(low),
        source: VolatilitySource::BinSpread,
    })
}

pub fn from_turnover(volume_24h: Option<f64>, tvl: Option<f64>) -> Option<VolatilityEstimate> {
    let volume = volume_24h.filter(|v| v.is_finite() && *v >= 0.0)?;
    let tvl = tvl.filter(|t| t.is_finite() && *t > 0.0)?;
    Some(VolatilityEstimate {
        score: (volume / tvl * TURNOVER_SCALE)
            .clamp(MIN_TURNOVER_VOLATILITY, MAX_TURNOVER_VOLATILITY),
        atr_percent: None,
        recent_high: None,
        recent_low: None,
        source: VolatilitySource::Turnover,
    })
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(bin_id: i32, price: f64, x: f64, y: f64) -> BinLiquiditySample {
        BinLiquiditySample {
            bin_id,
            price,
            x_amount: x,
            y_amount: y,
        }
    }

    #[test]
    fn series_metrics() {
        let est = from_price_series(&[100.0, 102.0, 101.0, 104.0]).unwrap();
        // Steps 2, 1, 3 → mean 2, last 104.
        assert!((est.atr_percent.unwrap() - 2.0 / 104.0).abs() < 1e-12);
        assert!((est.score - 0.04).abs() < 1e-12);
        assert_eq!(est.recent_high, Some(104.0));
        assert_eq!(est.recent_low, Some(100.0));
    }

    #[test]
    fn series_score_is_clamped() {
        let flat = from_price_series(&[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(flat.score, MIN_VOLATILITY);
        let wild = from_price_series(&[1.0, 3.0]).unwrap();
        assert_eq!(wild.score, MAX_VOLATILITY);
    }

    #[test]
    fn short_or_bad_series_is_unusable() {
        assert!(from_price_series(&[1.0]).is_none());
        assert!(from_price_series(&[]).is_none());
        assert!(from_price_series(&[1.0, 0.0]).is_none());
    }

    #[test]
    fn bin_spread_ignores_empty_bins() {
        let bins = [
            bin(-5, 0.5, 0.0, 0.0),
            bin(-1, 0.98, 0.0, 10.0),
            bin(0, 1.0, 1.0, 1.0),
            bin(2, 1.05, 3.0, 0.0),
            bin(9, 2.0, 0.0, 0.0),
        ];
        let est = from_bin_spread(&bins).unwrap();
        assert!((est.atr_percent.unwrap() - (1.05 - 0.98) / 0.98).abs() < 1e-12);
        assert!((est.score - (1.05 - 0.98) / 0.98).abs() < 1e-12);
        assert_eq!(est.source, VolatilitySource::BinSpread);
    }

    #[test]
    fn turnover_is_scaled_and_clamped() {
        let est = from_turnover(Some(1_000_000.0), Some(2_000_000.0)).unwrap();
        assert!((est.score - 0.075).abs() < 1e-12);
        assert_eq!(from_turnover(Some(0.0), Some(1.0)).unwrap().score, 0.025);
        assert_eq!(from_turnover(Some(100.0), Some(1.0)).unwrap().score, 0.3);
        assert!(from_turnover(Some(1.0), Some(0.0)).is_none());
        assert!(from_turnover(None, Some(1.0)).is_none());
    }

    #[test]
    fn chain_follows_documented_order() {
        let series = [1.0, 1.1];
        let bins = [bin(0, 1.0, 1.0, 1.0), bin(5, 1.2, 1.0, 0.0)];

        let all = VolatilityInputs {
            ratio_series: Some(&series),
            bins: &bins,
            volume_24h: Some(10.0),
            tvl: Some(100.0),
        };
        assert_eq!(estimate(&all).source, VolatilitySource::PriceSeries);

        let no_series = VolatilityInputs {
            ratio_series: Some(&series[..1]),
            ..all
        };
        assert_eq!(estimate(&no_series).source, VolatilitySource::BinSpread);

        let no_bins = VolatilityInputs {
            ratio_series: None,
            bins: &[],
            ..all
        };
        assert_eq!(estimate(&no_bins).source, VolatilitySource::Turnover);

        let nothing = VolatilityInputs::default();
        let est = estimate(&nothing);
        assert_eq!(est.source, VolatilitySource::Default);
        assert_eq!(est.score, DEFAULT_VOLATILITY);
    }
}
