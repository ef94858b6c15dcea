//! Configuration loader and advisor settings.

use crate::errors::{AdvisorError, Result};
use crate::strategy::Strategy;

/// Bins sampled on each side of the active bin when building market context.
pub const DEFAULT_SAMPLE_RADIUS: u32 = 24;
/// Lookback window for the oracle price-ratio series.
pub const DEFAULT_SERIES_LOOKBACK_HOURS: u32 = 6;
/// Protocol cap on the number of bins a single position may span.
pub const DEFAULT_MAX_BINS_PER_POSITION: u32 = 70;

/// Tunables for the quantitative core.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Bins fetched on each side of the active bin.
    pub sample_radius: u32,
    /// Hours of price history requested from the oracle.
    pub series_lookback_hours: u32,
    /// Maximum inclusive bin span accepted for a position.
    pub max_bins_per_position: u32,
    /// Pool/oracle deviation above which the pool is reported unhealthy.
    pub health_deviation_limit: f64,
    /// Multiplier applied to current daily fees to project post-rebalance fees.
    pub fee_uplift: f64,
    /// On-chain cost of a remove + recreate cycle, in SOL.
    pub rebalance_cost_sol: f64,
    /// SOL/USD used when the oracle has no SOL quote.
    pub fallback_sol_usd: f64,
    /// Relative divergence tolerated between the bin-spread amount and a reference.
    pub cross_check_tolerance: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            sample_radius: DEFAULT_SAMPLE_RADIUS,
            series_lookback_hours: DEFAULT_SERIES_LOOKBACK_HOURS,
            max_bins_per_position: DEFAULT_MAX_BINS_PER_POSITION,
            health_deviation_limit: 0.5,
            fee_uplift: 1.10,
            rebalance_cost_sol: 0.002,
            fallback_sol_usd: 150.0,
            cross_check_tolerance: 0.5,
        }
    }
}

impl AdvisorConfig {
    /// Load overrides from environment variables; unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load overrides through `lookup`, which maps a variable name to its raw value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            sample_radius: parse_or(lookup("SAMPLE_RADIUS"), defaults.sample_radius),
            series_lookback_hours: parse_or(
                lookup("SERIES_LOOKBACK_HOURS"),
                defaults.series_lookback_hours,
            ),
            max_bins_per_position: parse_or(
                lookup("MAX_BINS_PER_POSITION"),
                defaults.max_bins_per_position,
            ),
            health_deviation_limit: parse_or(
                lookup("HEALTH_DEVIATION_LIMIT"),
                defaults.health_deviation_limit,
            ),
            fee_uplift: parse_or(lookup("FEE_UPLIFT"), defaults.fee_uplift),
            rebalance_cost_sol: parse_or(lookup("REBALANCE_COST_SOL"), defaults.rebalance_cost_sol),
            fallback_sol_usd: parse_or(lookup("FALLBACK_SOL_USD"), defaults.fallback_sol_usd),
            cross_check_tolerance: parse_or(
                lookup("CROSS_CHECK_TOLERANCE"),
                defaults.cross_check_tolerance,
            ),
        }
    }
}

/// Settings for the demonstration binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the JSON snapshot the binary reads pool/bin/oracle data from.
    pub fixture_path: String,
    pub strategy: Strategy,
    /// Optional X-side deposit to pair against the recommended range.
    pub amount_x: Option<f64>,
    pub advisor: AdvisorConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let fixture_path = std::env::var("ADVISOR_FIXTURE").map_err(|_| {
            AdvisorError::Config("Set ADVISOR_FIXTURE to a pool snapshot JSON file".into())
        })?;
        let strategy = std::env::var("STRATEGY")
            .unwrap_or_else(|_| "spot".into())
            .parse()?;
        let amount_x = match std::env::var("AMOUNT_X") {
            Ok(raw) => Some(raw.parse::<f64>()?),
            Err(_) => None,
        };
        Ok(Self {
            fixture_path,
            strategy,
            amount_x,
            advisor: AdvisorConfig::from_env(),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|raw| raw.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_knobs() {
        let cfg = AdvisorConfig::default();
        assert_eq!(cfg.sample_radius, 24);
        assert_eq!(cfg.series_lookback_hours, 6);
        assert_eq!(cfg.max_bins_per_position, 70);
        assert_eq!(cfg.fee_uplift, 1.10);
        assert_eq!(cfg.health_deviation_limit, 0.5);
    }

    #[test]
    fn lookup_overrides_parse_and_garbage_keeps_default() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SAMPLE_RADIUS", "not-a-number"),
            ("MAX_BINS_PER_POSITION", " 40 "),
            ("FEE_UPLIFT", "1.25"),
            ("HEALTH_DEVIATION_LIMIT", ""),
        ]);
        let cfg = AdvisorConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.sample_radius, DEFAULT_SAMPLE_RADIUS);
        assert_eq!(cfg.max_bins_per_position, 40);
        assert_eq!(cfg.fee_uplift, 1.25);
        assert_eq!(cfg.health_deviation_limit, 0.5);
        assert_eq!(cfg.series_lookback_hours, DEFAULT_SERIES_LOOKBACK_HOURS);
    }

    #[test]
    fn empty_lookup_is_default() {
        let cfg = AdvisorConfig::from_lookup(|_| None);
        let defaults = AdvisorConfig::default();
        assert_eq!(cfg.sample_radius, defaults.sample_radius);
        assert_eq!(cfg.rebalance_cost_sol, defaults.rebalance_cost_sol);
        assert_eq!(cfg.fallback_sol_usd, defaults.fallback_sol_usd);
        assert_eq!(cfg.cross_check_tolerance, defaults.cross_check_tolerance);
    }
}
