use serde::{Deserialize, Serialize};

use crate::bins::bin_id_for_price;
use crate::models::PoolSnapshot;

/// Pool price compared with an external reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceHealth {
    pub is_healthy: bool,
    pub pool_price: f64,
    pub oracle_price: Option<f64>,
    /// `|pool - oracle| / oracle`; zero without an oracle quote.
    pub deviation: f64,
    /// Bin the oracle price falls in.
    pub oracle_bin_id: Option<i32>,
}

/// Without an oracle quote the pool cannot be shown unhealthy, so it is reported healthy.
pub fn check_price_health(
    pool: &PoolSnapshot,
    oracle_price: Option<f64>,
    deviation_limit: f64,
) -> PriceHealth {
    let pool_price = pool.price_at(pool.active_bin_id);
    let oracle_price = oracle_price.filter(|p| p.is_finite() && *p > 0.0);
    let deviation = price_deviation(pool_price, oracle_price);
    PriceHealth {
        is_healthy: deviation <= deviation_limit,
        pool_price,
        oracle_price,
        deviation,
        oracle_bin_id: oracle_price.and_then(|p| {
            bin_id_for_price(p, pool.bin_step, pool.token_x.decimals, pool.token_y.decimals)
        }),
    }
}

pub fn price_deviation(pool_price: f64, oracle_price: Option<f64>) -> f64 {
    match oracle_price {
        Some(oracle) if oracle.is_finite() && oracle > 0.0 => (pool_price - oracle).abs() / oracle,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenMeta;

    fn pool(active_bin_id: i32) -> PoolSnapshot {
        PoolSnapshot {
            address: "pool".into(),
            token_x: TokenMeta {
                mint: "MX".into(),
                symbol: "X".into(),
                decimals: 9,
            },
            token_y: TokenMeta {
                mint: "MY".into(),
                symbol: "Y".into(),
                decimals: 6,
            },
            bin_step: 25,
            active_bin_id,
            price: None,
            tvl: None,
            volume_24h: None,
            apr: None,
        }
    }

    #[test]
    fn no_oracle_is_healthy() {
        let h = check_price_health(&pool(0), None, 0.5);
        assert!(h.is_healthy);
        assert_eq!(h.deviation, 0.0);
        assert_eq!(h.pool_price, 1_000.0);
        assert_eq!(h.oracle_bin_id, None);
    }

    #[test]
    fn deviation_beyond_limit_is_unhealthy() {
        let h = check_price_health(&pool(0), Some(500.0), 0.5);
        assert!((h.deviation - 1.0).abs() < 1e-12);
        assert!(!h.is_healthy);

        let h = check_price_health(&pool(0), Some(800.0), 0.5);
        assert!((h.deviation - 0.25).abs() < 1e-12);
        assert!(h.is_healthy);
    }

    #[test]
    fn reports_oracle_bin() {
        let p = pool(40);
        let oracle = p.price_at(37);
        let h = check_price_health(&p, Some(oracle), 0.5);
        assert_eq!(h.oracle_bin_id, Some(37));
    }
}
