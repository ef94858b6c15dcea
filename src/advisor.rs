//! Request-level entry points over injected collaborators.
//!
//! Each call gathers what it needs from the bin source and the oracle, then
//! hands fresh snapshots to the pure calculators. Oracle and sampling
//! failures degrade to fallbacks; malformed requests are returned as errors.

use serde::Serialize;
use tracing::{info, warn};

use crate::bins::{
    PairedAmount, PairedAmountQuote, PairedAmountRequest, cross_check, solve_amount_y,
    validate_range,
};
use crate::config::AdvisorConfig;
use crate::errors::Result;
use crate::market::context::resolve_usd_prices;
use crate::market::{MarketContext, MarketContextBuilder, PriceHealth, check_price_health};
use crate::models::{BinRange, PoolSnapshot, Position};
use crate::rebalance::{
    CostBenefit, FeeInputs, RebalanceAnalysis, RebalanceRecord, analyze, rebalance_cost_usd,
};
use crate::sources::{BinSource, PriceOracle, SOL_MINT};
use crate::strategy::{RangeRecommendation, Strategy, recommend_within};
use crate::utils::format_hours;

/// Paired deposit for a range, before and after the reference cross-check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedAmountAdvice {
    pub solved: PairedAmount,
    pub quote: PairedAmountQuote,
}

impl PairedAmountAdvice {
    pub fn amount_y(&self) -> f64 {
        self.quote.amount_y
    }
}

/// Rebalance verdict for an existing position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReview {
    pub range: BinRange,
    pub analysis: RebalanceAnalysis,
    pub cost_benefit: CostBenefit,
    pub unclaimed_fees_usd: f64,
    pub sol_usd: f64,
}

impl PositionReview {
    /// History entry for moving this position to `new_range`, claiming its
    /// unclaimed fees on the way.
    pub fn record(&self, new_range: BinRange) -> RebalanceRecord {
        RebalanceRecord::new(
            self.range,
            new_range,
            self.unclaimed_fees_usd,
            self.cost_benefit.rebalance_cost_usd,
            self.analysis.priority.reason_code(),
        )
    }
}

pub struct Advisor<B: BinSource, O: PriceOracle> {
    bins: B,
    oracle: O,
    config: AdvisorConfig,
}

impl<B: BinSource, O: PriceOracle> Advisor<B, O> {
    pub fn new(bins: B, oracle: O, config: AdvisorConfig) -> Self {
        Self {
            bins,
            oracle,
            config,
        }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub async fn market_context(&self, pool: &PoolSnapshot) -> MarketContext {
        MarketContextBuilder::new(&self.bins, &self.oracle, &self.config)
            .build(pool)
            .await
    }

    /// Oracle Y-per-X for the pool's pair; lookup failures read as no quote.
    async fn oracle_price(&self, pool: &PoolSnapshot) -> Option<f64> {
        match self
            .oracle
            .price_ratio(&pool.token_x.mint, &pool.token_y.mint)
            .await
        {
            Ok(ratio) => ratio.filter(|r| r.is_finite() && *r > 0.0),
            Err(e) => {
                warn!(pool = %pool.address, error = %e, "[HEALTH] oracle ratio lookup failed");
                None
            }
        }
    }

    pub async fn recommend(
        &self,
        pool: &PoolSnapshot,
        strategy: Strategy,
    ) -> Result<RangeRecommendation> {
        let (context, oracle_price) =
            futures::join!(self.market_context(pool), self.oracle_price(pool));
        let rec = recommend_within(
            strategy,
            pool,
            &context,
            oracle_price,
            self.config.max_bins_per_position,
        )?;
        validate_range(rec.range(), self.config.max_bins_per_position)?;

        let prices = rec.price_range(pool);
        info!(
            pool = %pool.address,
            %strategy,
            min_bin = rec.min_bin_id,
            max_bin = rec.max_bin_id,
            center_bin = rec.center_bin,
            min_price = prices.min,
            max_price = prices.max,
            volatility = rec.metrics.volatility_score,
            deviation = rec.metrics.price_deviation,
            "[RANGE] recommendation ready"
        );
        Ok(rec)
    }

    /// Y amount to pair with `amount_x` over `range`, cross-checked against an
    /// optional externally computed `reference`.
    pub async fn paired_amount(
        &self,
        pool: &PoolSnapshot,
        range: BinRange,
        amount_x: f64,
        reference: Option<f64>,
    ) -> Result<PairedAmountAdvice> {
        validate_range(range, self.config.max_bins_per_position)?;

        let active_reserves = match self.bins.active_bin().await {
            Ok(bin) if bin.bin_id == pool.active_bin_id => Some(bin),
            Ok(bin) => {
                warn!(
                    pool = %pool.address,
                    snapshot_bin = pool.active_bin_id,
                    live_bin = bin.bin_id,
                    "[AMOUNT] active bin moved since snapshot; assuming even split"
                );
                None
            }
            Err(e) => {
                warn!(
                    pool = %pool.address,
                    error = %e,
                    "[AMOUNT] active bin unavailable; assuming even split"
                );
                None
            }
        };

        let solved = solve_amount_y(&PairedAmountRequest {
            amount_x,
            range,
            active_bin_id: pool.active_bin_id,
            bin_step: pool.bin_step,
            x_decimals: pool.token_x.decimals,
            y_decimals: pool.token_y.decimals,
            active_reserves,
            max_bins: self.config.max_bins_per_position,
        })?;
        let quote = cross_check(solved.amount_y, reference, self.config.cross_check_tolerance);

        info!(
            pool = %pool.address,
            amount_x,
            amount_y = quote.amount_y,
            source = ?quote.source,
            degenerate = solved.degenerate,
            divergence = ?quote.divergence,
            "[AMOUNT] paired amount solved"
        );
        Ok(PairedAmountAdvice { solved, quote })
    }

    pub async fn price_health(&self, pool: &PoolSnapshot) -> PriceHealth {
        let oracle_price = self.oracle_price(pool).await;
        let health = check_price_health(pool, oracle_price, self.config.health_deviation_limit);
        if health.is_healthy {
            info!(
                pool = %pool.address,
                pool_price = health.pool_price,
                oracle_price = ?health.oracle_price,
                deviation = health.deviation,
                "[HEALTH] pool price in line with oracle"
            );
        } else {
            warn!(
                pool = %pool.address,
                pool_price = health.pool_price,
                oracle_price = ?health.oracle_price,
                deviation = health.deviation,
                limit = self.config.health_deviation_limit,
                "[HEALTH] pool price deviates from oracle"
            );
        }
        health
    }

    /// Rebalance priority and payback for `position` against the pool's
    /// current active bin. `time_in_range` overrides the default estimate.
    pub async fn evaluate_position(
        &self,
        pool: &PoolSnapshot,
        position: &Position,
        time_in_range: Option<f64>,
    ) -> PositionReview {
        let mints = [
            pool.token_x.mint.clone(),
            pool.token_y.mint.clone(),
            SOL_MINT.to_string(),
        ];
        let quotes = match self.oracle.usd_prices(&mints).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(pool = %pool.address, error = %e, "[REBAL] usd price lookup failed");
                Default::default()
            }
        };
        let (x_usd, y_usd) = resolve_usd_prices(
            quotes.get(&pool.token_x.mint).copied(),
            quotes.get(&pool.token_y.mint).copied(),
            pool.pool_price(),
        );
        let sol_quote = quotes
            .get(SOL_MINT)
            .copied()
            .filter(|p| p.is_finite() && *p > 0.0);
        let sol_usd = match sol_quote {
            Some(price) => price,
            None => {
                warn!(
                    fallback = self.config.fallback_sol_usd,
                    "[REBAL] no SOL quote; using fallback price"
                );
                self.config.fallback_sol_usd
            }
        };

        let current = Position {
            active_bin_id: pool.active_bin_id,
            ..position.clone()
        };
        let inputs = FeeInputs {
            x_usd,
            y_usd,
            time_in_range,
            fee_uplift: self.config.fee_uplift,
            rebalance_cost_usd: rebalance_cost_usd(self.config.rebalance_cost_sol, sol_usd),
        };
        let analysis = analyze(&current, pool, &inputs);
        let cost_benefit = CostBenefit::from_analysis(&analysis);

        info!(
            position = %position.public_key,
            priority = ?analysis.priority,
            should_rebalance = analysis.should_rebalance,
            distance = analysis.distance_from_center,
            daily_fees = analysis.current_daily_fees,
            cost_usd = cost_benefit.rebalance_cost_usd,
            break_even = %format_hours(cost_benefit.break_even_hours),
            "[REBAL] {}",
            analysis.reason
        );

        PositionReview {
            range: current.range(),
            unclaimed_fees_usd: current.unclaimed_fees_usd(x_usd, y_usd),
            analysis,
            cost_benefit,
            sol_usd,
        }
    }
}
