//! Bin-range recommendation for the Spot, Curve and BidAsk shapes.
//!
//! Pure and deterministic: identical inputs give identical bin boundaries and
//! the same rationale lines in the same order.

use crate::bins::validate_bin_step;
use crate::config::DEFAULT_MAX_BINS_PER_POSITION;
use crate::errors::Result;
use crate::market::volatility::DEFAULT_VOLATILITY;
use crate::market::{CoverageNode, MarketContext, VolumeBias, price_deviation};
use crate::models::PoolSnapshot;
use crate::strategy::types::{RangeRecommendation, RangeWidth, RecommendationMetrics, Strategy};
use crate::utils::round_half_up;

const SPOT_DEVIATION_EXPANSION: f64 = 0.25;
const HIGH_DEVIATION: f64 = 0.5;
const ATR_EXPANDING: f64 = 0.02;
const ATR_CONTRACTING: f64 = 0.008;
const ATR_TARGET_ADJUSTMENT: f64 = 0.15;

const BID_BINS: (i32, i32) = (3, 20);
const ASK_BINS: (i32, i32) = (4, 30);

/// Signals shared by every strategy.
#[derive(Debug, Clone, Copy)]
struct Signals {
    active_bin_id: i32,
    volatility: f64,
    deviation: f64,
    bias: VolumeBias,
    atr_percent: Option<f64>,
    max_bins: u32,
}

/// [`recommend_within`] using the default per-position bin cap.
pub fn recommend(
    strategy: Strategy,
    pool: &PoolSnapshot,
    context: &MarketContext,
    oracle_price: Option<f64>,
) -> Result<RangeRecommendation> {
    recommend_within(
        strategy,
        pool,
        context,
        oracle_price,
        DEFAULT_MAX_BINS_PER_POSITION,
    )
}

/// Recommend a range whose deviation-driven shift never pushes the span past
/// `max_bins`. The base width itself is not capped.
pub fn recommend_within(
    strategy: Strategy,
    pool: &PoolSnapshot,
    context: &MarketContext,
    oracle_price: Option<f64>,
    max_bins: u32,
) -> Result<RangeRecommendation> {
    validate_bin_step(pool.bin_step)?;
    let pool_price = pool.pool_price();
    let signals = Signals {
        active_bin_id: pool.active_bin_id,
        volatility: context
            .volatility_score
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(DEFAULT_VOLATILITY),
        deviation: price_deviation(pool_price, oracle_price),
        bias: context
            .volume_bias
            .unwrap_or_else(|| VolumeBias::from_nodes(&context.volume_nodes, pool_price)),
        atr_percent: context.atr_percent.filter(|a| a.is_finite()),
        max_bins,
    };

    Ok(match strategy {
        Strategy::Spot => spot(&signals),
        Strategy::Curve => curve(&signals),
        Strategy::BidAsk => bid_ask(&signals, context),
    })
}

fn spot(s: &Signals) -> RangeRecommendation {
    let base = round_half_up(2.0 + s.volatility * 20.0).clamp(2, 10);
    let expanded = s.deviation > SPOT_DEVIATION_EXPANSION;
    let bins_per_side = if expanded { base + 1 } else { base };

    let mut rationale = vec![format!(
        "Volatility {:.2}% sets a base width of {base} bins per side",
        s.volatility * 100.0
    )];
    if expanded {
        rationale.push(format!(
            "Oracle deviation {:.1}% exceeds {:.0}%, widened to {bins_per_side} bins per side",
            s.deviation * 100.0,
            SPOT_DEVIATION_EXPANSION * 100.0
        ));
    } else {
        rationale.push(format!(
            "Oracle deviation {:.1}% within {:.0}%, no expansion",
            s.deviation * 100.0,
            SPOT_DEVIATION_EXPANSION * 100.0
        ));
    }
    rationale.push(format!(
        "Uniform liquidity across {} bins centered on active bin {}",
        2 * bins_per_side + 1,
        s.active_bin_id
    ));

    RangeRecommendation {
        strategy: Strategy::Spot,
        min_bin_id: s.active_bin_id.saturating_sub(bins_per_side),
        max_bin_id: s.active_bin_id.saturating_add(bins_per_side),
        center_bin: s.active_bin_id,
        width: RangeWidth::Symmetric { bins_per_side },
        rationale,
        metrics: metrics(s, 0),
    }
}

fn curve(s: &Signals) -> RangeRecommendation {
    let bins_per_side = round_half_up(6.0 + s.volatility * 30.0).clamp(4, 25);
    let raw_shift = round_half_up(s.bias.signum() as f64 * (s.deviation * 10.0).max(1.0));
    let shift = cap_shift(raw_shift, 2 * bins_per_side + 1, s.max_bins);

    let mut rationale = vec![format!(
        "Volatility {:.2}% sets {bins_per_side} bins per side around the center",
        s.volatility * 100.0
    )];
    rationale.push(match shift {
        0 if raw_shift != 0 => format!(
            "Center shift of {} bins dropped to fit {} bins",
            raw_shift.unsigned_abs(),
            s.max_bins
        ),
        0 => "Liquidity balanced around price, no center shift".to_string(),
        n if n > 0 => format!(
            "Liquidity concentrated above price, center shifted up {n} bins{}",
            cap_suffix(raw_shift, shift, s.max_bins)
        ),
        n => format!(
            "Liquidity concentrated below price, center shifted down {} bins{}",
            -n,
            cap_suffix(raw_shift, shift, s.max_bins)
        ),
    });
    if s.deviation > HIGH_DEVIATION {
        rationale.push(high_deviation_note(s.deviation));
    }

    RangeRecommendation {
        strategy: Strategy::Curve,
        min_bin_id: s
            .active_bin_id
            .saturating_sub(bins_per_side)
            .saturating_add(shift.min(0)),
        max_bin_id: s
            .active_bin_id
            .saturating_add(bins_per_side)
            .saturating_add(shift.max(0)),
        center_bin: s.active_bin_id.saturating_add(shift),
        width: RangeWidth::Symmetric { bins_per_side },
        rationale,
        metrics: metrics(s, shift),
    }
}

fn bid_ask(s: &Signals, context: &MarketContext) -> RangeRecommendation {
    let bid_fallback = round_half_up(4.0 + s.volatility * 25.0).clamp(BID_BINS.0, BID_BINS.1);
    let ask_fallback = round_half_up(6.0 + s.volatility * 35.0).clamp(ASK_BINS.0, ASK_BINS.1);

    let atr_state = AtrState::from_atr(s.atr_percent);
    let adj = atr_state.target_adjustment();
    let bid_cut = if s.bias == VolumeBias::Bearish { 0.1 } else { 0.0 };
    let ask_boost = if s.bias == VolumeBias::Bullish { 0.1 } else { 0.0 };
    let bid_target = (0.55 + adj - bid_cut).clamp(0.35, 0.9);
    let ask_target = (0.65 + adj + ask_boost).clamp(0.4, 0.95);

    let bid = coverage_span(
        &context.bid_coverage_nodes,
        s.active_bin_id,
        bid_target,
        BID_BINS,
        bid_fallback,
    );
    let ask = coverage_span(
        &context.ask_coverage_nodes,
        s.active_bin_id,
        ask_target,
        ASK_BINS,
        ask_fallback,
    );
    let raw_shift = round_half_up((s.deviation * 10.0 + 1.0) * s.bias.signum() as f64);
    let shift = cap_shift(raw_shift, bid.bins + ask.bins + 1, s.max_bins);

    let mut rationale = vec![
        coverage_note("Bid", &bid, bid_target),
        coverage_note("Ask", &ask, ask_target),
        format!(
            "Volatility {:.2}% gives fallback widths of {bid_fallback} bid / {ask_fallback} ask bins",
            s.volatility * 100.0
        ),
        match s.bias {
            VolumeBias::Bullish => format!(
                "Liquidity weighted above price, range nudged up {shift} bins{}",
                cap_suffix(raw_shift, shift, s.max_bins)
            ),
            VolumeBias::Bearish => format!(
                "Liquidity weighted below price, range nudged down {} bins{}",
                -shift,
                cap_suffix(raw_shift, shift, s.max_bins)
            ),
            VolumeBias::Neutral => "No directional liquidity bias".to_string(),
        },
    ];
    if s.deviation > HIGH_DEVIATION {
        rationale.push(high_deviation_note(s.deviation));
    }
    rationale.push(atr_state.note(s.atr_percent));

    let mut m = metrics(s, shift);
    m.atr_percent = s.atr_percent;
    m.bid_target = Some(bid_target);
    m.ask_target = Some(ask_target);
    m.bid_coverage = bid.coverage;
    m.ask_coverage = ask.coverage;

    RangeRecommendation {
        strategy: Strategy::BidAsk,
        min_bin_id: s
            .active_bin_id
            .saturating_sub(bid.bins)
            .saturating_add(shift.min(0)),
        max_bin_id: s
            .active_bin_id
            .saturating_add(ask.bins)
            .saturating_add(shift.max(0)),
        center_bin: s.active_bin_id,
        width: RangeWidth::Split {
            bid_bins: bid.bins,
            ask_bins: ask.bins,
        },
        rationale,
        metrics: m,
    }
}

/// Limit a one-sided shift so `base_span + |shift|` stays within `max_bins`.
fn cap_shift(shift: i32, base_span: i32, max_bins: u32) -> i32 {
    let room = (i64::from(max_bins) - i64::from(base_span)).clamp(0, i64::from(i32::MAX)) as i32;
    shift.clamp(-room, room)
}

fn cap_suffix(raw_shift: i32, shift: i32, max_bins: u32) -> String {
    if raw_shift == shift {
        String::new()
    } else {
        format!(" (capped from {} to fit {max_bins} bins)", raw_shift.unsigned_abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtrState {
    Expanding,
    Contracting,
    Stable,
    Unknown,
}

impl AtrState {
    fn from_atr(atr: Option<f64>) -> Self {
        match atr {
            Some(a) if a > ATR_EXPANDING => Self::Expanding,
            Some(a) if a < ATR_CONTRACTING => Self::Contracting,
            Some(_) => Self::Stable,
            None => Self::Unknown,
        }
    }

    fn target_adjustment(self) -> f64 {
        match self {
            Self::Expanding => ATR_TARGET_ADJUSTMENT,
            Self::Contracting => -ATR_TARGET_ADJUSTMENT,
            Self::Stable | Self::Unknown => 0.0,
        }
    }

    fn note(self, atr: Option<f64>) -> String {
        let pct = atr.unwrap_or_default() * 100.0;
        match self {
            Self::Expanding => format!("ATR {pct:.2}% expanding, coverage targets raised 15%"),
            Self::Contracting => format!("ATR {pct:.2}% contracting, coverage targets lowered 15%"),
            Self::Stable => format!("ATR {pct:.2}% stable, coverage targets unchanged"),
            Self::Unknown => "ATR unavailable, coverage targets unchanged".to_string(),
        }
    }
}

/// Width of one side of a BidAsk range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageSpan {
    pub bins: i32,
    /// Fraction of the side's weight inside `bins`; `None` when the fallback was used.
    pub coverage: Option<f64>,
}

/// Walk nearest-first nodes until `target` of the side's weight is covered.
///
/// The width is the distance of the last node consumed, clamped to `bounds`.
/// An empty node list yields `fallback` unchanged.
pub fn coverage_span(
    nodes: &[CoverageNode],
    active_bin_id: i32,
    target: f64,
    bounds: (i32, i32),
    fallback: i32,
) -> CoverageSpan {
    if nodes.is_empty() {
        return CoverageSpan {
            bins: fallback,
            coverage: None,
        };
    }
    let mut covered = 0.0;
    let mut distance = 0;
    for node in nodes {
        covered += node.weight;
        distance = (node.bin_id - active_bin_id).abs();
        if covered >= target {
            break;
        }
    }
    CoverageSpan {
        bins: distance.clamp(bounds.0, bounds.1),
        coverage: Some(covered.min(1.0)),
    }
}

fn coverage_note(side: &str, span: &CoverageSpan, target: f64) -> String {
    match span.coverage {
        Some(c) => format!(
            "{side} side: {} bins cover {:.1}% of sampled liquidity (target {:.0}%)",
            span.bins,
            c * 100.0,
            target * 100.0
        ),
        None => format!(
            "{side} side: no sampled liquidity, volatility fallback of {} bins",
            span.bins
        ),
    }
}

fn high_deviation_note(deviation: f64) -> String {
    format!(
        "Pool price deviates {:.1}% from oracle, verify the pool before depositing",
        deviation * 100.0
    )
}

fn metrics(s: &Signals, center_shift: i32) -> RecommendationMetrics {
    RecommendationMetrics {
        volatility_score: s.volatility,
        price_deviation: s.deviation,
        volume_bias: s.bias,
        atr_percent: s.atr_percent,
        center_shift,
        bid_target: None,
        ask_target: None,
        bid_coverage: None,
        ask_coverage: None,
    }
}
