//! Paired deposit sizing across a bin range.
//!
//! Bins above the active bin hold only X, bins below hold only Y and the
//! active bin holds both. Spreading a unit of value over the range with that
//! composition gives per-unit X and Y capacities; the X deposit fixes the
//! scale and the Y amount follows.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bins::price::{price_at_bin, validate_bin_step};
use crate::bins::range::validate_range;
use crate::errors::{AdvisorError, Result};
use crate::models::{ActiveBin, BinRange};

/// Inputs for [`solve_amount_y`].
#[derive(Debug, Clone, Copy)]
pub struct PairedAmountRequest {
    pub amount_x: f64,
    pub range: BinRange,
    pub active_bin_id: i32,
    pub bin_step: u16,
    pub x_decimals: u8,
    pub y_decimals: u8,
    /// Reserves of the active bin; a 50/50 split is assumed when absent.
    pub active_reserves: Option<ActiveBin>,
    /// Widest range accepted, in bins.
    pub max_bins: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairedAmount {
    pub amount_y: f64,
    /// X absorbed per unit of value spread over the range.
    pub capacity_x: f64,
    /// Y absorbed per unit of value spread over the range.
    pub capacity_y: f64,
    /// The range holds no X at all, so an X deposit cannot be paired.
    /// `amount_y` is zero in that case.
    pub degenerate: bool,
}

pub fn solve_amount_y(req: &PairedAmountRequest) -> Result<PairedAmount> {
    validate_bin_step(req.bin_step)?;
    validate_range(req.range, req.max_bins)?;
    if !req.amount_x.is_finite() || req.amount_x < 0.0 {
        return Err(AdvisorError::invalid(format!(
            "amount_x must be a finite non-negative number, got {}",
            req.amount_x
        )));
    }

    let active_share_x = active_bin_share_x(req);
    let mut capacity_x = 0.0;
    let mut capacity_y = 0.0;
    for bin_id in req.range.min_bin_id..=req.range.max_bin_id {
        let price = price_at_bin(bin_id, req.bin_step, req.x_decimals, req.y_decimals);
        let share_x = if bin_id > req.active_bin_id {
            1.0
        } else if bin_id < req.active_bin_id {
            0.0
        } else {
            active_share_x
        };
        capacity_x += share_x / price;
        capacity_y += 1.0 - share_x;
    }

    if capacity_x == 0.0 {
        warn!(
            min_bin = req.range.min_bin_id,
            max_bin = req.range.max_bin_id,
            active_bin = req.active_bin_id,
            "[AMOUNT] range holds only Y, X deposit cannot be paired"
        );
        return Ok(PairedAmount {
            amount_y: 0.0,
            capacity_x,
            capacity_y,
            degenerate: true,
        });
    }

    let value = req.amount_x / capacity_x;
    Ok(PairedAmount {
        amount_y: value * capacity_y,
        capacity_x,
        capacity_y,
        degenerate: false,
    })
}

/// X share of the active bin's value, from its reserves when both sides are funded.
fn active_bin_share_x(req: &PairedAmountRequest) -> f64 {
    let Some(reserves) = req.active_reserves else {
        return 0.5;
    };
    if !(reserves.x_amount > 0.0 && reserves.y_amount > 0.0) {
        return 0.5;
    }
    let price = price_at_bin(
        req.active_bin_id,
        req.bin_step,
        req.x_decimals,
        req.y_decimals,
    );
    let x_value = reserves.x_amount * price;
    x_value / (x_value + reserves.y_amount)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountSource {
    BinSpread,
    Reference,
}

/// Bin-spread amount reconciled against an externally computed estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedAmountQuote {
    pub amount_y: f64,
    pub source: AmountSource,
    pub bin_spread_amount_y: f64,
    pub reference_amount_y: Option<f64>,
    /// `|reference - bin_spread| / bin_spread`, when both are usable.
    pub divergence: Option<f64>,
    pub warning: Option<String>,
}

/// Prefer the reference while it agrees with the bin-spread figure within
/// `tolerance`; past that the reference is assumed distorted by a temporarily
/// imbalanced pool and the bin-spread value wins.
pub fn cross_check(bin_spread: f64, reference: Option<f64>, tolerance: f64) -> PairedAmountQuote {
    let usable_reference = reference.filter(|r| r.is_finite() && *r >= 0.0);
    let mut quote = PairedAmountQuote {
        amount_y: bin_spread,
        source: AmountSource::BinSpread,
        bin_spread_amount_y: bin_spread,
        reference_amount_y: usable_reference,
        divergence: None,
        warning: None,
    };
    let Some(reference) = usable_reference else {
        return quote;
    };
    if bin_spread <= 0.0 {
        if reference > 0.0 {
            quote.warning = Some(format!(
                "bin-spread amount is zero but reference suggests {reference:.6}"
            ));
        }
        return quote;
    }

    let divergence = (reference - bin_spread).abs() / bin_spread;
    quote.divergence = Some(divergence);
    if divergence > tolerance {
        let msg = format!(
            "reference amount {reference:.6} diverges {:.1}% from bin-spread amount {bin_spread:.6}; using bin-spread",
            divergence * 100.0
        );
        warn!(reference, bin_spread, divergence, "[AMOUNT] {msg}");
        quote.warning = Some(msg);
    } else {
        quote.amount_y = reference;
        quote.source = AmountSource::Reference;
    }
    quote
}
