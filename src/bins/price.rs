use serde::{Deserialize, Serialize};

use crate::errors::{AdvisorError, Result};
use crate::models::BinRange;

/// Price of `bin_id` in Y per X, UI units.
///
/// `(1 + bin_step / 10_000)^bin_id * 10^(x_decimals - y_decimals)`
pub fn price_at_bin(bin_id: i32, bin_step: u16, x_decimals: u8, y_decimals: u8) -> f64 {
    let step_ratio = 1.0 + bin_step as f64 / 10_000.0;
    step_ratio.powi(bin_id) * decimals_factor(x_decimals, y_decimals)
}

/// Nearest bin for a UI price. Inverse of [`price_at_bin`] up to rounding.
pub fn bin_id_for_price(price: f64, bin_step: u16, x_decimals: u8, y_decimals: u8) -> Option<i32> {
    if !(price.is_finite() && price > 0.0) || bin_step == 0 {
        return None;
    }
    let raw = price / decimals_factor(x_decimals, y_decimals);
    let step_ratio = 1.0 + bin_step as f64 / 10_000.0;
    let id = (raw.ln() / step_ratio.ln()).round();
    if id < i32::MIN as f64 || id > i32::MAX as f64 {
        return None;
    }
    Some(id as i32)
}

pub fn validate_bin_step(bin_step: u16) -> Result<()> {
    if bin_step == 0 {
        return Err(AdvisorError::invalid("bin step must be greater than zero"));
    }
    Ok(())
}

/// Prices at the edges and midpoint of a bin range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub center: f64,
    pub max: f64,
}

pub fn price_range(range: BinRange, bin_step: u16, x_decimals: u8, y_decimals: u8) -> PriceRange {
    let center_bin = range.min_bin_id + (range.max_bin_id - range.min_bin_id) / 2;
    PriceRange {
        min: price_at_bin(range.min_bin_id, bin_step, x_decimals, y_decimals),
        center: price_at_bin(center_bin, bin_step, x_decimals, y_decimals),
        max: price_at_bin(range.max_bin_id, bin_step, x_decimals, y_decimals),
    }
}

fn decimals_factor(x_decimals: u8, y_decimals: u8) -> f64 {
    10_f64.powi(x_decimals as i32 - y_decimals as i32)
}
