//! Shared data structures used throughout the advisor.

use serde::{Deserialize, Serialize};

use crate::bins::price_at_bin;

/// Mint metadata for one side of a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub mint: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Caller-supplied view of a DLMM pool. Immutable for the duration of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub address: String,
    pub token_x: TokenMeta,
    pub token_y: TokenMeta,
    /// Basis points per bin.
    pub bin_step: u16,
    pub active_bin_id: i32,
    /// Y per X in UI units, when the data source reports one.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub tvl: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    /// Fee APR in percent.
    #[serde(default)]
    pub apr: Option<f64>,
}

impl PoolSnapshot {
    /// Reported price, or the bin model's price for the active bin.
    pub fn pool_price(&self) -> f64 {
        match self.price {
            Some(p) if p.is_finite() && p > 0.0 => p,
            _ => self.price_at(self.active_bin_id),
        }
    }

    pub fn price_at(&self, bin_id: i32) -> f64 {
        price_at_bin(
            bin_id,
            self.bin_step,
            self.token_x.decimals,
            self.token_y.decimals,
        )
    }
}

/// Inclusive bin interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinRange {
    pub min_bin_id: i32,
    pub max_bin_id: i32,
}

impl BinRange {
    pub fn new(min_bin_id: i32, max_bin_id: i32) -> Self {
        Self {
            min_bin_id,
            max_bin_id,
        }
    }

    /// Number of bins covered, counting both edges. Zero for an inverted
    /// range, `u32::MAX` when the count does not fit.
    pub fn span(&self) -> u32 {
        if self.max_bin_id < self.min_bin_id {
            return 0;
        }
        u32::try_from(i64::from(self.max_bin_id) - i64::from(self.min_bin_id) + 1)
            .unwrap_or(u32::MAX)
    }

    pub fn contains(&self, bin_id: i32) -> bool {
        bin_id >= self.min_bin_id && bin_id <= self.max_bin_id
    }

    pub fn center(&self) -> f64 {
        (self.min_bin_id as f64 + self.max_bin_id as f64) / 2.0
    }
}

/// Reserves held by one bin, in token units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinLiquiditySample {
    pub bin_id: i32,
    #[serde(default)]
    pub price: f64,
    pub x_amount: f64,
    pub y_amount: f64,
}

impl BinLiquiditySample {
    pub fn has_liquidity(&self) -> bool {
        self.x_amount > 0.0 || self.y_amount > 0.0
    }
}

/// Reserves of the bin currently containing the market price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveBin {
    pub bin_id: i32,
    pub x_amount: f64,
    pub y_amount: f64,
}

/// One observation of an oracle price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix seconds.
    pub timestamp: i64,
    pub price: f64,
}

/// Existing liquidity position, read-only to the advisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub public_key: String,
    pub pool_address: String,
    pub lower_bin_id: i32,
    pub upper_bin_id: i32,
    pub active_bin_id: i32,
    pub x_amount: f64,
    pub y_amount: f64,
    #[serde(default)]
    pub fee_x: f64,
    #[serde(default)]
    pub fee_y: f64,
    /// Per-bin reserves, when the protocol client exposes them.
    #[serde(default)]
    pub bins: Vec<PositionBin>,
}

impl Position {
    pub fn range(&self) -> BinRange {
        BinRange::new(self.lower_bin_id, self.upper_bin_id)
    }

    pub fn is_in_range(&self) -> bool {
        self.range().contains(self.active_bin_id)
    }

    /// USD value of the deposited reserves.
    pub fn value_usd(&self, x_usd: f64, y_usd: f64) -> f64 {
        self.x_amount * x_usd + self.y_amount * y_usd
    }

    pub fn unclaimed_fees_usd(&self, x_usd: f64, y_usd: f64) -> f64 {
        self.fee_x * x_usd + self.fee_y * y_usd
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionBin {
    pub bin_id: i32,
    pub x_amount: f64,
    pub y_amount: f64,
}
