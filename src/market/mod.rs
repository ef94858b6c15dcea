//! Market signal extraction from sampled bins and oracle data.

pub mod context;
pub mod health;
pub mod volatility;

pub use context::{
    CoverageNode, MarketContext, MarketContextBuilder, MarketInputs, VolumeBias, VolumeNode,
    build_context,
};
pub use health::{PriceHealth, check_price_health, price_deviation};
pub use volatility::{VolatilityEstimate, VolatilitySource};
