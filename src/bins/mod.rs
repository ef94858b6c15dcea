//! Bin ladder math: bin → price, range validation and paired deposit sizing.

pub mod amounts;
pub mod price;
pub mod range;

pub use amounts::{
    AmountSource, PairedAmount, PairedAmountQuote, PairedAmountRequest, cross_check,
    solve_amount_y,
};
pub use price::{PriceRange, bin_id_for_price, price_at_bin, price_range, validate_bin_step};
pub use range::validate_range;
