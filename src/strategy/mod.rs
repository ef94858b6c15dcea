pub mod recommender;
pub mod types;

pub use recommender::{CoverageSpan, coverage_span, recommend, recommend_within};
pub use types::{RangeRecommendation, RangeWidth, RecommendationMetrics, Strategy};
