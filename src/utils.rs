//! Miscellaneous helper utilities.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Round to the nearest integer with halves going toward +∞ (`-2.5 → -2`).
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Hours formatted for display; infinite values render as `N/A`.
pub fn format_hours(hours: f64) -> String {
    if hours.is_finite() {
        format!("{hours:.1}h")
    } else {
        "N/A".to_string()
    }
}
