use crate::errors::{AdvisorError, Result};
use crate::models::BinRange;

/// Reject inverted ranges and ranges wider than the per-position bin cap.
pub fn validate_range(range: BinRange, max_bins: u32) -> Result<()> {
    if range.min_bin_id > range.max_bin_id {
        return Err(AdvisorError::invalid(format!(
            "min bin {} is above max bin {}",
            range.min_bin_id, range.max_bin_id
        )));
    }
    let span = range.span();
    if span > max_bins {
        return Err(AdvisorError::RangeTooWide {
            span,
            limit: max_bins,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_span_at_limit() {
        assert!(validate_range(BinRange::new(0, 69), 70).is_ok());
        assert!(validate_range(BinRange::new(5, 5), 70).is_ok());
    }

    #[test]
    fn names_the_limit_when_too_wide() {
        let err = validate_range(BinRange::new(0, 70), 70).unwrap_err();
        assert!(matches!(err, AdvisorError::RangeTooWide { span: 71, limit: 70 }));
        assert!(err.to_string().contains("limit of 70 bins"));
    }

    #[test]
    fn inverted_range_is_invalid_input() {
        let err = validate_range(BinRange::new(10, 9), 70).unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidInput(_)));
    }
}
