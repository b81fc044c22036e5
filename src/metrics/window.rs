use thiserror::Error;

pub const DEFAULT_DAYS: u32 = 7;
pub const MAX_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("invalid window size {0:?}: expected a number in [1, 90]")]
    Invalid(String),
}

/// Parse the optional `days` query value into a window size.
///
/// Absent ⇒ 7. Present values must be finite with `0 < n ≤ 90` and are
/// floored, so `"7.9"` becomes 7. Anything that floors to 0 is rejected.
pub fn parse_days(raw: Option<&str>) -> Result<u32, WindowError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_DAYS);
    };

    let n: f64 = raw
        .trim()
        .parse()
        .map_err(|_| WindowError::Invalid(raw.to_owned()))?;

    if !n.is_finite() || n <= 0.0 || n > MAX_DAYS as f64 || n.floor() < 1.0 {
        return Err(WindowError::Invalid(raw.to_owned()));
    }

    Ok(n.floor() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_defaults_to_seven() {
        assert_eq!(parse_days(None), Ok(7));
    }

    #[test]
    fn accepts_boundaries() {
        assert_eq!(parse_days(Some("1")), Ok(1));
        assert_eq!(parse_days(Some("90")), Ok(90));
        assert_eq!(parse_days(Some(" 30 ")), Ok(30));
    }

    #[test]
    fn floors_fractional_values() {
        assert_eq!(parse_days(Some("7.9")), Ok(7));
        assert_eq!(parse_days(Some("89.99")), Ok(89));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        for raw in ["0", "0.5", "0.999", "-1", "91", "90.5", "abc", "", "NaN", "inf", "-inf"] {
            assert!(
                matches!(parse_days(Some(raw)), Err(WindowError::Invalid(_))),
                "{raw:?} should be rejected"
            );
        }
    }
}
