//! Pure metric arithmetic, kept separate from the queries that feed it.

/// Share of closed deals that were won, as a percentage.
///
/// Defined as 0 when nothing has closed yet rather than dividing by zero.
pub fn satisfaction_rate(won: i64, lost: i64) -> f64 {
    let closed = won + lost;
    if closed == 0 {
        return 0.0;
    }
    won as f64 / closed as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_zero_with_no_closed_deals() {
        assert_eq!(satisfaction_rate(0, 0), 0.0);
    }

    #[test]
    fn rate_is_won_share_of_closed() {
        assert_eq!(satisfaction_rate(3, 1), 75.0);
        assert_eq!(satisfaction_rate(0, 5), 0.0);
        assert_eq!(satisfaction_rate(5, 0), 100.0);
    }

    #[test]
    fn rate_handles_uneven_splits() {
        let rate = satisfaction_rate(1, 2);
        assert!((rate - 33.333333).abs() < 0.001);
    }
}
