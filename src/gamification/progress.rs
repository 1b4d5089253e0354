/// Percentage of `completed` out of `total`, rounded, always within `0..=100`.
///
/// A non-positive `total` yields 0, negative `completed` counts as 0.
pub fn progress_percent(completed: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }

    let completed = completed.clamp(0, total);
    let percent = (completed as f64 * 100.0 / total as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_total_is_zero() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(5, 0), 0);
        assert_eq!(progress_percent(5, -3), 0);
    }

    #[test]
    fn never_exceeds_hundred() {
        assert_eq!(progress_percent(12, 10), 100);
        assert_eq!(progress_percent(i64::MAX, 1), 100);
    }

    #[test]
    fn negative_completed_clamps_to_zero() {
        assert_eq!(progress_percent(-4, 10), 0);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 2), 50);
        assert_eq!(progress_percent(10, 10), 100);
    }
}
