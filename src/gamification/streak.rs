use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Streak {
    /// Consecutive active days ending today, or yesterday if today has no activity yet.
    pub current: u32,
    pub longest: u32,
    pub last_active: Option<NaiveDate>,
}

/// Counts consecutive activity days. `days` may be unordered and contain duplicates.
pub fn compute_streak(days: &[NaiveDate], today: NaiveDate) -> Streak {
    let mut days: Vec<NaiveDate> = days.iter().copied().filter(|d| *d <= today).collect();
    days.sort_unstable();
    days.dedup();

    let Some(&last_active) = days.last() else {
        return Streak::default();
    };

    let mut longest: u32 = 1;
    let mut run: u32 = 1;
    for pair in days.windows(2) {
        if pair[1].signed_duration_since(pair[0]).num_days() == 1 {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }

    // `run` now holds the length of the run ending at `last_active`
    let gap = today.signed_duration_since(last_active).num_days();
    let current = if gap <= 1 { run } else { 0 };

    Streak {
        current,
        longest,
        last_active: Some(last_active),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn no_activity() {
        assert_eq!(compute_streak(&[], d(10)), Streak::default());
    }

    #[test]
    fn run_ending_today() {
        let s = compute_streak(&[d(8), d(9), d(10)], d(10));
        assert_eq!(s.current, 3);
        assert_eq!(s.longest, 3);
        assert_eq!(s.last_active, Some(d(10)));
    }

    #[test]
    fn today_not_active_yet_keeps_streak() {
        let s = compute_streak(&[d(8), d(9)], d(10));
        assert_eq!(s.current, 2);
    }

    #[test]
    fn gap_breaks_current_but_not_longest() {
        let s = compute_streak(&[d(1), d(2), d(3), d(4), d(7)], d(10));
        assert_eq!(s.current, 0);
        assert_eq!(s.longest, 4);
    }

    #[test]
    fn unordered_duplicates() {
        let s = compute_streak(&[d(10), d(9), d(9), d(5), d(10), d(8)], d(10));
        assert_eq!(s.current, 3);
        assert_eq!(s.longest, 3);
    }

    #[test]
    fn crosses_month_boundary() {
        let end_of_feb = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        let s = compute_streak(&[end_of_feb, d(1), d(2)], d(2));
        assert_eq!(s.current, 3);
    }

    #[test]
    fn future_days_ignored() {
        let s = compute_streak(&[d(9), d(10), d(11)], d(10));
        assert_eq!(s.current, 2);
        assert_eq!(s.last_active, Some(d(10)));
    }
}
