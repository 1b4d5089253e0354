use serde::Serialize;

/// XP needed to reach levels 1 through 10.
const LEVEL_THRESHOLDS: [i64; 10] = [0, 100, 250, 500, 1000, 2000, 3500, 5500, 8000, 11000];
/// XP added per level past the table.
const LEVEL_STEP_AFTER_TABLE: i64 = 3500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct LevelInfo {
    pub level: u32,
    pub xp: i64,
    /// XP at which the current level started.
    pub current_level_xp: i64,
    /// XP at which the next level starts.
    pub next_level_xp: i64,
    /// Percentage of the way through the current level.
    pub progress: u8,
}

fn threshold(level: u32) -> i64 {
    let idx = level.saturating_sub(1) as usize;
    match LEVEL_THRESHOLDS.get(idx) {
        Some(xp) => *xp,
        None => {
            let last = LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1];
            let extra = (idx - (LEVEL_THRESHOLDS.len() - 1)) as i64;
            last.saturating_add(extra.saturating_mul(LEVEL_STEP_AFTER_TABLE))
        }
    }
}

pub fn level_for_xp(xp: i64) -> LevelInfo {
    let xp = xp.max(0);

    let level = match LEVEL_THRESHOLDS.iter().rposition(|t| xp >= *t) {
        Some(idx) if idx + 1 < LEVEL_THRESHOLDS.len() => idx as u32 + 1,
        _ => {
            let last = LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1];
            let extra = ((xp - last) / LEVEL_STEP_AFTER_TABLE).min(i64::from(u32::MAX) - 11);
            LEVEL_THRESHOLDS.len() as u32 + extra as u32
        }
    };

    let current_level_xp = threshold(level);
    let next_level_xp = threshold(level + 1);
    let progress = super::progress_percent(xp - current_level_xp, next_level_xp - current_level_xp);

    LevelInfo {
        level,
        xp,
        current_level_xp,
        next_level_xp,
        progress,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_at_level_one() {
        let info = level_for_xp(0);
        assert_eq!(info.level, 1);
        assert_eq!(info.current_level_xp, 0);
        assert_eq!(info.next_level_xp, 100);
        assert_eq!(info.progress, 0);
    }

    #[test]
    fn boundaries() {
        assert_eq!(level_for_xp(99).level, 1);
        assert_eq!(level_for_xp(100).level, 2);
        assert_eq!(level_for_xp(249).level, 2);
        assert_eq!(level_for_xp(250).level, 3);
        assert_eq!(level_for_xp(10_999).level, 9);
        assert_eq!(level_for_xp(11_000).level, 10);
    }

    #[test]
    fn past_the_table() {
        let info = level_for_xp(11_000 + 3500);
        assert_eq!(info.level, 11);
        assert_eq!(info.current_level_xp, 14_500);
        assert_eq!(info.next_level_xp, 18_000);

        assert_eq!(level_for_xp(11_000 + 3499).level, 10);
    }

    #[test]
    fn progress_within_level() {
        let info = level_for_xp(175);
        assert_eq!(info.level, 2);
        assert_eq!(info.progress, 50);
    }

    #[test]
    fn negative_xp_is_zero() {
        assert_eq!(level_for_xp(-50), level_for_xp(0));
    }
}
