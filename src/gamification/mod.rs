//! Points, levels, streaks, ranking and reward rules.
//!
//! Everything here is plain arithmetic over already-fetched data; the database-facing part lives
//! in [`engine`].

pub mod engine;
pub use engine::{AwardSummary, CompletedChallenge, EarnedBadge, UserProfile};

mod leaderboard;
pub use leaderboard::{RankedEntry, rank_entries};

mod level;
pub use level::{LevelInfo, level_for_xp};

mod progress;
pub use progress::progress_percent;

mod rules;
pub use rules::{ChallengeStatus, Criterion, UserStats, challenge_status};

mod streak;
pub use streak::{Streak, compute_streak};

/// XP for completing a lesson for the first time.
pub const LESSON_COMPLETED_POINTS: i64 = 10;
/// XP for the first correct answer to a quiz question.
pub const QUIZ_CORRECT_POINTS: i64 = 5;
/// Bonus XP when every lesson of an enrolled course is completed.
pub const COURSE_COMPLETED_POINTS: i64 = 50;
