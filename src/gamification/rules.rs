use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::entity::ActivityKind;

/// Statistic a badge or challenge is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    LessonsCompleted,
    CoursesCompleted,
    QuizCorrect,
    Points,
    Streak,
}

impl Criterion {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lessons_completed" => Some(Self::LessonsCompleted),
            "courses_completed" => Some(Self::CoursesCompleted),
            "quiz_correct" => Some(Self::QuizCorrect),
            "points" => Some(Self::Points),
            "streak" => Some(Self::Streak),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonsCompleted => "lessons_completed",
            Self::CoursesCompleted => "courses_completed",
            Self::QuizCorrect => "quiz_correct",
            Self::Points => "points",
            Self::Streak => "streak",
        }
    }

    /// Ledger events counted by this criterion, `None` for aggregated ones.
    pub fn activity_kind(&self) -> Option<ActivityKind> {
        match self {
            Self::LessonsCompleted => Some(ActivityKind::LessonCompleted),
            Self::CoursesCompleted => Some(ActivityKind::CourseCompleted),
            Self::QuizCorrect => Some(ActivityKind::QuizCorrect),
            Self::Points | Self::Streak => None,
        }
    }

    /// Streaks are not windowed, so they can't back a time-boxed challenge.
    pub fn usable_for_challenge(&self) -> bool {
        !matches!(self, Self::Streak)
    }
}

/// Snapshot of a user's lifetime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct UserStats {
    pub lessons_completed: i64,
    pub courses_completed: i64,
    pub quiz_correct: i64,
    pub points: i64,
    pub streak: u32,
}

impl UserStats {
    pub fn value(&self, criterion: Criterion) -> i64 {
        match criterion {
            Criterion::LessonsCompleted => self.lessons_completed,
            Criterion::CoursesCompleted => self.courses_completed,
            Criterion::QuizCorrect => self.quiz_correct,
            Criterion::Points => self.points,
            Criterion::Streak => i64::from(self.streak),
        }
    }

    pub fn qualifies(&self, criterion: Criterion, threshold: i64) -> bool {
        self.value(criterion) >= threshold
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ChallengeStatus {
    pub progress: i64,
    pub target: i64,
    pub percent: u8,
    pub completed: bool,
    pub active: bool,
    pub expired: bool,
}

pub fn challenge_status(
    progress: i64,
    target: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ChallengeStatus {
    let progress = progress.max(0);
    let completed = target > 0 && progress >= target;

    ChallengeStatus {
        progress,
        target,
        percent: super::progress_percent(progress, target),
        completed,
        active: starts_at <= now && now <= ends_at,
        expired: now > ends_at && !completed,
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;

    #[test]
    fn criterion_names_roundtrip() {
        for c in [
            Criterion::LessonsCompleted,
            Criterion::CoursesCompleted,
            Criterion::QuizCorrect,
            Criterion::Points,
            Criterion::Streak,
        ] {
            assert_eq!(Criterion::parse(c.as_str()), Some(c));
        }
        assert_eq!(Criterion::parse("likes"), None);
        assert!(!Criterion::Streak.usable_for_challenge());
        assert!(Criterion::Points.usable_for_challenge());
    }

    #[test]
    fn stats_threshold() {
        let stats = UserStats {
            lessons_completed: 5,
            points: 120,
            streak: 3,
            ..Default::default()
        };
        assert!(stats.qualifies(Criterion::LessonsCompleted, 5));
        assert!(!stats.qualifies(Criterion::LessonsCompleted, 6));
        assert!(stats.qualifies(Criterion::Streak, 3));
        assert!(stats.qualifies(Criterion::CoursesCompleted, 0));
        assert!(!stats.qualifies(Criterion::Points, 121));
    }

    #[test]
    fn challenge_lifecycle() {
        let now = Utc::now();
        let start = now - Duration::days(1);
        let end = now + Duration::days(6);

        let running = challenge_status(2, 5, start, end, now);
        assert_eq!(running.percent, 40);
        assert!(running.active && !running.completed && !running.expired);

        let done = challenge_status(7, 5, start, end, now);
        assert!(done.completed);
        assert_eq!(done.percent, 100);

        let late = challenge_status(2, 5, start, end, end + Duration::seconds(1));
        assert!(late.expired && !late.active);

        let upcoming = challenge_status(0, 5, now + Duration::days(1), end, now);
        assert!(!upcoming.active && !upcoming.expired);
    }

    #[test]
    fn zero_target_never_completes() {
        let now = Utc::now();
        let status = challenge_status(3, 0, now, now, now);
        assert!(!status.completed);
        assert_eq!(status.percent, 0);
    }
}
