//! Grants points, badges and challenge rewards after learning events.
//!
//! Every reward goes through [`Activity::record`], whose unique `(user, kind, ref_id)` constraint
//! makes a repeated event a no-op.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::gamification::{
    COURSE_COMPLETED_POINTS, LESSON_COMPLETED_POINTS, LevelInfo, QUIZ_CORRECT_POINTS, Streak,
    UserStats, compute_streak, level_for_xp,
};
use crate::model::entity::{
    Activity, ActivityKind, Badge, Challenge, Course, Enrollment, LessonProgress,
};
use crate::model::{DatabaseResult, ModelManager};
use crate::web::AuthenticatedUser;

/// Evaluating badges can grant points that unlock further badges; stop after this many rounds.
const MAX_BADGE_ROUNDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct EarnedBadge {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CompletedChallenge {
    pub id: Uuid,
    pub title: String,
    pub reward_points: i64,
}

/// What a single event earned the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct AwardSummary {
    pub points_awarded: i64,
    pub new_badges: Vec<EarnedBadge>,
    pub completed_challenges: Vec<CompletedChallenge>,
    pub course_completed: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    pub points: i64,
    pub level: LevelInfo,
    pub streak: Streak,
}

/// Marks the lesson done and runs the reward pipeline. Safe to call repeatedly.
#[tracing::instrument(skip(mm, actor), fields(user = %actor.user_id()))]
pub async fn on_lesson_completed(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    lesson_id: Uuid,
) -> DatabaseResult<AwardSummary> {
    let mut summary = AwardSummary::default();

    if LessonProgress::mark(mm, actor, lesson_id).await?
        && Activity::record(
            mm,
            actor,
            ActivityKind::LessonCompleted,
            lesson_id,
            LESSON_COMPLETED_POINTS,
        )
        .await?
    {
        summary.points_awarded += LESSON_COMPLETED_POINTS;
    }

    if let Some(course) = Course::find_by_lesson(mm, actor, lesson_id).await? {
        refresh_course_completion(mm, actor, course.id(), &mut summary).await?;
    }

    evaluate_badges(mm, actor, &mut summary).await?;
    evaluate_challenges(mm, actor, &mut summary).await?;
    Ok(summary)
}

/// Called for a correct quiz check. Returns whether this was the first correct answer to the
/// question; only that one is worth points.
#[tracing::instrument(skip(mm, actor), fields(user = %actor.user_id()))]
pub async fn on_quiz_correct(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    question_id: Uuid,
    lesson_id: Uuid,
) -> DatabaseResult<(bool, AwardSummary)> {
    let mut summary = AwardSummary::default();

    let first_correct = Activity::record(
        mm,
        actor,
        ActivityKind::QuizCorrect,
        question_id,
        QUIZ_CORRECT_POINTS,
    )
    .await?;
    if first_correct {
        summary.points_awarded += QUIZ_CORRECT_POINTS;
    }

    if let Some(course) = Course::find_by_lesson(mm, actor, lesson_id).await? {
        refresh_course_completion(mm, actor, course.id(), &mut summary).await?;
    }

    evaluate_badges(mm, actor, &mut summary).await?;
    evaluate_challenges(mm, actor, &mut summary).await?;
    Ok((first_correct, summary))
}

/// Sets the enrollment's completion and grants the course bonus the first time every lesson
/// of the course is done. Does nothing for users who are not enrolled.
pub async fn refresh_course_completion(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
    summary: &mut AwardSummary,
) -> DatabaseResult<()> {
    if Enrollment::find(mm, actor, course_id).await?.is_none() {
        return Ok(());
    }

    let (total, completed) = LessonProgress::course_counts(mm, actor, course_id).await?;
    if total == 0 || completed < total {
        return Ok(());
    }

    if Enrollment::mark_completed(mm, actor, course_id).await? {
        summary.course_completed = true;
        if Activity::record(
            mm,
            actor,
            ActivityKind::CourseCompleted,
            course_id,
            COURSE_COMPLETED_POINTS,
        )
        .await?
        {
            summary.points_awarded += COURSE_COMPLETED_POINTS;
        }
        tracing::info!(%course_id, "course completed");
    }
    Ok(())
}

pub async fn load_stats(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<UserStats> {
    let (lessons_completed, courses_completed, quiz_correct, points, days) = tokio::try_join!(
        Activity::count_kind(mm, actor, ActivityKind::LessonCompleted),
        Activity::count_kind(mm, actor, ActivityKind::CourseCompleted),
        Activity::count_kind(mm, actor, ActivityKind::QuizCorrect),
        Activity::total_points(mm, actor),
        Activity::activity_days(mm, actor),
    )?;

    Ok(UserStats {
        lessons_completed,
        courses_completed,
        quiz_correct,
        points,
        streak: compute_streak(&days, Utc::now().date_naive()).current,
    })
}

pub async fn load_profile(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<UserProfile> {
    let (points, days) = tokio::try_join!(
        Activity::total_points(mm, actor),
        Activity::activity_days(mm, actor),
    )?;

    Ok(UserProfile {
        points,
        level: level_for_xp(points),
        streak: compute_streak(&days, Utc::now().date_naive()),
    })
}

async fn evaluate_badges(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    summary: &mut AwardSummary,
) -> DatabaseResult<()> {
    for _ in 0..MAX_BADGE_ROUNDS {
        let candidates = Badge::unearned(mm, actor).await?;
        if candidates.is_empty() {
            break;
        }

        let stats = load_stats(mm, actor).await?;
        let mut awarded_any = false;

        for badge in candidates {
            let Some(criterion) = badge.criteria() else {
                continue;
            };
            if !stats.qualifies(criterion, badge.threshold()) || !badge.award(mm, actor).await? {
                continue;
            }

            if Activity::record(mm, actor, ActivityKind::BadgeEarned, badge.id(), badge.points())
                .await?
            {
                summary.points_awarded += badge.points();
            }
            tracing::info!(badge = badge.code(), "badge earned");

            awarded_any |= badge.points() > 0;
            summary.new_badges.push(EarnedBadge {
                id: badge.id(),
                code: badge.code().to_string(),
                name: badge.name().to_string(),
                points: badge.points(),
            });
        }

        // only newly granted points can unlock more badges
        if !awarded_any {
            break;
        }
    }
    Ok(())
}

async fn evaluate_challenges(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    summary: &mut AwardSummary,
) -> DatabaseResult<()> {
    let now = Utc::now();

    for challenge in Challenge::joined_open(mm, actor, now).await? {
        if challenge.target() <= 0 {
            continue;
        }

        let progress = challenge.progress(mm, actor).await?;
        if progress < challenge.target() || !challenge.mark_completed(mm, actor).await? {
            continue;
        }

        if Activity::record(
            mm,
            actor,
            ActivityKind::ChallengeCompleted,
            challenge.id(),
            challenge.reward_points(),
        )
        .await?
        {
            summary.points_awarded += challenge.reward_points();
        }
        tracing::info!(challenge = challenge.title(), "challenge completed");

        summary.completed_challenges.push(CompletedChallenge {
            id: challenge.id(),
            title: challenge.title().to_string(),
            reward_points: challenge.reward_points(),
        });
    }
    Ok(())
}
