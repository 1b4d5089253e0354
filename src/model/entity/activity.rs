use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Rewarded events. A `(user, kind, ref_id)` triple is recorded at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    LessonCompleted,
    QuizCorrect,
    CourseCompleted,
    BadgeEarned,
    ChallengeCompleted,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonCompleted => "lesson_completed",
            Self::QuizCorrect => "quiz_correct",
            Self::CourseCompleted => "course_completed",
            Self::BadgeEarned => "badge_earned",
            Self::ChallengeCompleted => "challenge_completed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Activity {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    ref_id: Uuid,
    points: i64,
    occurred_at: DateTime<Utc>,
}

impl ResourceTyped for Activity {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Activity
    }
}

impl Activity {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn ref_id(&self) -> Uuid {
        self.ref_id
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn occurred_at(&self) -> &DateTime<Utc> {
        &self.occurred_at
    }
}

impl Activity {
    /// Returns `true` if the event was new and its points were granted.
    pub async fn record(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        kind: ActivityKind,
        ref_id: Uuid,
        points: i64,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO activities (id, user_id, kind, ref_id, points)
            VALUES ($1,$2,$3,$4,$5)
            ON CONFLICT (user_id, kind, ref_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(kind.as_str())
        .bind(ref_id)
        .bind(points.max(0))
        .execute(mm.executor())
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            tracing::debug!(user = %actor.user_id(), kind = kind.as_str(), points, "activity recorded");
        }
        Ok(inserted)
    }

    pub async fn total_points(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(points), 0)::BIGINT FROM activities WHERE user_id = $1")
                .bind(actor.user_id())
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn count_kind(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        kind: ActivityKind,
    ) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE user_id = $1 AND kind = $2")
                .bind(actor.user_id())
                .bind(kind.as_str())
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn count_kind_between(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        kind: ActivityKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activities
            WHERE user_id = $1 AND kind = $2 AND occurred_at BETWEEN $3 AND $4
            "#,
        )
        .bind(actor.user_id())
        .bind(kind.as_str())
        .bind(from)
        .bind(to)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn points_between(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(points), 0)::BIGINT FROM activities
            WHERE user_id = $1 AND occurred_at BETWEEN $2 AND $3
            "#,
        )
        .bind(actor.user_id())
        .bind(from)
        .bind(to)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    /// Distinct UTC days with any learning activity, quiz checks included.
    pub async fn activity_days(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<NaiveDate>> {
        let days: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT day FROM (
                SELECT (occurred_at AT TIME ZONE 'UTC')::date AS day
                FROM activities WHERE user_id = $1
                UNION
                SELECT (created_at AT TIME ZONE 'UTC')::date AS day
                FROM quiz_attempts WHERE user_id = $1
            ) days
            ORDER BY day
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(days)
    }

    pub async fn recent(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM activities WHERE user_id = $1 ORDER BY occurred_at DESC LIMIT $2",
        )
        .bind(actor.user_id())
        .bind(limit)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

// Utils

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub username: String,
    pub points: i64,
}

impl LeaderboardRow {
    /// Users ordered by total points, optionally limited to one company.
    pub async fn fetch_top(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        company_id: Option<Uuid>,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                COALESCE(SUM(a.points), 0)::BIGINT AS points
            FROM users u
            LEFT JOIN activities a ON a.user_id = u.id
            WHERE u.role <> 'admin'
            AND ($2::uuid IS NULL OR u.company_id = $2)
            GROUP BY u.id, u.username
            ORDER BY points DESC, u.username ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(company_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
