use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonProgress {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    completed_at: DateTime<Utc>,
}

impl ResourceTyped for LessonProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LessonProgress
    }
}

impl LessonProgress {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn completed_at(&self) -> &DateTime<Utc> {
        &self.completed_at
    }
}

impl LessonProgress {
    /// Records completion. Returns `true` when the lesson was not completed before.
    pub async fn mark(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO lesson_progress (id, user_id, lesson_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(lesson_id)
        .execute(mm.executor())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count_completed(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lesson_progress WHERE user_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }

    /// `(total_lessons, completed_lessons)` of a course for the actor.
    pub async fn course_counts(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<(i64, i64)> {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(l.id), COUNT(lp.id)
            FROM modules m
            JOIN lessons l ON l.module_id = m.id
            LEFT JOIN lesson_progress lp
                ON lp.lesson_id = l.id AND lp.user_id = $2
            WHERE m.course_id = $1
            "#,
        )
        .bind(course_id)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }
}
