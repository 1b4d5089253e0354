use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    instructor_id: Uuid,
    title: String,
    description: String,
    required_tier: i32,
    published: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub title: String,
    pub description: String,
    pub required_tier: Option<i32>,
    pub published: Option<bool>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instructor_id(&self) -> Uuid {
        self.instructor_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required_tier(&self) -> i32 {
        self.required_tier
    }

    pub fn published(&self) -> bool {
        self.published
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, uuid::Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO courses (id, instructor_id, title, description, required_tier, published)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.required_tier.unwrap_or(0).max(0))
        .bind(data.published.unwrap_or(false))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let required_tier = data.required_tier.unwrap_or(self.required_tier).max(0);
        let published = data.published.unwrap_or(self.published);

        sqlx::query(
            "UPDATE courses SET title = $1, description = $2, required_tier = $3, published = $4 WHERE id = $5",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(required_tier)
        .bind(published)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.required_tier = required_tier;
        self.published = published;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Published catalogue only.
    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE published ORDER BY created_at DESC, title LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE published")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid);

#[async_trait]
impl HasOwner for Course {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.instructor_id)
    }
}

impl Course {
    pub async fn find_by_title(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        title: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE title = $1")
            .bind(title)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn count_all(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }

    /// Course a lesson belongs to.
    pub async fn find_by_lesson(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT c.*
            FROM courses c
            JOIN modules m ON m.course_id = c.id
            JOIN lessons l ON l.module_id = m.id
            WHERE l.id = $1
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }
}

// Utils

#[derive(sqlx::FromRow)]
pub struct ModuleWithLessonsRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub lessons: serde_json::Value,
}

impl ModuleWithLessonsRow {
    /// Modules of a course with their lessons, flagged with the actor's completion.
    pub async fn fetch_for_course(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<ModuleWithLessonsRow> = sqlx::query_as(
            r#"
            SELECT
            m.id,
            m.title,
            m.description,
            m.order_index,
            COALESCE(
                json_agg(
                    json_build_object(
                        'id', l.id,
                        'title', l.title,
                        'order_index', l.order_index,
                        'completed', lp.id IS NOT NULL
                    )
                    ORDER BY l.order_index
                ) FILTER (WHERE l.id IS NOT NULL),
                '[]'
            ) AS lessons
            FROM modules m
            LEFT JOIN lessons l ON l.module_id = m.id
            LEFT JOIN lesson_progress lp
            ON lp.lesson_id = l.id
            AND lp.user_id = $2
            WHERE m.course_id = $1
            GROUP BY m.id
            ORDER BY m.order_index;
        "#,
        )
        .bind(course_id)
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

/// Enrollment and completion figures for one course of an instructor.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseStatsRow {
    pub course_id: Uuid,
    pub title: String,
    pub published: bool,
    pub total_lessons: i64,
    pub enrollments: i64,
    pub completions: i64,
    /// Sum over enrollments of completed lessons, used to derive the average progress.
    pub completed_lessons_sum: i64,
}

impl CourseStatsRow {
    pub async fn fetch_for_instructor(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        instructor_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                c.id AS course_id,
                c.title,
                c.published,
                (SELECT COUNT(*) FROM lessons l
                    JOIN modules m ON m.id = l.module_id
                    WHERE m.course_id = c.id) AS total_lessons,
                (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrollments,
                (SELECT COUNT(*) FROM enrollments e
                    WHERE e.course_id = c.id AND e.completed_at IS NOT NULL) AS completions,
                (SELECT COUNT(*) FROM enrollments e
                    JOIN lesson_progress lp ON lp.user_id = e.user_id
                    JOIN lessons l ON l.id = lp.lesson_id
                    JOIN modules m ON m.id = l.module_id
                    WHERE e.course_id = c.id AND m.course_id = c.id) AS completed_lessons_sum
            FROM courses c
            WHERE c.instructor_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(instructor_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
