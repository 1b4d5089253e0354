use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Company {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CompanyCreate {
    pub name: String,
}

impl ResourceTyped for Company {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Company
    }
}

impl Company {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl CrudRepository<Company, CompanyCreate, uuid::Uuid> for Company {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CompanyCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as("INSERT INTO companies (id, name) VALUES ($1,$2) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(&data.name)
            .fetch_one(mm.executor())
            .await?;
        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CompanyCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE companies SET name = $1 WHERE id = $2")
            .bind(&data.name)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.name = data.name;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM companies WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM companies ORDER BY name LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Company, CompanyCreate, Uuid);

impl Company {
    pub async fn find_by_name(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        name: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM companies WHERE name = $1")
            .bind(name)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

// Utils

/// Per-member learning summary for the company dashboard.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CompanyMemberRow {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub points: i64,
    pub enrolled_courses: i64,
    pub completed_courses: i64,
    pub total_lessons: i64,
    pub completed_lessons: i64,
}

impl CompanyMemberRow {
    pub async fn fetch_all(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        company_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                u.role,
                COALESCE((SELECT SUM(a.points) FROM activities a WHERE a.user_id = u.id), 0)::BIGINT AS points,
                (SELECT COUNT(*) FROM enrollments e WHERE e.user_id = u.id) AS enrolled_courses,
                (SELECT COUNT(*) FROM enrollments e
                    WHERE e.user_id = u.id AND e.completed_at IS NOT NULL) AS completed_courses,
                (SELECT COUNT(*) FROM enrollments e
                    JOIN modules m ON m.course_id = e.course_id
                    JOIN lessons l ON l.module_id = m.id
                    WHERE e.user_id = u.id) AS total_lessons,
                (SELECT COUNT(*) FROM enrollments e
                    JOIN modules m ON m.course_id = e.course_id
                    JOIN lessons l ON l.module_id = m.id
                    JOIN lesson_progress lp ON lp.lesson_id = l.id AND lp.user_id = u.id
                    WHERE e.user_id = u.id) AS completed_lessons
            FROM users u
            WHERE u.company_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(company_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
