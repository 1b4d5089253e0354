use crate::gamification::Criterion;
use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Badge {
    id: Uuid,
    code: String,
    name: String,
    description: String,
    criteria: String,
    threshold: i64,
    points: i64,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct BadgeCreate {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub criteria: Criterion,
    pub threshold: i64,
    pub points: Option<i64>,
}

impl ResourceTyped for Badge {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Badge
    }
}

impl Badge {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Unknown criteria in the table never match anything.
    pub fn criteria(&self) -> Option<Criterion> {
        Criterion::parse(&self.criteria)
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    pub fn points(&self) -> i64 {
        self.points
    }
}

#[async_trait]
impl CrudRepository<Badge, BadgeCreate, uuid::Uuid> for Badge {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: BadgeCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO badges (id, code, name, description, criteria, threshold, points)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.criteria.as_str())
        .bind(data.threshold)
        .bind(data.points.unwrap_or(0).max(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: BadgeCreate,
    ) -> DatabaseResult<Self> {
        let points = data.points.unwrap_or(self.points).max(0);
        sqlx::query(
            r#"
            UPDATE badges
            SET code = $1, name = $2, description = $3, criteria = $4, threshold = $5, points = $6
            WHERE id = $7
            "#,
        )
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.criteria.as_str())
        .bind(data.threshold)
        .bind(points)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.code = data.code;
        self.name = data.name;
        self.description = data.description;
        self.criteria = data.criteria.as_str().to_string();
        self.threshold = data.threshold;
        self.points = points;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM badges WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM badges WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM badges ORDER BY criteria, threshold LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM badges")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Badge, BadgeCreate, Uuid);

impl Badge {
    pub async fn find_by_code(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        code: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM badges WHERE code = $1")
            .bind(code)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn unearned(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT b.*
            FROM badges b
            WHERE NOT EXISTS (
                SELECT 1 FROM user_badges ub WHERE ub.badge_id = b.id AND ub.user_id = $1
            )
            ORDER BY b.threshold
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    /// Returns `true` if the badge was not held before.
    pub async fn award(&self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (user_id, badge_id)
            VALUES ($1,$2)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            "#,
        )
        .bind(actor.user_id())
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct EarnedBadgeRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub points: i64,
    pub awarded_at: DateTime<Utc>,
}

impl EarnedBadgeRow {
    pub async fn fetch_all(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT b.id, b.code, b.name, b.description, b.points, ub.awarded_at
            FROM user_badges ub
            JOIN badges b ON b.id = ub.badge_id
            WHERE ub.user_id = $1
            ORDER BY ub.awarded_at DESC
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
