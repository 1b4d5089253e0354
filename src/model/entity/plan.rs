use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Plan {
    id: Uuid,
    code: String,
    name: String,
    /// Courses with `required_tier <= tier` are open to subscribers.
    tier: i32,
    price_cents: i64,
    interval_days: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PlanCreate {
    pub code: String,
    pub name: String,
    pub tier: i32,
    #[serde(default)]
    pub price_cents: i64,
    pub interval_days: Option<i32>,
}

/// Billing periods are capped at ten years.
pub const MAX_INTERVAL_DAYS: i32 = 3650;
const DEFAULT_INTERVAL_DAYS: i32 = 30;

impl PlanCreate {
    /// Human readable reason when the plan can't be stored.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.code.trim().is_empty() || self.name.trim().is_empty() || self.tier < 0 {
            return Err("plan needs a code, a name and a non-negative tier");
        }
        if self.interval_days.is_some_and(|d| !(1..=MAX_INTERVAL_DAYS).contains(&d)) {
            return Err("interval_days must be between 1 and 3650");
        }
        Ok(())
    }
}

impl ResourceTyped for Plan {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Plan
    }
}

impl Plan {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> i32 {
        self.tier
    }

    pub fn price_cents(&self) -> i64 {
        self.price_cents
    }

    pub fn interval_days(&self) -> i32 {
        self.interval_days
    }
}

#[async_trait]
impl CrudRepository<Plan, PlanCreate, uuid::Uuid> for Plan {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: PlanCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO plans (id, code, name, tier, price_cents, interval_days)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.code)
        .bind(&data.name)
        .bind(data.tier.max(0))
        .bind(data.price_cents.max(0))
        .bind(data.interval_days.unwrap_or(DEFAULT_INTERVAL_DAYS).clamp(1, MAX_INTERVAL_DAYS))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: PlanCreate,
    ) -> DatabaseResult<Self> {
        let interval_days = data
            .interval_days
            .unwrap_or(self.interval_days)
            .clamp(1, MAX_INTERVAL_DAYS);

        sqlx::query(
            r#"
            UPDATE plans SET code = $1, name = $2, tier = $3, price_cents = $4, interval_days = $5
            WHERE id = $6
            "#,
        )
        .bind(&data.code)
        .bind(&data.name)
        .bind(data.tier.max(0))
        .bind(data.price_cents.max(0))
        .bind(interval_days)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.code = data.code;
        self.name = data.name;
        self.tier = data.tier.max(0);
        self.price_cents = data.price_cents.max(0);
        self.interval_days = interval_days;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM plans WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM plans WHERE id = $1")
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
        let result =
            sqlx::query_as("SELECT * FROM plans ORDER BY tier, price_cents LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plans")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Plan, PlanCreate, Uuid);

impl Plan {
    pub async fn find_by_code(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        code: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM plans WHERE code = $1")
            .bind(code)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn plan(interval_days: Option<i32>) -> PlanCreate {
        PlanCreate {
            code: "pro".to_string(),
            name: "Pro".to_string(),
            tier: 1,
            price_cents: 1500,
            interval_days,
        }
    }

    #[test]
    fn interval_bounds() {
        assert!(plan(None).validate().is_ok());
        assert!(plan(Some(1)).validate().is_ok());
        assert!(plan(Some(MAX_INTERVAL_DAYS)).validate().is_ok());
        assert!(plan(Some(0)).validate().is_err());
        assert!(plan(Some(MAX_INTERVAL_DAYS + 1)).validate().is_err());
        assert!(plan(Some(2_000_000_000)).validate().is_err());
    }

    #[test]
    fn blank_code_or_negative_tier() {
        let mut data = plan(None);
        data.code = "  ".to_string();
        assert!(data.validate().is_err());

        let mut data = plan(None);
        data.tier = -1;
        assert!(data.validate().is_err());
    }
}
