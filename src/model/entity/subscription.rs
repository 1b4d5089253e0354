use crate::model::entity::Plan;
use crate::model::repo::ResourceTyped;
use crate::model::{
    HasOwner, ModelManager,
    error::{DatabaseError, DatabaseResult},
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
}

impl SubscriptionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
        }
    }
}

/// Canceled subscriptions keep their tier until the paid period is over.
pub fn grants_access(
    status: Option<SubscriptionStatus>,
    current_period_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    status.is_some() && current_period_end > now
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Subscription {
    id: Uuid,
    user_id: Uuid,
    plan_id: Uuid,
    status: String,
    started_at: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    canceled_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Subscription {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Subscription
    }
}

#[async_trait]
impl HasOwner for Subscription {
    type OwnerId = Uuid;
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn plan_id(&self) -> Uuid {
        self.plan_id
    }

    pub fn status(&self) -> Option<SubscriptionStatus> {
        SubscriptionStatus::parse(&self.status)
    }

    pub fn started_at(&self) -> &DateTime<Utc> {
        &self.started_at
    }

    pub fn current_period_end(&self) -> &DateTime<Utc> {
        &self.current_period_end
    }

    pub fn canceled_at(&self) -> Option<&DateTime<Utc>> {
        self.canceled_at.as_ref()
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        grants_access(self.status(), self.current_period_end, now)
    }
}

impl Subscription {
    /// Starts a new period on `plan`. Any subscription still granting access
    /// is closed in the same transaction.
    pub async fn subscribe(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        plan: &Plan,
    ) -> DatabaseResult<Self> {
        let now = Utc::now();
        let period_end = now
            .checked_add_signed(Duration::days(i64::from(plan.interval_days().max(1))))
            .ok_or(DatabaseError::OutOfRange("subscription period end"))?;

        let mut tx = mm.executor().begin().await?;

        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'canceled', canceled_at = COALESCE(canceled_at, $2), current_period_end = $2
            WHERE user_id = $1 AND current_period_end > $2
            "#,
        )
        .bind(actor.user_id())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as(
            r#"
            INSERT INTO subscriptions (id, user_id, plan_id, status, started_at, current_period_end)
            VALUES ($1,$2,$3,'active',$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(plan.id())
        .bind(now)
        .bind(period_end)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id = %actor.user_id(), plan = plan.code(), "subscription started");
        Ok(row)
    }

    /// Latest subscription of the actor that still grants access.
    pub async fn current(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT * FROM subscriptions
            WHERE user_id = $1 AND status IN ('active', 'canceled') AND current_period_end > now()
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }

    pub async fn cancel(mut self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Self> {
        if self.status() == Some(SubscriptionStatus::Canceled) {
            return Ok(self);
        }

        let canceled_at = Utc::now();
        sqlx::query("UPDATE subscriptions SET status = 'canceled', canceled_at = $1 WHERE id = $2")
            .bind(canceled_at)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.status = SubscriptionStatus::Canceled.as_str().to_string();
        self.canceled_at = Some(canceled_at);
        Ok(self)
    }

    /// Highest plan tier the actor has access to; 0 without a subscription.
    pub async fn active_tier(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i32> {
        let tier: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT MAX(p.tier)
            FROM subscriptions s
            JOIN plans p ON p.id = s.plan_id
            WHERE s.user_id = $1 AND s.status IN ('active', 'canceled') AND s.current_period_end > now()
            "#,
        )
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;
        Ok(tier.unwrap_or(0))
    }

    pub async fn count_active(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT user_id) FROM subscriptions
            WHERE status IN ('active', 'canceled') AND current_period_end > now()
            "#,
        )
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

// Utils

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionWithPlanRow {
    #[sqlx(flatten)]
    pub subscription: Subscription,
    pub plan_code: String,
    pub plan_name: String,
    pub tier: i32,
}

impl SubscriptionWithPlanRow {
    pub async fn fetch_current(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT s.*, p.code AS plan_code, p.name AS plan_name, p.tier
            FROM subscriptions s
            JOIN plans p ON p.id = s.plan_id
            WHERE s.user_id = $1 AND s.status IN ('active', 'canceled') AND s.current_period_end > now()
            ORDER BY s.started_at DESC
            LIMIT 1
            "#,
        )
        .bind(actor.user_id())
        .fetch_optional(mm.executor())
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn active_until_period_end() {
        let now = Utc::now();
        let later = now + Duration::days(3);

        assert!(grants_access(Some(SubscriptionStatus::Active), later, now));
        assert!(!grants_access(Some(SubscriptionStatus::Active), now, now));
        assert!(!grants_access(Some(SubscriptionStatus::Active), now - Duration::hours(1), now));
    }

    #[test]
    fn canceled_keeps_access_until_period_end() {
        let now = Utc::now();

        assert!(grants_access(Some(SubscriptionStatus::Canceled), now + Duration::days(1), now));
        assert!(!grants_access(Some(SubscriptionStatus::Canceled), now - Duration::days(1), now));
    }

    #[test]
    fn unknown_status_never_grants() {
        let now = Utc::now();
        assert!(!grants_access(SubscriptionStatus::parse("expired"), now + Duration::days(1), now));
    }
}
