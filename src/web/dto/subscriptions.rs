use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Plan, Subscription, SubscriptionStatus, SubscriptionWithPlanRow};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubscribeBody {
    pub plan_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub plan_code: String,
    pub plan_name: String,
    pub tier: i32,
    pub status: Option<SubscriptionStatus>,
    pub started_at: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    /// Whether the plan's tier is currently granted.
    pub active: bool,
}

impl SubscriptionResponse {
    pub fn new(subscription: &Subscription, plan_code: &str, plan_name: &str, tier: i32) -> Self {
        Self {
            id: subscription.id(),
            plan_id: subscription.plan_id(),
            plan_code: plan_code.to_string(),
            plan_name: plan_name.to_string(),
            tier,
            status: subscription.status(),
            started_at: *subscription.started_at(),
            current_period_end: *subscription.current_period_end(),
            canceled_at: subscription.canceled_at().copied(),
            active: subscription.is_active(Utc::now()),
        }
    }

    pub fn with_plan(subscription: &Subscription, plan: &Plan) -> Self {
        Self::new(subscription, plan.code(), plan.name(), plan.tier())
    }
}

impl From<SubscriptionWithPlanRow> for SubscriptionResponse {
    fn from(row: SubscriptionWithPlanRow) -> Self {
        Self::new(&row.subscription, &row.plan_code, &row.plan_name, row.tier)
    }
}
