use crate::gamification::Criterion;
use crate::impl_paginatable_for;
use crate::model::entity::Activity;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Challenge {
    id: Uuid,
    title: String,
    description: String,
    metric: String,
    target: i64,
    reward_points: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChallengeCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub metric: Criterion,
    pub target: i64,
    pub reward_points: Option<i64>,
    /// Defaults to now.
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: DateTime<Utc>,
}

impl ResourceTyped for Challenge {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Challenge
    }
}

impl Challenge {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn metric(&self) -> Option<Criterion> {
        Criterion::parse(&self.metric)
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn reward_points(&self) -> i64 {
        self.reward_points
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }
}

#[async_trait]
impl CrudRepository<Challenge, ChallengeCreate, uuid::Uuid> for Challenge {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ChallengeCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO challenges (id, title, description, metric, target, reward_points, starts_at, ends_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.metric.as_str())
        .bind(data.target)
        .bind(data.reward_points.unwrap_or(0).max(0))
        .bind(data.starts_at.unwrap_or_else(Utc::now))
        .bind(data.ends_at)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ChallengeCreate,
    ) -> DatabaseResult<Self> {
        let reward_points = data.reward_points.unwrap_or(self.reward_points).max(0);
        let starts_at = data.starts_at.unwrap_or(self.starts_at);

        sqlx::query(
            r#"
            UPDATE challenges
            SET title = $1, description = $2, metric = $3, target = $4,
                reward_points = $5, starts_at = $6, ends_at = $7
            WHERE id = $8
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.metric.as_str())
        .bind(data.target)
        .bind(reward_points)
        .bind(starts_at)
        .bind(data.ends_at)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.metric = data.metric.as_str().to_string();
        self.target = data.target;
        self.reward_points = reward_points;
        self.starts_at = starts_at;
        self.ends_at = data.ends_at;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM challenges WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM challenges WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM challenges ORDER BY ends_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM challenges")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Challenge, ChallengeCreate, Uuid);

impl Challenge {
    /// Returns `false` when the actor already joined.
    pub async fn join(&self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_challenges (user_id, challenge_id)
            VALUES ($1,$2)
            ON CONFLICT (user_id, challenge_id) DO NOTHING
            "#,
        )
        .bind(actor.user_id())
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Joined, not yet completed and running at `now`.
    pub async fn joined_open(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT c.*
            FROM challenges c
            JOIN user_challenges uc ON uc.challenge_id = c.id AND uc.user_id = $1
            WHERE uc.completed_at IS NULL
            AND c.starts_at <= $2 AND c.ends_at >= $2
            "#,
        )
        .bind(actor.user_id())
        .bind(now)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    /// Returns `true` only for the call that completed it.
    pub async fn mark_completed(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_challenges SET completed_at = now()
            WHERE user_id = $1 AND challenge_id = $2 AND completed_at IS NULL
            "#,
        )
        .bind(actor.user_id())
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Progress of the actor inside the challenge window.
    pub async fn progress(&self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let Some(metric) = self.metric() else {
            return Ok(0);
        };

        match metric.activity_kind() {
            Some(kind) => {
                Activity::count_kind_between(mm, actor, kind, self.starts_at, self.ends_at).await
            }
            None if metric == Criterion::Points => {
                Activity::points_between(mm, actor, self.starts_at, self.ends_at).await
            }
            None => Ok(0),
        }
    }
}

// Utils

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChallengeMembershipRow {
    #[sqlx(flatten)]
    pub challenge: Challenge,
    pub joined: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChallengeMembershipRow {
    /// Challenges that have not ended yet, plus any the actor joined.
    pub async fn fetch_visible(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT c.*, uc.user_id IS NOT NULL AS joined, uc.completed_at
            FROM challenges c
            LEFT JOIN user_challenges uc ON uc.challenge_id = c.id AND uc.user_id = $1
            WHERE c.ends_at >= $2 OR uc.user_id IS NOT NULL
            ORDER BY c.ends_at
            "#,
        )
        .bind(actor.user_id())
        .bind(now)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
