use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    id: Uuid,
    token: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for RefreshToken {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::RefreshToken
    }
}

impl RefreshToken {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn expires_at(&self) -> &DateTime<Utc> {
        &self.expires_at
    }
}

impl RefreshToken {
    pub async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO refresh_tokens (id, token, user_id, expires_at) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(token)
        .bind(actor.user_id())
        .bind(expires_at)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    /// Removes the token and returns it if it was still valid. A token can be consumed once.
    pub async fn consume(mm: &ModelManager, token: &str) -> DatabaseResult<Option<Self>> {
        let result: Option<Self> =
            sqlx::query_as("DELETE FROM refresh_tokens WHERE token = $1 RETURNING *")
                .bind(token)
                .fetch_optional(mm.executor())
                .await?;

        Ok(result.filter(|t| t.expires_at > Utc::now()))
    }

    /// Returns `false` when nothing was deleted.
    pub async fn revoke(mm: &ModelManager, token: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn cleanup_expired(mm: &ModelManager) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < now()")
            .execute(mm.executor())
            .await?;

        Ok(result.rows_affected())
    }
}
