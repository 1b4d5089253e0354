use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Every answer check is kept, correct or not.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAttempt {
    id: Uuid,
    user_id: Uuid,
    question_id: Uuid,
    selected_answer_id: Uuid,
    is_correct: bool,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for QuizAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizAttempt
    }
}

impl QuizAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn selected_answer_id(&self) -> Uuid {
        self.selected_answer_id
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

pub struct QuizAttemptCreate {
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub selected_answer_id: Uuid,
    pub is_correct: bool,
}

impl QuizAttemptCreate {
    pub fn new(user_id: Uuid, question_id: Uuid, selected_answer_id: Uuid, is_correct: bool) -> Self {
        Self {
            user_id,
            question_id,
            selected_answer_id,
            is_correct,
        }
    }
}

impl QuizAttempt {
    pub async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizAttemptCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempts (id, user_id, question_id, selected_answer_id, is_correct)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.question_id)
        .bind(data.selected_answer_id)
        .bind(data.is_correct)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }

    pub async fn count_correct(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1 AND is_correct = TRUE")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}
