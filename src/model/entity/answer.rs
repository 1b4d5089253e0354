use crate::impl_paginatable_for;
use crate::model::access::{HasOwner, course_owner_by};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Answer {
    id: Uuid,
    question_id: Uuid,
    answer_text: String,
    image: String,
    is_correct: bool,
}

impl ResourceTyped for Answer {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Answer
    }
}

impl Answer {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn question_id(&self) -> uuid::Uuid {
        self.question_id
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AnswerCreate {
    pub question_id: Uuid,
    pub answer_text: String,
    #[serde(default)]
    pub image: String,
    pub is_correct: Option<bool>,
}

#[async_trait]
impl CrudRepository<Answer, AnswerCreate, uuid::Uuid> for Answer {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AnswerCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as("INSERT INTO quiz_answers (id, question_id, answer_text, image, is_correct) VALUES ($1,$2,$3,$4,$5) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(data.question_id)
            .bind(&data.answer_text)
            .bind(&data.image)
            .bind(data.is_correct.unwrap_or(false))
            .fetch_one(mm.executor())
            .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AnswerCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE quiz_answers SET answer_text = $1, image = $2, is_correct = $3 WHERE id = $4")
            .bind(&data.answer_text)
            .bind(&data.image)
            .bind(data.is_correct.unwrap_or(false))
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.answer_text = data.answer_text;
        self.image = data.image;
        self.is_correct = data.is_correct.unwrap_or(false);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM quiz_answers WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quiz_answers WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quiz_answers LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_answers")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Answer, AnswerCreate, Uuid);

#[async_trait]
impl HasOwner for Answer {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        course_owner_by(
            mm,
            r#"
            SELECT c.instructor_id
            FROM quiz_questions q
            JOIN lessons l ON l.id = q.lesson_id
            JOIN modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE q.id = $1
            "#,
            self.question_id,
        )
        .await
    }
}

// Utils

impl Answer {
    /// Answers of every question of a lesson, in one query.
    pub async fn find_all_by_lesson(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<Self> = sqlx::query_as(
            r#"
            SELECT a.*
            FROM quiz_answers a
            JOIN quiz_questions q ON q.id = a.question_id
            WHERE q.lesson_id = $1
            ORDER BY a.answer_text
            "#,
        )
        .bind(lesson_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
