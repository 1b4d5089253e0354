use crate::model::access::{HasOwner, course_owner_by};
use crate::model::entity::Answer;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// How a quiz answer is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// The picked answer's `is_correct` flag decides.
    SingleChoice,
    /// Free-text input compared with the stored answer text.
    StringCmp,
}

impl QuestionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single_choice" => Some(Self::SingleChoice),
            "string_cmp" => Some(Self::StringCmp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleChoice => "single_choice",
            Self::StringCmp => "string_cmp",
        }
    }
}

/// Comparison used by `string_cmp` questions.
pub fn text_answer_matches(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

/// Decides a quiz check. `None` when a `string_cmp` question is checked without user input.
pub fn grade_answer(question_type: QuestionType, answer: &Answer, user_answer: Option<&str>) -> Option<bool> {
    match question_type {
        QuestionType::SingleChoice => Some(answer.is_correct()),
        // distractor rows never count, whatever was typed
        QuestionType::StringCmp => {
            user_answer.map(|given| answer.is_correct() && text_answer_matches(answer.answer_text(), given))
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizQuestion {
    id: Uuid,
    lesson_id: Uuid,
    question_type: String,
    question: String,
    explanation: String,
}

impl ResourceTyped for QuizQuestion {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizQuestion
    }
}

impl QuizQuestion {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> uuid::Uuid {
        self.lesson_id
    }

    pub fn question_type(&self) -> QuestionType {
        QuestionType::parse(&self.question_type).unwrap_or(QuestionType::SingleChoice)
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizQuestionCreate {
    pub lesson_id: Uuid,
    pub question_type: QuestionType,
    pub question: String,
    pub explanation: String,
}

#[async_trait]
impl CrudRepository<QuizQuestion, QuizQuestionCreate, uuid::Uuid> for QuizQuestion {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizQuestionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_questions (id, lesson_id, question_type, question, explanation)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.lesson_id)
        .bind(data.question_type.as_str())
        .bind(&data.question)
        .bind(&data.explanation)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizQuestionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE quiz_questions SET question_type = $1, question = $2, explanation = $3 WHERE id = $4")
            .bind(data.question_type.as_str())
            .bind(&data.question)
            .bind(&data.explanation)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.question_type = data.question_type.as_str().to_string();
        self.question = data.question;
        self.explanation = data.explanation;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM quiz_questions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quiz_questions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quiz_questions LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_questions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for QuizQuestion {
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
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE l.id = $1
            "#,
            self.lesson_id,
        )
        .await
    }
}

// Utils
impl QuizQuestion {
    pub async fn find_all_by_lesson(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<Self> = sqlx::query_as(
            r#"
            SELECT *
            FROM quiz_questions q
            WHERE q.lesson_id = $1
            ORDER BY q.question
            "#,
        )
        .bind(lesson_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn question_type_parsing() {
        assert_eq!(QuestionType::parse("string_cmp"), Some(QuestionType::StringCmp));
        assert_eq!(QuestionType::parse("single_choice"), Some(QuestionType::SingleChoice));
        assert_eq!(QuestionType::parse("essay"), None);
        assert_eq!(
            serde_json::to_string(&QuestionType::StringCmp).unwrap(),
            "\"string_cmp\""
        );
    }

    #[test]
    fn text_answers_ignore_case_and_padding() {
        assert!(text_answer_matches("Ownership", "  ownership "));
        assert!(text_answer_matches(" borrow", "BORROW"));
        assert!(!text_answer_matches("borrow", "borrowed"));
    }

    fn answer(text: &str, is_correct: bool) -> Answer {
        serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "question_id": Uuid::new_v4(),
            "answer_text": text,
            "image": "",
            "is_correct": is_correct,
        }))
        .unwrap()
    }

    #[test]
    fn grading() {
        let wrong = answer("Garbage collector", false);
        let right = answer("Borrow checker", true);

        assert_eq!(grade_answer(QuestionType::SingleChoice, &right, None), Some(true));
        assert_eq!(grade_answer(QuestionType::SingleChoice, &wrong, Some("ignored")), Some(false));

        assert_eq!(grade_answer(QuestionType::StringCmp, &right, Some(" borrow CHECKER")), Some(true));
        assert_eq!(grade_answer(QuestionType::StringCmp, &right, Some("lifetimes")), Some(false));
        assert_eq!(grade_answer(QuestionType::StringCmp, &right, None), None);
    }

    #[test]
    fn typed_distractor_is_wrong() {
        let distractor = answer("Garbage collector", false);
        assert_eq!(
            grade_answer(QuestionType::StringCmp, &distractor, Some("garbage collector")),
            Some(false)
        );
    }
}
