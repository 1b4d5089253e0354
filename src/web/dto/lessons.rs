use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::{Answer, LessonWithStatusRow, QuestionType, QuizQuestion};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonResponse {
    id: Uuid,
    module_id: Uuid,
    course_id: Uuid,
    title: String,
    content: String,
    order_index: i32,
    completed: bool,
}

impl From<LessonWithStatusRow> for LessonResponse {
    fn from(row: LessonWithStatusRow) -> Self {
        Self {
            id: row.id,
            module_id: row.module_id,
            course_id: row.course_id,
            title: row.title,
            content: row.content,
            order_index: row.order_index,
            completed: row.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AnswerOption {
    pub id: Uuid,
    /// `None` for `string_cmp` questions, where the text is the expected input.
    pub answer_text: Option<String>,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub question: String,
    pub answers: Vec<AnswerOption>,
}

impl QuestionResponse {
    /// Pairs questions with their answers. Correctness flags and explanations never leave
    /// the server before a check.
    pub fn from_parts(questions: Vec<QuizQuestion>, answers: Vec<Answer>) -> Vec<Self> {
        questions
            .into_iter()
            .map(|q| {
                let question_type = q.question_type();
                let answers = answers
                    .iter()
                    .filter(|a| a.question_id() == q.id())
                    .map(|a| AnswerOption {
                        id: a.id(),
                        answer_text: match question_type {
                            QuestionType::SingleChoice => Some(a.answer_text().to_string()),
                            QuestionType::StringCmp => None,
                        },
                        image: a.image().to_string(),
                    })
                    .collect();

                Self {
                    id: q.id(),
                    question_type,
                    question: q.question().to_string(),
                    answers,
                }
            })
            .collect()
    }
}
