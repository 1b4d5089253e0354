use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gamification::AwardSummary;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuizCheckBody {
    pub answer_id: Uuid,
    /// Required for `string_cmp` questions.
    pub user_answer: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizCheckResponse {
    pub is_correct: bool,
    pub explanation: String,
    pub image: String,
    /// `true` only for the first correct check of this question by the caller.
    pub first_correct: bool,
    pub awards: AwardSummary,
}
