use serde::Serialize;

use crate::gamification::progress_percent;

#[derive(Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct UserProgressResponse {
    /// Lessons of the courses the user is enrolled in.
    total_lessons: i64,
    completed_lessons: i64,
    total_answers: i64,
    correct_answers: i64,
    /// Percentage of correct quiz checks.
    accuracy: u8,
    username: String,
}

impl UserProgressResponse {
    pub fn new(
        total_lessons: i64,
        completed_lessons: i64,
        total_answers: i64,
        correct_answers: i64,
        username: String,
    ) -> Self {
        Self {
            total_lessons,
            completed_lessons,
            total_answers,
            correct_answers,
            accuracy: progress_percent(correct_answers, total_answers),
            username,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accuracy_is_guarded() {
        let fresh = UserProgressResponse::new(0, 0, 0, 0, "new".into());
        assert_eq!(fresh.accuracy, 0);

        let busy = UserProgressResponse::new(10, 3, 8, 6, "busy".into());
        assert_eq!(busy.accuracy, 75);
    }
}
