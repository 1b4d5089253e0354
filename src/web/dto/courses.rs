use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::gamification::progress_percent;
use crate::model::entity::{Course, EnrollmentProgressRow};
use crate::web::dto::modules::ModuleWithLessons;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseDetailResponse {
    pub course: Course,
    pub enrolled: bool,
    pub modules: Vec<ModuleWithLessons>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CourseProgressResponse {
    pub course_id: Uuid,
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub percent: u8,
    pub completed: bool,
}

impl CourseProgressResponse {
    /// `completed_at` wins over the counts: lessons added after completion don't revoke it.
    pub fn new(course_id: Uuid, total_lessons: i64, completed_lessons: i64, completed_at: bool) -> Self {
        let percent = progress_percent(completed_lessons, total_lessons);
        Self {
            course_id,
            total_lessons,
            completed_lessons,
            percent,
            completed: completed_at || (total_lessons > 0 && completed_lessons >= total_lessons),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EnrolledCourseResponse {
    pub course_id: Uuid,
    pub title: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: CourseProgressResponse,
}

impl From<EnrollmentProgressRow> for EnrolledCourseResponse {
    fn from(row: EnrollmentProgressRow) -> Self {
        Self {
            course_id: row.course_id,
            progress: CourseProgressResponse::new(
                row.course_id,
                row.total_lessons,
                row.completed_lessons,
                row.completed_at.is_some(),
            ),
            title: row.title,
            enrolled_at: row.enrolled_at,
            completed_at: row.completed_at,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn progress_response() {
        let id = Uuid::new_v4();

        let half = CourseProgressResponse::new(id, 4, 2, false);
        assert_eq!(half.percent, 50);
        assert!(!half.completed);

        let done = CourseProgressResponse::new(id, 4, 4, false);
        assert!(done.completed);

        let empty = CourseProgressResponse::new(id, 0, 0, false);
        assert_eq!(empty.percent, 0);
        assert!(!empty.completed);

        let grown = CourseProgressResponse::new(id, 5, 4, true);
        assert_eq!(grown.percent, 80);
        assert!(grown.completed);
    }
}
