use serde::Serialize;
use uuid::Uuid;

use crate::{
    gamification::{UserProfile, progress_percent},
    model::entity::{Activity, CompanyMemberRow, CourseStatsRow, EarnedBadgeRow},
    web::dto::courses::EnrolledCourseResponse,
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StudentDashboard {
    pub enrollments: Vec<EnrolledCourseResponse>,
    pub profile: UserProfile,
    pub badges: Vec<EarnedBadgeRow>,
    pub recent_activity: Vec<Activity>,
}

#[derive(Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct InstructorCourseStats {
    pub course_id: Uuid,
    pub title: String,
    pub published: bool,
    pub total_lessons: i64,
    pub enrollments: i64,
    pub completions: i64,
    /// Mean lesson completion over every enrollment, in percent.
    pub average_progress: u8,
}

impl From<CourseStatsRow> for InstructorCourseStats {
    fn from(row: CourseStatsRow) -> Self {
        let possible = row.total_lessons.saturating_mul(row.enrollments);
        Self {
            course_id: row.course_id,
            title: row.title,
            published: row.published,
            total_lessons: row.total_lessons,
            enrollments: row.enrollments,
            completions: row.completions,
            average_progress: progress_percent(row.completed_lessons_sum, possible),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InstructorDashboard {
    pub courses: Vec<InstructorCourseStats>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub users_by_role: Vec<RoleCount>,
    pub courses: i64,
    pub enrollments: i64,
    pub active_subscriptions: i64,
}

impl AdminDashboard {
    pub fn new(
        users_by_role: Vec<(String, i64)>,
        courses: i64,
        enrollments: i64,
        active_subscriptions: i64,
    ) -> Self {
        Self {
            total_users: users_by_role.iter().map(|(_, c)| *c).sum(),
            users_by_role: users_by_role
                .into_iter()
                .map(|(role, count)| RoleCount { role, count })
                .collect(),
            courses,
            enrollments,
            active_subscriptions,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CompanyMember {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub points: i64,
    pub enrolled_courses: i64,
    pub completed_courses: i64,
    pub average_progress: u8,
}

impl From<CompanyMemberRow> for CompanyMember {
    fn from(row: CompanyMemberRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            role: row.role,
            points: row.points,
            enrolled_courses: row.enrolled_courses,
            completed_courses: row.completed_courses,
            average_progress: progress_percent(row.completed_lessons, row.total_lessons),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CompanyDashboard {
    pub company_id: Uuid,
    pub company_name: String,
    pub total_points: i64,
    pub members: Vec<CompanyMember>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn stats(total_lessons: i64, enrollments: i64, completed_lessons_sum: i64) -> CourseStatsRow {
        CourseStatsRow {
            course_id: Uuid::nil(),
            title: "Rust".to_string(),
            published: true,
            total_lessons,
            enrollments,
            completions: 0,
            completed_lessons_sum,
        }
    }

    #[test]
    fn average_progress_spans_enrollments() {
        // two students over four lessons: one done, one halfway
        let course = InstructorCourseStats::from(stats(4, 2, 6));
        assert_eq!(course.average_progress, 75);
    }

    #[test]
    fn empty_course_has_no_progress() {
        assert_eq!(InstructorCourseStats::from(stats(0, 3, 0)).average_progress, 0);
        assert_eq!(InstructorCourseStats::from(stats(5, 0, 0)).average_progress, 0);
    }

    #[test]
    fn admin_totals_roles() {
        let dashboard = AdminDashboard::new(
            vec![("admin".to_string(), 1), ("student".to_string(), 7)],
            3,
            9,
            2,
        );
        assert_eq!(dashboard.total_users, 8);
        assert_eq!(dashboard.users_by_role.len(), 2);
    }

    #[test]
    fn member_progress() {
        let member = CompanyMember::from(CompanyMemberRow {
            user_id: Uuid::nil(),
            username: "ann".to_string(),
            role: "student".to_string(),
            points: 40,
            enrolled_courses: 2,
            completed_courses: 1,
            total_lessons: 8,
            completed_lessons: 2,
        });
        assert_eq!(member.average_progress, 25);
    }
}
