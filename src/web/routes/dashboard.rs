use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::get,
};

use crate::{
    gamification::engine,
    model::{
        CrudRepository, ResourceTyped,
        entity::{
            Activity, Company, CompanyMemberRow, Course, CourseStatsRow, EarnedBadgeRow,
            Enrollment, EnrollmentProgressRow, Subscription, UserEntity,
        },
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::{
            courses::EnrolledCourseResponse,
            dashboard::{
                AdminDashboard, CompanyDashboard, CompanyMember, InstructorCourseStats,
                InstructorDashboard, StudentDashboard,
            },
        },
        error::ErrorResponse,
        middlewares,
    },
};

const RECENT_ACTIVITY_LIMIT: i64 = 10;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/student", get(dashboard_student_handler))
        .route("/instructor", get(dashboard_instructor_handler))
        .route("/admin", get(dashboard_admin_handler))
        .route("/company", get(dashboard_company_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/dashboard/student",
    responses(
        (status = 200, description = "Enrollments, level, streak, badges and recent activity", body = StudentDashboard),
        (status = 403, description = "Students only", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn dashboard_student_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_role(UserRole::Student)?;

    let (enrollments, profile, badges, recent_activity) = tokio::try_join!(
        EnrollmentProgressRow::fetch_all(state.pool(), user),
        engine::load_profile(state.pool(), user),
        EarnedBadgeRow::fetch_all(state.pool(), user),
        Activity::recent(state.pool(), user, RECENT_ACTIVITY_LIMIT),
    )
    .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(StudentDashboard {
            enrollments: enrollments.into_iter().map(EnrolledCourseResponse::from).collect(),
            profile,
            badges,
            recent_activity,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/instructor",
    responses(
        (status = 200, description = "Own courses with enrollment statistics", body = InstructorDashboard),
        (status = 403, description = "Instructors only", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn dashboard_instructor_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_role(UserRole::Instructor)?;

    let rows = CourseStatsRow::fetch_for_instructor(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(InstructorDashboard {
            courses: rows.into_iter().map(InstructorCourseStats::from).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    responses(
        (status = 200, description = "Platform wide counters", body = AdminDashboard),
        (status = 403, description = "Admins only", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn dashboard_admin_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_role(UserRole::Admin)?;

    let (by_role, courses, enrollments, subscriptions) = tokio::try_join!(
        UserEntity::count_by_role(state.pool(), user),
        Course::count_all(state.pool(), user),
        Enrollment::count_all(state.pool(), user),
        Subscription::count_active(state.pool(), user),
    )
    .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(AdminDashboard::new(by_role, courses, enrollments, subscriptions)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/company",
    responses(
        (status = 200, description = "Members of the caller's company", body = CompanyDashboard),
        (status = 403, description = "Company admins only", body = ErrorResponse),
        (status = 404, description = "Caller belongs to no company", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn dashboard_company_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_role(UserRole::CompanyAdmin)?;

    let me = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let company_id = me
        .company_id()
        .ok_or_else(|| WebError::resource_not_found(Company::get_resource_type()))?;

    let (company, rows) = tokio::try_join!(
        Company::find_by_id(state.pool(), user, company_id),
        CompanyMemberRow::fetch_all(state.pool(), user, company_id),
    )
    .map_err(|e| WebError::resource_fetch_error(Company::get_resource_type(), e))?;

    let company = company.ok_or_else(|| WebError::resource_not_found(Company::get_resource_type()))?;
    let members: Vec<CompanyMember> = rows.into_iter().map(CompanyMember::from).collect();

    Ok((
        StatusCode::OK,
        Json(CompanyDashboard {
            company_id: company.id(),
            company_name: company.name().to_string(),
            total_points: members.iter().map(|m| m.points).sum(),
            members,
        }),
    ))
}
