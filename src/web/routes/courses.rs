use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{
            Course, CourseCreate, Enrollment, EnrollmentProgressRow, LessonProgress,
            ModuleWithLessonsRow, Subscription,
        },
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::{
            courses::{CourseDetailResponse, CourseProgressResponse, EnrolledCourseResponse},
            modules::ModuleWithLessons,
        },
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler).post(courses_create_handler))
        .route("/enrolled", get(courses_enrolled_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route(
            "/{id}/enroll",
            post(courses_enroll_handler).delete(courses_unenroll_handler),
        )
        .route("/{id}/progress", get(courses_progress_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))
}

pub(crate) fn manages_course(user: &AuthenticatedUser, course: &Course) -> bool {
    user.user_role() == UserRole::Admin || course.instructor_id() == user.user_id()
}

/// Unpublished courses only exist for their instructor and admins.
pub(crate) async fn find_visible_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    let course = find_course(state, user, id).await?;
    if !course.published() && !manages_course(user, &course) {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }
    Ok(course)
}

pub(crate) async fn find_owned_course(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Course> {
    let course = find_course(state, user, id).await?;
    check_access(state.pool(), user, &course, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(Course::get_resource_type(), e))?;
    Ok(course)
}

fn validate_course(payload: &CourseCreate) -> WebResult<()> {
    if payload.title.trim().is_empty() {
        return Err(WebError::user_bad_request("course title must not be empty"));
    }
    if payload.required_tier.is_some_and(|tier| tier < 0) {
        return Err(WebError::user_bad_request("required_tier must not be negative"));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/courses",
    description = "Published courses, newest first",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Requested page", body = crate::model::Page<Course>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let courses = Course::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    description = "Creates a course owned by the caller",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid course", body = ErrorResponse),
        (status = 403, description = "Only instructors and admins can create courses", body = ErrorResponse),
        (status = 409, description = "Title already used by you", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Instructor])?;
    validate_course(&payload)?;

    let course = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    tracing::info!(course = course.title(), "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    description = "Course with its modules and lessons, flagged with the caller's completion",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course found", body = CourseDetailResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_visible_course(&state, user, id).await?;

    let (rows, enrollment) = tokio::try_join!(
        ModuleWithLessonsRow::fetch_for_course(state.pool(), user, id),
        Enrollment::find(state.pool(), user, id),
    )
    .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let modules = ModuleWithLessons::from_rows(rows)
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let res = CourseDetailResponse {
        course,
        enrolled: enrollment.is_some(),
        modules,
    };
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    request_body = CourseCreate,
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate_course(&payload)?;
    let course = find_owned_course(&state, user, id).await?;

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted with its modules and lessons"),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_owned_course(&state, user, id).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    description = "Enrolls the caller. Courses with a required tier need a matching subscription",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 402, description = "Subscription tier too low", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_visible_course(&state, user, id).await?;

    if course.required_tier() > 0 && !manages_course(user, &course) {
        let tier = Subscription::active_tier(state.pool(), user)
            .await
            .map_err(|e| WebError::resource_fetch_error(Subscription::get_resource_type(), e))?;

        if tier < course.required_tier() {
            return Err(WebError::subscription_required(course.required_tier(), tier));
        }
    }

    let enrollment = Enrollment::enroll(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_conflict(Enrollment::get_resource_type()))?;

    tracing::info!(course = course.title(), "user enrolled");
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrollment removed"),
        (status = 404, description = "Not enrolled", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_unenroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let enrollment = Enrollment::find(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))?;

    enrollment
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/progress",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Caller's progress in the course", body = CourseProgressResponse),
        (status = 404, description = "Not enrolled", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let enrollment = Enrollment::find(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))?;

    let (total, completed) = LessonProgress::course_counts(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(LessonProgress::get_resource_type(), e))?;

    let res = CourseProgressResponse::new(id, total, completed, enrollment.completed_at().is_some());
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    get,
    path = "/api/courses/enrolled",
    responses(
        (status = 200, description = "Caller's enrollments with progress", body = Vec<EnrolledCourseResponse>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "courses",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn courses_enrolled_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let rows = EnrollmentProgressRow::fetch_all(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    let res: Vec<EnrolledCourseResponse> = rows.into_iter().map(EnrolledCourseResponse::from).collect();
    Ok((StatusCode::OK, Json(res)))
}
