use axum::Json;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Router, extract::State, middleware, response::IntoResponse, routing::get};
use uuid::Uuid;

use crate::gamification::engine;
use crate::model::entity::{
    Answer, Course, Enrollment, Lesson, LessonCreate, LessonWithStatusRow, QuizQuestion,
};
use crate::model::{CrudRepository, ResourceTyped, check_access};
use crate::web::dto::lessons::{LessonResponse, QuestionResponse};
use crate::web::error::ErrorResponse;
use crate::web::routes::courses::manages_course;
use crate::web::routes::modules::find_owned_module;
use crate::web::{AppState, AuthenticatedUser, RequestContext, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(lessons_create_handler))
        .route(
            "/{id}",
            get(lessons_get_handler)
                .put(lessons_update_handler)
                .delete(lessons_delete_handler),
        )
        .route("/{id}/done", post(lessons_mark_done_handler))
        .route("/{id}/next", get(lessons_next_handler))
        .route("/{id}/quiz", get(lessons_quiz_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// The lesson's course, 404 when the lesson is missing or sits in a course the caller can't see.
pub(crate) async fn find_lesson_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    let course = Course::find_by_lesson(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    if !course.published() && !manages_course(user, &course) {
        return Err(WebError::resource_not_found(Lesson::get_resource_type()));
    }
    Ok(course)
}

/// Like [`find_lesson_course`], but the content is only open to enrolled users
/// and the people managing the course. Others get 403.
pub(crate) async fn find_studied_lesson_course(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Course> {
    let course = find_lesson_course(state, user, id).await?;
    if !manages_course(user, &course) {
        require_enrollment(state, user, &course).await?;
    }
    Ok(course)
}

pub(crate) async fn require_enrollment(state: &AppState, user: &AuthenticatedUser, course: &Course) -> WebResult<()> {
    let enrolled = Enrollment::find(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .is_some();

    if !enrolled {
        return Err(WebError::resource_forbidden(Enrollment::get_resource_type()));
    }
    Ok(())
}

pub(crate) async fn find_owned_lesson(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Lesson> {
    let lesson = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    check_access(state.pool(), user, &lesson, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(Lesson::get_resource_type(), e))?;
    Ok(lesson)
}

#[utoipa::path(
    post,
    path = "/api/lessons",
    description = "Adds a lesson to a module. Without `order_index` it goes last",
    request_body = LessonCreate,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Empty title", body = ErrorResponse),
        (status = 403, description = "You don't own the course", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "lessons"
)]
pub async fn lessons_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if payload.title.trim().is_empty() {
        return Err(WebError::user_bad_request("lesson title must not be empty"));
    }
    find_owned_module(&state, user, payload.module_id).await?;

    let lesson = Lesson::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(lesson)))
}

#[utoipa::path(
    put,
    path = "/api/lessons/{lesson_id}",
    description = "Updates a lesson. `module_id` is ignored",
    request_body = LessonCreate,
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to update")
    ),
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 403, description = "You don't own the course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "lessons"
)]
pub async fn lessons_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = find_owned_lesson(&state, user, id).await?;

    let updated = lesson
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/lessons/{lesson_id}",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to delete")
    ),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 403, description = "You don't own the course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "lessons"
)]
pub async fn lessons_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = find_owned_lesson(&state, user, id).await?;

    lesson
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/lessons/{lesson_id}",
    description = "Fetch comprehensive info about lesson including its content",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonResponse),
        (status = 403, description = "You're not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "lessons"
)]
pub async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    find_studied_lesson_course(&state, user, id).await?;

    let lesson = LessonWithStatusRow::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .map(LessonResponse::from)
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    Ok((StatusCode::OK, Json(lesson)))
}

#[utoipa::path(
    post,
    path = "/api/lessons/{lesson_id}/done",
    description = "Mark lesson as done. Repeating the call grants nothing new",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to mark")
    ),
    responses(
        (status = 200, description = "Lesson marked", body = crate::gamification::AwardSummary),
        (status = 403, description = "You're not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 401, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "lessons"
)]
pub async fn lessons_mark_done_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_lesson_course(&state, user, id).await?;
    require_enrollment(&state, user, &course).await?;

    let summary = engine::on_lesson_completed(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(summary)))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{lesson_id}/next",
    description = "Next lesson of the same module the caller hasn't completed",
    params(
        ("lesson_id" = Uuid, Path, description = "Current lesson")
    ),
    responses(
        (status = 200, description = "Next lesson", body = LessonResponse),
        (status = 403, description = "You're not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Nothing left in this module", body = ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "lessons"
)]
pub async fn lessons_next_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    find_studied_lesson_course(&state, user, id).await?;

    let next = LessonWithStatusRow::find_next_uncompleted(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .map(LessonResponse::from)
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    Ok((StatusCode::OK, Json(next)))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{lesson_id}/quiz",
    description = "Quiz questions of the lesson with their answer options",
    params(
        ("lesson_id" = Uuid, Path, description = "Lesson id")
    ),
    responses(
        (status = 200, description = "Questions, possibly empty", body = Vec<QuestionResponse>),
        (status = 403, description = "You're not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    security(("cookie" = []), ("bearer" = [])),
    tag = "lessons"
)]
pub async fn lessons_quiz_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    find_studied_lesson_course(&state, user, id).await?;

    let (questions, answers) = tokio::try_join!(
        QuizQuestion::find_all_by_lesson(state.pool(), user, id),
        Answer::find_all_by_lesson(state.pool(), user, id),
    )
    .map_err(|e| WebError::resource_fetch_error(QuizQuestion::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(QuestionResponse::from_parts(questions, answers))))
}
