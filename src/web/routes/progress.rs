use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::get,
};

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{Lesson, LessonProgress, QuizAttempt, UserEntity},
    },
    web::{
        AppState, RequestContext, WebError, WebResult, dto::progress::UserProgressResponse,
        error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(progress_get_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/progress",
    description = "Get current user's progress",
    responses(
        (status = 200, description = "Progress found", body = UserProgressResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn progress_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let (found, total_lessons, completed_lessons, total_answers, correct_answers) = tokio::try_join!(
        UserEntity::find_by_id(state.pool(), user, user.user_id()),
        Lesson::count_enrolled(state.pool(), user),
        LessonProgress::count_completed(state.pool(), user),
        QuizAttempt::count(state.pool(), user),
        QuizAttempt::count_correct(state.pool(), user),
    )
    .map_err(|e| WebError::resource_fetch_error(LessonProgress::get_resource_type(), e))?;

    let found = found.ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let res = UserProgressResponse::new(
        total_lessons,
        completed_lessons,
        total_answers,
        correct_answers,
        found.username().to_string(),
    );

    Ok((StatusCode::OK, Json(res)))
}
