use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::post,
};

use crate::{
    gamification::{AwardSummary, engine},
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{
            Answer, AnswerCreate, QuizAttempt, QuizAttemptCreate, QuizQuestion,
            QuizQuestionCreate, grade_answer,
        },
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::quizzes::{QuizCheckBody, QuizCheckResponse},
        error::ErrorResponse,
        middlewares,
        routes::lessons::{find_lesson_course, find_owned_lesson, require_enrollment},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/questions", post(quizzes_question_create_handler))
        .route("/answers", post(quizzes_answer_create_handler))
        .route("/check", post(quizzes_check_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/quizzes/questions",
    request_body = QuizQuestionCreate,
    responses(
        (status = 201, description = "Question created", body = QuizQuestion),
        (status = 400, description = "Empty question", body = ErrorResponse),
        (status = 403, description = "You don't own the course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn quizzes_question_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuizQuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if payload.question.trim().is_empty() {
        return Err(WebError::user_bad_request("question must not be empty"));
    }
    find_owned_lesson(&state, user, payload.lesson_id).await?;

    let question = QuizQuestion::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizQuestion::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(question)))
}

#[utoipa::path(
    post,
    path = "/api/quizzes/answers",
    request_body = AnswerCreate,
    responses(
        (status = 201, description = "Answer created", body = Answer),
        (status = 403, description = "You don't own the course", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn quizzes_answer_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<AnswerCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let question = QuizQuestion::find_by_id(state.pool(), user, payload.question_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizQuestion::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(QuizQuestion::get_resource_type()))?;

    check_access(state.pool(), user, &question, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(QuizQuestion::get_resource_type(), e))?;

    let answer = Answer::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(answer)))
}

#[utoipa::path(
    post,
    path = "/api/quizzes/check",
    description = "Checks an answer. Every check is recorded, points go only to the first correct one",
    request_body = QuizCheckBody,
    responses(
        (status = 200, description = "Answer checked", body = QuizCheckResponse),
        (status = 400, description = "`user_answer` missing for a text question", body = ErrorResponse),
        (status = 403, description = "You're not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Answer not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn quizzes_check_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<QuizCheckBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let answer = Answer::find_by_id(state.pool(), user, payload.answer_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Answer::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Answer::get_resource_type()))?;

    let question = QuizQuestion::find_by_id(state.pool(), user, answer.question_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizQuestion::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(QuizQuestion::get_resource_type()))?;

    let course = find_lesson_course(&state, user, question.lesson_id()).await?;
    require_enrollment(&state, user, &course).await?;

    let is_correct = grade_answer(question.question_type(), &answer, payload.user_answer.as_deref())
        .ok_or_else(|| WebError::user_bad_request("`user_answer` is required for this question"))?;

    let attempt = QuizAttemptCreate::new(user.user_id(), question.id(), answer.id(), is_correct);
    QuizAttempt::create(state.pool(), user, attempt)
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizAttempt::get_resource_type(), e))?;

    let (first_correct, awards) = if is_correct {
        engine::on_quiz_correct(state.pool(), user, question.id(), question.lesson_id())
            .await
            .map_err(|e| WebError::resource_fetch_error(QuizAttempt::get_resource_type(), e))?
    } else {
        (false, AwardSummary::default())
    };

    let res = QuizCheckResponse {
        is_correct,
        explanation: question.explanation().to_string(),
        image: answer.image().to_string(),
        first_correct,
        awards,
    };
    Ok((StatusCode::OK, Json(res)))
}
