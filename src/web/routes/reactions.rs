use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        ResourceTyped,
        entity::{Reaction, ReactionKind, ReactionTarget},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::reactions::{ReactionBody, ReactionsResponse},
        error::ErrorResponse,
        middlewares,
        routes::{courses::find_visible_course, lessons::find_lesson_course},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{target_type}/{id}",
            get(reactions_get_handler).post(reactions_toggle_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Parses the target type and makes sure the caller can see the target.
async fn resolve_target(
    state: &AppState,
    user: &AuthenticatedUser,
    target_type: &str,
    id: Uuid,
) -> WebResult<ReactionTarget> {
    let target = ReactionTarget::parse(target_type)
        .ok_or_else(|| WebError::user_bad_request(format!("unknown reaction target '{target_type}'")))?;

    match target {
        ReactionTarget::Course => {
            find_visible_course(state, user, id).await?;
        }
        ReactionTarget::Lesson => {
            find_lesson_course(state, user, id).await?;
        }
    }

    Ok(target)
}

#[utoipa::path(
    get,
    path = "/api/reactions/{target_type}/{id}",
    params(
        ("target_type" = String, Path, description = "course or lesson"),
        ("id" = Uuid, Path, description = "Target id"),
    ),
    responses(
        (status = 200, description = "Counts per kind and the caller's reaction", body = ReactionsResponse),
        (status = 400, description = "Unknown target type", body = ErrorResponse),
        (status = 404, description = "Target not found or not published", body = ErrorResponse),
    ),
    tag = "reactions",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn reactions_get_handler(
    ctx: RequestContext,
    Path((target_type, id)): Path<(String, Uuid)>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let target = resolve_target(&state, user, &target_type, id).await?;

    let (counts, mine) = tokio::try_join!(
        Reaction::counts(state.pool(), target, id),
        Reaction::find(state.pool(), user, target, id),
    )
    .map_err(|e| WebError::resource_fetch_error(Reaction::get_resource_type(), e))?;

    let mine = mine.and_then(|r| r.kind());
    Ok((StatusCode::OK, Json(ReactionsResponse::new(target, id, counts, mine))))
}

#[utoipa::path(
    post,
    path = "/api/reactions/{target_type}/{id}",
    description = "Same kind removes the reaction, another kind replaces it",
    params(
        ("target_type" = String, Path, description = "course or lesson"),
        ("id" = Uuid, Path, description = "Target id"),
    ),
    request_body = ReactionBody,
    responses(
        (status = 200, description = "Reactions after the toggle", body = ReactionsResponse),
        (status = 400, description = "Unknown target type or kind", body = ErrorResponse),
        (status = 404, description = "Target not found or not published", body = ErrorResponse),
    ),
    tag = "reactions",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn reactions_toggle_handler(
    ctx: RequestContext,
    Path((target_type, id)): Path<(String, Uuid)>,
    State(state): State<AppState>,
    Json(payload): Json<ReactionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let kind = ReactionKind::parse(&payload.kind)
        .ok_or_else(|| WebError::user_bad_request(format!("unknown reaction kind '{}'", payload.kind)))?;
    let target = resolve_target(&state, user, &target_type, id).await?;

    let mine = Reaction::toggle(state.pool(), user, target, id, kind)
        .await
        .map_err(|e| WebError::resource_fetch_error(Reaction::get_resource_type(), e))?;

    let counts = Reaction::counts(state.pool(), target, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Reaction::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(ReactionsResponse::new(target, id, counts, mine))))
}
