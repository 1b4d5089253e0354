use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{Module, ModuleCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult, error::ErrorResponse,
        middlewares, routes::courses::find_owned_course,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(modules_create_handler))
        .route("/{id}", put(modules_update_handler).delete(modules_delete_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

pub(crate) async fn find_owned_module(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Module> {
    let module = Module::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Module::get_resource_type()))?;

    check_access(state.pool(), user, &module, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(Module::get_resource_type(), e))?;
    Ok(module)
}

#[utoipa::path(
    post,
    path = "/api/modules",
    description = "Adds a module to a course. Without `order_index` it goes last",
    request_body = ModuleCreate,
    responses(
        (status = 201, description = "Module created", body = Module),
        (status = 400, description = "Empty title", body = ErrorResponse),
        (status = 403, description = "You don't own the course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn modules_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if payload.title.trim().is_empty() {
        return Err(WebError::user_bad_request("module title must not be empty"));
    }
    find_owned_course(&state, user, payload.course_id).await?;

    let module = Module::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(module)))
}

#[utoipa::path(
    put,
    path = "/api/modules/{id}",
    description = "Updates a module. `course_id` is ignored, modules don't move between courses",
    request_body = ModuleCreate,
    params(("id" = Uuid, Path, description = "Module id")),
    responses(
        (status = 200, description = "Module updated", body = Module),
        (status = 403, description = "You don't own the course", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn modules_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let module = find_owned_module(&state, user, id).await?;

    let updated = module
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/modules/{id}",
    params(("id" = Uuid, Path, description = "Module id")),
    responses(
        (status = 200, description = "Module deleted with its lessons"),
        (status = 403, description = "You don't own the course", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn modules_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let module = find_owned_module(&state, user, id).await?;

    module
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
