use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{Company, CompanyCreate, UserEntity},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/",
            get(companies_page_handler).post(companies_create_handler),
        )
        .route(
            "/{id}/members/{user_id}",
            put(companies_member_add_handler).delete(companies_member_remove_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Admins manage every company, company admins only their own.
async fn find_managed_company(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Company> {
    user.require_any(&[UserRole::Admin, UserRole::CompanyAdmin])?;

    let company = Company::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Company::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Company::get_resource_type()))?;

    if user.user_role() == UserRole::Admin {
        return Ok(company);
    }

    let me = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    if me.company_id() != Some(company.id()) {
        return Err(WebError::resource_forbidden(Company::get_resource_type()));
    }

    Ok(company)
}

async fn find_member(state: &AppState, user: &AuthenticatedUser, user_id: Uuid) -> WebResult<UserEntity> {
    UserEntity::find_by_id(state.pool(), user, user_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Companies by name", body = crate::model::Page<Company>),
        (status = 403, description = "Admins only", body = ErrorResponse),
    ),
    tag = "companies",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn companies_page_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Admin])?;

    let companies = Company::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Company::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(companies)))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = CompanyCreate,
    responses(
        (status = 201, description = "Company created", body = Company),
        (status = 400, description = "Empty name", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse),
    ),
    tag = "companies",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn companies_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(mut payload): Json<CompanyCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Admin])?;

    payload.name = payload.name.trim().to_string();
    if payload.name.is_empty() {
        return Err(WebError::user_bad_request("company name must not be empty"));
    }

    let existing = Company::find_by_name(state.pool(), user, &payload.name)
        .await
        .map_err(|e| WebError::resource_fetch_error(Company::get_resource_type(), e))?;
    if existing.is_some() {
        return Err(WebError::resource_conflict(Company::get_resource_type()));
    }

    let company = Company::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Company::get_resource_type(), e))?;

    tracing::info!(company = %company.id(), "company created");
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}/members/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Company id"),
        ("user_id" = Uuid, Path, description = "User to attach"),
    ),
    responses(
        (status = 200, description = "User attached to the company", body = UserEntity),
        (status = 403, description = "Not an admin of this company, or the user belongs to another company", body = ErrorResponse),
        (status = 404, description = "Company or user not found", body = ErrorResponse),
    ),
    tag = "companies",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn companies_member_add_handler(
    ctx: RequestContext,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let company = find_managed_company(&state, user, id).await?;
    let member = find_member(&state, user, user_id).await?;

    // only admins move users between companies
    let elsewhere = member.company_id().is_some_and(|c| c != company.id());
    if elsewhere && user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(UserEntity::get_resource_type()));
    }

    let member = member
        .set_company(state.pool(), user, Some(company.id()))
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(member)))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}/members/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Company id"),
        ("user_id" = Uuid, Path, description = "Member to detach"),
    ),
    responses(
        (status = 200, description = "User detached from the company", body = UserEntity),
        (status = 403, description = "Not an admin of this company", body = ErrorResponse),
        (status = 404, description = "Company or member not found", body = ErrorResponse),
    ),
    tag = "companies",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn companies_member_remove_handler(
    ctx: RequestContext,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let company = find_managed_company(&state, user, id).await?;
    let member = find_member(&state, user, user_id).await?;

    if member.company_id() != Some(company.id()) {
        return Err(WebError::resource_not_found(UserEntity::get_resource_type()));
    }

    let member = member
        .set_company(state.pool(), user, None)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(member)))
}
