use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{Plan, PlanCreate, Subscription, SubscriptionWithPlanRow},
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::subscriptions::{SubscribeBody, SubscriptionResponse},
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(subscriptions_subscribe_handler))
        .route(
            "/plans",
            get(subscriptions_plans_handler).post(subscriptions_plan_create_handler),
        )
        .route("/me", get(subscriptions_me_handler))
        .route("/cancel", post(subscriptions_cancel_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/plans",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Plans ordered by tier", body = crate::model::Page<Plan>),
    ),
    tag = "subscriptions",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn subscriptions_plans_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let plans = Plan::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Plan::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(plans)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/plans",
    request_body = PlanCreate,
    responses(
        (status = 201, description = "Plan created", body = Plan),
        (status = 400, description = "Invalid plan", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 409, description = "Code already used", body = ErrorResponse),
    ),
    tag = "subscriptions",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn subscriptions_plan_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<PlanCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Admin])?;

    payload.validate().map_err(WebError::user_bad_request)?;

    let existing = Plan::find_by_code(state.pool(), user, &payload.code)
        .await
        .map_err(|e| WebError::resource_fetch_error(Plan::get_resource_type(), e))?;
    if existing.is_some() {
        return Err(WebError::resource_conflict(Plan::get_resource_type()));
    }

    let plan = Plan::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Plan::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(plan)))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/me",
    responses(
        (status = 200, description = "Subscription currently granting access", body = SubscriptionResponse),
        (status = 404, description = "No active subscription", body = ErrorResponse),
    ),
    tag = "subscriptions",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn subscriptions_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let current = SubscriptionWithPlanRow::fetch_current(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Subscription::get_resource_type(), e))?
        .ok_or_else(WebError::subscription_not_found)?;

    Ok((StatusCode::OK, Json(SubscriptionResponse::from(current))))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    description = "Subscribes the caller to a plan, replacing the current subscription",
    request_body = SubscribeBody,
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 404, description = "Plan not found", body = ErrorResponse),
    ),
    tag = "subscriptions",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn subscriptions_subscribe_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<SubscribeBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let plan = Plan::find_by_id(state.pool(), user, payload.plan_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Plan::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Plan::get_resource_type()))?;

    let subscription = Subscription::subscribe(state.pool(), user, &plan)
        .await
        .map_err(|e| WebError::resource_fetch_error(Subscription::get_resource_type(), e))?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::with_plan(&subscription, &plan)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/cancel",
    description = "Cancels the current subscription. Access is kept until the period ends",
    responses(
        (status = 200, description = "Canceled", body = SubscriptionResponse),
        (status = 404, description = "No active subscription", body = ErrorResponse),
    ),
    tag = "subscriptions",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn subscriptions_cancel_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let current = SubscriptionWithPlanRow::fetch_current(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Subscription::get_resource_type(), e))?
        .ok_or_else(WebError::subscription_not_found)?;

    let SubscriptionWithPlanRow {
        subscription,
        plan_code,
        plan_name,
        tier,
    } = current;

    let canceled = subscription
        .cancel(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Subscription::get_resource_type(), e))?;

    tracing::info!(plan = %plan_code, "subscription canceled");
    Ok((
        StatusCode::OK,
        Json(SubscriptionResponse::new(&canceled, &plan_code, &plan_name, tier)),
    ))
}
