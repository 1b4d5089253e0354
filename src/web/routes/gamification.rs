use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    gamification::{self, engine, rank_entries},
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{
            Badge, BadgeCreate, Challenge, ChallengeCreate, ChallengeMembershipRow, EarnedBadgeRow,
            LeaderboardRow,
        },
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::gamification::{ChallengeView, LeaderboardQuery},
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/user", get(gamification_user_handler))
        .route("/user/badges", get(gamification_user_badges_handler))
        .route(
            "/badges",
            get(gamification_badges_handler).post(gamification_badge_create_handler),
        )
        .route("/leaderboard", get(gamification_leaderboard_handler))
        .route(
            "/challenges",
            get(gamification_challenges_handler).post(gamification_challenge_create_handler),
        )
        .route("/challenges/{id}/join", post(gamification_challenge_join_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/gamification/user",
    description = "Caller's points, level and streak",
    responses(
        (status = 200, description = "Profile", body = gamification::UserProfile),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "gamification",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn gamification_user_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let profile = engine::load_profile(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(crate::model::ResourceType::Activity, e))?;

    Ok((StatusCode::OK, Json(profile)))
}

#[utoipa::path(
    get,
    path = "/api/gamification/user/badges",
    responses(
        (status = 200, description = "Badges earned by the caller, newest first", body = Vec<EarnedBadgeRow>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "gamification",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn gamification_user_badges_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let badges = EarnedBadgeRow::fetch_all(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Badge::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(badges)))
}

#[utoipa::path(
    get,
    path = "/api/gamification/badges",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Badge catalogue", body = crate::model::Page<Badge>),
    ),
    tag = "gamification",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn gamification_badges_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let badges = Badge::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Badge::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(badges)))
}

#[utoipa::path(
    post,
    path = "/api/gamification/badges",
    request_body = BadgeCreate,
    responses(
        (status = 201, description = "Badge created", body = Badge),
        (status = 400, description = "Invalid badge", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 409, description = "Code already used", body = ErrorResponse),
    ),
    tag = "gamification",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn gamification_badge_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<BadgeCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Admin])?;

    if payload.code.trim().is_empty() || payload.threshold < 0 {
        return Err(WebError::user_bad_request("badge needs a code and a non-negative threshold"));
    }

    let existing = Badge::find_by_code(state.pool(), user, &payload.code)
        .await
        .map_err(|e| WebError::resource_fetch_error(Badge::get_resource_type(), e))?;
    if existing.is_some() {
        return Err(WebError::resource_conflict(Badge::get_resource_type()));
    }

    let badge = Badge::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Badge::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(badge)))
}

#[utoipa::path(
    get,
    path = "/api/gamification/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Ranked users", body = Vec<gamification::RankedEntry>),
    ),
    tag = "gamification",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn gamification_leaderboard_handler(
    ctx: RequestContext,
    Query(query): Query<LeaderboardQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let rows = LeaderboardRow::fetch_top(state.pool(), user, query.limit(), query.company())
        .await
        .map_err(|e| WebError::resource_fetch_error(crate::model::ResourceType::Activity, e))?;

    let ranked = rank_entries(
        rows.into_iter()
            .map(|row| (row.user_id, row.username, row.points))
            .collect(),
    );
    Ok((StatusCode::OK, Json(ranked)))
}

#[utoipa::path(
    get,
    path = "/api/gamification/challenges",
    description = "Running and upcoming challenges plus every challenge the caller joined",
    responses(
        (status = 200, description = "Challenges with the caller's progress", body = Vec<ChallengeView>),
    ),
    tag = "gamification",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn gamification_challenges_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let now = Utc::now();

    let rows = ChallengeMembershipRow::fetch_visible(state.pool(), user, now)
        .await
        .map_err(|e| WebError::resource_fetch_error(Challenge::get_resource_type(), e))?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let progress = row
            .challenge
            .progress(state.pool(), user)
            .await
            .map_err(|e| WebError::resource_fetch_error(Challenge::get_resource_type(), e))?;
        views.push(ChallengeView::new(row, progress, now));
    }

    Ok((StatusCode::OK, Json(views)))
}

#[utoipa::path(
    post,
    path = "/api/gamification/challenges",
    request_body = ChallengeCreate,
    responses(
        (status = 201, description = "Challenge created", body = Challenge),
        (status = 400, description = "Invalid metric, target or window", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
    ),
    tag = "gamification",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn gamification_challenge_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<ChallengeCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_any(&[UserRole::Admin])?;

    if !payload.metric.usable_for_challenge() {
        return Err(WebError::user_bad_request(format!(
            "`{}` can't be used as a challenge metric",
            payload.metric.as_str()
        )));
    }
    if payload.target <= 0 {
        return Err(WebError::user_bad_request("challenge target must be positive"));
    }
    if payload.ends_at <= payload.starts_at.unwrap_or_else(Utc::now) {
        return Err(WebError::user_bad_request("challenge must end after it starts"));
    }

    let challenge = Challenge::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Challenge::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(challenge)))
}

#[utoipa::path(
    post,
    path = "/api/gamification/challenges/{id}/join",
    params(("id" = Uuid, Path, description = "Challenge id")),
    responses(
        (status = 201, description = "Joined"),
        (status = 400, description = "Challenge already ended", body = ErrorResponse),
        (status = 404, description = "Challenge not found", body = ErrorResponse),
        (status = 409, description = "Already joined", body = ErrorResponse),
    ),
    tag = "gamification",
    security(("cookie" = []), ("bearer" = []))
)]
pub async fn gamification_challenge_join_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let challenge = Challenge::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Challenge::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Challenge::get_resource_type()))?;

    if challenge.ends_at() < Utc::now() {
        return Err(WebError::user_bad_request("challenge has already ended"));
    }

    let joined = challenge
        .join(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Challenge::get_resource_type(), e))?;

    if !joined {
        return Err(WebError::resource_conflict(Challenge::get_resource_type()));
    }

    Ok(StatusCode::CREATED)
}
