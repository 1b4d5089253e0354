use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use chrono::Utc;

use crate::{
    auth::{self, UserClaims, generate_refresh_token},
    model::{
        CrudRepository, ResourceTyped,
        entity::{RefreshToken, UserEntity},
    },
    web::{
        AppState, AuthenticatedUser, WebError, WebResult,
        dto::auth::{RefreshBody, TokenResponse},
        error::ErrorResponse,
        routes::user::{UserCreateUpdateBody, authenticate},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/login", post(jwt_login_handler))
        .route("/refresh", post(jwt_refresh_handler))
        .route("/logout", post(jwt_logout_handler))
        .with_state(state)
}

/// Signs a fresh access token and stores a new refresh token for `user`.
async fn issue_tokens(state: &AppState, user: UserEntity) -> WebResult<TokenResponse> {
    let app = state.config().app();
    let access_ttl = app.access_token_ttl();

    let access_token = auth::generate_token(UserClaims::new(user.id(), access_ttl), app.jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let actor = AuthenticatedUser::new(user.id(), user.role());
    let refresh = RefreshToken::create(
        state.pool(),
        &actor,
        generate_refresh_token(),
        Utc::now() + app.refresh_token_ttl(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(RefreshToken::get_resource_type(), e))?;

    Ok(TokenResponse {
        access_token,
        refresh_token: refresh.token().to_string(),
        token_type: "Bearer",
        expires_in: access_ttl.num_seconds(),
        user,
    })
}

#[utoipa::path(
    post,
    path = "/api/jwt/login",
    description = "Exchanges credentials for an access token and a refresh token",
    request_body = UserCreateUpdateBody,
    responses(
        (status = 200, description = "Tokens issued", body = TokenResponse),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "jwt"
)]
pub async fn jwt_login_handler(
    State(state): State<AppState>,
    Json(payload): Json<UserCreateUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = authenticate(&state, &payload.username, &payload.password).await?;

    match RefreshToken::cleanup_expired(state.pool()).await {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "expired refresh tokens removed"),
        Err(e) => tracing::warn!("unable to clean up refresh tokens: {e}"),
    }

    let tokens = issue_tokens(&state, user).await?;
    Ok((StatusCode::OK, Json(tokens)))
}

#[utoipa::path(
    post,
    path = "/api/jwt/refresh",
    description = "Rotates a refresh token. The presented token can't be used again",
    request_body = RefreshBody,
    responses(
        (status = 200, description = "Tokens issued", body = TokenResponse),
        (status = 401, description = "Refresh token unknown, used or expired", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "jwt"
)]
pub async fn jwt_refresh_handler(
    State(state): State<AppState>,
    Json(payload): Json<RefreshBody>,
) -> WebResult<impl IntoResponse> {
    let consumed = RefreshToken::consume(state.pool(), &payload.refresh_token)
        .await
        .map_err(|e| WebError::resource_fetch_error(RefreshToken::get_resource_type(), e))?
        .ok_or_else(WebError::auth_refresh_invalid)?;

    let user = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), consumed.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_refresh_invalid)?;

    let tokens = issue_tokens(&state, user).await?;
    Ok((StatusCode::OK, Json(tokens)))
}

#[utoipa::path(
    post,
    path = "/api/jwt/logout",
    description = "Revokes a refresh token",
    request_body = RefreshBody,
    responses(
        (status = 200, description = "Token revoked or already gone"),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "jwt"
)]
pub async fn jwt_logout_handler(
    State(state): State<AppState>,
    Json(payload): Json<RefreshBody>,
) -> WebResult<impl IntoResponse> {
    let revoked = RefreshToken::revoke(state.pool(), &payload.refresh_token)
        .await
        .map_err(|e| WebError::resource_fetch_error(RefreshToken::get_resource_type(), e))?;

    if !revoked {
        tracing::debug!("logout with an unknown refresh token");
    }
    Ok(StatusCode::OK)
}
