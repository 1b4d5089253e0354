use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";
static BEARER_PREFIX: &str = "Bearer ";

/// Bearer header wins over the cookie.
fn find_token(req: &Request, cookies: &Cookies) -> Option<(&'static str, String)> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(("Authorization", token)),
        None => cookies
            .get(AUTH_TOKEN)
            .map(|cookie| (AUTH_TOKEN, cookie.value().to_string())),
    }
}

pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let Some((source, token)) = find_token(&req, &cookies) else {
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let claims = auth::process_token(&token, state.config().app().jwt())
        .map_err(|e| WebError::auth_token_invalid(source, e))?;

    // a token we signed always carries a uuid; treat anything else as anonymous
    let Some(id) = claims.claims.user_id() else {
        tracing::warn!("token `sub` is not a user id");
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let found = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let ctx = found.map(|user| AuthenticatedUser::new(id, user.role()));
    req.extensions_mut().insert(RequestContext::new(ctx));
    Ok(next.run(req).await)
}
