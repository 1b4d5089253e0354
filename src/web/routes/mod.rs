use crate::{
    Config,
    web::{AppState, doc::ApiDoc},
};
use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod companies;
pub mod courses;
pub mod dashboard;
pub mod gamification;
pub mod jwt;
pub mod lessons;
pub mod modules;
pub mod progress;
pub mod quizzes;
pub mod reactions;
pub mod subscriptions;
pub mod user;

const DEFAULT_PAGE_LIMIT: i64 = 20;
const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct PaginationQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState, config: &'static Config) -> Router<S> {
    let mut router = Router::new()
        .nest("/api/account", user::routes(state.clone()))
        .nest("/api/jwt", jwt::routes(state.clone()))
        .nest("/api/courses", courses::routes(state.clone()))
        .nest("/api/modules", modules::routes(state.clone()))
        .nest("/api/lessons", lessons::routes(state.clone()))
        .nest("/api/quizzes", quizzes::routes(state.clone()))
        .nest("/api/progress", progress::routes(state.clone()))
        .nest("/api/gamification", gamification::routes(state.clone()))
        .nest("/api/subscriptions", subscriptions::routes(state.clone()))
        .nest("/api/reactions", reactions::routes(state.clone()))
        .nest("/api/companies", companies::routes(state.clone()))
        .nest("/api/dashboard", dashboard::routes(state.clone()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let empty = PaginationQuery { limit: None, offset: None };
        assert_eq!(empty.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(empty.offset(), 0);

        let wild = PaginationQuery { limit: Some(10_000), offset: Some(-5) };
        assert_eq!(wild.limit(), MAX_PAGE_LIMIT);
        assert_eq!(wild.offset(), 0);

        let zero = PaginationQuery { limit: Some(0), offset: Some(40) };
        assert_eq!(zero.limit(), 1);
        assert_eq!(zero.offset(), 40);
    }
}
