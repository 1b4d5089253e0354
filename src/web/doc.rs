use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::routes::{
    companies, courses, dashboard, gamification, jwt, lessons, modules, progress, quizzes,
    reactions, subscriptions, user,
};

/// Registers both ways of authenticating: the `SID` cookie set by signin and the bearer token
/// issued by the JWT endpoints.
pub struct AuthModifier;

impl Modify for AuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
            schema.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        user::user_signup_handler,
        user::user_signin_handler,
        user::user_signout_handler,
        user::user_verify_handler,
        user::user_me_handler,
        user::user_list_handler,
        user::user_update_handler,
        user::user_delete_handler,
        user::user_role_handler,
        jwt::jwt_login_handler,
        jwt::jwt_refresh_handler,
        jwt::jwt_logout_handler,
        courses::courses_list_handler,
        courses::courses_create_handler,
        courses::courses_get_handler,
        courses::courses_update_handler,
        courses::courses_delete_handler,
        courses::courses_enroll_handler,
        courses::courses_unenroll_handler,
        courses::courses_progress_handler,
        courses::courses_enrolled_handler,
        modules::modules_create_handler,
        modules::modules_update_handler,
        modules::modules_delete_handler,
        lessons::lessons_create_handler,
        lessons::lessons_update_handler,
        lessons::lessons_delete_handler,
        lessons::lessons_get_handler,
        lessons::lessons_mark_done_handler,
        lessons::lessons_next_handler,
        lessons::lessons_quiz_handler,
        quizzes::quizzes_question_create_handler,
        quizzes::quizzes_answer_create_handler,
        quizzes::quizzes_check_handler,
        progress::progress_get_handler,
        gamification::gamification_user_handler,
        gamification::gamification_user_badges_handler,
        gamification::gamification_badges_handler,
        gamification::gamification_badge_create_handler,
        gamification::gamification_leaderboard_handler,
        gamification::gamification_challenges_handler,
        gamification::gamification_challenge_create_handler,
        gamification::gamification_challenge_join_handler,
        subscriptions::subscriptions_plans_handler,
        subscriptions::subscriptions_plan_create_handler,
        subscriptions::subscriptions_me_handler,
        subscriptions::subscriptions_subscribe_handler,
        subscriptions::subscriptions_cancel_handler,
        reactions::reactions_get_handler,
        reactions::reactions_toggle_handler,
        companies::companies_page_handler,
        companies::companies_create_handler,
        companies::companies_member_add_handler,
        companies::companies_member_remove_handler,
        dashboard::dashboard_student_handler,
        dashboard::dashboard_instructor_handler,
        dashboard::dashboard_admin_handler,
        dashboard::dashboard_company_handler,
    ),
    components(schemas(crate::web::ErrorResponse)),
    tags(
        (name = "account", description = "Registration and cookie sessions"),
        (name = "jwt", description = "Bearer tokens with refresh rotation"),
        (name = "courses", description = "Catalog, enrollment and course progress"),
        (name = "gamification", description = "Points, badges, leaderboard and challenges"),
        (name = "subscriptions", description = "Plans and tiered access"),
        (name = "dashboard", description = "Role based summaries"),
    ),
    modifiers(&AuthModifier),
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn documents_both_auth_schemes() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components are generated");

        assert!(components.security_schemes.contains_key("cookie"));
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(doc.paths.paths.contains_key("/api/lessons/{lesson_id}/done"));
    }
}
