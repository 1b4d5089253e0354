mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{Action, Flow, setup_server, setup_test_db, signup_action};

fn token(ctx: &common::FlowContext, key: &str, field: &str) -> String {
    ctx.get(key)[field]
        .as_str()
        .unwrap_or_else(|| panic!("no {field} in {key}"))
        .to_string()
}

fn refresh(name: &'static str, key: &'static str) -> Action {
    Action::new(name, "POST", "/api/jwt/refresh")
        .with_dyn_body(move |ctx| json!({ "refresh_token": token(ctx, key, "refresh_token") }))
}

#[tokio::test]
async fn route_jwt_rotation_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("dora", "dora-pass").with_save_cookies(false))
        .step(
            Action::new("login_wrong", "POST", "/api/jwt/login")
                .with_body(json!({ "username": "dora", "password": "nope" }))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(
            Action::new("login", "POST", "/api/jwt/login")
                .with_body(json!({ "username": "dora", "password": "dora-pass" }))
                .with_save_cookies(false)
                .assert_body(|body| {
                    let tokens: Value = serde_json::from_str(body).expect("Invalid JSON body");
                    assert_eq!(tokens["token_type"], "Bearer");
                    assert!(tokens["expires_in"].as_i64().is_some_and(|s| s > 0));
                    assert_eq!(tokens["user"]["username"], "dora");
                })
                .with_save_as("login"),
        )
        // the access token works without any cookie
        .step(
            Action::new("me_bearer", "GET", "/api/account/me")
                .with_clear_cookies(true)
                .with_dyn_bearer(|ctx| token(ctx, "login", "access_token"))
                .assert_body(|body| assert!(body.contains("dora"))),
        )
        .step(
            Action::new("me_garbage_bearer", "GET", "/api/account/me")
                .with_dyn_bearer(|_| "not-a-jwt".to_string())
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(Action::new("me_anonymous", "GET", "/api/account/me").with_expect(StatusCode::UNAUTHORIZED))
        .step(refresh("refresh", "login").with_save_as("rotated"))
        // a refresh token is single use
        .step(refresh("refresh_reused", "login").with_expect(StatusCode::UNAUTHORIZED))
        .step(
            Action::new("me_rotated", "GET", "/api/account/me")
                .with_dyn_bearer(|ctx| token(ctx, "rotated", "access_token")),
        )
        .step(
            Action::new("logout", "POST", "/api/jwt/logout")
                .with_dyn_body(|ctx| json!({ "refresh_token": token(ctx, "rotated", "refresh_token") })),
        )
        // logging out twice is fine
        .step(
            Action::new("logout_again", "POST", "/api/jwt/logout")
                .with_dyn_body(|ctx| json!({ "refresh_token": token(ctx, "rotated", "refresh_token") })),
        )
        .step(refresh("refresh_revoked", "rotated").with_expect(StatusCode::UNAUTHORIZED))
        .run(&mut server, pool)
        .await;
}
