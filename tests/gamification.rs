mod common;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, course_tree_actions, id_of, instructor_actions, setup_server, setup_test_db,
    signin_admin_action, signup_action,
};

fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("Invalid JSON body")
}

fn lesson_done(name: &'static str, lesson_key: &'static str) -> Action {
    Action::new(name, "POST", "dynamic")
        .with_dyn_path(move |ctx| format!("/api/lessons/{}/done", id_of(ctx.get(lesson_key))))
}

fn join(name: &'static str) -> Action {
    Action::new(name, "POST", "dynamic").with_dyn_path(|ctx| {
        format!("/api/gamification/challenges/{}/join", id_of(ctx.get("challenge")))
    })
}

#[tokio::test]
async fn route_rewards_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let ends_at = (Utc::now() + Duration::days(7)).to_rfc3339();

    Flow::new()
        .steps(instructor_actions())
        .steps(course_tree_actions(0))
        // catalog setup is admin only
        .step(
            Action::new("instructor_badge", "POST", "/api/gamification/badges")
                .with_body(json!({
                    "code": "nope",
                    "name": "Nope",
                    "criteria": "points",
                    "threshold": 1,
                }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action().with_clear_cookies(true))
        .step(
            Action::new("create_badge", "POST", "/api/gamification/badges")
                .with_body(json!({
                    "code": "first_lesson",
                    "name": "First steps",
                    "criteria": "lessons_completed",
                    "threshold": 1,
                    "points": 5,
                }))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("duplicate_badge", "POST", "/api/gamification/badges")
                .with_body(json!({
                    "code": "first_lesson",
                    "name": "Again",
                    "criteria": "lessons_completed",
                    "threshold": 1,
                }))
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("streak_challenge", "POST", "/api/gamification/challenges")
                .with_body(json!({
                    "title": "Keep going",
                    "metric": "streak",
                    "target": 3,
                    "ends_at": ends_at,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("create_challenge", "POST", "/api/gamification/challenges")
                .with_body(json!({
                    "title": "Two lessons this week",
                    "metric": "lessons_completed",
                    "target": 2,
                    "reward_points": 20,
                    "ends_at": ends_at,
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("challenge"),
        )
        .step(signup_action("eve", "eve-pass").with_clear_cookies(true))
        .step(join("join").with_expect(StatusCode::CREATED))
        .step(join("join_again").with_expect(StatusCode::CONFLICT))
        .step(
            Action::new("enroll", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/courses/{}/enroll", id_of(ctx.get("course"))))
                .with_expect(StatusCode::CREATED),
        )
        .step(lesson_done("done_lesson1", "lesson1").assert_body(|body| {
            let awards = parse(body);
            assert_eq!(awards["points_awarded"], 15);
            assert_eq!(awards["new_badges"][0]["code"], "first_lesson");
            assert_eq!(awards["completed_challenges"].as_array().map(Vec::len), Some(0));
        }))
        .step(lesson_done("done_lesson2", "lesson2").assert_body(|body| {
            let awards = parse(body);
            // lesson, course bonus and the challenge reward
            assert_eq!(awards["points_awarded"], 80);
            assert_eq!(awards["new_badges"].as_array().map(Vec::len), Some(0));
            assert_eq!(awards["completed_challenges"][0]["reward_points"], 20);
        }))
        .step(
            Action::new("challenges", "GET", "/api/gamification/challenges").assert_body(|body| {
                let views = parse(body);
                assert_eq!(views[0]["joined"], true);
                assert_eq!(views[0]["status"]["completed"], true);
                assert_eq!(views[0]["status"]["progress"], 2);
            }),
        )
        .step(
            Action::new("my_badges", "GET", "/api/gamification/user/badges").assert_body(|body| {
                assert_eq!(parse(body).as_array().map(Vec::len), Some(1));
            }),
        )
        .step(
            Action::new("profile", "GET", "/api/gamification/user").assert_body(|body| {
                let profile = parse(body);
                assert_eq!(profile["points"], 95);
                assert!(profile["level"]["level"].as_u64().is_some_and(|l| l >= 1));
            }),
        )
        .step(
            Action::new("leaderboard", "GET", "/api/gamification/leaderboard")
                .with_param("limit", "5")
                .assert_body(|body| {
                    let board = parse(body);
                    assert_eq!(board[0]["username"], "eve");
                    assert_eq!(board[0]["rank"], 1);
                    assert_eq!(board[0]["points"], 95);
                    assert!(!body.contains(r#""username":"admin""#));
                }),
        )
        .run(&mut server, pool)
        .await;
}
