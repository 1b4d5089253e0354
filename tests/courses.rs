mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, course_tree_actions, id_of, instructor_actions, setup_server, setup_test_db,
    signup_action,
};

fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("Invalid JSON body")
}

fn lesson_done(name: &'static str, lesson_key: &'static str) -> Action {
    Action::new(name, "POST", "dynamic")
        .with_dyn_path(move |ctx| format!("/api/lessons/{}/done", id_of(ctx.get(lesson_key))))
}

fn enroll() -> Action {
    Action::new("enroll", "POST", "dynamic")
        .with_dyn_path(|ctx| format!("/api/courses/{}/enroll", id_of(ctx.get("course"))))
}

fn course_progress() -> Action {
    Action::new("course_progress", "GET", "dynamic")
        .with_dyn_path(|ctx| format!("/api/courses/{}/progress", id_of(ctx.get("course"))))
}

#[tokio::test]
async fn route_course_completion_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .steps(instructor_actions())
        .steps(course_tree_actions(0))
        // students can't author courses
        .step(signup_action("ann", "ann-pass").with_clear_cookies(true))
        .step(
            Action::new("student_create_course", "POST", "/api/courses")
                .with_body(json!({ "title": "nope", "description": "" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // marking a lesson requires an enrollment
        .step(lesson_done("done_not_enrolled", "lesson1").with_expect(StatusCode::FORBIDDEN))
        .step(enroll().with_expect(StatusCode::CREATED))
        .step(enroll().with_expect(StatusCode::CONFLICT))
        .step(course_progress().assert_body(|body| {
            let progress = parse(body);
            assert_eq!(progress["total_lessons"], 2);
            assert_eq!(progress["completed_lessons"], 0);
            assert_eq!(progress["completed"], false);
        }))
        .step(lesson_done("done_lesson1", "lesson1").assert_body(|body| {
            let awards = parse(body);
            assert_eq!(awards["points_awarded"], 10);
            assert_eq!(awards["course_completed"], false);
        }))
        // repeating the call grants nothing
        .step(lesson_done("done_lesson1_again", "lesson1").assert_body(|body| {
            let awards = parse(body);
            assert_eq!(awards["points_awarded"], 0);
            assert_eq!(awards["course_completed"], false);
        }))
        .step(
            Action::new("next_lesson", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/lessons/{}/next", id_of(ctx.get("lesson1"))))
                .assert_body(|body| assert!(body.contains("Functions"))),
        )
        .step(lesson_done("done_lesson2", "lesson2").assert_body(|body| {
            let awards = parse(body);
            // lesson points plus the course bonus
            assert_eq!(awards["points_awarded"], 60);
            assert_eq!(awards["course_completed"], true);
        }))
        .step(lesson_done("done_lesson2_again", "lesson2").assert_body(|body| {
            let awards = parse(body);
            assert_eq!(awards["points_awarded"], 0);
            assert_eq!(awards["course_completed"], false);
        }))
        .step(
            Action::new("next_lesson_none", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/lessons/{}/next", id_of(ctx.get("lesson1"))))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(course_progress().assert_body(|body| {
            let progress = parse(body);
            assert_eq!(progress["percent"], 100);
            assert_eq!(progress["completed"], true);
        }))
        .step(
            Action::new("enrolled", "GET", "/api/courses/enrolled").assert_body(|body| {
                let enrolled = parse(body);
                assert_eq!(enrolled.as_array().map(Vec::len), Some(1));
                assert_eq!(enrolled[0]["progress"]["completed"], true);
            }),
        )
        .step(
            Action::new("profile", "GET", "/api/gamification/user").assert_body(|body| {
                let profile = parse(body);
                assert_eq!(profile["points"], 70);
                assert_eq!(profile["streak"]["current"], 1);
            }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_visibility_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .steps(instructor_actions())
        .step(
            Action::new("create_draft", "POST", "/api/courses")
                .with_body(json!({
                    "title": "Draft",
                    "description": "not ready",
                    "published": false,
                }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("draft"),
        )
        // the owner sees the draft
        .step(
            Action::new("owner_get_draft", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/courses/{}", id_of(ctx.get("draft")))),
        )
        .step(signup_action("bob", "bob-pass").with_clear_cookies(true))
        .step(
            Action::new("student_get_draft", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/courses/{}", id_of(ctx.get("draft"))))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("catalog", "GET", "/api/courses").assert_body(|body| {
                let page = parse(body);
                assert_eq!(page["total"], 0);
            }),
        )
        .step(
            Action::new("student_delete_draft", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/courses/{}", id_of(ctx.get("draft"))))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}
