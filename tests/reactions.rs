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

fn react(name: &'static str, kind: &'static str) -> Action {
    Action::new(name, "POST", "dynamic")
        .with_dyn_path(|ctx| format!("/api/reactions/lesson/{}", id_of(ctx.get("lesson1"))))
        .with_body(json!({ "kind": kind }))
}

#[tokio::test]
async fn route_reaction_toggle_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .steps(instructor_actions())
        .steps(course_tree_actions(0))
        .step(react("teacher_like", "like").assert_body(|body| {
            let res = parse(body);
            assert_eq!(res["mine"], "like");
            assert_eq!(res["total"], 1);
        }))
        .step(signup_action("gina", "gina-pass").with_clear_cookies(true))
        .step(react("like", "like").assert_body(|body| {
            let res = parse(body);
            assert_eq!(res["mine"], "like");
            assert_eq!(res["total"], 2);
        }))
        // same kind removes
        .step(react("unlike", "like").assert_body(|body| {
            let res = parse(body);
            assert_eq!(res["mine"], Value::Null);
            assert_eq!(res["total"], 1);
        }))
        .step(react("love", "love"))
        // another kind replaces
        .step(react("celebrate", "celebrate").assert_body(|body| {
            let res = parse(body);
            assert_eq!(res["mine"], "celebrate");
            assert_eq!(res["total"], 2);
            let counts = res["counts"].as_array().expect("counts array");
            assert_eq!(counts.len(), 4);
            let love = counts.iter().find(|c| c["kind"] == "love").expect("love count");
            assert_eq!(love["count"], 0);
        }))
        .step(
            Action::new("get", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/reactions/lesson/{}", id_of(ctx.get("lesson1"))))
                .assert_body(|body| assert_eq!(parse(body)["mine"], "celebrate")),
        )
        .step(react("unknown_kind", "meh").with_expect(StatusCode::BAD_REQUEST))
        .step(
            Action::new("unknown_target", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/reactions/module/{}", id_of(ctx.get("module"))))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // a course id is not a lesson
        .step(
            Action::new("missing_target", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/reactions/lesson/{}", id_of(ctx.get("course"))))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("course_reaction", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/reactions/course/{}", id_of(ctx.get("course"))))
                .with_body(json!({ "kind": "insightful" }))
                .assert_body(|body| assert_eq!(parse(body)["target_type"], "course")),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_reaction_draft_test() {
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
        .step(
            Action::new("create_module", "POST", "/api/modules")
                .with_dyn_body(|ctx| json!({ "course_id": id_of(ctx.get("draft")), "title": "Basics", "description": "" }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("draft_module"),
        )
        .step(
            Action::new("create_lesson", "POST", "/api/lessons")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": id_of(ctx.get("draft_module")),
                        "title": "Soon",
                        "content": "work in progress",
                    })
                })
                .with_expect(StatusCode::CREATED)
                .with_save_as("draft_lesson"),
        )
        // the owner may react to their own draft
        .step(
            Action::new("owner_reaction", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/reactions/course/{}", id_of(ctx.get("draft"))))
                .with_body(json!({ "kind": "like" })),
        )
        .step(signup_action("hal", "hal-pass").with_clear_cookies(true))
        .step(
            Action::new("draft_course_counts", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/reactions/course/{}", id_of(ctx.get("draft"))))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("draft_course_react", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/reactions/course/{}", id_of(ctx.get("draft"))))
                .with_body(json!({ "kind": "like" }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("draft_lesson_react", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/reactions/lesson/{}", id_of(ctx.get("draft_lesson"))))
                .with_body(json!({ "kind": "love" }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}
