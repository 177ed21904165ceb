mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, add_lesson_action, complete_lesson_action, create_course_action, enroll_action,
    publish_action, setup_server, setup_test_db, signin_admin_action, signin_as, signup_action,
};

#[tokio::test]
async fn route_course_authoring_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teacher"))
        .step(
            create_course_action("Rust Basics")
                .with_save_as("course")
                .assert_json(|course: Value| {
                    assert_eq!(course["published"], false);
                    assert_eq!(course["title"], "Rust Basics");
                }),
        )
        .step(
            Action::new("create_course_blank", "POST", "/api/v1/courses")
                .with_body(json!({ "title": "   " }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // nothing to learn yet
        .step(publish_action("course").with_expect(StatusCode::BAD_REQUEST))
        .step(
            add_lesson_action("course", "Intro")
                .with_save_as("intro")
                .assert_json(|lesson: Value| assert_eq!(lesson["order_index"], 0)),
        )
        .step(
            add_lesson_action("course", "Ownership")
                .assert_json(|lesson: Value| assert_eq!(lesson["order_index"], 1)),
        )
        .step(publish_action("course").assert_json(|course: Value| {
            assert_eq!(course["published"], true);
        }))
        .step(
            Action::new("mine", "GET", "/api/v1/courses/mine")
                .assert_json(|page: Value| assert_eq!(page["total"], 1)),
        )
        // students can browse but not author
        .step(signup_action("stud", "student"))
        .step(create_course_action("Nope").with_expect(StatusCode::FORBIDDEN))
        .step(
            Action::new("mine_student", "GET", "/api/v1/courses/mine")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("list", "GET", "/api/v1/courses")
                .assert_json(|page: Value| {
                    assert_eq!(page["total"], 1);
                    assert_eq!(page["limit"], 20);
                }),
        )
        .step(
            Action::new("search", "GET", "/api/v1/courses")
                .with_param("search", "rust")
                .assert_json(|page: Value| assert_eq!(page["total"], 1)),
        )
        .step(
            Action::new("search_miss", "GET", "/api/v1/courses")
                .with_param("search", "haskell")
                .assert_json(|page: Value| assert_eq!(page["total"], 0)),
        )
        .step(
            Action::new("get", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .assert_json(|detail: Value| {
                    assert_eq!(detail["title"], "Rust Basics");
                    assert_eq!(detail["enrollment_count"], 0);
                    let lessons = detail["lessons"].as_array().expect("lessons");
                    assert_eq!(lessons.len(), 2);
                    assert_eq!(lessons[0]["title"], "Intro");
                    assert_eq!(lessons[1]["title"], "Ownership");
                    assert!(lessons[0].get("content").is_none());
                }),
        )
        .step(
            Action::new("update_not_owner", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_body(json!({ "title": "Hijacked" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // another teacher does not own it either
        .step(signup_action("teach2", "teacher"))
        .step(
            Action::new("update_other_teacher", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_body(json!({ "title": "Hijacked" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(add_lesson_action("course", "Sneaky").with_expect(StatusCode::FORBIDDEN))
        .step(
            Action::new("delete_other_teacher", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // admins pass the ownership check
        .step(signin_admin_action())
        .step(
            Action::new("update_admin", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_body(json!({ "title": "Rust Basics, revised", "description": "v2" }))
                .assert_json(|course: Value| {
                    assert_eq!(course["title"], "Rust Basics, revised");
                    assert_eq!(course["description"], "v2");
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_draft_visibility_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teacher").with_save_cookies(false))
        .step(signup_action("stud", "student").with_save_cookies(false))
        .step(signin_as("teach"))
        .step(create_course_action("Draft").with_save_as("course"))
        .step(add_lesson_action("course", "Only lesson"))
        .step(
            Action::new("get_owner", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course"))),
        )
        .step(signin_as("stud"))
        .step(
            Action::new("get_draft", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("lessons_draft", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/lessons", ctx.id("course")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("list_hides_draft", "GET", "/api/v1/courses")
                .assert_json(|page: Value| assert_eq!(page["total"], 0)),
        )
        .step(
            Action::new("get_missing", "GET", "/api/v1/courses/00000000-0000-0000-0000-000000000000")
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(signin_as("teach"))
        .step(publish_action("course"))
        .step(signin_as("stud"))
        .step(
            Action::new("lessons_published", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/lessons", ctx.id("course")))
                .assert_json(|lessons: Vec<Value>| assert_eq!(lessons.len(), 1)),
        )
        .step(signin_as("teach"))
        .step(
            Action::new("unpublish", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/unpublish", ctx.id("course")))
                .assert_json(|course: Value| assert_eq!(course["published"], false)),
        )
        .step(signin_as("stud"))
        .step(
            Action::new("get_unpublished", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_lesson_access_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teacher").with_save_cookies(false))
        .step(signup_action("stud", "student").with_save_cookies(false))
        .step(signin_as("teach"))
        .step(create_course_action("Course").with_save_as("course"))
        .step(add_lesson_action("course", "First").with_save_as("lesson"))
        .step(publish_action("course"))
        // the teacher reads content without enrolling
        .step(
            Action::new("get_lesson_owner", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", ctx.id("lesson")))
                .assert_json(|lesson: Value| assert_eq!(lesson["content"], "# First")),
        )
        .step(signin_as("stud"))
        .step(
            Action::new("get_lesson_not_enrolled", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", ctx.id("lesson")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(complete_lesson_action("lesson").with_expect(StatusCode::FORBIDDEN))
        .step(enroll_action("course"))
        .step(
            Action::new("get_lesson", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", ctx.id("lesson")))
                .assert_json(|lesson: Value| assert_eq!(lesson["completed"], false)),
        )
        .step(
            complete_lesson_action("lesson")
                .with_save_as("first_completion")
                .assert_json(|enrollment: Value| {
                    assert_eq!(enrollment["progress"], 100.0);
                    assert!(!enrollment["completed_at"].is_null());
                }),
        )
        // completing twice changes nothing
        .step(
            complete_lesson_action("lesson").assert_json(|enrollment: Value| {
                assert_eq!(enrollment["progress"], 100.0);
            }),
        )
        .step(
            Action::new("get_lesson_completed", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", ctx.id("lesson")))
                .assert_json(|lesson: Value| assert_eq!(lesson["completed"], true)),
        )
        // students cannot edit content
        .step(
            Action::new("update_lesson_student", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", ctx.id("lesson")))
                .with_body(json!({ "title": "Mine now", "content": "" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_as("teach"))
        .step(
            Action::new("update_lesson", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", ctx.id("lesson")))
                .with_body(json!({ "title": "First, revised", "content": "new", "order_index": 5 }))
                .assert_json(|lesson: Value| {
                    assert_eq!(lesson["title"], "First, revised");
                    assert_eq!(lesson["order_index"], 5);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_delete_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teacher").with_save_cookies(false))
        .step(signup_action("stud", "student").with_save_cookies(false))
        .step(signin_as("teach"))
        .step(create_course_action("Short lived").with_save_as("course"))
        .step(add_lesson_action("course", "Only").with_save_as("lesson"))
        .step(publish_action("course"))
        .step(signin_as("stud"))
        .step(enroll_action("course"))
        .step(signin_as("teach"))
        .step(
            Action::new("students", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/students", ctx.id("course")))
                .assert_json(|students: Vec<Value>| {
                    assert_eq!(students.len(), 1);
                    assert_eq!(students[0]["username"], "stud");
                }),
        )
        .step(
            Action::new("delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course"))),
        )
        .step(
            Action::new("get_deleted", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id("course")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("lesson_gone", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", ctx.id("lesson")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(signin_as("stud"))
        .step(
            Action::new("enrollments_gone", "GET", "/api/v1/enrollments")
                .assert_json(|rows: Vec<Value>| assert!(rows.is_empty())),
        )
        .run(&mut server, pool)
        .await;
}
