mod common;
use std::future::IntoFuture;

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, add_lesson_action, add_quiz_action, create_course_action, enroll_action,
    publish_action, setup_server, setup_test_db, signin_as, signup_action, submit_action,
};

fn create_quiz_raw(name: &'static str, body: Value) -> Action {
    Action::new(name, "POST", "dynamic")
        .with_dyn_path(|ctx| format!("/api/v1/courses/{}/quizzes", ctx.id("course")))
        .with_body(body)
        .with_expect(StatusCode::BAD_REQUEST)
}

fn quiz_get_action(name: &'static str) -> Action {
    Action::new(name, "GET", "dynamic")
        .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}", ctx.id("quiz")))
}

#[tokio::test]
async fn route_quiz_validation_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teacher"))
        .step(create_course_action("Course").with_save_as("course"))
        .step(create_quiz_raw(
            "no_questions",
            json!({ "title": "Empty", "questions": [] }),
        ))
        .step(create_quiz_raw(
            "one_option",
            json!({
                "title": "Thin",
                "questions": [{ "prompt": "?", "options": ["only"], "correct_option": 0 }],
            }),
        ))
        .step(create_quiz_raw(
            "correct_out_of_range",
            json!({
                "title": "Broken",
                "questions": [{ "prompt": "?", "options": ["a", "b"], "correct_option": 2 }],
            }),
        ))
        .step(create_quiz_raw(
            "passing_score_too_high",
            json!({
                "title": "Strict",
                "passing_score": 101,
                "questions": [{ "prompt": "?", "options": ["a", "b"], "correct_option": 0 }],
            }),
        ))
        .step(create_quiz_raw(
            "zero_attempts",
            json!({
                "title": "Never",
                "max_attempts": 0,
                "questions": [{ "prompt": "?", "options": ["a", "b"], "correct_option": 0 }],
            }),
        ))
        .step(create_quiz_raw(
            "blank_title",
            json!({
                "title": "",
                "questions": [{ "prompt": "?", "options": ["a", "b"], "correct_option": 0 }],
            }),
        ))
        .step(
            Action::new("default_passing_score", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/quizzes", ctx.id("course")))
                .with_body(json!({
                    "title": "Defaults",
                    "questions": [{ "prompt": "?", "options": ["a", "b"], "correct_option": 0 }],
                }))
                .with_expect(StatusCode::CREATED)
                .assert_json(|quiz: Value| {
                    assert_eq!(quiz["passing_score"], 60);
                    assert!(quiz["max_attempts"].is_null());
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_quiz_views_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teacher").with_save_cookies(false))
        .step(signup_action("stud", "student").with_save_cookies(false))
        .step(signin_as("teach"))
        .step(create_course_action("Course").with_save_as("course"))
        .step(add_lesson_action("course", "Intro"))
        .step(add_quiz_action("course", 60, None).with_save_as("quiz"))
        .step(publish_action("course"))
        .step(quiz_get_action("quiz_teacher").assert_json(|quiz: Value| {
            assert_eq!(quiz["questions"][0]["correct_option"], 1);
        }))
        .step(signin_as("stud"))
        .step(quiz_get_action("quiz_not_enrolled").with_expect(StatusCode::FORBIDDEN))
        .step(
            Action::new("quiz_outlines", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/quizzes", ctx.id("course")))
                .assert_json(|quizzes: Vec<Value>| {
                    assert_eq!(quizzes.len(), 1);
                    assert_eq!(quizzes[0]["question_count"], 2);
                }),
        )
        .step(enroll_action("course"))
        .step(
            quiz_get_action("quiz_student")
                .assert_json(|quiz: Value| {
                    assert_eq!(quiz["questions"][0]["prompt"], "2 + 2");
                    assert_eq!(quiz["questions"][1]["options"][0], "compiled");
                })
                .assert_body(|body| assert!(!body.contains("correct_option"))),
        )
        .step(
            Action::new("quiz_update_student", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}", ctx.id("quiz")))
                .with_body(json!({
                    "title": "Mine",
                    "questions": [{ "prompt": "?", "options": ["a", "b"], "correct_option": 0 }],
                }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_quiz_submit_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "teacher").with_save_cookies(false))
        .step(signup_action("stud", "student").with_save_cookies(false))
        .step(signup_action("other", "student").with_save_cookies(false))
        .step(signin_as("teach"))
        .step(create_course_action("Course").with_save_as("course"))
        .step(add_lesson_action("course", "Intro"))
        .step(add_quiz_action("course", 50, Some(2)).with_save_as("quiz"))
        .step(add_quiz_action("course", 60, None).with_save_as("strict"))
        .step(publish_action("course"))
        // submitting is for enrolled students only
        .step(submit_action("quiz", json!([1, 0])).with_expect(StatusCode::FORBIDDEN))
        .step(signin_as("stud"))
        .step(submit_action("quiz", json!([1, 0])).with_expect(StatusCode::FORBIDDEN))
        .step(enroll_action("course"))
        .step(submit_action("quiz", json!([1])).with_expect(StatusCode::BAD_REQUEST))
        .step(submit_action("quiz", json!([1, 7])).with_expect(StatusCode::BAD_REQUEST))
        .step(submit_action("quiz", json!([-1, 0])).with_expect(StatusCode::BAD_REQUEST))
        // half right is enough at 50
        .step(
            submit_action("quiz", json!([1, 1])).assert_json(|submitted: Value| {
                assert_eq!(submitted["results"], json!([true, false]));
                assert_eq!(submitted["submission"]["correct"], 1);
                assert_eq!(submitted["submission"]["total"], 2);
                assert_eq!(submitted["submission"]["percentage"], 50.0);
                assert_eq!(submitted["submission"]["passed"], true);
            }),
        )
        // but not at 60
        .step(
            submit_action("strict", json!([1, 1])).assert_json(|submitted: Value| {
                assert_eq!(submitted["submission"]["passed"], false);
            }),
        )
        // rejected answers did not use up attempts
        .step(submit_action("quiz", json!([0, 0])))
        .step(submit_action("quiz", json!([1, 0])).with_expect(StatusCode::CONFLICT))
        .step(
            Action::new("own_submissions", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/submissions", ctx.id("quiz")))
                .assert_json(|rows: Vec<Value>| assert_eq!(rows.len(), 2)),
        )
        .step(signin_as("other"))
        .step(enroll_action("course"))
        .step(submit_action("quiz", json!([1, 0])))
        .step(
            Action::new("other_submissions", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/submissions", ctx.id("quiz")))
                .assert_json(|rows: Vec<Value>| {
                    assert_eq!(rows.len(), 1);
                    assert_eq!(rows[0]["passed"], true);
                }),
        )
        .step(signin_as("teach"))
        .step(
            Action::new("all_submissions", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/submissions", ctx.id("quiz")))
                .assert_json(|rows: Vec<Value>| assert_eq!(rows.len(), 3)),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn route_quiz_attempts_concurrent_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let ctx = Flow::new()
        .step(signup_action("teach", "teacher").with_save_cookies(false))
        .step(signup_action("stud", "student").with_save_cookies(false))
        .step(signin_as("teach"))
        .step(create_course_action("Course").with_save_as("course"))
        .step(add_lesson_action("course", "Intro"))
        .step(add_quiz_action("course", 50, Some(1)).with_save_as("quiz"))
        .step(publish_action("course"))
        .step(signin_as("stud"))
        .step(enroll_action("course"))
        .play(&mut server)
        .await;

    let path = format!("/api/v1/quizzes/{}/submit", ctx.id("quiz"));
    let submit = || {
        server
            .post(&path)
            .json(&json!({ "answers": [1, 0] }))
            .into_future()
    };

    // one attempt allowed, eight sent at once
    let responses = tokio::join!(
        submit(),
        submit(),
        submit(),
        submit(),
        submit(),
        submit(),
        submit(),
        submit(),
    );
    let statuses = [
        responses.0.status_code(),
        responses.1.status_code(),
        responses.2.status_code(),
        responses.3.status_code(),
        responses.4.status_code(),
        responses.5.status_code(),
        responses.6.status_code(),
        responses.7.status_code(),
    ];

    let accepted = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    assert_eq!(accepted, 1, "statuses: {statuses:?}");
    assert!(
        statuses
            .iter()
            .all(|s| *s == StatusCode::CREATED || *s == StatusCode::CONFLICT),
        "statuses: {statuses:?}"
    );

    let stored: Vec<Value> = server
        .get(&format!("/api/v1/quizzes/{}/submissions", ctx.id("quiz")))
        .await
        .json();
    assert_eq!(stored.len(), 1);
}
