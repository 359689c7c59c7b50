use axum::body::to_bytes;
use axum::http::{header, Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn create_classroom_allocates_a_code() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/classrooms",
            Some(json!({"question": "Why is X?"})),
        ))
        .await
        .expect("create classroom");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");

    let class_code = body["class_code"].as_str().expect("class code");
    assert_eq!(class_code.len(), 4);
    assert!(class_code.chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()));
    assert_eq!(body["status"], "active");
    assert_eq!(body["question"], "Why is X?");
    assert!(body["teacher_id"].as_str().expect("teacher id").starts_with("T-"));

    let found = repositories::classrooms::find_by_code(ctx.state.db(), class_code)
        .await
        .expect("find classroom")
        .expect("classroom visible to subsequent reads");
    assert_eq!(found.question.as_deref(), Some("Why is X?"));
}

#[tokio::test]
async fn create_classroom_rejects_blank_question() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/classrooms",
            Some(json!({"question": "   "})),
        ))
        .await
        .expect("create classroom");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_class_code_is_rejected_not_overwritten() {
    let ctx = test_support::setup_test_context().await;
    let now = primitive_now_utc();

    let create = |question: &'static str| {
        repositories::classrooms::create(
            ctx.state.db(),
            repositories::classrooms::CreateClassroom {
                class_code: "AB12",
                teacher_id: "T-0001",
                question: Some(question),
                created_at: now,
            },
        )
    };

    assert!(create("Why is X?").await.expect("first create"));
    assert!(!create("Why is Y?").await.expect("second create"), "duplicate must be rejected");

    let found = repositories::classrooms::find_by_code(ctx.state.db(), "AB12")
        .await
        .expect("find classroom")
        .expect("classroom present");
    assert_eq!(found.question.as_deref(), Some("Why is X?"), "original row survives");
}

#[tokio::test]
async fn unknown_classroom_is_distinguished_as_not_found() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/classrooms/ZZ99", None))
        .await
        .expect("get classroom");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_question_mirrors_into_the_store() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_classroom(ctx.state.db(), "AB12", "T-0001", Some("Why is X?")).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            "/api/v1/classrooms/AB12/question",
            Some(json!({"question": "Why is Y?"})),
        ))
        .await
        .expect("update question");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["question"], "Why is Y?");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            "/api/v1/classrooms/AB12/question",
            Some(json!({"question": "  "})),
        ))
        .await
        .expect("update question blank");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn navigate_pushes_only_when_the_active_question_changes() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_classroom(ctx.state.db(), "AB12", "T-0001", Some("q1")).await;

    let session = json!({
        "teacher_id": "T-0001",
        "class_code": "AB12",
        "questions": ["q1", "q2"],
        "active_index": 0
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/classrooms/AB12/navigate",
            Some(json!({"session": session, "action": {"kind": "next"}})),
        ))
        .await
        .expect("navigate next");

    let body = test_support::read_json(response).await;
    assert_eq!(body["pushed"], true, "response: {body}");
    assert_eq!(body["session"]["active_index"], 1);

    let stored = repositories::classrooms::find_by_code(ctx.state.db(), "AB12")
        .await
        .expect("find classroom")
        .expect("classroom present");
    assert_eq!(stored.question.as_deref(), Some("q2"));

    // Reordering keeps the pointer on the same text, so nothing is pushed.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/classrooms/AB12/navigate",
            Some(json!({
                "session": body["session"],
                "action": {"kind": "move_up", "index": 1}
            })),
        ))
        .await
        .expect("navigate move_up");

    let body = test_support::read_json(response).await;
    assert_eq!(body["pushed"], false, "response: {body}");

    let stored = repositories::classrooms::find_by_code(ctx.state.db(), "AB12")
        .await
        .expect("find classroom")
        .expect("classroom present");
    assert_eq!(stored.question.as_deref(), Some("q2"), "mirror unchanged by reorder");
}

#[tokio::test]
async fn close_marks_the_classroom_terminal() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_classroom(ctx.state.db(), "AB12", "T-0001", Some("q1")).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, "/api/v1/classrooms/AB12/close", None))
        .await
        .expect("close classroom");

    let body = test_support::read_json(response).await;
    assert_eq!(body["status"], "closed", "response: {body}");

    assert!(
        !test_support::insert_student(ctx.state.db(), "S-0001", "AB12").await,
        "closed classroom must reject joins"
    );
}

#[tokio::test]
async fn answers_come_back_newest_first_with_revalidated_suggestions() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_classroom(ctx.state.db(), "AB12", "T-0001", Some("Photosynthesis")).await;
    assert!(test_support::insert_student(ctx.state.db(), "S-0001", "AB12").await);
    assert!(test_support::insert_student(ctx.state.db(), "S-0002", "AB12").await);

    test_support::insert_answer(
        ctx.state.db(),
        "S-0001",
        "AB12",
        "Photosynthesis",
        "Plants eat light",
        json!(["Define chlorophyll", "click the refresh button", "Mention CO2"]),
    )
    .await;
    // Keep submitted_at strictly increasing so the ordering assertion holds.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    test_support::insert_answer(
        ctx.state.db(),
        "S-0002",
        "AB12",
        "Photosynthesis",
        "Light to sugar",
        json!("not a list"),
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/classrooms/AB12/answers?question=Photosynthesis",
            None,
        ))
        .await
        .expect("list answers");

    let body = test_support::read_json(response).await;
    let answers = body.as_array().expect("answer list");
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["student_id"], "S-0002", "newest first");
    assert_eq!(answers[0]["suggestions"], json!([]), "malformed payload becomes empty list");

    let first = answers[1]["suggestions"].as_array().expect("suggestions");
    assert_eq!(first.len(), 2, "denied suggestion filtered out on re-read");
    assert!(first.iter().all(|item| item != "click the refresh button"));
}

#[tokio::test]
async fn export_renders_a_csv_attachment() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_classroom(ctx.state.db(), "AB12", "T-0001", Some("Photosynthesis")).await;
    assert!(test_support::insert_student(ctx.state.db(), "S-0001", "AB12").await);
    test_support::insert_answer(
        ctx.state.db(),
        "S-0001",
        "AB12",
        "Photosynthesis",
        "Plants eat light",
        json!(["Define chlorophyll"]),
    )
    .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/classrooms/AB12/export", None))
        .await
        .expect("export");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/csv"), "content type: {content_type}");

    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let text = String::from_utf8(body.to_vec()).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "student_id,question,answer,score,feedback,suggestions,submitted_at"
    );
    assert!(lines.next().unwrap().starts_with("S-0001,"));
}

#[tokio::test]
async fn export_of_empty_classroom_is_header_only_not_an_error() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_classroom(ctx.state.db(), "AB12", "T-0001", None).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/classrooms/AB12/export", None))
        .await
        .expect("export");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let text = String::from_utf8(body.to_vec()).expect("utf8");
    assert_eq!(text.lines().count(), 1);
}

#[tokio::test]
async fn question_generation_failure_is_surfaced_as_bad_gateway() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/classrooms/questions/generate",
            Some(json!({"subject": "science", "difficulty": "medium", "keywords": ["light"]})),
        ))
        .await
        .expect("generate question");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
