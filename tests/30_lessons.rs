mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{TestApp, GENERATED_TEXT};
use hydralearn_api::database::{Role, Store};
use serde_json::json;

fn lesson_payload(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "subject": "Mathematics",
        "ageGroup": "8-10",
        "tone": "friendly",
        "content": { "format": "markdown", "body": "# Fractions" },
        "mediaLinks": ["https://example.org/pie.png"],
        "isPublished": true
    })
}

#[tokio::test]
async fn test_create_lesson_as_teacher() -> Result<()> {
    let app = TestApp::new();
    let teacher = app.seed_user("teacher-1", Role::Teacher).await?;
    let cookie = app.session_for(&teacher)?;

    let res = app.call("lesson.create", lesson_payload("Fractions"), Some(&cookie)).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["title"], "Fractions");
    assert_eq!(res.data()["createdById"], teacher.id);
    assert_eq!(res.data()["difficulty"], "beginner");
    assert_eq!(res.data()["isPublished"], true);
    Ok(())
}

#[tokio::test]
async fn test_spoofed_author_is_ignored() -> Result<()> {
    let app = TestApp::new();
    let teacher = app.seed_user("teacher-1", Role::Teacher).await?;
    let other = app.seed_user("teacher-2", Role::Teacher).await?;
    let cookie = app.session_for(&teacher)?;

    let mut payload = lesson_payload("Decimals");
    payload["createdById"] = json!(other.id);
    let res = app.call("lesson.create", payload, Some(&cookie)).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["createdById"], teacher.id);
    assert!(app.store.lessons_by_creator(other.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_create_writes_nothing() -> Result<()> {
    let app = TestApp::new();
    let teacher = app.seed_user("teacher-1", Role::Teacher).await?;
    let cookie = app.session_for(&teacher)?;

    let res = app.call("lesson.create", json!({}), Some(&cookie)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some("BAD_INPUT"));

    let res = app
        .call(
            "lesson.create",
            json!({ "title": "", "subject": "", "ageGroup": "", "tone": "formal" }),
            Some(&cookie),
        )
        .await?;
    assert_eq!(res.code(), Some("BAD_INPUT"));
    assert!(res.body["field_errors"]["title"].is_string());

    assert!(app.store.lessons_by_creator(teacher.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_list_shows_published_only() -> Result<()> {
    let app = TestApp::new();
    let teacher = app.seed_user("teacher-1", Role::Teacher).await?;
    let cookie = app.session_for(&teacher)?;

    app.call("lesson.create", lesson_payload("Published"), Some(&cookie)).await?;
    let mut draft = lesson_payload("Draft");
    draft["isPublished"] = json!(false);
    app.call("lesson.create", draft, Some(&cookie)).await?;

    let res = app.query("lesson.list", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let titles: Vec<&str> = res
        .data()
        .as_array()
        .map(|lessons| lessons.iter().filter_map(|l| l["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["Published"]);

    let mine = app.query("lesson.myLessons", None, Some(&cookie)).await?;
    assert_eq!(mine.data().as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn test_get_missing_lesson_is_not_found() -> Result<()> {
    let app = TestApp::new();

    let res = app.query("lesson.get", Some(json!({ "id": 4242 })), None).await?;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), Some("NOT_FOUND"));
    Ok(())
}

#[tokio::test]
async fn test_generate_with_ai_saves_unpublished_draft() -> Result<()> {
    let app = TestApp::new();
    let teacher = app.seed_user("teacher-1", Role::Teacher).await?;
    let cookie = app.session_for(&teacher)?;

    let res = app
        .call(
            "lesson.generateWithAI",
            json!({ "subject": "Science", "ageGroup": "10-12", "tone": "storytelling", "topic": "Photosynthesis" }),
            Some(&cookie),
        )
        .await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["title"], "Photosynthesis - Science");
    assert_eq!(res.data()["isPublished"], false);
    assert_eq!(res.data()["difficulty"], "intermediate");
    assert_eq!(res.data()["content"]["lessonContent"], GENERATED_TEXT);
    assert_eq!(app.llm.call_count(), 1);

    let prompt = app.llm.last_messages();
    assert!(prompt.iter().any(|m| m.content.contains("Photosynthesis")));
    assert!(prompt.iter().any(|m| m.content.contains("storytelling")));

    // Persisted as the caller's draft, hidden from the public list
    let drafts = app.store.lessons_by_creator(teacher.id).await?;
    assert_eq!(drafts.len(), 1);
    assert!(app.store.published_lessons().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_generation_failure_persists_nothing() -> Result<()> {
    let app = TestApp::new();
    let teacher = app.seed_user("teacher-1", Role::Teacher).await?;
    let cookie = app.session_for(&teacher)?;
    app.llm.set_failing(true);

    let res = app
        .call(
            "lesson.generateWithAI",
            json!({ "subject": "Science", "ageGroup": "10-12", "tone": "formal", "topic": "Volcanoes" }),
            Some(&cookie),
        )
        .await?;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.code(), Some("UPSTREAM_UNAVAILABLE"));
    assert!(app.store.lessons_by_creator(teacher.id).await?.is_empty());
    Ok(())
}
