mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestApp;
use hydralearn_api::auth::oauth::{complete_login, ExternalProfile};
use hydralearn_api::database::{Role, Store};
use serde_json::Value;

fn profile(open_id: &str) -> ExternalProfile {
    ExternalProfile {
        open_id: open_id.to_string(),
        name: Some("First Login".to_string()),
        email: Some(format!("{}@school.example", open_id)),
        login_method: Some("google".to_string()),
    }
}

#[tokio::test]
async fn test_concurrent_first_logins_create_one_identity() -> Result<()> {
    let app = TestApp::new();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = app.store.clone();
        let sessions = app.sessions.clone();
        handles.push(tokio::spawn(async move {
            complete_login(store.as_ref(), &sessions, None, &profile("racer-1")).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let (user, token) = handle.await??;
        assert!(!token.is_empty());
        ids.push(user.id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(app.store.user_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_owner_login_is_forced_to_admin() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("owner-1", Role::User).await?;

    let (user, _) = complete_login(app.store.as_ref(), &app.sessions, Some("owner-1"), &profile("owner-1")).await?;
    assert_eq!(user.role, Role::Admin);

    let (other, _) = complete_login(app.store.as_ref(), &app.sessions, Some("owner-1"), &profile("guest-1")).await?;
    assert_eq!(other.role, Role::User);
    Ok(())
}

#[tokio::test]
async fn test_relogin_keeps_assigned_role() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("teacher-1", Role::Teacher).await?;

    let (user, _) = complete_login(app.store.as_ref(), &app.sessions, None, &profile("teacher-1")).await?;

    assert_eq!(user.role, Role::Teacher);
    assert_eq!(user.email.as_deref(), Some("teacher-1@school.example"));
    Ok(())
}

#[tokio::test]
async fn test_login_token_opens_a_session() -> Result<()> {
    let app = TestApp::new();
    let (user, token) = complete_login(app.store.as_ref(), &app.sessions, None, &profile("fresh-1")).await?;

    let cookie = format!("{}={}", app.sessions.cookie_name(), token);
    let res = app.query("auth.me", None, Some(&cookie)).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["id"], user.id);
    assert!(app.store.user_by_open_id("fresh-1").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_callback_requires_code_and_state() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/api/oauth/callback?code=abc").await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some("BAD_INPUT"));
    Ok(())
}

#[tokio::test]
async fn test_callback_without_provider_is_unavailable() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/api/oauth/callback?code=abc&state=aHR0cDovL2xvY2FsaG9zdA==").await?;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body["error"], Value::Bool(true));
    Ok(())
}
