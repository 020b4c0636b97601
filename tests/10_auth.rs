mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};
use shelter_api::auth::{verify_jwt, TokenKind};
use shelter_api::database::Table;
use shelter_api::services::auth::{LoginRequest, RefreshRequest};
use shelter_api::services::users::CreateUser;
use shelter_api::services::{FailureCode, ResultKind};
use shelter_api::types::Role;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new().await?;
    let (status, body) = app.request(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "success");
    Ok(())
}

#[tokio::test]
async fn register_returns_user_role_session() -> Result<()> {
    let app = TestApp::new().await?;
    let auth = app.state.auth_service();

    let session = auth
        .register(CreateUser {
            name: "Ana".into(),
            email: "Ana@Example.com".into(),
            password: "password123".into(),
            role_id: None,
        })
        .await;

    assert!(session.is_success(), "{}", session.message);
    let session = session.data.unwrap();
    assert_eq!(session.user.email, "ana@example.com");
    assert_eq!(session.user.role.as_deref(), Some("user"));

    let claims = verify_jwt(&session.tokens.access_token, TokenKind::Access, &app.state.config.security)?;
    assert_eq!(claims.sub, session.user.id);
    assert_eq!(claims.identity()?.role, Role::User);
    Ok(())
}

#[tokio::test]
async fn public_registration_cannot_pick_a_role() -> Result<()> {
    let app = TestApp::new().await?;
    let admin_role = app.role_id(Role::Admin).await?;

    let result = app
        .users()
        .create(
            None,
            CreateUser {
                name: "Mallory".into(),
                email: "mallory@example.com".into(),
                password: "password123".into(),
                role_id: Some(admin_role),
            },
        )
        .await;

    assert_eq!(result.kind, ResultKind::Unauthorized);
    assert_eq!(result.code, Some(FailureCode::PermissionDenied));
    Ok(())
}

#[tokio::test]
async fn login_with_seeded_admin() -> Result<()> {
    let app = TestApp::new().await?;
    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await?;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"]["user"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_invalid() -> Result<()> {
    let app = TestApp::new().await?;
    let result = app
        .state
        .auth_service()
        .login(LoginRequest { email: ADMIN_EMAIL.into(), password: "not-the-password".into() })
        .await;

    assert_eq!(result.kind, ResultKind::Invalid);
    assert_eq!(result.message, "Invalid email or password");
    Ok(())
}

#[tokio::test]
async fn deactivated_user_cannot_log_in_or_refresh() -> Result<()> {
    let app = TestApp::new().await?;
    let ana = app.user("Ana", "ana@example.com").await?;
    let auth = app.state.auth_service();

    let session = auth
        .login(LoginRequest { email: "ana@example.com".into(), password: "password123".into() })
        .await
        .data
        .unwrap();

    app.gateway.force_deleted(Table::Users, ana.id, true).await;

    let login = auth
        .login(LoginRequest { email: "ana@example.com".into(), password: "password123".into() })
        .await;
    assert!(!login.is_success());

    let refresh = auth
        .refresh(RefreshRequest { refresh_token: session.tokens.refresh_token })
        .await;
    assert_eq!(refresh.code, Some(FailureCode::PermissionDenied));
    Ok(())
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() -> Result<()> {
    let app = TestApp::new().await?;
    let token = app.token(&app.admin)?;

    let result = app.state.auth_service().refresh(RefreshRequest { refresh_token: token }).await;
    assert_eq!(result.code, Some(FailureCode::PermissionDenied));
    Ok(())
}

#[tokio::test]
async fn me_requires_a_token() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app.request(Method::GET, "/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["type"], "unauthorized");

    let token = app.token(&app.admin)?;
    let (status, body) = app.request(Method::GET, "/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    Ok(())
}
