mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use serde_json::{json, Value};

use common::TestApp;
use shelter_api::auth::password::verify_password;
use shelter_api::database::models::Gender;
use shelter_api::database::Table;
use shelter_api::services::clients::CreateClient;
use shelter_api::services::users::{CreateUser, UpdateUser, UserQuery};
use shelter_api::services::{FailureCode, ResultKind};
use shelter_api::types::Role;

#[tokio::test]
async fn emails_are_unique_ignoring_case() -> Result<()> {
    let app = TestApp::new().await?;
    app.user("Ana", "ana@example.com").await?;

    let again = app
        .users()
        .create(
            None,
            CreateUser {
                name: "Other Ana".into(),
                email: "ANA@example.com".into(),
                password: "password123".into(),
                role_id: None,
            },
        )
        .await;
    assert_eq!(again.code, Some(FailureCode::Duplicate));
    Ok(())
}

#[tokio::test]
async fn registration_validates_input() -> Result<()> {
    let app = TestApp::new().await?;
    let short = app
        .users()
        .create(
            None,
            CreateUser { name: "Ana".into(), email: "ana@example.com".into(), password: "short".into(), role_id: None },
        )
        .await;
    assert_eq!(short.kind, ResultKind::Invalid);

    let bad_email = app
        .users()
        .create(
            None,
            CreateUser { name: "Ana".into(), email: "not-an-email".into(), password: "password123".into(), role_id: None },
        )
        .await;
    assert_eq!(bad_email.kind, ResultKind::Invalid);
    Ok(())
}

#[tokio::test]
async fn admin_assigns_roles_at_creation() -> Result<()> {
    let app = TestApp::new().await?;
    let moderator = app.moderator("Mod", "mod@example.com").await?;
    assert_eq!(moderator.role, Role::Moderator);
    Ok(())
}

#[tokio::test]
async fn owner_updates_profile_but_not_role() -> Result<()> {
    let app = TestApp::new().await?;
    let ana = app.user("Ana", "ana@example.com").await?;
    let admin_role = app.role_id(Role::Admin).await?;

    let escalate = app
        .users()
        .update(&ana, ana.id, UpdateUser { role_id: Some(admin_role), ..Default::default() })
        .await;
    assert_eq!(escalate.code, Some(FailureCode::PermissionDenied));

    let renamed = app
        .users()
        .update(
            &ana,
            ana.id,
            UpdateUser { name: Some("Ana Maria".into()), password: Some("new-password".into()), ..Default::default() },
        )
        .await;
    assert!(renamed.is_success(), "{}", renamed.message);
    assert_eq!(renamed.data.unwrap().name, "Ana Maria");

    let stored = app.users().find_by_email("ana@example.com").await?.unwrap();
    assert!(verify_password("new-password", &stored.password).await?);
    Ok(())
}

#[tokio::test]
async fn moderators_cannot_edit_other_accounts() -> Result<()> {
    let app = TestApp::new().await?;
    let moderator = app.moderator("Mod", "mod@example.com").await?;
    let ana = app.user("Ana", "ana@example.com").await?;

    let result = app
        .users()
        .update(&moderator, ana.id, UpdateUser { name: Some("Changed".into()), ..Default::default() })
        .await;
    assert_eq!(result.code, Some(FailureCode::PermissionDenied));

    let by_admin = app
        .users()
        .update(&app.admin, ana.id, UpdateUser { email: Some("mod@example.com".into()), ..Default::default() })
        .await;
    assert_eq!(by_admin.code, Some(FailureCode::Duplicate));
    Ok(())
}

#[tokio::test]
async fn user_removal_cascades_to_client() -> Result<()> {
    let app = TestApp::new().await?;
    let ana = app.user("Ana", "ana@example.com").await?;
    let client = app
        .clients()
        .create(
            &ana,
            CreateClient {
                phone: "+51900000000".into(),
                address: Some("Av. Siempre Viva 742".into()),
                birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                gender: Gender::Female,
            },
        )
        .await
        .data
        .unwrap()
        .client;

    let removed = app.users().remove(&ana, ana.id).await;
    assert!(removed.is_success(), "{}", removed.message);
    assert_eq!(removed.data.as_ref().and_then(|r| r.cascaded), Some(Table::Clients));

    let client_row = app.gateway.raw(Table::Clients, client.id).await.unwrap();
    assert_eq!(client_row.get("deleted"), Some(&Value::Bool(true)));

    let restored = app.users().restore(&app.admin, ana.id).await;
    assert!(restored.is_success(), "{}", restored.message);
    let client_row = app.gateway.raw(Table::Clients, client.id).await.unwrap();
    assert_eq!(client_row.get("deleted"), Some(&Value::Bool(false)));
    Ok(())
}

#[tokio::test]
async fn removing_a_user_without_client_is_standalone() -> Result<()> {
    let app = TestApp::new().await?;
    let ana = app.user("Ana", "ana@example.com").await?;

    let removed = app.users().remove(&app.admin, ana.id).await;
    assert!(removed.is_success(), "{}", removed.message);
    assert_eq!(removed.data.unwrap().cascaded, None);
    assert!(app.users().principal(ana.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn listing_is_admin_only_and_filters_by_role() -> Result<()> {
    let app = TestApp::new().await?;
    app.user("Ana", "ana@example.com").await?;
    let moderator = app.moderator("Mod", "mod@example.com").await?;

    let all = app.users().find_all(&app.admin, UserQuery::default()).await.data.unwrap();
    assert_eq!(all.pagination.total_count, 3);

    let mods = app
        .users()
        .find_all(&app.admin, UserQuery { role: Some(Role::Moderator), ..Default::default() })
        .await
        .data
        .unwrap();
    assert_eq!(mods.pagination.total_count, 1);
    assert_eq!(mods.data[0].role.as_deref(), Some("moderator"));

    let denied = app.users().find_all(&moderator, UserQuery::default()).await;
    assert_eq!(denied.code, Some(FailureCode::PermissionDenied));
    Ok(())
}

#[tokio::test]
async fn http_user_routes() -> Result<()> {
    let app = TestApp::new().await?;
    let ana = app.user("Ana", "ana@example.com").await?;
    let token = app.token(&ana)?;
    let admin_token = app.token(&app.admin)?;

    let (status, me) = app.request(Method::GET, "/api/users/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "ana@example.com");

    let (status, _) = app.request(Method::GET, "/api/users", Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listing) = app.request(Method::GET, "/api/users?role=user", Some(&admin_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["data"]["pagination"]["total_count"], 1);

    let (status, created) = app
        .request(
            Method::POST,
            "/api/users",
            Some(&admin_token),
            Some(json!({ "name": "Bob", "email": "bob@example.com", "password": "password123" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["data"]["role"], "user");
    Ok(())
}

#[tokio::test]
async fn moderators_only_deactivate_their_own_account() -> Result<()> {
    let app = TestApp::new().await?;
    let moderator = app.moderator("Mod", "mod@example.com").await?;
    let other = app.moderator("Other", "other@example.com").await?;
    let ana = app.user("Ana", "ana@example.com").await?;

    for target in [app.admin.id, other.id, ana.id] {
        let result = app.users().remove(&moderator, target).await;
        assert_eq!(result.code, Some(FailureCode::PermissionDenied), "{}", result.message);
    }
    assert!(app.users().principal(app.admin.id).await?.is_some());
    assert!(app.users().principal(ana.id).await?.is_some());

    let own = app.users().remove(&moderator, moderator.id).await;
    assert!(own.is_success(), "{}", own.message);
    assert_eq!(own.message, format!("Moderator Mod deactivated user {}", moderator.id));
    Ok(())
}

#[tokio::test]
async fn base_user_cannot_deactivate_an_administrator() -> Result<()> {
    let app = TestApp::new().await?;
    let ana = app.user("Ana", "ana@example.com").await?;

    let result = app.users().remove(&ana, app.admin.id).await;
    assert_eq!(result.code, Some(FailureCode::PermissionDenied));
    assert!(app.users().principal(app.admin.id).await?.is_some());
    Ok(())
}
