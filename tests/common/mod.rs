#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use shelter_api::auth::issue_pair;
use shelter_api::config::AppConfig;
use shelter_api::database::models::RoleRecord;
use shelter_api::database::seed::{seed_defaults, AdminSeed};
use shelter_api::database::{EntityGateway, MemoryGateway, Table};
use shelter_api::filter::Filter;
use shelter_api::services::users::CreateUser;
use shelter_api::services::{ClientService, UserService};
use shelter_api::types::{Principal, Role};
use shelter_api::{router, AppState};

pub const ADMIN_EMAIL: &str = "admin@shelter.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const TEST_SECRET: &str = "integration-test-secret";

/// Seeded in-memory store plus the app state built over it.
pub struct TestApp {
    pub gateway: Arc<MemoryGateway>,
    pub state: AppState,
    pub admin: Principal,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.api.default_page_size = 15;
    config.api.max_page_size = 100;
    config
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let gateway = Arc::new(MemoryGateway::new());
        let admin_seed = AdminSeed {
            name: "Root".to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        };
        let report = seed_defaults(&*gateway, Some(&admin_seed)).await?;
        let admin_id = report.admin_id.context("admin was not seeded")?;

        let dyn_gateway: Arc<dyn EntityGateway> = gateway.clone();
        let state = AppState::new(dyn_gateway, test_config());
        let admin = state
            .user_service()
            .principal(admin_id)
            .await?
            .context("seeded admin has no principal")?;

        Ok(Self { gateway, state, admin })
    }

    pub fn users(&self) -> UserService {
        self.state.user_service()
    }

    pub fn clients(&self) -> ClientService {
        self.state.client_service()
    }

    pub async fn role_id(&self, role: Role) -> Result<Uuid> {
        let row = self
            .gateway
            .find_one(Table::Roles, &Filter::new().eq("description", role.as_str()))
            .await?
            .context("role not seeded")?;
        let record: RoleRecord = serde_json::from_value(Value::Object(row))?;
        Ok(record.id)
    }

    /// Registers a base-role account through the public path.
    pub async fn user(&self, name: &str, email: &str) -> Result<Principal> {
        let dto = CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            role_id: None,
        };
        let created = self.users().create(None, dto).await;
        let view = created.data.with_context(|| format!("user creation failed: {}", created.message))?;
        self.principal(view.id).await
    }

    pub async fn moderator(&self, name: &str, email: &str) -> Result<Principal> {
        let dto = CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            role_id: Some(self.role_id(Role::Moderator).await?),
        };
        let created = self.users().create(Some(&self.admin), dto).await;
        let view = created.data.with_context(|| format!("moderator creation failed: {}", created.message))?;
        self.principal(view.id).await
    }

    pub async fn principal(&self, id: Uuid) -> Result<Principal> {
        self.users().principal(id).await?.context("no active principal")
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub fn token(&self, principal: &Principal) -> Result<String> {
        Ok(issue_pair(principal, &self.state.config.security)?.access_token)
    }

    /// Sends one request through the router and returns status plus parsed JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, json))
    }
}
