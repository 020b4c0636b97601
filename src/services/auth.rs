use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::result::{settle, ServiceError, ServiceResult};
use super::users::{CreateUser, UserService, UserView};
use crate::auth::password::verify_password;
use crate::auth::{issue_pair, verify_jwt, TokenKind, TokenPair};
use crate::config::SecurityConfig;
use crate::database::{EntityGateway, Table};
use crate::types::Principal;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Registration, credential exchange and token refresh.
pub struct AuthService {
    users: UserService,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn EntityGateway>, security: SecurityConfig) -> Self {
        Self { users: UserService::new(gateway), security }
    }

    /// Public sign-up. Always produces a base-role account.
    pub async fn register(&self, dto: CreateUser) -> ServiceResult<Session> {
        let password = dto.password.clone();
        let dto = CreateUser { role_id: None, ..dto };
        let created = self.users.create(None, dto).await;
        if created.data.is_none() {
            return created.forward();
        }
        let email = created.data.map(|user| user.email).unwrap_or_default();
        let login = LoginRequest { email, password };
        let mut session = self.login(login).await;
        if session.is_success() {
            session.message = "Registration successful".to_string();
        }
        session
    }

    pub async fn login(&self, request: LoginRequest) -> ServiceResult<Session> {
        settle("login", Table::Users, None, self.try_login(&request).await)
    }

    async fn try_login(&self, request: &LoginRequest) -> Result<ServiceResult<Session>, ServiceError> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            return Err(ServiceError::Invalid(INVALID_CREDENTIALS.to_string()));
        };
        if !verify_password(&request.password, &user.password).await? {
            warn!(user = %user.id, "rejected login with wrong password");
            return Err(ServiceError::Invalid(INVALID_CREDENTIALS.to_string()));
        }
        let principal = self
            .users
            .principal(user.id)
            .await?
            .ok_or_else(|| ServiceError::PermissionDenied("Account has no usable role".to_string()))?;

        let tokens = issue_pair(&principal, &self.security)?;
        let view = self.users.find_me(&principal).await;
        let Some(user) = view.data else {
            return Err(ServiceError::not_found(Table::Users));
        };
        info!(user = %principal.id, role = %principal.role, "login succeeded");
        Ok(ServiceResult::success("Login successful", Session { user, tokens }))
    }

    /// Exchanges a refresh token for a fresh pair. The account is re-read, so a
    /// deactivated user or changed role takes effect here.
    pub async fn refresh(&self, request: RefreshRequest) -> ServiceResult<TokenPair> {
        settle("refresh", Table::Users, None, self.try_refresh(&request).await)
    }

    async fn try_refresh(&self, request: &RefreshRequest) -> Result<ServiceResult<TokenPair>, ServiceError> {
        let claims = verify_jwt(&request.refresh_token, TokenKind::Refresh, &self.security)
            .map_err(|e| ServiceError::PermissionDenied(e.to_string()))?;
        let principal = self
            .users
            .principal(claims.sub)
            .await?
            .ok_or_else(|| ServiceError::PermissionDenied("Account is no longer active".to_string()))?;
        let tokens = issue_pair(&principal, &self.security)?;
        Ok(ServiceResult::success("Token refreshed", tokens))
    }

    pub async fn me(&self, caller: &Principal) -> ServiceResult<UserView> {
        self.users.find_me(caller).await
    }
}
