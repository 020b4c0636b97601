use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;
use std::ops::Deref;
use tracing::debug;

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::services::PermissionResolver;
use crate::types::{Identity, Principal, Role};

/// Roles admitted to a route.
pub trait RolePolicy: Send + Sync + 'static {
    const NAME: &'static str;
    const ROLES: &'static [Role];
}

pub struct AnyRole;
pub struct Privileged;
pub struct AdminOnly;
pub struct BaseRole;

impl RolePolicy for AnyRole {
    const NAME: &'static str = "any authenticated role";
    const ROLES: &'static [Role] = &Role::ALL;
}

impl RolePolicy for Privileged {
    const NAME: &'static str = "admin or moderator";
    const ROLES: &'static [Role] = &[Role::Admin, Role::Moderator];
}

impl RolePolicy for AdminOnly {
    const NAME: &'static str = "admin";
    const ROLES: &'static [Role] = &[Role::Admin];
}

impl RolePolicy for BaseRole {
    const NAME: &'static str = "user";
    const ROLES: &'static [Role] = &[Role::User];
}

pub struct RoleGuard;

impl RoleGuard {
    /// Confirms the token identity against the store and checks the route's roles.
    /// The stored role wins over the one in the token.
    pub async fn evaluate(state: &AppState, identity: &Identity, allowed: &[Role], policy: &str) -> Result<Principal, ApiError> {
        let principal = state
            .user_service()
            .principal(identity.user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Account is no longer active"))?;

        if principal.role != identity.role {
            debug!(user = %principal.id, token_role = %identity.role, stored_role = %principal.role, "token role is stale");
        }
        if !PermissionResolver::role_permits(principal.role, allowed) {
            return Err(ApiError::forbidden(format!(
                "Role {} may not access this resource (requires {})",
                principal.role, policy
            )));
        }
        Ok(principal)
    }
}

/// Extractor for a caller admitted by policy `P`.
pub struct Caller<P: RolePolicy> {
    principal: Principal,
    _policy: PhantomData<P>,
}

impl<P: RolePolicy> Caller<P> {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn into_principal(self) -> Principal {
        self.principal
    }
}

impl<P: RolePolicy> Deref for Caller<P> {
    type Target = Principal;

    fn deref(&self) -> &Principal {
        &self.principal
    }
}

#[async_trait]
impl<P: RolePolicy> FromRequestParts<AppState> for Caller<P> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let principal = RoleGuard::evaluate(state, &identity, P::ROLES, P::NAME).await?;
        Ok(Self { principal, _policy: PhantomData })
    }
}
