use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::catalog::{put, required_text};
use super::existence::{ExistencePredicate, Reference};
use super::lifecycle::{LifecycleCoordinator, LifecycleReport, LifecycleTarget, Link};
use super::permission::{Action, PermissionResolver, Target};
use super::result::{settle, ServiceError, ServiceResult};
use crate::auth::password::hash_password;
use crate::database::gateway::{find_all, find_by_id, find_first};
use crate::database::models::{Client, RoleRecord, User};
use crate::database::{EntityGateway, Fields, Key, Table};
use crate::filter::{Filter, SortDirection};
use crate::types::{PageRequest, Paginated, Pagination, Principal, Role};

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Honored only when an administrator creates the account.
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub page: PageRequest,
    pub role: Option<Role>,
}

/// Public shape of an account: no password hash, role resolved to its description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role_id: Uuid,
    pub role: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserView {
    fn new(user: User, role: Option<String>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role_id: user.role_id,
            role,
            deleted: user.deleted,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn email(value: &str) -> Result<String, ServiceError> {
    let normalized = required_text("email", value)?.to_lowercase();
    let valid = match normalized.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || normalized.chars().any(char::is_whitespace) {
        return Err(ServiceError::Invalid(format!("'{}' is not a valid email address", value.trim())));
    }
    Ok(normalized)
}

async fn password(value: &str) -> Result<String, ServiceError> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::Invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(hash_password(value).await?)
}

pub struct UserService {
    gateway: Arc<dyn EntityGateway>,
}

impl UserService {
    pub fn new(gateway: Arc<dyn EntityGateway>) -> Self {
        Self { gateway }
    }

    fn gateway(&self) -> &dyn EntityGateway {
        &*self.gateway
    }

    async fn role_record(&self, id: Uuid) -> Result<Option<RoleRecord>, ServiceError> {
        Ok(find_by_id(self.gateway(), Table::Roles, id, Some(false)).await?)
    }

    async fn role_named(&self, role: Role) -> Result<Option<RoleRecord>, ServiceError> {
        Ok(find_first(self.gateway(), Table::Roles, &Filter::active().eq_ignore_case("description", role.as_str())).await?)
    }

    async fn view(&self, user: User) -> Result<UserView, ServiceError> {
        let role = self.role_record(user.role_id).await?.map(|r| r.description);
        Ok(UserView::new(user, role))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, ServiceError> {
        let mut filter = Filter::new().eq_ignore_case("email", email);
        if let Some(id) = except {
            filter = filter.ne("id", id);
        }
        Ok(self.gateway.find_one(Table::Users, &filter).await?.is_some())
    }

    /// Registers an account. `requester` is `None` for public registration.
    pub async fn create(&self, requester: Option<&Principal>, dto: CreateUser) -> ServiceResult<UserView> {
        settle("create", Table::Users, None, self.try_create(requester, &dto).await)
    }

    async fn try_create(&self, requester: Option<&Principal>, dto: &CreateUser) -> Result<ServiceResult<UserView>, ServiceError> {
        let name = required_text("name", &dto.name)?;
        let email = email(&dto.email)?;
        if self.email_taken(&email, None).await? {
            return Err(ServiceError::Duplicate("Email is already in use".to_string()));
        }

        let default_role = self
            .role_named(Role::DEFAULT)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Default role is not configured".to_string()))?;
        let role_id = match dto.role_id {
            Some(requested) if requested != default_role.id => {
                match requester {
                    Some(admin) => {
                        PermissionResolver::resolve(admin, &Target::collection(), Action::AssignRole)?;
                    }
                    None => {
                        return Err(ServiceError::PermissionDenied("Only administrators may assign roles".to_string()));
                    }
                }
                ExistencePredicate::new(self.gateway())
                    .require_reference(&Reference::new(Table::Roles, requested))
                    .await?;
                requested
            }
            _ => default_role.id,
        };

        let mut fields = Fields::new();
        put(&mut fields, "name", name)?;
        put(&mut fields, "email", &email)?;
        put(&mut fields, "password", password(&dto.password).await?)?;
        put(&mut fields, "role_id", role_id)?;

        let id = self.gateway.insert(Table::Users, fields).await?;
        let user: User = find_by_id(self.gateway(), Table::Users, id, Some(false))
            .await?
            .ok_or_else(|| ServiceError::not_found(Table::Users))?;
        info!(user = %id, %email, "user registered");
        Ok(ServiceResult::success("User created", self.view(user).await?))
    }

    pub async fn find_all(&self, caller: &Principal, query: UserQuery) -> ServiceResult<Paginated<UserView>> {
        settle("find_all", Table::Users, None, self.try_find_all(caller, &query).await)
    }

    async fn try_find_all(&self, caller: &Principal, query: &UserQuery) -> Result<ServiceResult<Paginated<UserView>>, ServiceError> {
        if caller.role != Role::Admin {
            return Err(ServiceError::PermissionDenied("Only administrators may list users".to_string()));
        }
        let roles: Vec<RoleRecord> = find_all(self.gateway(), Table::Roles, &Filter::new()).await?;
        let descriptions = roles.iter().map(|r| (r.id, r.description.clone())).collect::<HashMap<_, _>>();

        let mut filter = Filter::active();
        if let Some(role) = query.role {
            match roles.iter().find(|r| r.role() == Some(role)) {
                Some(record) => filter = filter.eq("role_id", record.id),
                None => {
                    let empty = Paginated { data: vec![], pagination: Pagination::new(&query.page, 0) };
                    return Ok(ServiceResult::warning(format!("Role '{}' is not configured", role), empty));
                }
            }
        }

        let total = self.gateway.count(Table::Users, &filter).await?;
        let users: Vec<User> = find_all(
            self.gateway(),
            Table::Users,
            &filter.order_by("created_at", SortDirection::Asc).paginate(&query.page),
        )
        .await?;
        let data = users
            .into_iter()
            .map(|u| {
                let role = descriptions.get(&u.role_id).cloned();
                UserView::new(u, role)
            })
            .collect();
        Ok(ServiceResult::success(
            format!("{} users found", total),
            Paginated { data, pagination: Pagination::new(&query.page, total) },
        ))
    }

    pub async fn find_me(&self, caller: &Principal) -> ServiceResult<UserView> {
        let outcome = async {
            let user: User = find_by_id(self.gateway(), Table::Users, caller.id, Some(false))
                .await?
                .ok_or_else(|| ServiceError::not_found(Table::Users))?;
            Ok::<_, ServiceError>(ServiceResult::success("User found", self.view(user).await?))
        }
        .await;
        settle("find_me", Table::Users, Some(caller.id), outcome)
    }

    pub async fn find_one(&self, caller: &Principal, id: Uuid) -> ServiceResult<UserView> {
        let outcome = async {
            if caller.role != Role::Admin && caller.id != id {
                return Err(ServiceError::PermissionDenied("Only administrators may view other users".to_string()));
            }
            let user: User = find_by_id(self.gateway(), Table::Users, id, Some(false))
                .await?
                .ok_or_else(|| ServiceError::not_found(Table::Users))?;
            Ok(ServiceResult::success("User found", self.view(user).await?))
        }
        .await;
        settle("find_one", Table::Users, Some(id), outcome)
    }

    /// Active account by email, password hash included. Used for authentication only.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(find_first(
            self.gateway(),
            Table::Users,
            &Filter::active().eq_ignore_case("email", email.trim()),
        )
        .await?)
    }

    /// Active account with a role from the closed set, as the authorization layer sees it.
    pub async fn principal(&self, user_id: Uuid) -> Result<Option<Principal>, ServiceError> {
        let Some(user) = find_by_id::<User>(self.gateway(), Table::Users, user_id, Some(false)).await? else {
            return Ok(None);
        };
        let Some(record) = self.role_record(user.role_id).await? else {
            warn!(user = %user.id, role = %user.role_id, "user references an inactive or missing role");
            return Ok(None);
        };
        match record.role() {
            Some(role) => Ok(Some(Principal::new(user.id, role, user.name))),
            None => {
                warn!(user = %user.id, role = %record.description, "role is outside the authorization set");
                Ok(None)
            }
        }
    }

    pub async fn update(&self, caller: &Principal, id: Uuid, dto: UpdateUser) -> ServiceResult<UserView> {
        settle("update", Table::Users, Some(id), self.try_update(caller, id, &dto).await)
    }

    async fn try_update(&self, caller: &Principal, id: Uuid, dto: &UpdateUser) -> Result<ServiceResult<UserView>, ServiceError> {
        let user: User = find_by_id(self.gateway(), Table::Users, id, Some(false))
            .await?
            .ok_or_else(|| ServiceError::not_found(Table::Users))?;

        // Accounts are edited by their owner or an administrator.
        if caller.role == Role::Moderator && caller.id != user.id {
            return Err(ServiceError::PermissionDenied("Moderators may only edit their own account".to_string()));
        }
        let mut actions = vec![Action::Update];
        if dto.role_id.is_some_and(|r| r != user.role_id) {
            actions.push(Action::AssignRole);
        }
        PermissionResolver::resolve_all(caller, &Target::owned(user.id, user.id), &actions)?;

        let mut fields = Fields::new();
        if let Some(name) = dto.name.as_deref() {
            put(&mut fields, "name", required_text("name", name)?)?;
        }
        if let Some(value) = dto.email.as_deref() {
            let email = email(value)?;
            if self.email_taken(&email, Some(user.id)).await? {
                return Err(ServiceError::Duplicate("Email is already in use by another user".to_string()));
            }
            put(&mut fields, "email", email)?;
        }
        if let Some(value) = dto.password.as_deref() {
            put(&mut fields, "password", password(value).await?)?;
        }
        if let Some(role_id) = dto.role_id {
            ExistencePredicate::new(self.gateway())
                .require_reference(&Reference::new(Table::Roles, role_id))
                .await?;
            put(&mut fields, "role_id", role_id)?;
        }
        if fields.is_empty() {
            return Err(ServiceError::Invalid("At least one field must be provided".to_string()));
        }

        if self.gateway.update_fields(Table::Users, id, fields).await? == 0 {
            return Err(ServiceError::not_found(Table::Users));
        }
        let user: User = find_by_id(self.gateway(), Table::Users, id, Some(false))
            .await?
            .ok_or_else(|| ServiceError::not_found(Table::Users))?;
        info!(user = %id, actor = %caller.id, "user updated");
        Ok(ServiceResult::success("User updated", self.view(user).await?))
    }

    pub async fn remove(&self, caller: &Principal, id: Uuid) -> ServiceResult<LifecycleReport> {
        settle("remove", Table::Users, Some(id), self.toggle(caller, id, true).await)
    }

    pub async fn restore(&self, caller: &Principal, id: Uuid) -> ServiceResult<LifecycleReport> {
        settle("restore", Table::Users, Some(id), self.toggle(caller, id, false).await)
    }

    /// A user's client profile, when one exists, always follows the user.
    async fn toggle(&self, caller: &Principal, id: Uuid, deleted: bool) -> Result<ServiceResult<LifecycleReport>, ServiceError> {
        let user: User = find_by_id(self.gateway(), Table::Users, id, None)
            .await?
            .ok_or_else(|| ServiceError::not_found(Table::Users))?;
        if caller.role != Role::Admin && caller.id != user.id {
            let target_role = find_by_id::<RoleRecord>(self.gateway(), Table::Roles, user.role_id, None)
                .await?
                .and_then(|r| r.role());
            if target_role.map_or(true, |r| r.is_privileged()) {
                return Err(ServiceError::PermissionDenied(
                    "Only administrators may change the state of privileged accounts".to_string(),
                ));
            }
            if caller.role == Role::Moderator {
                return Err(ServiceError::PermissionDenied(
                    "Moderators may only deactivate their own account".to_string(),
                ));
            }
        }
        let client: Option<Client> =
            find_first(self.gateway(), Table::Clients, &Filter::new().eq("user_id", user.id)).await?;
        let target = LifecycleTarget {
            table: Table::Users,
            record_id: user.id,
            owner_id: Some(user.id),
            link: client.map(|c| Link { table: Table::Clients, key: Key::id(c.id) }),
        };
        LifecycleCoordinator::new(self.gateway()).toggle_delete(caller, &target, deleted).await
    }
}
