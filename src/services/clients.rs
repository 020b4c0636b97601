use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::catalog::{put, put_opt, required_text};
use super::existence::{ExistencePredicate, Reference};
use super::lifecycle::{LifecycleCoordinator, LifecycleReport, LifecycleTarget, Link};
use super::permission::{Action, PermissionResolver, Target};
use super::result::{settle, ServiceError, ServiceResult};
use crate::database::gateway::{find_all, find_by_id, find_first};
use crate::database::models::{Client, EconomicLevel, EconomicStatus, Gender, User};
use crate::database::{EntityGateway, Fields, Key, Table};
use crate::filter::{Filter, SortDirection};
use crate::types::{PageRequest, Paginated, Pagination, Principal, Role};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClient {
    pub phone: String,
    pub address: Option<String>,
    pub birth_date: NaiveDate,
    pub gender: Gender,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClient {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    /// Privileged-only.
    pub economic_status_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientSort {
    #[default]
    CreatedAt,
    BirthDate,
    Gender,
    Phone,
}

impl ClientSort {
    fn column(&self) -> &'static str {
        match self {
            ClientSort::CreatedAt => "created_at",
            ClientSort::BirthDate => "birth_date",
            ClientSort::Gender => "gender",
            ClientSort::Phone => "phone",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientQuery {
    pub page: PageRequest,
    pub gender: Option<Gender>,
    pub sort: ClientSort,
    pub direction: SortDirection,
}

/// Client joined with its owner and economic level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientView {
    #[serde(flatten)]
    pub client: Client,
    pub name: String,
    pub email: String,
    pub economic_level: Option<EconomicLevel>,
}

/// Loose international format: optional `+`, then 7 to 15 digits; spaces and dashes ignored.
fn phone(value: &str) -> Result<String, ServiceError> {
    let trimmed = required_text("phone", value)?;
    let digits = trimmed.strip_prefix('+').unwrap_or(&trimmed);
    let compact = digits.chars().filter(|c| *c != ' ' && *c != '-').collect::<String>();
    if !(7..=15).contains(&compact.len()) || !compact.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::Invalid(format!("'{}' is not a valid phone number", trimmed)));
    }
    Ok(trimmed)
}

fn birth_date(value: NaiveDate) -> Result<NaiveDate, ServiceError> {
    if value >= Utc::now().date_naive() {
        return Err(ServiceError::Invalid("birth_date must be in the past".to_string()));
    }
    Ok(value)
}

pub struct ClientService {
    gateway: Arc<dyn EntityGateway>,
}

impl ClientService {
    pub fn new(gateway: Arc<dyn EntityGateway>) -> Self {
        Self { gateway }
    }

    fn gateway(&self) -> &dyn EntityGateway {
        &*self.gateway
    }

    async fn view(&self, client: Client) -> Result<ClientView, ServiceError> {
        let user: Option<User> = find_by_id(self.gateway(), Table::Users, client.user_id, None).await?;
        let status: Option<EconomicStatus> =
            find_by_id(self.gateway(), Table::EconomicStatus, client.economic_status_id, None).await?;
        let (name, email) = user.map(|u| (u.name, u.email)).unwrap_or_default();
        Ok(ClientView { client, name, email, economic_level: status.map(|s| s.level) })
    }

    /// Client of `user_id` in any state.
    async fn client_of(&self, user_id: Uuid) -> Result<Option<Client>, ServiceError> {
        Ok(find_first(self.gateway(), Table::Clients, &Filter::new().eq("user_id", user_id)).await?)
    }

    async fn active_client_of(&self, user_id: Uuid) -> Result<Client, ServiceError> {
        find_first(self.gateway(), Table::Clients, &Filter::active().eq("user_id", user_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound("You do not have a client profile".to_string()))
    }

    pub async fn create(&self, caller: &Principal, dto: CreateClient) -> ServiceResult<ClientView> {
        settle("create", Table::Clients, None, self.try_create(caller, &dto).await)
    }

    async fn try_create(&self, caller: &Principal, dto: &CreateClient) -> Result<ServiceResult<ClientView>, ServiceError> {
        if caller.role != Role::DEFAULT {
            return Err(ServiceError::PermissionDenied("Only users can register as clients".to_string()));
        }
        if self.client_of(caller.id).await?.is_some() {
            return Err(ServiceError::Duplicate("This user already has a client".to_string()));
        }
        ExistencePredicate::new(self.gateway()).require_active(Table::Users, caller.id).await?;

        let status: EconomicStatus = find_first(
            self.gateway(),
            Table::EconomicStatus,
            &Filter::active().eq("level", EconomicLevel::DEFAULT.label()),
        )
        .await?
        .ok_or_else(|| ServiceError::NotFound("Default economic status is not configured".to_string()))?;

        let mut fields = Fields::new();
        put(&mut fields, "user_id", caller.id)?;
        put(&mut fields, "phone", phone(&dto.phone)?)?;
        put_opt(&mut fields, "address", dto.address.as_deref())?;
        put(&mut fields, "birth_date", birth_date(dto.birth_date)?)?;
        put(&mut fields, "gender", dto.gender)?;
        put(&mut fields, "economic_status_id", status.id)?;

        let id = self.gateway.insert(Table::Clients, fields).await?;
        let client: Client = find_by_id(self.gateway(), Table::Clients, id, Some(false))
            .await?
            .ok_or_else(|| ServiceError::not_found(Table::Clients))?;
        info!(client = %id, user = %caller.id, "client created");
        Ok(ServiceResult::success("Client created", self.view(client).await?))
    }

    pub async fn find_all(&self, caller: &Principal, query: ClientQuery) -> ServiceResult<Paginated<ClientView>> {
        settle("find_all", Table::Clients, None, self.try_find_all(caller, &query).await)
    }

    async fn try_find_all(&self, caller: &Principal, query: &ClientQuery) -> Result<ServiceResult<Paginated<ClientView>>, ServiceError> {
        PermissionResolver::resolve(caller, &Target::collection(), Action::Read)?;
        let mut filter = Filter::active();
        if let Some(gender) = query.gender {
            filter = filter.eq("gender", gender.as_str());
        }
        let total = self.gateway.count(Table::Clients, &filter).await?;
        let clients: Vec<Client> = find_all(
            self.gateway(),
            Table::Clients,
            &filter.order_by(query.sort.column(), query.direction).paginate(&query.page),
        )
        .await?;

        let mut data = Vec::with_capacity(clients.len());
        for client in clients {
            data.push(self.view(client).await?);
        }
        Ok(ServiceResult::success(
            format!("{} clients found", total),
            Paginated { data, pagination: Pagination::new(&query.page, total) },
        ))
    }

    pub async fn find_mine(&self, caller: &Principal) -> ServiceResult<ClientView> {
        let outcome = async {
            let client = self.active_client_of(caller.id).await?;
            Ok::<_, ServiceError>(ServiceResult::success("Client found", self.view(client).await?))
        }
        .await;
        settle("find_mine", Table::Clients, None, outcome)
    }

    pub async fn find_one(&self, caller: &Principal, id: Uuid) -> ServiceResult<ClientView> {
        let outcome = async {
            let client: Client = find_by_id(self.gateway(), Table::Clients, id, Some(false))
                .await?
                .ok_or_else(|| ServiceError::not_found(Table::Clients))?;
            PermissionResolver::resolve(caller, &Target::owned(client.user_id, client.id), Action::Read)?;
            Ok::<_, ServiceError>(ServiceResult::success("Client found", self.view(client).await?))
        }
        .await;
        settle("find_one", Table::Clients, Some(id), outcome)
    }

    /// Whether the caller already has an active client profile.
    pub async fn exists_for_user(&self, caller: &Principal) -> ServiceResult<bool> {
        let outcome = self
            .gateway
            .exists(Table::Clients, Key::foreign("user_id", caller.id), false)
            .await
            .map_err(ServiceError::from)
            .map(|exists| {
                let message = if exists { "Client profile exists" } else { "No client profile" };
                ServiceResult::success(message, exists)
            });
        settle("exists_for_user", Table::Clients, None, outcome)
    }

    pub async fn update(&self, caller: &Principal, id: Uuid, dto: UpdateClient) -> ServiceResult<ClientView> {
        settle("update", Table::Clients, Some(id), self.try_update(caller, id, &dto).await)
    }

    pub async fn update_mine(&self, caller: &Principal, dto: UpdateClient) -> ServiceResult<ClientView> {
        let outcome = async {
            let client = self.active_client_of(caller.id).await?;
            self.try_update(caller, client.id, &dto).await
        }
        .await;
        settle("update", Table::Clients, None, outcome)
    }

    async fn try_update(&self, caller: &Principal, id: Uuid, dto: &UpdateClient) -> Result<ServiceResult<ClientView>, ServiceError> {
        let client: Client = find_by_id(self.gateway(), Table::Clients, id, Some(false))
            .await?
            .ok_or_else(|| ServiceError::not_found(Table::Clients))?;

        let target = Target::owned(client.user_id, client.id);
        let mut actions = vec![Action::Update];
        if dto.economic_status_id.is_some() {
            actions.push(Action::ChangeEconomicStatus);
        }
        PermissionResolver::resolve_all(caller, &target, &actions)?;

        let mut fields = Fields::new();
        put_opt(&mut fields, "phone", dto.phone.as_deref().map(phone).transpose()?)?;
        put_opt(&mut fields, "address", dto.address.as_deref())?;
        put_opt(&mut fields, "birth_date", dto.birth_date.map(birth_date).transpose()?)?;
        put_opt(&mut fields, "gender", dto.gender)?;
        if let Some(status_id) = dto.economic_status_id {
            ExistencePredicate::new(self.gateway())
                .require_reference(&Reference::new(Table::EconomicStatus, status_id))
                .await?;
            put(&mut fields, "economic_status_id", status_id)?;
        }
        if fields.is_empty() {
            return Err(ServiceError::Invalid("At least one field must be provided".to_string()));
        }

        if self.gateway.update_fields(Table::Clients, id, fields).await? == 0 {
            return Err(ServiceError::not_found(Table::Clients));
        }
        let client: Client = find_by_id(self.gateway(), Table::Clients, id, Some(false))
            .await?
            .ok_or_else(|| ServiceError::not_found(Table::Clients))?;
        info!(client = %id, actor = %caller.id, "client updated");
        Ok(ServiceResult::success("Client updated", self.view(client).await?))
    }

    pub async fn remove(&self, caller: &Principal, id: Uuid) -> ServiceResult<LifecycleReport> {
        settle("remove", Table::Clients, Some(id), self.toggle(caller, id, true).await)
    }

    pub async fn remove_mine(&self, caller: &Principal) -> ServiceResult<LifecycleReport> {
        let outcome = async {
            let client = self.active_client_of(caller.id).await?;
            self.toggle(caller, client.id, true).await
        }
        .await;
        settle("remove", Table::Clients, None, outcome)
    }

    pub async fn restore(&self, caller: &Principal, id: Uuid) -> ServiceResult<LifecycleReport> {
        settle("restore", Table::Clients, Some(id), self.toggle(caller, id, false).await)
    }

    /// Client and owning user always change together.
    async fn toggle(&self, caller: &Principal, id: Uuid, deleted: bool) -> Result<ServiceResult<LifecycleReport>, ServiceError> {
        let client: Client = find_by_id(self.gateway(), Table::Clients, id, None)
            .await?
            .ok_or_else(|| ServiceError::not_found(Table::Clients))?;
        let target = LifecycleTarget {
            table: Table::Clients,
            record_id: client.id,
            owner_id: Some(client.user_id),
            link: Some(Link { table: Table::Users, key: Key::id(client.user_id) }),
        };
        LifecycleCoordinator::new(self.gateway()).toggle_delete(caller, &target, deleted).await
    }
}
