//! Generic CRUD + lifecycle service shared by the taxonomy and inventory entities.

pub mod animal;
pub mod breed;
pub mod characteristic;
pub mod disease;
pub mod personality;
pub mod role;
pub mod species;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::existence::{ExistencePredicate, Reference};
use super::lifecycle::{LifecycleCoordinator, LifecycleReport, LifecycleTarget};
use super::permission::{Action, PermissionResolver, Target};
use super::result::{capitalize, settle, ServiceError, ServiceResult};
use crate::database::gateway::{decode_row, find_by_id};
use crate::database::{EntityGateway, Fields, Table};
use crate::filter::{Filter, SortDirection};
use crate::types::{PageRequest, Paginated, Pagination, Principal, Role};

/// Describes how one entity table is created, validated and searched.
pub trait CatalogEntity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;

    /// Columns matched by the case-insensitive search.
    const SEARCH_COLUMNS: &'static [&'static str];

    /// When set, every mutation requires an administrator.
    const ADMIN_ONLY: bool = false;

    type Create: DeserializeOwned + Send + Sync + 'static;
    type Update: DeserializeOwned + Send + Sync + 'static;

    fn insert_fields(dto: &Self::Create) -> Result<Fields, ServiceError>;

    /// Only the supplied fields. An empty result is rejected by the service.
    fn update_fields(dto: &Self::Update) -> Result<Fields, ServiceError>;

    /// Active rows that would collide with a new record.
    fn duplicate_filter(_dto: &Self::Create) -> Option<Filter> {
        None
    }

    /// Active rows that would collide with the updated record (the record itself excluded by the caller).
    fn update_duplicate_filter(_dto: &Self::Update) -> Option<Filter> {
        None
    }

    fn create_references(_dto: &Self::Create) -> Vec<Reference> {
        vec![]
    }

    fn update_references(_dto: &Self::Update) -> Vec<Reference> {
        vec![]
    }

    /// Rejects updates and lifecycle changes on records that must stay as they are.
    fn guard_mutation(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

pub struct CatalogService<E> {
    gateway: Arc<dyn EntityGateway>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: CatalogEntity> CatalogService<E> {
    pub fn new(gateway: Arc<dyn EntityGateway>) -> Self {
        Self { gateway, _entity: PhantomData }
    }

    fn label() -> String {
        capitalize(E::TABLE.label())
    }

    fn authorize(caller: &Principal, target: &Target, action: Action) -> Result<(), ServiceError> {
        if E::ADMIN_ONLY && caller.role != Role::Admin {
            return Err(ServiceError::PermissionDenied(format!(
                "Only administrators may modify {} records",
                E::TABLE.label()
            )));
        }
        PermissionResolver::resolve(caller, target, action).map(|_| ())
    }

    async fn load_active(&self, id: Uuid) -> Result<E, ServiceError> {
        find_by_id::<E>(&*self.gateway, E::TABLE, id, Some(false))
            .await?
            .ok_or_else(|| ServiceError::not_found(E::TABLE))
    }

    pub async fn create(&self, caller: &Principal, dto: E::Create) -> ServiceResult<E> {
        settle("create", E::TABLE, None, self.try_create(caller, &dto).await)
    }

    async fn try_create(&self, caller: &Principal, dto: &E::Create) -> Result<ServiceResult<E>, ServiceError> {
        Self::authorize(caller, &Target::collection(), Action::Create)?;
        let fields = E::insert_fields(dto)?;

        if let Some(filter) = E::duplicate_filter(dto) {
            if self.gateway.find_one(E::TABLE, &filter).await?.is_some() {
                return Err(ServiceError::Duplicate(format!("{} already exists", Self::label())));
            }
        }
        ExistencePredicate::new(&*self.gateway)
            .require_references(&E::create_references(dto))
            .await?;

        let id = self.gateway.insert(E::TABLE, fields).await?;
        let record = self.load_active(id).await?;
        info!(entity = E::TABLE.name(), %id, actor = %caller.id, "record created");
        Ok(ServiceResult::success(format!("{} created", Self::label()), record))
    }

    /// Active records, oldest first.
    pub async fn find_all(&self, page: PageRequest) -> ServiceResult<Paginated<E>> {
        settle("find_all", E::TABLE, None, self.try_find_all(page).await)
    }

    async fn try_find_all(&self, page: PageRequest) -> Result<ServiceResult<Paginated<E>>, ServiceError> {
        let filter = Filter::active();
        let total = self.gateway.count(E::TABLE, &filter).await?;
        let rows = self
            .gateway
            .find_many(E::TABLE, &filter.order_by("created_at", SortDirection::Asc).paginate(&page))
            .await?;
        let data = rows
            .into_iter()
            .map(|row| decode_row::<E>(E::TABLE, row))
            .collect::<Result<Vec<_>, _>>()?;
        let pagination = Pagination::new(&page, total);
        Ok(ServiceResult::success(
            format!("{} {} records found", total, E::TABLE.label()),
            Paginated { data, pagination },
        ))
    }

    pub async fn find_one(&self, id: Uuid) -> ServiceResult<E> {
        let outcome = self
            .load_active(id)
            .await
            .map(|record| ServiceResult::success(format!("{} found", Self::label()), record));
        settle("find_one", E::TABLE, Some(id), outcome)
    }

    /// Case-insensitive substring search over the entity's search columns.
    pub async fn find_by_name(&self, needle: &str) -> ServiceResult<Vec<E>> {
        settle("find_by_name", E::TABLE, None, self.try_find_by_name(needle).await)
    }

    async fn try_find_by_name(&self, needle: &str) -> Result<ServiceResult<Vec<E>>, ServiceError> {
        if needle.trim().is_empty() {
            return Err(ServiceError::Invalid("Search term must not be empty".to_string()));
        }
        let filter = Filter::active()
            .contains_any(E::SEARCH_COLUMNS, needle)
            .order_by("created_at", SortDirection::Asc);
        let rows = self.gateway.find_many(E::TABLE, &filter).await?;
        if rows.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No {} matched '{}'",
                E::TABLE.label(),
                needle.trim()
            )));
        }
        let data = rows
            .into_iter()
            .map(|row| decode_row::<E>(E::TABLE, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ServiceResult::success(format!("{} {} records matched", data.len(), E::TABLE.label()), data))
    }

    pub async fn update(&self, caller: &Principal, id: Uuid, dto: E::Update) -> ServiceResult<E> {
        settle("update", E::TABLE, Some(id), self.try_update(caller, id, &dto).await)
    }

    async fn try_update(&self, caller: &Principal, id: Uuid, dto: &E::Update) -> Result<ServiceResult<E>, ServiceError> {
        Self::authorize(caller, &Target::record(id), Action::Update)?;
        let fields = E::update_fields(dto)?;
        if fields.is_empty() {
            return Err(ServiceError::Invalid("At least one field must be provided".to_string()));
        }

        self.load_active(id).await?.guard_mutation()?;
        let predicate = ExistencePredicate::new(&*self.gateway);
        if let Some(filter) = E::update_duplicate_filter(dto) {
            if self.gateway.find_one(E::TABLE, &filter.ne("id", id)).await?.is_some() {
                return Err(ServiceError::Duplicate(format!("{} already exists", Self::label())));
            }
        }
        predicate.require_references(&E::update_references(dto)).await?;

        if self.gateway.update_fields(E::TABLE, id, fields).await? == 0 {
            return Err(ServiceError::not_found(E::TABLE));
        }
        let record = self.load_active(id).await?;
        info!(entity = E::TABLE.name(), %id, actor = %caller.id, "record updated");
        Ok(ServiceResult::success(format!("{} updated", Self::label()), record))
    }

    pub async fn remove(&self, caller: &Principal, id: Uuid) -> ServiceResult<LifecycleReport> {
        settle("remove", E::TABLE, Some(id), self.toggle(caller, id, true).await)
    }

    pub async fn restore(&self, caller: &Principal, id: Uuid) -> ServiceResult<LifecycleReport> {
        settle("restore", E::TABLE, Some(id), self.toggle(caller, id, false).await)
    }

    async fn toggle(&self, caller: &Principal, id: Uuid, deleted: bool) -> Result<ServiceResult<LifecycleReport>, ServiceError> {
        if E::ADMIN_ONLY && caller.role != Role::Admin {
            return Err(ServiceError::PermissionDenied(format!(
                "Only administrators may modify {} records",
                E::TABLE.label()
            )));
        }
        if let Some(record) = find_by_id::<E>(&*self.gateway, E::TABLE, id, None).await? {
            record.guard_mutation()?;
        }
        LifecycleCoordinator::new(&*self.gateway)
            .toggle_delete(caller, &LifecycleTarget::standalone(E::TABLE, id), deleted)
            .await
    }
}

/// Trimmed, non-empty text.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Invalid(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn put<T: Serialize>(fields: &mut Fields, column: &str, value: T) -> Result<(), ServiceError> {
    let value = serde_json::to_value(value).map_err(|e| ServiceError::Invalid(format!("{}: {}", column, e)))?;
    fields.insert(column.to_string(), value);
    Ok(())
}

/// Inserts `value` when present. Text values are trimmed and must not be blank.
pub(crate) fn put_opt<T: Serialize>(fields: &mut Fields, column: &str, value: Option<T>) -> Result<(), ServiceError> {
    if let Some(value) = value {
        put(fields, column, value)?;
        if let Some(Value::String(text)) = fields.get(column) {
            let trimmed = required_text(column, text)?;
            fields.insert(column.to_string(), Value::String(trimmed));
        }
    }
    Ok(())
}
