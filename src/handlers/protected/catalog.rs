// handlers/protected/catalog.rs - CRUD routes shared by every catalog entity
//
//   GET    /              list (paginated)
//   POST   /              create
//   GET    /search?name=  case-insensitive search
//   GET    /:id           show
//   PATCH  /:id           partial update
//   DELETE /:id           soft delete
//   PATCH  /:id/restore   restore

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::{AppState, PageQuery};
use crate::middleware::{AdminOnly, Caller, Created, RolePolicy};
use crate::services::{CatalogEntity, LifecycleReport, ServiceResult};
use crate::types::Paginated;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

/// `R` guards reads, `W` guards updates and deletes. Create and restore are admin-only.
pub fn routes<E, R, W>() -> Router<AppState>
where
    E: CatalogEntity,
    R: RolePolicy,
    W: RolePolicy,
{
    Router::new()
        .route("/", get(list::<E, R>).post(create::<E>))
        .route("/search", get(search::<E, R>))
        .route("/:id", get(show::<E, R>).patch(update::<E, W>).delete(remove::<E, W>))
        .route("/:id/restore", patch(restore::<E>))
}

async fn list<E: CatalogEntity, R: RolePolicy>(
    State(state): State<AppState>,
    _caller: Caller<R>,
    Query(query): Query<PageQuery>,
) -> ServiceResult<Paginated<E>> {
    state.catalog::<E>().find_all(state.page(&query)).await
}

async fn create<E: CatalogEntity>(
    State(state): State<AppState>,
    caller: Caller<AdminOnly>,
    body: Result<Json<E::Create>, JsonRejection>,
) -> Result<Created<E>, ApiError> {
    let Json(dto) = body?;
    Ok(Created(state.catalog::<E>().create(&caller, dto).await))
}

async fn search<E: CatalogEntity, R: RolePolicy>(
    State(state): State<AppState>,
    _caller: Caller<R>,
    Query(query): Query<SearchQuery>,
) -> ServiceResult<Vec<E>> {
    state.catalog::<E>().find_by_name(&query.name).await
}

async fn show<E: CatalogEntity, R: RolePolicy>(
    State(state): State<AppState>,
    _caller: Caller<R>,
    Path(id): Path<Uuid>,
) -> ServiceResult<E> {
    state.catalog::<E>().find_one(id).await
}

async fn update<E: CatalogEntity, W: RolePolicy>(
    State(state): State<AppState>,
    caller: Caller<W>,
    Path(id): Path<Uuid>,
    body: Result<Json<E::Update>, JsonRejection>,
) -> Result<ServiceResult<E>, ApiError> {
    let Json(dto) = body?;
    Ok(state.catalog::<E>().update(&caller, id, dto).await)
}

async fn remove<E: CatalogEntity, W: RolePolicy>(
    State(state): State<AppState>,
    caller: Caller<W>,
    Path(id): Path<Uuid>,
) -> ServiceResult<LifecycleReport> {
    state.catalog::<E>().remove(&caller, id).await
}

async fn restore<E: CatalogEntity>(
    State(state): State<AppState>,
    caller: Caller<AdminOnly>,
    Path(id): Path<Uuid>,
) -> ServiceResult<LifecycleReport> {
    state.catalog::<E>().restore(&caller, id).await
}
