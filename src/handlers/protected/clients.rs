// handlers/protected/clients.rs - /api/clients
//
// `/me` routes act on the caller's own client profile. Id routes are checked
// for ownership by the service, so any role may reach them.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Gender;
use crate::error::ApiError;
use crate::filter::SortDirection;
use crate::handlers::{AppState, PageQuery};
use crate::middleware::{AdminOnly, AnyRole, BaseRole, Caller, Created, Privileged};
use crate::services::clients::{ClientQuery, ClientSort, ClientView, CreateClient, UpdateClient};
use crate::services::{LifecycleReport, ServiceResult};
use crate::types::Paginated;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/me", get(show_mine).patch(update_mine).delete(remove_mine))
        .route("/me/exists", get(exists_mine))
        .route("/:id", get(show).patch(update).delete(remove))
        .route("/:id/restore", patch(restore))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub sort: ClientSort,
    #[serde(default)]
    pub direction: SortDirection,
}

/// POST /api/clients - Register the caller as a client
async fn create(
    State(state): State<AppState>,
    caller: Caller<BaseRole>,
    body: Result<Json<CreateClient>, JsonRejection>,
) -> Result<Created<ClientView>, ApiError> {
    let Json(dto) = body?;
    Ok(Created(state.client_service().create(&caller, dto).await))
}

/// GET /api/clients - Paginated listing with optional gender filter and sort
async fn list(
    State(state): State<AppState>,
    caller: Caller<Privileged>,
    Query(query): Query<ClientListQuery>,
) -> ServiceResult<Paginated<ClientView>> {
    let page = state.page(&PageQuery { page: query.page, page_size: query.page_size });
    let query = ClientQuery { page, gender: query.gender, sort: query.sort, direction: query.direction };
    state.client_service().find_all(&caller, query).await
}

async fn show_mine(State(state): State<AppState>, caller: Caller<AnyRole>) -> ServiceResult<ClientView> {
    state.client_service().find_mine(&caller).await
}

async fn exists_mine(State(state): State<AppState>, caller: Caller<AnyRole>) -> ServiceResult<bool> {
    state.client_service().exists_for_user(&caller).await
}

async fn update_mine(
    State(state): State<AppState>,
    caller: Caller<AnyRole>,
    body: Result<Json<UpdateClient>, JsonRejection>,
) -> Result<ServiceResult<ClientView>, ApiError> {
    let Json(dto) = body?;
    Ok(state.client_service().update_mine(&caller, dto).await)
}

async fn remove_mine(State(state): State<AppState>, caller: Caller<AnyRole>) -> ServiceResult<LifecycleReport> {
    state.client_service().remove_mine(&caller).await
}

async fn show(
    State(state): State<AppState>,
    caller: Caller<Privileged>,
    Path(id): Path<Uuid>,
) -> ServiceResult<ClientView> {
    state.client_service().find_one(&caller, id).await
}

async fn update(
    State(state): State<AppState>,
    caller: Caller<AnyRole>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateClient>, JsonRejection>,
) -> Result<ServiceResult<ClientView>, ApiError> {
    let Json(dto) = body?;
    Ok(state.client_service().update(&caller, id, dto).await)
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller<AnyRole>,
    Path(id): Path<Uuid>,
) -> ServiceResult<LifecycleReport> {
    state.client_service().remove(&caller, id).await
}

async fn restore(
    State(state): State<AppState>,
    caller: Caller<AdminOnly>,
    Path(id): Path<Uuid>,
) -> ServiceResult<LifecycleReport> {
    state.client_service().restore(&caller, id).await
}
