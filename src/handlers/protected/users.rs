// handlers/protected/users.rs - /api/users

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::{AppState, PageQuery};
use crate::middleware::{AdminOnly, AnyRole, Caller, Created};
use crate::services::users::{CreateUser, UpdateUser, UserQuery, UserView};
use crate::services::{LifecycleReport, ServiceResult};
use crate::types::{Paginated, Role};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/me", get(show_me))
        .route("/:id", get(show).patch(update).delete(remove))
        .route("/:id/restore", patch(restore))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub role: Option<Role>,
}

/// POST /api/users - Administrator-created account, role may be chosen
async fn create(
    State(state): State<AppState>,
    caller: Caller<AdminOnly>,
    body: Result<Json<CreateUser>, JsonRejection>,
) -> Result<Created<UserView>, ApiError> {
    let Json(dto) = body?;
    Ok(Created(state.user_service().create(Some(&caller), dto).await))
}

async fn list(
    State(state): State<AppState>,
    caller: Caller<AdminOnly>,
    Query(query): Query<UserListQuery>,
) -> ServiceResult<Paginated<UserView>> {
    let page = state.page(&PageQuery { page: query.page, page_size: query.page_size });
    state.user_service().find_all(&caller, UserQuery { page, role: query.role }).await
}

async fn show_me(State(state): State<AppState>, caller: Caller<AnyRole>) -> ServiceResult<UserView> {
    state.user_service().find_me(&caller).await
}

async fn show(
    State(state): State<AppState>,
    caller: Caller<AdminOnly>,
    Path(id): Path<Uuid>,
) -> ServiceResult<UserView> {
    state.user_service().find_one(&caller, id).await
}

async fn update(
    State(state): State<AppState>,
    caller: Caller<AnyRole>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<ServiceResult<UserView>, ApiError> {
    let Json(dto) = body?;
    Ok(state.user_service().update(&caller, id, dto).await)
}

async fn remove(
    State(state): State<AppState>,
    caller: Caller<AnyRole>,
    Path(id): Path<Uuid>,
) -> ServiceResult<LifecycleReport> {
    state.user_service().remove(&caller, id).await
}

async fn restore(
    State(state): State<AppState>,
    caller: Caller<AdminOnly>,
    Path(id): Path<Uuid>,
) -> ServiceResult<LifecycleReport> {
    state.user_service().restore(&caller, id).await
}
