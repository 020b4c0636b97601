// handlers/mod.rs - Two-tier handler layout
//
// Public (no token) → Protected (access token, caller re-checked by the role guard)

pub mod protected;
pub mod public;

use axum::{middleware, routing::get, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::models::{Animal, Breed, Characteristic, Disease, Personality, RoleRecord, Species};
use crate::database::EntityGateway;
use crate::middleware::{jwt_auth_middleware, AdminOnly, AnyRole, Privileged};
use crate::services::{AuthService, CatalogEntity, CatalogService, ClientService, UserService};
use crate::types::PageRequest;

/// Shared handler state. Services are built per request over the injected gateway.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn EntityGateway>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn EntityGateway>, config: AppConfig) -> Self {
        Self { gateway, config: Arc::new(config) }
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.gateway.clone())
    }

    pub fn client_service(&self) -> ClientService {
        ClientService::new(self.gateway.clone())
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.gateway.clone(), self.config.security.clone())
    }

    pub fn catalog<E: CatalogEntity>(&self) -> CatalogService<E> {
        CatalogService::new(self.gateway.clone())
    }

    pub fn page(&self, query: &PageQuery) -> PageRequest {
        PageRequest::from_query(
            query.page,
            query.page_size,
            self.config.api.default_page_size,
            self.config.api.max_page_size,
        )
    }
}

/// `?page=&page_size=` on every listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    use protected::catalog;

    let protected = Router::new()
        .route("/auth/me", get(protected::auth::me))
        .nest("/api/users", protected::users::routes())
        .nest("/api/clients", protected::clients::routes())
        .nest("/api/roles", catalog::routes::<RoleRecord, AdminOnly, AdminOnly>())
        .nest("/api/species", catalog::routes::<Species, AnyRole, Privileged>())
        .nest("/api/breeds", catalog::routes::<Breed, AnyRole, Privileged>())
        .nest("/api/diseases", catalog::routes::<Disease, AnyRole, Privileged>())
        .nest("/api/personalities", catalog::routes::<Personality, AnyRole, Privileged>())
        .nest("/api/characteristics", catalog::routes::<Characteristic, AnyRole, Privileged>())
        .nest("/api/animals", catalog::routes::<Animal, AnyRole, Privileged>())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(public::auth::routes())
        .merge(protected)
        .with_state(state)
}
