pub mod auth;
pub mod catalog;
pub mod clients;
pub mod existence;
pub mod lifecycle;
pub mod permission;
pub mod result;
pub mod users;

pub use auth::AuthService;
pub use catalog::{CatalogEntity, CatalogService};
pub use clients::ClientService;
pub use existence::{ExistencePredicate, Reference};
pub use lifecycle::{LifecycleCoordinator, LifecycleReport, LifecycleTarget, Link};
pub use permission::{Access, Action, PermissionResolver, Target};
pub use result::{FailureCode, ResultKind, ServiceError, ServiceResult};
pub use users::UserService;
