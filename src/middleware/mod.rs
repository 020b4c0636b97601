pub mod auth;
pub mod response;
pub mod role_guard;

pub use auth::{extract_token, jwt_auth_middleware};
pub use response::{status_for, Created};
pub use role_guard::{AdminOnly, AnyRole, BaseRole, Caller, Privileged, RoleGuard, RolePolicy};
