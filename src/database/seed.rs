use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::gateway::{find_first, EntityGateway, Fields};
use super::manager::DatabaseError;
use super::models::{EconomicLevel, RoleRecord, Table, User};
use crate::auth::password::{hash_password, PasswordError};
use crate::filter::Filter;
use crate::types::Role;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SeedReport {
    pub roles_created: usize,
    pub levels_created: usize,
    pub admin_id: Option<Uuid>,
}

fn object(value: serde_json::Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

/// Inserts the reference rows the services depend on. Safe to run repeatedly.
pub async fn seed_defaults(gateway: &dyn EntityGateway, admin: Option<&AdminSeed>) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for role in Role::ALL {
        let filter = Filter::new().eq_ignore_case("description", role.as_str());
        if gateway.find_one(Table::Roles, &filter).await?.is_none() {
            gateway.insert(Table::Roles, object(json!({ "description": role.as_str() }))).await?;
            report.roles_created += 1;
        }
    }

    for level in EconomicLevel::ALL {
        let filter = Filter::new().eq("level", level.label());
        if gateway.find_one(Table::EconomicStatus, &filter).await?.is_none() {
            gateway.insert(Table::EconomicStatus, object(json!({ "level": level.label() }))).await?;
            report.levels_created += 1;
        }
    }

    if let Some(admin) = admin {
        let existing: Option<User> =
            find_first(gateway, Table::Users, &Filter::new().eq_ignore_case("email", &admin.email)).await?;
        report.admin_id = match existing {
            Some(user) => Some(user.id),
            None => {
                let role: Option<RoleRecord> =
                    find_first(gateway, Table::Roles, &Filter::active().eq_ignore_case("description", Role::Admin.as_str())).await?;
                let role = role.ok_or_else(|| DatabaseError::QueryError("admin role missing after seeding".to_string()))?;
                let password = hash_password(&admin.password).await?;
                let id = gateway
                    .insert(
                        Table::Users,
                        object(json!({
                            "name": admin.name,
                            "email": admin.email.trim().to_lowercase(),
                            "password": password,
                            "role_id": role.id,
                        })),
                    )
                    .await?;
                info!(email = %admin.email, "Seeded administrator account");
                Some(id)
            }
        };
    }

    info!(roles = report.roles_created, levels = report.levels_created, "Seed complete");
    Ok(report)
}
