use clap::Args;
use serde_json::json;

use crate::cli::utils::{connect, output_error, output_success};
use crate::cli::OutputFormat;
use crate::database::seed::{seed_defaults, AdminSeed};
use crate::database::{DatabaseManager, PgGateway};

#[derive(Debug, Args)]
pub struct SeedArgs {
    #[arg(long, env = "SEED_ADMIN_EMAIL", help = "Email of the default administrator")]
    pub admin_email: Option<String>,

    #[arg(long, env = "SEED_ADMIN_PASSWORD", hide_env_values = true, help = "Password of the default administrator")]
    pub admin_password: Option<String>,

    #[arg(long, env = "SEED_ADMIN_NAME", default_value = "Administrator")]
    pub admin_name: String,
}

impl SeedArgs {
    fn admin(&self) -> Option<AdminSeed> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: self.admin_name.clone(),
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    DatabaseManager::migrate(&pool).await?;
    DatabaseManager::close(pool).await;
    output_success(output_format, "Migrations applied", None)
}

pub async fn seed(args: SeedArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let admin = args.admin();
    if admin.is_none() && (args.admin_email.is_some() || args.admin_password.is_some()) {
        return output_error(
            output_format,
            "Both SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD are required to seed an administrator",
            Some("invalid_input"),
        );
    }

    let pool = connect().await?;
    let gateway = PgGateway::new(pool.clone());
    let report = seed_defaults(&gateway, admin.as_ref()).await?;
    DatabaseManager::close(pool).await;

    output_success(
        output_format,
        "Seed complete",
        Some(json!({
            "roles_created": report.roles_created,
            "levels_created": report.levels_created,
            "admin_id": report.admin_id,
        })),
    )
}

pub async fn clear(yes: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    if !yes {
        return output_error(output_format, "Refusing to clear without --yes", Some("invalid_input"));
    }
    let pool = connect().await?;
    DatabaseManager::clear(&pool).await?;
    DatabaseManager::close(pool).await;
    output_success(output_format, "All entity tables cleared", None)
}
