use serde_json::json;
use std::sync::Arc;

use crate::auth::{generate_jwt, Claims, TokenKind};
use crate::cli::utils::{connect, output_error, output_success};
use crate::cli::OutputFormat;
use crate::config;
use crate::database::PgGateway;
use crate::services::UserService;

/// Prints an access token for the active account registered under `email`.
pub async fn mint(email: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    let users = UserService::new(Arc::new(PgGateway::new(pool)));

    let Some(user) = users.find_by_email(email).await? else {
        return output_error(output_format, &format!("No active user with email {}", email), Some("not_found"));
    };
    let Some(principal) = users.principal(user.id).await? else {
        return output_error(output_format, "User has no usable role", Some("permission_denied"));
    };

    let security = &config::config().security;
    let token = generate_jwt(&Claims::new(&principal, TokenKind::Access, security), security)?;
    output_success(
        output_format,
        &format!("Access token for {}", user.email),
        Some(json!({
            "user_id": principal.id,
            "role": principal.role,
            "expires_in": security.jwt_expiry_minutes * 60,
            "access_token": token,
        })),
    )
}
