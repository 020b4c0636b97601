use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{verify_jwt, TokenKind};
use crate::error::ApiError;
use crate::handlers::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// JWT authentication middleware. Verifies the access token and injects the
/// caller's [`Identity`](crate::types::Identity) into request extensions.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).map_err(ApiError::unauthorized)?;

    let claims = verify_jwt(&token, TokenKind::Access, &state.config.security)?;
    let identity = claims.identity()?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Bearer header first, then the access-token cookie.
pub fn extract_token(headers: &HeaderMap) -> Result<String, String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header format".to_string())?;

        return match auth_str.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Some(_) => Err("Empty JWT token".to_string()),
            None => Err("Authorization header must use Bearer token format".to_string()),
        };
    }

    cookie_token(headers).ok_or_else(|| "Missing Authorization header".to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
