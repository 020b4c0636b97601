// handlers/public/auth.rs - POST /auth/register, /auth/login, /auth/refresh

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::auth::ACCESS_TOKEN_COOKIE;
use crate::middleware::Created;
use crate::services::auth::{LoginRequest, RefreshRequest, Session};
use crate::services::users::CreateUser;
use crate::services::ServiceResult;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Successful sessions also carry the access token as an HttpOnly cookie.
fn with_session_cookie(mut response: Response, result_cookie: Option<(String, i64)>) -> Response {
    if let Some((token, max_age)) = result_cookie {
        let cookie = format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            ACCESS_TOKEN_COOKIE, token, max_age
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("could not encode session cookie: {}", e),
        }
    }
    response
}

fn cookie_of(result: &ServiceResult<Session>) -> Option<(String, i64)> {
    result
        .data
        .as_ref()
        .map(|session| (session.tokens.access_token.clone(), session.tokens.expires_in))
}

/// POST /auth/register - Create a base-role account and open a session
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CreateUser>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(dto) = body?;
    let result = state.auth_service().register(dto).await;
    let cookie = cookie_of(&result);
    Ok(with_session_cookie(Created(result).into_response(), cookie))
}

/// POST /auth/login - Exchange email and password for tokens
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    let result = state.auth_service().login(request).await;
    let cookie = cookie_of(&result);
    Ok(with_session_cookie(result.into_response(), cookie))
}

/// POST /auth/refresh - Exchange a refresh token for a new pair
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    Ok(state.auth_service().refresh(request).await.into_response())
}
