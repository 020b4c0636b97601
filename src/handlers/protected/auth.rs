use axum::extract::State;

use crate::handlers::AppState;
use crate::middleware::{AnyRole, Caller};
use crate::services::users::UserView;
use crate::services::ServiceResult;

/// GET /auth/me - Current account
pub async fn me(State(state): State<AppState>, caller: Caller<AnyRole>) -> ServiceResult<UserView> {
    state.auth_service().me(&caller).await
}
