use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::services::result::{FailureCode, ResultKind, ServiceResult};

/// HTTP status for a result. Success maps to 200; callers that create use [`Created`].
pub fn status_for<T>(result: &ServiceResult<T>) -> StatusCode {
    match (result.kind, result.code) {
        (ResultKind::Success | ResultKind::Warning, None) => StatusCode::OK,
        (_, Some(FailureCode::NotFound)) => StatusCode::NOT_FOUND,
        (_, Some(FailureCode::Duplicate | FailureCode::InvalidState)) => StatusCode::CONFLICT,
        (_, Some(FailureCode::PermissionDenied)) => StatusCode::FORBIDDEN,
        (_, Some(FailureCode::InvalidInput)) => StatusCode::UNPROCESSABLE_ENTITY,
        (_, Some(FailureCode::Unexpected)) => StatusCode::INTERNAL_SERVER_ERROR,
        (ResultKind::Invalid, None) => StatusCode::UNPROCESSABLE_ENTITY,
        (ResultKind::Unauthorized, None) => StatusCode::FORBIDDEN,
        (ResultKind::Error, None) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn render<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> Response {
    match serde_json::to_value(&result) {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize response data: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "type": "error",
                    "message": "Failed to serialize response data",
                    "code": "unexpected"
                })),
            )
                .into_response()
        }
    }
}

impl<T: Serialize> IntoResponse for ServiceResult<T> {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        render(status, self)
    }
}

/// A create result: 201 on success, the usual mapping otherwise.
pub struct Created<T>(pub ServiceResult<T>);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let status = match status_for(&self.0) {
            StatusCode::OK => StatusCode::CREATED,
            other => other,
        };
        render(status, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::result::ServiceError;

    #[test]
    fn failures_map_to_transport_codes() {
        let cases: Vec<(ServiceError, StatusCode)> = vec![
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Duplicate("x".into()), StatusCode::CONFLICT),
            (ServiceError::InvalidState("x".into()), StatusCode::CONFLICT),
            (ServiceError::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::Invalid("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Unexpected(anyhow::anyhow!("x")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let result: ServiceResult<()> = err.into();
            assert_eq!(status_for(&result), status);
        }
    }

    #[test]
    fn created_only_upgrades_success() {
        let ok = Created(ServiceResult::success("Species created", 1)).into_response();
        assert_eq!(ok.status(), StatusCode::CREATED);

        let dup: ServiceResult<i32> = ServiceError::Duplicate("Species already exists".into()).into();
        assert_eq!(Created(dup).into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn warnings_are_delivered_as_ok() {
        let warned = ServiceResult::warning("Role 'moderator' is not configured", Vec::<i32>::new());
        assert_eq!(status_for(&warned), StatusCode::OK);
        assert_eq!(warned.kind, ResultKind::Warning);
    }
}
