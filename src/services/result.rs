use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::auth::password::PasswordError;
use crate::database::{DatabaseError, Table};

/// Outcome category returned by every domain operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Success,
    Error,
    Warning,
    Invalid,
    Unauthorized,
}

/// Machine-readable reason attached to non-success results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    NotFound,
    Duplicate,
    PermissionDenied,
    InvalidState,
    InvalidInput,
    Unexpected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResult<T> {
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<FailureCode>,
}

impl<T> ServiceResult<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self { kind: ResultKind::Success, message: message.into(), data: Some(data), code: None }
    }

    /// Completed, but with something the caller should know about.
    pub fn warning(message: impl Into<String>, data: T) -> Self {
        Self { kind: ResultKind::Warning, message: message.into(), data: Some(data), code: None }
    }

    pub fn failure(kind: ResultKind, code: FailureCode, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), data: None, code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.kind == ResultKind::Success
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResult<U> {
        ServiceResult { kind: self.kind, message: self.message, data: self.data.map(f), code: self.code }
    }

    /// Drops the payload so a failure can be forwarded under another payload type.
    pub fn forward<U>(self) -> ServiceResult<U> {
        ServiceResult { kind: self.kind, message: self.message, data: None, code: self.code }
    }
}

impl<T> From<ServiceError> for ServiceResult<T> {
    fn from(err: ServiceError) -> Self {
        ServiceResult::failure(err.kind(), err.code(), err.public_message())
    }
}

/// Failure taxonomy inside services. Converted to a [`ServiceResult`] at the operation boundary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Unexpected(anyhow::Error),
}

impl ServiceError {
    pub fn code(&self) -> FailureCode {
        match self {
            ServiceError::NotFound(_) => FailureCode::NotFound,
            ServiceError::Duplicate(_) => FailureCode::Duplicate,
            ServiceError::PermissionDenied(_) => FailureCode::PermissionDenied,
            ServiceError::InvalidState(_) => FailureCode::InvalidState,
            ServiceError::Invalid(_) => FailureCode::InvalidInput,
            ServiceError::Unexpected(_) => FailureCode::Unexpected,
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            ServiceError::PermissionDenied(_) => ResultKind::Unauthorized,
            ServiceError::Invalid(_) => ResultKind::Invalid,
            _ => ResultKind::Error,
        }
    }

    /// Message safe to hand to callers. Unexpected failures never leak their cause.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Unexpected(_) => "The operation could not be completed".to_string(),
            other => other.to_string(),
        }
    }

    pub fn not_found(table: Table) -> Self {
        ServiceError::NotFound(format!("{} not found", capitalize(table.label())))
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(msg) => ServiceError::Duplicate(msg),
            other => ServiceError::Unexpected(other.into()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Unexpected(err.into())
    }
}

impl From<crate::auth::JwtError> for ServiceError {
    fn from(err: crate::auth::JwtError) -> Self {
        ServiceError::Unexpected(err.into())
    }
}

/// Converts an operation's outcome into its public result, logging unexpected
/// failures with enough context to diagnose them.
pub fn settle<T>(
    operation: &'static str,
    table: Table,
    id: Option<Uuid>,
    outcome: Result<ServiceResult<T>, ServiceError>,
) -> ServiceResult<T> {
    match outcome {
        Ok(result) => result,
        Err(err) => {
            match &err {
                ServiceError::Unexpected(source) => {
                    error!(operation, entity = table.name(), id = ?id, error = %source, "operation failed unexpectedly");
                }
                other => {
                    debug!(operation, entity = table.name(), id = ?id, reason = %other, "operation rejected");
                }
            }
            err.into()
        }
    }
}

pub(crate) fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
