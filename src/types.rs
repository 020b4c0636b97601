/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Closed set of authorization roles. Stored as rows in the `roles` table,
/// resolved to this enum whenever a caller is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

#[derive(Debug, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Moderator, Role::User];

    /// Role given to accounts that register themselves.
    pub const DEFAULT: Role = Role::User;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }

    /// Admins and moderators act on records they do not own.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Moderator => "Moderator",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Identity carried by a verified access token. Not yet checked against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// Authenticated caller as confirmed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub display_name: String,
}

impl Principal {
    pub fn new(id: Uuid, role: Role, display_name: impl Into<String>) -> Self {
        Self { id, role, display_name: display_name.into() }
    }
}

/// Requested page, 1-based. Always normalized so `page >= 1` and `page_size >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page: page.max(1), page_size: page_size.max(1) }
    }

    /// Builds a request from optional query values, applying the configured default and cap.
    pub fn from_query(page: Option<u32>, page_size: Option<u32>, default_size: u32, max_size: u32) -> Self {
        let size = page_size.unwrap_or(default_size).min(max_size.max(1));
        Self::new(page.unwrap_or(1), size)
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 15)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: i64,
}

impl Pagination {
    pub fn new(request: &PageRequest, total_count: i64) -> Self {
        let total = total_count.max(0);
        let size = request.page_size as i64;
        Self {
            current_page: request.page,
            page_size: request.page_size,
            total_pages: ((total + size - 1) / size) as u32,
            total_count: total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}
