use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row of the `roles` table. Its description maps onto [`crate::types::Role`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: Uuid,
    pub description: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleRecord {
    pub fn role(&self) -> Option<crate::types::Role> {
        self.description.parse().ok()
    }
}
