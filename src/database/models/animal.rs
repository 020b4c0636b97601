use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: Uuid,
    pub name: String,
    pub species_id: Uuid,
    pub breed_id: Uuid,
    pub disease_id: Option<Uuid>,
    pub characteristics_id: Option<Uuid>,
    /// True when the animal is currently healthy.
    pub health_status: bool,
    pub entry_date: NaiveDate,
    pub adopted: bool,
    #[serde(default)]
    pub photos: Vec<String>,
    pub information: Option<String>,
    /// Available for adoption listings.
    pub status: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
