pub mod animal;
pub mod catalog;
pub mod client;
pub mod economic_status;
pub mod role;
pub mod user;

pub use animal::Animal;
pub use catalog::{Breed, Characteristic, Disease, Personality, Species};
pub use client::{Client, Gender};
pub use economic_status::{EconomicLevel, EconomicStatus};
pub use role::RoleRecord;
pub use user::User;

use serde::{Deserialize, Serialize};

/// Every persisted entity. All tables carry `id`, `deleted`, `created_at` and `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Roles,
    Clients,
    EconomicStatus,
    Species,
    Breeds,
    Diseases,
    Personalities,
    Characteristics,
    Animals,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Users,
        Table::Roles,
        Table::Clients,
        Table::EconomicStatus,
        Table::Species,
        Table::Breeds,
        Table::Diseases,
        Table::Personalities,
        Table::Characteristics,
        Table::Animals,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Roles => "roles",
            Table::Clients => "clients",
            Table::EconomicStatus => "economic_status",
            Table::Species => "species",
            Table::Breeds => "breeds",
            Table::Diseases => "diseases",
            Table::Personalities => "personalities",
            Table::Characteristics => "characteristics",
            Table::Animals => "animals",
        }
    }

    /// Human label used in result messages.
    pub fn label(&self) -> &'static str {
        match self {
            Table::Users => "user",
            Table::Roles => "role",
            Table::Clients => "client",
            Table::EconomicStatus => "economic status",
            Table::Species => "species",
            Table::Breeds => "breed",
            Table::Diseases => "disease",
            Table::Personalities => "personality",
            Table::Characteristics => "characteristic",
            Table::Animals => "animal",
        }
    }

    /// Columns backed by a unique index in the schema.
    pub fn unique_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Users => &["email"],
            Table::Roles => &["description"],
            Table::Clients => &["user_id"],
            Table::EconomicStatus => &["level"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
