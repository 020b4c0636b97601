use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomicLevel {
    #[serde(rename = "Ninguno")]
    None,
    #[serde(rename = "Bajo")]
    Low,
    #[serde(rename = "Medio Bajo")]
    LowerMiddle,
    #[serde(rename = "Medio")]
    Middle,
    #[serde(rename = "Medio Alto")]
    UpperMiddle,
    #[serde(rename = "Alto")]
    High,
}

impl EconomicLevel {
    pub const ALL: [EconomicLevel; 6] = [
        EconomicLevel::None,
        EconomicLevel::Low,
        EconomicLevel::LowerMiddle,
        EconomicLevel::Middle,
        EconomicLevel::UpperMiddle,
        EconomicLevel::High,
    ];

    /// Level assigned to every newly created client.
    pub const DEFAULT: EconomicLevel = EconomicLevel::None;

    pub fn label(&self) -> &'static str {
        match self {
            EconomicLevel::None => "Ninguno",
            EconomicLevel::Low => "Bajo",
            EconomicLevel::LowerMiddle => "Medio Bajo",
            EconomicLevel::Middle => "Medio",
            EconomicLevel::UpperMiddle => "Medio Alto",
            EconomicLevel::High => "Alto",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicStatus {
    pub id: Uuid,
    pub level: EconomicLevel,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
