use serde::Deserialize;
use uuid::Uuid;

use super::{put, put_opt, required_text, CatalogEntity};
use crate::database::models::Characteristic;
use crate::database::{Fields, Table};
use crate::filter::Filter;
use crate::services::existence::Reference;
use crate::services::result::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCharacteristic {
    pub color: String,
    pub size: String,
    pub weight: f64,
    pub fur: String,
    pub sex: String,
    pub age: i32,
    #[serde(default)]
    pub sterilized: bool,
    pub personality_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCharacteristic {
    pub color: Option<String>,
    pub size: Option<String>,
    pub weight: Option<f64>,
    pub fur: Option<String>,
    pub sex: Option<String>,
    pub age: Option<i32>,
    pub sterilized: Option<bool>,
    pub personality_id: Option<Uuid>,
}

fn weight(value: f64) -> Result<f64, ServiceError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ServiceError::Invalid("weight must be a positive number".to_string()))
    }
}

fn age(value: i32) -> Result<i32, ServiceError> {
    if value >= 0 {
        Ok(value)
    } else {
        Err(ServiceError::Invalid("age must not be negative".to_string()))
    }
}

impl CatalogEntity for Characteristic {
    const TABLE: Table = Table::Characteristics;
    const SEARCH_COLUMNS: &'static [&'static str] = &["color", "size", "fur", "sex", "age", "weight"];

    type Create = CreateCharacteristic;
    type Update = UpdateCharacteristic;

    fn insert_fields(dto: &CreateCharacteristic) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put(&mut fields, "color", required_text("color", &dto.color)?)?;
        put(&mut fields, "size", required_text("size", &dto.size)?)?;
        put(&mut fields, "weight", weight(dto.weight)?)?;
        put(&mut fields, "fur", required_text("fur", &dto.fur)?)?;
        put(&mut fields, "sex", required_text("sex", &dto.sex)?)?;
        put(&mut fields, "age", age(dto.age)?)?;
        put(&mut fields, "sterilized", dto.sterilized)?;
        put(&mut fields, "personality_id", dto.personality_id)?;
        Ok(fields)
    }

    fn update_fields(dto: &UpdateCharacteristic) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put_opt(&mut fields, "color", dto.color.as_deref())?;
        put_opt(&mut fields, "size", dto.size.as_deref())?;
        put_opt(&mut fields, "weight", dto.weight.map(weight).transpose()?)?;
        put_opt(&mut fields, "fur", dto.fur.as_deref())?;
        put_opt(&mut fields, "sex", dto.sex.as_deref())?;
        put_opt(&mut fields, "age", dto.age.map(age).transpose()?)?;
        put_opt(&mut fields, "sterilized", dto.sterilized)?;
        put_opt(&mut fields, "personality_id", dto.personality_id)?;
        Ok(fields)
    }

    /// Same color and fur (any case) and same sex among active rows.
    fn duplicate_filter(dto: &CreateCharacteristic) -> Option<Filter> {
        Some(
            Filter::active()
                .eq_ignore_case("color", &dto.color)
                .eq_ignore_case("fur", &dto.fur)
                .eq_ignore_case("sex", &dto.sex),
        )
    }

    fn create_references(dto: &CreateCharacteristic) -> Vec<Reference> {
        dto.personality_id.map(|id| Reference::new(Table::Personalities, id)).into_iter().collect()
    }

    fn update_references(dto: &UpdateCharacteristic) -> Vec<Reference> {
        dto.personality_id.map(|id| Reference::new(Table::Personalities, id)).into_iter().collect()
    }
}
