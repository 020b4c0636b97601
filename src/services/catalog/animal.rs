use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{put, put_opt, required_text, CatalogEntity};
use crate::database::models::Animal;
use crate::database::{Fields, Table};
use crate::services::existence::Reference;
use crate::services::result::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnimal {
    pub name: String,
    pub species_id: Uuid,
    pub breed_id: Uuid,
    pub disease_id: Option<Uuid>,
    pub characteristics_id: Option<Uuid>,
    pub health_status: bool,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub adopted: bool,
    #[serde(default)]
    pub photos: Vec<String>,
    pub information: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAnimal {
    pub name: Option<String>,
    pub species_id: Option<Uuid>,
    pub breed_id: Option<Uuid>,
    pub disease_id: Option<Uuid>,
    pub characteristics_id: Option<Uuid>,
    pub health_status: Option<bool>,
    pub entry_date: Option<NaiveDate>,
    pub adopted: Option<bool>,
    pub photos: Option<Vec<String>>,
    pub information: Option<String>,
    pub status: Option<bool>,
}

fn photos(values: &[String]) -> Result<Vec<String>, ServiceError> {
    values.iter().map(|p| required_text("photo", p)).collect()
}

impl CatalogEntity for Animal {
    const TABLE: Table = Table::Animals;
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];

    type Create = CreateAnimal;
    type Update = UpdateAnimal;

    fn insert_fields(dto: &CreateAnimal) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put(&mut fields, "name", required_text("name", &dto.name)?)?;
        put(&mut fields, "species_id", dto.species_id)?;
        put(&mut fields, "breed_id", dto.breed_id)?;
        put(&mut fields, "disease_id", dto.disease_id)?;
        put(&mut fields, "characteristics_id", dto.characteristics_id)?;
        put(&mut fields, "health_status", dto.health_status)?;
        put(&mut fields, "entry_date", dto.entry_date)?;
        put(&mut fields, "adopted", dto.adopted)?;
        put(&mut fields, "photos", photos(&dto.photos)?)?;
        put(&mut fields, "information", dto.information.as_deref().map(str::trim))?;
        put(&mut fields, "status", dto.status.unwrap_or(true))?;
        Ok(fields)
    }

    fn update_fields(dto: &UpdateAnimal) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put_opt(&mut fields, "name", dto.name.as_deref())?;
        put_opt(&mut fields, "species_id", dto.species_id)?;
        put_opt(&mut fields, "breed_id", dto.breed_id)?;
        put_opt(&mut fields, "disease_id", dto.disease_id)?;
        put_opt(&mut fields, "characteristics_id", dto.characteristics_id)?;
        put_opt(&mut fields, "health_status", dto.health_status)?;
        put_opt(&mut fields, "entry_date", dto.entry_date)?;
        put_opt(&mut fields, "adopted", dto.adopted)?;
        put_opt(&mut fields, "photos", dto.photos.as_deref().map(photos).transpose()?)?;
        put_opt(&mut fields, "information", dto.information.as_deref())?;
        put_opt(&mut fields, "status", dto.status)?;
        Ok(fields)
    }

    fn create_references(dto: &CreateAnimal) -> Vec<Reference> {
        let mut refs = vec![
            Reference::new(Table::Species, dto.species_id),
            Reference::new(Table::Breeds, dto.breed_id),
        ];
        refs.extend(dto.disease_id.map(|id| Reference::new(Table::Diseases, id)));
        refs.extend(dto.characteristics_id.map(|id| Reference::new(Table::Characteristics, id)));
        refs
    }

    fn update_references(dto: &UpdateAnimal) -> Vec<Reference> {
        [
            dto.species_id.map(|id| Reference::new(Table::Species, id)),
            dto.breed_id.map(|id| Reference::new(Table::Breeds, id)),
            dto.disease_id.map(|id| Reference::new(Table::Diseases, id)),
            dto.characteristics_id.map(|id| Reference::new(Table::Characteristics, id)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
