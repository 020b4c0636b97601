use serde::Deserialize;
use uuid::Uuid;

use super::{put, put_opt, required_text, CatalogEntity};
use crate::database::models::Breed;
use crate::database::{Fields, Table};
use crate::filter::Filter;
use crate::services::existence::Reference;
use crate::services::result::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBreed {
    pub name: String,
    pub species_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBreed {
    pub name: Option<String>,
    pub species_id: Option<Uuid>,
}

impl CatalogEntity for Breed {
    const TABLE: Table = Table::Breeds;
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];

    type Create = CreateBreed;
    type Update = UpdateBreed;

    fn insert_fields(dto: &CreateBreed) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put(&mut fields, "name", required_text("name", &dto.name)?)?;
        put(&mut fields, "species_id", dto.species_id)?;
        Ok(fields)
    }

    fn update_fields(dto: &UpdateBreed) -> Result<Fields, ServiceError> {
        let mut fields = Fields::new();
        put_opt(&mut fields, "name", dto.name.as_deref())?;
        put_opt(&mut fields, "species_id", dto.species_id)?;
        Ok(fields)
    }

    /// Breed names are unique across species.
    fn duplicate_filter(dto: &CreateBreed) -> Option<Filter> {
        Some(Filter::active().eq_ignore_case("name", &dto.name))
    }

    fn update_duplicate_filter(dto: &UpdateBreed) -> Option<Filter> {
        dto.name.as_deref().map(|name| Filter::active().eq_ignore_case("name", name))
    }

    fn create_references(dto: &CreateBreed) -> Vec<Reference> {
        vec![Reference::new(Table::Species, dto.species_id)]
    }

    fn update_references(dto: &UpdateBreed) -> Vec<Reference> {
        dto.species_id.map(|id| Reference::new(Table::Species, id)).into_iter().collect()
    }
}
