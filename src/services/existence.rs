use uuid::Uuid;

use super::result::{capitalize, ServiceError};
use crate::database::{EntityGateway, Key, Table};

/// A foreign reference that must point at an active row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub table: Table,
    pub id: Uuid,
}

impl Reference {
    pub fn new(table: Table, id: Uuid) -> Self {
        Self { table, id }
    }
}

/// Row existence checks scoped by soft-delete state.
pub struct ExistencePredicate<'a> {
    gateway: &'a dyn EntityGateway,
}

impl<'a> ExistencePredicate<'a> {
    pub fn new(gateway: &'a dyn EntityGateway) -> Self {
        Self { gateway }
    }

    pub async fn exists(&self, table: Table, key: Key, deleted: bool) -> Result<bool, ServiceError> {
        Ok(self.gateway.exists(table, key, deleted).await?)
    }

    pub async fn require_active(&self, table: Table, id: Uuid) -> Result<(), ServiceError> {
        if self.exists(table, Key::id(id), false).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found(table))
        }
    }

    /// Requires the row to currently have `deleted == expected`. A row present in the
    /// opposite state is an invalid-state failure, an absent row is not-found.
    pub async fn require_state(&self, table: Table, id: Uuid, expected: bool) -> Result<(), ServiceError> {
        if self.exists(table, Key::id(id), expected).await? {
            return Ok(());
        }
        if self.exists(table, Key::id(id), !expected).await? {
            let state = if expected { "active" } else { "deleted" };
            return Err(ServiceError::InvalidState(format!("{} is already {}", capitalize(table.label()), state)));
        }
        Err(ServiceError::not_found(table))
    }

    /// Referenced rows must exist and be active; anything else is invalid input.
    pub async fn require_reference(&self, reference: &Reference) -> Result<(), ServiceError> {
        if self.exists(reference.table, Key::id(reference.id), false).await? {
            Ok(())
        } else {
            Err(ServiceError::Invalid(format!(
                "Referenced {} {} does not exist",
                reference.table.label(),
                reference.id
            )))
        }
    }

    pub async fn require_references(&self, references: &[Reference]) -> Result<(), ServiceError> {
        for reference in references {
            self.require_reference(reference).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryGateway;
    use serde_json::json;

    async fn species(gateway: &MemoryGateway) -> Uuid {
        gateway
            .insert(Table::Species, json!({"name": "Dog"}).as_object().cloned().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn state_requirements_distinguish_missing_from_wrong_state() {
        let gateway = MemoryGateway::new();
        let id = species(&gateway).await;
        let predicate = ExistencePredicate::new(&gateway);

        assert!(predicate.require_state(Table::Species, id, false).await.is_ok());
        assert!(matches!(
            predicate.require_state(Table::Species, id, true).await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            predicate.require_state(Table::Species, Uuid::new_v4(), false).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleted_reference_is_invalid_input() {
        let gateway = MemoryGateway::new();
        let id = species(&gateway).await;
        gateway.force_deleted(Table::Species, id, true).await;

        let predicate = ExistencePredicate::new(&gateway);
        assert!(matches!(
            predicate.require_reference(&Reference::new(Table::Species, id)).await,
            Err(ServiceError::Invalid(_))
        ));
    }
}
