use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::existence::ExistencePredicate;
use super::permission::{Access, Action, PermissionResolver, Target};
use super::result::{capitalize, ServiceError, ServiceResult};
use crate::database::{EntityGateway, Key, Table, Transition, TransitionOutcome};
use crate::types::Principal;

/// Row whose soft-delete flag must move together with the primary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub table: Table,
    pub key: Key,
}

#[derive(Debug, Clone, Copy)]
pub struct LifecycleTarget {
    pub table: Table,
    pub record_id: Uuid,
    pub owner_id: Option<Uuid>,
    pub link: Option<Link>,
}

impl LifecycleTarget {
    pub fn standalone(table: Table, record_id: Uuid) -> Self {
        Self { table, record_id, owner_id: None, link: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleReport {
    pub id: Uuid,
    pub entity: Table,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascaded: Option<Table>,
}

/// Soft-delete and restore for every entity, including the linked Client/User pair.
pub struct LifecycleCoordinator<'a> {
    gateway: &'a dyn EntityGateway,
}

impl<'a> LifecycleCoordinator<'a> {
    pub fn new(gateway: &'a dyn EntityGateway) -> Self {
        Self { gateway }
    }

    /// Moves `target` (and its link, if any) to `deleted`. Either every row changes or none does.
    pub async fn toggle_delete(
        &self,
        caller: &Principal,
        target: &LifecycleTarget,
        deleted: bool,
    ) -> Result<ServiceResult<LifecycleReport>, ServiceError> {
        let action = if deleted { Action::Delete } else { Action::Restore };
        let permission_target = Target { owner_id: target.owner_id, record_id: Some(target.record_id) };
        let access = PermissionResolver::resolve(caller, &permission_target, action)?;

        ExistencePredicate::new(self.gateway)
            .require_state(target.table, target.record_id, !deleted)
            .await?;

        let mut steps = vec![Transition::towards(target.table, Key::id(target.record_id), deleted)];
        if let Some(link) = target.link {
            steps.push(Transition::towards(link.table, link.key, deleted));
        }

        match self.gateway.transition(&steps).await? {
            TransitionOutcome::Applied => {}
            TransitionOutcome::Conflict { step: 0 } => {
                return Err(ServiceError::InvalidState(format!(
                    "{} changed state concurrently; nothing was changed",
                    capitalize(target.table.label())
                )));
            }
            TransitionOutcome::Conflict { step } => {
                let table = steps[step].table;
                return Err(ServiceError::InvalidState(format!(
                    "Linked {} is not {}; nothing was changed",
                    table.label(),
                    if deleted { "active" } else { "deleted" }
                )));
            }
        }

        let verb = if deleted { "deactivated" } else { "restored" };
        let message = match access {
            Access::SelfService => format!("Your {} has been {}", target.table.label(), verb),
            Access::Privileged => format!(
                "{} {} {} {} {}",
                caller.role.title(),
                caller.display_name,
                verb,
                target.table.label(),
                target.record_id
            ),
        };
        info!(
            entity = target.table.name(),
            id = %target.record_id,
            actor = %caller.id,
            deleted,
            cascaded = ?target.link.map(|l| l.table.name()),
            "lifecycle change applied"
        );

        Ok(ServiceResult::success(
            message,
            LifecycleReport {
                id: target.record_id,
                entity: target.table,
                deleted,
                cascaded: target.link.map(|l| l.table),
            },
        ))
    }
}
