use uuid::Uuid;

use super::result::ServiceError;
use crate::types::{Principal, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Restore,
    /// Choosing a role other than the default for an account.
    AssignRole,
    ChangeEconomicStatus,
}

impl Action {
    /// Roles allowed to perform the action on any record.
    pub fn privileged_roles(&self) -> &'static [Role] {
        match self {
            Action::Create | Action::Restore | Action::AssignRole => &[Role::Admin],
            _ => &[Role::Admin, Role::Moderator],
        }
    }

    /// Whether an owner holding the base role may perform the action on their own record.
    pub fn allows_self_service(&self) -> bool {
        matches!(self, Action::Read | Action::Update | Action::Delete)
    }

    fn describe(&self) -> &'static str {
        match self {
            Action::Create => "create this record",
            Action::Read => "view this record",
            Action::Update => "update this record",
            Action::Delete => "delete this record",
            Action::Restore => "restore this record",
            Action::AssignRole => "assign roles",
            Action::ChangeEconomicStatus => "change the economic status",
        }
    }
}

/// Record an action applies to. `owner_id` is the user who owns it, when ownership applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub owner_id: Option<Uuid>,
    pub record_id: Option<Uuid>,
}

impl Target {
    pub fn owned(owner_id: Uuid, record_id: Uuid) -> Self {
        Self { owner_id: Some(owner_id), record_id: Some(record_id) }
    }

    pub fn record(record_id: Uuid) -> Self {
        Self { owner_id: None, record_id: Some(record_id) }
    }

    pub fn collection() -> Self {
        Self { owner_id: None, record_id: None }
    }
}

/// Basis on which an action was allowed. Drives audit-style messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    SelfService,
    Privileged,
}

pub struct PermissionResolver;

impl PermissionResolver {
    pub fn resolve(caller: &Principal, target: &Target, action: Action) -> Result<Access, ServiceError> {
        if action.privileged_roles().contains(&caller.role) {
            return Ok(Access::Privileged);
        }
        if caller.role == Role::DEFAULT && action.allows_self_service() && target.owner_id == Some(caller.id) {
            return Ok(Access::SelfService);
        }
        Err(ServiceError::PermissionDenied(format!(
            "Role {} is not allowed to {}",
            caller.role,
            action.describe()
        )))
    }

    /// Every action must be allowed. Reports the narrowest access granted.
    pub fn resolve_all(caller: &Principal, target: &Target, actions: &[Action]) -> Result<Access, ServiceError> {
        let mut access = Access::Privileged;
        for action in actions {
            if Self::resolve(caller, target, *action)? == Access::SelfService {
                access = Access::SelfService;
            }
        }
        Ok(access)
    }

    /// Route-level check: is `role` among the allowed roles.
    pub fn role_permits(role: Role, allowed: &[Role]) -> bool {
        allowed.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> Principal {
        Principal::new(Uuid::new_v4(), role, "Caller")
    }

    #[test]
    fn privileged_roles_act_on_any_record() {
        let target = Target::owned(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(PermissionResolver::resolve(&caller(Role::Moderator), &target, Action::Update).unwrap(), Access::Privileged);
        assert_eq!(PermissionResolver::resolve(&caller(Role::Admin), &target, Action::Restore).unwrap(), Access::Privileged);
    }

    #[test]
    fn restore_and_role_assignment_are_admin_only() {
        let target = Target::record(Uuid::new_v4());
        assert!(PermissionResolver::resolve(&caller(Role::Moderator), &target, Action::Restore).is_err());
        assert!(PermissionResolver::resolve(&caller(Role::Moderator), &target, Action::AssignRole).is_err());
    }

    #[test]
    fn owner_with_base_role_is_self_service() {
        let me = caller(Role::User);
        let mine = Target::owned(me.id, Uuid::new_v4());
        assert_eq!(PermissionResolver::resolve(&me, &mine, Action::Delete).unwrap(), Access::SelfService);

        let theirs = Target::owned(Uuid::new_v4(), Uuid::new_v4());
        assert!(PermissionResolver::resolve(&me, &theirs, Action::Delete).is_err());
    }

    #[test]
    fn owner_cannot_touch_privileged_fields() {
        let me = caller(Role::User);
        let mine = Target::owned(me.id, Uuid::new_v4());
        assert!(PermissionResolver::resolve(&me, &mine, Action::ChangeEconomicStatus).is_err());
        assert!(PermissionResolver::resolve(&me, &mine, Action::Restore).is_err());
        assert!(PermissionResolver::resolve_all(&me, &mine, &[Action::Update, Action::AssignRole]).is_err());
    }

    #[test]
    fn role_membership_check() {
        assert!(PermissionResolver::role_permits(Role::Admin, &[Role::Admin]));
        assert!(!PermissionResolver::role_permits(Role::User, &[Role::Admin, Role::Moderator]));
    }
}
