use async_graphql::SimpleObject;
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::UserRole,
};

pub const TAKE_QUIZ: &str = "take_quiz";
pub const VIEW_OWN_RESULTS: &str = "view_own_results";
pub const VIEW_ANALYTICS: &str = "view_analytics";
pub const APPROVE_USERS: &str = "approve_users";
pub const VIEW_USERS: &str = "view_users";
pub const EDIT_SETTINGS: &str = "edit_settings";
pub const VIEW_AUDIT_LOGS: &str = "view_audit_logs";
pub const MANAGE_ROLES: &str = "manage_roles";
pub const SEND_NOTIFICATIONS: &str = "send_notifications";

const USER_PERMISSIONS: &[&str] = &[TAKE_QUIZ, VIEW_OWN_RESULTS];

const MANAGER_PERMISSIONS: &[&str] = &[
    TAKE_QUIZ,
    VIEW_OWN_RESULTS,
    VIEW_ANALYTICS,
    APPROVE_USERS,
    VIEW_USERS,
];

const ADMIN_PERMISSIONS: &[&str] = &[
    TAKE_QUIZ,
    VIEW_OWN_RESULTS,
    VIEW_ANALYTICS,
    APPROVE_USERS,
    VIEW_USERS,
    EDIT_SETTINGS,
    VIEW_AUDIT_LOGS,
    MANAGE_ROLES,
    SEND_NOTIFICATIONS,
];

pub fn permissions_for(role: UserRole) -> &'static [&'static str] {
    match role {
        UserRole::User => USER_PERMISSIONS,
        UserRole::Manager => MANAGER_PERMISSIONS,
        UserRole::Admin => ADMIN_PERMISSIONS,
    }
}

pub fn has_permission(role: UserRole, permission: &str) -> bool {
    permissions_for(role).contains(&permission)
}

pub fn require_permission(role: UserRole, permission: &str) -> AppResult<()> {
    if has_permission(role, permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role '{}' lacks the '{}' permission",
            role, permission
        )))
    }
}

/// Flag view of a role's permissions, as consumed by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_take_quiz: bool,
    pub can_view_own_results: bool,
    pub can_view_analytics: bool,
    pub can_approve_users: bool,
    pub can_view_users: bool,
    pub can_edit_settings: bool,
    pub can_view_audit_logs: bool,
    pub can_manage_roles: bool,
    pub can_send_notifications: bool,
}

impl Permissions {
    pub fn for_role(role: UserRole) -> Self {
        let has = |p: &str| has_permission(role, p);
        Permissions {
            can_take_quiz: has(TAKE_QUIZ),
            can_view_own_results: has(VIEW_OWN_RESULTS),
            can_view_analytics: has(VIEW_ANALYTICS),
            can_approve_users: has(APPROVE_USERS),
            can_view_users: has(VIEW_USERS),
            can_edit_settings: has(EDIT_SETTINGS),
            can_view_audit_logs: has(VIEW_AUDIT_LOGS),
            can_manage_roles: has(MANAGE_ROLES),
            can_send_notifications: has(SEND_NOTIFICATIONS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_can_edit_settings() {
        assert!(Permissions::for_role(UserRole::Admin).can_edit_settings);
    }

    #[test]
    fn user_cannot_edit_settings() {
        let permissions = Permissions::for_role(UserRole::User);
        assert!(!permissions.can_edit_settings);
        assert!(permissions.can_take_quiz);
    }

    #[test]
    fn manager_sits_between_user_and_admin() {
        let permissions = Permissions::for_role(UserRole::Manager);
        assert!(permissions.can_view_analytics);
        assert!(permissions.can_approve_users);
        assert!(!permissions.can_view_audit_logs);
        assert!(!permissions.can_edit_settings);
    }

    #[test]
    fn higher_roles_include_lower_role_permissions() {
        for p in permissions_for(UserRole::User) {
            assert!(has_permission(UserRole::Manager, p));
        }
        for p in permissions_for(UserRole::Manager) {
            assert!(has_permission(UserRole::Admin, p));
        }
    }

    #[test]
    fn require_permission_yields_forbidden() {
        assert!(require_permission(UserRole::Admin, EDIT_SETTINGS).is_ok());
        match require_permission(UserRole::User, EDIT_SETTINGS) {
            Err(AppError::Forbidden(msg)) => assert!(msg.contains("edit_settings")),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn flags_serialize_in_camel_case() {
        let json = serde_json::to_value(Permissions::for_role(UserRole::Admin)).unwrap();
        assert_eq!(json["canEditSettings"], true);
        assert_eq!(json["canTakeQuiz"], true);
    }
}
