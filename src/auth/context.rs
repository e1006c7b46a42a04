//! Permissions, roles and the context that answers checks

use crate::error::{DjobeaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Capability checked before rendering or acting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDashboard,
    ViewAnalytics,
    ViewRequests,
    ManageRequests,
    AssignRequests,
    ViewProviders,
    ManageProviders,
    ViewFinances,
    ExportData,
    ManageSettings,
    ManageUsers,
}

impl Permission {
    pub const ALL: [Permission; 11] = [
        Permission::ViewDashboard,
        Permission::ViewAnalytics,
        Permission::ViewRequests,
        Permission::ManageRequests,
        Permission::AssignRequests,
        Permission::ViewProviders,
        Permission::ManageProviders,
        Permission::ViewFinances,
        Permission::ExportData,
        Permission::ManageSettings,
        Permission::ManageUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewDashboard => "view_dashboard",
            Self::ViewAnalytics => "view_analytics",
            Self::ViewRequests => "view_requests",
            Self::ManageRequests => "manage_requests",
            Self::AssignRequests => "assign_requests",
            Self::ViewProviders => "view_providers",
            Self::ManageProviders => "manage_providers",
            Self::ViewFinances => "view_finances",
            Self::ExportData => "export_data",
            Self::ManageSettings => "manage_settings",
            Self::ManageUsers => "manage_users",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = DjobeaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| DjobeaError::UnknownPermission(s.to_string()))
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Operator,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Operator, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Operator => "operator",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DjobeaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| DjobeaError::UnknownRole(s.to_string()))
    }
}

/// Answers capability and role checks for the current user
pub trait PermissionContext {
    fn has_permission(&self, permission: Permission) -> bool;
    fn has_role(&self, role: Role) -> bool;
}

/// Default permission grants per role
#[derive(Debug, Clone)]
pub struct RolePermissions {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl RolePermissions {
    /// Grants for `role`
    pub fn grants(&self, role: Role) -> impl Iterator<Item = Permission> + '_ {
        self.grants.get(&role).into_iter().flatten().copied()
    }

    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|set| set.contains(&permission))
    }

    /// Replace the grants for one role
    pub fn set(&mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) {
        self.grants.insert(role, permissions.into_iter().collect());
    }
}

impl Default for RolePermissions {
    fn default() -> Self {
        use Permission::*;

        let viewer = [ViewDashboard, ViewAnalytics, ViewRequests, ViewProviders];
        let operator = [
            ViewDashboard,
            ViewAnalytics,
            ViewRequests,
            ManageRequests,
            AssignRequests,
            ViewProviders,
        ];
        let manager = [
            ViewDashboard,
            ViewAnalytics,
            ViewRequests,
            ManageRequests,
            AssignRequests,
            ViewProviders,
            ManageProviders,
            ViewFinances,
            ExportData,
        ];

        let mut grants = HashMap::new();
        grants.insert(Role::Admin, Permission::ALL.into_iter().collect());
        grants.insert(Role::Manager, manager.into_iter().collect());
        grants.insert(Role::Operator, operator.into_iter().collect());
        grants.insert(Role::Viewer, viewer.into_iter().collect());
        Self { grants }
    }
}

/// Signed-in user as seen by the guard
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user: String,
    pub role: Role,
    /// Grants beyond the role's defaults
    pub extra: HashSet<Permission>,
    matrix: RolePermissions,
}

impl UserSession {
    pub fn new(user: impl Into<String>, role: Role) -> Self {
        Self {
            user: user.into(),
            role,
            extra: HashSet::new(),
            matrix: RolePermissions::default(),
        }
    }

    pub fn with_matrix(mut self, matrix: RolePermissions) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn grant(mut self, permission: Permission) -> Self {
        self.extra.insert(permission);
        self
    }

    /// Every permission the session holds, sorted
    pub fn effective_permissions(&self) -> Vec<Permission> {
        let mut all: Vec<_> = self
            .matrix
            .grants(self.role)
            .chain(self.extra.iter().copied())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        all.sort();
        all
    }
}

impl PermissionContext for UserSession {
    fn has_permission(&self, permission: Permission) -> bool {
        self.extra.contains(&permission) || self.matrix.allows(self.role, permission)
    }

    fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("manage-providers".parse::<Permission>().unwrap(), Permission::ManageProviders);
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
        assert!("fly".parse::<Permission>().is_err());
    }

    #[test]
    fn test_round_trip_names() {
        for p in Permission::ALL {
            assert_eq!(p.to_string().parse::<Permission>().unwrap(), p);
        }
        for r in Role::ALL {
            assert_eq!(r.to_string().parse::<Role>().unwrap(), r);
        }
    }

    #[test]
    fn test_default_matrix() {
        let m = RolePermissions::default();
        assert!(m.allows(Role::Admin, Permission::ManageUsers));
        assert!(m.allows(Role::Manager, Permission::ExportData));
        assert!(!m.allows(Role::Manager, Permission::ManageUsers));
        assert!(m.allows(Role::Operator, Permission::AssignRequests));
        assert!(!m.allows(Role::Viewer, Permission::ManageRequests));
    }

    #[test]
    fn test_session_extra_grants() {
        let session = UserSession::new("amina", Role::Viewer).grant(Permission::ExportData);
        assert!(session.has_permission(Permission::ExportData));
        assert!(session.has_permission(Permission::ViewDashboard));
        assert!(!session.has_permission(Permission::ManageSettings));
        assert!(session.has_role(Role::Viewer));
        assert!(!session.has_role(Role::Admin));
        assert_eq!(session.effective_permissions().len(), 5);
    }

    #[test]
    fn test_custom_matrix() {
        let mut matrix = RolePermissions::default();
        matrix.set(Role::Viewer, []);
        let session = UserSession::new("guest", Role::Viewer).with_matrix(matrix);
        assert!(session.effective_permissions().is_empty());
    }
}
