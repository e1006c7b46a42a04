//! Render gate driven by permission and role checks

use super::context::{Permission, PermissionContext, Role};

/// Decides whether a region may be rendered.
///
/// An empty permission list (or role list) is satisfied trivially. With
/// `require_all` every listed entry must pass, otherwise one is enough.
/// Both the permission side and the role side must be satisfied. Nothing is
/// cached: each call asks the context again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionGuard {
    pub permissions: Vec<Permission>,
    pub roles: Vec<Role>,
    pub require_all: bool,
}

impl PermissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    fn satisfied<T>(&self, items: &[T], check: impl Fn(&T) -> bool) -> bool {
        if items.is_empty() {
            true
        } else if self.require_all {
            items.iter().all(check)
        } else {
            items.iter().any(check)
        }
    }

    pub fn permissions_satisfied<C: PermissionContext + ?Sized>(&self, ctx: &C) -> bool {
        self.satisfied(&self.permissions, |p| ctx.has_permission(*p))
    }

    pub fn roles_satisfied<C: PermissionContext + ?Sized>(&self, ctx: &C) -> bool {
        self.satisfied(&self.roles, |r| ctx.has_role(*r))
    }

    /// True when the content may be rendered
    pub fn allows<C: PermissionContext + ?Sized>(&self, ctx: &C) -> bool {
        self.permissions_satisfied(ctx) && self.roles_satisfied(ctx)
    }

    /// Build `content` if allowed, otherwise `fallback`
    pub fn render<C, T>(&self, ctx: &C, content: impl FnOnce() -> T, fallback: impl FnOnce() -> T) -> T
    where
        C: PermissionContext + ?Sized,
    {
        if self.allows(ctx) {
            content()
        } else {
            fallback()
        }
    }

    /// Build `content` if allowed, otherwise nothing
    pub fn render_or_nothing<C, T>(&self, ctx: &C, content: impl FnOnce() -> T) -> Option<T>
    where
        C: PermissionContext + ?Sized,
    {
        self.allows(ctx).then(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserSession;
    use std::cell::Cell;
    use std::collections::HashSet;

    /// Context answering from fixed sets, counting how often it is asked
    #[derive(Default)]
    struct FixedContext {
        permissions: HashSet<Permission>,
        roles: HashSet<Role>,
        asked: Cell<usize>,
    }

    impl PermissionContext for FixedContext {
        fn has_permission(&self, permission: Permission) -> bool {
            self.asked.set(self.asked.get() + 1);
            self.permissions.contains(&permission)
        }

        fn has_role(&self, role: Role) -> bool {
            self.asked.set(self.asked.get() + 1);
            self.roles.contains(&role)
        }
    }

    #[test]
    fn test_single_permission_end_to_end() {
        let guard = PermissionGuard::new().permission(Permission::ManageRequests);

        let denied = FixedContext::default();
        assert_eq!(guard.render(&denied, || "children", || "fallback"), "fallback");

        let granted = FixedContext {
            permissions: [Permission::ManageRequests].into(),
            ..Default::default()
        };
        assert_eq!(guard.render(&granted, || "children", || "fallback"), "children");
    }

    #[test]
    fn test_empty_guard_always_renders() {
        let ctx = FixedContext::default();
        assert_eq!(PermissionGuard::new().render_or_nothing(&ctx, || 1), Some(1));
        assert_eq!(ctx.asked.get(), 0);
    }

    #[test]
    fn test_any_versus_all() {
        let ctx = FixedContext {
            permissions: [Permission::ViewAnalytics].into(),
            ..Default::default()
        };
        let guard = PermissionGuard::new().permissions([Permission::ViewAnalytics, Permission::ExportData]);

        assert!(guard.allows(&ctx));
        assert!(!guard.clone().require_all(true).allows(&ctx));
    }

    #[test]
    fn test_both_sides_must_pass() {
        let ctx = FixedContext {
            permissions: [Permission::ManageProviders].into(),
            roles: [Role::Operator].into(),
            ..Default::default()
        };

        let wrong_role = PermissionGuard::new()
            .permission(Permission::ManageProviders)
            .role(Role::Manager);
        assert_eq!(wrong_role.render_or_nothing(&ctx, || ()), None);

        let any_role = wrong_role.clone().role(Role::Operator);
        assert!(any_role.allows(&ctx));
        assert!(!any_role.require_all(true).allows(&ctx));
    }

    #[test]
    fn test_recomputed_each_time() {
        let guard = PermissionGuard::new().role(Role::Admin);
        let ctx = FixedContext::default();
        guard.allows(&ctx);
        guard.allows(&ctx);
        assert_eq!(ctx.asked.get(), 2);
    }

    #[test]
    fn test_with_user_session() {
        let guard = PermissionGuard::new()
            .permissions([Permission::ViewFinances, Permission::ExportData])
            .require_all(true);

        assert!(guard.allows(&UserSession::new("m", Role::Manager)));
        assert!(!guard.allows(&UserSession::new("o", Role::Operator)));

        let dyn_ctx: &dyn PermissionContext = &UserSession::new("a", Role::Admin);
        assert!(guard.allows(dyn_ctx));
    }
}
