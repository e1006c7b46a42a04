//! Access control for dashboard regions
//!
//! [`PermissionGuard`] is a pure decision over a [`PermissionContext`].
//! [`UserSession`] is the stock context, backed by a [`RolePermissions`]
//! matrix.

mod context;
mod guard;

pub use context::*;
pub use guard::*;
