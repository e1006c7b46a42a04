//! # Djobea - Dashboard State Core for Djobea Analytics
//!
//! Djobea Analytics is a dashboard for managing service providers and the
//! job requests assigned to them. This crate holds the dashboard's state
//! core and the simulated backend it talks to.
//!
//! ## Features
//!
//! - **Notifications**: transient toasts that expire on their own
//! - **Keyboard Shortcuts**: registry, overlay flags and an exact-match dispatcher
//! - **Real-Time Updates**: periodic stat deltas while enabled
//! - **Permission Guard**: render gating on permissions and roles
//! - **Mock API**: latency-simulating REST endpoints with random or fixture data
//!
//! ## Quick Start
//!
//! ```no_run
//! use djobea::prelude::*;
//!
//! # #[tokio::main] async fn main() {
//! let mut ctx = DashboardContext::new(DashboardConfig::default());
//! ctx.start();
//!
//! ctx.notifications().success("Saved", "Provider updated");
//! ctx.key_bus().emit(&KeyEvent::down("k").ctrl());
//! assert!(ctx.shortcuts().is_search_open());
//! # }
//! ```
//!
//! ## Permission Checks
//!
//! ```
//! use djobea::auth::{Permission, PermissionGuard, Role, UserSession};
//!
//! let guard = PermissionGuard::new().permission(Permission::ManageRequests);
//! let viewer = UserSession::new("amina", Role::Viewer);
//!
//! assert_eq!(guard.render(&viewer, || "actions", || "read-only"), "read-only");
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod keyboard;
pub mod notify;
pub mod realtime;
pub mod schedule;

// Re-export commonly used types
pub use app::DashboardContext;
pub use config::DashboardConfig;
pub use error::{DjobeaError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use djobea::prelude::*;
    //! ```

    pub use crate::app::DashboardContext;
    pub use crate::auth::{Permission, PermissionContext, PermissionGuard, Role, UserSession};
    pub use crate::config::DashboardConfig;
    pub use crate::error::{DjobeaError, Result};
    pub use crate::keyboard::{KeyCombo, KeyEvent, KeyEventBus, KeyboardDispatcher, ShortcutRegistry};
    pub use crate::notify::{NotificationKind, NotificationStore, SettingsNotice};
    pub use crate::realtime::{DashboardStats, RealTimePoller, StatsStore};
    pub use crate::schedule::{Clock, ManualClock, SystemClock};
}
