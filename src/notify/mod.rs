//! User-facing notifications
//!
//! Two flavours are provided:
//!
//! - [`NotificationStore`]: an ordered list of toasts that expire on their own
//! - [`SettingsNotice`]: a single banner slot owned by one form or page
//!
//! The store only expires entries when asked (`expire_due`). In a running
//! application [`spawn_expiry_driver`] does the asking on a tokio task.

mod driver;
mod notice;
mod store;

pub use driver::*;
pub use notice::*;
pub use store::*;
