//! Time sources and timer scheduling
//!
//! Stores never read the wall clock directly. They are handed a [`Clock`]
//! and keep their pending work in a [`TimerQueue`], so tests can swap in a
//! [`ManualClock`] and step time forward deterministically.

mod clock;
mod timers;

pub use clock::*;
pub use timers::*;
