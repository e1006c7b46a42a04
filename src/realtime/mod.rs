//! Real-time dashboard updates
//!
//! [`StatsStore`] holds the headline counters; [`RealTimePoller`] merges a
//! simulated delta into it on a fixed period while enabled.

mod delta;
mod poller;
mod stats;

pub use delta::*;
pub use poller::*;
pub use stats::*;
