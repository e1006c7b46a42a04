//! Configuration module for Djobea
//!
//! CLI arguments and the JSON dashboard configuration file.

mod settings;

pub use settings::*;
