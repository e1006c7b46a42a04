//! Configuration settings for Djobea
//!
//! Command-line arguments plus the optional JSON dashboard config file.
//! Values from the file are the baseline; flags given on the command line
//! override them.

use crate::api::{ApiServerConfig, RandomSource};
use crate::auth::{Permission, Role};
use crate::error::{DjobeaError, IoResultExt, Result};
use crate::keyboard::{KeyCombo, ShortcutCommand};
use crate::notify::DEFAULT_NOTIFICATION_DURATION;
use crate::realtime::DEFAULT_POLL_INTERVAL;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Djobea - dashboard state core and mock API for Djobea Analytics
#[derive(Parser, Debug, Clone)]
#[command(name = "djobea")]
#[command(author = "Djobea Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dashboard state core and mock API for Djobea Analytics")]
#[command(long_about = r#"
Djobea runs the client-side state of the Djobea Analytics dashboard
(notifications, keyboard shortcuts, real-time stats, permission checks)
and the simulated REST backend it talks to.

Examples:
  djobea serve --port 8080                    # Mock API with random data
  djobea serve --fixtures --no-latency        # Deterministic, instant API
  djobea console --poll-interval 2s           # Interactive dashboard core
  djobea access --role viewer -p export_data  # Evaluate a permission guard
"#)]
pub struct CliArgs {
    /// Dashboard configuration file (JSON)
    #[arg(short = 'c', long, global = true, value_name = "PATH", env = "DJOBEA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the mock REST API
    #[command(name = "serve")]
    Serve {
        /// Bind address
        #[arg(short, long)]
        bind: Option<String>,
        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Answer immediately instead of simulating latency
        #[arg(long)]
        no_latency: bool,
        /// Probability (0-1) that a fallible endpoint fails
        #[arg(long, value_name = "RATE")]
        failure_rate: Option<f64>,
        /// Serve fixed fixture data instead of random data
        #[arg(long)]
        fixtures: bool,
    },

    /// Run the dashboard core interactively, reading shortcuts from the keyboard
    #[command(name = "console")]
    Console {
        /// Real-time update period (e.g. 5s, 500ms)
        #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
        poll_interval: Option<Duration>,
        /// Do not start real-time updates
        #[arg(long)]
        no_poll: bool,
        /// Lifetime of notifications (e.g. 5s)
        #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
        notification_duration: Option<Duration>,
        /// Read one combo per line from stdin even when a terminal backend is available
        #[arg(long)]
        line_input: bool,
    },

    /// Evaluate a permission guard for a user session
    #[command(name = "access")]
    Access {
        /// Role of the session
        #[arg(short, long)]
        role: Role,
        /// Extra permission granted to the session
        #[arg(long = "grant", value_name = "PERMISSION")]
        grants: Vec<Permission>,
        /// Permission the guard requires
        #[arg(short = 'p', long = "permission", value_name = "PERMISSION")]
        permissions: Vec<Permission>,
        /// Role the guard requires
        #[arg(long = "require-role", value_name = "ROLE")]
        require_roles: Vec<Role>,
        /// Require every listed entry instead of any
        #[arg(long)]
        require_all: bool,
    },
}

/// (De)serialize a Duration as humantime text ("5s", "1m 30s")
mod humantime_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// `api` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSettings {
    pub bind: String,
    pub port: u16,
    pub cors_enabled: bool,
    pub simulate_latency: bool,
    pub failure_rate: f64,
    pub fixtures: bool,
    pub max_body_size: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        let server = ApiServerConfig::default();
        Self {
            bind: server.bind,
            port: server.port,
            cors_enabled: server.cors_enabled,
            simulate_latency: server.simulate_latency,
            failure_rate: RandomSource::DEFAULT_FAILURE_RATE,
            fixtures: false,
            max_body_size: server.max_body_size,
        }
    }
}

impl ApiSettings {
    pub fn server_config(&self) -> ApiServerConfig {
        ApiServerConfig {
            bind: self.bind.clone(),
            port: self.port,
            cors_enabled: self.cors_enabled,
            simulate_latency: self.simulate_latency,
            max_body_size: self.max_body_size,
        }
    }
}

/// `notifications` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationSettings {
    #[serde(with = "humantime_text")]
    pub default_duration: Duration,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            default_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }
}

/// `realtime` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RealtimeSettings {
    pub enabled: bool,
    #[serde(with = "humantime_text")]
    pub interval: Duration,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// One entry of the `shortcuts` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShortcutSetting {
    pub combo: KeyCombo,
    pub command: ShortcutCommand,
}

/// Whole dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub api: ApiSettings,
    pub notifications: NotificationSettings,
    pub realtime: RealtimeSettings,
    /// Bound on top of the stock key map; same combo replaces the stock binding
    pub shortcuts: Vec<ShortcutSetting>,
}

impl DashboardConfig {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_path(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| DjobeaError::from(e).with_context(format!("parsing {}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Config file if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.api.failure_rate) {
            return Err(DjobeaError::config(format!(
                "api.failure_rate must be between 0 and 1, got {}",
                self.api.failure_rate
            )));
        }
        if self.api.bind.trim().is_empty() {
            return Err(DjobeaError::config("api.bind must not be empty"));
        }
        if self.api.max_body_size == 0 {
            return Err(DjobeaError::config("api.max_body_size must be positive"));
        }
        if self.notifications.default_duration.is_zero() {
            return Err(DjobeaError::config("notifications.default_duration must be positive"));
        }
        if self.realtime.interval.is_zero() {
            return Err(DjobeaError::config("realtime.interval must be positive"));
        }
        Ok(())
    }

    /// Apply command-line overrides for `command` and re-validate
    pub fn apply_cli(mut self, command: &Commands) -> Result<Self> {
        match command {
            Commands::Serve {
                bind,
                port,
                no_latency,
                failure_rate,
                fixtures,
            } => {
                if let Some(bind) = bind {
                    self.api.bind = bind.clone();
                }
                if let Some(port) = port {
                    self.api.port = *port;
                }
                if *no_latency {
                    self.api.simulate_latency = false;
                }
                if let Some(rate) = failure_rate {
                    self.api.failure_rate = *rate;
                }
                if *fixtures {
                    self.api.fixtures = true;
                }
            }
            Commands::Console {
                poll_interval,
                no_poll,
                notification_duration,
                ..
            } => {
                if let Some(interval) = poll_interval {
                    self.realtime.interval = *interval;
                }
                if *no_poll {
                    self.realtime.enabled = false;
                }
                if let Some(duration) = notification_duration {
                    self.notifications.default_duration = *duration;
                }
            }
            Commands::Access { .. } => {}
        }
        self.validate()?;
        Ok(self)
    }
}
