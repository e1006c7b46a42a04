//! Djobea CLI
//!
//! Runs the mock API, the interactive dashboard core, or a one-off
//! permission check.

use anyhow::Context;
use clap::Parser;
use djobea::api::{ApiServer, FixtureSource, MockDataSource, RandomSource};
use djobea::auth::{Permission, PermissionGuard, Role, UserSession};
use djobea::config::{CliArgs, Commands, DashboardConfig};
use djobea::keyboard::{run_line_source, KeyCombo, KeyEventBus, ShortcutBinding, ShortcutRegistry};
use djobea::DashboardContext;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_logging(&args);

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &CliArgs) {
    let level = match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = DashboardConfig::load_or_default(args.config.as_deref())
        .context("loading dashboard configuration")?
        .apply_cli(&args.command)?;

    match &args.command {
        Commands::Serve { .. } => cmd_serve(&config),
        Commands::Console { line_input, .. } => cmd_console(config, *line_input),
        Commands::Access {
            role,
            grants,
            permissions,
            require_roles,
            require_all,
        } => cmd_access(*role, grants, permissions, require_roles, *require_all),
    }
}

fn cmd_serve(config: &DashboardConfig) -> anyhow::Result<()> {
    let source: Arc<dyn MockDataSource> = if config.api.fixtures {
        Arc::new(FixtureSource::new())
    } else {
        Arc::new(RandomSource::new(config.api.failure_rate))
    };

    let server_config = config.api.server_config();
    println!("Starting Djobea mock API...");
    println!("Listening on:  http://{}", server_config.addr());
    println!("Data:          {}", if config.api.fixtures { "fixtures" } else { "random" });
    println!("Latency:       {}", if server_config.simulate_latency { "simulated" } else { "off" });
    println!("Press Ctrl+C to stop.");

    ApiServer::new(server_config, source)
        .run()
        .context("running mock API")
}

fn cmd_console(config: DashboardConfig, line_input: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    let result = rt.block_on(run_console(config, line_input));

    // A blocking stdin read cannot be interrupted; don't wait on it
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run_console(config: DashboardConfig, line_input: bool) -> anyhow::Result<()> {
    let mut ctx = DashboardContext::builder(config)
        .initial_stats(RandomSource::default().dashboard_stats())
        .build();

    // Console extras: a test notification and a real-time toggle
    let (toggle_tx, mut toggle_rx) = tokio::sync::mpsc::unbounded_channel();
    let notifications = ctx.notifications().clone();
    ctx.shortcuts().register_binding(ShortcutBinding::new(
        KeyCombo::new("n").ctrl(),
        "Show a test notification",
        move || {
            notifications.info("Console", "Test notification");
        },
    ));
    ctx.shortcuts().register_binding(ShortcutBinding::new(
        KeyCombo::new("r").ctrl(),
        "Toggle real-time updates",
        move || {
            if toggle_tx.send(()).is_err() {
                debug!("Real-time toggle ignored: console loop has exited");
            }
        },
    ));

    let watchers = spawn_watchers(&ctx);
    ctx.start();
    print_shortcuts(ctx.shortcuts());

    let bus = ctx.key_bus().clone();
    let stop = Arc::new(AtomicBool::new(false));
    let mut keys = tokio::task::spawn_blocking({
        let stop = Arc::clone(&stop);
        move || read_keys(&bus, stop, line_input)
    });

    loop {
        tokio::select! {
            finished = &mut keys => {
                finished.context("key source crashed")??;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                stop.store(true, Ordering::SeqCst);
                break;
            }
            Some(()) = toggle_rx.recv() => {
                let enable = !ctx.is_realtime_enabled();
                ctx.set_realtime(enable);
                ctx.notifications()
                    .info("Real-time updates", if enable { "Resumed" } else { "Paused" });
            }
        }
    }

    ctx.stop();
    for watcher in watchers {
        watcher.abort();
    }
    Ok(())
}

#[cfg_attr(not(feature = "terminal"), allow(unused_variables))]
fn read_keys(bus: &KeyEventBus, stop: Arc<AtomicBool>, line_input: bool) -> djobea::Result<()> {
    #[cfg(feature = "terminal")]
    {
        if !line_input {
            return djobea::keyboard::terminal::run_terminal_source(bus, stop).map_err(djobea::DjobeaError::from);
        }
    }

    println!("Type a shortcut per line (e.g. ctrl+k, escape), 'quit' to exit.");
    let stats = run_line_source(std::io::stdin().lock(), bus, "quit")?;
    info!(
        "Key input closed: {} emitted, {} handled, {} rejected",
        stats.emitted, stats.handled, stats.rejected
    );
    Ok(())
}

fn spawn_watchers(ctx: &DashboardContext) -> Vec<JoinHandle<()>> {
    let mut stats = ctx.stats().subscribe();
    let mut overlays = ctx.shortcuts().subscribe_overlays();
    let mut notifications = ctx.notifications().subscribe();

    vec![
        tokio::spawn(async move {
            while stats.changed().await.is_ok() {
                let s = stats.borrow_and_update().clone();
                info!(
                    "Stats: {} requests, {} pending, {} active providers",
                    s.total_requests, s.pending_requests, s.active_providers
                );
            }
        }),
        tokio::spawn(async move {
            while overlays.changed().await.is_ok() {
                let o = *overlays.borrow_and_update();
                info!(
                    "Overlays: search={} palette={} help={}",
                    o.search_open, o.command_palette_open, o.help_open
                );
            }
        }),
        tokio::spawn(async move {
            while notifications.changed().await.is_ok() {
                let list = notifications.borrow_and_update().clone();
                match list.last() {
                    Some(latest) => info!(
                        "Notifications ({}): [{}] {} - {}",
                        list.len(),
                        latest.kind,
                        latest.title,
                        latest.message
                    ),
                    None => info!("Notifications cleared"),
                }
            }
        }),
    ]
}

fn print_shortcuts(registry: &ShortcutRegistry) {
    println!("=== Keyboard Shortcuts ===");
    for (combo, description) in registry.describe() {
        println!("  {:<18} {}", combo, description);
    }
    println!();
}

fn cmd_access(
    role: Role,
    grants: &[Permission],
    permissions: &[Permission],
    require_roles: &[Role],
    require_all: bool,
) -> anyhow::Result<()> {
    let session = grants
        .iter()
        .fold(UserSession::new("cli", role), |session, p| session.grant(*p));
    let guard = PermissionGuard::new()
        .permissions(permissions.iter().copied())
        .roles(require_roles.iter().copied())
        .require_all(require_all);

    let held: Vec<String> = session
        .effective_permissions()
        .iter()
        .map(ToString::to_string)
        .collect();

    println!("=== Access Check ===");
    println!("Role:        {}", role);
    println!("Holds:       {}", held.join(", "));
    println!(
        "Requires:    {} of permissions [{}], roles [{}]",
        if require_all { "all" } else { "any" },
        join(permissions),
        join(require_roles)
    );

    let allowed = guard.render(&session, || true, || false);
    println!("Result:      {}", if allowed { "GRANTED" } else { "DENIED" });

    if !allowed {
        std::process::exit(1);
    }
    Ok(())
}

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
