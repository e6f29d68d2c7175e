//! mcbot CLI - drive the behavior scheduler.
//!
//! Single binary that provides:
//! - `mcbot run` - tick the scheduler against the reference world, commands on stdin
//! - `mcbot status` - configuration and recent notifications
//! - `mcbot init` - write a starter config
//! - `mcbot priorities` - effective priority table

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{fmt, EnvFilter};

use mcbot_core::{BlockPos, SimWorld, TickContext, Vec3};
use mcbot_sched::config::{CONFIG_PATH, DEFAULT_CONFIG_YAML};
use mcbot_sched::{
    ChannelNotifier, CommandRequest, CommandResponse, FanoutNotifier, JsonlNotifier,
    Notification, PriorityTable, Scheduler, SchedulerConfig,
};

#[derive(Parser)]
#[command(name = "mcbot")]
#[command(about = "Priority-preemptive behavior scheduler", version)]
struct Cli {
    /// Project root directory
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler, reading JSON commands from stdin
    Run {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Override the configured tick interval
        #[arg(long)]
        dt_ms: Option<u64>,

        /// Seed the world with a player, a hostile and some ore
        #[arg(long)]
        demo: bool,
    },

    /// Show configuration and recent notifications
    Status,

    /// Initialize a new project
    Init,

    /// Show the effective priority table
    Priorities,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout carries the JSON protocol; logs go to stderr.
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let project_root = match cli.project {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Some(Commands::Run { ticks, dt_ms, demo }) => {
            run_scheduler(&project_root, ticks, dt_ms, demo).await
        }
        Some(Commands::Status) => show_status(&project_root),
        Some(Commands::Init) => init_project(&project_root),
        Some(Commands::Priorities) => show_priorities(&project_root),
        None => {
            println!("mcbot - behavior scheduler");
            println!();
            println!("Usage: mcbot <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run         Run the scheduler");
            println!("  status      Show configuration and recent events");
            println!("  init        Initialize a new project");
            println!("  priorities  Show the priority table");
            println!();
            println!("Run 'mcbot --help' for more information.");
            Ok(())
        }
    }
}

/// Project config if present, then the per-user config, then defaults.
fn load_config(project_root: &Path) -> Result<SchedulerConfig> {
    let mut config = if project_root.join(CONFIG_PATH).exists() {
        SchedulerConfig::load_from_project(project_root)?
    } else {
        match user_config_path().filter(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using user config");
                SchedulerConfig::load(&path)?
            }
            None => SchedulerConfig::default(),
        }
    };
    config.resolve_paths(project_root);
    Ok(config)
}

fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mcbot").map(|dirs| dirs.config_dir().join("config.yaml"))
}

fn demo_world() -> SimWorld {
    let mut world = SimWorld::new();
    world.spawn_player("Alice", Vec3::new(12.0, 0.0, 4.0));
    world.spawn_hostile("zombie", Vec3::new(-14.0, 0.0, 0.0), 20.0);
    for x in 3..9 {
        world.set_block(BlockPos::new(x, 0, -3), "stone");
    }
    world.set_block(BlockPos::new(-4, 0, 6), "coal_ore");
    world
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn flush_notifications(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Result<()> {
    while let Ok(notification) = rx.try_recv() {
        print_json(&notification)?;
    }
    Ok(())
}

async fn run_scheduler(
    project_root: &Path,
    max_ticks: Option<u64>,
    dt_ms: Option<u64>,
    demo: bool,
) -> Result<()> {
    let mut config = load_config(project_root)?;
    if let Some(dt_ms) = dt_ms {
        config.tick_interval_ms = dt_ms.max(1);
    }
    tracing::info!(
        project = %project_root.display(),
        tick_ms = config.tick_interval_ms,
        monitor_every = config.monitor_every_ticks(),
        "Starting scheduler"
    );

    let (channel, mut rx) = ChannelNotifier::channel();
    let mut sink = FanoutNotifier::new().with(channel);
    if let Some(path) = &config.event_log {
        sink = sink.with(JsonlNotifier::new(path));
    }

    let mut world = if demo { demo_world() } else { SimWorld::new() };
    let mut ctx = TickContext::new(0, config.dt_seconds());
    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut scheduler: Scheduler<SimWorld> = Scheduler::new(config).with_notifier(sink);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                scheduler.tick(&ctx, &mut world);
                world.step(ctx.dt_seconds);
                ctx = ctx.next();
                flush_notifications(&mut rx)?;
                if max_ticks.is_some_and(|max| ctx.tick >= max) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        let response = match serde_json::from_str::<CommandRequest>(&line) {
                            Ok(request) => scheduler.handle_command(&ctx, &mut world, request),
                            Err(err) => CommandResponse::error(None, format!("invalid request: {err}")),
                        };
                        flush_notifications(&mut rx)?;
                        print_json(&response)?;
                    }
                    None => {
                        stdin_open = false;
                        if max_ticks.is_none() {
                            break;
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    let status = scheduler.status();
    tracing::info!(
        tick = status.tick,
        current = ?status.current.as_ref().map(|c| c.kind),
        tasks = status.tasks.len(),
        "Scheduler stopped"
    );
    Ok(())
}

fn show_status(project_root: &Path) -> Result<()> {
    let config = load_config(project_root)?;

    println!("mcbot Status");
    println!("============");
    println!();
    println!("Project: {}", project_root.display());
    println!(
        "Tick: {} ms, monitor every {} ticks",
        config.tick_interval_ms,
        config.monitor_every_ticks()
    );
    println!(
        "Combat trigger: {:.1} blocks, critical at {:.1} health",
        config.combat.detection_range, config.combat.critical_health
    );
    println!();
    println!("Priority overrides: {}", config.priorities.len());
    for (kind, value) in &config.priorities {
        println!("  - {} = {} (default {})", kind, value, kind.default_priority());
    }
    println!();

    let Some(event_log) = &config.event_log else {
        println!("Event log disabled");
        return Ok(());
    };
    let recent = JsonlNotifier::read_recent(event_log, 10);
    println!("Recent events ({}):", event_log.display());
    for event in &recent {
        let behavior = event.behavior.map(|k| k.to_string()).unwrap_or_default();
        println!(
            "  [{}] {:?} {} {}",
            event.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S"),
            event.event_type,
            behavior,
            event.message
        );
    }

    Ok(())
}

fn show_priorities(project_root: &Path) -> Result<()> {
    let config = load_config(project_root)?;
    let table = PriorityTable::with_overrides(&config.priorities)?;
    println!("Priorities (lower wins):");
    for (kind, value) in table.ranked() {
        println!("  {:<14} {}", kind.to_string(), value);
    }
    Ok(())
}

fn init_project(project_root: &Path) -> Result<()> {
    let config_path = project_root.join(CONFIG_PATH);
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    if !config_path.exists() {
        std::fs::write(&config_path, DEFAULT_CONFIG_YAML)?;
    }

    println!("Initialized mcbot project at {}", project_root.display());
    println!();
    println!("Created:");
    println!("  {} - scheduler configuration", CONFIG_PATH);
    println!();
    println!("Next steps:");
    println!("  1. Adjust priorities in {}", CONFIG_PATH);
    println!("  2. Run: mcbot run --demo");
    println!(
        r#"  3. Type: {{"kind":"set_follow_mode","arguments":{{"enabled":true,"player":"Alice"}}}}"#
    );

    Ok(())
}
