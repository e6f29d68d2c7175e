//! Scheduler configuration loading and management.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mcbot_core::{BehaviorKind, CombatOptions, FollowOptions, MineOptions};
use serde::{Deserialize, Serialize};

use crate::{PriorityTable, SchedulerError};

/// Location of the config file relative to a project root.
pub const CONFIG_PATH: &str = ".mcbot/config.yaml";

/// Starter file written by `mcbot init`. Spells out the built-in defaults.
pub const DEFAULT_CONFIG_YAML: &str = r#"# mcbot scheduler configuration
version: "1"

# Runner tick period. Behaviors advance once per tick.
tick_interval_ms: 50

# How often standing modes and the task backlog are re-evaluated.
monitor_interval_ms: 500

# Priority overrides, lower wins. Omitted kinds keep their defaults:
# combat 0, drop_items 3, goto 5, mine_block 7, follow_player 10, patrol 15, idle 100.
priorities: {}

combat:
  detection_range: 10.0
  # At or below this health combat preempts regardless of priority.
  critical_health: 6.0
  options:
    max_distance: 10.0
    attack_range: 3.0
    attack_interval: 0.6
    retarget_interval: 1.0
    stop_after_kill: true
    max_attempts: 0

follow:
  distance_threshold: 2.0
  max_attempts: 0
  fallback_range: 2.0
  lost_target_timeout: 10.0

mining:
  search_radius: 32.0
  reach: 4.5
  max_attempts: 5
  max_dig_retries: 3
  dig_backoff: 1.0

event_log: .mcbot/events.jsonl
"#;

/// Main scheduler configuration, loaded from .mcbot/config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Config version
    pub version: Option<String>,

    /// Runner tick period
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Monitor period; rounded down to whole ticks
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_ms: u64,

    /// Priority overrides on top of the canonical table
    #[serde(default)]
    pub priorities: BTreeMap<BehaviorKind, i32>,

    #[serde(default)]
    pub combat: CombatTriggerConfig,

    /// Template for follow-mode tasks. `player` is filled in by the mode command.
    #[serde(default)]
    pub follow: FollowOptions,

    /// Template for mining-mode tasks. `block` and `quantity` come from the mode command.
    #[serde(default)]
    pub mining: MineOptions,

    /// JSONL notification log (relative to project root)
    #[serde(default = "default_event_log")]
    pub event_log: Option<PathBuf>,
}

/// When combat mode turns a nearby hostile into a running combat behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTriggerConfig {
    pub detection_range: f64,
    pub critical_health: f32,
    pub options: CombatOptions,
}

impl Default for CombatTriggerConfig {
    fn default() -> Self {
        Self {
            detection_range: 10.0,
            critical_health: 6.0,
            options: CombatOptions::default(),
        }
    }
}

fn default_tick_interval() -> u64 {
    50
}
fn default_monitor_interval() -> u64 {
    500
}
fn default_event_log() -> Option<PathBuf> {
    Some(PathBuf::from(".mcbot/events.jsonl"))
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            version: None,
            tick_interval_ms: default_tick_interval(),
            monitor_interval_ms: default_monitor_interval(),
            priorities: BTreeMap::new(),
            combat: CombatTriggerConfig::default(),
            follow: FollowOptions::default(),
            mining: MineOptions::default(),
            event_log: default_event_log(),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Check values serde cannot: priority overrides must be in range.
    pub fn validate(&self) -> std::result::Result<(), SchedulerError> {
        PriorityTable::with_overrides(&self.priorities).map(|_| ())
    }

    /// Load from project root (looks for .mcbot/config.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(CONFIG_PATH);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve paths relative to project root
    pub fn resolve_paths(&mut self, project_root: &Path) {
        if let Some(log) = self.event_log.take() {
            self.event_log = Some(project_root.join(log));
        }
    }

    /// Tick length in seconds, as fed to `TickContext`.
    pub fn dt_seconds(&self) -> f32 {
        self.tick_interval_ms.max(1) as f32 / 1000.0
    }

    /// Monitor cadence in ticks. Never zero.
    pub fn monitor_every_ticks(&self) -> u64 {
        (self.monitor_interval_ms / self.tick_interval_ms.max(1)).max(1)
    }
}
