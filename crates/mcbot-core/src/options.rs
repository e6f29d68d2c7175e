//! Strongly typed configuration for each behavior kind.
//!
//! Options are immutable once a behavior instance is built; they are what status reports show and
//! what a suspended behavior resumes with.

use crate::{BehaviorKind, EntityId, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatOptions {
    /// Fixed target. `None` picks the nearest hostile within `max_distance`.
    pub target: Option<EntityId>,
    pub max_distance: f64,
    pub attack_range: f64,
    /// Seconds between strikes.
    pub attack_interval: f32,
    /// Seconds between target re-validations.
    pub retarget_interval: f32,
    pub stop_after_kill: bool,
    /// Approach attempts per target. 0 means unlimited.
    pub max_attempts: u32,
    pub stall_seconds: f32,
}

impl Default for CombatOptions {
    fn default() -> Self {
        Self {
            target: None,
            max_distance: 10.0,
            attack_range: 3.0,
            attack_interval: 0.6,
            retarget_interval: 1.0,
            stop_after_kill: true,
            max_attempts: 0,
            stall_seconds: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MineOptions {
    pub block: String,
    pub quantity: u32,
    pub search_radius: f64,
    pub reach: f64,
    /// Movement stalls tolerated before giving up.
    pub max_attempts: u32,
    pub max_dig_retries: u32,
    /// Seconds to wait after a failed dig.
    pub dig_backoff: f32,
    pub stall_seconds: f32,
}

impl MineOptions {
    pub fn new(block: impl Into<String>, quantity: u32) -> Self {
        Self {
            block: block.into(),
            quantity,
            ..Self::default()
        }
    }
}

impl Default for MineOptions {
    fn default() -> Self {
        Self {
            block: String::new(),
            quantity: 1,
            search_radius: 32.0,
            reach: 4.5,
            max_attempts: 5,
            max_dig_retries: 3,
            dig_backoff: 1.0,
            stall_seconds: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FollowOptions {
    pub player: String,
    pub distance_threshold: f64,
    /// Path attempts before the fallback radius kicks in. 0 means unlimited.
    pub max_attempts: u32,
    /// Extra acceptance radius granted once after `max_attempts` is reached.
    pub fallback_range: f64,
    /// Seconds the target may stay out of sight before the behavior gives up.
    pub lost_target_timeout: f32,
    pub stall_seconds: f32,
}

impl FollowOptions {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            ..Self::default()
        }
    }
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            player: String::new(),
            distance_threshold: 2.0,
            max_attempts: 0,
            fallback_range: 2.0,
            lost_target_timeout: 10.0,
            stall_seconds: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DropOptions {
    /// Only toss stacks with this name. `None` empties the inventory.
    pub item: Option<String>,
    /// Seconds between two tosses.
    pub toss_interval: f32,
}

impl Default for DropOptions {
    fn default() -> Self {
        Self {
            item: None,
            toss_interval: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GotoOptions {
    pub position: Vec3,
    pub range: f64,
    pub max_attempts: u32,
    pub stall_seconds: f32,
}

impl GotoOptions {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            range: 1.0,
            max_attempts: 3,
            stall_seconds: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PatrolOptions {
    pub waypoints: Vec<Vec3>,
    pub range: f64,
    /// Seconds to wait at each waypoint.
    pub dwell: f32,
    pub looping: bool,
    pub max_attempts: u32,
    pub stall_seconds: f32,
}

impl Default for PatrolOptions {
    fn default() -> Self {
        Self {
            waypoints: Vec::new(),
            range: 1.0,
            dwell: 1.0,
            looping: true,
            max_attempts: 3,
            stall_seconds: 3.0,
        }
    }
}

/// A behavior request: the kind plus its typed options.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BehaviorSpec {
    Idle,
    Combat(CombatOptions),
    #[cfg_attr(feature = "serde", serde(alias = "mineBlock"))]
    MineBlock(MineOptions),
    #[cfg_attr(feature = "serde", serde(alias = "followPlayer"))]
    FollowPlayer(FollowOptions),
    #[cfg_attr(feature = "serde", serde(alias = "dropItems"))]
    DropItems(DropOptions),
    Goto(GotoOptions),
    Patrol(PatrolOptions),
}

impl BehaviorSpec {
    pub fn kind(&self) -> BehaviorKind {
        match self {
            BehaviorSpec::Idle => BehaviorKind::Idle,
            BehaviorSpec::Combat(_) => BehaviorKind::Combat,
            BehaviorSpec::MineBlock(_) => BehaviorKind::MineBlock,
            BehaviorSpec::FollowPlayer(_) => BehaviorKind::FollowPlayer,
            BehaviorSpec::DropItems(_) => BehaviorKind::DropItems,
            BehaviorSpec::Goto(_) => BehaviorKind::Goto,
            BehaviorSpec::Patrol(_) => BehaviorKind::Patrol,
        }
    }

    /// Short human-readable target, if the kind has one.
    pub fn target_label(&self) -> Option<String> {
        match self {
            BehaviorSpec::Idle => None,
            BehaviorSpec::Combat(o) => o.target.map(|id| format!("entity#{}", id.0)),
            BehaviorSpec::MineBlock(o) => Some(format!("{} x{}", o.block, o.quantity)),
            BehaviorSpec::FollowPlayer(o) => Some(o.player.clone()),
            BehaviorSpec::DropItems(o) => o.item.clone(),
            BehaviorSpec::Goto(o) => Some(format!(
                "{:.1},{:.1},{:.1}",
                o.position.x, o.position.y, o.position.z
            )),
            BehaviorSpec::Patrol(o) => Some(format!("{} waypoints", o.waypoints.len())),
        }
    }
}
