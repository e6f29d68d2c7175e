use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed set of behavior kinds the scheduler knows how to build and rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BehaviorKind {
    Idle,
    Combat,
    #[cfg_attr(feature = "serde", serde(alias = "mineBlock"))]
    MineBlock,
    #[cfg_attr(feature = "serde", serde(alias = "followPlayer"))]
    FollowPlayer,
    #[cfg_attr(feature = "serde", serde(alias = "dropItems"))]
    DropItems,
    Goto,
    Patrol,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 7] = [
        BehaviorKind::Idle,
        BehaviorKind::Combat,
        BehaviorKind::MineBlock,
        BehaviorKind::FollowPlayer,
        BehaviorKind::DropItems,
        BehaviorKind::Goto,
        BehaviorKind::Patrol,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BehaviorKind::Idle => "idle",
            BehaviorKind::Combat => "combat",
            BehaviorKind::MineBlock => "mine_block",
            BehaviorKind::FollowPlayer => "follow_player",
            BehaviorKind::DropItems => "drop_items",
            BehaviorKind::Goto => "goto",
            BehaviorKind::Patrol => "patrol",
        }
    }

    /// Canonical priority (lower wins). Used to seed a fresh priority table.
    pub fn default_priority(self) -> i32 {
        match self {
            BehaviorKind::Combat => 0,
            BehaviorKind::DropItems => 3,
            BehaviorKind::Goto => 5,
            BehaviorKind::MineBlock => 7,
            BehaviorKind::FollowPlayer => 10,
            BehaviorKind::Patrol => 15,
            BehaviorKind::Idle => 100,
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBehaviorKind(pub String);

impl fmt::Display for UnknownBehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown behavior kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownBehaviorKind {}

impl FromStr for BehaviorKind {
    type Err = UnknownBehaviorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        let kind = match normalized.as_str() {
            "idle" => BehaviorKind::Idle,
            "combat" => BehaviorKind::Combat,
            "mineblock" | "mine" => BehaviorKind::MineBlock,
            "followplayer" | "follow" => BehaviorKind::FollowPlayer,
            "dropitems" | "drop" => BehaviorKind::DropItems,
            "goto" => BehaviorKind::Goto,
            "patrol" => BehaviorKind::Patrol,
            _ => return Err(UnknownBehaviorKind(s.to_string())),
        };
        Ok(kind)
    }
}
