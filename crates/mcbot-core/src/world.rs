use crate::{BlockPos, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntityKind {
    Player,
    Hostile,
    Passive,
}

/// Point-in-time view of an entity. Never hold on to one across ticks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub position: Vec3,
    pub health: f32,
}

impl EntitySnapshot {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockSnapshot {
    pub position: BlockPos,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemStack {
    pub name: String,
    pub count: u32,
}

impl ItemStack {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MoveDirection {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Sprint,
    Sneak,
}

/// State of the single dig slot the client exposes.
///
/// `Finished` and `Failed` are sticky until the next `begin_dig` or `cancel_dig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigStatus {
    Idle,
    Digging(BlockPos),
    Finished(BlockPos),
    Failed(BlockPos),
}

/// Read-only queries against the connection's world state.
///
/// Answers are snapshots for the current tick only.
pub trait WorldView {
    fn is_connected(&self) -> bool;

    fn position(&self) -> Option<Vec3>;

    fn health(&self) -> f32;

    fn food(&self) -> f32;

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot>;

    fn player(&self, name: &str) -> Option<EntitySnapshot>;

    fn nearest_hostile(&self, origin: Vec3, radius: f64) -> Option<EntitySnapshot>;

    /// Whether `name` is a block type the client recognizes at all.
    fn is_known_block(&self, name: &str) -> bool;

    /// Nearest block named `name` within `radius` of `origin`, skipping `exclude`.
    fn find_block(
        &self,
        name: &str,
        origin: Vec3,
        radius: f64,
        exclude: &[BlockPos],
    ) -> Option<BlockSnapshot>;

    fn inventory(&self) -> Vec<ItemStack>;

    fn dig_status(&self) -> DigStatus;
}

/// Primitive verbs of the connection layer.
pub trait WorldMut: WorldView {
    fn set_move_intent(&mut self, direction: MoveDirection, active: bool);

    fn clear_move_intents(&mut self);

    fn face(&mut self, target: Vec3);

    fn attack(&mut self, entity: EntityId);

    /// Start digging `block`. Returns the dig status right after the request.
    fn begin_dig(&mut self, block: BlockPos) -> DigStatus;

    fn cancel_dig(&mut self);

    /// Toss `count` items named `item`. Returns false when the client refused.
    fn toss(&mut self, item: &str, count: u32) -> bool;
}
