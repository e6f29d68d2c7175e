//! Deterministic in-memory reference world.
//!
//! `SimWorld` implements the capability surface well enough to drive behaviors end to end in tests
//! and in the CLI's offline mode: a straight-line navigator, timed digging, melee damage and a
//! flat inventory. It is not a protocol client and makes no attempt at physics.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    BlockPos, BlockSnapshot, DigStatus, EntityId, EntityKind, EntitySnapshot, ItemStack,
    MoveDirection, NavWorld, PathGoal, Vec3, WorldMut, WorldView,
};

const DIG_REACH: f64 = 6.0;
const DEFAULT_KNOWN_BLOCKS: &[&str] = &[
    "stone",
    "cobblestone",
    "dirt",
    "grass_block",
    "sand",
    "gravel",
    "oak_log",
    "birch_log",
    "coal_ore",
    "iron_ore",
];

#[derive(Debug, Clone)]
struct SimEntity {
    name: String,
    kind: EntityKind,
    position: Vec3,
    health: f32,
}

#[derive(Debug)]
pub struct SimWorld {
    pub connected: bool,
    pub position: Vec3,
    pub health: f32,
    pub food: f32,
    /// Blocks per second, for both navigation and direct movement.
    pub speed: f64,
    /// When set the navigator cannot find a way and drops every goal.
    pub path_blocked: bool,
    pub dig_seconds: f32,
    /// The next `fail_digs` dig requests fail.
    pub fail_digs: u32,
    pub attack_damage: f32,

    entities: BTreeMap<EntityId, SimEntity>,
    blocks: BTreeMap<BlockPos, String>,
    known_blocks: BTreeSet<String>,
    inventory: Vec<ItemStack>,
    tossed: Vec<ItemStack>,

    move_intents: BTreeSet<MoveDirection>,
    path_goal: Option<PathGoal>,
    pathing: bool,
    facing: Option<Vec3>,
    attacks: Vec<EntityId>,
    intent_clears: u32,

    dig: DigStatus,
    dig_remaining: f32,
    next_entity: u64,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            connected: true,
            position: Vec3::ZERO,
            health: 20.0,
            food: 20.0,
            speed: 4.3,
            path_blocked: false,
            dig_seconds: 0.5,
            fail_digs: 0,
            attack_damage: 5.0,
            entities: BTreeMap::new(),
            blocks: BTreeMap::new(),
            known_blocks: DEFAULT_KNOWN_BLOCKS.iter().map(|s| s.to_string()).collect(),
            inventory: Vec::new(),
            tossed: Vec::new(),
            move_intents: BTreeSet::new(),
            path_goal: None,
            pathing: false,
            facing: None,
            attacks: Vec::new(),
            intent_clears: 0,
            dig: DigStatus::Idle,
            dig_remaining: 0.0,
            next_entity: 1,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn spawn_player(&mut self, name: &str, position: Vec3) -> EntityId {
        self.spawn(name, EntityKind::Player, position, 20.0)
    }

    pub fn spawn_hostile(&mut self, name: &str, position: Vec3, health: f32) -> EntityId {
        self.spawn(name, EntityKind::Hostile, position, health)
    }

    fn spawn(&mut self, name: &str, kind: EntityKind, position: Vec3, health: f32) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(
            id,
            SimEntity {
                name: name.to_string(),
                kind,
                position,
                health,
            },
        );
        id
    }

    pub fn move_entity(&mut self, id: EntityId, position: Vec3) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = position;
        }
    }

    pub fn remove_entity(&mut self, id: EntityId) {
        self.entities.remove(&id);
    }

    pub fn set_block(&mut self, position: BlockPos, name: &str) {
        self.known_blocks.insert(name.to_string());
        self.blocks.insert(position, name.to_string());
    }

    pub fn block_at(&self, position: BlockPos) -> Option<&str> {
        self.blocks.get(&position).map(|s| s.as_str())
    }

    pub fn count_blocks(&self, name: &str) -> usize {
        self.blocks.values().filter(|b| b.as_str() == name).count()
    }

    pub fn give(&mut self, item: &str, count: u32) {
        match self.inventory.iter_mut().find(|s| s.name == item) {
            Some(stack) => stack.count += count,
            None => self.inventory.push(ItemStack::new(item, count)),
        }
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory
            .iter()
            .filter(|s| s.name == item)
            .map(|s| s.count)
            .sum()
    }

    pub fn tossed(&self) -> &[ItemStack] {
        &self.tossed
    }

    pub fn move_intents(&self) -> Vec<MoveDirection> {
        self.move_intents.iter().copied().collect()
    }

    pub fn has_move_intents(&self) -> bool {
        !self.move_intents.is_empty()
    }

    pub fn path_goal(&self) -> Option<PathGoal> {
        self.path_goal
    }

    pub fn facing(&self) -> Option<Vec3> {
        self.facing
    }

    pub fn attacks(&self) -> &[EntityId] {
        &self.attacks
    }

    /// How many times movement intents were cleared. Useful to spot duplicate stops.
    pub fn intent_clears(&self) -> u32 {
        self.intent_clears
    }

    /// Advance the world by `dt_seconds`: digging progress, navigation and direct movement.
    pub fn step(&mut self, dt_seconds: f32) {
        if !self.connected {
            return;
        }
        let dt = dt_seconds.max(0.0);

        if let DigStatus::Digging(pos) = self.dig {
            self.dig_remaining -= dt;
            if self.dig_remaining <= 0.0 {
                match self.blocks.remove(&pos) {
                    Some(name) => {
                        self.give(&name, 1);
                        self.dig = DigStatus::Finished(pos);
                    }
                    None => self.dig = DigStatus::Failed(pos),
                }
            }
        }

        let budget = self.speed.max(0.0) * dt as f64;
        match self.path_goal {
            Some(goal) => self.step_navigation(goal, budget),
            None => self.step_direct(budget),
        }
    }

    fn step_navigation(&mut self, goal: PathGoal, budget: f64) {
        let (target, range) = match goal {
            PathGoal::Near { position, range } => (Some(position), range),
            PathGoal::Follow { entity, range } => {
                (self.entities.get(&entity).map(|e| e.position), range)
            }
        };

        let Some(target) = target else {
            self.pathing = false;
            self.move_intents.remove(&MoveDirection::Forward);
            return;
        };

        let dist = self.position.distance(target);
        if dist <= range {
            self.pathing = false;
            self.move_intents.remove(&MoveDirection::Forward);
            if matches!(goal, PathGoal::Near { .. }) {
                self.path_goal = None;
            }
            return;
        }

        if self.path_blocked {
            tracing::debug!("sim navigator: no path, dropping goal");
            self.path_goal = None;
            self.pathing = false;
            self.move_intents.remove(&MoveDirection::Forward);
            return;
        }

        self.pathing = true;
        self.move_intents.insert(MoveDirection::Forward);
        self.advance_towards(target, budget.min(dist));
    }

    fn step_direct(&mut self, budget: f64) {
        if !self.move_intents.contains(&MoveDirection::Forward) || self.path_blocked {
            return;
        }
        let Some(facing) = self.facing else {
            return;
        };
        let dist = self.position.distance(facing);
        if dist <= 0.5 {
            return;
        }
        self.advance_towards(facing, budget.min(dist - 0.5));
    }

    fn advance_towards(&mut self, target: Vec3, step: f64) {
        let delta = target - self.position;
        let len = delta.length();
        if len <= f64::EPSILON || step <= 0.0 {
            return;
        }
        self.position = self.position + delta * (step / len);
    }

    fn snapshot(id: EntityId, entity: &SimEntity) -> EntitySnapshot {
        EntitySnapshot {
            id,
            name: entity.name.clone(),
            kind: entity.kind,
            position: entity.position,
            health: entity.health,
        }
    }
}

impl WorldView for SimWorld {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn position(&self) -> Option<Vec3> {
        self.connected.then_some(self.position)
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn food(&self) -> f32 {
        self.food
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.entities.get(&id).map(|e| Self::snapshot(id, e))
    }

    fn player(&self, name: &str) -> Option<EntitySnapshot> {
        self.entities
            .iter()
            .find(|(_, e)| e.kind == EntityKind::Player && e.name == name)
            .map(|(id, e)| Self::snapshot(*id, e))
    }

    fn nearest_hostile(&self, origin: Vec3, radius: f64) -> Option<EntitySnapshot> {
        let mut best: Option<(f64, EntitySnapshot)> = None;
        for (id, e) in &self.entities {
            if e.kind != EntityKind::Hostile || e.health <= 0.0 {
                continue;
            }
            let d = origin.distance(e.position);
            if d > radius {
                continue;
            }
            if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
                best = Some((d, Self::snapshot(*id, e)));
            }
        }
        best.map(|(_, e)| e)
    }

    fn is_known_block(&self, name: &str) -> bool {
        self.known_blocks.contains(name)
    }

    fn find_block(
        &self,
        name: &str,
        origin: Vec3,
        radius: f64,
        exclude: &[BlockPos],
    ) -> Option<BlockSnapshot> {
        let mut best: Option<(f64, BlockPos)> = None;
        for (pos, block) in &self.blocks {
            if block != name || exclude.contains(pos) {
                continue;
            }
            let d = origin.distance(pos.center());
            if d > radius {
                continue;
            }
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, *pos));
            }
        }
        best.map(|(_, position)| BlockSnapshot {
            position,
            name: name.to_string(),
        })
    }

    fn inventory(&self) -> Vec<ItemStack> {
        self.inventory.clone()
    }

    fn dig_status(&self) -> DigStatus {
        self.dig
    }
}

impl WorldMut for SimWorld {
    fn set_move_intent(&mut self, direction: MoveDirection, active: bool) {
        if active {
            self.move_intents.insert(direction);
        } else {
            self.move_intents.remove(&direction);
        }
    }

    fn clear_move_intents(&mut self) {
        self.move_intents.clear();
        self.intent_clears += 1;
    }

    fn face(&mut self, target: Vec3) {
        self.facing = Some(target);
    }

    fn attack(&mut self, entity: EntityId) {
        self.attacks.push(entity);
        let dead = match self.entities.get_mut(&entity) {
            Some(e) => {
                e.health -= self.attack_damage;
                e.health <= 0.0
            }
            None => false,
        };
        if dead {
            self.entities.remove(&entity);
        }
    }

    fn begin_dig(&mut self, block: BlockPos) -> DigStatus {
        if self.fail_digs > 0 {
            self.fail_digs -= 1;
            self.dig = DigStatus::Failed(block);
        } else if !self.blocks.contains_key(&block)
            || self.position.distance(block.center()) > DIG_REACH
        {
            self.dig = DigStatus::Failed(block);
        } else {
            self.dig = DigStatus::Digging(block);
            self.dig_remaining = self.dig_seconds;
        }
        self.dig
    }

    fn cancel_dig(&mut self) {
        self.dig = DigStatus::Idle;
        self.dig_remaining = 0.0;
    }

    fn toss(&mut self, item: &str, count: u32) -> bool {
        let Some(idx) = self.inventory.iter().position(|s| s.name == item) else {
            return false;
        };
        let stack = &mut self.inventory[idx];
        let tossed = count.min(stack.count);
        stack.count -= tossed;
        if stack.count == 0 {
            self.inventory.remove(idx);
        }
        self.tossed.push(ItemStack::new(item, tossed));
        true
    }
}

impl NavWorld for SimWorld {
    fn set_path_goal(&mut self, goal: PathGoal) {
        self.path_goal = Some(goal);
    }

    fn clear_path_goal(&mut self) {
        self.path_goal = None;
        if self.pathing {
            self.move_intents.remove(&MoveDirection::Forward);
        }
        self.pathing = false;
    }

    fn is_pathing(&self) -> bool {
        self.pathing
    }
}
