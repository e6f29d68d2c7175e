use mcbot_core::{
    halt_intents, Behavior, BehaviorKind, BehaviorSpec, BehaviorStatus, BlockPos, DigStatus,
    Lifecycle, MineOptions, NavWorld, Outcome, PathGoal, TickContext,
};

use crate::progress::{attempts_exhausted, StallDetector};

#[derive(Debug, Clone, Copy, PartialEq)]
enum MineState {
    /// Pick the next block.
    Starting,
    Moving { block: BlockPos },
    Digging { block: BlockPos },
    Backoff { block: BlockPos, until: f64 },
}

/// Mine `quantity` blocks of one type, walking to each in turn.
///
/// Stalled movement goes back to `Starting` (bounded by `max_attempts`); failed digs are retried
/// after `dig_backoff` seconds (bounded by `max_dig_retries`). Running out of blocks within the
/// search radius ends the behavior as `Exhausted`.
#[derive(Debug)]
pub struct MineBlockBehavior {
    options: MineOptions,
    lifecycle: Lifecycle,
    state: MineState,
    remaining: u32,
    mined: u32,
    attempts: u32,
    dig_failures: u32,
    skipped: Vec<BlockPos>,
    stall: StallDetector,
}

impl MineBlockBehavior {
    pub fn new(options: MineOptions) -> Self {
        let remaining = options.quantity;
        let stall = StallDetector::new(options.stall_seconds);
        Self {
            options,
            lifecycle: Lifecycle::Fresh,
            state: MineState::Starting,
            remaining,
            mined: 0,
            attempts: 0,
            dig_failures: 0,
            skipped: Vec::new(),
            stall,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn mined(&self) -> u32 {
        self.mined
    }

    /// Block currently being walked to or dug, if any.
    pub fn current_block(&self) -> Option<BlockPos> {
        match self.state {
            MineState::Starting => None,
            MineState::Moving { block }
            | MineState::Digging { block }
            | MineState::Backoff { block, .. } => Some(block),
        }
    }

    fn finish<W: NavWorld>(&mut self, world: &mut W, outcome: Outcome) -> BehaviorStatus {
        halt_intents(world);
        self.lifecycle = Lifecycle::Done;
        tracing::info!(
            block = %self.options.block,
            mined = self.mined,
            outcome = %outcome,
            "mining finished"
        );
        BehaviorStatus::Done(outcome)
    }

    fn begin_dig<W: NavWorld>(&mut self, world: &mut W, block: BlockPos) {
        world.clear_path_goal();
        world.clear_move_intents();
        world.face(block.center());
        world.begin_dig(block);
        self.state = MineState::Digging { block };
    }

    fn tick_starting<W: NavWorld>(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus {
        if self.remaining == 0 {
            return self.finish(world, Outcome::Completed);
        }
        let Some(pos) = world.position() else {
            return BehaviorStatus::Running;
        };

        let found = world.find_block(
            &self.options.block,
            pos,
            self.options.search_radius,
            &self.skipped,
        );
        let Some(found) = found else {
            return self.finish(world, Outcome::Exhausted);
        };

        let block = found.position;
        let dist = pos.distance(block.center());
        if dist <= self.options.reach {
            self.begin_dig(world, block);
        } else {
            world.set_path_goal(PathGoal::Near {
                position: block.center(),
                range: (self.options.reach - 0.5).max(0.5),
            });
            self.stall.reset(ctx.seconds(), dist);
            self.state = MineState::Moving { block };
        }
        BehaviorStatus::Running
    }

    fn tick_moving<W: NavWorld>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        block: BlockPos,
    ) -> BehaviorStatus {
        let Some(pos) = world.position() else {
            return BehaviorStatus::Running;
        };
        let dist = pos.distance(block.center());
        if dist <= self.options.reach {
            self.begin_dig(world, block);
            return BehaviorStatus::Running;
        }

        if self.stall.observe(ctx.seconds(), dist, world.is_pathing()) {
            self.attempts += 1;
            world.clear_path_goal();
            tracing::debug!(attempts = self.attempts, ?block, "mining movement stalled");
            if attempts_exhausted(self.attempts, self.options.max_attempts) {
                return self.finish(world, Outcome::Failed("movement stalled".to_string()));
            }
            // Treat the block as unreachable and look for another one.
            self.skipped.push(block);
            self.state = MineState::Starting;
        }
        BehaviorStatus::Running
    }

    fn record_mined(&mut self, block: BlockPos) {
        self.remaining = self.remaining.saturating_sub(1);
        self.mined += 1;
        self.dig_failures = 0;
        self.attempts = 0;
        self.state = MineState::Starting;
        tracing::debug!(remaining = self.remaining, ?block, "block mined");
    }

    fn tick_digging<W: NavWorld>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        block: BlockPos,
    ) -> BehaviorStatus {
        match world.dig_status() {
            DigStatus::Digging(_) => BehaviorStatus::Running,
            DigStatus::Finished(done) if done == block => {
                self.record_mined(block);
                if self.remaining == 0 {
                    return self.finish(world, Outcome::Completed);
                }
                BehaviorStatus::Running
            }
            DigStatus::Failed(_) => {
                self.dig_failures += 1;
                if self.dig_failures > self.options.max_dig_retries {
                    return self.finish(
                        world,
                        Outcome::PreconditionFailed(format!(
                            "cannot dig {} at {:?}",
                            self.options.block, block
                        )),
                    );
                }
                let until = ctx.seconds() + self.options.dig_backoff.max(0.0) as f64;
                tracing::debug!(failures = self.dig_failures, ?block, "dig failed, backing off");
                self.state = MineState::Backoff { block, until };
                BehaviorStatus::Running
            }
            // Dig slot was reset underneath us (pause, external cancel): ask again.
            DigStatus::Idle | DigStatus::Finished(_) => {
                self.begin_dig(world, block);
                BehaviorStatus::Running
            }
        }
    }
}

impl<W> Behavior<W> for MineBlockBehavior
where
    W: NavWorld + 'static,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::MineBlock
    }

    fn options(&self) -> BehaviorSpec {
        BehaviorSpec::MineBlock(self.options.clone())
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn target(&self) -> Option<String> {
        Some(format!("{} ({} left)", self.options.block, self.remaining))
    }

    fn start(&mut self, _ctx: &TickContext, world: &mut W) -> bool {
        if self.lifecycle != Lifecycle::Fresh {
            return false;
        }
        if self.options.block.is_empty() || !world.is_known_block(&self.options.block) {
            tracing::warn!(block = %self.options.block, "unknown block type");
            self.lifecycle = Lifecycle::Done;
            return false;
        }
        self.lifecycle.try_start()
    }

    fn tick(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus {
        if !self.lifecycle.is_running() {
            return BehaviorStatus::Running;
        }
        match self.state {
            MineState::Starting => self.tick_starting(ctx, world),
            MineState::Moving { block } => self.tick_moving(ctx, world, block),
            MineState::Digging { block } => self.tick_digging(ctx, world, block),
            MineState::Backoff { block, until } => {
                if ctx.seconds() >= until {
                    self.begin_dig(world, block);
                }
                BehaviorStatus::Running
            }
        }
    }

    fn pause(&mut self, world: &mut W) {
        if !self.lifecycle.try_pause() {
            return;
        }
        // A dig that finished since the last tick still counts.
        if let MineState::Digging { block } = self.state {
            if world.dig_status() == DigStatus::Finished(block) {
                self.record_mined(block);
            }
        }
        halt_intents(world);
    }

    fn resume(&mut self, ctx: &TickContext, world: &mut W) -> bool {
        if !self.lifecycle.try_resume() {
            return false;
        }
        match self.state {
            MineState::Moving { block } => {
                world.set_path_goal(PathGoal::Near {
                    position: block.center(),
                    range: (self.options.reach - 0.5).max(0.5),
                });
                let dist = world
                    .position()
                    .map_or(f64::INFINITY, |p| p.distance(block.center()));
                self.stall.reset(ctx.seconds(), dist);
            }
            MineState::Digging { block } => self.begin_dig(world, block),
            MineState::Starting | MineState::Backoff { .. } => {}
        }
        true
    }

    fn stop(&mut self, world: &mut W) {
        if self.lifecycle.try_stop() {
            halt_intents(world);
        }
    }
}
