use core::fmt;

use crate::{BehaviorKind, BehaviorSpec, NavWorld, TickContext};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of one behavior activation. Never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a behavior ended on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "outcome", content = "reason", rename_all = "snake_case"))]
pub enum Outcome {
    /// The requested work is done.
    Completed,
    /// Nothing left to do within the configured search space.
    Exhausted,
    /// The target could not be resolved.
    PreconditionFailed(String),
    /// Retries were used up.
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed | Outcome::Exhausted)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => f.write_str("completed"),
            Outcome::Exhausted => f.write_str("exhausted"),
            Outcome::PreconditionFailed(reason) => write!(f, "precondition failed: {reason}"),
            Outcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BehaviorStatus {
    Running,
    Done(Outcome),
}

impl BehaviorStatus {
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            BehaviorStatus::Running => None,
            BehaviorStatus::Done(outcome) => Some(outcome),
        }
    }
}

/// Lifecycle shared by every behavior.
///
/// Transitions: `Fresh -> Running <-> Paused`, and any state `-> Done`. Instances are single-use:
/// nothing leaves `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Lifecycle {
    #[default]
    Fresh,
    Running,
    Paused,
    Done,
}

impl Lifecycle {
    pub fn try_start(&mut self) -> bool {
        if *self != Lifecycle::Fresh {
            return false;
        }
        *self = Lifecycle::Running;
        true
    }

    pub fn try_pause(&mut self) -> bool {
        if *self != Lifecycle::Running {
            return false;
        }
        *self = Lifecycle::Paused;
        true
    }

    pub fn try_resume(&mut self) -> bool {
        if *self != Lifecycle::Paused {
            return false;
        }
        *self = Lifecycle::Running;
        true
    }

    /// Returns false when already `Done`, so callers can skip duplicate side effects.
    pub fn try_stop(&mut self) -> bool {
        if *self == Lifecycle::Done {
            return false;
        }
        *self = Lifecycle::Done;
        true
    }

    pub fn is_running(self) -> bool {
        self == Lifecycle::Running
    }
}

/// Withdraw every outgoing intent: movement, path goal, digging.
pub fn halt_intents<W: NavWorld>(world: &mut W) {
    world.clear_move_intents();
    world.clear_path_goal();
    world.cancel_dig();
}

/// A cancellable, pausable unit of work driving the agent's body.
///
/// Only the scheduler calls these methods, and only the behavior in the active slot is ticked.
/// `tick` doubles as the completion signal: the first `Done` it returns is final.
pub trait Behavior<W>: 'static
where
    W: NavWorld + 'static,
{
    fn kind(&self) -> BehaviorKind;

    /// The immutable configuration this instance was built with.
    fn options(&self) -> BehaviorSpec;

    fn lifecycle(&self) -> Lifecycle;

    fn is_running(&self) -> bool {
        self.lifecycle().is_running()
    }

    /// Current target for status reports. Defaults to the options' label.
    fn target(&self) -> Option<String> {
        self.options().target_label()
    }

    /// Begin the activity. Returns false (without side effects) unless the instance is fresh and
    /// its preconditions hold.
    fn start(&mut self, ctx: &TickContext, world: &mut W) -> bool;

    fn tick(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus;

    /// Stop issuing intents but keep all progress.
    fn pause(&mut self, world: &mut W);

    /// Continue after `pause`. Returns false if the instance was not paused.
    fn resume(&mut self, ctx: &TickContext, world: &mut W) -> bool;

    /// Halt all intents and become terminal. No-op when already stopped.
    fn stop(&mut self, world: &mut W);

    /// Advisory veto on top of the numeric priority order.
    fn can_be_interrupted_by(&self, _other: BehaviorKind) -> bool {
        true
    }
}

/// Build runtime behaviors from their specs.
pub trait BehaviorFactory<W>: 'static
where
    W: NavWorld + 'static,
{
    fn build(&self, spec: &BehaviorSpec) -> Box<dyn Behavior<W>>;
}
