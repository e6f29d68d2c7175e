//! Engine-agnostic behavior primitives for a single autonomous agent.
//!
//! A [`Behavior`] is a cancellable, pausable unit of work that drives the agent's body through the
//! narrow capability traits in [`world`] and [`nav`]. The scheduler crate decides which behavior
//! owns the body; this crate only defines the contract and the vocabulary both sides share.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod behavior;
pub mod kind;
pub mod math;
pub mod nav;
pub mod options;
pub mod sim;
pub mod tick;
pub mod world;

pub use behavior::{
    halt_intents, Behavior, BehaviorFactory, BehaviorStatus, InstanceId, Lifecycle, Outcome,
};
pub use kind::BehaviorKind;
pub use math::{BlockPos, Vec3};
pub use nav::{NavWorld, PathGoal};
pub use options::{
    BehaviorSpec, CombatOptions, DropOptions, FollowOptions, GotoOptions, MineOptions,
    PatrolOptions,
};
pub use sim::SimWorld;
pub use tick::TickContext;
pub use world::{
    BlockSnapshot, DigStatus, EntityId, EntityKind, EntitySnapshot, ItemStack, MoveDirection,
    WorldMut, WorldView,
};
