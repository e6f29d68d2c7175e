//! Concrete behaviors built on `mcbot-core`.
//!
//! Each behavior is a small state machine ticked by the scheduler while it holds the active slot.
//! They only talk to the world through the capability traits and never block.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod combat;
pub mod drop_items;
pub mod factory;
pub mod follow;
pub mod goto;
pub mod idle;
pub mod mine;
pub mod patrol;
pub mod progress;

pub use combat::CombatBehavior;
pub use drop_items::DropItemsBehavior;
pub use factory::StandardFactory;
pub use follow::FollowPlayerBehavior;
pub use goto::GotoBehavior;
pub use idle::IdleBehavior;
pub use mine::MineBlockBehavior;
pub use patrol::PatrolBehavior;
pub use progress::StallDetector;
