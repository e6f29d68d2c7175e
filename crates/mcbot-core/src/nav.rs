use crate::{EntityId, Vec3, WorldMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathGoal {
    /// Get within `range` of a fixed point; the goal clears itself on arrival.
    Near { position: Vec3, range: f64 },
    /// Track a moving entity, staying within `range`. Stays set until cleared.
    Follow { entity: EntityId, range: f64 },
}

/// Boundary to the pathfinding subsystem.
///
/// Path search is not implemented here; behaviors only hand out goals and observe whether the
/// navigator is still working on one.
pub trait NavWorld: WorldMut {
    fn set_path_goal(&mut self, goal: PathGoal);

    fn clear_path_goal(&mut self);

    /// True while the navigator is actively moving towards a goal.
    fn is_pathing(&self) -> bool;
}
