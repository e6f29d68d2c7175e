use std::collections::BTreeMap;

use mcbot_core::BehaviorKind;
use serde::Serialize;

use crate::SchedulerError;

/// Highest (weakest) priority an operator may assign.
pub const MAX_PRIORITY: i32 = 1000;

/// Behavior kind to priority. Lower values win; ties are allowed and never preempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PriorityTable {
    values: BTreeMap<BehaviorKind, i32>,
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self {
            values: BehaviorKind::ALL
                .iter()
                .map(|kind| (*kind, kind.default_priority()))
                .collect(),
        }
    }
}

impl PriorityTable {
    /// Canonical table with `overrides` applied on top. Every override must be within
    /// `0..=MAX_PRIORITY`.
    pub fn with_overrides(overrides: &BTreeMap<BehaviorKind, i32>) -> Result<Self, SchedulerError> {
        let mut table = Self::default();
        for (kind, value) in overrides {
            table.set(*kind, *value)?;
        }
        Ok(table)
    }

    /// Like [`with_overrides`](Self::with_overrides), but out-of-range entries keep their
    /// canonical value and are logged.
    pub fn with_valid_overrides(overrides: &BTreeMap<BehaviorKind, i32>) -> Self {
        let mut table = Self::default();
        for (kind, value) in overrides {
            if let Err(err) = table.set(*kind, *value) {
                tracing::warn!(%err, "ignoring priority override");
            }
        }
        table
    }

    pub fn get(&self, kind: BehaviorKind) -> i32 {
        self.values
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_priority())
    }

    pub fn set(&mut self, kind: BehaviorKind, value: i32) -> Result<i32, SchedulerError> {
        if !(0..=MAX_PRIORITY).contains(&value) {
            return Err(SchedulerError::InvalidPriority {
                kind,
                value,
                max: MAX_PRIORITY,
            });
        }
        Ok(self.values.insert(kind, value).unwrap_or(kind.default_priority()))
    }

    /// Whether `challenger` is strictly stronger than `incumbent`.
    pub fn outranks(&self, challenger: BehaviorKind, incumbent: BehaviorKind) -> bool {
        self.get(challenger) < self.get(incumbent)
    }

    /// Entries ordered strongest first, ties broken by kind.
    pub fn ranked(&self) -> Vec<(BehaviorKind, i32)> {
        let mut entries: Vec<_> = self.values.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(kind, value)| (*value, *kind));
        entries
    }
}
