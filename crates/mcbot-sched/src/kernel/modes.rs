use mcbot_core::MineOptions;
use serde::Serialize;

/// Standing modes. They survive disconnects and are only cleared by an explicit off command or by
/// the owning task losing its precondition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModeFlags {
    pub combat: bool,
    /// Player to follow while follow mode is on.
    pub follow: Option<String>,
    /// Mining request while mining mode is on.
    pub mining: Option<MineOptions>,
}

impl ModeFlags {
    pub fn follow_enabled(&self) -> bool {
        self.follow.is_some()
    }

    pub fn mining_enabled(&self) -> bool {
        self.mining.is_some()
    }
}
