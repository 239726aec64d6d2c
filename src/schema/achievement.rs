use serde::{Deserialize, Serialize};

/// A one-way unlockable milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub max_progress: u32,
    pub points: u32,
}

/// Runtime state of one achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AchievementState {
    pub progress: u32,
    pub unlocked: bool,
}
