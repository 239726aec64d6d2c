/// One-way achievement unlocks driven by progress reports.

use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

use crate::core::cue::SoundCue;
use crate::core::notify::{Notification, Notifications};
use crate::core::session::QuizFeedback;
use crate::schema::achievement::{Achievement, AchievementState};

/// Counts quiz scenes answered correctly.
pub const QUIZ_WHIZ: &str = "quiz-whiz";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AchievementError {
    #[error("unknown achievement '{0}'")]
    Unknown(String),
}

/// Returned when a progress report unlocks an achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unlock {
    pub id: String,
    pub title: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub progress: u32,
    pub max_progress: u32,
    pub unlocked: bool,
    pub points: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AchievementTracker {
    definitions: Vec<Achievement>,
    states: FxHashMap<String, AchievementState>,
    notifications: Notifications,
}

impl AchievementTracker {
    pub fn new(definitions: &[Achievement]) -> Self {
        let states = definitions
            .iter()
            .map(|a| (a.id.clone(), AchievementState::default()))
            .collect();
        Self {
            definitions: definitions.to_vec(),
            states,
            notifications: Notifications::default(),
        }
    }

    fn definition(&self, id: &str) -> Result<&Achievement, AchievementError> {
        self.definitions
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| AchievementError::Unknown(id.to_string()))
    }

    pub fn state(&self, id: &str) -> Result<AchievementState, AchievementError> {
        self.states
            .get(id)
            .copied()
            .ok_or_else(|| AchievementError::Unknown(id.to_string()))
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.states.get(id).is_some_and(|s| s.unlocked)
    }

    /// Set progress to `value`. Unlocks when `value >= max_progress`; once
    /// unlocked, further reports change nothing.
    pub fn record_progress(&mut self, id: &str, value: u32) -> Result<Option<Unlock>, AchievementError> {
        let def = self.definition(id)?;
        let (max_progress, title, points) = (def.max_progress, def.title.clone(), def.points);

        let state = self
            .states
            .get_mut(id)
            .ok_or_else(|| AchievementError::Unknown(id.to_string()))?;
        if state.unlocked {
            return Ok(None);
        }

        state.progress = value.min(max_progress);
        if value < max_progress {
            return Ok(None);
        }

        state.unlocked = true;
        log::info!("achievement '{}' unlocked", id);
        self.notifications.push(Notification::AchievementUnlocked {
            id: id.to_string(),
            points,
        });
        self.notifications.cue(SoundCue::Celebrate);
        Ok(Some(Unlock {
            id: id.to_string(),
            title,
            points,
        }))
    }

    /// Add one to the current progress.
    pub fn increment(&mut self, id: &str) -> Result<Option<Unlock>, AchievementError> {
        let current = self.state(id)?.progress;
        self.record_progress(id, current.saturating_add(1))
    }

    /// Count a quiz answer toward `quiz-whiz`. Only an answer that earned
    /// the scene's bonus counts, so retries and repeats do not.
    pub fn record_quiz(&mut self, feedback: &QuizFeedback) -> Result<Option<Unlock>, AchievementError> {
        if feedback.bonus == 0 {
            return Ok(None);
        }
        self.increment(QUIZ_WHIZ)
    }

    /// Points earned from everything unlocked so far.
    pub fn unlocked_points(&self) -> u32 {
        self.definitions
            .iter()
            .filter(|a| self.is_unlocked(&a.id))
            .map(|a| a.points)
            .sum()
    }

    pub fn views(&self) -> Vec<AchievementView> {
        self.definitions
            .iter()
            .map(|a| {
                let state = self.states.get(&a.id).copied().unwrap_or_default();
                AchievementView {
                    id: a.id.clone(),
                    title: a.title.clone(),
                    description: a.description.clone(),
                    progress: state.progress,
                    max_progress: a.max_progress,
                    unlocked: state.unlocked,
                    points: a.points,
                }
            })
            .collect()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }
}
