/// The one place player progress lives. Screens receive it by `&mut`
/// instead of keeping their own copies of coins and points.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::schema::story::StoryId;

/// Coins earned per ten points.
pub const COINS_PER_TEN_POINTS: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub name: String,
    pub points: u32,
    pub coins: u32,
    pub stories_completed: u32,
    pub games_played: u32,
    pub experiments_run: u32,
    /// Best score per story.
    #[serde(skip)]
    best_scores: FxHashMap<StoryId, u32>,
}

impl PlayerProfile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn award(&mut self, points: u32) {
        self.points = self.points.saturating_add(points);
        self.coins = self
            .coins
            .saturating_add(points / 10 * COINS_PER_TEN_POINTS);
    }

    /// Record a finished story. Returns true for a new personal best.
    pub fn record_story(&mut self, story: StoryId, score: u32) -> bool {
        self.stories_completed += 1;
        self.award(score);
        match self.best_scores.get(&story) {
            Some(&best) if best >= score => false,
            _ => {
                self.best_scores.insert(story, score);
                true
            }
        }
    }

    pub fn record_game(&mut self, score: u32) {
        self.games_played += 1;
        self.award(score);
    }

    pub fn record_experiment(&mut self) {
        self.experiments_run += 1;
    }

    pub fn record_achievement(&mut self, points: u32) {
        self.award(points);
    }

    pub fn best_score(&self, story: StoryId) -> Option<u32> {
        self.best_scores.get(&story).copied()
    }

    /// Distinct stories finished at least once.
    pub fn distinct_stories(&self) -> usize {
        self.best_scores.len()
    }
}
