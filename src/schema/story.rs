use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::scene::{NextScene, Scene, SceneId};

/// The closed set of stories the product ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoryId {
    FarmerSarah,
    PilotMaya,
    AstronautLeo,
}

impl StoryId {
    pub const ALL: [StoryId; 3] = [Self::FarmerSarah, Self::PilotMaya, Self::AstronautLeo];

    /// Kebab-case key used by the presentation layer and tools.
    pub fn key(&self) -> &'static str {
        match self {
            Self::FarmerSarah => "farmer-sarah",
            Self::PilotMaya => "pilot-maya",
            Self::AstronautLeo => "astronaut-leo",
        }
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown story id '{0}'")]
pub struct UnknownStoryId(pub String);

impl FromStr for StoryId {
    type Err = UnknownStoryId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.key() == s)
            .ok_or_else(|| UnknownStoryId(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Which everyday technology the story is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Farming,
    Aviation,
    SpaceTravel,
    PowerGrid,
    Communication,
}

/// A named, immutable collection of scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    pub category: Category,
    pub scenes: Vec<Scene>,
}

/// A structural problem in a story graph. Any of these makes the story
/// unplayable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryDefect {
    #[error("no entry scene (id 0)")]
    MissingEntry,
    #[error("scene id {0} is defined more than once")]
    DuplicateScene(SceneId),
    #[error("scene {scene} choice {choice} links to missing scene {target}")]
    BrokenLink {
        scene: SceneId,
        choice: usize,
        target: SceneId,
    },
    #[error("scene {0} has no choices")]
    NoChoices(SceneId),
    #[error("scene {scene} quiz answer {correct} is out of range ({options} options)")]
    QuizAnswerOutOfRange {
        scene: SceneId,
        correct: usize,
        options: usize,
    },
}

impl Story {
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn entry(&self) -> Option<&Scene> {
        self.scene(SceneId::ENTRY)
    }

    /// Check the graph invariants: an entry scene exists, ids are unique,
    /// every non-terminal link resolves, every scene offers a way forward
    /// and every quiz answer points at an option.
    pub fn defects(&self) -> Vec<StoryDefect> {
        let mut defects = Vec::new();
        let mut seen = FxHashSet::default();

        for scene in &self.scenes {
            if !seen.insert(scene.id) {
                defects.push(StoryDefect::DuplicateScene(scene.id));
            }
        }

        if !seen.contains(&SceneId::ENTRY) {
            defects.push(StoryDefect::MissingEntry);
        }

        for scene in &self.scenes {
            if scene.choices.is_empty() {
                defects.push(StoryDefect::NoChoices(scene.id));
            }
            for (i, choice) in scene.choices.iter().enumerate() {
                if let NextScene::Scene(target) = choice.next {
                    if !seen.contains(&target) {
                        defects.push(StoryDefect::BrokenLink {
                            scene: scene.id,
                            choice: i,
                            target,
                        });
                    }
                }
            }
            if let Some(quiz) = &scene.quiz {
                if quiz.correct >= quiz.options.len() {
                    defects.push(StoryDefect::QuizAnswerOutOfRange {
                        scene: scene.id,
                        correct: quiz.correct,
                        options: quiz.options.len(),
                    });
                }
            }
        }

        defects
    }

    /// Scenes that cannot be reached from the entry scene.
    pub fn unreachable_scenes(&self) -> Vec<SceneId> {
        let by_id: FxHashMap<SceneId, &Scene> = self.scenes.iter().map(|s| (s.id, s)).collect();
        let mut reached = FxHashSet::default();
        let mut stack = vec![SceneId::ENTRY];

        while let Some(id) = stack.pop() {
            if !reached.insert(id) {
                continue;
            }
            if let Some(scene) = by_id.get(&id) {
                stack.extend(scene.links().filter(|next| !reached.contains(next)));
            }
        }

        let mut missing: Vec<SceneId> = self
            .scenes
            .iter()
            .map(|s| s.id)
            .filter(|id| !reached.contains(id))
            .collect();
        missing.sort();
        missing
    }

    /// The largest total score any path through the story can earn
    /// (quiz bonuses excluded). `None` when the graph has a cycle.
    pub fn max_score(&self) -> Option<u32> {
        fn walk(
            story: &Story,
            id: SceneId,
            on_path: &mut FxHashSet<SceneId>,
            memo: &mut FxHashMap<SceneId, u32>,
        ) -> Option<u32> {
            if let Some(best) = memo.get(&id) {
                return Some(*best);
            }
            if !on_path.insert(id) {
                return None;
            }
            let scene = story.scene(id)?;
            let mut best = 0;
            for choice in &scene.choices {
                let rest = match choice.next {
                    NextScene::End => 0,
                    NextScene::Scene(next) => walk(story, next, on_path, memo)?,
                };
                best = best.max(choice.points.saturating_add(rest));
            }
            on_path.remove(&id);
            memo.insert(id, best);
            Some(best)
        }

        walk(
            self,
            SceneId::ENTRY,
            &mut FxHashSet::default(),
            &mut FxHashMap::default(),
        )
    }
}
