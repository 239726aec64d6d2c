use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype wrapper for scene ids. Unique within one story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub u32);

impl SceneId {
    /// Every story enters at scene 0.
    pub const ENTRY: SceneId = SceneId(0);
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a choice leads.
///
/// Content files write the terminal sentinel as `-1` and scene links as
/// plain non-negative integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum NextScene {
    Scene(SceneId),
    End,
}

impl NextScene {
    /// The sentinel value used in content files for "story complete".
    pub const END_SENTINEL: i64 = -1;

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

impl TryFrom<i64> for NextScene {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw == Self::END_SENTINEL {
            return Ok(Self::End);
        }
        u32::try_from(raw)
            .map(|id| Self::Scene(SceneId(id)))
            .map_err(|_| format!("invalid next scene {}: expected -1 or a scene id", raw))
    }
}

impl From<NextScene> for i64 {
    fn from(next: NextScene) -> i64 {
        match next {
            NextScene::Scene(id) => i64::from(id.0),
            NextScene::End => NextScene::END_SENTINEL,
        }
    }
}

/// A labeled option on a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    #[serde(default)]
    pub points: u32,
    pub next: NextScene,
}

/// A multiple-choice question shown between scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub explanation: String,
}

impl Quiz {
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }
}

/// Opaque mini-game identifier, interpreted by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MiniGameRef(pub String);

/// One node of a story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    /// Title template; may contain `{player}`.
    pub title: String,
    /// Body template; may contain `{player}`.
    pub body: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
    #[serde(default)]
    pub mini_game: Option<MiniGameRef>,
}

impl Scene {
    /// Whether entering this scene must block on a quiz or mini-game.
    pub fn needs_interstitial(&self) -> bool {
        self.quiz.is_some() || self.mini_game.is_some()
    }

    /// Scene ids this scene links to (terminal choices excluded).
    pub fn links(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.choices.iter().filter_map(|c| match c.next {
            NextScene::Scene(id) => Some(id),
            NextScene::End => None,
        })
    }
}
