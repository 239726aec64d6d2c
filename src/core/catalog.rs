/// Content catalog: loads stories, experiments and achievements from RON
/// and validates them before anything can be played.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::core::template::{Template, TemplateError};
use crate::schema::achievement::Achievement;
use crate::schema::parameter::Experiment;
use crate::schema::scene::SceneId;
use crate::schema::story::{Story, StoryDefect, StoryId, UnknownStoryId};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("story {story}: {defect}")]
    Story { story: StoryId, defect: StoryDefect },
    #[error("story {story} scene {scene}: {source}")]
    Text {
        story: StoryId,
        scene: SceneId,
        source: TemplateError,
    },
    #[error("story {0} is defined more than once")]
    DuplicateStory(StoryId),
    #[error("experiment '{0}' is defined more than once")]
    DuplicateExperiment(String),
    #[error("experiment '{experiment}': parameter '{parameter}' is malformed or duplicated")]
    Parameter {
        experiment: String,
        parameter: String,
    },
    #[error("achievement '{0}' is defined more than once")]
    DuplicateAchievement(String),
    #[error("achievement '{0}' needs a max_progress of at least 1")]
    ZeroProgress(String),
}

/// Lookup failures. Callers decide what to show; nothing falls back to a
/// default story.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error(transparent)]
    UnknownStoryId(#[from] UnknownStoryId),
    #[error("story {0} is not in the catalog")]
    StoryNotFound(StoryId),
    #[error("experiment '{0}' is not in the catalog")]
    ExperimentNotFound(String),
}

/// The on-disk shape of a content file. Any section may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPack {
    #[serde(default)]
    pub stories: Vec<Story>,
    #[serde(default)]
    pub experiments: Vec<Experiment>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

impl ContentPack {
    pub fn load_from_ron(path: &Path) -> Result<ContentPack, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<ContentPack, ContentError> {
        Ok(ron::from_str(input)?)
    }

    /// Append another pack's content.
    pub fn merge(&mut self, other: ContentPack) {
        self.stories.extend(other.stories);
        self.experiments.extend(other.experiments);
        self.achievements.extend(other.achievements);
    }
}

/// Validated, immutable content. Built via `Catalog::builder()`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    stories: FxHashMap<StoryId, Arc<Story>>,
    experiments: Vec<Experiment>,
    achievements: Vec<Achievement>,
}

/// Builder for constructing a `Catalog`.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    content_dirs: Vec<String>,
    content_files: Vec<String>,
    /// Directly provided content (for tests and embedded builds).
    packs: Vec<ContentPack>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn story(&self, id: StoryId) -> Result<Arc<Story>, LibraryError> {
        self.stories
            .get(&id)
            .cloned()
            .ok_or(LibraryError::StoryNotFound(id))
    }

    /// Resolve a story from its presentation-layer key.
    pub fn resolve(&self, key: &str) -> Result<Arc<Story>, LibraryError> {
        let id: StoryId = key.parse()?;
        self.story(id)
    }

    /// All stories, ordered by id.
    pub fn stories(&self) -> Vec<Arc<Story>> {
        let mut stories: Vec<_> = self.stories.values().cloned().collect();
        stories.sort_by_key(|s| s.id);
        stories
    }

    pub fn experiment(&self, id: &str) -> Result<&Experiment, LibraryError> {
        self.experiments
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| LibraryError::ExperimentNotFound(id.to_string()))
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }
}

impl CatalogBuilder {
    /// Load every `.ron` file in a directory.
    pub fn content_dir(mut self, path: &str) -> Self {
        self.content_dirs.push(path.to_string());
        self
    }

    pub fn content_file(mut self, path: &str) -> Self {
        self.content_files.push(path.to_string());
        self
    }

    pub fn with_pack(mut self, pack: ContentPack) -> Self {
        self.packs.push(pack);
        self
    }

    pub fn with_stories(self, stories: Vec<Story>) -> Self {
        self.with_pack(ContentPack {
            stories,
            ..ContentPack::default()
        })
    }

    pub fn with_experiments(self, experiments: Vec<Experiment>) -> Self {
        self.with_pack(ContentPack {
            experiments,
            ..ContentPack::default()
        })
    }

    pub fn with_achievements(self, achievements: Vec<Achievement>) -> Self {
        self.with_pack(ContentPack {
            achievements,
            ..ContentPack::default()
        })
    }

    pub fn build(self) -> Result<Catalog, ContentError> {
        let mut content = ContentPack::default();
        for pack in self.packs {
            content.merge(pack);
        }

        for dir in &self.content_dirs {
            if Path::new(dir).exists() {
                load_ron_files_from_dir(dir, |path| {
                    content.merge(ContentPack::load_from_ron(path)?);
                    Ok(())
                })?;
            } else {
                log::warn!("content directory '{}' does not exist", dir);
            }
        }

        for file in &self.content_files {
            content.merge(ContentPack::load_from_ron(Path::new(file))?);
        }

        let mut stories = FxHashMap::default();
        for story in content.stories {
            validate_story(&story)?;
            let id = story.id;
            if stories.insert(id, Arc::new(story)).is_some() {
                return Err(ContentError::DuplicateStory(id));
            }
        }

        let mut experiment_ids = FxHashSet::default();
        for experiment in &content.experiments {
            if !experiment_ids.insert(experiment.id.as_str()) {
                return Err(ContentError::DuplicateExperiment(experiment.id.clone()));
            }
            let mut names = FxHashSet::default();
            for parameter in &experiment.parameters {
                if !parameter.is_well_formed() || !names.insert(parameter.name.as_str()) {
                    return Err(ContentError::Parameter {
                        experiment: experiment.id.clone(),
                        parameter: parameter.name.clone(),
                    });
                }
            }
        }

        let mut achievement_ids = FxHashSet::default();
        for achievement in &content.achievements {
            if !achievement_ids.insert(achievement.id.as_str()) {
                return Err(ContentError::DuplicateAchievement(achievement.id.clone()));
            }
            if achievement.max_progress == 0 {
                return Err(ContentError::ZeroProgress(achievement.id.clone()));
            }
        }

        log::debug!(
            "catalog loaded: {} stories, {} experiments, {} achievements",
            stories.len(),
            content.experiments.len(),
            content.achievements.len()
        );

        Ok(Catalog {
            stories,
            experiments: content.experiments,
            achievements: content.achievements,
        })
    }
}

/// Reject a story whose graph or text is broken.
pub fn validate_story(story: &Story) -> Result<(), ContentError> {
    if let Some(defect) = story.defects().into_iter().next() {
        return Err(ContentError::Story {
            story: story.id,
            defect,
        });
    }

    for scene in &story.scenes {
        let texts = std::iter::once(&scene.title)
            .chain(std::iter::once(&scene.body))
            .chain(scene.choices.iter().map(|c| &c.label));
        for text in texts {
            Template::parse(text)
                .and_then(|t| t.check_slots())
                .map_err(|source| ContentError::Text {
                    story: story.id,
                    scene: scene.id,
                    source,
                })?;
        }
    }

    Ok(())
}

/// Load all .ron files from a directory, calling `loader` for each.
fn load_ron_files_from_dir<F>(dir: &str, mut loader: F) -> Result<(), ContentError>
where
    F: FnMut(&Path) -> Result<(), ContentError>,
{
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            paths.push(path);
        }
    }
    // Stable load order keeps duplicate reports deterministic.
    paths.sort();
    for path in paths {
        loader(&path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACK: &str = r#"(
        stories: [
            (
                id: FarmerSarah,
                title: "Farmer Sarah's Tractor",
                difficulty: Easy,
                duration_minutes: 5,
                category: Farming,
                scenes: [
                    (
                        id: 0,
                        title: "Hi {player}!",
                        body: "The tractor stopped.",
                        choices: [
                            (label: "What's wrong with your GPS?", points: 10, next: 1),
                        ],
                    ),
                    (
                        id: 1,
                        title: "A solar storm",
                        body: "The Sun is busy.",
                        choices: [(label: "Wow!", points: 5, next: -1)],
                    ),
                ],
            ),
        ],
        experiments: [
            (
                id: "solar-wind",
                title: "Solar Wind",
                parameters: [
                    (name: "Solar Wind Speed", min: 300.0, max: 800.0, default: 400.0, unit: "km/s"),
                ],
                duration_ms: 3000,
            ),
        ],
        achievements: [
            (id: "mood-explorer", title: "Mood Explorer", max_progress: 1, points: 25),
        ],
    )"#;

    #[test]
    fn build_from_pack() {
        let catalog = Catalog::builder()
            .with_pack(ContentPack::parse_ron(PACK).unwrap())
            .build()
            .unwrap();
        assert_eq!(catalog.stories().len(), 1);
        assert_eq!(catalog.experiments().len(), 1);
        assert_eq!(catalog.achievements().len(), 1);
        assert!(catalog.experiment("solar-wind").is_ok());
    }

    #[test]
    fn resolve_by_key() {
        let catalog = Catalog::builder()
            .with_pack(ContentPack::parse_ron(PACK).unwrap())
            .build()
            .unwrap();
        let story = catalog.resolve("farmer-sarah").unwrap();
        assert_eq!(story.id, StoryId::FarmerSarah);
    }

    #[test]
    fn missing_story_is_not_replaced_by_default() {
        let catalog = Catalog::builder()
            .with_pack(ContentPack::parse_ron(PACK).unwrap())
            .build()
            .unwrap();
        assert_eq!(
            catalog.story(StoryId::PilotMaya).unwrap_err(),
            LibraryError::StoryNotFound(StoryId::PilotMaya)
        );
        assert!(matches!(
            catalog.resolve("nobody"),
            Err(LibraryError::UnknownStoryId(_))
        ));
    }

    #[test]
    fn broken_link_fails_build() {
        let broken = PACK.replace("points: 10, next: 1", "points: 10, next: 4");
        let result = Catalog::builder()
            .with_pack(ContentPack::parse_ron(&broken).unwrap())
            .build();
        assert!(matches!(
            result,
            Err(ContentError::Story {
                defect: StoryDefect::BrokenLink { .. },
                ..
            })
        ));
    }

    #[test]
    fn unknown_template_slot_fails_build() {
        let bad = PACK.replace("Hi {player}!", "Hi {pilot}!");
        let result = Catalog::builder()
            .with_pack(ContentPack::parse_ron(&bad).unwrap())
            .build();
        assert!(matches!(result, Err(ContentError::Text { .. })));
    }

    #[test]
    fn duplicate_story_fails_build() {
        let pack = ContentPack::parse_ron(PACK).unwrap();
        let result = Catalog::builder()
            .with_pack(pack.clone())
            .with_stories(pack.stories)
            .build();
        assert!(matches!(
            result,
            Err(ContentError::DuplicateStory(StoryId::FarmerSarah))
        ));
    }

    #[test]
    fn bad_parameter_range_fails_build() {
        let bad = PACK.replace("default: 400.0", "default: 950.0");
        let result = Catalog::builder()
            .with_pack(ContentPack::parse_ron(&bad).unwrap())
            .build();
        assert!(matches!(result, Err(ContentError::Parameter { .. })));
    }

    #[test]
    fn zero_progress_achievement_fails_build() {
        let bad = PACK.replace("max_progress: 1", "max_progress: 0");
        let result = Catalog::builder()
            .with_pack(ContentPack::parse_ron(&bad).unwrap())
            .build();
        assert!(matches!(result, Err(ContentError::ZeroProgress(_))));
    }

    #[test]
    fn missing_dir_is_skipped() {
        let catalog = Catalog::builder()
            .content_dir("does/not/exist")
            .build()
            .unwrap();
        assert!(catalog.stories().is_empty());
    }
}
