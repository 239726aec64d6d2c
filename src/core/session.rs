/// Narrative sessions: one player's traversal of a story graph.
///
/// A session starts at scene 0, adds each choice's points to a running
/// score, and blocks on quiz / mini-game scenes until the presentation
/// layer dismisses the interstitial. Reaching a terminal choice completes
/// the session for good.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::core::cue::SoundCue;
use crate::core::notify::{Interstitial, Notification, Notifications};
use crate::core::template::{interpolate, TemplateError};
use crate::schema::scene::{NextScene, Scene, SceneId};
use crate::schema::story::{Story, StoryId};

/// Bonus for the first correct quiz answer on a scene.
pub const QUIZ_BONUS_POINTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("story {0} has no entry scene")]
    MissingEntry(StoryId),
    #[error("session has not started")]
    NotStarted,
    #[error("choice {index} is out of range for scene {scene} ({available} choices)")]
    InvalidChoice {
        scene: SceneId,
        index: usize,
        available: usize,
    },
    #[error("scene {scene} links to unknown scene {target}")]
    UnknownScene { scene: SceneId, target: SceneId },
    #[error("scene {0} is waiting for its interstitial to be dismissed")]
    InterstitialPending(SceneId),
    #[error("no interstitial is pending")]
    NoInterstitial,
    #[error("the pending interstitial is not a {0}")]
    WrongInterstitial(&'static str),
    #[error("quiz option {index} is out of range ({available} options)")]
    InvalidAnswer { index: usize, available: usize },
    #[error("bonus already awarded for scene {0}")]
    BonusAlreadyAwarded(SceneId),
    #[error("story already completed")]
    AlreadyCompleted,
    #[error("scene text error: {0}")]
    Template(#[from] TemplateError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionState {
    NotStarted,
    Playing,
    Interstitial(Interstitial),
    Completed { final_score: u32 },
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Playing => "playing",
            Self::Interstitial(_) => "interstitial",
            Self::Completed { .. } => "completed",
        }
    }
}

/// What a successful `choose` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    Advanced { scene: SceneId },
    InterstitialRequired(Interstitial),
    Completed { final_score: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizFeedback {
    pub correct: bool,
    pub explanation: String,
    pub bonus: u32,
}

/// Presentation-facing view of a session. Quiz answers are withheld.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub story: String,
    pub story_title: String,
    pub scene: u32,
    pub title: String,
    pub body: String,
    pub choices: Vec<String>,
    pub facts: Vec<String>,
    pub quiz: Option<QuizView>,
    pub mini_game: Option<String>,
    pub state: &'static str,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizView {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NarrativeSession {
    story: Arc<Story>,
    /// Index into `story.scenes`; always valid.
    current: usize,
    score: u32,
    state: SessionState,
    visited: Vec<(SceneId, usize)>,
    bonus_awarded: bool,
    notifications: Notifications,
}

impl NarrativeSession {
    /// Create a session positioned on the entry scene, not yet started.
    pub fn new(story: Arc<Story>) -> Result<Self, SessionError> {
        let current = story
            .scenes
            .iter()
            .position(|s| s.id == SceneId::ENTRY)
            .ok_or(SessionError::MissingEntry(story.id))?;

        Ok(Self {
            story,
            current,
            score: 0,
            state: SessionState::NotStarted,
            visited: Vec::new(),
            bonus_awarded: false,
            notifications: Notifications::default(),
        })
    }

    /// Create and begin a session in one step.
    pub fn start(story: Arc<Story>) -> Result<Self, SessionError> {
        let mut session = Self::new(story)?;
        session.begin()?;
        Ok(session)
    }

    /// Move from `NotStarted` into play. The entry scene may itself
    /// require an interstitial.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::NotStarted {
            return Ok(());
        }
        self.enter(self.current);
        Ok(())
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_scene_id(&self) -> SceneId {
        self.current_scene().id
    }

    pub fn current_scene(&self) -> &Scene {
        &self.story.scenes[self.current]
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, SessionState::Completed { .. })
    }

    /// `(scene, choice index)` pairs taken so far.
    pub fn visited(&self) -> &[(SceneId, usize)] {
        &self.visited
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    /// Take choice `index` on the current scene.
    ///
    /// Errors leave the session untouched.
    pub fn choose(&mut self, index: usize) -> Result<ChoiceOutcome, SessionError> {
        match &self.state {
            SessionState::NotStarted => return Err(SessionError::NotStarted),
            SessionState::Completed { .. } => return Err(SessionError::AlreadyCompleted),
            SessionState::Interstitial(pending) => {
                return Err(SessionError::InterstitialPending(pending.scene()))
            }
            SessionState::Playing => {}
        }

        let scene = self.current_scene();
        let choice = scene
            .choices
            .get(index)
            .ok_or(SessionError::InvalidChoice {
                scene: scene.id,
                index,
                available: scene.choices.len(),
            })?;

        let target = match choice.next {
            NextScene::End => None,
            NextScene::Scene(target) => Some(
                self.story
                    .scenes
                    .iter()
                    .position(|s| s.id == target)
                    .ok_or(SessionError::UnknownScene {
                        scene: scene.id,
                        target,
                    })?,
            ),
        };

        let scene_id = scene.id;
        let points = choice.points;
        self.visited.push((scene_id, index));
        self.score = self.score.saturating_add(points);
        self.notifications.cue(SoundCue::Click);

        match target {
            None => {
                let final_score = self.score;
                self.state = SessionState::Completed { final_score };
                log::info!("story {} completed with score {}", self.story.id, final_score);
                self.notifications.push(Notification::StoryCompleted {
                    story: self.story.id,
                    score: final_score,
                });
                self.notifications.cue(SoundCue::Celebrate);
                Ok(ChoiceOutcome::Completed { final_score })
            }
            Some(next) => Ok(match self.enter(next) {
                Some(interstitial) => ChoiceOutcome::InterstitialRequired(interstitial),
                None => ChoiceOutcome::Advanced {
                    scene: self.current_scene_id(),
                },
            }),
        }
    }

    fn enter(&mut self, index: usize) -> Option<Interstitial> {
        self.current = index;
        self.bonus_awarded = false;
        let scene = &self.story.scenes[index];
        if !scene.needs_interstitial() {
            self.state = SessionState::Playing;
            return None;
        }

        // A quiz wins over a mini-game on the same scene.
        let pending = match (&scene.quiz, &scene.mini_game) {
            (None, Some(game)) => Interstitial::MiniGame {
                scene: scene.id,
                game: game.clone(),
            },
            _ => Interstitial::Quiz { scene: scene.id },
        };
        self.state = SessionState::Interstitial(pending.clone());
        self.notifications
            .push(Notification::InterstitialRequired(pending.clone()));
        Some(pending)
    }

    /// Check an answer to the pending quiz. The first correct answer earns
    /// `QUIZ_BONUS_POINTS`; wrong answers may be retried.
    pub fn answer_quiz(&mut self, option: usize) -> Result<QuizFeedback, SessionError> {
        let scene_id = match &self.state {
            SessionState::Interstitial(Interstitial::Quiz { scene }) => *scene,
            SessionState::Interstitial(_) => return Err(SessionError::WrongInterstitial("quiz")),
            _ => return Err(SessionError::NoInterstitial),
        };
        let quiz = self
            .current_scene()
            .quiz
            .as_ref()
            .ok_or(SessionError::WrongInterstitial("quiz"))?;
        if option >= quiz.options.len() {
            return Err(SessionError::InvalidAnswer {
                index: option,
                available: quiz.options.len(),
            });
        }

        let correct = quiz.is_correct(option);
        let explanation = quiz.explanation.clone();
        let bonus = if correct && !self.bonus_awarded {
            QUIZ_BONUS_POINTS
        } else {
            0
        };

        if correct {
            self.bonus_awarded = true;
            self.score = self.score.saturating_add(bonus);
            self.notifications.cue(SoundCue::Success);
        } else {
            log::debug!("wrong quiz answer {} on scene {}", option, scene_id);
            self.notifications.cue(SoundCue::Wrong);
        }

        Ok(QuizFeedback {
            correct,
            explanation,
            bonus,
        })
    }

    /// Add a mini-game result to the story score, once per scene. The
    /// score saturates rather than wrapping.
    pub fn award_mini_game(&mut self, points: u32) -> Result<(), SessionError> {
        let scene = match &self.state {
            SessionState::Interstitial(Interstitial::MiniGame { scene, .. }) => *scene,
            SessionState::Interstitial(_) => {
                return Err(SessionError::WrongInterstitial("mini-game"))
            }
            _ => return Err(SessionError::NoInterstitial),
        };
        if self.bonus_awarded {
            return Err(SessionError::BonusAlreadyAwarded(scene));
        }
        self.bonus_awarded = true;
        self.score = self.score.saturating_add(points);
        Ok(())
    }

    /// The presentation layer finished the quiz or mini-game.
    pub fn dismiss_interstitial(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Interstitial(_) => {
                self.state = SessionState::Playing;
                Ok(())
            }
            _ => Err(SessionError::NoInterstitial),
        }
    }

    pub fn render_title(&self, player: &str) -> Result<String, SessionError> {
        Ok(interpolate(&self.current_scene().title, player)?)
    }

    pub fn render_body(&self, player: &str) -> Result<String, SessionError> {
        Ok(interpolate(&self.current_scene().body, player)?)
    }

    pub fn snapshot(&self, player: &str) -> Result<SessionSnapshot, SessionError> {
        let scene = self.current_scene();
        Ok(SessionSnapshot {
            story: self.story.id.key().to_string(),
            story_title: self.story.title.clone(),
            scene: scene.id.0,
            title: self.render_title(player)?,
            body: self.render_body(player)?,
            choices: scene
                .choices
                .iter()
                .map(|c| interpolate(&c.label, player))
                .collect::<Result<_, _>>()?,
            facts: scene.facts.clone(),
            quiz: scene.quiz.as_ref().map(|q| QuizView {
                question: q.question.clone(),
                options: q.options.clone(),
            }),
            mini_game: scene.mini_game.as_ref().map(|g| g.0.clone()),
            state: self.state.label(),
            score: self.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::scene::{Choice, MiniGameRef, Quiz};
    use crate::schema::story::{Category, Difficulty};

    fn choice(label: &str, points: u32, next: i64) -> Choice {
        Choice {
            label: label.to_string(),
            points,
            next: NextScene::try_from(next).unwrap(),
        }
    }

    fn scene(id: u32, choices: Vec<Choice>) -> Scene {
        Scene {
            id: SceneId(id),
            title: format!("Scene {}", id),
            body: "Hello {player}".to_string(),
            choices,
            facts: Vec::new(),
            quiz: None,
            mini_game: None,
        }
    }

    fn test_story() -> Arc<Story> {
        let mut quiz_scene = scene(2, vec![choice("Finish", 5, -1)]);
        quiz_scene.quiz = Some(Quiz {
            question: "Where do auroras come from?".to_string(),
            options: vec!["The Moon".to_string(), "The Sun".to_string()],
            correct: 1,
            explanation: "Solar wind particles hit our atmosphere.".to_string(),
        });
        let mut game_scene = scene(3, vec![choice("Done", 0, -1)]);
        game_scene.mini_game = Some(MiniGameRef("catch-particles".to_string()));

        Arc::new(Story {
            id: StoryId::FarmerSarah,
            title: "Farmer Sarah".to_string(),
            summary: String::new(),
            difficulty: Difficulty::Easy,
            duration_minutes: 5,
            category: Category::Farming,
            scenes: vec![
                scene(
                    0,
                    vec![
                        choice("What's wrong with your GPS?", 10, 1),
                        choice("Go to the quiz", 3, 2),
                        choice("Play a game", 1, 3),
                    ],
                ),
                scene(1, vec![choice("Thanks!", 15, -1), choice("Broken", 0, 9)]),
                quiz_scene,
                game_scene,
            ],
        })
    }

    #[test]
    fn start_at_entry_with_zero_score() {
        let session = NarrativeSession::start(test_story()).unwrap();
        assert_eq!(session.current_scene_id(), SceneId(0));
        assert_eq!(session.score(), 0);
        assert_eq!(session.state(), &SessionState::Playing);
    }

    #[test]
    fn start_requires_entry_scene() {
        let mut story = (*test_story()).clone();
        story.scenes.remove(0);
        assert_eq!(
            NarrativeSession::start(Arc::new(story)).unwrap_err(),
            SessionError::MissingEntry(StoryId::FarmerSarah)
        );
    }

    #[test]
    fn choose_before_begin_rejected() {
        let mut session = NarrativeSession::new(test_story()).unwrap();
        assert_eq!(session.choose(0), Err(SessionError::NotStarted));
        session.begin().unwrap();
        assert!(session.choose(0).is_ok());
    }

    #[test]
    fn choose_adds_points_and_moves() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        let outcome = session.choose(0).unwrap();
        assert_eq!(outcome, ChoiceOutcome::Advanced { scene: SceneId(1) });
        assert_eq!(session.score(), 10);
        assert_eq!(session.current_scene_id(), SceneId(1));
        assert_eq!(session.visited(), &[(SceneId(0), 0)]);
    }

    #[test]
    fn terminal_choice_completes() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        session.choose(0).unwrap();
        let outcome = session.choose(0).unwrap();
        assert_eq!(outcome, ChoiceOutcome::Completed { final_score: 25 });
        assert!(session.is_completed());

        let notes = session.drain_notifications();
        assert!(notes.contains(&Notification::StoryCompleted {
            story: StoryId::FarmerSarah,
            score: 25,
        }));
    }

    #[test]
    fn completed_session_rejects_further_choices() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        session.choose(0).unwrap();
        session.choose(0).unwrap();
        for i in 0..3 {
            assert_eq!(session.choose(i), Err(SessionError::AlreadyCompleted));
        }
        assert_eq!(session.score(), 25);
    }

    #[test]
    fn invalid_choice_is_an_error_and_changes_nothing() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        assert_eq!(
            session.choose(7),
            Err(SessionError::InvalidChoice {
                scene: SceneId(0),
                index: 7,
                available: 3,
            })
        );
        assert_eq!(session.score(), 0);
        assert!(session.visited().is_empty());
    }

    #[test]
    fn unknown_target_is_reported_not_rendered() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        session.choose(0).unwrap();
        assert_eq!(
            session.choose(1),
            Err(SessionError::UnknownScene {
                scene: SceneId(1),
                target: SceneId(9),
            })
        );
        assert_eq!(session.score(), 10);
        assert_eq!(session.current_scene_id(), SceneId(1));
    }

    #[test]
    fn quiz_scene_gates_progress() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        let outcome = session.choose(1).unwrap();
        assert_eq!(
            outcome,
            ChoiceOutcome::InterstitialRequired(Interstitial::Quiz { scene: SceneId(2) })
        );
        assert_eq!(
            session.choose(0),
            Err(SessionError::InterstitialPending(SceneId(2)))
        );

        let wrong = session.answer_quiz(0).unwrap();
        assert!(!wrong.correct);
        assert_eq!(wrong.bonus, 0);

        let right = session.answer_quiz(1).unwrap();
        assert!(right.correct);
        assert_eq!(right.bonus, QUIZ_BONUS_POINTS);
        let again = session.answer_quiz(1).unwrap();
        assert_eq!(again.bonus, 0);
        assert_eq!(session.score(), 3 + QUIZ_BONUS_POINTS);

        session.dismiss_interstitial().unwrap();
        assert_eq!(
            session.choose(0).unwrap(),
            ChoiceOutcome::Completed {
                final_score: 8 + QUIZ_BONUS_POINTS
            }
        );
    }

    #[test]
    fn quiz_answer_out_of_range() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        session.choose(1).unwrap();
        assert_eq!(
            session.answer_quiz(5),
            Err(SessionError::InvalidAnswer {
                index: 5,
                available: 2,
            })
        );
    }

    #[test]
    fn mini_game_award_once() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        session.choose(2).unwrap();
        assert_eq!(
            session.answer_quiz(0),
            Err(SessionError::WrongInterstitial("quiz"))
        );
        session.award_mini_game(40).unwrap();
        assert_eq!(
            session.award_mini_game(40),
            Err(SessionError::BonusAlreadyAwarded(SceneId(3)))
        );
        assert_eq!(session.score(), 41);
        session.dismiss_interstitial().unwrap();
        assert_eq!(session.dismiss_interstitial(), Err(SessionError::NoInterstitial));
    }

    #[test]
    fn huge_mini_game_award_saturates() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        session.choose(2).unwrap();
        assert_eq!(session.score(), 1);
        session.award_mini_game(u32::MAX).unwrap();
        assert_eq!(session.score(), u32::MAX);

        session.dismiss_interstitial().unwrap();
        assert_eq!(
            session.choose(0).unwrap(),
            ChoiceOutcome::Completed {
                final_score: u32::MAX
            }
        );
    }

    #[test]
    fn quiz_on_entry_scene_starts_in_interstitial() {
        let mut story = (*test_story()).clone();
        story.scenes[0].quiz = Some(Quiz {
            question: "What is solar wind?".to_string(),
            options: vec!["Particles from the Sun".to_string(), "A breeze".to_string()],
            correct: 0,
            explanation: "A stream of charged particles.".to_string(),
        });

        let mut session = NarrativeSession::start(Arc::new(story)).unwrap();
        let pending = Interstitial::Quiz { scene: SceneId(0) };
        assert_eq!(session.state(), &SessionState::Interstitial(pending.clone()));
        assert_eq!(
            session.choose(0),
            Err(SessionError::InterstitialPending(SceneId(0)))
        );
        assert_eq!(session.score(), 0);
        assert!(session
            .drain_notifications()
            .contains(&Notification::InterstitialRequired(pending)));

        session.dismiss_interstitial().unwrap();
        assert_eq!(
            session.choose(0).unwrap(),
            ChoiceOutcome::Advanced { scene: SceneId(1) }
        );
    }

    #[test]
    fn interstitial_notification_raised() {
        let mut session = NarrativeSession::start(test_story()).unwrap();
        session.drain_notifications();
        session.choose(2).unwrap();
        let notes = session.drain_notifications();
        assert!(notes.contains(&Notification::InterstitialRequired(
            Interstitial::MiniGame {
                scene: SceneId(3),
                game: MiniGameRef("catch-particles".to_string()),
            }
        )));
    }

    #[test]
    fn snapshot_interpolates_player() {
        let session = NarrativeSession::start(test_story()).unwrap();
        let snap = session.snapshot("Ada").unwrap();
        assert_eq!(snap.body, "Hello Ada");
        assert_eq!(snap.story, "farmer-sarah");
        assert_eq!(snap.choices.len(), 3);
        assert_eq!(snap.state, "playing");
    }
}
