//! WASM bindings for space-weather-stories — the browser front end drives
//! these screens and paints what they return.
//!
//! Every method returns JSON. Errors are `JsError`s whose message starts
//! with a kind (`content:`, `not_found:`, `session:`, `simulation:`,
//! `achievement:`) so the UI can route them.

use serde::Serialize;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

use space_weather_stories::core::achievements::{
    AchievementError, AchievementTracker, AchievementView, Unlock,
};
use space_weather_stories::core::animation::{AnimationLoop, ManualScheduler, TickOutcome};
use space_weather_stories::core::catalog::{Catalog, ContentPack};
use space_weather_stories::core::games::{CatchGame, GameEvent, Scoreboard};
use space_weather_stories::core::lab::{ExperimentReport, LabScene};
use space_weather_stories::core::notify::Notification;
use space_weather_stories::core::parameters::{ParameterValues, ParameterView};
use space_weather_stories::core::particles::Bounds;
use space_weather_stories::core::profile::PlayerProfile;
use space_weather_stories::core::render::{DrawCommand, DrawList};
use space_weather_stories::core::session::{
    ChoiceOutcome, NarrativeSession, QuizFeedback, SessionSnapshot,
};
use space_weather_stories::core::task::{DelayedTask, TaskPoll};
use space_weather_stories::schema::story::StoryId;

// ---------------------------------------------------------------------------
// Embedded content — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const STORIES: &str = include_str!("../../content/stories.ron");
    pub const EXPERIMENTS: &str = include_str!("../../content/experiments.ron");
    pub const ACHIEVEMENTS: &str = include_str!("../../content/achievements.ron");
}

const CATCH_GAME_ID: &str = "catch-particles";

fn js_err(kind: &str, e: impl Display) -> JsError {
    JsError::new(&format!("{kind}: {e}"))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| js_err("serialization", e))
}

fn embedded_catalog() -> Result<Catalog, JsError> {
    let mut builder = Catalog::builder();
    for source in [data::STORIES, data::EXPERIMENTS, data::ACHIEVEMENTS] {
        let pack = ContentPack::parse_ron(source).map_err(|e| js_err("content", e))?;
        builder = builder.with_pack(pack);
    }
    builder.build().map_err(|e| js_err("content", e))
}

/// A missing or zero-sized canvas has no surface; frames are skipped.
fn surface(width: f64, height: f64) -> Option<DrawList> {
    (width > 0.0 && height > 0.0).then(|| DrawList::new(width, height))
}

fn take_frame(host: &mut Option<DrawList>) -> Vec<DrawCommand> {
    host.as_mut().map(DrawList::take_commands).unwrap_or_default()
}

fn outcome_label(outcome: TickOutcome) -> &'static str {
    match outcome {
        TickOutcome::Inactive => "inactive",
        TickOutcome::Rendered => "rendered",
        TickOutcome::Skipped => "skipped",
    }
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(Serialize)]
struct StoryInfo {
    id: &'static str,
    title: String,
    summary: String,
    difficulty: String,
    duration_minutes: u32,
}

#[derive(Serialize)]
struct ChoiceResult {
    outcome: &'static str,
    final_score: Option<u32>,
    snapshot: SessionSnapshot,
}

#[derive(Serialize)]
struct LabFrame {
    outcome: &'static str,
    commands: Vec<DrawCommand>,
    experiment_running: bool,
    experiment_progress: f64,
    report: Option<ExperimentReport>,
}

#[derive(Serialize)]
struct GameFrame {
    outcome: &'static str,
    commands: Vec<DrawCommand>,
    scoreboard: Scoreboard,
    game_over: bool,
    events: Vec<GameEvent>,
}

#[derive(Serialize)]
struct ProgressInfo<'a> {
    profile: &'a PlayerProfile,
    achievements: Vec<AchievementView>,
    achievement_points: u32,
}

// ---------------------------------------------------------------------------
// Progress — the one progress store every screen reports into
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct Progress {
    profile: PlayerProfile,
    tracker: AchievementTracker,
}

#[wasm_bindgen]
impl Progress {
    #[wasm_bindgen(constructor)]
    pub fn new(player_name: &str) -> Result<Progress, JsError> {
        let catalog = embedded_catalog()?;
        Ok(Progress {
            profile: PlayerProfile::new(player_name),
            tracker: AchievementTracker::new(catalog.achievements()),
        })
    }

    /// Record a finished story by its key (e.g. "farmer-sarah").
    pub fn record_story(&mut self, story_id: &str, score: u32) -> Result<bool, JsError> {
        let id: StoryId = story_id.parse().map_err(|e| js_err("not_found", e))?;
        let best = self.profile.record_story(id, score);
        self.unlock("first-story", 1)?;
        self.unlock("story-master", self.profile.distinct_stories() as u32)?;
        Ok(best)
    }

    pub fn record_game(&mut self, score: u32) -> Result<(), JsError> {
        self.profile.record_game(score);
        self.unlock("energy-collector", score)
    }

    pub fn record_experiment(&mut self, storm_level: u8) -> Result<(), JsError> {
        self.profile.record_experiment();
        self.unlock("mood-explorer", 1)?;
        if storm_level >= 7 {
            self.unlock("storm-chaser", 1)?;
        }
        Ok(())
    }

    pub fn record_progress(&mut self, achievement_id: &str, value: u32) -> Result<(), JsError> {
        self.unlock(achievement_id, value)
    }

    pub fn snapshot(&self) -> Result<String, JsError> {
        to_json(&ProgressInfo {
            profile: &self.profile,
            achievements: self.tracker.views(),
            achievement_points: self.tracker.unlocked_points(),
        })
    }

    /// JSON array of pending notifications (unlocks and cues).
    pub fn drain_notifications(&mut self) -> Result<String, JsError> {
        to_json(&self.tracker.drain_notifications())
    }
}

impl Progress {
    fn unlock(&mut self, id: &str, value: u32) -> Result<(), JsError> {
        let result = self.tracker.record_progress(id, value);
        self.credit(result)
    }

    fn record_quiz(&mut self, feedback: &QuizFeedback) -> Result<(), JsError> {
        let result = self.tracker.record_quiz(feedback);
        self.credit(result)
    }

    fn credit(&mut self, result: Result<Option<Unlock>, AchievementError>) -> Result<(), JsError> {
        if let Some(unlock) = result.map_err(|e| js_err("achievement", e))? {
            self.profile.record_achievement(unlock.points);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StoryPlayer — one play-through of one story
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StoryPlayer {
    session: NarrativeSession,
    player: String,
}

#[wasm_bindgen]
impl StoryPlayer {
    /// Unknown story ids are an error; the UI returns to the story list.
    #[wasm_bindgen(constructor)]
    pub fn new(story_id: &str, player_name: &str) -> Result<StoryPlayer, JsError> {
        let catalog = embedded_catalog()?;
        let story = catalog
            .resolve(story_id)
            .map_err(|e| js_err("not_found", e))?;
        let session = NarrativeSession::start(story).map_err(|e| js_err("session", e))?;
        Ok(StoryPlayer {
            session,
            player: player_name.to_string(),
        })
    }

    /// JSON array of the stories available to pick from.
    pub fn stories() -> Result<String, JsError> {
        let catalog = embedded_catalog()?;
        let infos: Vec<StoryInfo> = catalog
            .stories()
            .iter()
            .map(|s| StoryInfo {
                id: s.id.key(),
                title: s.title.clone(),
                summary: s.summary.clone(),
                difficulty: format!("{:?}", s.difficulty),
                duration_minutes: s.duration_minutes,
            })
            .collect();
        to_json(&infos)
    }

    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        let outcome = self
            .session
            .choose(index)
            .map_err(|e| js_err("session", e))?;
        let (label, final_score) = match outcome {
            ChoiceOutcome::Advanced { .. } => ("advanced", None),
            ChoiceOutcome::InterstitialRequired(_) => ("interstitial", None),
            ChoiceOutcome::Completed { final_score } => ("completed", Some(final_score)),
        };
        to_json(&ChoiceResult {
            outcome: label,
            final_score,
            snapshot: self.snapshot_value()?,
        })
    }

    /// Correct answers count toward the quiz achievement in `progress`.
    pub fn answer_quiz(&mut self, option: usize, progress: &mut Progress) -> Result<String, JsError> {
        let feedback = self
            .session
            .answer_quiz(option)
            .map_err(|e| js_err("session", e))?;
        progress.record_quiz(&feedback)?;
        to_json(&feedback)
    }

    pub fn award_mini_game(&mut self, points: u32) -> Result<(), JsError> {
        self.session
            .award_mini_game(points)
            .map_err(|e| js_err("session", e))
    }

    pub fn dismiss_interstitial(&mut self) -> Result<String, JsError> {
        self.session
            .dismiss_interstitial()
            .map_err(|e| js_err("session", e))?;
        self.snapshot()
    }

    pub fn snapshot(&self) -> Result<String, JsError> {
        to_json(&self.snapshot_value()?)
    }

    pub fn drain_notifications(&mut self) -> Result<String, JsError> {
        to_json(&self.session.drain_notifications())
    }
}

impl StoryPlayer {
    fn snapshot_value(&self) -> Result<SessionSnapshot, JsError> {
        self.session
            .snapshot(&self.player)
            .map_err(|e| js_err("content", e))
    }
}

// ---------------------------------------------------------------------------
// LabScreen — a Space Lab experiment on an animation loop
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct LabScreen {
    anim: AnimationLoop<LabScene>,
    scheduler: ManualScheduler,
    host: Option<DrawList>,
    duration_ms: f64,
    run: Option<DelayedTask<ExperimentReport>>,
}

#[wasm_bindgen]
impl LabScreen {
    #[wasm_bindgen(constructor)]
    pub fn new(experiment_id: &str, width: f64, height: f64, seed: u64) -> Result<LabScreen, JsError> {
        let catalog = embedded_catalog()?;
        let experiment = catalog
            .experiment(experiment_id)
            .map_err(|e| js_err("not_found", e))?;
        let scene = LabScene::for_experiment(experiment_id, Bounds { width, height }, seed)
            .ok_or_else(|| js_err("not_found", format!("no lab scene for '{experiment_id}'")))?;

        let mut scheduler = ManualScheduler::new();
        let mut anim = AnimationLoop::new(scene, ParameterValues::from_schema(&experiment.parameters));
        anim.start(&mut scheduler);

        Ok(LabScreen {
            anim,
            scheduler,
            host: surface(width, height),
            duration_ms: experiment.duration_ms as f64,
            run: None,
        })
    }

    /// JSON array of slider views.
    pub fn parameters(&self) -> Result<String, JsError> {
        let views: Vec<ParameterView> = self.anim.params().views();
        to_json(&views)
    }

    /// Returns the value actually stored after clamping.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<f64, JsError> {
        self.anim
            .set_parameter(name, value)
            .map_err(|e| js_err("simulation", e))
    }

    /// Called from the display-refresh callback.
    pub fn tick(&mut self, now_ms: f64) -> Result<String, JsError> {
        self.scheduler.fire();
        let outcome = self.anim.tick(now_ms, &mut self.scheduler, &mut self.host);

        let mut report = None;
        let mut progress = 0.0;
        if let Some(run) = self.run.as_mut() {
            progress = run.progress(now_ms);
            match run.poll(now_ms) {
                TaskPoll::Pending => {}
                TaskPoll::Ready(r) => {
                    report = Some(r);
                    self.run = None;
                }
                TaskPoll::Cancelled | TaskPoll::Finished => self.run = None,
            }
        }

        to_json(&LabFrame {
            outcome: outcome_label(outcome),
            commands: take_frame(&mut self.host),
            experiment_running: self.run.is_some(),
            experiment_progress: progress,
            report,
        })
    }

    pub fn canvas_clicked(&mut self, x: f64, y: f64) -> bool {
        self.anim.simulation_mut().canvas_clicked(x, y)
    }

    pub fn clear_canvas(&mut self) -> bool {
        self.anim.simulation_mut().clear_canvas()
    }

    /// Begin a timed run. The report arrives in a later `tick`.
    pub fn start_experiment(&mut self, now_ms: f64) {
        if let Some(previous) = self.run.take() {
            previous.cancel();
        }
        let params = self.anim.params().clone();
        self.run = Some(DelayedTask::new(now_ms, self.duration_ms, move || {
            ExperimentReport::from_params(&params)
        }));
    }

    /// Tear down: no frame or experiment result is delivered afterwards.
    pub fn stop(&mut self) {
        self.anim.stop(&mut self.scheduler);
        if let Some(run) = self.run.take() {
            run.cancel();
        }
    }

    /// A zero size means the canvas went away; frames are skipped until it
    /// comes back.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.host = surface(width, height);
    }
}

// ---------------------------------------------------------------------------
// CatchGameScreen — "Protect the Earth"
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct CatchGameScreen {
    anim: AnimationLoop<CatchGame>,
    scheduler: ManualScheduler,
    host: Option<DrawList>,
}

#[wasm_bindgen]
impl CatchGameScreen {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, seed: u64) -> Result<CatchGameScreen, JsError> {
        let catalog = embedded_catalog()?;
        let params = catalog
            .experiment(CATCH_GAME_ID)
            .map(|e| ParameterValues::from_schema(&e.parameters))
            .map_err(|e| js_err("content", e))?;

        let mut scheduler = ManualScheduler::new();
        let mut anim = AnimationLoop::new(CatchGame::new(Bounds { width, height }, seed), params);
        anim.start(&mut scheduler);

        Ok(CatchGameScreen {
            anim,
            scheduler,
            host: surface(width, height),
        })
    }

    pub fn move_target(&mut self, x: f64) {
        self.anim.simulation_mut().move_earth(x);
    }

    pub fn tick(&mut self, now_ms: f64) -> Result<String, JsError> {
        self.scheduler.fire();
        let outcome = self.anim.tick(now_ms, &mut self.scheduler, &mut self.host);
        let game = self.anim.simulation_mut();
        let events = game.drain_events();
        let frame = GameFrame {
            outcome: outcome_label(outcome),
            commands: take_frame(&mut self.host),
            scoreboard: self.anim.simulation().scoreboard(),
            game_over: self.anim.simulation().is_over(),
            events,
        };
        to_json(&frame)
    }

    /// JSON array of pending sound cues.
    pub fn drain_notifications(&mut self) -> Result<String, JsError> {
        let notes: Vec<Notification> = self.anim.simulation_mut().notifications_mut().drain();
        to_json(&notes)
    }

    pub fn stop(&mut self) {
        self.anim.stop(&mut self.scheduler);
    }
}
