/// Simulation integration tests — parameters, the frame loop, particle
/// games, experiment runs and achievements against the shipped content.

use space_weather_stories::core::achievements::AchievementTracker;
use space_weather_stories::core::animation::{AnimationLoop, ManualScheduler, TickOutcome};
use space_weather_stories::core::catalog::{Catalog, ContentError};
use space_weather_stories::core::cue::{AudioError, AudioSink, SoundCue};
use space_weather_stories::core::games::{CatchGame, GameEvent, COLLECT_POINTS};
use space_weather_stories::core::lab::{ExperimentReport, LabScene, BZ, DENSITY, WIND_SPEED};
use space_weather_stories::core::notify::Notification;
use space_weather_stories::core::parameters::ParameterValues;
use space_weather_stories::core::particles::Bounds;
use space_weather_stories::core::profile::PlayerProfile;
use space_weather_stories::core::render::{DrawCommand, DrawList};
use space_weather_stories::core::task::{DelayedTask, TaskPoll};
use space_weather_stories::schema::particle::ParticleKind;

fn shipped() -> Catalog {
    Catalog::builder().content_dir("content").build().unwrap()
}

fn params_for(catalog: &Catalog, id: &str) -> ParameterValues {
    ParameterValues::from_schema(&catalog.experiment(id).unwrap().parameters)
}

#[derive(Default)]
struct Recorder(Vec<SoundCue>);

impl AudioSink for Recorder {
    fn play(&mut self, cue: SoundCue) -> Result<(), AudioError> {
        self.0.push(cue);
        Ok(())
    }
}

#[test]
fn solar_wind_speed_clamps_to_schema() {
    let catalog = shipped();
    let mut params = params_for(&catalog, "solar-wind");
    assert_eq!(params.get(WIND_SPEED).unwrap(), 400.0);
    assert_eq!(params.set(WIND_SPEED, 950.0).unwrap(), 800.0);
    assert_eq!(params.get(WIND_SPEED).unwrap(), 800.0);
    assert_eq!(params.set(WIND_SPEED, 10.0).unwrap(), 300.0);
    assert_eq!(params.display(WIND_SPEED).unwrap(), "300.0 km/s");
}

#[test]
fn malformed_parameter_rejected_at_load() {
    let err = Catalog::builder()
        .content_file("tests/fixtures/bad_parameter.ron")
        .build()
        .unwrap_err();
    match err {
        ContentError::Parameter {
            experiment,
            parameter,
        } => {
            assert_eq!(experiment, "upside-down");
            assert_eq!(parameter, "Solar Wind Speed");
        }
        other => panic!("expected a parameter error, got {}", other),
    }
}

#[test]
fn good_particle_on_earth_scores() {
    // Earth sits at (width / 2, height - 60), so this puts it at (100, 100).
    let mut game = CatchGame::new(
        Bounds {
            width: 200.0,
            height: 160.0,
        },
        1,
    );
    assert_eq!((game.earth().x, game.earth().y), (100.0, 100.0));

    game.field_mut()
        .spawn(ParticleKind::Collectible, 100.0, 100.0, 0.0, 0.0, 8.0, "⚡", 100.0);
    game.resolve_collisions();

    assert_eq!(game.scoreboard().score, COLLECT_POINTS);
    assert!(game.field().is_empty());
    assert_eq!(game.drain_events(), vec![GameEvent::Collected { points: 10 }]);

    let mut audio = Recorder::default();
    let rest = game.notifications_mut().dispatch(&mut audio);
    assert!(rest.is_empty());
    assert_eq!(audio.0, vec![SoundCue::Success]);
}

#[test]
fn catch_game_runs_on_the_frame_loop() {
    let catalog = shipped();
    let game = CatchGame::new(
        Bounds {
            width: 400.0,
            height: 300.0,
        },
        9,
    );
    let mut anim = AnimationLoop::new(game, params_for(&catalog, "catch-particles"));
    let mut sched = ManualScheduler::new();
    let mut host = Some(DrawList::new(400.0, 300.0));

    anim.start(&mut sched);
    let mut now = 0.0;
    for _ in 0..120 {
        assert!(sched.fire().is_some());
        assert_eq!(anim.tick(now, &mut sched, &mut host), TickOutcome::Rendered);
        now += 16.0;
    }
    assert_eq!(anim.frames_rendered(), 120);
    // About 1.9s of play at a 0.8s spawn interval.
    assert!(anim.simulation().field().len() + anim.simulation().scoreboard().score as usize > 0);

    let frame = host.as_ref().unwrap();
    assert!(matches!(frame.commands.first(), Some(DrawCommand::Clear { .. })));
}

#[test]
fn missing_surface_skips_render_but_advances() {
    let catalog = shipped();
    let scene = LabScene::for_experiment(
        "space-canvas",
        Bounds {
            width: 300.0,
            height: 300.0,
        },
        4,
    )
    .unwrap();
    let mut anim = AnimationLoop::new(scene, params_for(&catalog, "space-canvas"));
    let mut sched = ManualScheduler::new();
    let mut host: Option<DrawList> = None;

    anim.start(&mut sched);
    anim.simulation_mut().canvas_clicked(150.0, 150.0);
    sched.fire();
    assert_eq!(anim.tick(0.0, &mut sched, &mut host), TickOutcome::Skipped);
    sched.fire();
    assert_eq!(anim.tick(50.0, &mut sched, &mut host), TickOutcome::Skipped);
    assert_eq!(anim.frames_skipped(), 2);
    assert!(anim.elapsed() > 0.0);

    host = Some(DrawList::new(300.0, 300.0));
    sched.fire();
    assert_eq!(anim.tick(66.0, &mut sched, &mut host), TickOutcome::Rendered);
}

#[test]
fn stop_cancels_the_pending_frame() {
    let catalog = shipped();
    let scene = LabScene::for_experiment(
        "aurora",
        Bounds {
            width: 300.0,
            height: 200.0,
        },
        1,
    )
    .unwrap();
    let mut anim = AnimationLoop::new(scene, params_for(&catalog, "aurora"));
    let mut sched = ManualScheduler::new();
    let mut host = Some(DrawList::new(300.0, 200.0));

    anim.start(&mut sched);
    sched.fire();
    anim.tick(0.0, &mut sched, &mut host);
    assert_eq!(sched.pending().len(), 1);

    anim.stop(&mut sched);
    assert!(sched.pending().is_empty());
    assert_eq!(sched.cancelled().len(), 1);
    assert_eq!(anim.tick(16.0, &mut sched, &mut host), TickOutcome::Inactive);
    assert_eq!(anim.frames_rendered(), 1);
}

#[test]
fn experiment_run_reports_after_its_duration() {
    let catalog = shipped();
    let experiment = catalog.experiment("solar-wind").unwrap();
    let mut params = ParameterValues::from_schema(&experiment.parameters);
    params.set(WIND_SPEED, 800.0).unwrap();
    params.set(DENSITY, 50.0).unwrap();
    params.set(BZ, -20.0).unwrap();

    let snapshot = params.clone();
    let mut run = DelayedTask::new(1_000.0, experiment.duration_ms as f64, move || {
        ExperimentReport::from_params(&snapshot)
    });
    assert_eq!(run.poll(2_000.0), TaskPoll::Pending);
    assert_eq!(run.progress(2_500.0), 0.5);

    match run.poll(4_000.0) {
        TaskPoll::Ready(report) => {
            assert_eq!(report.storm_level, 9);
            assert_eq!(report.gps_risk, "high");
        }
        other => panic!("expected a report, got {:?}", other),
    }
    assert_eq!(run.poll(5_000.0), TaskPoll::Finished);
}

#[test]
fn cancelled_experiment_never_reports() {
    let mut run = DelayedTask::new(0.0, 3_000.0, || ExperimentReport::from_params(&ParameterValues::default()));
    let token = run.token();
    token.cancel();
    assert_eq!(run.poll(10_000.0), TaskPoll::Cancelled);
    assert_eq!(run.poll(20_000.0), TaskPoll::Finished);
}

#[test]
fn mood_explorer_unlocks_once_and_stays_unlocked() {
    let catalog = shipped();
    let mut tracker = AchievementTracker::new(catalog.achievements());
    let mut profile = PlayerProfile::new("Ada");

    let unlock = tracker.record_progress("mood-explorer", 1).unwrap().unwrap();
    profile.record_achievement(unlock.points);
    assert!(tracker.record_progress("mood-explorer", 1).unwrap().is_none());
    assert!(tracker.record_progress("mood-explorer", 0).unwrap().is_none());
    assert!(tracker.is_unlocked("mood-explorer"));

    let notes = tracker.drain_notifications();
    let unlocks: Vec<_> = notes
        .iter()
        .filter(|n| matches!(n, Notification::AchievementUnlocked { .. }))
        .collect();
    assert_eq!(unlocks.len(), 1);
    assert!(notes.contains(&Notification::Cue(SoundCue::Celebrate)));
    assert_eq!(profile.points, unlock.points);
}
