/// Preview — interactive terminal play-through of the shipped stories.
///
/// Usage: preview --content <path> [--player <name>]
///
/// Commands:
///   stories          — list the stories in the catalog
///   play <id>        — start a story (e.g. farmer-sarah)
///   <n>              — take choice n on the current scene
///   answer <n>       — answer the pending quiz
///   award <points>   — finish the pending mini-game with a score
///   dismiss          — close the quiz or mini-game
///   lab <id> [name=value ...] — run a Space Lab experiment
///   profile          — show points, coins and achievements
///   help             — list commands
///   quit             — exit

use space_weather_stories::core::achievements::{AchievementError, AchievementTracker, Unlock};
use space_weather_stories::core::catalog::Catalog;
use space_weather_stories::core::cue::{AudioError, AudioSink, SoundCue};
use space_weather_stories::core::lab::ExperimentReport;
use space_weather_stories::core::notify::{Interstitial, Notification};
use space_weather_stories::core::parameters::ParameterValues;
use space_weather_stories::core::profile::PlayerProfile;
use space_weather_stories::core::session::{ChoiceOutcome, NarrativeSession};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Prints cues instead of playing them.
struct ConsoleAudio;

impl AudioSink for ConsoleAudio {
    fn play(&mut self, cue: SoundCue) -> Result<(), AudioError> {
        println!("  [sound: {}]", cue.name());
        Ok(())
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut content_path = None;
    let mut player = "Explorer".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--content" if i + 1 < args.len() => {
                i += 1;
                content_path = Some(args[i].clone());
            }
            "--player" if i + 1 < args.len() => {
                i += 1;
                player = args[i].clone();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(content_path) = content_path else {
        eprintln!("ERROR: --content is required");
        std::process::exit(1);
    };

    let builder = if Path::new(&content_path).is_dir() {
        Catalog::builder().content_dir(&content_path)
    } else {
        Catalog::builder().content_file(&content_path)
    };
    let catalog = match builder.build() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: Failed to load content: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Loaded {} stories, {} experiments",
        catalog.stories().len(),
        catalog.experiments().len()
    );
    println!("Player: {}", player);
    println!("Type 'help' for commands.\n");

    let mut profile = PlayerProfile::new(&player);
    let mut tracker = AchievementTracker::new(catalog.achievements());
    let mut audio = ConsoleAudio;
    let mut session: Option<NarrativeSession> = None;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "stories" => {
                for story in catalog.stories() {
                    println!(
                        "  {:<14} {} ({:?}, ~{} min)",
                        story.id.key(),
                        story.title,
                        story.difficulty,
                        story.duration_minutes
                    );
                }
            }
            "play" => {
                if parts.len() < 2 {
                    println!("Usage: play <story-id>");
                    continue;
                }
                let started = catalog
                    .resolve(parts[1])
                    .map_err(|e| e.to_string())
                    .and_then(|story| NarrativeSession::start(story).map_err(|e| e.to_string()));
                match started {
                    Ok(s) => session = Some(s),
                    Err(e) => {
                        println!("ERROR: {}", e);
                        continue;
                    }
                }
            }
            "answer" => {
                let Some(s) = session.as_mut() else {
                    println!("No story in progress. Try 'play <id>'.");
                    continue;
                };
                let Some(option) = parts.get(1).and_then(|n| n.parse::<usize>().ok()) else {
                    println!("Usage: answer <n>");
                    continue;
                };
                match s.answer_quiz(option) {
                    Ok(feedback) => {
                        if let Err(e) = tracker.record_quiz(&feedback) {
                            println!("WARNING: {}", e);
                        }
                        if feedback.correct {
                            println!("Correct! +{} bonus", feedback.bonus);
                        } else {
                            println!("Not quite. Try again!");
                        }
                        println!("{}", feedback.explanation);
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "award" => {
                let Some(s) = session.as_mut() else {
                    println!("No story in progress. Try 'play <id>'.");
                    continue;
                };
                let Some(points) = parts.get(1).and_then(|n| n.parse::<u32>().ok()) else {
                    println!("Usage: award <points>");
                    continue;
                };
                match s.award_mini_game(points) {
                    Ok(()) => {
                        profile.record_game(points);
                        warn_on_error(tracker.record_progress("energy-collector", points));
                        println!("Mini-game score {} added.", points);
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "dismiss" => {
                let Some(s) = session.as_mut() else {
                    println!("No story in progress. Try 'play <id>'.");
                    continue;
                };
                if let Err(e) = s.dismiss_interstitial() {
                    println!("ERROR: {}", e);
                    continue;
                }
            }
            "lab" => {
                if parts.len() < 2 {
                    println!("Usage: lab <experiment-id> [name=value ...]");
                    continue;
                }
                run_lab(&catalog, &parts[1..], &mut profile, &mut tracker);
            }
            "profile" => {
                print_profile(&profile, &tracker);
            }
            other => {
                let Ok(index) = other.parse::<usize>() else {
                    println!("Unknown command: {}. Type 'help'.", other);
                    continue;
                };
                let Some(s) = session.as_mut() else {
                    println!("No story in progress. Try 'play <id>'.");
                    continue;
                };
                match s.choose(index) {
                    Ok(ChoiceOutcome::Completed { final_score }) => {
                        let story = s.story().id;
                        println!("\n*** The End! Final score: {} ***\n", final_score);
                        if profile.record_story(story, final_score) {
                            println!("New best score for {}!", story);
                        }
                        warn_on_error(tracker.record_progress("first-story", 1));
                        warn_on_error(
                            tracker.record_progress("story-master", profile.distinct_stories() as u32),
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        println!("ERROR: {}", e);
                        continue;
                    }
                }
            }
        }

        if let Some(s) = session.as_mut() {
            for note in s.notifications_mut().dispatch(&mut audio) {
                print_notification(&note);
            }
            if !s.is_completed() {
                print_scene(s, &player);
            }
        }
        for note in tracker.drain_notifications() {
            if let Notification::AchievementUnlocked { points, .. } = &note {
                profile.record_achievement(*points);
            }
            print_notification(&note);
        }
    }
}

fn run_lab(
    catalog: &Catalog,
    args: &[&str],
    profile: &mut PlayerProfile,
    tracker: &mut AchievementTracker,
) {
    let experiment = match catalog.experiment(args[0]) {
        Ok(e) => e,
        Err(e) => {
            println!("ERROR: {}", e);
            return;
        }
    };
    let mut params = ParameterValues::from_schema(&experiment.parameters);
    for assignment in &args[1..] {
        let Some((name, value)) = assignment.split_once('=') else {
            println!("Expected name=value, got '{}'", assignment);
            return;
        };
        // Parameter names contain spaces; allow underscores on the command line.
        let name = name.replace('_', " ");
        let Ok(value) = value.parse::<f64>() else {
            println!("'{}' is not a number", value);
            return;
        };
        match params.set(&name, value) {
            Ok(stored) if stored != value => println!("  {} clamped to {}", name, stored),
            Ok(_) => {}
            Err(e) => {
                println!("ERROR: {}", e);
                return;
            }
        }
    }

    println!("\n--- {} ---", experiment.title);
    for view in params.views() {
        println!("  {:<20} {}", view.name, view.display);
    }
    let report = ExperimentReport::from_params(&params);
    println!(
        "  Storm level {} | aurora down to {:.0}° | GPS risk {}",
        report.storm_level, report.aurora_latitude, report.gps_risk
    );
    println!("  {}\n", report.summary);

    profile.record_experiment();
    warn_on_error(tracker.record_progress("mood-explorer", 1));
    if report.storm_level >= 7 {
        warn_on_error(tracker.record_progress("storm-chaser", 1));
    }
}

/// Achievement ids come from the loaded content; a missing one is worth a
/// warning but not an abort.
fn warn_on_error(result: Result<Option<Unlock>, AchievementError>) {
    if let Err(e) = result {
        println!("WARNING: {}", e);
    }
}

fn print_scene(session: &NarrativeSession, player: &str) {
    let snapshot = match session.snapshot(player) {
        Ok(s) => s,
        Err(e) => {
            println!("ERROR: {}", e);
            return;
        }
    };
    println!("\n== {} (scene {}, score {}) ==", snapshot.title, snapshot.scene, snapshot.score);
    println!("{}", snapshot.body);
    for fact in &snapshot.facts {
        println!("  * {}", fact);
    }
    if let (Some(quiz), "interstitial") = (&snapshot.quiz, snapshot.state) {
        println!("\nQuiz: {}", quiz.question);
        for (i, option) in quiz.options.iter().enumerate() {
            println!("  answer {}: {}", i, option);
        }
        println!("(type 'dismiss' when done)");
        return;
    }
    if let (Some(game), "interstitial") = (&snapshot.mini_game, snapshot.state) {
        println!("\nMini-game '{}': 'award <points>' then 'dismiss'", game);
        return;
    }
    println!();
    for (i, choice) in snapshot.choices.iter().enumerate() {
        println!("  {}: {}", i, choice);
    }
}

fn print_notification(note: &Notification) {
    match note {
        Notification::InterstitialRequired(Interstitial::Quiz { scene }) => {
            println!("  [quiz on scene {}]", scene)
        }
        Notification::InterstitialRequired(Interstitial::MiniGame { game, .. }) => {
            println!("  [mini-game: {}]", game.0)
        }
        Notification::StoryCompleted { story, score } => {
            println!("  [completed {} with {} points]", story, score)
        }
        Notification::AchievementUnlocked { id, points } => {
            println!("  [achievement unlocked: {} (+{})]", id, points)
        }
        Notification::Cue(cue) => println!("  [sound: {}]", cue.name()),
    }
}

fn print_profile(profile: &PlayerProfile, tracker: &AchievementTracker) {
    println!(
        "{}: {} points, {} coins, {} stories, {} games, {} experiments",
        profile.name,
        profile.points,
        profile.coins,
        profile.stories_completed,
        profile.games_played,
        profile.experiments_run
    );
    println!("Achievement points: {}", tracker.unlocked_points());
    for view in tracker.views() {
        let mark = if view.unlocked { "x" } else { " " };
        println!(
            "  [{}] {:<18} {}/{}",
            mark, view.title, view.progress, view.max_progress
        );
    }
}

fn print_usage() {
    println!("Preview — interactive story shell.");
    println!();
    println!("Usage: preview --content <path> [--player <name>]");
    println!();
    println!("  --content <path>  Path to a content file or directory");
    println!("  --player <name>   Name used in story text (default: Explorer)");
}

fn print_help() {
    println!("Commands:");
    println!("  stories                    List stories");
    println!("  play <id>                  Start a story (farmer-sarah, pilot-maya, astronaut-leo)");
    println!("  <n>                        Take choice n");
    println!("  answer <n>                 Answer the pending quiz");
    println!("  award <points>             Score the pending mini-game");
    println!("  dismiss                    Close the quiz or mini-game");
    println!("  lab <id> [name=value ...]  Run an experiment (use _ for spaces in names)");
    println!("  profile                    Show progress and achievements");
    println!("  help                       Show this help");
    println!("  quit                       Exit");
}
