/// Story Linter — checks story graphs, scene text and lab content.
///
/// Usage: story_linter <content_dir|file>

use space_weather_stories::core::catalog::ContentPack;
use space_weather_stories::core::template::Template;
use space_weather_stories::schema::story::Story;
use std::collections::HashSet;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: story_linter <content_dir|file>");
        process::exit(0);
    }

    let content_path = Path::new(&args[1]);
    let mut content = ContentPack::default();
    let mut load_errors = 0;

    if content_path.is_file() {
        match ContentPack::load_from_ron(content_path) {
            Ok(pack) => content.merge(pack),
            Err(e) => {
                eprintln!("ERROR: Failed to load content file: {}", e);
                process::exit(1);
            }
        }
    } else if content_path.is_dir() {
        load_content_recursive(content_path, &mut content, &mut load_errors);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    }

    println!(
        "Loaded {} stories, {} experiments, {} achievements",
        content.stories.len(),
        content.experiments.len(),
        content.achievements.len()
    );

    let (mut errors, warnings) = lint_content(&content);
    for _ in 0..load_errors {
        errors.push("a content file failed to load (see above)".to_string());
    }

    println!("\n=== Story Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_content_recursive(dir: &Path, content: &mut ContentPack, failures: &mut usize) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();
        for path in paths {
            if path.is_dir() {
                load_content_recursive(&path, content, failures);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match ContentPack::load_from_ron(&path) {
                    Ok(pack) => {
                        println!("  Loaded: {}", path.display());
                        content.merge(pack);
                    }
                    Err(e) => {
                        eprintln!("  ERROR loading {}: {}", path.display(), e);
                        *failures += 1;
                    }
                }
            }
        }
    }
}

fn lint_content(content: &ContentPack) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut story_ids = HashSet::new();
    for story in &content.stories {
        if !story_ids.insert(story.id) {
            errors.push(format!("story {} is defined more than once", story.id));
        }
        lint_story(story, &mut errors, &mut warnings);
    }

    let mut experiment_ids = HashSet::new();
    for experiment in &content.experiments {
        if !experiment_ids.insert(experiment.id.as_str()) {
            errors.push(format!(
                "experiment '{}' is defined more than once",
                experiment.id
            ));
        }
        if experiment.parameters.is_empty() {
            warnings.push(format!("experiment '{}' has no parameters", experiment.id));
        }
        let mut names = HashSet::new();
        for p in &experiment.parameters {
            if !names.insert(p.name.as_str()) {
                errors.push(format!(
                    "experiment '{}': parameter '{}' is duplicated",
                    experiment.id, p.name
                ));
            }
            if !p.is_well_formed() {
                errors.push(format!(
                    "experiment '{}': parameter '{}' needs min <= default <= max (got {} / {} / {})",
                    experiment.id, p.name, p.min, p.default, p.max
                ));
            }
        }
    }

    let mut achievement_ids = HashSet::new();
    for achievement in &content.achievements {
        if !achievement_ids.insert(achievement.id.as_str()) {
            errors.push(format!(
                "achievement '{}' is defined more than once",
                achievement.id
            ));
        }
        if achievement.max_progress == 0 {
            errors.push(format!(
                "achievement '{}' has max_progress 0 and can never be earned",
                achievement.id
            ));
        }
    }

    (errors, warnings)
}

fn lint_story(story: &Story, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    for defect in story.defects() {
        errors.push(format!("story {}: {}", story.id, defect));
    }

    for scene in story.unreachable_scenes() {
        warnings.push(format!(
            "story {}: scene {} can never be reached from scene 0",
            story.id, scene
        ));
    }

    for scene in &story.scenes {
        let texts = std::iter::once(("title", &scene.title))
            .chain(std::iter::once(("body", &scene.body)))
            .chain(scene.choices.iter().map(|c| ("choice", &c.label)));
        for (field, text) in texts {
            if let Err(e) = Template::parse(text).and_then(|t| t.check_slots()) {
                errors.push(format!(
                    "story {} scene {} {}: {}",
                    story.id, scene.id, field, e
                ));
            }
        }

        if scene.quiz.is_some() && scene.mini_game.is_some() {
            warnings.push(format!(
                "story {} scene {}: has both a quiz and a mini-game; only the quiz is shown",
                story.id, scene.id
            ));
        }
        if let Some(quiz) = &scene.quiz {
            if quiz.options.len() < 2 {
                warnings.push(format!(
                    "story {} scene {}: quiz has fewer than two options",
                    story.id, scene.id
                ));
            }
        }
    }

    match story.max_score() {
        Some(score) => println!("  {}: best possible score {}", story.id, score),
        None => warnings.push(format!(
            "story {}: scene graph has a cycle, so the score is unbounded",
            story.id
        )),
    }
}
