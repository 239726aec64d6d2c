/// Mini-games built on the particle field.
///
/// `CatchGame` is the "protect Earth" game: energy falls from the top,
/// the player slides Earth to catch it and dodge solar debris.

use rand::Rng;
use serde::Serialize;

use crate::core::animation::{FrameInfo, Simulation};
use crate::core::cue::SoundCue;
use crate::core::notify::Notifications;
use crate::core::parameters::ParameterValues;
use crate::core::particles::{Bounds, ParticleField, Target};
use crate::core::render::Surface;
use crate::schema::particle::ParticleKind;

pub const COLLECT_POINTS: u32 = 10;
pub const STARTING_LIVES: u32 = 3;
pub const EARTH_RADIUS: f64 = 50.0;

/// Seconds between spawns unless the game's parameters say otherwise.
pub const DEFAULT_SPAWN_INTERVAL: f64 = 0.8;
pub const DEFAULT_HAZARD_CHANCE: f64 = 0.3;
const FALL_GRAVITY: f64 = 60.0;
const PARTICLE_LIFE_TICKS: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub score: u32,
    pub lives: u32,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self {
            score: 0,
            lives: STARTING_LIVES,
        }
    }
}

impl Scoreboard {
    /// Apply a collision. Lives never drop below zero.
    pub fn apply(&mut self, kind: ParticleKind) -> Option<GameEvent> {
        match kind {
            ParticleKind::Collectible => {
                self.score += COLLECT_POINTS;
                Some(GameEvent::Collected {
                    points: COLLECT_POINTS,
                })
            }
            ParticleKind::Hazard => {
                self.lives = self.lives.saturating_sub(1);
                Some(GameEvent::Hit {
                    lives_left: self.lives,
                })
            }
            ParticleKind::Spark => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.lives == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GameEvent {
    Collected { points: u32 },
    Hit { lives_left: u32 },
    GameOver { score: u32 },
}

#[derive(Debug, Clone)]
pub struct CatchGame {
    field: ParticleField,
    earth: Target,
    board: Scoreboard,
    spawn_timer: f64,
    events: Vec<GameEvent>,
    notifications: Notifications,
}

impl CatchGame {
    pub fn new(bounds: Bounds, seed: u64) -> Self {
        Self {
            field: ParticleField::new(bounds, FALL_GRAVITY, seed),
            earth: Target {
                x: bounds.width / 2.0,
                y: bounds.height - EARTH_RADIUS - 10.0,
                radius: EARTH_RADIUS,
            },
            board: Scoreboard::default(),
            spawn_timer: 0.0,
            events: Vec::new(),
            notifications: Notifications::default(),
        }
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ParticleField {
        &mut self.field
    }

    pub fn earth(&self) -> Target {
        self.earth
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.board
    }

    pub fn is_over(&self) -> bool {
        self.board.is_over()
    }

    /// Slide Earth horizontally, keeping it on screen.
    pub fn move_earth(&mut self, x: f64) {
        let width = self.field.bounds().width;
        let r = self.earth.radius;
        self.earth.x = if width > 2.0 * r {
            x.clamp(r, width - r)
        } else {
            width / 2.0
        };
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    /// Score every particle currently touching Earth and remove it.
    pub fn resolve_collisions(&mut self) {
        if self.board.is_over() {
            return;
        }
        for hit in self.field.take_collisions(&self.earth) {
            if let Some(event) = self.board.apply(hit.kind) {
                let cue = match event {
                    GameEvent::Collected { .. } => SoundCue::Success,
                    _ => SoundCue::Wrong,
                };
                self.notifications.cue(cue);
                self.events.push(event);
            }
            if self.board.is_over() {
                log::info!("catch game over with score {}", self.board.score);
                self.events.push(GameEvent::GameOver {
                    score: self.board.score,
                });
                self.field.clear();
                break;
            }
        }
    }

    fn spawn_falling(&mut self, hazard_chance: f64) {
        let width = self.field.bounds().width;
        let rng = self.field.rng();
        let hazard = rng.gen_bool(hazard_chance.clamp(0.0, 1.0));
        let x = rng.gen_range(0.0..width.max(1.0));
        let vx = rng.gen_range(-20.0..20.0);
        let vy = rng.gen_range(30.0..90.0);
        let (kind, glyph, size) = if hazard {
            (ParticleKind::Hazard, "☄️", 10.0)
        } else {
            (ParticleKind::Collectible, "⚡", 8.0)
        };
        self.field
            .spawn(kind, x, 0.0, vx, vy, size, glyph, PARTICLE_LIFE_TICKS);
    }
}

impl Simulation for CatchGame {
    fn advance(&mut self, dt: f64, params: &ParameterValues) {
        if self.board.is_over() {
            return;
        }
        let interval = params
            .get_or("Spawn Interval", DEFAULT_SPAWN_INTERVAL)
            .max(0.05);
        let hazard_chance = params.get_or("Hazard Chance", DEFAULT_HAZARD_CHANCE);

        self.spawn_timer += dt;
        while self.spawn_timer >= interval {
            self.spawn_timer -= interval;
            self.spawn_falling(hazard_chance);
        }

        self.field.step(dt);
        self.resolve_collisions();
    }

    fn render(&self, _frame: &FrameInfo, _params: &ParameterValues, surface: &mut dyn Surface) {
        let (w, _) = surface.size();
        surface.clear("#000814");
        surface.fill_circle(self.earth.x, self.earth.y, self.earth.radius, "#219ebc");
        surface.text(self.earth.x, self.earth.y, "🌍", self.earth.radius, "#ffffff");

        for p in self.field.particles() {
            surface.text(p.x, p.y, &p.glyph, p.size * 2.0, "#ffffff");
        }

        surface.text(12.0, 24.0, &format!("Score: {}", self.board.score), 18.0, "#ffd166");
        surface.text(
            w - 120.0,
            24.0,
            &"❤️".repeat(self.board.lives as usize),
            18.0,
            "#ef476f",
        );
        if self.board.is_over() {
            surface.text(w / 2.0 - 60.0, 80.0, "Game over!", 28.0, "#ffffff");
        }
    }
}
