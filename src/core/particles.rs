/// Particle physics shared by the mini-games and the Space Lab canvas.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::schema::particle::{Particle, ParticleKind};

/// Two circles collide iff the distance between centers is strictly less
/// than the sum of their radii. Touching is not a collision.
pub fn circles_collide(a: (f64, f64), ra: f64, b: (f64, f64), rb: f64) -> bool {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt() < ra + rb
}

/// The visible area. Particles fully outside it are removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn contains(&self, p: &Particle) -> bool {
        p.x + p.size >= 0.0
            && p.x - p.size <= self.width
            && p.y + p.size >= 0.0
            && p.y - p.size <= self.height
    }
}

/// A stationary circle particles can hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    pub expired: usize,
    pub left_bounds: usize,
}

/// A set of live particles with gravity and per-tick lifetime decay.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    bounds: Bounds,
    /// Downward acceleration in px/s².
    pub gravity: f64,
    next_id: u64,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(bounds: Bounds, gravity: f64, seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            bounds,
            gravity,
            next_id: 1,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Add a particle and return its id.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        kind: ParticleKind,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        size: f64,
        glyph: &str,
        life: f64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.particles.push(Particle {
            id,
            x,
            y,
            vx,
            vy,
            size,
            kind,
            glyph: glyph.to_string(),
            life_remaining: life,
        });
        id
    }

    /// Spray `count` sparks outward from a point.
    pub fn burst(&mut self, x: f64, y: f64, count: usize, palette: &[&str]) {
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
            let speed = self.rng.gen_range(40.0..160.0);
            let size = self.rng.gen_range(2.0..5.0);
            let life = self.rng.gen_range(30.0..90.0);
            let glyph = if palette.is_empty() {
                "#ffffff"
            } else {
                palette[self.rng.gen_range(0..palette.len())]
            };
            self.spawn(
                ParticleKind::Spark,
                x,
                y,
                angle.cos() * speed,
                angle.sin() * speed,
                size,
                glyph,
                life,
            );
        }
    }

    /// Integrate one tick: `v.y += g·dt`, `pos += v·dt`, life −1, then drop
    /// particles that expired or left the bounds.
    pub fn step(&mut self, dt: f64) -> StepReport {
        let mut report = StepReport::default();
        for p in &mut self.particles {
            p.vy += self.gravity * dt;
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.life_remaining -= 1.0;
        }

        let bounds = self.bounds;
        self.particles.retain(|p| {
            if p.is_expired() {
                report.expired += 1;
                false
            } else if !bounds.contains(p) {
                report.left_bounds += 1;
                false
            } else {
                true
            }
        });
        report
    }

    /// Remove and return every non-spark particle touching `target`.
    pub fn take_collisions(&mut self, target: &Target) -> Vec<Particle> {
        let mut hits = Vec::new();
        let mut i = 0;
        while i < self.particles.len() {
            let p = &self.particles[i];
            if p.kind != ParticleKind::Spark
                && circles_collide((p.x, p.y), p.size, (target.x, target.y), target.radius)
            {
                hits.push(self.particles.remove(i));
            } else {
                i += 1;
            }
        }
        hits
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
