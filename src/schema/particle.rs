use serde::{Deserialize, Serialize};

/// What a particle does when it reaches the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Good particle: catching it scores.
    Collectible,
    /// Bad particle: letting it hit costs a life.
    Hazard,
    /// Decorative, never collides.
    Spark,
}

/// A transient, physically simulated point object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Radius in pixels.
    pub size: f64,
    pub kind: ParticleKind,
    /// Color or emoji the presentation layer draws.
    pub glyph: String,
    /// Remaining lifetime in ticks.
    pub life_remaining: f64,
}

impl Particle {
    pub fn is_expired(&self) -> bool {
        self.life_remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_at_zero() {
        let mut p = Particle {
            id: 1,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            size: 4.0,
            kind: ParticleKind::Spark,
            glyph: "#ffd700".to_string(),
            life_remaining: 1.0,
        };
        assert!(!p.is_expired());
        p.life_remaining = 0.0;
        assert!(p.is_expired());
    }
}
