use serde::{Deserialize, Serialize};

/// A named, bounded numeric input driving a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameter {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

impl SimulationParameter {
    /// Clamp to `[min, max]`, inclusive of both bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Whether the bounds are usable: finite, ordered, and containing the
    /// default.
    pub fn is_well_formed(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && (self.min..=self.max).contains(&self.default)
    }

    /// Position of `value` within the range, 0.0 at `min` and 1.0 at `max`.
    pub fn normalized(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Slider display: one decimal place plus the unit, if any.
pub fn format_value(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{:.1}", value)
    } else {
        format!("{:.1} {}", value, unit)
    }
}

/// A Space Lab experiment: a parameter schema plus how long a run takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub parameters: Vec<SimulationParameter>,
    pub duration_ms: u64,
}

impl Experiment {
    pub fn parameter(&self, name: &str) -> Option<&SimulationParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
