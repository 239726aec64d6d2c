/// Live parameter values for a simulation, clamped to their schema.

use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

use crate::schema::parameter::{format_value, SimulationParameter};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("parameter '{0}' cannot be set to NaN")]
    NotANumber(String),
}

/// Current values keyed by parameter name, initialized from defaults.
///
/// Writes land immediately; the next frame reads them.
#[derive(Debug, Clone, Default)]
pub struct ParameterValues {
    schema: Vec<SimulationParameter>,
    values: FxHashMap<String, f64>,
}

/// One slider as the presentation layer shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterView {
    pub name: String,
    pub value: f64,
    pub display: String,
    /// Slider position, 0.0..=1.0.
    pub position: f64,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    pub description: String,
}

impl ParameterValues {
    pub fn from_schema(schema: &[SimulationParameter]) -> Self {
        let values = schema
            .iter()
            .map(|p| (p.name.clone(), p.default))
            .collect();
        Self {
            schema: schema.to_vec(),
            values,
        }
    }

    pub fn schema(&self) -> &[SimulationParameter] {
        &self.schema
    }

    fn definition(&self, name: &str) -> Result<&SimulationParameter, SimulationError> {
        self.schema
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SimulationError::UnknownParameter(name.to_string()))
    }

    /// Store `value` clamped to the parameter's bounds and return what was
    /// stored. Does not redraw.
    pub fn set(&mut self, name: &str, value: f64) -> Result<f64, SimulationError> {
        if value.is_nan() {
            return Err(SimulationError::NotANumber(name.to_string()));
        }
        let clamped = self.definition(name)?.clamp(value);
        self.values.insert(name.to_string(), clamped);
        Ok(clamped)
    }

    pub fn get(&self, name: &str) -> Result<f64, SimulationError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| SimulationError::UnknownParameter(name.to_string()))
    }

    /// Value for renderers: falls back to `fallback` when the experiment
    /// does not define `name`.
    pub fn get_or(&self, name: &str, fallback: f64) -> f64 {
        self.values.get(name).copied().unwrap_or(fallback)
    }

    pub fn display(&self, name: &str) -> Result<String, SimulationError> {
        let def = self.definition(name)?;
        Ok(format_value(self.get(name)?, &def.unit))
    }

    pub fn reset(&mut self) {
        for p in &self.schema {
            self.values.insert(p.name.clone(), p.default);
        }
    }

    pub fn views(&self) -> Vec<ParameterView> {
        self.schema
            .iter()
            .map(|p| {
                let value = self.get_or(&p.name, p.default);
                ParameterView {
                    name: p.name.clone(),
                    value,
                    display: format_value(value, &p.unit),
                    position: p.normalized(value),
                    min: p.min,
                    max: p.max,
                    unit: p.unit.clone(),
                    description: p.description.clone(),
                }
            })
            .collect()
    }
}
