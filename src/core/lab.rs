/// Space Lab: parameter-driven space-weather scenes, the free-draw spark
/// canvas, and the storm estimate an experiment run reports.

use serde::Serialize;

use crate::core::animation::{FrameInfo, Simulation};
use crate::core::parameters::ParameterValues;
use crate::core::particles::{Bounds, ParticleField};
use crate::core::render::Surface;

pub const WIND_SPEED: &str = "Solar Wind Speed";
pub const DENSITY: &str = "Particle Density";
pub const BZ: &str = "Magnetic Field Bz";
pub const GRAVITY: &str = "Gravity";

const DEFAULT_WIND_SPEED: f64 = 400.0;
const DEFAULT_DENSITY: f64 = 5.0;
const DEFAULT_GRAVITY: f64 = 120.0;

const SPARK_PALETTE: &[&str] = &["#ffd166", "#06d6a0", "#118ab2", "#ef476f", "#ffffff"];
const SPARKS_PER_CLICK: usize = 24;

/// Storm strength on a 0–9 scale (like the planetary K-index) from solar
/// wind speed (km/s), density (particles/cm³) and Bz (nT, negative is
/// southward and couples into Earth's field).
pub fn storm_level(speed: f64, density: f64, bz: f64) -> u8 {
    let speed_term = ((speed - 300.0) / 500.0).clamp(0.0, 1.0) * 4.0;
    let density_term = ((density - 1.0) / 49.0).clamp(0.0, 1.0) * 2.0;
    let bz_term = (-bz / 20.0).clamp(0.0, 1.0) * 3.0;
    (speed_term + density_term + bz_term).round().clamp(0.0, 9.0) as u8
}

/// What a finished experiment run tells the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub storm_level: u8,
    /// Lowest latitude (degrees) where auroras could be seen.
    pub aurora_latitude: f64,
    pub gps_risk: &'static str,
    pub summary: String,
}

impl ExperimentReport {
    pub fn from_params(params: &ParameterValues) -> Self {
        let level = storm_level(
            params.get_or(WIND_SPEED, DEFAULT_WIND_SPEED),
            params.get_or(DENSITY, DEFAULT_DENSITY),
            params.get_or(BZ, 0.0),
        );
        let aurora_latitude = 66.0 - f64::from(level) * 3.0;
        let gps_risk = match level {
            0..=3 => "low",
            4..=6 => "moderate",
            _ => "high",
        };
        let summary = match level {
            0..=2 => "Quiet space weather. Satellites and GPS are happy.".to_string(),
            3..=5 => format!(
                "A small storm! Auroras may reach {:.0}° latitude.",
                aurora_latitude
            ),
            _ => format!(
                "A big geomagnetic storm! Auroras down to {:.0}° and GPS may wobble.",
                aurora_latitude
            ),
        };
        Self {
            storm_level: level,
            aurora_latitude,
            gps_risk,
            summary,
        }
    }
}

/// The Sun blowing a particle stream at Earth's magnetic bubble. Faster,
/// denser wind and southward Bz squash the bubble.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarWindScene;

impl Simulation for SolarWindScene {
    fn render(&self, frame: &FrameInfo, params: &ParameterValues, surface: &mut dyn Surface) {
        let (w, h) = surface.size();
        let speed = params.get_or(WIND_SPEED, DEFAULT_WIND_SPEED);
        let density = params.get_or(DENSITY, DEFAULT_DENSITY);
        let bz = params.get_or(BZ, 0.0);
        let mid = h / 2.0;

        surface.clear("#000814");
        surface.fill_circle(60.0, mid, 40.0, "#ffb703");

        let earth_x = w - 100.0;
        let streams = (density.round() as usize).clamp(1, 40);
        let travel = earth_x - 100.0;
        for i in 0..streams {
            let lane = (i as f64 + 0.5) / streams as f64;
            let y = mid + (lane - 0.5) * h * 0.6;
            let offset = (frame.elapsed * speed * 0.5 + i as f64 * 37.0) % travel.max(1.0);
            let x = 100.0 + offset;
            surface.line((x, y), (x + 12.0, y), 2.0, "#ffd166");
        }

        let level = storm_level(speed, density, bz);
        let squash = f64::from(level) / 9.0;
        let bubble = 90.0 - 50.0 * squash;
        surface.set_alpha(0.6);
        surface.stroke_circle(earth_x, mid, bubble, 3.0, "#8ecae6");
        surface.set_alpha(1.0);
        surface.fill_circle(earth_x, mid, 20.0, "#219ebc");
        surface.text(12.0, h - 12.0, &format!("Storm level {}", level), 16.0, "#ffffff");
    }
}

/// Aurora curtains whose height and color follow the storm level.
#[derive(Debug, Clone, Copy)]
pub struct AuroraScene {
    pub bands: usize,
}

impl Default for AuroraScene {
    fn default() -> Self {
        Self { bands: 24 }
    }
}

impl Simulation for AuroraScene {
    fn render(&self, frame: &FrameInfo, params: &ParameterValues, surface: &mut dyn Surface) {
        let (w, h) = surface.size();
        let level = storm_level(
            params.get_or(WIND_SPEED, DEFAULT_WIND_SPEED),
            params.get_or(DENSITY, DEFAULT_DENSITY),
            params.get_or(BZ, 0.0),
        );
        let strength = 0.2 + f64::from(level) / 9.0 * 0.8;
        let color = if level >= 7 { "#ff5d8f" } else { "#57cc99" };

        surface.clear("#03045e");
        surface.fill_rect(0.0, h * 0.85, w, h * 0.15, "#023e8a");

        let bands = self.bands.max(1);
        for i in 0..bands {
            let x = (i as f64 + 0.5) * w / bands as f64;
            let wave = 0.5 + 0.5 * (frame.elapsed * 2.0 + i as f64 * 0.7).sin();
            let height = h * 0.5 * strength * (0.4 + 0.6 * wave);
            surface.set_alpha(0.3 + 0.5 * wave * strength);
            surface.line((x, h * 0.15), (x, h * 0.15 + height), w / bands as f64, color);
        }
        surface.set_alpha(1.0);
    }
}

/// The free-play canvas: clicking sprays sparks that fall and fade.
#[derive(Debug, Clone)]
pub struct SpaceLabCanvas {
    field: ParticleField,
}

impl SpaceLabCanvas {
    pub fn new(bounds: Bounds, seed: u64) -> Self {
        Self {
            field: ParticleField::new(bounds, DEFAULT_GRAVITY, seed),
        }
    }

    pub fn canvas_clicked(&mut self, x: f64, y: f64) {
        self.field.burst(x, y, SPARKS_PER_CLICK, SPARK_PALETTE);
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn clear(&mut self) {
        self.field.clear();
    }
}

impl Simulation for SpaceLabCanvas {
    fn advance(&mut self, dt: f64, params: &ParameterValues) {
        self.field.gravity = params.get_or(GRAVITY, DEFAULT_GRAVITY);
        self.field.step(dt);
    }

    fn render(&self, _frame: &FrameInfo, _params: &ParameterValues, surface: &mut dyn Surface) {
        surface.clear("#000814");
        for p in self.field.particles() {
            surface.set_alpha((p.life_remaining / 60.0).min(1.0));
            surface.fill_circle(p.x, p.y, p.size, &p.glyph);
        }
        surface.set_alpha(1.0);
    }
}

/// The scene a Space Lab experiment shows, chosen by experiment id.
#[derive(Debug, Clone)]
pub enum LabScene {
    SolarWind(SolarWindScene),
    Aurora(AuroraScene),
    Canvas(SpaceLabCanvas),
}

impl LabScene {
    pub fn for_experiment(id: &str, bounds: Bounds, seed: u64) -> Option<Self> {
        match id {
            "solar-wind" => Some(Self::SolarWind(SolarWindScene)),
            "aurora" => Some(Self::Aurora(AuroraScene::default())),
            "space-canvas" => Some(Self::Canvas(SpaceLabCanvas::new(bounds, seed))),
            _ => None,
        }
    }

    /// Sparks only appear on the free-play canvas. Returns whether the
    /// click did anything.
    pub fn canvas_clicked(&mut self, x: f64, y: f64) -> bool {
        match self {
            Self::Canvas(canvas) => {
                canvas.canvas_clicked(x, y);
                true
            }
            _ => false,
        }
    }

    /// Wipe the free-play canvas. Returns false for the other scenes.
    pub fn clear_canvas(&mut self) -> bool {
        match self {
            Self::Canvas(canvas) => {
                canvas.clear();
                true
            }
            _ => false,
        }
    }
}

impl Simulation for LabScene {
    fn advance(&mut self, dt: f64, params: &ParameterValues) {
        match self {
            Self::SolarWind(scene) => scene.advance(dt, params),
            Self::Aurora(scene) => scene.advance(dt, params),
            Self::Canvas(canvas) => canvas.advance(dt, params),
        }
    }

    fn render(&self, frame: &FrameInfo, params: &ParameterValues, surface: &mut dyn Surface) {
        match self {
            Self::SolarWind(scene) => scene.render(frame, params, surface),
            Self::Aurora(scene) => scene.render(frame, params, surface),
            Self::Canvas(canvas) => canvas.render(frame, params, surface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::{DrawCommand, DrawList};
    use crate::schema::parameter::SimulationParameter;

    fn lab_params() -> ParameterValues {
        let p = |name: &str, min: f64, max: f64, default: f64| SimulationParameter {
            name: name.to_string(),
            min,
            max,
            default,
            unit: String::new(),
            description: String::new(),
        };
        ParameterValues::from_schema(&[
            p(WIND_SPEED, 300.0, 800.0, 400.0),
            p(DENSITY, 1.0, 50.0, 5.0),
            p(BZ, -20.0, 20.0, 0.0),
        ])
    }

    fn frame(elapsed: f64) -> FrameInfo {
        FrameInfo {
            now_ms: elapsed * 1000.0,
            dt: 0.016,
            elapsed,
            frame: 0,
        }
    }

    #[test]
    fn storm_level_bounds() {
        assert_eq!(storm_level(300.0, 1.0, 20.0), 0);
        assert_eq!(storm_level(800.0, 50.0, -20.0), 9);
        assert!(storm_level(550.0, 10.0, -5.0) > storm_level(400.0, 10.0, -5.0));
    }

    #[test]
    fn report_from_quiet_and_stormy_params() {
        let mut params = lab_params();
        let quiet = ExperimentReport::from_params(&params);
        assert_eq!(quiet.gps_risk, "low");

        params.set(WIND_SPEED, 800.0).unwrap();
        params.set(DENSITY, 50.0).unwrap();
        params.set(BZ, -20.0).unwrap();
        let storm = ExperimentReport::from_params(&params);
        assert_eq!(storm.storm_level, 9);
        assert_eq!(storm.gps_risk, "high");
        assert_eq!(storm.aurora_latitude, 39.0);
    }

    #[test]
    fn solar_wind_bubble_shrinks_with_storm() {
        let mut params = lab_params();
        let ring = |list: &DrawList| {
            list.commands.iter().find_map(|c| match c {
                DrawCommand::Ring { r, .. } => Some(*r),
                _ => None,
            })
        };

        let mut calm = DrawList::new(800.0, 400.0);
        SolarWindScene.render(&frame(1.0), &params, &mut calm);

        params.set(WIND_SPEED, 800.0).unwrap();
        params.set(BZ, -20.0).unwrap();
        let mut stormy = DrawList::new(800.0, 400.0);
        SolarWindScene.render(&frame(1.0), &params, &mut stormy);

        assert!(ring(&stormy).unwrap() < ring(&calm).unwrap());
    }

    #[test]
    fn render_is_pure_in_time() {
        let params = lab_params();
        let mut a = DrawList::new(640.0, 360.0);
        let mut b = DrawList::new(640.0, 360.0);
        AuroraScene::default().render(&frame(2.5), &params, &mut a);
        AuroraScene::default().render(&frame(2.5), &params, &mut b);
        assert_eq!(a, b);
        assert_eq!(a.count(|c| matches!(c, DrawCommand::Line { .. })), 24);
    }

    #[test]
    fn click_spawns_sparks_that_fall() {
        let mut canvas = SpaceLabCanvas::new(
            Bounds {
                width: 600.0,
                height: 400.0,
            },
            3,
        );
        canvas.canvas_clicked(300.0, 200.0);
        assert_eq!(canvas.field().len(), SPARKS_PER_CLICK);

        let before: f64 = canvas.field().particles().iter().map(|p| p.vy).sum();
        canvas.advance(0.016, &ParameterValues::default());
        let after: f64 = canvas.field().particles().iter().map(|p| p.vy).sum();
        assert!(after > before);
    }

    #[test]
    fn lab_scene_by_experiment_id() {
        let bounds = Bounds {
            width: 200.0,
            height: 200.0,
        };
        assert!(matches!(
            LabScene::for_experiment("solar-wind", bounds, 1),
            Some(LabScene::SolarWind(_))
        ));
        assert!(LabScene::for_experiment("volcano", bounds, 1).is_none());

        let mut aurora = LabScene::for_experiment("aurora", bounds, 1).unwrap();
        assert!(!aurora.canvas_clicked(10.0, 10.0));
        assert!(!aurora.clear_canvas());
        let mut canvas = LabScene::for_experiment("space-canvas", bounds, 1).unwrap();
        assert!(canvas.canvas_clicked(10.0, 10.0));

        assert!(canvas.clear_canvas());
        let LabScene::Canvas(inner) = &canvas else {
            panic!("expected the canvas scene");
        };
        assert_eq!(inner.field().len(), 0);
    }
}
