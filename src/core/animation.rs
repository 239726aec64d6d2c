/// The frame loop: an explicit scheduler drives `tick`, which advances a
/// simulation and renders it from the current parameter values.
///
/// `stop` is a cancellation contract, not cleanup: once it returns, no
/// further `tick` does any work until `start` is called again.

use crate::core::parameters::{ParameterValues, SimulationError};
use crate::core::render::{Surface, SurfaceHost};

/// Longest step a single frame may advance, in seconds. Keeps a
/// backgrounded tab from teleporting particles when it wakes up.
pub const MAX_FRAME_DT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Requests and cancels per-frame callbacks (a display-refresh callback or
/// a fixed-rate timer; the loop does not care which).
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// A scheduler whose frames fire only when the owner calls `tick`.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    next_handle: u64,
    pending: Vec<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested and not yet fired or cancelled.
    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }

    /// Fire the oldest pending frame, if any.
    pub fn fire(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending.push(handle);
        handle
    }

    /// Cancelling a frame that already fired is a no-op.
    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(pos) = self.pending.iter().position(|h| *h == handle) {
            self.pending.remove(pos);
            self.cancelled.push(handle);
        }
    }
}

/// Timing for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub now_ms: f64,
    /// Seconds since the previous frame (0 on the first).
    pub dt: f64,
    /// Seconds of animation time since `start`.
    pub elapsed: f64,
    pub frame: u64,
}

/// Something the loop can animate. `render` must be a pure function of
/// the simulation state, the parameters and the frame timing.
pub trait Simulation {
    fn advance(&mut self, _dt: f64, _params: &ParameterValues) {}

    fn render(&self, frame: &FrameInfo, params: &ParameterValues, surface: &mut dyn Surface);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The loop is stopped; nothing happened.
    Inactive,
    Rendered,
    /// No surface this frame; retried on the next one.
    Skipped,
}

pub struct AnimationLoop<S> {
    simulation: S,
    params: ParameterValues,
    active: bool,
    pending: Option<FrameHandle>,
    last_ms: Option<f64>,
    elapsed: f64,
    frames: u64,
    skipped: u64,
}

impl<S: Simulation> AnimationLoop<S> {
    pub fn new(simulation: S, params: ParameterValues) -> Self {
        Self {
            simulation,
            params,
            active: false,
            pending: None,
            last_ms: None,
            elapsed: 0.0,
            frames: 0,
            skipped: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    pub fn params(&self) -> &ParameterValues {
        &self.params
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn frames_skipped(&self) -> u64 {
        self.skipped
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Clamp and store; visible to the very next frame.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<f64, SimulationError> {
        self.params.set(name, value)
    }

    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.active {
            return;
        }
        self.active = true;
        self.last_ms = None;
        self.pending = Some(scheduler.request_frame());
    }

    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
        self.active = false;
        self.last_ms = None;
    }

    /// Run one frame at `now_ms` and schedule the next. At most one frame
    /// is outstanding: one requested earlier and not yet fired is cancelled.
    pub fn tick(
        &mut self,
        now_ms: f64,
        scheduler: &mut dyn FrameScheduler,
        host: &mut dyn SurfaceHost,
    ) -> TickOutcome {
        if !self.active {
            return TickOutcome::Inactive;
        }
        if let Some(stale) = self.pending.take() {
            scheduler.cancel_frame(stale);
        }

        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0).clamp(0.0, MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        self.elapsed += dt;

        self.simulation.advance(dt, &self.params);

        let frame = FrameInfo {
            now_ms,
            dt,
            elapsed: self.elapsed,
            frame: self.frames + self.skipped,
        };
        let outcome = match host.acquire() {
            Some(surface) => {
                self.simulation.render(&frame, &self.params, surface);
                self.frames += 1;
                TickOutcome::Rendered
            }
            None => {
                self.skipped += 1;
                log::debug!("no drawing surface at {:.1}ms; skipping frame", now_ms);
                TickOutcome::Skipped
            }
        };

        self.pending = Some(scheduler.request_frame());
        outcome
    }
}
