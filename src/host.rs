use std::cell::RefCell;
use std::rc::Rc;

use crate::audio::{AudioSink, SilentAudio};
use crate::render::RenderTarget;
use crate::session::SessionReport;
use crate::types::HudStats;

pub type FrameId = u64;

/// The host's display-refresh scheduler.
pub trait FrameHost {
    /// Monotonic clock in milliseconds.
    fn now_ms(&self) -> f64;
    /// Asks for one callback on the next refresh. The host then calls
    /// `GameEngine::frame` with the refresh timestamp.
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);
}

/// One-way push of UI values out of the engine.
pub trait EngineObserver {
    fn on_hud(&mut self, _hud: &HudStats) {}
    fn on_game_over(&mut self, _report: &SessionReport) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Collaborators handed to the engine at construction.
pub struct Host {
    pub surface: Option<Box<dyn RenderTarget>>,
    pub audio: Box<dyn AudioSink>,
    pub frames: Box<dyn FrameHost>,
    pub observer: Box<dyn EngineObserver>,
}

impl Host {
    pub fn new(surface: impl RenderTarget + 'static, frames: impl FrameHost + 'static) -> Self {
        Self {
            surface: Some(Box::new(surface)),
            audio: Box::new(SilentAudio),
            frames: Box::new(frames),
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn with_observer(mut self, observer: impl EngineObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }
}

#[derive(Debug, Default)]
struct ManualClock {
    now_ms: f64,
    next_id: FrameId,
    pending: Option<FrameId>,
    requests: u64,
    cancels: u64,
}

/// Frame host driven by hand: the caller advances the clock and fires the
/// outstanding request. Clones share the same clock.
#[derive(Clone, Debug, Default)]
pub struct ManualFrameHost {
    clock: Rc<RefCell<ManualClock>>,
}

impl ManualFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.clock.borrow_mut().now_ms += ms;
    }

    /// Advances the clock by `step_ms` and consumes the outstanding request,
    /// returning the timestamp to pass to `GameEngine::frame`.
    pub fn fire(&self, step_ms: f64) -> Option<f64> {
        let mut clock = self.clock.borrow_mut();
        clock.now_ms += step_ms;
        let now = clock.now_ms;
        clock.pending.take().map(|_| now)
    }

    pub fn pending(&self) -> Option<FrameId> {
        self.clock.borrow().pending
    }

    pub fn request_count(&self) -> u64 {
        self.clock.borrow().requests
    }

    pub fn cancel_count(&self) -> u64 {
        self.clock.borrow().cancels
    }
}

impl FrameHost for ManualFrameHost {
    fn now_ms(&self) -> f64 {
        self.clock.borrow().now_ms
    }

    fn request_frame(&mut self) -> FrameId {
        let mut clock = self.clock.borrow_mut();
        clock.next_id += 1;
        clock.requests += 1;
        let id = clock.next_id;
        clock.pending = Some(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let mut clock = self.clock.borrow_mut();
        clock.cancels += 1;
        if clock.pending == Some(id) {
            clock.pending = None;
        }
    }
}

#[derive(Debug, Default)]
struct ObserverLog {
    huds: Vec<HudStats>,
    game_overs: Vec<SessionReport>,
}

/// Observer that keeps everything it is told. Clones share the log.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    log: Rc<RefCell<ObserverLog>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hud_count(&self) -> usize {
        self.log.borrow().huds.len()
    }

    pub fn last_hud(&self) -> Option<HudStats> {
        self.log.borrow().huds.last().copied()
    }

    pub fn game_over_count(&self) -> usize {
        self.log.borrow().game_overs.len()
    }

    pub fn game_overs(&self) -> Vec<SessionReport> {
        self.log.borrow().game_overs.clone()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_hud(&mut self, hud: &HudStats) {
        self.log.borrow_mut().huds.push(*hud);
    }

    fn on_game_over(&mut self, report: &SessionReport) {
        self.log.borrow_mut().game_overs.push(report.clone());
    }
}
