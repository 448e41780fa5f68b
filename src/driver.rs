//! Frame loop lifecycle
//!
//! [`GameLoop`] owns the session and walks it through
//! `Uninitialized -> Active -> GameOver -> Active`. Each frame it samples
//! input, ticks the simulation, draws, and asks the scheduler for the next
//! frame. Once the session is over it stops asking.

use glam::Vec2;

use crate::platform::{Clock, FrameScheduler, FrameToken, InputState, KeyAction};
use crate::renderer::{RenderOptions, Surface, render_frame};
use crate::sim::{GamePhase, GameState, tick};

/// What the host should do after a frame or an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Next frame is scheduled
    Continue,
    /// Nothing ran (not started, already over, or torn down)
    Idle,
    /// The session just ended; report this score
    GameOver { final_score: u64 },
}

/// Rolling frames-per-second over the last 60 frames
#[derive(Debug, Clone)]
struct FpsCounter {
    frame_times: [f64; 60],
    index: usize,
    fps: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frame_times: [0.0; 60],
            index: 0,
            fps: 0,
        }
    }

    fn record(&mut self, now: f64) {
        self.frame_times[self.index] = now;
        self.index = (self.index + 1) % self.frame_times.len();
        let oldest = self.frame_times[self.index];
        if oldest > 0.0 && now > oldest {
            self.fps = (60_000.0 / (now - oldest)).round() as u32;
        }
    }
}

pub struct GameLoop<C, S, R> {
    state: GameState,
    clock: C,
    scheduler: S,
    surface: Option<R>,
    input: InputState,
    options: RenderOptions,
    pending: Option<FrameToken>,
    /// `start` was called before a surface existed
    start_deferred: bool,
    torn_down: bool,
    fps: FpsCounter,
}

impl<C: Clock, S: FrameScheduler, R: Surface> GameLoop<C, S, R> {
    pub fn new(state: GameState, clock: C, scheduler: S) -> Self {
        Self {
            state,
            clock,
            scheduler,
            surface: None,
            input: InputState::new(),
            options: RenderOptions::default(),
            pending: None,
            start_deferred: false,
            torn_down: false,
            fps: FpsCounter::new(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn surface(&self) -> Option<&R> {
        self.surface.as_ref()
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// Provide the render surface. Runs a deferred `start`.
    pub fn attach_surface(&mut self, surface: R) {
        self.surface = Some(surface);
        if self.start_deferred {
            self.start_deferred = false;
            self.start();
        }
    }

    /// Begin the first session. Without a surface this only remembers the
    /// request; `attach_surface` finishes it.
    pub fn start(&mut self) -> bool {
        if self.torn_down || self.state.phase != GamePhase::Uninitialized {
            return false;
        }
        let Some(viewport) = self.viewport() else {
            log::debug!("Render surface not ready; deferring start");
            self.start_deferred = true;
            return false;
        };
        self.begin_session(viewport);
        true
    }

    /// Run one scheduled frame
    pub fn run_frame(&mut self) -> FrameOutcome {
        self.pending = None;
        if self.torn_down || !self.state.is_active() {
            return FrameOutcome::Idle;
        }

        let now = self.clock.now_ms();
        let input = self.input.take_tick_input();
        tick(&mut self.state, &input, now);
        self.fps.record(now);

        if let Some(surface) = self.surface.as_mut() {
            render_frame(&self.state, surface, self.options);
        }

        if self.state.phase == GamePhase::GameOver {
            log::info!(
                "Game over after {} frames, score {}",
                self.state.frame,
                self.state.score
            );
            return FrameOutcome::GameOver {
                final_score: self.state.score,
            };
        }

        self.schedule();
        FrameOutcome::Continue
    }

    /// Route a key press
    pub fn press(&mut self, action: KeyAction) -> FrameOutcome {
        match action {
            KeyAction::Boost => {
                self.input.press_boost();
                FrameOutcome::Idle
            }
            KeyAction::Restart => {
                self.restart();
                FrameOutcome::Idle
            }
            KeyAction::EndGame => match self.end_game() {
                Some(final_score) => FrameOutcome::GameOver { final_score },
                None => FrameOutcome::Idle,
            },
        }
    }

    /// Explicit "end game": freeze the score and stop scheduling.
    /// Returns the final score if a session was running.
    pub fn end_game(&mut self) -> Option<u64> {
        let score = self.state.end()?;
        self.cancel_pending();
        Some(score)
    }

    /// Start a fresh session after game over
    pub fn restart(&mut self) -> bool {
        if self.torn_down || self.state.phase != GamePhase::GameOver {
            return false;
        }
        let Some(viewport) = self.viewport() else {
            return false;
        };
        self.input.clear_actions();
        self.begin_session(viewport);
        true
    }

    /// Display size changed. Only the viewport moves; entities stay put.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.camera.resize(width, height);
        log::debug!("Viewport resized to {}x{}", width, height);
    }

    /// Stop for good: cancel the pending frame and ignore anything late
    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.torn_down = true;
        self.surface = None;
        log::info!("Game loop torn down");
    }

    fn viewport(&self) -> Option<Vec2> {
        self.surface.as_ref().map(|s| s.size())
    }

    fn begin_session(&mut self, viewport: Vec2) {
        let now = self.clock.now_ms();
        self.state.init(now, viewport);
        self.cancel_pending();
        self.schedule();
    }

    fn schedule(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.scheduler.request());
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
        }
    }
}
