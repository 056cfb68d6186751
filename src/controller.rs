use crate::error::{RunError, SettingsError};
use crate::render::{Renderer, Surface};
use crate::schedule::{Clock, Job, Scheduler, SystemClock};
use crate::settings::Settings;
use crate::simulation::Sandpile;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Stopped,
}

impl RunPhase {
    pub fn name(&self) -> &str {
        match self {
            RunPhase::Idle => "IDLE",
            RunPhase::Running => "RUNNING",
            RunPhase::Stopped => "STOPPED",
        }
    }
}

/// Emitted when a run stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub steps: u64,
    pub elapsed: Duration,
}

/// Owns the sandpile and drives it through start/step/stop
pub struct Controller<C: Clock = SystemClock> {
    settings: Settings,
    sandpile: Sandpile,
    renderer: Renderer,
    phase: RunPhase,
    steps: u64,
    run_id: u64,
    started_at: Option<Instant>,
    last_report: Option<RunReport>,
    clock: C,
}

impl Controller<SystemClock> {
    pub fn new<S: Surface + ?Sized>(settings: Settings, surface: &mut S) -> Result<Self, SettingsError> {
        Self::with_clock(settings, surface, SystemClock)
    }
}

impl<C: Clock> Controller<C> {
    pub fn with_clock<S: Surface + ?Sized>(
        settings: Settings,
        surface: &mut S,
        clock: C,
    ) -> Result<Self, SettingsError> {
        let (width, height) = surface.size();
        let (grid_width, grid_height) = settings.grid_size(width, height)?;
        let mut controller = Self {
            sandpile: Sandpile::new(grid_width, grid_height, &settings),
            renderer: Renderer::from_settings(&settings),
            settings,
            phase: RunPhase::Idle,
            steps: 0,
            run_id: 0,
            started_at: None,
            last_report: None,
            clock,
        };
        controller.announce();
        controller.render(surface);
        Ok(controller)
    }

    /// Rebuild the grid for `settings` and the surface's current size, back to Idle.
    /// On error the previous state is kept.
    pub fn init<S: Surface + ?Sized>(&mut self, settings: Settings, surface: &mut S) -> Result<(), SettingsError> {
        let (width, height) = surface.size();
        let (grid_width, grid_height) = settings.grid_size(width, height)?;
        self.sandpile = Sandpile::new(grid_width, grid_height, &settings);
        self.renderer = Renderer::from_settings(&settings);
        self.settings = settings;
        self.phase = RunPhase::Idle;
        self.steps = 0;
        self.started_at = None;
        self.announce();
        self.render(surface);
        Ok(())
    }

    fn announce(&self) {
        log::info!(
            "initialised {}x{} grid, {} grains, threshold {}, {} ms delay",
            self.sandpile.grid_width,
            self.sandpile.grid_height,
            self.settings.initial_grains,
            self.settings.threshold,
            self.settings.step_delay_ms
        );
    }

    /// Begin stepping. Timed runs perform their first cycle immediately; fast-forward
    /// runs step to stability before returning.
    pub fn start<Q, S>(&mut self, scheduler: &mut Q, surface: &mut S) -> Result<(), RunError>
    where
        Q: Scheduler + ?Sized,
        S: Surface + ?Sized,
    {
        if self.phase == RunPhase::Running {
            log::warn!("start ignored: {}", RunError::AlreadyRunning);
            return Err(RunError::AlreadyRunning);
        }
        self.phase = RunPhase::Running;
        self.run_id += 1;
        self.started_at = Some(self.clock.now());
        log::info!("simulation started (run {})", self.run_id);

        if self.settings.is_fast_forward() {
            self.fast_forward(scheduler, surface);
        } else {
            self.cycle(scheduler);
        }
        Ok(())
    }

    /// Stop the current run and report its step count and wall-clock time
    pub fn stop(&mut self) -> Result<RunReport, RunError> {
        if self.phase != RunPhase::Running {
            log::warn!("stop ignored: {}", RunError::NotRunning);
            return Err(RunError::NotRunning);
        }
        self.phase = RunPhase::Stopped;
        let elapsed = self
            .started_at
            .map(|at| self.clock.now().saturating_duration_since(at))
            .unwrap_or_default();
        let report = RunReport {
            steps: self.steps,
            elapsed,
        };
        log::info!(
            "simulation stopped after {} steps in {} ms",
            report.steps,
            report.elapsed.as_millis()
        );
        self.last_report = Some(report);
        Ok(report)
    }

    /// Execute a job previously handed to the scheduler
    pub fn run_job<Q, S>(&mut self, job: Job, scheduler: &mut Q, surface: &mut S)
    where
        Q: Scheduler + ?Sized,
        S: Surface + ?Sized,
    {
        match job {
            Job::Render => self.render(surface),
            Job::Cycle { run } => {
                // A cycle from an earlier run, or one that fires after stop, just lapses
                if run == self.run_id && self.phase == RunPhase::Running {
                    self.cycle(scheduler);
                }
            }
        }
    }

    /// Step once and advance the counter; a step with no topples ends the run
    fn advance(&mut self) -> usize {
        let toppled = self.sandpile.step();
        if toppled > 0 {
            self.steps += 1;
        } else if let Ok(report) = self.stop() {
            log::debug!("pile settled after {} steps", report.steps);
        }
        toppled
    }

    fn cycle<Q: Scheduler + ?Sized>(&mut self, scheduler: &mut Q) {
        self.advance();
        scheduler.before_paint(Job::Render);
        if self.phase == RunPhase::Running {
            scheduler.run_after(self.settings.step_delay(), Job::Cycle { run: self.run_id });
        }
    }

    fn fast_forward<Q, S>(&mut self, scheduler: &mut Q, surface: &mut S)
    where
        Q: Scheduler + ?Sized,
        S: Surface + ?Sized,
    {
        while self.advance() != 0 {
            if self.settings.draw_on_fast_forward {
                scheduler.before_paint(Job::Render);
            }
        }
        log::debug!(
            "fast-forward reached stability: {} active cells, {} grains",
            self.sandpile.active_len(),
            self.sandpile.total_grains()
        );
        self.render(surface);
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.renderer.render(&self.sandpile, surface);
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn last_report(&self) -> Option<RunReport> {
        self.last_report
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sandpile(&self) -> &Sandpile {
        &self.sandpile
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}
