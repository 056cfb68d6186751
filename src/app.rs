use crate::blocks;
use crate::controller::Controller;
use crate::error::SettingsError;
use crate::record;
use crate::schedule::{Clock, SystemClock, TaskQueue};
use crate::settings::Settings;
use crate::surface::PixelSurface;
use std::time::Instant;

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Adaptive,
    Boundary,
    Delay,
    DrawFastForward,
    Grains,
    Offset,
    PointSize,
    Spawn,
    Threshold,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None => Focus::Adaptive,
            Focus::Adaptive => Focus::Boundary,
            Focus::Boundary => Focus::Delay,
            Focus::Delay => Focus::DrawFastForward,
            Focus::DrawFastForward => Focus::Grains,
            Focus::Grains => Focus::Offset,
            Focus::Offset => Focus::PointSize,
            Focus::PointSize => Focus::Spawn,
            Focus::Spawn => Focus::Threshold,
            Focus::Threshold => Focus::Adaptive,
        }
    }

    /// Shift+Tab cycles through parameters in reverse alphabetical order
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None => Focus::Threshold,
            Focus::Adaptive => Focus::Threshold,
            Focus::Boundary => Focus::Adaptive,
            Focus::Delay => Focus::Boundary,
            Focus::DrawFastForward => Focus::Delay,
            Focus::Grains => Focus::DrawFastForward,
            Focus::Offset => Focus::Grains,
            Focus::PointSize => Focus::Offset,
            Focus::Spawn => Focus::PointSize,
            Focus::Threshold => Focus::Spawn,
        }
    }

    /// Line index in the parameters box
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Adaptive => 0,
            Focus::Boundary => 1,
            Focus::Delay => 2,
            Focus::DrawFastForward => 3,
            Focus::Grains => 4,
            Focus::Offset => 5,
            Focus::PointSize => 6,
            Focus::Spawn => 7,
            Focus::Threshold => 8,
        }
    }
}

/// Main application state
pub struct App {
    pub controller: Controller,
    pub queue: TaskQueue,
    pub surface: PixelSurface,
    /// Settings for the next init; edits take effect by re-initialising
    pub settings: Settings,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    /// One-line feedback shown in the status box
    pub message: Option<String>,
}

impl App {
    pub fn new(canvas_width: u16, canvas_height: u16, settings: Settings) -> Result<Self, SettingsError> {
        let (width, height) = blocks::calculate_surface_size(canvas_width, canvas_height);
        let mut surface = PixelSurface::new(width, height);
        let controller = Controller::new(settings.clone(), &mut surface)?;
        Ok(Self {
            controller,
            queue: TaskQueue::new(SystemClock.now()),
            surface,
            settings,
            focus: Focus::None,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            message: None,
        })
    }

    /// Run paint requests made since the last frame
    pub fn paint(&mut self) {
        for job in self.queue.take_paint_jobs() {
            self.controller.run_job(job, &mut self.queue, &mut self.surface);
        }
    }

    /// Fire every timer that is due at `now`
    pub fn tick(&mut self, now: Instant) {
        self.queue.advance_to(now);
        for job in self.queue.drain_due() {
            self.controller.run_job(job, &mut self.queue, &mut self.surface);
        }
    }

    /// Start when idle or stopped, stop when running
    pub fn toggle_running(&mut self) {
        if self.controller.is_running() {
            if let Ok(report) = self.controller.stop() {
                self.message = Some(format!("stopped after {} steps", report.steps));
            }
        } else if self.controller.start(&mut self.queue, &mut self.surface).is_ok() {
            self.message = None;
        }
    }

    /// Re-initialise with the pending settings
    pub fn reinit(&mut self) {
        match self.controller.init(self.settings.clone(), &mut self.surface) {
            Ok(()) => self.message = None,
            Err(err) => {
                log::warn!("init rejected: {}", err);
                self.message = Some(err.to_string());
                // Keep the pending settings in sync with what is actually running
                self.settings = self.controller.settings().clone();
            }
        }
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(1);
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(-1);
    }

    fn adjust_focused(&mut self, dir: i32) {
        let s = &mut self.settings;
        match self.focus {
            Focus::None => return,
            Focus::Adaptive => s.toggle_adaptive_color(),
            Focus::Boundary => s.boundary = if dir > 0 { s.boundary.next() } else { s.boundary.prev() },
            Focus::Delay => s.adjust_step_delay(dir as i64 * 10),
            Focus::DrawFastForward => s.toggle_draw_on_fast_forward(),
            Focus::Grains => {
                // Coarser steps for bigger piles
                let magnitude = match s.initial_grains {
                    0..=999 => 10,
                    1000..=9_999 => 100,
                    _ => 1000,
                };
                s.adjust_initial_grains(dir as i64 * magnitude);
            }
            Focus::Offset => s.adjust_color_offset(dir * 8),
            Focus::PointSize => s.adjust_point_size(dir),
            Focus::Spawn => s.spawn_rule = if dir > 0 { s.spawn_rule.next() } else { s.spawn_rule.prev() },
            Focus::Threshold => s.adjust_threshold(dir as i64),
        }
        self.reinit();
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Faster steps (shorter delay)
    pub fn increase_speed(&mut self) {
        self.settings.adjust_step_delay(-10);
        self.reinit();
    }

    /// Slower steps (longer delay)
    pub fn decrease_speed(&mut self) {
        self.settings.adjust_step_delay(10);
        self.reinit();
    }

    pub fn toggle_adaptive_color(&mut self) {
        self.settings.toggle_adaptive_color();
        self.reinit();
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Write the current surface to a PNG in the working directory
    pub fn save_snapshot(&mut self) {
        let path = record::snapshot_name(self.controller.steps());
        self.message = Some(match self.surface.save_png(&path) {
            Ok(()) => format!("saved {}", path.display()),
            Err(err) => {
                log::warn!("snapshot failed: {}", err);
                format!("snapshot failed: {}", err)
            }
        });
    }

    /// Resize the surface to the new canvas and start over on a grid that fits it
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        let (width, height) = blocks::calculate_surface_size(canvas_width, canvas_height);
        self.surface.resize(width, height);
        self.reinit();
    }
}
