use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest accepted toppling threshold. At 1 a toppled cell passes `1/4 = 0` grains to
/// existing neighbors but reseeds empty ones with 1, so the pile never settles.
pub const MIN_THRESHOLD: u64 = 2;

/// Largest accepted toppling threshold (the color ramp has `threshold + 2` buckets)
pub const MAX_THRESHOLD: u64 = 1024;

/// Which neighbor coordinates receive grains when a cell topples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Boundary {
    /// Coordinates equal to the grid width/height are still in range (one guard row and column)
    #[default]
    Inclusive,
    /// Only `0..width` and `0..height` are in range
    Strict,
}

impl Boundary {
    pub fn name(&self) -> &str {
        match self {
            Boundary::Inclusive => "Inclusive",
            Boundary::Strict => "Strict",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Boundary::Inclusive => Boundary::Strict,
            Boundary::Strict => Boundary::Inclusive,
        }
    }

    pub fn prev(&self) -> Self {
        self.next()
    }

    /// Whether a neighbor at (x, y) receives grains on a `width` x `height` grid
    pub fn admits(&self, x: i64, y: i64, width: usize, height: usize) -> bool {
        let (w, h) = (width as i64, height as i64);
        match self {
            Boundary::Inclusive => x >= 0 && y >= 0 && x <= w && y <= h,
            Boundary::Strict => x >= 0 && y >= 0 && x < w && y < h,
        }
    }
}

/// How many grains a toppling cell puts into a previously empty neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpawnRule {
    /// New neighbors start with a single grain, existing ones grow by threshold/4
    #[default]
    Single,
    /// Every neighbor receives threshold/4
    Share,
}

impl SpawnRule {
    pub fn name(&self) -> &str {
        match self {
            SpawnRule::Single => "Single",
            SpawnRule::Share => "Share",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SpawnRule::Single => SpawnRule::Share,
            SpawnRule::Share => SpawnRule::Single,
        }
    }

    pub fn prev(&self) -> Self {
        self.next()
    }

    /// Grains placed in a newly created neighbor
    pub fn seed_amount(&self, threshold: u64) -> u64 {
        match self {
            SpawnRule::Single => 1,
            SpawnRule::Share => threshold / 4,
        }
    }
}

/// Run configuration, fixed from `init` until the next `init`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Grains placed on the center cell at init
    pub initial_grains: u64,
    /// Grains a cell must hold to topple
    pub threshold: u64,
    /// Edge length of one cell in surface pixels
    pub point_size: u32,
    /// Delay between timed steps in milliseconds, 0 runs to stability without yielding
    pub step_delay_ms: u64,
    /// Request a render after every step while fast-forwarding
    pub draw_on_fast_forward: bool,
    /// Shade cells by grain count instead of a single color
    pub adaptive_color: bool,
    /// Brightness held back from white by the adaptive ramp (0-255)
    pub adaptive_color_offset: u8,
    pub boundary: Boundary,
    pub spawn_rule: SpawnRule,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_grains: 100,
            threshold: 4,
            point_size: 4,
            step_delay_ms: 100,
            draw_on_fast_forward: false,
            adaptive_color: true,
            adaptive_color_offset: 0x66,
            boundary: Boundary::default(),
            spawn_rule: SpawnRule::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.initial_grains == 0 {
            return Err(SettingsError::ZeroInitialGrains);
        }
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&self.threshold) {
            return Err(SettingsError::ThresholdOutOfRange(self.threshold));
        }
        if self.point_size == 0 {
            return Err(SettingsError::ZeroPointSize);
        }
        Ok(())
    }

    /// Grid dimensions in cells for a surface of the given pixel size
    pub fn grid_size(&self, surface_width: u32, surface_height: u32) -> Result<(usize, usize), SettingsError> {
        self.validate()?;
        let width = (surface_width / self.point_size) as usize;
        let height = (surface_height / self.point_size) as usize;
        if width == 0 || height == 0 {
            return Err(SettingsError::SurfaceTooSmall {
                width: surface_width,
                height: surface_height,
                point_size: self.point_size,
            });
        }
        Ok((width, height))
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn is_fast_forward(&self) -> bool {
        self.step_delay_ms == 0
    }

    pub fn adjust_initial_grains(&mut self, delta: i64) {
        self.initial_grains = (self.initial_grains as i64 + delta).clamp(1, 1_000_000) as u64;
    }

    pub fn adjust_threshold(&mut self, delta: i64) {
        self.threshold = (self.threshold as i64 + delta).clamp(MIN_THRESHOLD as i64, MAX_THRESHOLD as i64) as u64;
    }

    pub fn adjust_point_size(&mut self, delta: i32) {
        self.point_size = (self.point_size as i32 + delta).clamp(1, 16) as u32;
    }

    pub fn adjust_step_delay(&mut self, delta: i64) {
        self.step_delay_ms = (self.step_delay_ms as i64 + delta).clamp(0, 2000) as u64;
    }

    pub fn adjust_color_offset(&mut self, delta: i32) {
        self.adaptive_color_offset = (self.adaptive_color_offset as i32 + delta).clamp(0, 255) as u8;
    }

    pub fn toggle_adaptive_color(&mut self) {
        self.adaptive_color = !self.adaptive_color;
    }

    pub fn toggle_draw_on_fast_forward(&mut self) {
        self.draw_on_fast_forward = !self.draw_on_fast_forward;
    }
}
