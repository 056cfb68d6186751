use crate::color::{ColorMapper, Rgb};
use crate::settings::Settings;
use crate::simulation::Sandpile;

/// Pixel target the renderer paints into
pub trait Surface {
    /// (width, height) in pixels
    fn size(&self) -> (u32, u32);
    fn clear(&mut self, color: Rgb);
    /// Fill a rectangle; parts outside the surface are clipped
    fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb);
}

/// How each cell picks its color
#[derive(Debug, Clone, PartialEq)]
pub enum CellPaint {
    Adaptive(ColorMapper),
    Fixed(Rgb),
}

impl CellPaint {
    pub fn color_for(&self, grains: u64) -> Rgb {
        match self {
            CellPaint::Adaptive(mapper) => mapper.color_for(grains),
            CellPaint::Fixed(color) => *color,
        }
    }
}

/// Paints the active cells of a sandpile as squares of `point_size` pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Renderer {
    pub point_size: u32,
    pub background: Rgb,
    pub paint: CellPaint,
}

impl Renderer {
    pub fn from_settings(settings: &Settings) -> Self {
        let paint = if settings.adaptive_color {
            CellPaint::Adaptive(ColorMapper::new(settings.threshold, settings.adaptive_color_offset))
        } else {
            CellPaint::Fixed(Rgb::BLACK)
        };
        Self {
            point_size: settings.point_size,
            background: Rgb::WHITE,
            paint,
        }
    }

    /// Top-left pixel of the square centered on a cell
    pub fn cell_origin(&self, x: usize, y: usize) -> (i64, i64) {
        let ps = self.point_size as i64;
        (x as i64 * ps - ps / 2, y as i64 * ps - ps / 2)
    }

    pub fn render<S: Surface + ?Sized>(&self, sandpile: &Sandpile, surface: &mut S) {
        surface.clear(self.background);
        for cell in sandpile.cells() {
            let (px, py) = self.cell_origin(cell.x, cell.y);
            surface.fill_rect(px, py, self.point_size, self.point_size, self.paint.color_for(cell.grains));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Surface that records every call
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub width: u32,
        pub height: u32,
        pub clears: Vec<Rgb>,
        pub rects: Vec<(i64, i64, u32, u32, Rgb)>,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                ..Default::default()
            }
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn clear(&mut self, color: Rgb) {
            self.clears.push(color);
            self.rects.clear();
        }

        fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb) {
            self.rects.push((x, y, width, height, color));
        }
    }

    #[test]
    fn test_render_paints_every_active_cell() {
        let settings = Settings {
            initial_grains: 8,
            ..Default::default()
        };
        let mut pile = Sandpile::new(10, 10, &settings);
        pile.step();

        let renderer = Renderer::from_settings(&settings);
        let mut surface = RecordingSurface::new(40, 40);
        renderer.render(&pile, &mut surface);

        assert_eq!(surface.clears, vec![Rgb::WHITE]);
        assert_eq!(surface.rects.len(), 5);
        // First painted cell is the upper neighbor (5, 4) with one grain
        assert_eq!(surface.rects[0], (18, 14, 4, 4, Rgb::gray(125)));
        // Seed keeps 4 grains
        assert_eq!(surface.rects[4], (18, 18, 4, 4, Rgb::gray(50)));
    }

    #[test]
    fn test_fixed_color_when_adaptive_disabled() {
        let settings = Settings {
            adaptive_color: false,
            initial_grains: 3,
            ..Default::default()
        };
        let pile = Sandpile::new(10, 10, &settings);
        let renderer = Renderer::from_settings(&settings);
        let mut surface = RecordingSurface::new(40, 40);
        renderer.render(&pile, &mut surface);

        assert_eq!(surface.clears, vec![Rgb::WHITE]);
        assert_eq!(surface.rects, vec![(18, 18, 4, 4, Rgb::BLACK)]);
    }

    #[test]
    fn test_cell_origin_is_centered() {
        let renderer = Renderer {
            point_size: 5,
            background: Rgb::WHITE,
            paint: CellPaint::Fixed(Rgb::BLACK),
        };
        assert_eq!(renderer.cell_origin(0, 0), (-2, -2));
        assert_eq!(renderer.cell_origin(3, 1), (13, 3));
    }

    #[test]
    fn test_render_leaves_simulation_untouched() {
        let settings = Settings::default();
        let pile = Sandpile::new(10, 10, &settings);
        let renderer = Renderer::from_settings(&settings);
        let mut surface = RecordingSurface::new(40, 40);
        renderer.render(&pile, &mut surface);
        renderer.render(&pile, &mut surface);
        assert_eq!(pile.total_grains(), 100);
        assert_eq!(pile.active_len(), 1);
    }
}
