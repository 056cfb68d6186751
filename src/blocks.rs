use crate::render::Surface;
use crate::surface::PixelSurface;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// Half-block rendering for terminal graphics.
/// Each character cell shows two vertically stacked pixels: the upper one as the
/// foreground of `▀`, the lower one as the background.
const UPPER_HALF: char = '\u{2580}';

/// Colors of one character cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockCell {
    pub top: Color,
    pub bottom: Color,
}

impl BlockCell {
    fn span(self) -> Span<'static> {
        Span::styled(UPPER_HALF.to_string(), Style::default().fg(self.top).bg(self.bottom))
    }
}

/// Sample the surface into `canvas_width` x `canvas_height` character cells
pub fn sample_blocks(surface: &PixelSurface, canvas_width: u16, canvas_height: u16) -> Vec<Vec<BlockCell>> {
    let (sw, sh) = surface.size();
    let pixel_height = canvas_height as u32 * 2;
    let pixel = |x: u32, y: u32| -> Color {
        if sw == 0 || sh == 0 {
            return Color::Reset;
        }
        // Scale when the surface lags behind a resize
        let sx = (x as u64 * sw as u64 / canvas_width.max(1) as u64) as u32;
        let sy = (y as u64 * sh as u64 / pixel_height.max(1) as u64) as u32;
        surface.pixel(sx, sy).map(Color::from).unwrap_or(Color::Reset)
    };

    (0..canvas_height as u32)
        .map(|row| {
            (0..canvas_width as u32)
                .map(|col| BlockCell {
                    top: pixel(col, row * 2),
                    bottom: pixel(col, row * 2 + 1),
                })
                .collect()
        })
        .collect()
}

/// Render the surface as lines of half-block characters
pub fn render_to_lines(surface: &PixelSurface, canvas_width: u16, canvas_height: u16) -> Vec<Line<'static>> {
    sample_blocks(surface, canvas_width, canvas_height)
        .into_iter()
        .map(|row| Line::from(row.into_iter().map(BlockCell::span).collect::<Vec<_>>()))
        .collect()
}

/// Pixel surface size for a canvas of character cells
pub fn calculate_surface_size(canvas_width: u16, canvas_height: u16) -> (u32, u32) {
    (canvas_width.max(1) as u32, canvas_height.max(1) as u32 * 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn test_surface_size_doubles_rows() {
        assert_eq!(calculate_surface_size(80, 24), (80, 48));
        assert_eq!(calculate_surface_size(0, 0), (1, 2));
    }

    #[test]
    fn test_pixels_pair_into_cells() {
        let mut surface = PixelSurface::new(2, 4);
        surface.fill_rect(0, 0, 1, 1, Rgb::BLACK);
        surface.fill_rect(1, 3, 1, 1, Rgb::gray(50));

        let cells = sample_blocks(&surface, 2, 2);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0][0].top, Color::Rgb(0, 0, 0));
        assert_eq!(cells[0][0].bottom, Color::Rgb(255, 255, 255));
        assert_eq!(cells[1][1].top, Color::Rgb(255, 255, 255));
        assert_eq!(cells[1][1].bottom, Color::Rgb(50, 50, 50));
    }

    #[test]
    fn test_lines_use_upper_half_block() {
        let surface = PixelSurface::new(3, 2);
        let lines = render_to_lines(&surface, 3, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans.len(), 3);
        assert_eq!(lines[0].spans[0].content, "\u{2580}");
    }

    #[test]
    fn test_scales_stale_surface() {
        let mut surface = PixelSurface::new(4, 4);
        surface.clear(Rgb::BLACK);
        let cells = sample_blocks(&surface, 8, 4);
        assert!(cells.iter().flatten().all(|c| c.top == Color::Rgb(0, 0, 0)));
    }
}
