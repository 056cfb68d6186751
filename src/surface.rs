use crate::color::Rgb;
use crate::error::ExportError;
use crate::render::Surface;
use image::RgbImage;
use std::path::Path;

/// In-memory pixel surface, shown in the terminal or written out as an image
pub struct PixelSurface {
    image: RgbImage,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb::WHITE.into()),
        }
    }

    /// Resize, discarding the current contents
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbImage::from_pixel(width, height, Rgb::WHITE.into());
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| Rgb::new(p[0], p[1], p[2]))
    }

    /// Raw RGB bytes, row-major
    pub fn rgb_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn save_png(&self, path: &Path) -> Result<(), ExportError> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        log::info!("saved snapshot to {}", path.display());
        Ok(())
    }
}

impl Surface for PixelSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self, color: Rgb) {
        let px: image::Rgb<u8> = color.into();
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb) {
        let (w, h) = self.image.dimensions();
        let x0 = x.clamp(0, w as i64) as u32;
        let y0 = y.clamp(0, h as i64) as u32;
        let x1 = (x + width as i64).clamp(0, w as i64) as u32;
        let y1 = (y + height as i64).clamp(0, h as i64) as u32;
        let px: image::Rgb<u8> = color.into();
        for py in y0..y1 {
            for px_x in x0..x1 {
                self.image.put_pixel(px_x, py, px);
            }
        }
    }
}
