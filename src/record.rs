use crate::error::ExportError;
use crate::render::Surface;
use crate::surface::PixelSurface;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Writes rendered surfaces as frames of an animated GIF
pub struct GifRecorder<W: Write> {
    encoder: gif::Encoder<W>,
    width: u16,
    height: u16,
    /// Frame delay in hundredths of a second
    delay: u16,
    frame_every: usize,
    offered: usize,
    frames: usize,
}

impl GifRecorder<BufWriter<File>> {
    pub fn create(
        path: &Path,
        size: (u32, u32),
        frame_delay: Duration,
        frame_every: usize,
    ) -> Result<Self, ExportError> {
        let file = BufWriter::new(File::create(path)?);
        log::info!("recording gif to {}", path.display());
        Self::new(file, size, frame_delay, frame_every)
    }
}

impl<W: Write> GifRecorder<W> {
    pub fn new(writer: W, size: (u32, u32), frame_delay: Duration, frame_every: usize) -> Result<Self, ExportError> {
        let (width, height) = size;
        let too_large = || ExportError::FrameTooLarge { width, height };
        let w = u16::try_from(width).map_err(|_| too_large())?;
        let h = u16::try_from(height).map_err(|_| too_large())?;
        let mut encoder = gif::Encoder::new(writer, w, h, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;
        Ok(Self {
            encoder,
            width: w,
            height: h,
            delay: (frame_delay.as_millis() / 10).clamp(2, u16::MAX as u128) as u16,
            frame_every: frame_every.max(1),
            offered: 0,
            frames: 0,
        })
    }

    /// Offer the current surface; only every `frame_every`-th offer is encoded
    pub fn offer(&mut self, surface: &PixelSurface) -> Result<(), ExportError> {
        self.offered += 1;
        if (self.offered - 1) % self.frame_every == 0 {
            self.write_frame(surface)?;
        }
        Ok(())
    }

    /// Encode the surface unconditionally (used for the final state)
    pub fn write_frame(&mut self, surface: &PixelSurface) -> Result<(), ExportError> {
        let (w, h) = surface.size();
        if (w, h) != (self.width as u32, self.height as u32) {
            return Err(ExportError::FrameTooLarge { width: w, height: h });
        }
        let mut frame = gif::Frame::from_rgb(self.width, self.height, surface.rgb_bytes());
        frame.delay = self.delay;
        self.encoder.write_frame(&frame)?;
        self.frames += 1;
        Ok(())
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Finish the stream and hand back the writer
    pub fn finish(self) -> Result<W, ExportError> {
        let frames = self.frames();
        let writer = self.encoder.into_inner()?;
        log::info!("gif finished with {} frames", frames);
        Ok(writer)
    }
}

/// Default output name for a snapshot taken at `steps`
pub fn snapshot_name(steps: u64) -> PathBuf {
    PathBuf::from(format!("sandpile-{:06}.png", steps))
}
