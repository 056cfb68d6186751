use std::fmt;

/// 24-bit color shared by every surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::gray(0xFF);
    pub const BLACK: Rgb = Rgb::gray(0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> Self {
        ratatui::style::Color::Rgb(c.r, c.g, c.b)
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(c: Rgb) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

/// Grayscale ramp from near-white (few grains) to black (overflowing cells).
///
/// There are `threshold + 2` buckets. Counts up to the threshold get their own bucket,
/// counts up to twice the threshold share the second darkest, anything above is black.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapper {
    threshold: u64,
    buckets: Vec<Rgb>,
}

impl ColorMapper {
    pub fn new(threshold: u64, offset: u8) -> Self {
        let count = threshold as usize + 2;
        let step = (0xFF - offset as usize) / count;
        let buckets = (1..=count)
            .map(|i| Rgb::gray(((count - i) * step) as u8))
            .collect();
        Self { threshold, buckets }
    }

    pub fn buckets(&self) -> &[Rgb] {
        &self.buckets
    }

    pub fn bucket_index(&self, grains: u64) -> usize {
        let last = self.buckets.len() - 1;
        if grains <= self.threshold {
            grains.saturating_sub(1) as usize
        } else if grains <= self.threshold * 2 {
            last - 1
        } else {
            last
        }
    }

    pub fn color_for(&self, grains: u64) -> Rgb {
        self.buckets[self.bucket_index(grains)]
    }
}
