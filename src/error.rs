use std::path::PathBuf;
use thiserror::Error;

/// Settings that cannot produce a valid run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("initial grains must be at least 1")]
    ZeroInitialGrains,
    #[error(
        "threshold {0} is outside {min}..={max}",
        min = crate::settings::MIN_THRESHOLD,
        max = crate::settings::MAX_THRESHOLD
    )]
    ThresholdOutOfRange(u64),
    #[error("point size must be at least 1 pixel")]
    ZeroPointSize,
    #[error("a {width}x{height} surface holds no {point_size}px cells")]
    SurfaceTooSmall {
        width: u32,
        height: u32,
        point_size: u32,
    },
}

/// Lifecycle calls made in the wrong phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("simulation is already running")]
    AlreadyRunning,
    #[error("simulation is not running")]
    NotRunning,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to encode gif: {0}")]
    Gif(#[from] gif::EncodingError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("surface {width}x{height} is too large for a gif frame")]
    FrameTooLarge { width: u32, height: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_message_names_range() {
        let msg = SettingsError::ThresholdOutOfRange(1).to_string();
        assert_eq!(msg, "threshold 1 is outside 2..=1024");
    }

    #[test]
    fn test_surface_too_small_message() {
        let err = SettingsError::SurfaceTooSmall {
            width: 3,
            height: 2,
            point_size: 4,
        };
        assert_eq!(err.to_string(), "a 3x2 surface holds no 4px cells");
    }
}
