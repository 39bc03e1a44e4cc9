/// Errors surfaced by the inspection pipeline.
///
/// Only input validation and debug output can fail; every other stage is
/// deterministic once the input has been accepted.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// The pixel buffer holds no data.
    #[error("input image data is empty")]
    EmptyImage,

    /// One of the image dimensions is zero.
    #[error("invalid image dimensions: {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    /// Only grayscale (1) and RGB (3) buffers are accepted.
    #[error("unsupported channel count {0}, expected 1 or 3")]
    UnsupportedChannels(u8),

    /// Buffer length does not match `width * height * channels`.
    #[error("buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("invalid inspector configuration: {0}")]
    InvalidConfig(String),

    #[error("debug directory is not empty: {}", .0.display())]
    DebugDirNotEmpty(std::path::PathBuf),

    #[error("failed to write debug output: {0}")]
    DebugIo(#[from] std::io::Error),

    #[error("failed to encode debug image: {0}")]
    DebugImage(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, InspectError>;
