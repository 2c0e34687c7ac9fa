use crate::image::{Depth, Size};

/// Errors produced by the image primitives.
#[derive(thiserror::Error, Debug)]
pub enum CvError {
    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("unsupported channel count {0} (expected 1..=4)")]
    UnsupportedChannels(usize),

    #[error("invalid pixel buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("size mismatch (expected {expected}, got {got})")]
    SizeMismatch { expected: Size, got: Size },

    #[error("depth mismatch (expected {expected}, got {got})")]
    DepthMismatch { expected: Depth, got: Depth },

    #[error("{op} expects {expected} channel(s), got {got}")]
    ChannelMismatch {
        op: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("{op} does not support depth {depth}")]
    UnsupportedDepth { op: &'static str, depth: Depth },

    #[error("invalid {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },

    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
