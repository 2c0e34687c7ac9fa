use luacv_core::CvError;

/// Errors raised while opening a capture source.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("no frames found at '{0}'")]
    NoFrames(String),

    #[error("invalid frame pattern '{0}'")]
    InvalidPattern(String),

    #[error("camera {index} unavailable: {source}")]
    Camera {
        index: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("camera capture is not available in this build")]
    NoCameraBackend,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CvError),
}

/// Errors reported by a [`WindowSystem`](crate::WindowSystem).
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum WindowError {
    #[error("no window named '{0}'")]
    UnknownWindow(String),

    #[error("no trackbar '{trackbar}' in window '{window}'")]
    UnknownTrackbar { trackbar: String, window: String },

    #[error("trackbar maximum must be non-negative, got {0}")]
    InvalidRange(i32),
}
