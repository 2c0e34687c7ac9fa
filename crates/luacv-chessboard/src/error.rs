use luacv_core::Size;

/// Errors returned by the chessboard functions.
///
/// "No board in this image" is not an error; detection returns `None` then.
#[derive(thiserror::Error, Debug)]
pub enum ChessboardError {
    #[error("pattern size must be at least 3x3 inner corners, got {0}")]
    InvalidPattern(Size),
    #[error("refinement window half-size {half} does not fit a {size} image")]
    InvalidWindow { half: i64, size: Size },
}
