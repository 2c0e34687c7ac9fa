//! Chessboard detection for the `luacv` bindings.
//!
//! Pipeline:
//! 1. ChESS corner response on the luminance plane.
//! 2. Thresholded non-maximum suppression, centroid refinement and merging
//!    of near-duplicate peaks.
//! 3. Spacing and grid axis estimated from nearest neighbours.
//! 4. A 4-connected grid graph over the peaks; the largest component gets
//!    integer coordinates by BFS.
//! 5. The component is accepted only if it is exactly the requested
//!    pattern, then laid out row by row.
//!
//! [`find_corner_subpix`] refines corner positions and
//! [`draw_chessboard_corners`] renders them.

mod detector;
mod draw;
mod error;
mod grid;
mod params;
mod response;
mod subpix;

pub use detector::{find_chessboard_corners, ChessboardDetector};
pub use draw::draw_chessboard_corners;
pub use error::ChessboardError;
pub use grid::{GridGraph, NeighborDirection, NodeNeighbor};
pub use params::ChessboardParams;
pub use response::{chess_response, Candidate};
pub use subpix::find_corner_subpix;
