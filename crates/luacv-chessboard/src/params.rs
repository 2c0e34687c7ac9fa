use serde::{Deserialize, Serialize};

/// Parameters of the chessboard detector.
///
/// Every field has a default, so partial JSON or Lua tables deserialize
/// into a complete parameter set.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChessboardParams {
    /// Radius in pixels of the 16-sample ring used by the corner response.
    pub ring_radius: f32,

    /// Candidates below `threshold_rel * max_response` are discarded.
    pub threshold_rel: f32,

    /// Non-maximum suppression radius in pixels.
    pub nms_radius: u32,

    /// Relative tolerance on the distance between grid neighbours,
    /// measured against the median nearest-neighbour spacing.
    pub spacing_tolerance: f32,

    /// Maximal deviation of a neighbour edge from the grid axes.
    pub orientation_tolerance_deg: f32,

    /// Candidates closer than this are merged, keeping the strongest.
    pub min_spacing_pix: f32,
}

impl Default for ChessboardParams {
    fn default() -> Self {
        Self {
            ring_radius: 5.0,
            threshold_rel: 0.2,
            nms_radius: 2,
            spacing_tolerance: 0.35,
            orientation_tolerance_deg: 22.5,
            min_spacing_pix: 5.0,
        }
    }
}
