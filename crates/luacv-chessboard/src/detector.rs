use std::collections::HashMap;

use luacv_core::{Image, Size};
use nalgebra::{Point2, Vector2};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::ChessboardError;
use crate::grid::{estimate_axis, estimate_spacing, GridGraph};
use crate::params::ChessboardParams;
use crate::response::{chess_response, find_peaks, merge_close};

/// Chessboard detector: ChESS response peaks assembled into a grid graph.
pub struct ChessboardDetector {
    pub params: ChessboardParams,
}

impl ChessboardDetector {
    pub fn new(params: ChessboardParams) -> Self {
        Self { params }
    }

    /// Find the `pattern.width x pattern.height` inner corners of a board.
    ///
    /// Returns the corners row by row (left to right, top to bottom in the
    /// image), or `None` unless the complete pattern was found.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, img), fields(width = img.width(), height = img.height(), pattern = %pattern))
    )]
    pub fn detect(
        &self,
        img: &Image,
        pattern: Size,
    ) -> Result<Option<Vec<Point2<f32>>>, ChessboardError> {
        if pattern.width < 3 || pattern.height < 3 {
            return Err(ChessboardError::InvalidPattern(pattern));
        }
        let expected = pattern.area();

        let plane = img.to_gray_plane();
        let response = chess_response(&plane.view(), &self.params);
        let peaks = merge_close(
            find_peaks(&response, &self.params),
            self.params.min_spacing_pix,
        );
        log::debug!(
            "{} corner candidates for a {} pattern",
            peaks.len(),
            pattern
        );
        if peaks.len() < expected {
            return Ok(None);
        }

        let points: Vec<Point2<f32>> = peaks.iter().map(|c| c.position).collect();
        let (Some(spacing), Some(axis)) = (
            estimate_spacing(&points, self.params.min_spacing_pix),
            estimate_axis(&points),
        ) else {
            return Ok(None);
        };
        log::debug!(
            "grid spacing {spacing:.2}px, axis {:.1} deg",
            axis.to_degrees()
        );

        let graph = GridGraph::new(&points, spacing, axis, &self.params);
        let Some(component) = graph
            .connected_components()
            .into_iter()
            .max_by_key(Vec::len)
        else {
            return Ok(None);
        };
        if component.len() != expected {
            log::debug!(
                "largest grid component has {} corners, expected {}",
                component.len(),
                expected
            );
            return Ok(None);
        }

        let Some(coords) = graph.assign_grid_coordinates(&component) else {
            return Ok(None);
        };
        Ok(order_corners(&points, &coords, pattern))
    }
}

/// Convenience wrapper around [`ChessboardDetector::detect`].
pub fn find_chessboard_corners(
    img: &Image,
    pattern: Size,
    params: &ChessboardParams,
) -> Result<Option<Vec<Point2<f32>>>, ChessboardError> {
    ChessboardDetector::new(params.clone()).detect(img, pattern)
}

/// Lay the grid out as `pattern` and fix its orientation: rows run towards
/// +x and columns towards +y. For square patterns the more horizontal grid
/// axis becomes the row axis.
fn order_corners(
    points: &[Point2<f32>],
    coords: &HashMap<usize, (i32, i32)>,
    pattern: Size,
) -> Option<Vec<Point2<f32>>> {
    let cols = coords.values().map(|c| c.0).max()? + 1;
    let rows = coords.values().map(|c| c.1).max()? + 1;
    let (w, h) = (pattern.width as i32, pattern.height as i32);

    let mut transpose = if cols == w && rows == h {
        false
    } else if cols == h && rows == w {
        true
    } else {
        log::debug!("grid is {cols}x{rows}, pattern is {pattern}");
        return None;
    };

    let cells: HashMap<(i32, i32), Point2<f32>> = coords
        .iter()
        .map(|(&node, &ij)| (ij, points[node]))
        .collect();
    let at = |i: i32, j: i32, transpose: bool| -> Option<Point2<f32>> {
        let key = if transpose { (j, i) } else { (i, j) };
        cells.get(&key).copied()
    };
    let axes = |transpose: bool| -> Option<(Vector2<f32>, Vector2<f32>)> {
        let origin = at(0, 0, transpose)?;
        Some((
            at(w - 1, 0, transpose)? - origin,
            at(0, h - 1, transpose)? - origin,
        ))
    };

    let (mut row_vec, mut col_vec) = axes(transpose)?;
    if w == h && row_vec.x.abs() < col_vec.x.abs() {
        transpose = !transpose;
        (row_vec, col_vec) = axes(transpose)?;
    }
    let flip_i = row_vec.x < 0.0;
    let flip_j = col_vec.y < 0.0;

    let mut ordered = Vec::with_capacity(pattern.area());
    for j in 0..h {
        for i in 0..w {
            let si = if flip_i { w - 1 - i } else { i };
            let sj = if flip_j { h - 1 - j } else { j };
            ordered.push(at(si, sj, transpose)?);
        }
    }
    Some(ordered)
}
