//! ChESS corner response, non-maximum suppression and peak refinement.
//!
//! For the 16 ring samples `I_0..I_15` around a pixel:
//!
//! ```text
//! SR = sum_{n=0..3} |(I_n + I_{n+8}) - (I_{n+4} + I_{n+12})|
//! DR = sum_{n=0..7} |I_n - I_{n+8}|
//! MR = |mean(ring) - mean(local cross)|
//! R  = SR - DR - 16 * MR
//! ```
//!
//! X-junctions give a large positive `R`; edges and L-junctions go negative.

use luacv_core::{sample_bilinear, GrayPlane, GrayPlaneView};
use nalgebra::Point2;

use crate::params::ChessboardParams;

const RING: usize = 16;

/// A response peak in pixel coordinates.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub position: Point2<f32>,
    pub strength: f32,
}

fn ring_offsets(radius: f32) -> [(f32, f32); RING] {
    let mut offsets = [(0.0, 0.0); RING];
    for (n, slot) in offsets.iter_mut().enumerate() {
        let theta = n as f32 * std::f32::consts::TAU / RING as f32;
        *slot = (radius * theta.cos(), radius * theta.sin());
    }
    offsets
}

fn response_at(src: &GrayPlaneView<'_>, x: usize, y: usize, ring: &[(f32, f32); RING]) -> f32 {
    let (fx, fy) = (x as f32, y as f32);
    let mut samples = [0.0f32; RING];
    for (s, (dx, dy)) in samples.iter_mut().zip(ring) {
        *s = sample_bilinear(src, fx + dx, fy + dy);
    }

    let sum_response: f32 = (0..4)
        .map(|n| ((samples[n] + samples[n + 8]) - (samples[n + 4] + samples[n + 12])).abs())
        .sum();
    let diff_response: f32 = (0..8).map(|n| (samples[n] - samples[n + 8]).abs()).sum();

    let ring_mean = samples.iter().sum::<f32>() / RING as f32;
    let at = |x: usize, y: usize| src.data[y * src.width + x];
    let local_mean = (at(x, y) + at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1)) / 5.0;
    let mean_response = (ring_mean - local_mean).abs();

    sum_response - diff_response - RING as f32 * mean_response
}

/// Dense response map; pixels closer than the ring radius to the border
/// stay at zero.
pub fn chess_response(src: &GrayPlaneView<'_>, params: &ChessboardParams) -> GrayPlane {
    let mut out = GrayPlane::new(src.width, src.height);
    let ring = ring_offsets(params.ring_radius);
    let margin = params.ring_radius.ceil() as usize + 1;
    if src.width <= 2 * margin || src.height <= 2 * margin {
        return out;
    }

    for y in margin..src.height - margin {
        for x in margin..src.width - margin {
            out.set(x, y, response_at(src, x, y, &ring));
        }
    }
    out
}

/// Local maxima of `response` above the relative threshold.
///
/// Plateaus resolve to their first pixel in scan order: a pixel survives
/// when it is strictly greater than the neighbours scanned before it and
/// not smaller than the ones after it.
pub fn find_peaks(response: &GrayPlane, params: &ChessboardParams) -> Vec<Candidate> {
    let max = response.data.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let threshold = params.threshold_rel * max;
    let r = params.nms_radius as i64;
    let (w, h) = (response.width as i64, response.height as i64);

    let mut peaks = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let v = response.at(x as usize, y as usize);
            if v <= 0.0 || v < threshold {
                continue;
            }
            let mut is_peak = true;
            'window: for ny in (y - r).max(0)..=(y + r).min(h - 1) {
                for nx in (x - r).max(0)..=(x + r).min(w - 1) {
                    if nx == x && ny == y {
                        continue;
                    }
                    let n = response.at(nx as usize, ny as usize);
                    let earlier = (ny, nx) < (y, x);
                    if n > v || (earlier && n == v) {
                        is_peak = false;
                        break 'window;
                    }
                }
            }
            if is_peak {
                peaks.push(Candidate {
                    position: refine_peak(response, x as usize, y as usize),
                    strength: v,
                });
            }
        }
    }
    peaks
}

/// Response-weighted centroid of the positive values in a 5x5 window.
fn refine_peak(response: &GrayPlane, x: usize, y: usize) -> Point2<f32> {
    let (mut sx, mut sy, mut sw) = (0.0f32, 0.0f32, 0.0f32);
    let x0 = x.saturating_sub(2);
    let y0 = y.saturating_sub(2);
    for ny in y0..=(y + 2).min(response.height - 1) {
        for nx in x0..=(x + 2).min(response.width - 1) {
            let v = response.at(nx, ny).max(0.0);
            sx += v * nx as f32;
            sy += v * ny as f32;
            sw += v;
        }
    }
    if sw > 0.0 {
        Point2::new(sx / sw, sy / sw)
    } else {
        Point2::new(x as f32, y as f32)
    }
}

/// Merge candidates closer than `min_distance`, keeping the strongest.
pub fn merge_close(mut candidates: Vec<Candidate>, min_distance: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    let min_sq = min_distance * min_distance;
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if kept
            .iter()
            .all(|k| (k.position - c.position).norm_squared() >= min_sq)
        {
            kept.push(c);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four quadrants meeting at (cx, cy), sampled at pixel centres.
    fn x_junction(size: usize, cx: f32, cy: f32) -> GrayPlane {
        let mut plane = GrayPlane::new(size, size);
        for y in 0..size {
            for x in 0..size {
                let dark = ((x as f32) < cx) ^ ((y as f32) < cy);
                plane.set(x, y, if dark { 0.0 } else { 255.0 });
            }
        }
        plane
    }

    #[test]
    fn x_junction_is_a_single_positive_peak() {
        let plane = x_junction(31, 15.5, 15.5);
        let params = ChessboardParams::default();
        let response = chess_response(&plane.view(), &params);

        assert!(response.at(15, 15) > 0.0);
        let peaks = find_peaks(&response, &params);
        assert_eq!(1, peaks.len());
        let p = peaks[0].position;
        assert!((p.x - 15.5).abs() < 0.6 && (p.y - 15.5).abs() < 0.6, "{p:?}");
    }

    #[test]
    fn straight_edges_do_not_respond() {
        let mut plane = GrayPlane::new(31, 31);
        for y in 0..31 {
            for x in 16..31 {
                plane.set(x, y, 255.0);
            }
        }
        let params = ChessboardParams::default();
        let response = chess_response(&plane.view(), &params);
        assert!(find_peaks(&response, &params).is_empty());
    }

    #[test]
    fn close_candidates_collapse_to_the_strongest() {
        let c = |x: f32, s: f32| Candidate {
            position: Point2::new(x, 0.0),
            strength: s,
        };
        let merged = merge_close(vec![c(0.0, 1.0), c(2.0, 3.0), c(20.0, 2.0)], 5.0);
        assert_eq!(2, merged.len());
        assert_eq!(2.0, merged[0].position.x);
        assert_eq!(20.0, merged[1].position.x);
    }
}
