//! Iterative sub-pixel corner refinement.
//!
//! At a saddle point every image gradient inside the window is orthogonal
//! to the vector from the corner to the gradient's sample point. Each
//! iteration solves the Gaussian-weighted least-squares form of that
//! condition for a new corner position.

use luacv_core::{sample_bilinear, GrayPlaneView, Image, TermCriteria};
use nalgebra::{Matrix2, Point2, Vector2};

use crate::error::ChessboardError;

fn gaussian_weights(half: i32) -> Vec<f32> {
    let side = (2 * half + 1) as usize;
    let axis: Vec<f32> = (-half..=half)
        .map(|k| {
            let t = k as f32 / half as f32;
            (-t * t).exp()
        })
        .collect();
    let mut weights = Vec::with_capacity(side * side);
    for wy in &axis {
        for wx in &axis {
            weights.push(wy * wx);
        }
    }
    weights
}

fn refine_one(
    src: &GrayPlaneView<'_>,
    start: Point2<f32>,
    half: i32,
    weights: &[f32],
    max_iter: u32,
    eps: f64,
) -> Point2<f32> {
    let eps_sq = (eps * eps) as f32;
    let mut current = start;

    for _ in 0..max_iter {
        let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);
        let mut rhs = Vector2::<f32>::zeros();
        let mut k = 0;

        for py in -half..=half {
            for px in -half..=half {
                let (x, y) = (current.x + px as f32, current.y + py as f32);
                let gx = sample_bilinear(src, x + 1.0, y) - sample_bilinear(src, x - 1.0, y);
                let gy = sample_bilinear(src, x, y + 1.0) - sample_bilinear(src, x, y - 1.0);
                let m = weights[k];
                k += 1;

                let (gxx, gxy, gyy) = (gx * gx * m, gx * gy * m, gy * gy * m);
                a += gxx;
                b += gxy;
                c += gyy;
                rhs.x += gxx * px as f32 + gxy * py as f32;
                rhs.y += gxy * px as f32 + gyy * py as f32;
            }
        }

        let Some(inverse) = Matrix2::new(a, b, b, c).try_inverse() else {
            break;
        };
        let shift = inverse * rhs;
        current += shift;

        let outside = current.x < 0.0
            || current.y < 0.0
            || current.x >= src.width as f32
            || current.y >= src.height as f32;
        if outside || shift.norm_squared() <= eps_sq {
            break;
        }
    }

    // Moving outside the search window means the iteration diverged.
    let half = half as f32;
    if (current.x - start.x).abs() > half || (current.y - start.y).abs() > half {
        start
    } else {
        current
    }
}

/// Refine `corners` in place inside a `(2 * half_window + 1)` square window.
///
/// `criteria` bounds the iteration count and the minimal shift per
/// iteration. A corner whose refinement leaves the window keeps its
/// original position.
///
/// The window plus a two-pixel gradient border must fit the image:
/// `1 <= half_window` and `2 * half_window + 5 <= min(width, height)`.
pub fn find_corner_subpix(
    img: &Image,
    corners: &mut [Point2<f32>],
    half_window: i64,
    criteria: TermCriteria,
) -> Result<(), ChessboardError> {
    let size = img.size();
    let span = half_window.saturating_mul(2).saturating_add(5);
    let limit = i64::from(size.width.min(size.height));
    if half_window < 1 || span > limit {
        return Err(ChessboardError::InvalidWindow {
            half: half_window,
            size,
        });
    }
    let half = half_window as i32;
    let (max_iter, eps) = criteria.resolve();

    let plane = img.to_gray_plane();
    let view = plane.view();
    let weights = gaussian_weights(half);

    for corner in corners.iter_mut() {
        *corner = refine_one(&view, *corner, half, &weights, max_iter, eps);
    }
    log::trace!(
        "refined {} corners (window {}, {} iterations max, eps {})",
        corners.len(),
        half,
        max_iter,
        eps
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use luacv_core::{Depth, Size};

    /// Anti-aliased X-junction centred on (cx, cy).
    fn saddle(size: u32, cx: f32, cy: f32) -> Image {
        let mut img = Image::new(Size::new(size, size), Depth::U8, 1).unwrap();
        const SS: usize = 4;
        for y in 0..size as usize {
            for x in 0..size as usize {
                let mut acc = 0.0;
                for sy in 0..SS {
                    for sx in 0..SS {
                        let fx = x as f32 + (sx as f32 + 0.5) / SS as f32 - 0.5;
                        let fy = y as f32 + (sy as f32 + 0.5) / SS as f32 - 0.5;
                        if (fx < cx) ^ (fy < cy) {
                            acc += 1.0;
                        }
                    }
                }
                img.set(x, y, 0, 255.0 * acc / (SS * SS) as f64);
            }
        }
        img
    }

    #[test]
    fn perturbed_corner_moves_back_onto_the_saddle() {
        let img = saddle(40, 19.3, 20.6);
        let mut corners = [Point2::new(18.0, 22.0)];
        find_corner_subpix(&img, &mut corners, 5, TermCriteria::new(Some(30), Some(0.001)))
            .unwrap();
        assert_abs_diff_eq!(19.3, corners[0].x, epsilon = 0.15);
        assert_abs_diff_eq!(20.6, corners[0].y, epsilon = 0.15);
    }

    #[test]
    fn flat_regions_keep_their_position() {
        let img = Image::new(Size::new(20, 20), Depth::U8, 1).unwrap();
        let mut corners = [Point2::new(10.0, 10.0)];
        find_corner_subpix(&img, &mut corners, 3, TermCriteria::default()).unwrap();
        assert_eq!(Point2::new(10.0, 10.0), corners[0]);
    }

    #[test]
    fn window_must_be_positive() {
        let img = Image::new(Size::new(8, 8), Depth::U8, 1).unwrap();
        let err = find_corner_subpix(&img, &mut [], 0, TermCriteria::default()).unwrap_err();
        assert!(matches!(err, ChessboardError::InvalidWindow { half: 0, .. }));
    }

    #[test]
    fn window_must_fit_the_image() {
        let img = Image::new(Size::new(20, 16), Depth::U8, 1).unwrap();
        let mut corners = [Point2::new(10.0, 8.0)];
        for half in [6, 65535, i64::MAX] {
            let err = find_corner_subpix(&img, &mut corners, half, TermCriteria::default())
                .unwrap_err();
            assert!(
                matches!(err, ChessboardError::InvalidWindow { half: h, size } if h == half && size == Size::new(20, 16)),
                "{err}"
            );
        }
        assert_eq!(Point2::new(10.0, 8.0), corners[0]);
        find_corner_subpix(&img, &mut corners, 5, TermCriteria::default()).unwrap();
    }
}
