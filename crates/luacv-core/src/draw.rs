//! Raster drawing on [`Image`]s. Coordinates outside the image are clipped.

use crate::image::Image;

/// A per-channel colour in the image's own channel order (BGR for colour
/// images). Channels beyond the image's count are ignored.
pub type Scalar = [f64; 4];

fn put(img: &mut Image, x: i64, y: i64, color: &Scalar) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    for c in 0..img.channels() {
        img.set(x, y, c, color[c]);
    }
}

fn stamp(img: &mut Image, cx: i64, cy: i64, radius: i64, color: &Scalar) {
    if radius <= 0 {
        put(img, cx, cy, color);
        return;
    }
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Draw a straight segment with Bresenham's algorithm.
///
/// Thicker lines are drawn by stamping a disc of radius `thickness / 2` at
/// every step.
pub fn draw_line(img: &mut Image, from: (i32, i32), to: (i32, i32), color: Scalar, thickness: i32) {
    let (mut x, mut y) = (i64::from(from.0), i64::from(from.1));
    let (x1, y1) = (i64::from(to.0), i64::from(to.1));
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let radius = i64::from(thickness.max(1) / 2);
    let mut err = dx + dy;

    loop {
        stamp(img, x, y, radius, &color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw a circle outline, or a filled disc when `thickness < 0`.
pub fn draw_circle(img: &mut Image, center: (i32, i32), radius: i32, color: Scalar, thickness: i32) {
    let (cx, cy) = (i64::from(center.0), i64::from(center.1));
    let r = f64::from(radius.max(0));
    let half = if thickness < 0 {
        None
    } else {
        Some(f64::from(thickness.max(1)) / 2.0)
    };
    let reach = radius.max(0) as i64 + i64::from(thickness.max(1));

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let d = ((dx * dx + dy * dy) as f64).sqrt();
            let inside = match half {
                None => d <= r + 0.5,
                Some(h) => (d - r).abs() <= h,
            };
            if inside {
                put(img, cx + dx, cy + dy, &color);
            }
        }
    }
}
