use luacv_core::{draw_circle, draw_line, Image, Scalar, Size};
use nalgebra::Point2;

/// BGR colour per board row, cycled.
const ROW_COLORS: [[f64; 3]; 7] = [
    [0.0, 0.0, 255.0],
    [0.0, 128.0, 255.0],
    [0.0, 200.0, 200.0],
    [0.0, 255.0, 0.0],
    [200.0, 200.0, 0.0],
    [255.0, 0.0, 0.0],
    [255.0, 0.0, 255.0],
];

const MARK_RADIUS: i32 = 4;

/// Convert an 8-bit BGR colour to the image's channel layout and depth.
fn color_for(img: &Image, bgr: [f64; 3]) -> Scalar {
    let scale = img.depth().unit() / 255.0;
    let [b, g, r] = bgr.map(|v| v * scale);
    let alpha = img.depth().unit();
    match img.channels() {
        1 | 2 => {
            let gray = 0.114 * b + 0.587 * g + 0.299 * r;
            [gray, alpha, 0.0, 0.0]
        }
        _ => [b, g, r, alpha],
    }
}

fn pixel(p: &Point2<f32>) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

fn mark(img: &mut Image, p: (i32, i32), color: Scalar) {
    let r = MARK_RADIUS;
    draw_line(img, (p.0 - r, p.1 - r), (p.0 + r, p.1 + r), color, 1);
    draw_line(img, (p.0 - r, p.1 + r), (p.0 + r, p.1 - r), color, 1);
    draw_circle(img, p, r + 1, color, 1);
}

/// Draw detected corners onto `img`.
///
/// When `corners` holds the complete pattern (`width * height` points) the
/// board is drawn as found: each row in its own colour, consecutive corners
/// joined by lines. Otherwise every corner is marked in red.
pub fn draw_chessboard_corners(img: &mut Image, pattern: Size, corners: &[Point2<f32>]) {
    let found = !corners.is_empty() && corners.len() == pattern.area();

    if !found {
        let red = color_for(img, ROW_COLORS[0]);
        for p in corners {
            mark(img, pixel(p), red);
        }
        return;
    }

    let width = pattern.width as usize;
    let mut previous: Option<(i32, i32)> = None;
    for (k, p) in corners.iter().enumerate() {
        let color = color_for(img, ROW_COLORS[(k / width) % ROW_COLORS.len()]);
        let here = pixel(p);
        if let Some(prev) = previous {
            draw_line(img, prev, here, color, 1);
        }
        mark(img, here, color);
        previous = Some(here);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luacv_core::Depth;

    fn corners(w: usize, h: usize) -> Vec<Point2<f32>> {
        (0..w * h)
            .map(|k| Point2::new(10.0 + (k % w) as f32 * 15.0, 10.0 + (k / w) as f32 * 15.0))
            .collect()
    }

    #[test]
    fn complete_board_uses_row_colours() {
        let mut img = Image::new(Size::new(80, 80), Depth::U8, 3).unwrap();
        draw_chessboard_corners(&mut img, Size::new(3, 3), &corners(3, 3));

        // Cross arm of the first corner in row 0 (red) and row 1 (orange).
        assert_eq!(
            vec![0.0, 0.0, 255.0],
            (0..3).map(|c| img.get(12, 12, c)).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![0.0, 128.0, 255.0],
            (0..3).map(|c| img.get(12, 27, c)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn partial_board_is_drawn_in_red_on_gray_images() {
        let mut img = Image::new(Size::new(80, 80), Depth::U8, 1).unwrap();
        let mut pts = corners(3, 3);
        pts.pop();
        draw_chessboard_corners(&mut img, Size::new(3, 3), &pts);

        assert_eq!((0.299f64 * 255.0).round(), img.get(12, 12, 0));
        // No connecting line between the first two corners.
        assert_eq!(0.0, img.get(17, 10, 0));
    }
}
