//! Colour space conversion between images of equal size and depth.
//!
//! Every conversion goes through normalised linear RGB: the source pixel is
//! decoded from its space, then encoded into the destination space. Hue is
//! stored as degrees/2 for `8u` images (0..180) and in degrees for `32f`.

use crate::error::CvError;
use crate::image::{Depth, Image};
use crate::options::NamedOption;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorConversion {
    Rgb2Gray,
    Bgr2Gray,
    Gray2Rgb,
    Gray2Bgr,
    Rgb2Bgr,
    Bgr2Rgb,
    Bgr2Xyz,
    Rgb2Xyz,
    Xyz2Bgr,
    Xyz2Rgb,
    Bgr2YCrCb,
    Rgb2YCrCb,
    YCrCb2Bgr,
    YCrCb2Rgb,
    Bgr2Hsv,
    Rgb2Hsv,
    Hsv2Bgr,
    Hsv2Rgb,
    Bgr2Hls,
    Rgb2Hls,
    Hls2Bgr,
    Hls2Rgb,
}

impl NamedOption for ColorConversion {
    const KIND: &'static str = "conversion code";
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("rgb2gray", ColorConversion::Rgb2Gray),
        ("bgr2gray", ColorConversion::Bgr2Gray),
        ("gray2rgb", ColorConversion::Gray2Rgb),
        ("gray2bgr", ColorConversion::Gray2Bgr),
        ("rgb2bgr", ColorConversion::Rgb2Bgr),
        ("bgr2rgb", ColorConversion::Bgr2Rgb),
        ("bgr2xyz", ColorConversion::Bgr2Xyz),
        ("rgb2xyz", ColorConversion::Rgb2Xyz),
        ("xyz2bgr", ColorConversion::Xyz2Bgr),
        ("xyz2rgb", ColorConversion::Xyz2Rgb),
        ("bgr2ycrcb", ColorConversion::Bgr2YCrCb),
        ("rgb2ycrcb", ColorConversion::Rgb2YCrCb),
        ("ycrcb2bgr", ColorConversion::YCrCb2Bgr),
        ("ycrcb2rgb", ColorConversion::YCrCb2Rgb),
        ("bgr2hsv", ColorConversion::Bgr2Hsv),
        ("rgb2hsv", ColorConversion::Rgb2Hsv),
        ("hsv2bgr", ColorConversion::Hsv2Bgr),
        ("hsv2rgb", ColorConversion::Hsv2Rgb),
        ("bgr2hls", ColorConversion::Bgr2Hls),
        ("rgb2hls", ColorConversion::Rgb2Hls),
        ("hls2bgr", ColorConversion::Hls2Bgr),
        ("hls2rgb", ColorConversion::Hls2Rgb),
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Space {
    Gray,
    Rgb,
    Bgr,
    Xyz,
    YCrCb,
    Hsv,
    Hls,
}

impl Space {
    fn channels(self) -> &'static str {
        match self {
            Space::Gray => "1",
            _ => "3 or 4",
        }
    }

    fn accepts(self, channels: usize) -> bool {
        match self {
            Space::Gray => channels == 1,
            _ => channels == 3 || channels == 4,
        }
    }

    fn is_hue(self) -> bool {
        matches!(self, Space::Hsv | Space::Hls)
    }
}

impl ColorConversion {
    fn spaces(self) -> (Space, Space) {
        use ColorConversion::*;
        match self {
            Rgb2Gray => (Space::Rgb, Space::Gray),
            Bgr2Gray => (Space::Bgr, Space::Gray),
            Gray2Rgb => (Space::Gray, Space::Rgb),
            Gray2Bgr => (Space::Gray, Space::Bgr),
            Rgb2Bgr => (Space::Rgb, Space::Bgr),
            Bgr2Rgb => (Space::Bgr, Space::Rgb),
            Bgr2Xyz => (Space::Bgr, Space::Xyz),
            Rgb2Xyz => (Space::Rgb, Space::Xyz),
            Xyz2Bgr => (Space::Xyz, Space::Bgr),
            Xyz2Rgb => (Space::Xyz, Space::Rgb),
            Bgr2YCrCb => (Space::Bgr, Space::YCrCb),
            Rgb2YCrCb => (Space::Rgb, Space::YCrCb),
            YCrCb2Bgr => (Space::YCrCb, Space::Bgr),
            YCrCb2Rgb => (Space::YCrCb, Space::Rgb),
            Bgr2Hsv => (Space::Bgr, Space::Hsv),
            Rgb2Hsv => (Space::Rgb, Space::Hsv),
            Hsv2Bgr => (Space::Hsv, Space::Bgr),
            Hsv2Rgb => (Space::Hsv, Space::Rgb),
            Bgr2Hls => (Space::Bgr, Space::Hls),
            Rgb2Hls => (Space::Rgb, Space::Hls),
            Hls2Bgr => (Space::Hls, Space::Bgr),
            Hls2Rgb => (Space::Hls, Space::Rgb),
        }
    }
}

const RGB2XYZ: [[f64; 3]; 3] = [
    [0.412453, 0.357580, 0.180423],
    [0.212671, 0.715160, 0.072169],
    [0.019334, 0.119193, 0.950227],
];

const XYZ2RGB: [[f64; 3]; 3] = [
    [3.240479, -1.53715, -0.498535],
    [-0.969256, 1.875991, 0.041556],
    [0.055648, -0.204043, 1.057311],
];

fn mul3(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn luma([r, g, b]: [f64; 3]) -> f64 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Per-depth scaling used while moving through normalised RGB.
struct Scale {
    unit: f64,
    hue: f64,
    chroma_delta: f64,
}

impl Scale {
    fn for_depth(depth: Depth) -> Self {
        let unit = depth.unit();
        let (hue, chroma_delta) = if depth.is_float() {
            (360.0, 0.5)
        } else {
            (180.0, ((unit + 1.0) / 2.0).floor() / unit)
        };
        Self {
            unit,
            hue,
            chroma_delta,
        }
    }
}

fn rgb_to_hsv([r, g, b]: [f64; 3]) -> [f64; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;
    let s = if max > 0.0 { diff / max } else { 0.0 };
    [hue_of(r, g, b, max, diff), s, max]
}

fn rgb_to_hls([r, g, b]: [f64; 3]) -> [f64; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;
    let l = (max + min) / 2.0;
    let s = if diff <= f64::EPSILON {
        0.0
    } else if l < 0.5 {
        diff / (max + min)
    } else {
        diff / (2.0 - max - min)
    };
    [hue_of(r, g, b, max, diff), l, s]
}

fn hue_of(r: f64, g: f64, b: f64, max: f64, diff: f64) -> f64 {
    if diff <= f64::EPSILON {
        return 0.0;
    }
    let h = if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// `chroma` is the distance of the brightest channel from the darkest one,
/// `low` the darkest channel.
fn sector_to_rgb(h: f64, chroma: f64, low: f64) -> [f64; 3] {
    let h = h.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    [r + low, g + low, b + low]
}

fn hsv_to_rgb([h, s, v]: [f64; 3]) -> [f64; 3] {
    let chroma = v * s;
    sector_to_rgb(h, chroma, v - chroma)
}

fn hls_to_rgb([h, l, s]: [f64; 3]) -> [f64; 3] {
    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    sector_to_rgb(h, chroma, l - chroma / 2.0)
}

fn decode(space: Space, px: [f64; 3], scale: &Scale) -> [f64; 3] {
    let n = [px[0] / scale.unit, px[1] / scale.unit, px[2] / scale.unit];
    match space {
        Space::Gray => [n[0], n[0], n[0]],
        Space::Rgb => n,
        Space::Bgr => [n[2], n[1], n[0]],
        Space::Xyz => mul3(&XYZ2RGB, n),
        Space::YCrCb => {
            let (y, cr, cb) = (n[0], n[1] - scale.chroma_delta, n[2] - scale.chroma_delta);
            [
                y + 1.403 * cr,
                y - 0.714 * cr - 0.344 * cb,
                y + 1.773 * cb,
            ]
        }
        Space::Hsv => hsv_to_rgb([px[0] * 360.0 / scale.hue, n[1], n[2]]),
        Space::Hls => hls_to_rgb([px[0] * 360.0 / scale.hue, n[1], n[2]]),
    }
}

fn encode(space: Space, rgb: [f64; 3], scale: &Scale) -> [f64; 3] {
    let u = scale.unit;
    match space {
        Space::Gray => {
            let y = luma(rgb) * u;
            [y, y, y]
        }
        Space::Rgb => [rgb[0] * u, rgb[1] * u, rgb[2] * u],
        Space::Bgr => [rgb[2] * u, rgb[1] * u, rgb[0] * u],
        Space::Xyz => {
            let xyz = mul3(&RGB2XYZ, rgb);
            [xyz[0] * u, xyz[1] * u, xyz[2] * u]
        }
        Space::YCrCb => {
            let y = luma(rgb);
            let cr = (rgb[0] - y) * 0.713 + scale.chroma_delta;
            let cb = (rgb[2] - y) * 0.564 + scale.chroma_delta;
            [y * u, cr * u, cb * u]
        }
        Space::Hsv | Space::Hls => {
            let clamped = rgb.map(|c| c.clamp(0.0, 1.0));
            let [h, a, b] = if space == Space::Hsv {
                rgb_to_hsv(clamped)
            } else {
                rgb_to_hls(clamped)
            };
            [h * scale.hue / 360.0, a * u, b * u]
        }
    }
}

/// Convert `src` into `dst` according to `code`.
///
/// Both images must share size and depth. Supported depths are `8u`, `16u`
/// and `32f`; hue spaces additionally exclude `16u`. A fourth (alpha)
/// channel is copied when both sides have one and set to full intensity when
/// only the destination does.
pub fn convert_color(src: &Image, dst: &mut Image, code: ColorConversion) -> Result<(), CvError> {
    const OP: &str = "cvtColor";

    if src.size() != dst.size() {
        return Err(CvError::SizeMismatch {
            expected: src.size(),
            got: dst.size(),
        });
    }
    if src.depth() != dst.depth() {
        return Err(CvError::DepthMismatch {
            expected: src.depth(),
            got: dst.depth(),
        });
    }

    let depth = src.depth();
    let (from, to) = code.spaces();
    let depth_ok = match depth {
        Depth::U8 | Depth::F32 => true,
        Depth::U16 => !from.is_hue() && !to.is_hue(),
        _ => false,
    };
    if !depth_ok {
        return Err(CvError::UnsupportedDepth { op: OP, depth });
    }
    if !from.accepts(src.channels()) {
        return Err(CvError::ChannelMismatch {
            op: OP,
            expected: from.channels(),
            got: src.channels(),
        });
    }
    if !to.accepts(dst.channels()) {
        return Err(CvError::ChannelMismatch {
            op: OP,
            expected: to.channels(),
            got: dst.channels(),
        });
    }

    let scale = Scale::for_depth(depth);
    let (sc, dc) = (src.channels(), dst.channels());
    for y in 0..src.height() {
        for x in 0..src.width() {
            let px = if sc == 1 {
                let v = src.get(x, y, 0);
                [v, v, v]
            } else {
                [src.get(x, y, 0), src.get(x, y, 1), src.get(x, y, 2)]
            };
            let out = encode(to, decode(from, px, &scale), &scale);
            let written = dc.min(3);
            for (c, value) in out.iter().take(written).enumerate() {
                dst.set(x, y, c, *value);
            }
            if dc == 4 {
                let alpha = if sc == 4 { src.get(x, y, 3) } else { scale.unit };
                dst.set(x, y, 3, alpha);
            }
        }
    }
    log::trace!(
        "converted {} {} image ({:?}, {} -> {} channels)",
        src.size(),
        depth,
        code,
        sc,
        dc
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Size;
    use approx::assert_abs_diff_eq;

    fn pixel(depth: Depth, channels: usize, value: &[f64]) -> Image {
        let mut img = Image::new(Size::new(1, 1), depth, channels).unwrap();
        img.fill(value);
        img
    }

    fn convert(src: &Image, channels: usize, code: ColorConversion) -> Image {
        let mut dst = Image::new(src.size(), src.depth(), channels).unwrap();
        convert_color(src, &mut dst, code).unwrap();
        dst
    }

    #[test]
    fn bgr_to_gray_uses_luma_weights() {
        let red = pixel(Depth::U8, 3, &[0.0, 0.0, 255.0]);
        let gray = convert(&red, 1, ColorConversion::Bgr2Gray);
        assert_eq!(76.0, gray.get(0, 0, 0));

        let red = pixel(Depth::U8, 3, &[255.0, 0.0, 0.0]);
        let gray = convert(&red, 1, ColorConversion::Rgb2Gray);
        assert_eq!(76.0, gray.get(0, 0, 0));
    }

    #[test]
    fn channel_swap_keeps_alpha() {
        let src = pixel(Depth::U8, 4, &[1.0, 2.0, 3.0, 40.0]);
        let dst = convert(&src, 4, ColorConversion::Bgr2Rgb);
        assert_eq!(
            vec![3.0, 2.0, 1.0, 40.0],
            (0..4).map(|c| dst.get(0, 0, c)).collect::<Vec<_>>()
        );

        let gray = pixel(Depth::U8, 1, &[9.0]);
        let dst = convert(&gray, 4, ColorConversion::Gray2Bgr);
        assert_eq!(255.0, dst.get(0, 0, 3));
        assert_eq!(9.0, dst.get(0, 0, 1));
    }

    #[test]
    fn hue_is_halved_for_8u_and_in_degrees_for_32f() {
        let blue = pixel(Depth::U8, 3, &[255.0, 0.0, 0.0]);
        let hsv = convert(&blue, 3, ColorConversion::Bgr2Hsv);
        assert_eq!(120.0, hsv.get(0, 0, 0));
        assert_eq!(255.0, hsv.get(0, 0, 1));
        assert_eq!(255.0, hsv.get(0, 0, 2));

        let blue = pixel(Depth::F32, 3, &[1.0, 0.0, 0.0]);
        let hls = convert(&blue, 3, ColorConversion::Bgr2Hls);
        assert_abs_diff_eq!(240.0, hls.get(0, 0, 0), epsilon = 1e-4);
        assert_abs_diff_eq!(0.5, hls.get(0, 0, 1), epsilon = 1e-6);
        assert_abs_diff_eq!(1.0, hls.get(0, 0, 2), epsilon = 1e-6);
    }

    #[test]
    fn white_maps_to_the_d65_white_point() {
        let white = pixel(Depth::F32, 3, &[1.0, 1.0, 1.0]);
        let xyz = convert(&white, 3, ColorConversion::Rgb2Xyz);
        assert_abs_diff_eq!(0.950456, xyz.get(0, 0, 0), epsilon = 1e-5);
        assert_abs_diff_eq!(1.0, xyz.get(0, 0, 1), epsilon = 1e-5);
        assert_abs_diff_eq!(1.088754, xyz.get(0, 0, 2), epsilon = 1e-5);
    }

    #[test]
    fn conversions_round_trip_within_a_level() {
        let src = pixel(Depth::U8, 3, &[30.0, 140.0, 220.0]);
        let pairs = [
            (ColorConversion::Bgr2YCrCb, ColorConversion::YCrCb2Bgr),
            (ColorConversion::Bgr2Hsv, ColorConversion::Hsv2Bgr),
            (ColorConversion::Bgr2Hls, ColorConversion::Hls2Bgr),
            (ColorConversion::Bgr2Xyz, ColorConversion::Xyz2Bgr),
        ];
        for (forward, back) in pairs {
            let there = convert(&src, 3, forward);
            let again = convert(&there, 3, back);
            for c in 0..3 {
                let diff = (src.get(0, 0, c) - again.get(0, 0, c)).abs();
                assert!(diff <= 3.0, "{forward:?}: channel {c} drifted by {diff}");
            }
        }
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let src = pixel(Depth::U8, 3, &[0.0]);
        let mut dst = Image::new(Size::new(2, 1), Depth::U8, 1).unwrap();
        assert!(matches!(
            convert_color(&src, &mut dst, ColorConversion::Bgr2Gray),
            Err(CvError::SizeMismatch { .. })
        ));

        let mut dst = Image::new(Size::new(1, 1), Depth::U8, 3).unwrap();
        assert!(matches!(
            convert_color(&src, &mut dst, ColorConversion::Bgr2Gray),
            Err(CvError::ChannelMismatch { expected: "1", got: 3, .. })
        ));

        let src = pixel(Depth::U16, 3, &[0.0]);
        let mut dst = Image::new(Size::new(1, 1), Depth::U16, 3).unwrap();
        assert!(matches!(
            convert_color(&src, &mut dst, ColorConversion::Bgr2Hsv),
            Err(CvError::UnsupportedDepth { depth: Depth::U16, .. })
        ));
        convert_color(&src, &mut dst, ColorConversion::Bgr2Rgb).unwrap();
    }
}
