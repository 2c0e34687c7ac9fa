//! Image codecs on top of the `image` crate.
//!
//! Decoded colour images are stored BGR(A) to match the rest of the
//! bindings; the swap back to RGB happens on encode.

use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageReader, Luma, LumaA, Pixel, Rgb, Rgba};

use crate::error::CvError;
use crate::image::{Depth, Image, Size};

/// How a decoded file is mapped to an [`Image`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadMode {
    /// 3-channel BGR `8u`.
    Color,
    /// 1-channel `8u`.
    Grayscale,
    /// Keep the stored channel count and bit depth.
    Unchanged,
}

impl LoadMode {
    /// Map the classic integer flag: `> 0` colour, `0` grayscale, `< 0`
    /// unchanged.
    pub fn from_flag(flag: i64) -> Self {
        match flag {
            f if f > 0 => LoadMode::Color,
            0 => LoadMode::Grayscale,
            _ => LoadMode::Unchanged,
        }
    }
}

fn swap_red_blue<T>(samples: &mut [T], channels: usize) {
    if channels >= 3 {
        for px in samples.chunks_exact_mut(channels) {
            px.swap(0, 2);
        }
    }
}

fn u16_bytes(samples: Vec<u16>) -> Vec<u8> {
    samples.into_iter().flat_map(u16::to_ne_bytes).collect()
}

fn f32_bytes(samples: Vec<f32>) -> Vec<u8> {
    samples.into_iter().flat_map(f32::to_ne_bytes).collect()
}

fn wrap(
    width: u32,
    height: u32,
    depth: Depth,
    channels: usize,
    data: Vec<u8>,
) -> Result<Image, CvError> {
    Image::from_raw(Size::new(width, height), depth, channels, data)
}

/// Convert a decoded image into the bindings' layout.
pub fn from_dynamic(decoded: DynamicImage, mode: LoadMode) -> Result<Image, CvError> {
    let (w, h) = (decoded.width(), decoded.height());
    match mode {
        LoadMode::Color => {
            let mut data = decoded.into_rgb8().into_raw();
            swap_red_blue(&mut data, 3);
            wrap(w, h, Depth::U8, 3, data)
        }
        LoadMode::Grayscale => wrap(w, h, Depth::U8, 1, decoded.into_luma8().into_raw()),
        LoadMode::Unchanged => match decoded {
            DynamicImage::ImageLuma8(buf) => wrap(w, h, Depth::U8, 1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => wrap(w, h, Depth::U8, 2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => {
                let mut data = buf.into_raw();
                swap_red_blue(&mut data, 3);
                wrap(w, h, Depth::U8, 3, data)
            }
            DynamicImage::ImageRgba8(buf) => {
                let mut data = buf.into_raw();
                swap_red_blue(&mut data, 4);
                wrap(w, h, Depth::U8, 4, data)
            }
            DynamicImage::ImageLuma16(buf) => wrap(w, h, Depth::U16, 1, u16_bytes(buf.into_raw())),
            DynamicImage::ImageLumaA16(buf) => {
                wrap(w, h, Depth::U16, 2, u16_bytes(buf.into_raw()))
            }
            DynamicImage::ImageRgb16(buf) => {
                let mut data = buf.into_raw();
                swap_red_blue(&mut data, 3);
                wrap(w, h, Depth::U16, 3, u16_bytes(data))
            }
            DynamicImage::ImageRgba16(buf) => {
                let mut data = buf.into_raw();
                swap_red_blue(&mut data, 4);
                wrap(w, h, Depth::U16, 4, u16_bytes(data))
            }
            DynamicImage::ImageRgb32F(buf) => {
                let mut data = buf.into_raw();
                swap_red_blue(&mut data, 3);
                wrap(w, h, Depth::F32, 3, f32_bytes(data))
            }
            DynamicImage::ImageRgba32F(buf) => {
                let mut data = buf.into_raw();
                swap_red_blue(&mut data, 4);
                wrap(w, h, Depth::F32, 4, f32_bytes(data))
            }
            other => {
                let mut data = other.into_rgba8().into_raw();
                swap_red_blue(&mut data, 4);
                wrap(w, h, Depth::U8, 4, data)
            }
        },
    }
}

fn buffer<P: Pixel>(
    size: Size,
    samples: Vec<P::Subpixel>,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, CvError> {
    let got = samples.len();
    ImageBuffer::from_raw(size.width, size.height, samples).ok_or(CvError::InvalidBuffer {
        expected: size.area() * usize::from(P::CHANNEL_COUNT),
        got,
    })
}

/// Convert an image into something the encoders accept.
///
/// `8u` and `16u` images are passed through; every other depth is rescaled
/// to `8u` using the depth's unit (so `32f` in `0..1` maps to `0..255`).
pub fn to_dynamic(img: &Image) -> Result<DynamicImage, CvError> {
    let size = img.size();
    let channels = img.channels();

    match img.depth() {
        Depth::U16 => {
            let mut samples: Vec<u16> = img
                .data()
                .chunks_exact(2)
                .map(|b| u16::from_ne_bytes([b[0], b[1]]))
                .collect();
            swap_red_blue(&mut samples, channels);
            Ok(match channels {
                1 => DynamicImage::ImageLuma16(buffer::<Luma<u16>>(size, samples)?),
                2 => DynamicImage::ImageLumaA16(buffer::<LumaA<u16>>(size, samples)?),
                3 => DynamicImage::ImageRgb16(buffer::<Rgb<u16>>(size, samples)?),
                _ => DynamicImage::ImageRgba16(buffer::<Rgba<u16>>(size, samples)?),
            })
        }
        depth => {
            let mut samples: Vec<u8> = if depth == Depth::U8 {
                img.data().to_vec()
            } else {
                let scale = 255.0 / depth.unit();
                let mut out = Vec::with_capacity(size.area() * channels);
                for y in 0..img.height() {
                    for x in 0..img.width() {
                        for c in 0..channels {
                            out.push(Depth::U8.saturate(img.get(x, y, c) * scale) as u8);
                        }
                    }
                }
                out
            };
            swap_red_blue(&mut samples, channels);
            Ok(match channels {
                1 => DynamicImage::ImageLuma8(buffer::<Luma<u8>>(size, samples)?),
                2 => DynamicImage::ImageLumaA8(buffer::<LumaA<u8>>(size, samples)?),
                3 => DynamicImage::ImageRgb8(buffer::<Rgb<u8>>(size, samples)?),
                _ => DynamicImage::ImageRgba8(buffer::<Rgba<u8>>(size, samples)?),
            })
        }
    }
}

/// Decode the file at `path`; the format is sniffed from the content.
pub fn load_image(path: impl AsRef<Path>, mode: LoadMode) -> Result<Image, CvError> {
    let path = path.as_ref();
    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    log::debug!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        decoded.width(),
        decoded.height(),
        decoded.color()
    );
    from_dynamic(decoded, mode)
}

/// Encode `img` to `path`; the format comes from the file extension.
pub fn save_image(path: impl AsRef<Path>, img: &Image) -> Result<(), CvError> {
    let path = path.as_ref();
    let mut encoded = to_dynamic(img)?;

    // JPEG has no alpha and no 16-bit mode.
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    if is_jpeg && !matches!(encoded, DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) {
        encoded = DynamicImage::ImageRgb8(encoded.to_rgb8());
    }

    encoded.save(path)?;
    log::debug!("wrote {} ({} {})", path.display(), img.size(), img.depth());
    Ok(())
}
