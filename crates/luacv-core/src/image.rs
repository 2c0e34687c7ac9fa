use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CvError;
use crate::options::NamedOption;
use crate::plane::GrayPlane;

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Per-channel sample type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Depth {
    U8,
    S8,
    U16,
    S16,
    S32,
    F32,
    F64,
}

impl NamedOption for Depth {
    const KIND: &'static str = "depth";
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("8u", Depth::U8),
        ("8s", Depth::S8),
        ("16u", Depth::U16),
        ("16s", Depth::S16),
        ("32s", Depth::S32),
        ("32f", Depth::F32),
        ("64f", Depth::F64),
    ];
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Depth {
    /// Bytes per sample.
    pub const fn bytes(self) -> usize {
        match self {
            Depth::U8 | Depth::S8 => 1,
            Depth::U16 | Depth::S16 => 2,
            Depth::S32 | Depth::F32 => 4,
            Depth::F64 => 8,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Depth::F32 | Depth::F64)
    }

    /// The value that represents "full intensity": the type maximum for
    /// integer depths, `1.0` for floating point.
    pub const fn unit(self) -> f64 {
        match self {
            Depth::U8 => u8::MAX as f64,
            Depth::S8 => i8::MAX as f64,
            Depth::U16 => u16::MAX as f64,
            Depth::S16 => i16::MAX as f64,
            Depth::S32 => i32::MAX as f64,
            Depth::F32 | Depth::F64 => 1.0,
        }
    }

    fn range(self) -> (f64, f64) {
        match self {
            Depth::U8 => (0.0, u8::MAX as f64),
            Depth::S8 => (i8::MIN as f64, i8::MAX as f64),
            Depth::U16 => (0.0, u16::MAX as f64),
            Depth::S16 => (i16::MIN as f64, i16::MAX as f64),
            Depth::S32 => (i32::MIN as f64, i32::MAX as f64),
            Depth::F32 => (f32::MIN as f64, f32::MAX as f64),
            Depth::F64 => (f64::MIN, f64::MAX),
        }
    }

    /// Round and clamp `value` into the representable range.
    pub fn saturate(self, value: f64) -> f64 {
        if self.is_float() {
            return value;
        }
        let (lo, hi) = self.range();
        if value.is_nan() {
            return 0.0;
        }
        value.round().clamp(lo, hi)
    }

    fn read(self, bytes: &[u8]) -> f64 {
        match self {
            Depth::U8 => f64::from(bytes[0]),
            Depth::S8 => f64::from(bytes[0] as i8),
            Depth::U16 => f64::from(u16::from_ne_bytes([bytes[0], bytes[1]])),
            Depth::S16 => f64::from(i16::from_ne_bytes([bytes[0], bytes[1]])),
            Depth::S32 => f64::from(i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Depth::F32 => f64::from(f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Depth::F64 => f64::from_ne_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }

    fn write(self, bytes: &mut [u8], value: f64) {
        let value = self.saturate(value);
        match self {
            Depth::U8 => bytes[0] = value as u8,
            Depth::S8 => bytes[0] = (value as i8) as u8,
            Depth::U16 => bytes.copy_from_slice(&(value as u16).to_ne_bytes()),
            Depth::S16 => bytes.copy_from_slice(&(value as i16).to_ne_bytes()),
            Depth::S32 => bytes.copy_from_slice(&(value as i32).to_ne_bytes()),
            Depth::F32 => bytes.copy_from_slice(&(value as f32).to_ne_bytes()),
            Depth::F64 => bytes.copy_from_slice(&value.to_ne_bytes()),
        }
    }
}

/// A dense, interleaved, row-major image with 1 to 4 channels.
///
/// Colour images follow the BGR(A) channel order used by the bindings.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    size: Size,
    depth: Depth,
    channels: usize,
    data: Vec<u8>,
}

impl Image {
    /// Allocate a zero-filled image.
    pub fn new(size: Size, depth: Depth, channels: usize) -> Result<Self, CvError> {
        let len = Self::byte_len(size, depth, channels)?;
        Ok(Self {
            size,
            depth,
            channels,
            data: vec![0; len],
        })
    }

    /// Wrap an existing interleaved buffer in native byte order.
    pub fn from_raw(
        size: Size,
        depth: Depth,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, CvError> {
        let expected = Self::byte_len(size, depth, channels)?;
        if data.len() != expected {
            return Err(CvError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            size,
            depth,
            channels,
            data,
        })
    }

    fn byte_len(size: Size, depth: Depth, channels: usize) -> Result<usize, CvError> {
        if size.width == 0 || size.height == 0 {
            return Err(CvError::InvalidDimensions {
                width: i64::from(size.width),
                height: i64::from(size.height),
            });
        }
        if !(1..=4).contains(&channels) {
            return Err(CvError::UnsupportedChannels(channels));
        }
        size.area()
            .checked_mul(channels * depth.bytes())
            .ok_or(CvError::InvalidDimensions {
                width: i64::from(size.width),
                height: i64::from(size.height),
            })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width as usize
    }

    pub fn height(&self) -> usize {
        self.size.height as usize
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: usize, y: usize, c: usize) -> usize {
        ((y * self.width() + x) * self.channels + c) * self.depth.bytes()
    }

    /// Read one sample. Coordinates must be in bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> f64 {
        let at = self.offset(x, y, c);
        self.depth.read(&self.data[at..at + self.depth.bytes()])
    }

    /// Write one sample, saturating to the image depth.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, value: f64) {
        let at = self.offset(x, y, c);
        let bytes = self.depth.bytes();
        self.depth.write(&mut self.data[at..at + bytes], value);
    }

    /// Set every pixel to `value`; missing channels are set to zero.
    pub fn fill(&mut self, value: &[f64]) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                for c in 0..self.channels {
                    self.set(x, y, c, value.get(c).copied().unwrap_or(0.0));
                }
            }
        }
    }

    /// Luminance plane in the image's own intensity scale.
    ///
    /// Three and four channel images are read as BGR(A); two channel images
    /// use their first channel.
    pub fn to_gray_plane(&self) -> GrayPlane {
        let mut plane = GrayPlane::new(self.width(), self.height());
        for y in 0..self.height() {
            for x in 0..self.width() {
                let value = match self.channels {
                    3 | 4 => {
                        0.114 * self.get(x, y, 0)
                            + 0.587 * self.get(x, y, 1)
                            + 0.299 * self.get(x, y, 2)
                    }
                    _ => self.get(x, y, 0),
                };
                plane.set(x, y, value as f32);
            }
        }
        plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_depth_and_channel_count_allocates_the_requested_size() {
        let size = Size::new(7, 5);
        for (_, depth) in Depth::OPTIONS {
            for channels in 1..=4 {
                let img = Image::new(size, *depth, channels).unwrap();
                assert_eq!(size, img.size());
                assert_eq!(size.area() * channels * depth.bytes(), img.data().len());
            }
        }
    }

    #[test]
    fn rejects_empty_images_and_bad_channel_counts() {
        assert!(matches!(
            Image::new(Size::new(0, 4), Depth::U8, 1),
            Err(CvError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Image::new(Size::new(4, 4), Depth::U8, 5),
            Err(CvError::UnsupportedChannels(5))
        ));
    }

    #[test]
    fn samples_saturate_to_the_depth() {
        let mut img = Image::new(Size::new(2, 1), Depth::U8, 1).unwrap();
        img.set(0, 0, 0, 300.0);
        img.set(1, 0, 0, -4.0);
        assert_eq!(255.0, img.get(0, 0, 0));
        assert_eq!(0.0, img.get(1, 0, 0));

        let mut img = Image::new(Size::new(1, 1), Depth::S16, 2).unwrap();
        img.set(0, 0, 1, -1234.6);
        assert_eq!(-1235.0, img.get(0, 0, 1));

        let mut img = Image::new(Size::new(1, 1), Depth::F64, 1).unwrap();
        img.set(0, 0, 0, 0.125);
        assert_eq!(0.125, img.get(0, 0, 0));
    }

    #[test]
    fn from_raw_checks_buffer_length() {
        let err = Image::from_raw(Size::new(2, 2), Depth::U16, 1, vec![0; 7]).unwrap_err();
        assert!(matches!(
            err,
            CvError::InvalidBuffer {
                expected: 8,
                got: 7
            }
        ));
    }

    #[test]
    fn gray_plane_uses_bgr_weights() {
        let mut img = Image::new(Size::new(1, 1), Depth::U8, 3).unwrap();
        img.fill(&[0.0, 0.0, 255.0]);
        let plane = img.to_gray_plane();
        approx::assert_abs_diff_eq!(0.299f32 * 255.0, plane.at(0, 0), epsilon = 1e-3);
    }
}
