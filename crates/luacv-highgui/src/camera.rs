//! Video4Linux2 cameras.

use luacv_core::{from_dynamic, Depth, Image, LoadMode, Size};
use ::v4l::buffer::Type;
use ::v4l::control::{Control, Value};
use ::v4l::io::mmap::Stream;
use ::v4l::io::traits::CaptureStream;
use ::v4l::video::Capture as _;
use ::v4l::{Device, FourCC, Format};

use crate::capture::{CaptureProperty, FrameSource};
use crate::error::CaptureError;

const BUFFER_COUNT: u32 = 4;

const CID_BRIGHTNESS: u32 = 0x0098_0900;
const CID_CONTRAST: u32 = 0x0098_0901;
const CID_SATURATION: u32 = 0x0098_0902;
const CID_HUE: u32 = 0x0098_0903;

fn control_id(prop: CaptureProperty) -> Option<u32> {
    match prop {
        CaptureProperty::Brightness => Some(CID_BRIGHTNESS),
        CaptureProperty::Contrast => Some(CID_CONTRAST),
        CaptureProperty::Saturation => Some(CID_SATURATION),
        CaptureProperty::Hue => Some(CID_HUE),
        _ => None,
    }
}

/// ITU-R BT.601 YUV to 8-bit BGR.
fn yuv_to_bgr(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = f32::from(y);
    let u = f32::from(u) - 128.0;
    let v = f32::from(v) - 128.0;

    let r = 1.402f32.mul_add(v, y);
    let g = 0.714_14f32.mul_add(-v, 0.344_14f32.mul_add(-u, y));
    let b = 1.772f32.mul_add(u, y);

    let clamp = |c: f32| c.round().clamp(0.0, 255.0) as u8;
    [clamp(b), clamp(g), clamp(r)]
}

/// Unpack a YUYV (4:2:2) buffer into BGR.
fn yuyv_to_bgr(data: &[u8], width: u32, height: u32) -> Option<Image> {
    let (w, h) = (width as usize, height as usize);
    if data.len() < w * h * 2 {
        return None;
    }
    let mut out = Vec::with_capacity(w * h * 3);
    for pair in data[..w * h * 2].chunks_exact(4) {
        let [y0, u, y1, v] = [pair[0], pair[1], pair[2], pair[3]];
        out.extend_from_slice(&yuv_to_bgr(y0, u, v));
        out.extend_from_slice(&yuv_to_bgr(y1, u, v));
    }
    Image::from_raw(Size::new(width, height), Depth::U8, 3, out).ok()
}

/// A V4L2 camera streaming through mmap buffers.
pub struct V4lCamera {
    index: usize,
    device: Device,
    stream: Stream<'static>,
    format: Format,
    last: Option<Vec<u8>>,
}

impl V4lCamera {
    /// Open `/dev/video{index}`; negative indices open the first camera.
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        let camera_error = |source| CaptureError::Camera { index, source };
        let idx = usize::try_from(index).unwrap_or(0);
        let device = Device::new(idx).map_err(camera_error)?;

        let mut format = device.format().map_err(camera_error)?;
        let yuyv = FourCC::new(b"YUYV");
        let mjpg = FourCC::new(b"MJPG");
        if format.fourcc != yuyv && format.fourcc != mjpg {
            format.fourcc = yuyv;
            format = device.set_format(&format).map_err(camera_error)?;
        }

        let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(camera_error)?;
        log::info!(
            "camera {idx}: {}x{} {}",
            format.width,
            format.height,
            format.fourcc
        );

        Ok(Self {
            index: idx,
            device,
            stream,
            format,
            last: None,
        })
    }

    fn decode(&self, data: &[u8]) -> Option<Image> {
        match &self.format.fourcc.repr {
            b"YUYV" => yuyv_to_bgr(data, self.format.width, self.format.height),
            b"MJPG" => image::load_from_memory(data)
                .ok()
                .and_then(|decoded| from_dynamic(decoded, LoadMode::Color).ok()),
            other => {
                log::warn!("camera {}: unsupported pixel format {:?}", self.index, other);
                None
            }
        }
    }
}

impl FrameSource for V4lCamera {
    fn grab(&mut self) -> bool {
        match CaptureStream::next(&mut self.stream) {
            Ok((buf, meta)) => {
                let used = (meta.bytesused as usize).min(buf.len());
                let used = if used == 0 { buf.len() } else { used };
                self.last = Some(buf[..used].to_vec());
                true
            }
            Err(err) => {
                log::warn!("camera {}: grab failed: {err}", self.index);
                self.last = None;
                false
            }
        }
    }

    fn retrieve(&mut self) -> Option<Image> {
        let data = self.last.as_deref()?;
        self.decode(data)
    }

    fn get(&self, prop: CaptureProperty) -> f64 {
        match prop {
            CaptureProperty::Width => f64::from(self.format.width),
            CaptureProperty::Height => f64::from(self.format.height),
            CaptureProperty::Fourcc => f64::from(u32::from_le_bytes(self.format.fourcc.repr)),
            CaptureProperty::Fps => self
                .device
                .params()
                .ok()
                .filter(|p| p.interval.numerator > 0)
                .map_or(0.0, |p| {
                    f64::from(p.interval.denominator) / f64::from(p.interval.numerator)
                }),
            other => match control_id(other).map(|id| self.device.control(id)) {
                Some(Ok(Control {
                    value: Value::Integer(v),
                    ..
                })) => v as f64,
                _ => 0.0,
            },
        }
    }

    fn set(&mut self, prop: CaptureProperty, value: f64) -> bool {
        let Some(id) = control_id(prop) else {
            return false;
        };
        self.device
            .set_control(Control {
                id,
                value: Value::Integer(value.round() as i64),
            })
            .is_ok()
    }

    fn describe(&self) -> String {
        format!("camera {}", self.index)
    }
}
