use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use luacv_core::{Image, NamedOption};

use crate::error::CaptureError;
use crate::sequence::ImageSequence;

/// Readable and writable capture properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureProperty {
    PosMsec,
    PosFrames,
    PosRatio,
    Width,
    Height,
    Fps,
    Fourcc,
    FrameCount,
    Brightness,
    Contrast,
    Saturation,
    Hue,
}

impl NamedOption for CaptureProperty {
    const KIND: &'static str = "capture property";
    const OPTIONS: &'static [(&'static str, Self)] = &[
        ("pos_msec", CaptureProperty::PosMsec),
        ("pos_frames", CaptureProperty::PosFrames),
        ("pos_ratio", CaptureProperty::PosRatio),
        ("width", CaptureProperty::Width),
        ("height", CaptureProperty::Height),
        ("fps", CaptureProperty::Fps),
        ("fourcc", CaptureProperty::Fourcc),
        ("frame_count", CaptureProperty::FrameCount),
        ("brightness", CaptureProperty::Brightness),
        ("contrast", CaptureProperty::Contrast),
        ("saturation", CaptureProperty::Saturation),
        ("hue", CaptureProperty::Hue),
    ];
}

/// Something that produces frames.
///
/// `grab` advances to the next frame cheaply; `retrieve` decodes the frame
/// last grabbed. Unsupported properties read as `0.0` and refuse writes.
pub trait FrameSource {
    fn grab(&mut self) -> bool;
    fn retrieve(&mut self) -> Option<Image>;
    fn get(&self, prop: CaptureProperty) -> f64;
    fn set(&mut self, prop: CaptureProperty, value: f64) -> bool;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// An open capture device with its own frame buffer.
///
/// Retrieved frames are written into one shared buffer, so every image
/// handed out by [`Capture::retrieve`] aliases the latest frame.
pub struct Capture {
    source: Box<dyn FrameSource>,
    frame: Option<Rc<RefCell<Image>>>,
    grabbed: bool,
}

impl Capture {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        log::debug!("opened capture {}", source.describe());
        Self {
            source,
            frame: None,
            grabbed: false,
        }
    }

    /// Open a single image, a directory of images or a printf-style
    /// sequence such as `frame_%03d.png`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        Ok(Self::new(Box::new(ImageSequence::open(path)?)))
    }

    /// Open camera `index`; negative indices pick the first camera.
    #[cfg(feature = "v4l")]
    pub fn from_camera(index: i32) -> Result<Self, CaptureError> {
        Ok(Self::new(Box::new(crate::camera::V4lCamera::open(index)?)))
    }

    /// Open camera `index`; this build has no camera backend.
    #[cfg(not(feature = "v4l"))]
    pub fn from_camera(index: i32) -> Result<Self, CaptureError> {
        log::debug!("camera {index} requested without a camera backend");
        Err(CaptureError::NoCameraBackend)
    }

    pub fn grab(&mut self) -> bool {
        self.grabbed = self.source.grab();
        self.grabbed
    }

    /// Decode the grabbed frame into the shared buffer.
    pub fn retrieve(&mut self) -> Option<Rc<RefCell<Image>>> {
        if !self.grabbed {
            return None;
        }
        let image = self.source.retrieve()?;
        Some(self.store(image))
    }

    /// `grab` followed by `retrieve`.
    pub fn query(&mut self) -> Option<Rc<RefCell<Image>>> {
        if self.grab() {
            self.retrieve()
        } else {
            None
        }
    }

    fn store(&mut self, image: Image) -> Rc<RefCell<Image>> {
        if let Some(buffer) = &self.frame {
            if let Ok(mut current) = buffer.try_borrow_mut() {
                *current = image;
                return Rc::clone(buffer);
            }
        }
        let buffer = Rc::new(RefCell::new(image));
        self.frame = Some(Rc::clone(&buffer));
        buffer
    }

    /// The frame buffer, if anything was retrieved yet.
    pub fn frame(&self) -> Option<Rc<RefCell<Image>>> {
        self.frame.clone()
    }

    pub fn get(&self, prop: CaptureProperty) -> f64 {
        self.source.get(prop)
    }

    pub fn set(&mut self, prop: CaptureProperty, value: f64) -> bool {
        let accepted = self.source.set(prop, value);
        if !accepted {
            log::debug!(
                "{} rejected {} = {}",
                self.source.describe(),
                prop.name(),
                value
            );
        }
        accepted
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        log::debug!("closed capture {}", self.source.describe());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luacv_core::{Depth, Size};

    /// Produces `count` frames whose only pixel holds the frame number.
    struct Counter {
        count: u32,
        at: u32,
    }

    impl FrameSource for Counter {
        fn grab(&mut self) -> bool {
            if self.at < self.count {
                self.at += 1;
                true
            } else {
                false
            }
        }

        fn retrieve(&mut self) -> Option<Image> {
            let mut img = Image::new(Size::new(1, 1), Depth::U8, 1).ok()?;
            img.set(0, 0, 0, f64::from(self.at));
            Some(img)
        }

        fn get(&self, prop: CaptureProperty) -> f64 {
            match prop {
                CaptureProperty::PosFrames => f64::from(self.at),
                _ => 0.0,
            }
        }

        fn set(&mut self, _: CaptureProperty, _: f64) -> bool {
            false
        }

        fn describe(&self) -> String {
            "counter".to_owned()
        }
    }

    #[test]
    fn frames_share_one_buffer() {
        let mut cap = Capture::new(Box::new(Counter { count: 2, at: 0 }));
        assert!(cap.retrieve().is_none());

        let first = cap.query().unwrap();
        assert_eq!(1.0, first.borrow().get(0, 0, 0));

        let second = cap.query().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(2.0, first.borrow().get(0, 0, 0));

        assert!(cap.query().is_none());
        assert!(!cap.grab());
        assert_eq!(2.0, cap.get(CaptureProperty::PosFrames));
    }

    #[test]
    fn property_names_round_trip() {
        for name in CaptureProperty::names() {
            assert_eq!(name, CaptureProperty::from_name(name).unwrap().name());
        }
        assert!(CaptureProperty::from_name("exposure").is_err());
    }
}
