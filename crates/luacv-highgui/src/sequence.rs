//! Image files played back as a capture source.

use std::path::{Path, PathBuf};

use luacv_core::{load_image, Image, LoadMode, Size};

use crate::capture::{CaptureProperty, FrameSource};
use crate::error::CaptureError;

const DEFAULT_FPS: f64 = 25.0;

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "tif", "tiff", "pgm", "ppm", "pnm", "pbm", "webp", "tga", "gif",
];

fn is_image(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// A printf-style frame pattern: `prefix%0Ndsuffix` or `prefix%dsuffix`.
#[derive(Debug, PartialEq, Eq)]
struct FramePattern {
    prefix: String,
    width: usize,
    suffix: String,
}

impl FramePattern {
    fn parse(pattern: &str) -> Option<Self> {
        let start = pattern.find('%')?;
        let rest = &pattern[start + 1..];
        let end = rest.find('d')?;
        let spec = &rest[..end];
        let width = if spec.is_empty() {
            0
        } else if spec.bytes().all(|b| b.is_ascii_digit()) {
            spec.parse().ok()?
        } else {
            return None;
        };
        let suffix = &rest[end + 1..];
        if suffix.contains('%') {
            return None;
        }
        Some(Self {
            prefix: pattern[..start].to_owned(),
            width,
            suffix: suffix.to_owned(),
        })
    }

    fn path(&self, index: usize) -> PathBuf {
        PathBuf::from(format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            self.suffix,
            width = self.width
        ))
    }

    /// Consecutive existing files, starting at index 0 or 1.
    fn expand(&self) -> Vec<PathBuf> {
        let first = if self.path(0).is_file() { 0 } else { 1 };
        (first..)
            .map(|i| self.path(i))
            .take_while(|p| p.is_file())
            .collect()
    }
}

/// Plays back a fixed list of image files.
pub struct ImageSequence {
    label: String,
    frames: Vec<PathBuf>,
    next: usize,
    current: Option<usize>,
    size: Option<Size>,
    fps: f64,
}

impl ImageSequence {
    /// Open `path` as a single image, a directory of images (sorted by
    /// name) or a printf-style sequence.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let label = path.display().to_string();

        let frames = if path.is_dir() {
            let mut frames: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_image(p))
                .collect();
            frames.sort();
            frames
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else if label.contains('%') {
            FramePattern::parse(&label)
                .ok_or_else(|| CaptureError::InvalidPattern(label.clone()))?
                .expand()
        } else {
            Vec::new()
        };

        if frames.is_empty() {
            return Err(CaptureError::NoFrames(label));
        }
        Ok(Self::from_frames(label, frames))
    }

    pub fn from_frames(label: String, frames: Vec<PathBuf>) -> Self {
        let size = frames.first().and_then(|p| {
            image::image_dimensions(p)
                .map(|(w, h)| Size::new(w, h))
                .ok()
        });
        log::debug!("{label}: {} frame(s), size {size:?}", frames.len());
        Self {
            label,
            frames,
            next: 0,
            current: None,
            size,
            fps: DEFAULT_FPS,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn seek(&mut self, frame: f64) -> bool {
        if !frame.is_finite() {
            return false;
        }
        self.next = (frame.round().max(0.0) as usize).min(self.frames.len());
        self.current = None;
        true
    }
}

impl FrameSource for ImageSequence {
    fn grab(&mut self) -> bool {
        if self.next < self.frames.len() {
            self.current = Some(self.next);
            self.next += 1;
            true
        } else {
            self.current = None;
            false
        }
    }

    fn retrieve(&mut self) -> Option<Image> {
        let path = &self.frames[self.current?];
        match load_image(path, LoadMode::Color) {
            Ok(img) => Some(img),
            Err(err) => {
                log::warn!("{}: cannot decode {}: {err}", self.label, path.display());
                None
            }
        }
    }

    fn get(&self, prop: CaptureProperty) -> f64 {
        let count = self.frames.len() as f64;
        match prop {
            CaptureProperty::PosFrames => self.next as f64,
            CaptureProperty::PosMsec => self.next as f64 * 1000.0 / self.fps,
            CaptureProperty::PosRatio => self.next as f64 / count,
            CaptureProperty::Width => self.size.map_or(0.0, |s| f64::from(s.width)),
            CaptureProperty::Height => self.size.map_or(0.0, |s| f64::from(s.height)),
            CaptureProperty::Fps => self.fps,
            CaptureProperty::FrameCount => count,
            _ => 0.0,
        }
    }

    fn set(&mut self, prop: CaptureProperty, value: f64) -> bool {
        match prop {
            CaptureProperty::PosFrames => self.seek(value),
            CaptureProperty::PosMsec => self.seek(value * self.fps / 1000.0),
            CaptureProperty::PosRatio => self.seek(value * self.frames.len() as f64),
            CaptureProperty::Fps if value > 0.0 && value.is_finite() => {
                self.fps = value;
                true
            }
            _ => false,
        }
    }

    fn describe(&self) -> String {
        format!("image sequence '{}'", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_printf_patterns() {
        assert_eq!(
            Some(FramePattern {
                prefix: "dir/frame_".to_owned(),
                width: 3,
                suffix: ".png".to_owned()
            }),
            FramePattern::parse("dir/frame_%03d.png")
        );
        assert_eq!(0, FramePattern::parse("f%d.jpg").unwrap().width);
        assert!(FramePattern::parse("f%s.jpg").is_none());
        assert!(FramePattern::parse("f%d_%d.jpg").is_none());

        let p = FramePattern::parse("frame_%03d.png").unwrap();
        assert_eq!(PathBuf::from("frame_007.png"), p.path(7));
    }

    #[test]
    fn missing_sources_have_no_frames() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSequence::open(dir.path()),
            Err(CaptureError::NoFrames(_))
        ));
        assert!(matches!(
            ImageSequence::open(dir.path().join("nothing.png")),
            Err(CaptureError::NoFrames(_))
        ));
        assert!(matches!(
            ImageSequence::open(dir.path().join("f_%x.png")),
            Err(CaptureError::InvalidPattern(_))
        ));
    }
}
