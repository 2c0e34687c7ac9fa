//! Capture devices and the window/trackbar/event system used by `luacv`.
//!
//! Both halves are traits so the bindings never depend on a particular
//! backend:
//!
//! - [`FrameSource`] produces frames. [`Capture`] wraps a source together
//!   with the frame buffer that retrieved images alias. Image files and
//!   sequences ship by default, V4L2 cameras behind the `v4l` feature.
//! - [`WindowSystem`] owns windows and trackbars and runs the event loop.
//!   [`HeadlessWindows`] keeps everything in memory and replays scripted
//!   key presses and trackbar moves.

#[cfg(feature = "v4l")]
mod camera;
mod capture;
mod error;
mod headless;
mod sequence;
mod window;

#[cfg(feature = "v4l")]
pub use camera::V4lCamera;
pub use capture::{Capture, CaptureProperty, FrameSource};
pub use error::{CaptureError, WindowError};
pub use headless::{HeadlessWindows, WindowInfo};
pub use sequence::ImageSequence;
pub use window::{TrackbarCallback, WindowMode, WindowSystem};
