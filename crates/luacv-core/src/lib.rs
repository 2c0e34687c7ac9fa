//! Image model and pixel-level primitives behind the `luacv` bindings.
//!
//! This crate plays the part of the "native library" for everything that is
//! not detection or I/O with devices: a depth/channel aware [`Image`], the
//! option tables scripts use to name depths and conversions, colour
//! conversion, image codecs and a few raster drawing helpers.
//!
//! It has no knowledge of Lua; the binding crate treats every function here
//! as a black box with documented input and output shapes.
//!
//! ## Quickstart
//!
//! ```
//! use luacv_core::{convert_color, ColorConversion, Depth, Image, Size};
//!
//! # fn main() -> Result<(), luacv_core::CvError> {
//! let size = Size::new(64, 48);
//! let mut bgr = Image::new(size, Depth::U8, 3)?;
//! bgr.fill(&[10.0, 120.0, 250.0]);
//!
//! let mut gray = Image::new(size, Depth::U8, 1)?;
//! convert_color(&bgr, &mut gray, ColorConversion::Bgr2Gray)?;
//! assert_eq!(gray.size(), size);
//! # Ok(())
//! # }
//! ```

mod color;
mod criteria;
mod draw;
mod error;
mod image;
mod io;
mod logger;
mod options;
mod plane;

pub use color::{convert_color, ColorConversion};
pub use criteria::TermCriteria;
pub use draw::{draw_circle, draw_line, Scalar};
pub use error::CvError;
pub use image::{Depth, Image, Size};
pub use io::{from_dynamic, load_image, save_image, to_dynamic, LoadMode};
pub use options::NamedOption;
pub use plane::{sample_bilinear, GrayPlane, GrayPlaneView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_stderr_logger, verbosity_level};
