use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use luacv_highgui::{Capture, CaptureError, HeadlessWindows, WindowSystem};

use crate::config::Config;
use crate::error::BindingError;
use crate::trackbar::TrackbarTable;

/// Opens camera `index` for `CaptureFromCAM`.
pub type CameraOpener = Box<dyn Fn(i32) -> Result<Capture, CaptureError>>;

/// What an embedder supplies to [`open_with`](crate::open_with).
pub struct Options {
    pub config: Config,
    pub windows: Rc<RefCell<dyn WindowSystem>>,
    pub open_camera: CameraOpener,
}

impl Options {
    /// Headless windows and the built-in camera backend.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            windows: Rc::new(RefCell::new(HeadlessWindows::new())),
            open_camera: Box::new(Capture::from_camera),
        }
    }

    pub fn with_windows(mut self, windows: Rc<RefCell<dyn WindowSystem>>) -> Self {
        self.windows = windows;
        self
    }

    pub fn with_camera(mut self, open_camera: CameraOpener) -> Self {
        self.open_camera = open_camera;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// State shared by the functions of one `luacv` module table.
pub(crate) struct Context {
    pub config: Config,
    pub windows: Rc<RefCell<dyn WindowSystem>>,
    pub open_camera: CameraOpener,
    pub trackbars: TrackbarTable,
}

impl Context {
    pub(crate) fn new(options: Options) -> Self {
        let trackbars = TrackbarTable::new(options.config.max_trackbars);
        Self {
            config: options.config,
            windows: options.windows,
            open_camera: options.open_camera,
            trackbars,
        }
    }

    pub(crate) fn windows(&self) -> Result<RefMut<'_, dyn WindowSystem + 'static>, BindingError> {
        self.windows
            .try_borrow_mut()
            .map_err(|_| BindingError::Native("window system is busy".to_owned()))
    }
}
